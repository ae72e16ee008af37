/*!
# Full-stack dispatch

[`Pipeline`] exercises the complete dispatch path: a transport-level request
wrapper is resolved to a registered service, `before` filters run in
registration order, the method executes through the service's dispatch
table, `after` filters run in reverse order, and the filled
[`InvocationEnv`] comes back with the response slot set.

This is the test author's choice over [`local_call`](crate::local_call)
when the filters themselves are under test.

```
use tonic_svc_mock::{Pipeline, TransportRequest};
use tonic_svc_mock::test_utils::{TestRequest, TestResponse, test_service};

let pipeline = Pipeline::new().register(test_service());

let request = TestRequest::new("id-1", "payload");
let transport = TransportRequest::new("example.TestService", "GetData", &request);

let env = pipeline.dispatch(transport).unwrap();
let response: TestResponse = env.decoded_response().unwrap();
assert_eq!(response.code, 200);
```
*/

use std::collections::HashMap;

use bytes::Bytes;
use http::Uri;
use prost::Message;
use tonic::Status;

use crate::{
    codec::{encode_message, method_uri},
    env::{CALLER_TAG, InvocationEnv},
    fields::{FromFields, RequestArg},
    registry::ServiceDescriptor,
};

/// Transport-level request wrapper handed to the pipeline entry point.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub service: String,
    pub method: String,
    /// Framed request payload.
    pub payload: Bytes,
    /// Originator tag, [`CALLER_TAG`] for requests built by this crate.
    pub caller: &'static str,
}

impl TransportRequest {
    pub fn new<Req>(service: &str, method: &str, request: &Req) -> Self
    where
        Req: Message,
    {
        Self {
            service: service.to_string(),
            method: method.to_string(),
            payload: encode_message(request),
            caller: CALLER_TAG,
        }
    }

    /// Raw-payload constructor for callers that already hold framed bytes.
    pub fn from_payload(service: &str, method: &str, payload: Bytes) -> Self {
        Self {
            service: service.to_string(),
            method: method.to_string(),
            payload,
            caller: CALLER_TAG,
        }
    }

    pub fn uri(&self) -> Uri {
        method_uri(&self.service, &self.method)
    }
}

/// A dispatch filter. Both hooks default to no-ops; an error from either
/// short-circuits the dispatch and becomes the call's error outcome.
pub trait Filter: Send + Sync {
    fn before(&self, _env: &mut InvocationEnv) -> Result<(), Status> {
        Ok(())
    }

    fn after(&self, _env: &mut InvocationEnv) -> Result<(), Status> {
        Ok(())
    }
}

/// Registered services plus an ordered filter chain.
#[derive(Default)]
pub struct Pipeline {
    services: HashMap<String, ServiceDescriptor>,
    filters: Vec<Box<dyn Filter>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its descriptor name.
    pub fn register(mut self, service: ServiceDescriptor) -> Self {
        self.services.insert(service.name().to_string(), service);
        self
    }

    /// Append a filter; `before` hooks run in append order, `after` hooks in
    /// reverse.
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Look up a registered service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name)
    }

    /// Resolve, filter and execute a transport request, returning the filled
    /// environment.
    pub fn dispatch(&self, request: TransportRequest) -> Result<InvocationEnv, Status> {
        let service = self.services.get(&request.service).ok_or_else(|| {
            Status::unimplemented(format!(
                "no service registered for {}::{}",
                request.service, request.method
            ))
        })?;

        if !service.has_method(&request.method) {
            return Err(Status::unimplemented(format!(
                "no method registered for {}::{}",
                request.service, request.method
            )));
        }

        let mut env = InvocationEnv::new(service, &request.method, request.payload)?;

        for filter in &self.filters {
            filter.before(&mut env)?;
        }

        let response = service.invoke_raw(&env.method, &env.request)?;
        env.response = Some(response);

        for filter in self.filters.iter().rev() {
            filter.after(&mut env)?;
        }

        Ok(env)
    }
}

/// Dispatch through the full pipeline and decode the response slot.
///
/// The typed counterpart of [`Pipeline::dispatch`]: coerces the request,
/// checks the declared types, and returns the decoded response.
pub fn dispatch_call<Req, Resp>(
    pipeline: &Pipeline,
    service: &str,
    method: &str,
    request: RequestArg<Req>,
) -> Result<Resp, Status>
where
    Req: Message + Default + FromFields + 'static,
    Resp: Message + Default + 'static,
{
    let typed = request.resolve()?;

    // An unregistered service or method falls through to dispatch, which
    // reports it as Unimplemented.
    if let Some(descriptor) = pipeline.service(service) {
        if descriptor.has_method(method) {
            descriptor.check_types::<Req, Resp>(method)?;
        }
    }

    let transport = TransportRequest::new(service, method, &typed);
    let env = pipeline.dispatch(transport)?;
    env.decoded_response()
}
