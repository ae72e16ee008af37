/*!
# tonic-svc-mock

Test helpers for exercising protobuf RPC services without a network: invoke
a service method directly through its dispatch table and assert on the
response, run the same call through a filter pipeline, or stand in a
callback-style client with a controllable double.

The crate is glue over two things a test already has: service method
registries (name → declared request/response types plus a handler) and the
test harness's own assertion machinery. It adds no transport, no
serialization format and no retry logic of its own.

## Invoking a method locally

```
use tonic::Status;
use tonic_svc_mock::{RequestArg, ServiceDescriptor, local_call};
use tonic_svc_mock::test_utils::{TestRequest, TestResponse};

let service = ServiceDescriptor::new("example.TestService").method(
    "GetData",
    |req: TestRequest| -> Result<TestResponse, Status> {
        Ok(TestResponse::new(200, format!("got {}", String::from_utf8_lossy(&req.id))))
    },
);

let response: TestResponse = local_call(
    &service,
    "GetData",
    RequestArg::Typed(TestRequest::new("id-1", "payload")),
)
.unwrap();
assert_eq!(response.message, "got id-1");
```

A request may also be a [`FieldMap`] that is coerced into the declared
request type; construction errors (unknown fields, wrong value kinds)
propagate to the caller unchanged:

```
use tonic_svc_mock::{FieldMap, RequestArg, local_call};
use tonic_svc_mock::test_utils::{TestRequest, TestResponse, test_service};

let service = test_service();
let response: TestResponse = local_call::<TestRequest, _>(
    &service,
    "GetData",
    RequestArg::Fields(FieldMap::new().with("id", "id-1").with("data", "payload")),
)
.unwrap();
assert_eq!(response.code, 200);
```

## Mocking a callback client

See [`client_mock`] for the double that intercepts a client method and arms
immediate `on_success` / `on_failure` delivery, and [`pipeline`] for the
full-stack dispatch path that runs filters around the method.
*/

use prost::Message;
use tonic::Status;

pub mod client_mock;
pub mod codec;
pub mod deferred;
pub mod env;
pub mod fields;
pub mod pipeline;
pub mod registry;
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use client_mock::{ClientDouble, ClientDoubleBuilder, WithDouble};
pub use deferred::{DEFAULT_RESPONSE_TIMEOUT, DeferredResponder, wait_for_response};
pub use env::{CALLER_TAG, InvocationEnv};
pub use fields::{FieldMap, FieldValue, FromFields, RequestArg};
pub use pipeline::{Filter, Pipeline, TransportRequest, dispatch_call};
pub use registry::{MethodTypes, ServiceDescriptor};

use crate::codec::{decode_message, encode_message};

/// Invoke `method` on `service` directly, bypassing any pipeline.
///
/// The request is coerced if it is a field mapping, the declared
/// request/response types are checked against `Req`/`Resp`, and the method
/// runs synchronously through the service's dispatch table. The handler's
/// `Status` failure signal is the call's error outcome; nothing is retried
/// or caught.
///
/// A field mapping alone does not determine `Req`, so name it at the call
/// site: `local_call::<MyRequest, _>(…)`.
pub fn local_call<Req, Resp>(
    service: &ServiceDescriptor,
    method: &str,
    request: RequestArg<Req>,
) -> Result<Resp, Status>
where
    Req: Message + Default + FromFields + 'static,
    Resp: Message + Default + 'static,
{
    local_call_with(service, method, request, |_| {})
}

/// [`local_call`] with a pre-invocation hook.
///
/// The configuration block receives the built [`InvocationEnv`] before the
/// method executes, for expectation setup against the resolved call
/// metadata.
pub fn local_call_with<Req, Resp, F>(
    service: &ServiceDescriptor,
    method: &str,
    request: RequestArg<Req>,
    configure: F,
) -> Result<Resp, Status>
where
    Req: Message + Default + FromFields + 'static,
    Resp: Message + Default + 'static,
    F: FnOnce(&InvocationEnv),
{
    let typed = request.resolve()?;
    service.check_types::<Req, Resp>(method)?;

    let env = InvocationEnv::new(service, method, encode_message(&typed))?;
    configure(&env);

    let framed = service.invoke_raw(&env.method, &env.request)?;
    decode_message(&framed)
}

/// Build the invocation environment for a call without executing anything.
///
/// ```
/// use tonic_svc_mock::{CALLER_TAG, RequestArg, build_env};
/// use tonic_svc_mock::test_utils::{TestRequest, test_service};
///
/// let service = test_service();
/// let env = build_env(
///     &service,
///     "GetData",
///     RequestArg::Typed(TestRequest::new("id-1", "payload")),
/// )
/// .unwrap();
///
/// assert_eq!(env.caller, CALLER_TAG);
/// assert_eq!(env.service, "example.TestService");
/// assert!(env.response.is_none());
/// ```
pub fn build_env<Req>(
    service: &ServiceDescriptor,
    method: &str,
    request: RequestArg<Req>,
) -> Result<InvocationEnv, Status>
where
    Req: Message + Default + FromFields,
{
    let typed = request.resolve()?;
    InvocationEnv::new(service, method, encode_message(&typed))
}

/// The service under test, fixed once per test example.
///
/// Wraps a descriptor so repeated calls do not restate the service
/// argument; each method forwards to the free-function helpers.
///
/// ```
/// use tonic_svc_mock::{RequestArg, Subject};
/// use tonic_svc_mock::test_utils::{TestRequest, TestResponse, test_service};
///
/// let service = test_service();
/// let subject = Subject::new(&service);
///
/// let response: TestResponse = subject
///     .call("GetData", RequestArg::Typed(TestRequest::new("id-1", "payload")))
///     .unwrap();
/// assert_eq!(response.code, 200);
/// ```
pub struct Subject<'a> {
    service: &'a ServiceDescriptor,
}

impl<'a> Subject<'a> {
    pub fn new(service: &'a ServiceDescriptor) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ServiceDescriptor {
        self.service
    }

    /// Invoke a method on the subject service; see [`local_call`].
    pub fn call<Req, Resp>(&self, method: &str, request: RequestArg<Req>) -> Result<Resp, Status>
    where
        Req: Message + Default + FromFields + 'static,
        Resp: Message + Default + 'static,
    {
        local_call(self.service, method, request)
    }

    /// Invoke with a pre-invocation hook; see [`local_call_with`].
    pub fn call_with<Req, Resp, F>(
        &self,
        method: &str,
        request: RequestArg<Req>,
        configure: F,
    ) -> Result<Resp, Status>
    where
        Req: Message + Default + FromFields + 'static,
        Resp: Message + Default + 'static,
        F: FnOnce(&InvocationEnv),
    {
        local_call_with(self.service, method, request, configure)
    }

    /// Build the environment for a call on the subject service.
    pub fn env_for<Req>(
        &self,
        method: &str,
        request: RequestArg<Req>,
    ) -> Result<InvocationEnv, Status>
    where
        Req: Message + Default + FromFields,
    {
        build_env(self.service, method, request)
    }

    /// Declared request type name for `method`; `NotFound` if unregistered.
    pub fn request_type(&self, method: &str) -> Result<&'static str, Status> {
        self.service.request_type(method)
    }

    /// Declared response type name for `method`; `NotFound` if unregistered.
    pub fn response_type(&self, method: &str) -> Result<&'static str, Status> {
        self.service.response_type(method)
    }
}
