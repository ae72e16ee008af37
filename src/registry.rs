/*!
# Service descriptors

A [`ServiceDescriptor`] names a service and maps each method name to its
declared request/response types plus a type-erased handler. Registration
happens once, builder style, when the test sets the service up; after that
the descriptor is only read.

The handler stored per method is a dispatch-table closure over framed bytes:
it decodes the request, runs the typed handler the test registered, and
encodes the response. Invoking a method by its runtime name goes through this
table.

```
use tonic::Status;
use tonic_svc_mock::ServiceDescriptor;
use tonic_svc_mock::test_utils::{TestRequest, TestResponse};

let service = ServiceDescriptor::new("example.TestService").method(
    "GetData",
    |req: TestRequest| -> Result<TestResponse, Status> {
        Ok(TestResponse::new(200, format!("got {}", String::from_utf8_lossy(&req.id))))
    },
);

assert!(service.request_type("GetData").is_ok());
assert!(service.request_type("Missing").is_err());
```
*/

use std::{
    any::{TypeId, type_name},
    collections::HashMap,
};

use bytes::Bytes;
use prost::Message;
use tonic::Status;

use crate::codec::{decode_message, encode_message};

type MethodHandler = Box<dyn Fn(&[u8]) -> Result<Bytes, Status> + Send + Sync>;

/// The registry entry's declared type pair for one method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodTypes {
    /// Type name of the declared request message.
    pub request: &'static str,
    /// Type name of the declared response message.
    pub response: &'static str,
    request_id: TypeId,
    response_id: TypeId,
}

impl MethodTypes {
    fn of<Req: 'static, Resp: 'static>() -> Self {
        Self {
            request: type_name::<Req>(),
            response: type_name::<Resp>(),
            request_id: TypeId::of::<Req>(),
            response_id: TypeId::of::<Resp>(),
        }
    }

    /// Whether the declared pair matches the given request/response types.
    pub fn matches<Req: 'static, Resp: 'static>(&self) -> bool {
        self.request_id == TypeId::of::<Req>() && self.response_id == TypeId::of::<Resp>()
    }
}

struct MethodEntry {
    types: MethodTypes,
    handler: MethodHandler,
}

/// A named service and its method registry.
pub struct ServiceDescriptor {
    name: String,
    methods: HashMap<String, MethodEntry>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Register a method with its declared request/response types and a
    /// typed handler. The handler's `Status` errors become the call's error
    /// outcome unchanged.
    pub fn method<Req, Resp, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        Req: Message + Default + 'static,
        Resp: Message + Default + 'static,
        F: Fn(Req) -> Result<Resp, Status> + Send + Sync + 'static,
    {
        let erased = move |framed: &[u8]| -> Result<Bytes, Status> {
            let request: Req = decode_message(framed)?;
            let response = handler(request)?;
            Ok(encode_message(&response))
        };

        self.methods.insert(
            name.into(),
            MethodEntry {
                types: MethodTypes::of::<Req, Resp>(),
                handler: Box::new(erased),
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn entry(&self, method: &str) -> Result<&MethodEntry, Status> {
        self.methods.get(method).ok_or_else(|| {
            Status::not_found(format!(
                "method `{method}` is not registered on `{}`",
                self.name
            ))
        })
    }

    /// The registry entry's type pair; `NotFound` for unregistered names.
    pub fn method_types(&self, method: &str) -> Result<MethodTypes, Status> {
        Ok(self.entry(method)?.types)
    }

    /// Declared request type name for `method`.
    pub fn request_type(&self, method: &str) -> Result<&'static str, Status> {
        Ok(self.entry(method)?.types.request)
    }

    /// Declared response type name for `method`.
    pub fn response_type(&self, method: &str) -> Result<&'static str, Status> {
        Ok(self.entry(method)?.types.response)
    }

    /// Run the dispatch-table closure for `method` on a framed request.
    pub fn invoke_raw(&self, method: &str, framed: &[u8]) -> Result<Bytes, Status> {
        (self.entry(method)?.handler)(framed)
    }

    /// Check the caller's type arguments against the registry entry.
    pub(crate) fn check_types<Req, Resp>(&self, method: &str) -> Result<MethodTypes, Status>
    where
        Req: 'static,
        Resp: 'static,
    {
        let types = self.method_types(method)?;
        if !types.matches::<Req, Resp>() {
            return Err(Status::internal(format!(
                "method `{method}` on `{}` is declared as ({}, {}), called as ({}, {})",
                self.name,
                types.request,
                types.response,
                type_name::<Req>(),
                type_name::<Resp>(),
            )));
        }
        Ok(types)
    }
}
