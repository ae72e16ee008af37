// Test utilities for tonic-svc-mock
//
// Reusable fixture messages and a ready-made service descriptor for tests
// and doc examples. Gated behind the "test-utils" feature.

use bytes::Bytes;
use prost::Message;
use tonic::Status;

use crate::{
    fields::{FieldMap, FromFields},
    registry::ServiceDescriptor,
};

/// Test request message for service and client-double tests.
#[derive(Clone, PartialEq, Message)]
pub struct TestRequest {
    #[prost(bytes = "bytes", tag = "1")]
    pub id: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub data: Bytes,
}

impl TestRequest {
    /// Create a new test request with the given ID and data
    pub fn new(id: impl Into<Bytes>, data: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }
}

impl FromFields for TestRequest {
    const FIELDS: &'static [&'static str] = &["id", "data"];

    fn from_fields(fields: &FieldMap) -> Result<Self, Status> {
        Ok(Self {
            id: fields.get_bytes("id")?.unwrap_or_default(),
            data: fields.get_bytes("data")?.unwrap_or_default(),
        })
    }
}

/// Test response message for service and client-double tests.
#[derive(Clone, PartialEq, Message)]
pub struct TestResponse {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

impl TestResponse {
    /// Create a new test response with the given code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl FromFields for TestResponse {
    const FIELDS: &'static [&'static str] = &["code", "message"];

    fn from_fields(fields: &FieldMap) -> Result<Self, Status> {
        Ok(Self {
            code: fields.get_i32("code")?.unwrap_or_default(),
            message: fields.get_str("message")?.unwrap_or_default().to_string(),
        })
    }
}

/// A ready-made `example.TestService` descriptor with a `GetData` method.
///
/// `GetData` echoes the request ID back with code 200, or signals
/// `InvalidArgument` for an empty ID.
///
/// # Example
/// ```
/// use tonic_svc_mock::fields::RequestArg;
/// use tonic_svc_mock::test_utils::{TestRequest, TestResponse, test_service};
///
/// let service = test_service();
/// let response: TestResponse = tonic_svc_mock::local_call(
///     &service,
///     "GetData",
///     RequestArg::Typed(TestRequest::new("id-1", "payload")),
/// )
/// .unwrap();
/// assert_eq!(response.code, 200);
/// ```
pub fn test_service() -> ServiceDescriptor {
    ServiceDescriptor::new("example.TestService").method(
        "GetData",
        |req: TestRequest| -> Result<TestResponse, Status> {
            if req.id.is_empty() {
                return Err(Status::invalid_argument("id must not be empty"));
            }
            Ok(TestResponse::new(
                200,
                format!("got {}", String::from_utf8_lossy(&req.id)),
            ))
        },
    )
}

/// Assert that a test message matches the expected ID and data.
pub fn assert_message_eq(message: &TestRequest, id: impl AsRef<str>, data: impl AsRef<str>) {
    let id_bytes = Bytes::from(id.as_ref().to_string());
    let data_bytes = Bytes::from(data.as_ref().to_string());
    assert_eq!(message.id, id_bytes);
    assert_eq!(message.data, data_bytes);
}

/// Assert that a test response matches the expected code and message.
pub fn assert_response_eq(response: &TestResponse, code: i32, message: impl AsRef<str>) {
    assert_eq!(response.code, code);
    assert_eq!(response.message, message.as_ref());
}
