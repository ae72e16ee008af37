//! The invocation environment: the metadata bundle a dispatch pipeline sees
//! for one call. Building it executes nothing; the only way construction
//! fails is a method-name lookup error.

use bytes::Bytes;
use prost::Message;
use tonic::Status;

use crate::{
    codec::decode_message,
    registry::{MethodTypes, ServiceDescriptor},
};

/// Caller tag stamped on every environment and transport request built by
/// this crate, identifying the test helper as the call originator.
pub const CALLER_TAG: &str = "tonic-svc-mock";

/// Ephemeral bundle of one invocation's metadata.
///
/// Created fresh per call, filled by the pipeline, discarded after the test
/// reads the response slot.
#[derive(Clone, Debug)]
pub struct InvocationEnv {
    /// Originator tag, always [`CALLER_TAG`] for environments built here.
    pub caller: &'static str,
    /// Resolved service name.
    pub service: String,
    /// Resolved method name.
    pub method: String,
    /// Framed request payload.
    pub request: Bytes,
    /// The method's registry entry (declared request/response types).
    pub types: MethodTypes,
    /// Response slot, empty until the method has run.
    pub response: Option<Bytes>,
}

impl InvocationEnv {
    /// Resolve `method` on `service` and bundle the framed request.
    pub fn new(
        service: &ServiceDescriptor,
        method: &str,
        request: Bytes,
    ) -> Result<Self, Status> {
        let types = service.method_types(method)?;
        Ok(Self {
            caller: CALLER_TAG,
            service: service.name().to_string(),
            method: method.to_string(),
            request,
            types,
            response: None,
        })
    }

    pub fn request_type(&self) -> &'static str {
        self.types.request
    }

    pub fn response_type(&self) -> &'static str {
        self.types.response
    }

    /// Decode the request payload as its typed message.
    pub fn decoded_request<Req>(&self) -> Result<Req, Status>
    where
        Req: Message + Default,
    {
        decode_message(&self.request)
    }

    /// Decode the response slot; fails if the method has not run yet.
    pub fn decoded_response<Resp>(&self) -> Result<Resp, Status>
    where
        Resp: Message + Default,
    {
        let framed = self.response.as_ref().ok_or_else(|| {
            Status::internal(format!(
                "`{}::{}` has no response yet",
                self.service, self.method
            ))
        })?;
        decode_message(framed)
    }
}
