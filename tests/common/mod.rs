// Shared fixtures: a small user service with one registered method.

#![allow(dead_code)]

use prost::Message;
use tonic::Status;
use tonic_svc_mock::{FieldMap, FromFields, ServiceDescriptor};

#[derive(Clone, PartialEq, Message)]
pub struct CreateUserRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

impl FromFields for CreateUserRequest {
    const FIELDS: &'static [&'static str] = &["name"];

    fn from_fields(fields: &FieldMap) -> Result<Self, Status> {
        Ok(Self {
            name: fields.get_str("name")?.unwrap_or_default().to_string(),
        })
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateUserResponse {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub message: String,
}

/// `user.UserService` with a `Create` method: a named user comes back as a
/// user, an empty name comes back as a response whose message reports the
/// failure.
pub fn user_service() -> ServiceDescriptor {
    ServiceDescriptor::new("user.UserService").method(
        "Create",
        |req: CreateUserRequest| -> Result<CreateUserResponse, Status> {
            if req.name.is_empty() {
                return Ok(CreateUserResponse {
                    name: String::new(),
                    message: "Error: name must not be empty".to_string(),
                });
            }
            Ok(CreateUserResponse {
                name: req.name,
                message: String::new(),
            })
        },
    )
}
