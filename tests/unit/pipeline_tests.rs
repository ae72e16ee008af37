#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tonic::{Code, Status};
    use tonic_svc_mock::{
        CALLER_TAG, FieldMap, Filter, InvocationEnv, Pipeline, RequestArg, TransportRequest,
        dispatch_call,
    };
    use tonic_svc_mock::test_utils::{TestRequest, TestResponse, test_service};

    use crate::common::{CreateUserRequest, CreateUserResponse, user_service};

    struct RecordingFilter {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Filter for RecordingFilter {
        fn before(&self, env: &mut InvocationEnv) -> Result<(), Status> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}.before:{}", self.label, env.method));
            Ok(())
        }

        fn after(&self, env: &mut InvocationEnv) -> Result<(), Status> {
            assert!(env.response.is_some(), "after hook runs post-invocation");
            self.log
                .lock()
                .unwrap()
                .push(format!("{}.after:{}", self.label, env.method));
            Ok(())
        }
    }

    struct RejectingFilter;

    impl Filter for RejectingFilter {
        fn before(&self, _env: &mut InvocationEnv) -> Result<(), Status> {
            Err(Status::permission_denied("rejected by filter"))
        }
    }

    #[test]
    fn test_dispatch_fills_the_environment() {
        let pipeline = Pipeline::new().register(test_service());
        let request = TestRequest::new("id-1", "payload");
        let transport = TransportRequest::new("example.TestService", "GetData", &request);

        assert_eq!(transport.caller, CALLER_TAG);
        assert_eq!(transport.uri().path(), "/example.TestService/GetData");

        let env = pipeline.dispatch(transport).unwrap();
        assert_eq!(env.caller, CALLER_TAG);
        assert_eq!(env.service, "example.TestService");

        let response: TestResponse = env.decoded_response().unwrap();
        assert_eq!(response.code, 200);
        assert_eq!(response.message, "got id-1");
    }

    #[test]
    fn test_unregistered_service_and_method_are_unimplemented() {
        let pipeline = Pipeline::new().register(test_service());
        let request = TestRequest::new("id-1", "payload");

        let err = pipeline
            .dispatch(TransportRequest::new("no.Service", "GetData", &request))
            .unwrap_err();
        assert_eq!(err.code(), Code::Unimplemented);

        let err = pipeline
            .dispatch(TransportRequest::new(
                "example.TestService",
                "Missing",
                &request,
            ))
            .unwrap_err();
        assert_eq!(err.code(), Code::Unimplemented);
    }

    #[test]
    fn test_filters_wrap_the_invocation_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .register(test_service())
            .filter(RecordingFilter {
                label: "outer",
                log: log.clone(),
            })
            .filter(RecordingFilter {
                label: "inner",
                log: log.clone(),
            });

        let request = TestRequest::new("id-1", "payload");
        pipeline
            .dispatch(TransportRequest::new(
                "example.TestService",
                "GetData",
                &request,
            ))
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "outer.before:GetData",
                "inner.before:GetData",
                "inner.after:GetData",
                "outer.after:GetData",
            ]
        );
    }

    #[test]
    fn test_filter_error_short_circuits_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .register(test_service())
            .filter(RejectingFilter)
            .filter(RecordingFilter {
                label: "never",
                log: log.clone(),
            });

        let request = TestRequest::new("id-1", "payload");
        let err = pipeline
            .dispatch(TransportRequest::new(
                "example.TestService",
                "GetData",
                &request,
            ))
            .unwrap_err();

        assert_eq!(err.code(), Code::PermissionDenied);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_call_returns_the_decoded_response() {
        let pipeline = Pipeline::new()
            .register(test_service())
            .register(user_service());

        let response: CreateUserResponse = dispatch_call::<CreateUserRequest, _>(
            &pipeline,
            "user.UserService",
            "Create",
            RequestArg::Fields(FieldMap::new().with("name", "Jack")),
        )
        .unwrap();
        assert_eq!(response.name, "Jack");
    }

    #[test]
    fn test_dispatch_call_rejects_a_declared_type_mismatch() {
        let pipeline = Pipeline::new().register(user_service());

        // A wrong response type can still decode from the wire bytes, so
        // the declared-type check must reject the call before dispatch.
        let err = dispatch_call::<CreateUserRequest, TestRequest>(
            &pipeline,
            "user.UserService",
            "Create",
            RequestArg::Fields(FieldMap::new().with("name", "Jack")),
        )
        .unwrap_err();

        assert_eq!(err.code(), Code::Internal);
        assert!(err.message().contains("Create"));
    }

    #[test]
    fn test_pipeline_propagates_the_handler_failure_signal() {
        let pipeline = Pipeline::new().register(test_service());

        let err = dispatch_call::<TestRequest, TestResponse>(
            &pipeline,
            "example.TestService",
            "GetData",
            RequestArg::Typed(TestRequest::new("", "payload")),
        )
        .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }
}
