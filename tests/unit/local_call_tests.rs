#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tonic::Code;
    use tonic_svc_mock::{FieldMap, RequestArg, Subject, local_call, local_call_with};
    use tonic_svc_mock::test_utils::{TestRequest, TestResponse, test_service};

    use crate::common::{CreateUserRequest, CreateUserResponse, user_service};

    #[test]
    fn test_create_user_with_a_name_yields_the_user() {
        let service = user_service();

        let response: CreateUserResponse = local_call::<CreateUserRequest, _>(
            &service,
            "Create",
            RequestArg::Fields(FieldMap::new().with("name", "Jack")),
        )
        .unwrap();

        assert_eq!(response.name, "Jack");
        assert!(response.message.is_empty());
    }

    #[test]
    fn test_create_user_with_an_empty_name_reports_an_error_message() {
        let service = user_service();

        let response: CreateUserResponse = local_call::<CreateUserRequest, _>(
            &service,
            "Create",
            RequestArg::Fields(FieldMap::new().with("name", "")),
        )
        .unwrap();

        assert!(response.name.is_empty());
        assert!(response.message.contains("Error"));
    }

    #[test]
    fn test_handler_failure_signal_is_the_call_outcome() {
        let service = test_service();

        // test_service signals InvalidArgument for an empty id.
        let err = local_call::<TestRequest, TestResponse>(
            &service,
            "GetData",
            RequestArg::Typed(TestRequest::new("", "payload")),
        )
        .unwrap_err();

        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "id must not be empty");
    }

    #[test]
    fn test_declared_type_mismatch_is_rejected_before_execution() {
        let service = test_service();

        let err = local_call::<TestRequest, CreateUserResponse>(
            &service,
            "GetData",
            RequestArg::Typed(TestRequest::new("id-1", "payload")),
        )
        .unwrap_err();

        assert_eq!(err.code(), Code::Internal);
        assert!(err.message().contains("GetData"));
    }

    #[test]
    fn test_unregistered_method_is_a_lookup_error() {
        let service = test_service();
        let err = local_call::<TestRequest, TestResponse>(
            &service,
            "Missing",
            RequestArg::Typed(TestRequest::new("id-1", "payload")),
        )
        .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[test]
    fn test_configuration_block_runs_before_the_method() {
        let service = test_service();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_hook = seen.clone();

        let response: TestResponse = local_call_with(
            &service,
            "GetData",
            RequestArg::Typed(TestRequest::new("id-1", "payload")),
            move |env| {
                assert_eq!(env.method, "GetData");
                assert!(env.response.is_none(), "hook must run pre-invocation");
                seen_in_hook.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(response.code, 200);
    }

    #[test]
    fn test_subject_call_resolves_the_fixed_service() {
        let service = user_service();
        let subject = Subject::new(&service);

        let response: CreateUserResponse = subject
            .call(
                "Create",
                RequestArg::Typed(CreateUserRequest {
                    name: "Jill".to_string(),
                }),
            )
            .unwrap();
        assert_eq!(response.name, "Jill");

        let hooked: CreateUserResponse = subject
            .call_with::<CreateUserRequest, _, _>(
                "Create",
                RequestArg::Fields(FieldMap::new().with("name", "Jill")),
                |env| assert_eq!(env.service, "user.UserService"),
            )
            .unwrap();
        assert_eq!(hooked, response);
    }
}
