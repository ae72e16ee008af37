/*!
# Callback client doubles

[`ClientDouble`] stands in for a callback-style RPC client: production code
calls a method on the client and registers `on_success` / `on_failure`
handlers on the returned handle. The double yields itself from
[`ClientDouble::call`], so the same chaining works against it, and armed
channels invoke the registered handler immediately with a pre-built value.
No network activity is involved anywhere.

Expectation policy on the intercepted call, in priority order:

1. a literal expected request asserts exact equality with the actual one;
2. else a request-assertion closure runs with the actual request;
3. else the call is only recorded.

Violations panic through the test harness, which is how the surrounding
example fails.

```
use tonic_svc_mock::client_mock::ClientDouble;
use tonic_svc_mock::test_utils::{TestRequest, TestResponse};

let double = ClientDouble::builder("GetData")
    .request(TestRequest::new("id-1", "payload"))
    .success(TestResponse::new(200, "ok"))
    .build();

let mut delivered = None;
double
    .call(TestRequest::new("id-1", "payload"))
    .on_success(|resp: TestResponse| delivered = Some(resp))
    .on_failure(|_| panic!("failure channel is not armed"));

assert_eq!(delivered.unwrap().code, 200);
double.verify();
```
*/

use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
};

use tonic::Status;

type RequestAssertion<Req> = Box<dyn Fn(&Req) + Send + Sync>;

struct DoubleState<Req, Resp> {
    method: String,
    expected: Option<Req>,
    assertion: Option<RequestAssertion<Req>>,
    success: Option<Resp>,
    failure: Option<Status>,
    calls: usize,
}

/// A test double for a callback-style RPC client.
///
/// Cheap to clone; clones share call records and configuration. Lifetime is
/// one test example.
pub struct ClientDouble<Req, Resp> {
    state: Arc<Mutex<DoubleState<Req, Resp>>>,
}

impl<Req, Resp> Clone for ClientDouble<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<Req, Resp> ClientDouble<Req, Resp> {
    /// Start configuring a double for the named method.
    pub fn builder(method: impl Into<String>) -> ClientDoubleBuilder<Req, Resp> {
        ClientDoubleBuilder {
            method: method.into(),
            expected: None,
            assertion: None,
            success: None,
            failure: None,
        }
    }

    /// The method name this double intercepts.
    pub fn method(&self) -> String {
        self.state.lock().unwrap().method.clone()
    }

    /// Number of calls recorded so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// Assert the intercepted method was invoked at least once.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        assert!(
            state.calls > 0,
            "expected `{}` to be called, but it never was",
            state.method
        );
    }
}

impl<Req, Resp> ClientDouble<Req, Resp>
where
    Req: PartialEq + Debug,
{
    /// Intercept a call, apply the expectation policy, and yield the double
    /// itself so success/failure handlers can be chained.
    pub fn call(&self, request: Req) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if let Some(expected) = &state.expected {
            assert_eq!(
                &request, expected,
                "unexpected request to `{}`",
                state.method
            );
        } else if let Some(assertion) = &state.assertion {
            assertion(&request);
        }
        drop(state);
        self
    }
}

impl<Req, Resp> ClientDouble<Req, Resp>
where
    Resp: Clone,
{
    /// Register a success handler. If the success channel is armed, the
    /// handler runs exactly once, synchronously, with the armed value;
    /// otherwise registration is a no-op.
    pub fn on_success(&self, handler: impl FnOnce(Resp)) -> &Self {
        let armed = self.state.lock().unwrap().success.clone();
        if let Some(value) = armed {
            handler(value);
        }
        self
    }
}

impl<Req, Resp> ClientDouble<Req, Resp> {
    /// Register a failure handler; symmetric to [`ClientDouble::on_success`].
    pub fn on_failure(&self, handler: impl FnOnce(Status)) -> &Self {
        let armed = self.state.lock().unwrap().failure.clone();
        if let Some(status) = armed {
            handler(status);
        }
        self
    }
}

/// Builder for [`ClientDouble`] configuration.
pub struct ClientDoubleBuilder<Req, Resp> {
    method: String,
    expected: Option<Req>,
    assertion: Option<RequestAssertion<Req>>,
    success: Option<Resp>,
    failure: Option<Status>,
}

impl<Req, Resp> ClientDoubleBuilder<Req, Resp> {
    /// Expect the intercepted method to be invoked with exactly this value.
    /// Takes priority over a request assertion.
    pub fn request(mut self, expected: Req) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Run a custom assertion against the actual request on every call.
    /// Ignored when a literal expected request was also supplied.
    pub fn request_assertion(mut self, assertion: impl Fn(&Req) + Send + Sync + 'static) -> Self {
        self.assertion = Some(Box::new(assertion));
        self
    }

    /// Arm the success channel with this value.
    pub fn success(mut self, value: Resp) -> Self {
        self.success = Some(value);
        self
    }

    /// Legacy alias for [`ClientDoubleBuilder::success`].
    pub fn response(self, value: Resp) -> Self {
        self.success(value)
    }

    /// Arm the failure channel with this status.
    pub fn failure(mut self, status: Status) -> Self {
        self.failure = Some(status);
        self
    }

    /// Legacy alias for [`ClientDoubleBuilder::failure`].
    pub fn error(self, status: Status) -> Self {
        self.failure(status)
    }

    pub fn build(self) -> ClientDouble<Req, Resp> {
        ClientDouble {
            state: Arc::new(Mutex::new(DoubleState {
                method: self.method,
                expected: self.expected,
                assertion: self.assertion,
                success: self.success,
                failure: self.failure,
                calls: 0,
            })),
        }
    }
}

/// Extension trait for client types to accept a double as their transport.
///
/// ```
/// use tonic_svc_mock::client_mock::{ClientDouble, WithDouble};
/// use tonic_svc_mock::test_utils::{TestRequest, TestResponse};
///
/// struct ExampleClient {
///     inner: ClientDouble<TestRequest, TestResponse>,
/// }
///
/// impl WithDouble<ClientDouble<TestRequest, TestResponse>> for ExampleClient {
///     fn with_double(double: ClientDouble<TestRequest, TestResponse>) -> Self {
///         Self { inner: double }
///     }
/// }
/// # let client = ExampleClient::with_double(ClientDouble::builder("GetData").build());
/// # assert_eq!(client.inner.call_count(), 0);
/// ```
pub trait WithDouble<D>: Sized {
    /// Create a client instance backed by the provided double.
    fn with_double(double: D) -> Self;
}
