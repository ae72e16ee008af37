//! Bounded-wait support for services that defer their response.
//!
//! A handler that cannot answer inline takes a [`DeferredResponder`] and
//! fulfils it later; the test then awaits [`wait_for_response`], which
//! sleep-polls the completion slot until it fills or the timeout elapses.
//! The wait is the only timeout in the crate; everything else completes
//! synchronously.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tonic::Status;

/// Default bound on [`wait_for_response`].
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Completion slot for a deferred service response.
///
/// ```
/// use tonic_svc_mock::deferred::{DeferredResponder, wait_for_response};
/// use tonic_svc_mock::test_utils::TestResponse;
///
/// let responder = DeferredResponder::new();
/// responder.resolve(TestResponse::new(200, "done"));
///
/// let response = tokio_test::block_on(wait_for_response(&responder, None)).unwrap();
/// assert_eq!(response.code, 200);
/// ```
pub struct DeferredResponder<Resp> {
    slot: Arc<Mutex<Option<Result<Resp, Status>>>>,
}

impl<Resp> Clone for DeferredResponder<Resp> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<Resp> Default for DeferredResponder<Resp> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Resp> DeferredResponder<Resp> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Fulfil the response. A later `resolve` or `fail` overwrites an
    /// unconsumed value.
    pub fn resolve(&self, response: Resp) {
        *self.slot.lock().unwrap() = Some(Ok(response));
    }

    /// Fulfil with a failure signal.
    pub fn fail(&self, status: Status) {
        *self.slot.lock().unwrap() = Some(Err(status));
    }

    pub fn is_complete(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }

    fn take(&self) -> Option<Result<Resp, Status>> {
        self.slot.lock().unwrap().take()
    }
}

/// Sleep-poll the responder until it completes or `timeout` (default
/// [`DEFAULT_RESPONSE_TIMEOUT`]) elapses, then return the outcome. Expiry
/// raises `DeadlineExceeded`. The first successful wait takes the value.
pub async fn wait_for_response<Resp>(
    responder: &DeferredResponder<Resp>,
    timeout: Option<Duration>,
) -> Result<Resp, Status> {
    let deadline = tokio::time::Instant::now() + timeout.unwrap_or(DEFAULT_RESPONSE_TIMEOUT);

    loop {
        if let Some(outcome) = responder.take() {
            return outcome;
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Status::deadline_exceeded(
                "no response arrived within the wait bound",
            ));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
