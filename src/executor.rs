// Resilient call execution.
//
// Every call to the web service goes through `Executor::execute`, which
// applies a small bounded-retry policy:
//
// * a response with a status in the recognised set (200, 400, 500) is a
//   final answer and is returned straight away, even when it reports a
//   failure;
// * any other status, and by default a transport error, is retried with a
//   linear backoff of 1 s then 2 s;
// * after the third attempt the last observed result is returned.
//
// The executor never returns `Err`. Callers pattern-match on
// `CallOutcome` instead.

use crate::api::{CallRequest, RawResponse, Transport, TransportError};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Status codes the service uses for a deliberate answer.
pub const RECOGNIZED_STATUSES: [u16; 3] = [200, 400, 500];

/// Result of one executed call, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The service answered. The status is one of [`RECOGNIZED_STATUSES`]
    /// unless the retry budget ran out on an unexpected status.
    Responded { status: u16, body: String },
    /// The last attempt never got an answer.
    TransportFailure(TransportError),
}

impl CallOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            CallOutcome::Responded { status, .. } => Some(*status),
            CallOutcome::TransportFailure(_) => None,
        }
    }
}

impl From<RawResponse> for CallOutcome {
    fn from(r: RawResponse) -> Self {
        CallOutcome::Responded {
            status: r.status,
            body: r.body,
        }
    }
}

/// Retry budget and classification for [`Executor`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Whether transport errors consume the retry budget or end the call.
    pub retry_transport_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            retry_transport_errors: true,
        }
    }
}

impl RetryPolicy {
    pub fn is_recognized(&self, status: u16) -> bool {
        RECOGNIZED_STATUSES.contains(&status)
    }

    /// Delay before retry number `retry` (1-based): `retry` seconds.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        Duration::from_secs(u64::from(retry))
    }
}

/// Blocks between attempts. Tests substitute a recorder.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Runs calls against a [`Transport`] under a [`RetryPolicy`].
pub struct Executor<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl<T: Transport> Executor<T, ThreadSleeper> {
    pub fn new(transport: T) -> Self {
        Executor {
            transport,
            sleeper: ThreadSleeper,
            policy: RetryPolicy::default(),
        }
    }
}

impl<T: Transport, S: Sleeper> Executor<T, S> {
    pub fn with_parts(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
        Executor {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Perform `request`, retrying unrecognised statuses.
    pub fn execute(&self, request: &CallRequest) -> CallOutcome {
        let mut retries = 0u32;
        loop {
            let outcome = match self.transport.send(request) {
                Ok(response) => {
                    debug!(
                        "{} {}: status {} (attempt {})",
                        request.method(),
                        request.url(),
                        response.status,
                        retries + 1
                    );
                    if self.policy.is_recognized(response.status) {
                        return response.into();
                    }
                    CallOutcome::from(response)
                }
                Err(e) => {
                    warn!(
                        "{} {}: attempt {} failed: {}",
                        request.method(),
                        request.url(),
                        retries + 1,
                        e
                    );
                    if !self.policy.retry_transport_errors {
                        error!("{} {} failed: {}", request.method(), request.url(), e);
                        return CallOutcome::TransportFailure(e);
                    }
                    CallOutcome::TransportFailure(e)
                }
            };

            retries += 1;
            if retries >= self.policy.max_attempts {
                match &outcome {
                    CallOutcome::TransportFailure(e) => error!(
                        "{} {}: giving up after {} attempts: {}",
                        request.method(),
                        request.url(),
                        retries,
                        e
                    ),
                    CallOutcome::Responded { status, .. } => warn!(
                        "{} {}: giving up after {} attempts, last status {}",
                        request.method(),
                        request.url(),
                        retries,
                        status
                    ),
                }
                return outcome;
            }

            let backoff = self.policy.backoff_for(retries);
            warn!(
                "{} {}: retry {}/{} after {:?}",
                request.method(),
                request.url(),
                retries,
                self.policy.max_attempts - 1,
                backoff
            );
            self.sleeper.sleep(backoff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Scripted {
        replies: RefCell<VecDeque<Result<RawResponse, TransportError>>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<RawResponse, TransportError>>) -> Self {
            Scripted {
                replies: RefCell::new(replies.into()),
                calls: RefCell::new(0),
            }
        }
    }

    impl Transport for Scripted {
        fn send(&self, _request: &CallRequest) -> Result<RawResponse, TransportError> {
            *self.calls.borrow_mut() += 1;
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("script exhausted".into())))
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Duration>>);

    impl Sleeper for Recorder {
        fn sleep(&self, duration: Duration) {
            self.0.borrow_mut().push(duration);
        }
    }

    fn ok(status: u16) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(status, format!("{{\"s\":{status}}}")))
    }

    fn run(
        replies: Vec<Result<RawResponse, TransportError>>,
        policy: RetryPolicy,
    ) -> (CallOutcome, u32, Vec<Duration>) {
        let transport = Scripted::new(replies);
        let sleeps = Recorder::default();
        let outcome = {
            let exec = Executor::with_parts(&transport, &sleeps, policy);
            exec.execute(&CallRequest::get("http://photoapp.example.com/assets"))
        };
        let calls = *transport.calls.borrow();
        (outcome, calls, sleeps.0.into_inner())
    }

    #[test]
    fn recognized_statuses_return_first_time() {
        for status in RECOGNIZED_STATUSES {
            let (outcome, calls, sleeps) = run(vec![ok(status)], RetryPolicy::default());
            assert_eq!(outcome.status(), Some(status));
            assert_eq!(calls, 1);
            assert!(sleeps.is_empty());
        }
    }

    #[test]
    fn unrecognized_status_retries_with_linear_backoff() {
        let (outcome, calls, sleeps) = run(vec![ok(503), ok(502), ok(504)], RetryPolicy::default());
        assert_eq!(calls, 3);
        assert_eq!(sleeps, vec![Duration::from_secs(1), Duration::from_secs(2)]);
        assert_eq!(outcome.status(), Some(504));
    }

    #[test]
    fn recovers_after_one_retry() {
        let (outcome, calls, sleeps) = run(vec![ok(503), ok(200)], RetryPolicy::default());
        assert_eq!(outcome.status(), Some(200));
        assert_eq!(calls, 2);
        assert_eq!(sleeps, vec![Duration::from_secs(1)]);
    }

    #[test]
    fn transport_failure_everywhere_is_reported() {
        let err = || Err(TransportError::Connect("refused".into()));
        let (outcome, calls, _) = run(vec![err(), err(), err()], RetryPolicy::default());
        assert_eq!(calls, 3);
        assert!(matches!(outcome, CallOutcome::TransportFailure(TransportError::Connect(_))));
    }

    #[test]
    fn transport_failure_not_retried_when_disabled() {
        let policy = RetryPolicy {
            retry_transport_errors: false,
            ..RetryPolicy::default()
        };
        let (outcome, calls, sleeps) =
            run(vec![Err(TransportError::Timeout("slow".into())), ok(200)], policy);
        assert_eq!(calls, 1);
        assert!(sleeps.is_empty());
        assert!(matches!(outcome, CallOutcome::TransportFailure(_)));
    }

    #[test]
    fn last_observed_result_wins() {
        let (outcome, _, _) = run(
            vec![Err(TransportError::Connect("x".into())), ok(502), ok(404)],
            RetryPolicy::default(),
        );
        assert_eq!(outcome.status(), Some(404));
    }

    #[test]
    fn executor_keeps_its_policy() {
        let policy = RetryPolicy {
            max_attempts: 5,
            retry_transport_errors: false,
        };
        let exec = Executor::with_parts(Scripted::new(vec![]), Recorder::default(), policy);
        assert_eq!(exec.policy().max_attempts, 5);
        assert!(!exec.policy().retry_transport_errors);
        assert_eq!(Executor::new(Scripted::new(vec![])).policy().max_attempts, 3);
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
    }
}
