// Turning a `CallOutcome` into something the user can be told.

use crate::executor::CallOutcome;
use serde_json::Value;

/// Shown when a 400/500 body carries no usable `message`.
pub const NO_ERROR_DETAIL: &str = "no error detail available";

/// End-to-end result of one user command.
///
/// Every workflow produces exactly one of these, and the terminal output for
/// the command is derived from it alone.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowResult<T = Value> {
    Success(T),
    /// The service rejected the request (400).
    ClientError(String),
    /// The service failed internally (500).
    ServerError(String),
    /// The referenced asset does not exist (404 on text extraction).
    NotFound(String),
    /// The command could not be completed on the client side.
    Aborted(String),
}

impl<T> WorkflowResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowResult::Success(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> WorkflowResult<U> {
        self.and_then(|v| WorkflowResult::Success(f(v)))
    }

    /// Chain a step that only runs on success and may itself fail.
    pub fn and_then<U, F: FnOnce(T) -> WorkflowResult<U>>(self, f: F) -> WorkflowResult<U> {
        match self {
            WorkflowResult::Success(v) => f(v),
            WorkflowResult::ClientError(m) => WorkflowResult::ClientError(m),
            WorkflowResult::ServerError(m) => WorkflowResult::ServerError(m),
            WorkflowResult::NotFound(m) => WorkflowResult::NotFound(m),
            WorkflowResult::Aborted(m) => WorkflowResult::Aborted(m),
        }
    }

    /// The message of a non-success result.
    pub fn message(&self) -> Option<&str> {
        match self {
            WorkflowResult::Success(_) => None,
            WorkflowResult::ClientError(m)
            | WorkflowResult::ServerError(m)
            | WorkflowResult::NotFound(m)
            | WorkflowResult::Aborted(m) => Some(m),
        }
    }
}

/// Classify an executed call.
///
/// 200 always becomes `Success` with the body as JSON, 400/500 become
/// `ClientError`/`ServerError` with the body's `message`, and anything else
/// (transport failure, a status left over after retries) is `Aborted`.
pub fn interpret(outcome: CallOutcome) -> WorkflowResult {
    match outcome {
        CallOutcome::Responded { status: 200, body } => {
            WorkflowResult::Success(success_body(body))
        }
        CallOutcome::Responded { status: 400, body } => {
            WorkflowResult::ClientError(error_message(&body))
        }
        CallOutcome::Responded { status: 500, body } => {
            WorkflowResult::ServerError(error_message(&body))
        }
        CallOutcome::Responded { status, .. } => {
            WorkflowResult::Aborted(format!("unexpected status code {status} from service"))
        }
        CallOutcome::TransportFailure(cause) => {
            WorkflowResult::Aborted(format!("could not reach service: {cause}"))
        }
    }
}

/// Parse a 200 body. Non-JSON text is kept as a string and an empty body is
/// `null`; callers that need particular fields check for them.
fn success_body(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

/// Pull the `message` field out of an error body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| NO_ERROR_DETAIL.to_string())
}
