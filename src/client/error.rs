//! Error taxonomy of the student client.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// No cached student where one is required. The caller has been sent to login.
    #[error("no active session")]
    NoSession,
    /// The server no longer knows the cached student. Session purged, caller sent to login.
    #[error("session invalidated: student not found")]
    SessionInvalidated,
    /// Any other non-2xx reply. `payload` is the parsed error body or `{"error": <raw text>}`.
    #[error("HTTP {status}: {}", message_of(.payload))]
    Http { status: u16, payload: Value },
    /// No response at all.
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("session storage: {0}")]
    Storage(#[from] std::io::Error),
    #[error("adaptive test run not started")]
    RunNotStarted,
    #[error("adaptive test run already completed")]
    RunCompleted,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's `error` message, when this is an HTTP error.
    pub fn message(&self) -> Option<&str> {
        match self {
            ClientError::Http { payload, .. } => payload.get("error").and_then(Value::as_str),
            _ => None,
        }
    }
}

fn message_of(payload: &Value) -> String {
    match payload.get("error").and_then(Value::as_str) {
        Some(msg) => msg.to_string(),
        None => payload.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_error_exposes_status_and_message() {
        let err = ClientError::Http { status: 409, payload: json!({"error": "username ya existe"}) };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.message(), Some("username ya existe"));
        assert_eq!(err.to_string(), "HTTP 409: username ya existe");
    }

    #[test]
    fn non_http_errors_have_no_status() {
        assert_eq!(ClientError::NoSession.status(), None);
        assert_eq!(ClientError::SessionInvalidated.message(), None);
    }
}
