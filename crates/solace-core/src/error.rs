//! Error taxonomy for the messaging core.
//!
//! Only [`ValidationFailure`] and [`SendError`] cross the resolver boundary.
//! [`WriteFailure`] is recorded per attempt and [`BackendError`] is what the
//! port adapters hand back to the strategies.

use thiserror::Error;

use crate::resolver::AttemptLog;

/// A supplied input was malformed; no write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("invalid identifier: {field}")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("message body is empty")]
    EmptyBody,

    #[error("message body exceeds {max} characters")]
    BodyTooLong { max: usize },

    #[error("sender and recipient must differ")]
    SelfAddressed,
}

/// One strategy's attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{strategy}: {reason}")]
pub struct WriteFailure {
    pub strategy: &'static str,
    pub reason: String,
}

impl WriteFailure {
    pub fn new(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

/// Failure reported by a backend adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Propagated from the Postgres pool.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The HTTP backend answered with a non-2xx status.
    #[error("backend responded {status}: {body}")]
    Status { status: u16, body: String },

    /// A row could not be converted to or from JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A table, procedure, or column name is not a plain SQL identifier.
    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The adapter does not implement this operation.
    #[error("unsupported by {backend}: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: String,
    },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Why a send did not deliver a message.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("all {} write strategies failed", attempts.len())]
    AllStrategiesExhausted { attempts: Vec<AttemptLog> },

    #[error("send cancelled after {} attempts", attempts.len())]
    Cancelled { attempts: Vec<AttemptLog> },
}

/// Failure on the read side (listing or read receipts).
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn invalid_identifier_names_the_field_only() {
        let e = ValidationFailure::InvalidIdentifier {
            field: "senderId",
            value: "not-a-uuid".into(),
        };
        assert_eq!(e.to_string(), "invalid identifier: senderId");
    }

    #[test]
    fn write_failure_display_includes_strategy() {
        let e = WriteFailure::new("structured_insert", "permission denied");
        assert_eq!(e.to_string(), "structured_insert: permission denied");
    }

    #[test]
    fn exhausted_reports_attempt_count() {
        let e = SendError::AllStrategiesExhausted { attempts: Vec::new() };
        assert_eq!(e.to_string(), "all 0 write strategies failed");
    }
}
