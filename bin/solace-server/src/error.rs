//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body of the form
//! `{"success": false, "error": "..."}` with a matching status code.
//!
//! Internal failures (exhausted write chain, backend errors) are logged with
//! full detail; the caller only ever sees a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use solace_core::{ReadError, SendError, ValidationFailure};
use thiserror::Error;
use tracing::{error, warn};

pub const GENERIC_SEND_FAILURE: &str = "message could not be sent, please try again";
const GENERIC_INTERNAL: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the resolver.
    #[error(transparent)]
    Send(#[from] SendError),

    /// Propagated from the conversation read model or read receipts.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationFailure> for ServerError {
    fn from(failure: ValidationFailure) -> Self {
        ServerError::Send(SendError::Validation(failure))
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Send(SendError::Validation(_)) => StatusCode::BAD_REQUEST,
            ServerError::Send(SendError::AllStrategiesExhausted { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Send(SendError::Cancelled { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Read(ReadError::Validation(_)) => StatusCode::BAD_REQUEST,
            ServerError::Read(ReadError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show the caller.
    fn client_message(&self) -> String {
        match self {
            // Client-facing errors: expose the message directly.
            ServerError::Send(SendError::Validation(v))
            | ServerError::Read(ReadError::Validation(v)) => v.to_string(),
            ServerError::NotFound(m) | ServerError::BadRequest(m) => m.clone(),
            ServerError::Send(SendError::Cancelled { .. }) => {
                "request cancelled before the message was sent".to_owned()
            }

            ServerError::Send(SendError::AllStrategiesExhausted { attempts }) => {
                let reasons: Vec<String> = attempts
                    .iter()
                    .filter_map(|a| a.failure.as_ref().map(|f| format!("{:?}: {f}", a.step)))
                    .collect();
                error!(
                    attempts = attempts.len(),
                    ?reasons,
                    "message send exhausted every strategy"
                );
                GENERIC_SEND_FAILURE.to_owned()
            }
            ServerError::Read(ReadError::Backend(e)) => {
                error!(error = %e, "backend error on read path");
                GENERIC_INTERNAL.to_owned()
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                GENERIC_INTERNAL.to_owned()
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            warn!(error = %self, "request cancelled");
        }
        let message = self.client_message();
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use solace_core::{AttemptLog, AttemptStep, BackendError};
    use std::time::Duration;

    async fn body_of(err: ServerError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_names_the_field() {
        let err: ServerError = ValidationFailure::InvalidIdentifier {
            field: "senderId",
            value: "nope".into(),
        }
        .into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "invalid identifier: senderId");
    }

    #[tokio::test]
    async fn exhaustion_hides_backend_detail() {
        let err = ServerError::Send(SendError::AllStrategiesExhausted {
            attempts: vec![AttemptLog {
                step: AttemptStep::Strategy("structured_insert"),
                failure: Some("relation \"session_messages\" does not exist".into()),
                elapsed: Duration::from_millis(3),
            }],
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], GENERIC_SEND_FAILURE);
        assert!(!body.to_string().contains("session_messages"));
    }

    #[tokio::test]
    async fn backend_read_failure_is_generic() {
        let err = ServerError::Read(ReadError::Backend(BackendError::Unavailable(
            "connection refused".into(),
        )));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], GENERIC_INTERNAL);
    }

    #[test]
    fn cancelled_maps_to_service_unavailable() {
        let err = ServerError::Send(SendError::Cancelled { attempts: Vec::new() });
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ServerError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }
}
