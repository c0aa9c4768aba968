use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use solace_core::cancellation;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::v1::message::{
    check_payload, MarkReadRequest, MessageEnvelope, MessageResponse, SendMessageRequest,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(send_message, mark_message_read),
    components(schemas(
        SendMessageRequest,
        MarkReadRequest,
        MessageEnvelope,
        MessageResponse
    ))
)]
pub struct MessagesApi;

/// Register message write routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/{id}/read", post(mark_message_read))
}

/// Send a message in a counseling session.
///
/// The write runs on its own task. If the caller goes away, the pending
/// strategies are skipped, but a write already in flight is allowed to
/// finish.
#[utoipa::path(
    post,
    path = "/v1/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageEnvelope),
        (status = 400, description = "Invalid identifier or body"),
        (status = 500, description = "Every write strategy failed"),
        (status = 503, description = "Request cancelled"),
    )
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageEnvelope>), ServerError> {
    let Json(req) = payload.map_err(malformed_body)?;
    check_payload(&req)?;

    let (guard, signal) = cancellation();
    let resolver = Arc::clone(&state.resolver);
    let task =
        tokio::spawn(async move { resolver.send_with_cancel(req.into(), signal).await });
    let result = task
        .await
        .map_err(|e| ServerError::Internal(format!("send task failed: {e}")))?;
    guard.disarm();

    debug!(attempts = result.attempts.len(), "send finished");
    let message = result.into_result()?;
    Ok((StatusCode::CREATED, Json(MessageEnvelope::ok(message))))
}

/// Unparseable JSON, or a field of the wrong type, is a client error in the
/// same `{success:false}` shape as every other one.
fn malformed_body(rejection: JsonRejection) -> ServerError {
    ServerError::BadRequest(rejection.body_text())
}

/// Mark a message as read by its recipient.
#[utoipa::path(
    post,
    path = "/v1/messages/{id}/read",
    tag = "messages",
    params(("id" = String, Path, description = "Message id")),
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Message marked read", body = MessageEnvelope),
        (status = 400, description = "Invalid identifier"),
        (status = 404, description = "No such message for this reader"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn mark_message_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<MarkReadRequest>, JsonRejection>,
) -> Result<Json<MessageEnvelope>, ServerError> {
    let Json(req) = payload.map_err(malformed_body)?;
    check_payload(&req)?;
    let message = state
        .receipts
        .mark_read(&id, &req.reader_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("message {id} not found for this reader")))?;
    info!(message_id = %message.id, "read receipt recorded");
    Ok(Json(MessageEnvelope::ok(message)))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
