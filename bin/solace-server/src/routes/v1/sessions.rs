use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use solace_core::SortOrder;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::v1::message::{EnrichedMessageResponse, ListMessagesQuery};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_session_messages),
    components(schemas(EnrichedMessageResponse))
)]
pub struct SessionsApi;

/// Register conversation read routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{id}/messages", get(list_session_messages))
}

/// List a session's messages with sender and recipient display names.
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/messages",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id"), ListMessagesQuery),
    responses(
        (status = 200, description = "Conversation retrieved", body = Vec<EnrichedMessageResponse>),
        (status = 400, description = "Invalid session id or order"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn list_session_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<EnrichedMessageResponse>>, ServerError> {
    let order = match query.order.as_deref() {
        None | Some("") => SortOrder::default(),
        Some(raw) => raw
            .to_ascii_lowercase()
            .parse::<SortOrder>()
            .map_err(|_| {
                ServerError::BadRequest(format!("unknown order {raw:?}, expected asc or desc"))
            })?,
    };
    let messages = state.conversations.list_messages(&id, order).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::state::testing::memory_state;
    use axum::http::StatusCode;
    use solace_core::SendMessage;
    use uuid::Uuid;

    const SESSION: &str = "6f1c2d3e-4a5b-4c6d-8e9f-0a1b2c3d4e5f";
    const CLIENT: &str = "11111111-2222-4333-8444-555555555555";
    const COUNSELOR: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";

    async fn list(
        state: &Arc<AppState>,
        id: &str,
        order: Option<&str>,
    ) -> Result<Vec<EnrichedMessageResponse>, ServerError> {
        let Json(items) = list_session_messages(
            State(state.clone()),
            Path(id.to_owned()),
            Query(ListMessagesQuery {
                order: order.map(str::to_owned),
            }),
        )
        .await?;
        Ok(items)
    }

    #[tokio::test]
    async fn listing_is_enriched_and_ordered() {
        let (state, backend) = memory_state(Config::default());
        backend
            .set_display_name(Uuid::parse_str(COUNSELOR).unwrap(), "Dr. Rivera")
            .unwrap();
        for (from, to, body) in [(CLIENT, COUNSELOR, "first"), (COUNSELOR, CLIENT, "second")] {
            let result = state
                .resolver
                .send(SendMessage {
                    session_id: SESSION.into(),
                    sender_id: from.into(),
                    recipient_id: to.into(),
                    body: body.into(),
                })
                .await;
            assert!(result.success());
            // Keep created_at strictly increasing.
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let asc = list(&state, SESSION, None).await.unwrap();
        assert_eq!(asc.len(), 2);
        assert_eq!(asc[0].message.body, "first");
        assert_eq!(asc[0].sender_name, "Unknown user");
        assert_eq!(asc[0].recipient_name, "Dr. Rivera");
        assert_eq!(asc[1].sender_name, "Dr. Rivera");

        let desc = list(&state, SESSION, Some("DESC")).await.unwrap();
        let bodies: Vec<_> = desc.iter().map(|m| m.message.body.as_str()).collect();
        assert_eq!(bodies, ["second", "first"]);
    }

    #[tokio::test]
    async fn empty_session_lists_nothing() {
        let (state, _) = memory_state(Config::default());
        assert!(list(&state, SESSION, Some("asc")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_inputs_are_rejected() {
        let (state, _) = memory_state(Config::default());
        let err = list(&state, "session-1", None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = list(&state, SESSION, Some("sideways")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
