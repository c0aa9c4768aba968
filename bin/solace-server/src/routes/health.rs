//! Health endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health), components(schemas(HealthResponse)))]
pub struct HealthApi;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// `memory`, `postgres` or `postgres+rest`.
    pub storage: &'static str,
    /// Number of write strategies a send may try.
    pub write_strategies: usize,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Report which storage the messaging service is wired to.
///
/// Answers from configuration only, so a slow database does not make the
/// service look dead.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Messaging service is up", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.config.storage_mode(),
        write_strategies: state.resolver.chain_len(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::state::testing::memory_state;

    #[tokio::test]
    async fn health_reports_storage_and_chain() {
        let (state, _) = memory_state(Config::default());
        let Json(body) = get_health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert!(!body.version.is_empty());
        assert_eq!(body.storage, "memory");
        assert_eq!(body.write_strategies, 3);
    }
}
