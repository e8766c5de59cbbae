//! Health endpoint.

use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;
use crate::ws::{GroupRegistry, WsMetricsSnapshot};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"` while the registry accepts work, `"degraded"` otherwise.
    pub status: &'static str,
    /// When the server started.
    pub started_at: DateTime<Utc>,
    /// Rooms with at least one member.
    pub groups: usize,
    /// Connection and message counters.
    #[serde(flatten)]
    pub metrics: WsMetricsSnapshot,
}

/// Reports liveness and basic counters.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = &state.ws.registry;
    let status = if registry.is_available() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        started_at: state.started_at,
        groups: registry.group_count().await,
        metrics: state.ws.metrics.snapshot(),
    })
}
