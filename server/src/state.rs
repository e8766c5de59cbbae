//! Shared application state.

use chrono::{DateTime, Utc};

use crate::config::ServerConfig;
use crate::ws::WsState;

/// State shared by every HTTP and WebSocket handler.
#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    /// WebSocket state.
    pub ws: WsState,
    /// When the server state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates the state for a configuration, backed by an in-memory registry.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            ws: WsState::new(config),
            started_at: Utc::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}
