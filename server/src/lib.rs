//! Chatroom Server - real-time room broadcast over WebSocket.
//!
//! Clients join a named room at `/ws/chat/{room_name}/` and every chat
//! message sent to the room is fanned out to all of its members.
//!
//! # Components
//!
//! - [`config`]: Server configuration
//! - [`ws`]: Room resolution, group registry, connection state machine and
//!   the WebSocket endpoint
//! - [`health`]: Health endpoint
//! - [`server`]: Router and serving

pub mod config;
pub mod error;
pub mod health;
pub mod server;
pub mod state;
pub mod ws;

pub use config::{ConfigError, ServerConfig};
pub use error::ChatError;
pub use server::Server;
pub use state::AppState;
