//! Chatroom - real-time room broadcast over WebSocket.
//!
//! Facade crate re-exporting the workspace members.
//!
//! # Crates
//!
//! - [`server`]: Group registry, connection state machine and the axum
//!   WebSocket endpoint at `/ws/chat/{room_name}/`
//! - [`client`]: Async client for joining a room and exchanging messages
//!
//! # Example
//!
//! ```rust
//! use chatroom::server::ws::{GroupName, RoomName, RoomNamePolicy};
//!
//! let room = RoomName::parse("lobby", RoomNamePolicy::Strict).expect("valid room");
//! assert_eq!(GroupName::for_room(&room).as_str(), "chat_lobby");
//! ```

pub use chatroom_client as client;
pub use chatroom_server as server;
