//! Chatroom Client - async client for the chat room WebSocket server.
//!
//! Connects to `/ws/chat/{room}/`, sends `{"message": ...}` frames and
//! yields the messages broadcast to the room.
//!
//! - [`ChatClient`]: Connection to a single room
//! - [`WsConfig`]: Server URL, room, origin and timeouts
//! - [`WsError`]: Client errors

pub mod ws;

pub use ws::{ChatClient, ChatMessage, WsConfig, WsError};
