//! WebSocket client for chat rooms.
//!
//! # Example
//!
//! ```rust,ignore
//! use chatroom_client::ws::ChatClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ChatClient::join("ws://127.0.0.1:8080", "lobby").await?;
//!
//!     client.send("hello").await?;
//!
//!     loop {
//!         let msg = client.next_message().await?;
//!         println!("{}", msg.message);
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod messages;

pub use client::ChatClient;
pub use config::WsConfig;
pub use error::WsError;
pub use messages::ChatMessage;
