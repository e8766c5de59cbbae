//! WebSocket module for room broadcast.
//!
//! Clients join a room by opening `/ws/chat/{room_name}/`. Every text frame
//! a client sends is published to the room's group and delivered to every
//! connection in that group, the sender included.
//!
//! # Wire format
//!
//! - Inbound: `{"message": "<string>"}`
//! - Outbound: `{"message": "<string>"}`
//!
//! # Components
//!
//! - [`room`]: Room name validation and group derivation
//! - [`registry`]: Group membership and fan-out
//! - [`connection`]: Per-connection state machine
//! - [`handler`]: Upgrade handler and socket loop
//! - [`origin`]: Handshake origin checks

pub mod connection;
pub mod handler;
pub mod messages;
pub mod metrics;
pub mod origin;
pub mod registry;
pub mod room;

pub use connection::{Connection, ConnectionState};
pub use handler::{ws_handler, WsState};
pub use messages::{ChatMessage, Envelope, GroupEvent, CHAT_MESSAGE_EVENT};
pub use metrics::{WsMetrics, WsMetricsSnapshot};
pub use origin::OriginValidator;
pub use registry::{GroupRegistry, InMemoryGroupRegistry, Mailbox};
pub use room::{GroupName, RoomName, RoomNamePolicy};
