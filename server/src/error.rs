//! Chat error types.
//!
//! Every variant is handled inside the connection task; none of them is
//! reported to the client.

/// Errors raised by the room broadcast core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Inbound frame is not JSON or lacks a string `message` field.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The group registry cannot subscribe or publish.
    #[error("group registry unavailable")]
    RegistryUnavailable,

    /// Operation invoked on a connection that is not open.
    #[error("connection closed")]
    ConnectionClosed,

    /// Group event with a type this handler does not understand.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// Room name rejected by the configured policy.
    #[error("invalid room name: {0}")]
    InvalidRoomName(String),

    /// Handshake origin not in the allowed hosts.
    #[error("origin rejected: {0}")]
    OriginRejected(String),
}

impl ChatError {
    /// Returns a short machine-readable code for logs and metrics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            Self::RegistryUnavailable => "REGISTRY_UNAVAILABLE",
            Self::ConnectionClosed => "CONNECTION_CLOSED",
            Self::UnknownEventType(_) => "UNKNOWN_EVENT_TYPE",
            Self::InvalidRoomName(_) => "INVALID_ROOM_NAME",
            Self::OriginRejected(_) => "ORIGIN_REJECTED",
        }
    }
}
