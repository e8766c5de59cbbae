//! WebSocket error types.
//!
//! Provides error types for chat client operations.

use std::fmt;

/// Chat client errors.
#[derive(Debug)]
pub enum WsError {
    /// Connection failed.
    Connection(String),

    /// Server refused the handshake with an HTTP status.
    Rejected(u16),

    /// WebSocket protocol error.
    Protocol(String),

    /// Failed to serialize message.
    Serialization(String),

    /// Connection closed.
    Closed,

    /// Timed out waiting for the server.
    Timeout,

    /// Invalid configuration.
    InvalidConfig(String),

    /// Send failed.
    SendFailed(String),
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "connection failed: {}", msg),
            Self::Rejected(status) => write!(f, "handshake rejected with status {}", status),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Serialization(msg) => write!(f, "serialization failed: {}", msg),
            Self::Closed => write!(f, "connection closed"),
            Self::Timeout => write!(f, "timed out"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::SendFailed(msg) => write!(f, "send failed: {}", msg),
        }
    }
}

impl std::error::Error for WsError {}

impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;

        match err {
            Error::Http(response) => Self::Rejected(response.status().as_u16()),
            Error::ConnectionClosed | Error::AlreadyClosed => Self::Closed,
            Error::Io(e) => Self::Connection(e.to_string()),
            other => Self::Protocol(other.to_string()),
        }
    }
}
