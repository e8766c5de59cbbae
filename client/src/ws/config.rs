//! WebSocket configuration.
//!
//! Provides configuration options for the chat client.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio_tungstenite::tungstenite::http::Uri;

use super::error::WsError;

/// Characters escaped in the room path segment: all but RFC 3986 unreserved.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Default server URL.
pub const DEFAULT_BASE_URL: &str = "ws://127.0.0.1:8080";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of inbound messages buffered before the reader waits.
pub const DEFAULT_EVENT_BUFFER: usize = 1000;

/// Chat client configuration.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Server base URL, e.g. `ws://127.0.0.1:8080`.
    pub base_url: String,

    /// Room to join.
    pub room: String,

    /// `Origin` header sent with the handshake. Derived from
    /// [`base_url`](Self::base_url) when unset.
    pub origin: Option<String>,

    /// Handshake timeout.
    pub connect_timeout: Duration,

    /// Inbound message buffer.
    pub event_buffer: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            room: String::new(),
            origin: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl WsConfig {
    /// Creates a configuration for joining `room` on the server at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            room: room.into(),
            ..Default::default()
        }
    }

    /// Sets the `Origin` header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the handshake timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the inbound message buffer.
    #[must_use]
    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }

    /// Returns the WebSocket URL for the room.
    #[must_use]
    pub fn room_url(&self) -> String {
        format!(
            "{}/ws/chat/{}/",
            self.base_url.trim_end_matches('/'),
            utf8_percent_encode(&self.room, PATH_SEGMENT)
        )
    }

    /// Returns the `Origin` header value for the handshake.
    ///
    /// Without an explicit origin, `ws://host:port/...` maps to
    /// `http://host:port` and `wss://` to `https://`.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::InvalidConfig`] if the base URL cannot be parsed
    /// or has no host.
    pub fn origin_header(&self) -> Result<String, WsError> {
        if let Some(origin) = &self.origin {
            return Ok(origin.clone());
        }

        let uri: Uri = self
            .base_url
            .parse()
            .map_err(|e| WsError::InvalidConfig(format!("invalid base_url: {}", e)))?;
        let authority = uri
            .authority()
            .ok_or_else(|| WsError::InvalidConfig("base_url has no host".to_string()))?;
        let scheme = match uri.scheme_str() {
            Some("wss") => "https",
            _ => "http",
        };

        Ok(format!("{}://{}", scheme, authority))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), WsError> {
        if self.base_url.is_empty() {
            return Err(WsError::InvalidConfig(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("ws://") && !self.base_url.starts_with("wss://") {
            return Err(WsError::InvalidConfig(
                "base_url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.room.is_empty() {
            return Err(WsError::InvalidConfig("room cannot be empty".to_string()));
        }

        if self.event_buffer == 0 {
            return Err(WsError::InvalidConfig(
                "event_buffer must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
