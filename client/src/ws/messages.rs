//! WebSocket message types.
//!
//! Chat frames use the same shape in both directions.

use serde::{Deserialize, Serialize};

/// A chat frame: `{"message": "<string>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message text.
    pub message: String,
}

impl ChatMessage {
    /// Creates a chat message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ChatMessage {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_chat_message() {
        let json = serde_json::to_string(&ChatMessage::new("hello")).expect("serialize");
        assert_eq!(json, r#"{"message":"hello"}"#);
    }

    #[test]
    fn test_deserialize_chat_message() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"message":"world"}"#).expect("deserialize");
        assert_eq!(msg, ChatMessage::from("world"));
    }

    #[test]
    fn test_deserialize_missing_message() {
        let result = serde_json::from_str::<ChatMessage>(r#"{"type":"pong"}"#);
        assert!(result.is_err());
    }
}
