//! WebSocket message types.
//!
//! Defines the client wire format and the envelopes exchanged through the
//! group registry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ChatError;

/// Envelope type for chat messages.
pub const CHAT_MESSAGE_EVENT: &str = "chat.message";

/// Chat frame, identical in both directions.
///
/// Unknown fields on inbound frames are ignored.
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

    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::MalformedPayload`] if the frame is not a JSON
    /// object with a string `message` field.
    pub fn decode(text: &str) -> Result<Self, ChatError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ChatError::MalformedPayload(e.to_string()))?;

        let Value::Object(fields) = value else {
            return Err(ChatError::MalformedPayload(
                "expected a JSON object".to_string(),
            ));
        };

        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ChatError::MalformedPayload("missing string field `message`".to_string())
            })?;

        Ok(Self::new(message))
    }

    /// Encodes the message as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::MalformedPayload`] if serialization fails.
    pub fn encode(&self) -> Result<String, ChatError> {
        serde_json::to_string(self).map_err(|e| ChatError::MalformedPayload(e.to_string()))
    }
}

/// Tagged event fanned out by the group registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event type, e.g. `chat.message`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Remaining event fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// Creates an envelope with no fields.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            fields: Map::new(),
        }
    }

    /// Creates a `chat.message` envelope.
    #[must_use]
    pub fn chat_message(message: impl Into<String>) -> Self {
        Self::new(CHAT_MESSAGE_EVENT).with_field("message", Value::String(message.into()))
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Interprets the envelope as a known group event.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::UnknownEventType`] for types other than
    /// `chat.message`, and [`ChatError::MalformedPayload`] if a chat
    /// message lacks a string `message` field.
    pub fn event(&self) -> Result<GroupEvent, ChatError> {
        match self.event_type.as_str() {
            CHAT_MESSAGE_EVENT => {
                let message = self
                    .fields
                    .get("message")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ChatError::MalformedPayload("chat.message without message".to_string())
                    })?;
                Ok(GroupEvent::ChatMessage(ChatMessage::new(message)))
            }
            other => Err(ChatError::UnknownEventType(other.to_string())),
        }
    }
}

/// Group events a connection knows how to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    /// A chat message for the room.
    ChatMessage(ChatMessage),
}
