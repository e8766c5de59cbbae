//! Room name resolution.
//!
//! Maps the room name taken from the WebSocket path onto the group name
//! used in the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Namespace prefix for chat groups in a shared registry.
pub const GROUP_PREFIX: &str = "chat_";

/// Group names must be shorter than this many characters.
pub const MAX_GROUP_NAME_LEN: usize = 100;

/// Validation applied to room names before deriving a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomNamePolicy {
    /// ASCII alphanumerics, `-`, `_` and `.`; group name under 100 chars.
    #[default]
    Strict,
    /// Any non-empty string.
    Permissive,
}

impl FromStr for RoomNamePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("unknown room name policy: {other}")),
        }
    }
}

/// A room name accepted by a [`RoomNamePolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

impl RoomName {
    /// Parses a raw path segment into a room name.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidRoomName`] if the name is empty or breaks
    /// the policy.
    pub fn parse(raw: &str, policy: RoomNamePolicy) -> Result<Self, ChatError> {
        if raw.is_empty() {
            return Err(ChatError::InvalidRoomName("room name is empty".to_string()));
        }

        if policy == RoomNamePolicy::Strict {
            if let Some(c) = raw.chars().find(|c| !is_group_name_char(*c)) {
                return Err(ChatError::InvalidRoomName(format!(
                    "{raw:?} contains disallowed character {c:?}"
                )));
            }

            if GROUP_PREFIX.len() + raw.len() >= MAX_GROUP_NAME_LEN {
                return Err(ChatError::InvalidRoomName(format!(
                    "{raw:?} is too long"
                )));
            }
        }

        Ok(Self(raw.to_string()))
    }

    /// Returns the room name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical registry group for a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupName(String);

impl GroupName {
    /// Derives the group for a room by prefixing [`GROUP_PREFIX`].
    #[must_use]
    pub fn for_room(room: &RoomName) -> Self {
        Self(format!("{GROUP_PREFIX}{}", room.as_str()))
    }

    /// Returns the group name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const fn is_group_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_name_for_room() {
        let room = RoomName::parse("room_1", RoomNamePolicy::Strict).expect("room");
        let group = GroupName::for_room(&room);
        assert_eq!(group.as_str(), "chat_room_1");
        assert_eq!(group.to_string(), "chat_room_1");
    }

    #[test]
    fn test_parse_empty_rejected_by_both_policies() {
        assert!(RoomName::parse("", RoomNamePolicy::Strict).is_err());
        assert!(RoomName::parse("", RoomNamePolicy::Permissive).is_err());
    }

    #[test]
    fn test_parse_strict_allows_dots_and_dashes() {
        let room = RoomName::parse("team-a.standup_2", RoomNamePolicy::Strict);
        assert!(room.is_ok());
    }

    #[test]
    fn test_parse_strict_rejects_special_characters() {
        let err = RoomName::parse("caf\u{e9} ol\u{e9}", RoomNamePolicy::Strict)
            .expect_err("should reject");
        assert_eq!(err.code(), "INVALID_ROOM_NAME");

        assert!(RoomName::parse("a b", RoomNamePolicy::Strict).is_err());
        assert!(RoomName::parse("a/b", RoomNamePolicy::Strict).is_err());
    }

    #[test]
    fn test_parse_strict_length_limit() {
        let longest = "r".repeat(MAX_GROUP_NAME_LEN - GROUP_PREFIX.len() - 1);
        assert!(RoomName::parse(&longest, RoomNamePolicy::Strict).is_ok());

        let too_long = format!("{longest}r");
        assert!(RoomName::parse(&too_long, RoomNamePolicy::Strict).is_err());
    }

    #[test]
    fn test_parse_permissive_accepts_anything_non_empty() {
        let room = RoomName::parse("caf\u{e9} & friends!", RoomNamePolicy::Permissive)
            .expect("room");
        assert_eq!(
            GroupName::for_room(&room).as_str(),
            "chat_caf\u{e9} & friends!"
        );

        let long = "x".repeat(500);
        assert!(RoomName::parse(&long, RoomNamePolicy::Permissive).is_ok());
    }

    #[test]
    fn test_distinct_rooms_distinct_groups() {
        let a = RoomName::parse("room_1", RoomNamePolicy::Strict).expect("room");
        let b = RoomName::parse("room_2", RoomNamePolicy::Strict).expect("room");
        assert_ne!(GroupName::for_room(&a), GroupName::for_room(&b));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse(), Ok(RoomNamePolicy::Strict));
        assert_eq!(" Permissive ".parse(), Ok(RoomNamePolicy::Permissive));
        assert!("lenient".parse::<RoomNamePolicy>().is_err());
    }
}
