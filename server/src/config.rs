//! Server configuration.
//!
//! Provides configuration options for the chat server, loaded from the
//! environment with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::ws::origin::DEFAULT_ALLOWED_HOSTS;
use crate::ws::room::RoomNamePolicy;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default per-connection mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Configuration for the chat server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Envelopes buffered per connection before fan-out drops them.
    pub mailbox_capacity: usize,

    /// Validation applied to room names.
    pub room_name_policy: RoomNamePolicy,

    /// Host patterns accepted in the handshake `Origin` header.
    pub allowed_hosts: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            room_name_policy: RoomNamePolicy::default(),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| (*h).to_string()).collect(),
        }
    }
}

impl ServerConfig {
    /// Creates a new configuration bound to the given host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Loads the configuration from `CHAT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("CHAT_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("CHAT_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidVar("CHAT_PORT", port))?;
        }

        if let Some(capacity) = lookup("CHAT_MAILBOX_CAPACITY") {
            config.mailbox_capacity = capacity
                .parse()
                .map_err(|_| ConfigError::InvalidVar("CHAT_MAILBOX_CAPACITY", capacity))?;
        }

        if let Some(policy) = lookup("CHAT_ROOM_NAME_POLICY") {
            config.room_name_policy = policy
                .parse()
                .map_err(|_| ConfigError::InvalidVar("CHAT_ROOM_NAME_POLICY", policy))?;
        }

        if let Some(hosts) = lookup("CHAT_ALLOWED_HOSTS") {
            config.allowed_hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the mailbox capacity.
    #[must_use]
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Sets the room name policy.
    #[must_use]
    pub fn with_room_name_policy(mut self, policy: RoomNamePolicy) -> Self {
        self.room_name_policy = policy;
        self
    }

    /// Sets the allowed origin hosts.
    #[must_use]
    pub fn with_allowed_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = hosts;
        self
    }

    /// Returns the `host:port` address to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::InvalidMailboxCapacity);
        }

        if self.allowed_hosts.is_empty() {
            return Err(ConfigError::NoAllowedHosts);
        }

        if self.host.trim().is_empty() || self.host.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidHost(self.host.clone()));
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable holds an unparsable value.
    #[error("invalid value for {0}: {1:?}")]
    InvalidVar(&'static str, String),

    /// Mailbox capacity must be positive.
    #[error("mailbox_capacity must be > 0")]
    InvalidMailboxCapacity,

    /// Origin checks need at least one host pattern.
    #[error("allowed_hosts must not be empty (use \"*\" to allow any origin)")]
    NoAllowedHosts,

    /// Bind host is blank or malformed.
    #[error("invalid host: {0:?}")]
    InvalidHost(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
        assert_eq!(config.room_name_policy, RoomNamePolicy::Strict);
        assert_eq!(config.allowed_hosts.len(), 3);
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::new("127.0.0.1", 9000)
            .with_mailbox_capacity(8)
            .with_room_name_policy(RoomNamePolicy::Permissive)
            .with_allowed_hosts(vec!["*".to_string()]);

        assert_eq!(config.port, 9000);
        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.room_name_policy, RoomNamePolicy::Permissive);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CHAT_HOST", "127.0.0.1"),
            ("CHAT_PORT", "9001"),
            ("CHAT_MAILBOX_CAPACITY", "32"),
            ("CHAT_ROOM_NAME_POLICY", "permissive"),
            ("CHAT_ALLOWED_HOSTS", "chat.example.com, .example.org,"),
        ]))
        .expect("config");

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9001);
        assert_eq!(config.mailbox_capacity, 32);
        assert_eq!(config.room_name_policy, RoomNamePolicy::Permissive);
        assert_eq!(
            config.allowed_hosts,
            vec!["chat.example.com".to_string(), ".example.org".to_string()]
        );
    }

    #[test]
    fn test_config_from_lookup_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[("CHAT_PORT", "eighty")]))
            .expect_err("invalid");
        assert_eq!(err, ConfigError::InvalidVar("CHAT_PORT", "eighty".to_string()));
    }

    #[test]
    fn test_config_validate_zero_capacity() {
        let config = ServerConfig::default().with_mailbox_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidMailboxCapacity));
    }

    #[test]
    fn test_config_validate_no_allowed_hosts() {
        let err = ServerConfig::from_lookup(lookup(&[("CHAT_ALLOWED_HOSTS", " , ")]))
            .expect_err("invalid");
        assert_eq!(err, ConfigError::NoAllowedHosts);
    }

    #[test]
    fn test_config_validate_bad_host() {
        let config = ServerConfig::new("not a host", 8080);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHost(_))
        ));
    }
}
