//! Origin checks for WebSocket handshakes.
//!
//! Browsers send an `Origin` header with every WebSocket handshake; only
//! pages served from an allowed host may join a room.

use axum::http::Uri;

/// Hosts allowed by default.
pub const DEFAULT_ALLOWED_HOSTS: [&str; 3] = [".localhost", "127.0.0.1", "[::1]"];

/// Validates handshake origins against a list of host patterns.
///
/// Patterns follow the usual allowed-hosts rules:
///
/// - `*` matches every origin, including a missing one
/// - `.example.com` matches `example.com` and all of its subdomains
/// - anything else must equal the origin host (case-insensitive)
#[derive(Debug, Clone)]
pub struct OriginValidator {
    allowed_hosts: Vec<String>,
}

impl Default for OriginValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS.iter().map(|h| (*h).to_string()).collect())
    }
}

impl OriginValidator {
    /// Creates a validator for the given host patterns.
    #[must_use]
    pub fn new(allowed_hosts: Vec<String>) -> Self {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Creates a validator that accepts every origin.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::new(vec!["*".to_string()])
    }

    /// Returns the configured host patterns.
    #[must_use]
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// Returns true if a handshake with this `Origin` header may proceed.
    #[must_use]
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_hosts.iter().any(|p| p == "*") {
            return true;
        }

        let Some(host) = origin.and_then(origin_host) else {
            return false;
        };

        self.allowed_hosts
            .iter()
            .any(|pattern| host_matches(pattern, &host))
    }
}

/// Extracts the lowercase host of an origin such as `https://chat.example.com:8443`.
fn origin_host(origin: &str) -> Option<String> {
    let uri: Uri = origin.parse().ok()?;
    uri.scheme()?;
    let host = uri.host()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

fn host_matches(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix('.') {
        Some(domain) => host == domain || host.ends_with(pattern),
        None => host == pattern,
    }
}
