//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Path pattern the mock redirect matches when none is configured.
pub const DEFAULT_PATH_PATTERN: &str = r"^/api/organizations/kml/.*$";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Mock server redirect rule.
    pub mock_redirect: MockRedirectConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Redirects requests whose path matches `path_pattern` to a mock server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockRedirectConfig {
    /// Register the rule at startup.
    pub enabled: bool,

    /// Mock server hostname, without a leading `https://`.
    pub target_host: Option<String>,

    /// Regex tested against the request path component.
    pub path_pattern: String,

    /// Scheme written into matching requests.
    pub target_scheme: String,

    /// Port written into matching requests.
    pub target_port: u16,
}

impl Default for MockRedirectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_host: None,
            path_pattern: DEFAULT_PATH_PATTERN.to_string(),
            target_scheme: "https".to_string(),
            target_port: 443,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert!(config.mock_redirect.enabled);
        assert_eq!(config.mock_redirect.target_host, None);
        assert_eq!(config.mock_redirect.path_pattern, DEFAULT_PATH_PATTERN);
        assert_eq!(config.mock_redirect.target_scheme, "https");
        assert_eq!(config.mock_redirect.target_port, 443);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [mock_redirect]
            target_host = "abc123.mock.pstmn.io"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.mock_redirect.target_host.as_deref(),
            Some("abc123.mock.pstmn.io")
        );
        assert_eq!(config.mock_redirect.target_port, 443);
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
