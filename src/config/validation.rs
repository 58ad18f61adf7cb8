//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check the mock target is a bare host, not a URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::{MockRedirectConfig, ProxyConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("mock_redirect.target_host: must be set when the redirect is enabled")]
    MissingTargetHost,

    #[error("mock_redirect.target_host: {value:?} must not include a scheme prefix")]
    TargetHostHasScheme { value: String },

    #[error("mock_redirect.target_host: {value:?} is not a valid host")]
    InvalidTargetHost { value: String },

    #[error("mock_redirect.target_scheme: expected \"http\" or \"https\", got {value:?}")]
    UnsupportedScheme { value: String },

    #[error("mock_redirect.path_pattern: {reason}")]
    InvalidPattern { reason: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        "listener.bind_address",
        &config.listener.bind_address,
        &mut errors,
    );
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "timeouts.connect_secs",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "timeouts.request_secs",
        });
    }

    if config.mock_redirect.enabled {
        validate_mock_redirect(&config.mock_redirect, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_mock_redirect(config: &MockRedirectConfig, errors: &mut Vec<ValidationError>) {
    match config.target_host.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingTargetHost),
        Some(host) => {
            if let Some(err) = check_target_host(host) {
                errors.push(err);
            }
        }
    }

    if config.target_scheme != "http" && config.target_scheme != "https" {
        errors.push(ValidationError::UnsupportedScheme {
            value: config.target_scheme.clone(),
        });
    }

    if config.target_port == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "mock_redirect.target_port",
        });
    }

    if let Err(e) = Regex::new(&config.path_pattern) {
        errors.push(ValidationError::InvalidPattern {
            reason: e.to_string(),
        });
    }
}

fn check_target_host(host: &str) -> Option<ValidationError> {
    if host.contains("://") {
        return Some(ValidationError::TargetHostHasScheme {
            value: host.to_string(),
        });
    }
    if host.contains(['/', '?', '#', '@', ' ']) {
        return Some(ValidationError::InvalidTargetHost {
            value: host.to_string(),
        });
    }
    match url::Host::parse(host) {
        Ok(_) => None,
        Err(_) => Some(ValidationError::InvalidTargetHost {
            value: host.to_string(),
        }),
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.mock_redirect.target_host = Some("abc123.mock.pstmn.io".into());
        config
    }

    #[test]
    fn accepts_minimal_config() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn disabled_redirect_needs_no_host() {
        let mut config = ProxyConfig::default();
        config.mock_redirect.enabled = false;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn rejects_scheme_prefixed_host() {
        let mut config = valid_config();
        config.mock_redirect.target_host = Some("https://abc123.mock.pstmn.io".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TargetHostHasScheme {
                value: "https://abc123.mock.pstmn.io".into()
            }]
        );
    }

    #[test]
    fn rejects_host_with_path() {
        let mut config = valid_config();
        config.mock_redirect.target_host = Some("mock.example.com/v1".into());
        assert!(matches!(
            validate_config(&config).unwrap_err()[0],
            ValidationError::InvalidTargetHost { .. }
        ));
    }

    #[test]
    fn accepts_ip_literal_host() {
        let mut config = valid_config();
        config.mock_redirect.target_host = Some("127.0.0.1".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn reports_all_errors_together() {
        let mut config = ProxyConfig::default();
        config.mock_redirect.target_host = Some("   ".into());
        config.mock_redirect.target_port = 0;
        config.mock_redirect.target_scheme = "ftp".into();
        config.mock_redirect.path_pattern = "^/api/(".into();
        config.timeouts.request_secs = 0;
        config.listener.bind_address = "localhost".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::MissingTargetHost));
        assert!(errors.contains(&ValidationError::ZeroValue {
            field: "mock_redirect.target_port"
        }));
        assert!(errors.contains(&ValidationError::ZeroValue {
            field: "timeouts.request_secs"
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPattern { .. })));
    }
}
