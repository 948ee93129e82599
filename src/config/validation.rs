//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Returns every violation, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// One semantic violation in a loaded configuration.
#[derive(Debug)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration before it is accepted into the system.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("not a socket address: {}", config.listener.bind_address),
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError {
            field: "listener.max_body_bytes",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.dispatch.max_concurrency == 0 {
        errors.push(ValidationError {
            field: "dispatch.max_concurrency",
            message: "must be at least 1".to_string(),
        });
    }
    if config.dispatch.per_item_timeout_ms == 0 {
        errors.push(ValidationError {
            field: "dispatch.per_item_timeout_ms",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.dispatch.max_response_bytes == 0 {
        errors.push(ValidationError {
            field: "dispatch.max_response_bytes",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.dispatch.retry.max_retries > 0 && config.dispatch.retry.base_delay_ms == 0 {
        errors.push(ValidationError {
            field: "dispatch.retry.base_delay_ms",
            message: "must be greater than zero when retries are enabled".to_string(),
        });
    }

    if config.auth.access_key.is_empty() {
        errors.push(ValidationError {
            field: "auth.access_key",
            message: "must not be empty".to_string(),
        });
    }

    if config.upstream.pool_max_idle_per_host == 0 {
        errors.push(ValidationError {
            field: "upstream.pool_max_idle_per_host",
            message: "must be at least 1".to_string(),
        });
    }

    if config.relay.enabled {
        if config.relay.host_header.is_empty() {
            errors.push(ValidationError {
                field: "relay.host_header",
                message: "must not be empty when relay mode is enabled".to_string(),
            });
        }
        if config.relay.allowed_hosts.is_empty() {
            errors.push(ValidationError {
                field: "relay.allowed_hosts",
                message: "must list at least one host when relay mode is enabled".to_string(),
            });
        }
        if !matches!(config.relay.scheme.as_str(), "http" | "https") {
            errors.push(ValidationError {
                field: "relay.scheme",
                message: format!("must be http or https, got {}", config.relay.scheme),
            });
        }
        if config.relay.max_body_bytes == 0 {
            errors.push(ValidationError {
                field: "relay.max_body_bytes",
                message: "must be greater than zero".to_string(),
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!(
                "not a socket address: {}",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut config = GatewayConfig::default();
        config.dispatch.max_concurrency = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "dispatch.max_concurrency"));
    }

    #[test]
    fn test_relay_mode_requires_allowlist() {
        let mut config = GatewayConfig::default();
        config.relay.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "relay.allowed_hosts"));
    }

    #[test]
    fn test_all_violations_are_reported() {
        let mut config = GatewayConfig::default();
        config.dispatch.max_concurrency = 0;
        config.auth.access_key = String::new();
        config.listener.bind_address = "nonsense".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
