//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [auth]
            access_key = "secret"

            [dispatch]
            max_concurrency = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.access_key, "secret");
        assert_eq!(config.dispatch.max_concurrency, 4);
        assert_eq!(config.dispatch.retry.max_retries, 3);
    }

    #[test]
    fn test_relay_section_parses_augment_mode() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [relay]
            enabled = true
            allowed_hosts = ["api.example.com"]
            augment = "transform"
            "#,
        )
        .unwrap();

        assert!(config.relay.enabled);
        assert_eq!(config.relay.augment, crate::augment::AugmentMode::Transform);
    }
}
