//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read and deserialize a TOML file without semantic checks.
///
/// For callers that adjust the result before validating it themselves.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [upstream]
            origin = "http://127.0.0.1:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.origin, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = parse_config(
            r#"
            [timeouts]
            connect_secs = 0
            request_secs = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v.len() == 2));
        assert_eq!(
            err.to_string(),
            "Validation failed: timeouts.connect_secs must be greater than zero, \
             timeouts.request_secs must be greater than zero"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/pinfeed.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_read_config_skips_validation() {
        let path = std::env::temp_dir().join(format!("pinfeed-read-{}.toml", std::process::id()));
        fs::write(&path, "[listener]\nbind_address = \"nowhere\"\n").unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "nowhere");
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));

        fs::remove_file(&path).unwrap();
    }
}
