//! Configuration parsing and validation for fplock
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Fingerprint prompt strings
//! - Daemon settings (log level, locked hint)
//! - Validation with clear error messages

mod config;
mod paths;
mod schema;
mod validation;

pub use config::*;
pub use paths::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    if !path.exists() {
        info!(config_path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Config::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_minimal_config() {
        let config = parse_config("config_version = 1").unwrap();
        assert!(config.fingerprint.enabled);
        assert_eq!(config.fingerprint.ready_message, DEFAULT_READY_MESSAGE);
    }

    #[test]
    fn parse_custom_messages() {
        let config = r#"
            config_version = 1

            [fingerprint]
            ready_message = "Touch the sensor"
            present_message = "Reading..."
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.fingerprint.ready_message, "Touch the sensor");
        assert_eq!(config.fingerprint.present_message, "Reading...");
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_empty_ready_message() {
        let config = r#"
            config_version = 1

            [fingerprint]
            ready_message = ""
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1\n\n[daemon]\nlog_level = \"debug\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.daemon.log_level, "debug");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(config.daemon.set_locked_hint);
    }
}
