//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Log levels accepted in `daemon.log_level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("fingerprint.{field} cannot be empty")]
    EmptyMessage { field: &'static str },

    #[error("Invalid log level '{0}' (expected one of: trace, debug, info, warn, error)")]
    InvalidLogLevel(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let fingerprint = &config.fingerprint;
    if fingerprint.enabled.unwrap_or(true) {
        if fingerprint.ready_message.as_deref().is_some_and(str::is_empty) {
            errors.push(ValidationError::EmptyMessage {
                field: "ready_message",
            });
        }
        if fingerprint.present_message.as_deref().is_some_and(str::is_empty) {
            errors.push(ValidationError::EmptyMessage {
                field: "present_message",
            });
        }
    }

    if let Some(level) = &config.daemon.log_level
        && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
    {
        errors.push(ValidationError::InvalidLogLevel(level.clone()));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_str: &str) -> RawConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&raw("config_version = 1")).is_empty());
    }

    #[test]
    fn empty_messages_rejected() {
        let config = raw(
            r#"
            config_version = 1
            [fingerprint]
            ready_message = ""
            present_message = ""
        "#,
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn empty_messages_allowed_when_disabled() {
        let config = raw(
            r#"
            config_version = 1
            [fingerprint]
            enabled = false
            ready_message = ""
        "#,
        );

        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn bad_log_level() {
        let config = raw(
            r#"
            config_version = 1
            [daemon]
            log_level = "loud"
        "#,
        );

        let errors = validate_config(&config);
        assert!(matches!(&errors[..], [ValidationError::InvalidLogLevel(l)] if l == "loud"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let config = raw(
            r#"
            config_version = 1
            [daemon]
            log_level = "DEBUG"
        "#,
        );

        assert!(validate_config(&config).is_empty());
    }
}
