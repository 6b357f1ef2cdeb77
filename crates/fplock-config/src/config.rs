//! Validated configuration

use crate::schema::{RawConfig, RawDaemonConfig, RawFingerprintConfig};

/// Default message once the sensor is listening
pub const DEFAULT_READY_MESSAGE: &str = "(Scan fingerprint to unlock)";

/// Default message while a finger is on the sensor
pub const DEFAULT_PRESENT_MESSAGE: &str = "Scanning fingerprint";

/// Validated configuration ready for use
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub fingerprint: FingerprintConfig,
    pub daemon: DaemonConfig,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            fingerprint: FingerprintConfig::from_raw(raw.fingerprint),
            daemon: DaemonConfig::from_raw(raw.daemon),
        }
    }
}

/// Fingerprint prompt strings and toggle
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub enabled: bool,
    pub ready_message: String,
    pub present_message: String,
}

impl FingerprintConfig {
    fn from_raw(raw: RawFingerprintConfig) -> Self {
        Self {
            enabled: raw.enabled.unwrap_or(true),
            ready_message: raw
                .ready_message
                .unwrap_or_else(|| DEFAULT_READY_MESSAGE.to_string()),
            present_message: raw
                .present_message
                .unwrap_or_else(|| DEFAULT_PRESENT_MESSAGE.to_string()),
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self::from_raw(RawFingerprintConfig::default())
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub log_level: String,
    pub set_locked_hint: bool,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            log_level: raw
                .log_level
                .map(|l| l.to_ascii_lowercase())
                .unwrap_or_else(|| "info".to_string()),
            set_locked_hint: raw.set_locked_hint.unwrap_or(true),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_raw(RawDaemonConfig::default())
    }
}
