//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Fingerprint authentication settings
    #[serde(default)]
    pub fingerprint: RawFingerprintConfig,

    /// Daemon-level settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,
}

/// Fingerprint authentication settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFingerprintConfig {
    /// Enable fingerprint authentication (default: true)
    pub enabled: Option<bool>,

    /// Shown once verification has started
    pub ready_message: Option<String>,

    /// Shown when a finger is placed on the sensor
    pub present_message: Option<String>,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Log level filter (overridden by RUST_LOG)
    pub log_level: Option<String>,

    /// Tell logind the session is locked while we run
    pub set_locked_hint: Option<bool>,
}
