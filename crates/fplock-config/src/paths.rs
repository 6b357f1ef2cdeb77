//! Default configuration path
//!
//! Order of precedence:
//! 1. `$FPLOCK_CONFIG` environment variable (if set)
//! 2. `$XDG_CONFIG_HOME/fplock/config.toml`
//! 3. `~/.config/fplock/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config path
pub const FPLOCK_CONFIG_ENV: &str = "FPLOCK_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "fplock";

const CONFIG_FILENAME: &str = "config.toml";

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(FPLOCK_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking FPLOCK_CONFIG.
/// Used as the clap default where the env var is checked separately.
pub fn config_path_without_env() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_DIR)
        .join(CONFIG_FILENAME)
}
