//! Config validation CLI tool
//!
//! Validates an fplock configuration file and reports any errors.

use fplock_config::{ConfigError, default_config_path};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => default_config_path(),
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        eprintln!();
        eprintln!("Usage: validate-config [config-file]");
        return ExitCode::from(1);
    }

    match fplock_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", fplock_config::CURRENT_CONFIG_VERSION);
            println!("  Fingerprint enabled: {}", config.fingerprint.enabled);
            println!("  Ready message: {:?}", config.fingerprint.ready_message);
            println!("  Present message: {:?}", config.fingerprint.present_message);
            println!("  Log level: {}", config.daemon.log_level);
            println!("  Set locked hint: {}", config.daemon.set_locked_hint);
            ExitCode::SUCCESS
        }
        Err(ConfigError::ValidationFailed { errors }) => {
            eprintln!("✗ Configuration has {} error(s):", errors.len());
            for error in errors {
                eprintln!("  - {}", error);
            }
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::from(1)
        }
    }
}
