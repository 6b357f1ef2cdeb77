//! fplockd - fingerprint unlock for the logind session
//!
//! This is the main entry point for the fplockd service.
//! It wires together all the components:
//! - Configuration loading
//! - System bus connection (logind, fprintd)
//! - Fingerprint verification state machine
//! - Session lock hint and unlock

mod arbiter;

use anyhow::{Context, Result};
use arbiter::{ArbiterEvent, ChannelArbiter};
use clap::Parser;
use fplock_config::{Config, config_path_without_env, load_config_or_default};
use fplock_core::FingerprintAuth;
use fplock_host_api::LoginSession;
use fplock_host_linux::{FprintdManager, LogindManager, LogindSession, SystemBus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// fplockd - Fingerprint unlock coordinated with system sleep
#[derive(Parser, Debug)]
#[command(name = "fplockd")]
#[command(about = "Fingerprint unlock coordinated with system sleep", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/fplock/config.toml)
    #[arg(short, long, env = "FPLOCK_CONFIG", default_value_os_t = config_path_without_env())]
    config: PathBuf,

    /// Log level (overrides the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

/// Main service state
struct Service {
    auth: FingerprintAuth,
    session: Arc<dyn LoginSession>,
    arbiter_rx: mpsc::UnboundedReceiver<ArbiterEvent>,
    set_locked_hint: bool,
}

impl Service {
    async fn new(config: &Config) -> Result<Self> {
        let bus = SystemBus::connect()
            .await
            .context("Failed to connect to the system bus")?;

        let login = Arc::new(LogindManager::new(bus.clone()));
        let fprint = Arc::new(FprintdManager::new(bus.clone()));
        let session = Arc::new(LogindSession::new(bus));

        let (arbiter, arbiter_rx) = ChannelArbiter::new();
        let auth = FingerprintAuth::new(&config.fingerprint, login, fprint, Arc::new(arbiter));

        Ok(Self {
            auth,
            session,
            arbiter_rx,
            set_locked_hint: config.daemon.set_locked_hint,
        })
    }

    async fn run(mut self) -> Result<()> {
        if self.set_locked_hint
            && let Err(e) = self.session.set_locked_hint(true).await
        {
            warn!(error = %e, "Failed to set locked hint");
        }

        if let Err(e) = self.auth.init().await {
            warn!(error = %e, "No sleep coordination, continuing without it");
        }

        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;

        let mut failures = 0u64;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                Some(event) = self.auth.next_event() => {
                    self.auth.handle(event).await;
                }

                Some(request) = self.arbiter_rx.recv() => {
                    match request {
                        ArbiterEvent::Activity(method) => {
                            debug!(method = %method, "Auth activity");
                        }
                        ArbiterEvent::Failure => {
                            failures += 1;
                            debug!(failures, "Auth attempt failed");
                        }
                        ArbiterEvent::Redraw => {
                            info!(
                                message = self.auth.last_fail_text().unwrap_or(""),
                                "Status"
                            );
                        }
                        ArbiterEvent::Success => {
                            info!(failures, "Authenticated");
                            unlock_session(self.session.as_ref(), self.set_locked_hint).await;
                            break;
                        }
                    }
                }
            }
        }

        self.auth.terminate().await;
        info!("Service stopped");
        Ok(())
    }
}

/// Unlock the session and clear the locked hint if we set it
async fn unlock_session(session: &dyn LoginSession, clear_hint: bool) {
    if let Err(e) = session.unlock().await {
        warn!(error = %e, "Unlock failed");
    }
    if clear_hint && let Err(e) = session.set_locked_hint(false).await {
        warn!(error = %e, "Failed to clear locked hint");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize logging
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.daemon.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %args.config.display(),
        "fplockd starting"
    );

    if !config.fingerprint.enabled {
        info!("Fingerprint auth disabled in config, nothing to do");
        return Ok(());
    }

    let service = Service::new(&config).await?;
    service.run().await
}
