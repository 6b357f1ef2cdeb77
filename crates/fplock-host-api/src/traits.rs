//! Host interface traits

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::InhibitorLock;

/// Errors from the system bus and the services behind it
#[derive(Debug, Clone, Error)]
pub enum BusError {
    #[error("Bus connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Device discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("Claim failed: {0}")]
    ClaimFailed(String),

    #[error("Verify start failed: {0}")]
    VerifyStartFailed(String),

    #[error("Verify stop failed: {0}")]
    StopFailed(String),

    #[error("Release failed: {0}")]
    ReleaseFailed(String),

    #[error("Inhibit failed: {0}")]
    InhibitFailed(String),

    #[error("Property read failed: {0}")]
    PropertyFailed(String),

    #[error("Signal subscription failed: {0}")]
    SubscribeFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BusResult<T> = Result<T, BusError>;

/// Signals emitted by a fingerprint device object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSignal {
    /// The daemon picked which finger it will verify against
    FingerSelected(String),

    /// Outcome of the most recent scan attempt
    VerifyStatus {
        result: String,
        done: bool,
    },

    /// The device's `finger-present` property changed
    FingerPresent(bool),
}

/// What an inhibitor lock blocks and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InhibitRequest {
    pub what: String,
    pub who: String,
    pub why: String,
    pub mode: String,
}

impl InhibitRequest {
    /// Delay-mode sleep inhibitor
    pub fn delay_sleep(who: impl Into<String>, why: impl Into<String>) -> Self {
        Self {
            what: "sleep".into(),
            who: who.into(),
            why: why.into(),
            mode: "delay".into(),
        }
    }
}

/// System login manager (sleep state and inhibitors)
#[async_trait]
pub trait LoginManager: Send + Sync {
    /// Whether the system is currently preparing for sleep
    async fn preparing_for_sleep(&self) -> BusResult<bool>;

    /// Subscribe to PrepareForSleep; `true` when sleep starts, `false` on wake
    async fn subscribe_sleep(&self) -> BusResult<mpsc::UnboundedReceiver<bool>>;

    /// Take an inhibitor lock, held until the returned value is dropped
    async fn inhibit(&self, request: InhibitRequest) -> BusResult<InhibitorLock>;
}

/// The login session this process runs in
#[async_trait]
pub trait LoginSession: Send + Sync {
    async fn set_locked_hint(&self, locked: bool) -> BusResult<()>;

    async fn unlock(&self) -> BusResult<()>;
}

/// Fingerprint daemon manager object
#[async_trait]
pub trait FprintManager: Send + Sync {
    /// Look up the default fingerprint device
    async fn default_device(&self) -> BusResult<Arc<dyn FprintDevice>>;
}

/// A single fingerprint device object
#[async_trait]
pub trait FprintDevice: Send + Sync {
    /// Object path of the device
    fn path(&self) -> &str;

    /// Claim exclusive use; an empty username means the calling user
    async fn claim(&self, username: &str) -> BusResult<()>;

    /// Give up exclusive use
    async fn release(&self) -> BusResult<()>;

    /// Start verifying against `finger` ("any" for any enrolled finger)
    async fn verify_start(&self, finger: &str) -> BusResult<()>;

    async fn verify_stop(&self) -> BusResult<()>;

    /// Subscribe to the device's signals
    async fn subscribe(&self) -> BusResult<mpsc::UnboundedReceiver<DeviceSignal>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_sleep_request() {
        let request = InhibitRequest::delay_sleep("fplock", "verifying");
        assert_eq!(request.what, "sleep");
        assert_eq!(request.mode, "delay");
        assert_eq!(request.who, "fplock");
    }

    #[test]
    fn bus_error_messages() {
        let err = BusError::ClaimFailed("device busy".into());
        assert_eq!(err.to_string(), "Claim failed: device busy");
    }
}
