//! Mock host services for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::{
    AuthArbiter, AuthMethod, BusError, BusResult, DeviceSignal, FprintDevice, FprintManager,
    InhibitRequest, InhibitorLock, LoginManager, LoginSession,
};

/// Counts how many mock inhibitor locks are alive
struct HeldGuard(Arc<AtomicUsize>);

impl Drop for HeldGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock login manager
pub struct MockLogin {
    sleep_tx: Mutex<Option<mpsc::UnboundedSender<bool>>>,
    held: Arc<AtomicUsize>,
    inhibit_calls: AtomicUsize,

    /// Value returned by `preparing_for_sleep`
    pub preparing_for_sleep: Arc<Mutex<bool>>,

    /// Configure the sleep-state query to fail
    pub fail_query: Arc<Mutex<bool>>,

    /// Configure inhibit to fail
    pub fail_inhibit: Arc<Mutex<bool>>,
}

impl MockLogin {
    pub fn new() -> Self {
        Self {
            sleep_tx: Mutex::new(None),
            held: Arc::new(AtomicUsize::new(0)),
            inhibit_calls: AtomicUsize::new(0),
            preparing_for_sleep: Arc::new(Mutex::new(false)),
            fail_query: Arc::new(Mutex::new(false)),
            fail_inhibit: Arc::new(Mutex::new(false)),
        }
    }

    /// Start out asleep
    pub fn sleeping(self) -> Self {
        *self.preparing_for_sleep.lock().unwrap() = true;
        self
    }

    /// Simulate a PrepareForSleep signal
    pub fn emit_prepare_for_sleep(&self, start: bool) {
        *self.preparing_for_sleep.lock().unwrap() = start;
        if let Some(tx) = self.sleep_tx.lock().unwrap().as_ref() {
            let _ = tx.send(start);
        }
    }

    /// Number of inhibitor locks currently alive
    pub fn held_inhibitors(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }

    pub fn inhibit_calls(&self) -> usize {
        self.inhibit_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockLogin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoginManager for MockLogin {
    async fn preparing_for_sleep(&self) -> BusResult<bool> {
        if *self.fail_query.lock().unwrap() {
            return Err(BusError::PropertyFailed("Mock query failure".into()));
        }
        Ok(*self.preparing_for_sleep.lock().unwrap())
    }

    async fn subscribe_sleep(&self) -> BusResult<mpsc::UnboundedReceiver<bool>> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sleep_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn inhibit(&self, request: InhibitRequest) -> BusResult<InhibitorLock> {
        self.inhibit_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_inhibit.lock().unwrap() {
            return Err(BusError::InhibitFailed("Mock inhibit failure".into()));
        }
        self.held.fetch_add(1, Ordering::SeqCst);
        Ok(InhibitorLock::new(request.what, HeldGuard(self.held.clone())))
    }
}

/// Mock login session
#[derive(Default)]
pub struct MockSession {
    pub locked_hint: Arc<Mutex<Option<bool>>>,
    unlock_calls: AtomicUsize,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unlock_calls(&self) -> usize {
        self.unlock_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoginSession for MockSession {
    async fn set_locked_hint(&self, locked: bool) -> BusResult<()> {
        *self.locked_hint.lock().unwrap() = Some(locked);
        Ok(())
    }

    async fn unlock(&self) -> BusResult<()> {
        self.unlock_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock fingerprint device
pub struct MockDevice {
    path: String,
    signal_tx: Mutex<Option<mpsc::UnboundedSender<DeviceSignal>>>,
    claimed: Mutex<bool>,
    verifying: Mutex<bool>,
    claim_calls: AtomicUsize,
    release_calls: AtomicUsize,
    verify_start_calls: AtomicUsize,
    verify_stop_calls: AtomicUsize,

    /// Configure claim to fail
    pub fail_claim: Arc<Mutex<bool>>,

    /// Configure verify start to fail
    pub fail_verify_start: Arc<Mutex<bool>>,

    /// Configure verify stop to fail
    pub fail_stop: Arc<Mutex<bool>>,

    /// Configure release to fail
    pub fail_release: Arc<Mutex<bool>>,
}

impl MockDevice {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            signal_tx: Mutex::new(None),
            claimed: Mutex::new(false),
            verifying: Mutex::new(false),
            claim_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
            verify_start_calls: AtomicUsize::new(0),
            verify_stop_calls: AtomicUsize::new(0),
            fail_claim: Arc::new(Mutex::new(false)),
            fail_verify_start: Arc::new(Mutex::new(false)),
            fail_stop: Arc::new(Mutex::new(false)),
            fail_release: Arc::new(Mutex::new(false)),
        }
    }

    /// Simulate a device signal; returns false if nobody is subscribed
    pub fn emit(&self, signal: DeviceSignal) -> bool {
        match self.signal_tx.lock().unwrap().as_ref() {
            Some(tx) => tx.send(signal).is_ok(),
            None => false,
        }
    }

    /// Simulate a VerifyStatus signal
    pub fn emit_status(&self, result: &str, done: bool) -> bool {
        self.emit(DeviceSignal::VerifyStatus {
            result: result.to_string(),
            done,
        })
    }

    pub fn is_claimed(&self) -> bool {
        *self.claimed.lock().unwrap()
    }

    pub fn is_verifying(&self) -> bool {
        *self.verifying.lock().unwrap()
    }

    pub fn claim_calls(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn verify_start_calls(&self) -> usize {
        self.verify_start_calls.load(Ordering::SeqCst)
    }

    pub fn verify_stop_calls(&self) -> usize {
        self.verify_stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FprintDevice for MockDevice {
    fn path(&self) -> &str {
        &self.path
    }

    async fn claim(&self, _username: &str) -> BusResult<()> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_claim.lock().unwrap() {
            return Err(BusError::ClaimFailed("Mock claim failure".into()));
        }
        let mut claimed = self.claimed.lock().unwrap();
        if *claimed {
            return Err(BusError::ClaimFailed("Device already claimed".into()));
        }
        *claimed = true;
        Ok(())
    }

    async fn release(&self) -> BusResult<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_release.lock().unwrap() {
            return Err(BusError::ReleaseFailed("Mock release failure".into()));
        }
        *self.claimed.lock().unwrap() = false;
        *self.verifying.lock().unwrap() = false;
        Ok(())
    }

    async fn verify_start(&self, _finger: &str) -> BusResult<()> {
        self.verify_start_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_verify_start.lock().unwrap() {
            return Err(BusError::VerifyStartFailed("Mock verify start failure".into()));
        }
        if !*self.claimed.lock().unwrap() {
            return Err(BusError::VerifyStartFailed("Device not claimed".into()));
        }
        *self.verifying.lock().unwrap() = true;
        Ok(())
    }

    async fn verify_stop(&self) -> BusResult<()> {
        self.verify_stop_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_stop.lock().unwrap() {
            return Err(BusError::StopFailed("Mock verify stop failure".into()));
        }
        *self.verifying.lock().unwrap() = false;
        Ok(())
    }

    async fn subscribe(&self) -> BusResult<mpsc::UnboundedReceiver<DeviceSignal>> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.signal_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

/// Mock fingerprint daemon manager
pub struct MockFprint {
    device: Arc<MockDevice>,
    discovery_calls: AtomicUsize,

    /// Configure device discovery to fail
    pub fail_discovery: Arc<Mutex<bool>>,
}

impl MockFprint {
    pub fn new() -> Self {
        Self::with_device(Arc::new(MockDevice::new(
            "/net/reactivated/Fprint/Device/0",
        )))
    }

    pub fn with_device(device: Arc<MockDevice>) -> Self {
        Self {
            device,
            discovery_calls: AtomicUsize::new(0),
            fail_discovery: Arc::new(Mutex::new(false)),
        }
    }

    pub fn device(&self) -> &Arc<MockDevice> {
        &self.device
    }

    pub fn discovery_calls(&self) -> usize {
        self.discovery_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockFprint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FprintManager for MockFprint {
    async fn default_device(&self) -> BusResult<Arc<dyn FprintDevice>> {
        self.discovery_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_discovery.lock().unwrap() {
            return Err(BusError::DiscoveryFailed("No devices available".into()));
        }
        let device: Arc<dyn FprintDevice> = self.device.clone();
        Ok(device)
    }
}

/// Arbiter that records every call
#[derive(Default)]
pub struct RecordingArbiter {
    activity: AtomicUsize,
    failures: AtomicUsize,
    successes: AtomicUsize,
    redraws: AtomicUsize,
    pub last_method: Mutex<Option<AuthMethod>>,
}

impl RecordingArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self) -> usize {
        self.activity.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn redraws(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }
}

impl AuthArbiter for RecordingArbiter {
    fn post_activity(&self, method: AuthMethod) {
        self.activity.fetch_add(1, Ordering::SeqCst);
        *self.last_method.lock().unwrap() = Some(method);
    }

    fn report_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn report_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn force_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_claim_and_verify() {
        let fprint = MockFprint::new();
        let device = fprint.default_device().await.unwrap();

        // Unclaimed device refuses to verify
        assert!(device.verify_start("any").await.is_err());

        device.claim("").await.unwrap();
        device.verify_start("any").await.unwrap();
        assert!(fprint.device().is_verifying());

        // Second claim fails at the daemon
        assert!(device.claim("").await.is_err());

        device.release().await.unwrap();
        assert!(!fprint.device().is_claimed());
        assert_eq!(fprint.device().claim_calls(), 2);
    }

    #[tokio::test]
    async fn mock_inhibitor_counts_held_locks() {
        let login = MockLogin::new();
        let lock = login
            .inhibit(InhibitRequest::delay_sleep("test", "test"))
            .await
            .unwrap();
        assert_eq!(login.held_inhibitors(), 1);

        drop(lock);
        assert_eq!(login.held_inhibitors(), 0);
        assert_eq!(login.inhibit_calls(), 1);
    }

    #[tokio::test]
    async fn mock_signals_reach_subscriber() {
        let device = MockDevice::new("/dev/0");
        assert!(!device.emit_status("verify-match", true));

        let mut rx = device.subscribe().await.unwrap();
        assert!(device.emit_status("verify-match", true));
        assert_eq!(
            rx.recv().await,
            Some(DeviceSignal::VerifyStatus {
                result: "verify-match".into(),
                done: true
            })
        );
    }

    #[tokio::test]
    async fn mock_discovery_failure() {
        let fprint = MockFprint::new();
        *fprint.fail_discovery.lock().unwrap() = true;

        let result = fprint.default_device().await;
        assert!(matches!(result, Err(BusError::DiscoveryFailed(_))));
        assert_eq!(fprint.discovery_calls(), 1);
    }
}
