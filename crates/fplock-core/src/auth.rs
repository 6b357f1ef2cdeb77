//! Fingerprint verification state machine

use fplock_config::FingerprintConfig;
use fplock_host_api::{
    AuthArbiter, AuthMethod, BusResult, DeviceSignal, FprintManager, LoginManager,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    DeviceSessionManager, EventReceiver, EventSender, MatchResult, SessionEvent,
    SleepCoordinator, VerificationSession, VerifyOutcome, MSG_DISCONNECTED, MSG_NOT_MATCHED,
    MSG_RESTART_FAILED, MSG_RETRY, MSG_TOO_MANY_ATTEMPTS, MSG_UNKNOWN_ERROR,
};

/// Fingerprint authentication for one lock instance
///
/// All state changes happen in [`FingerprintAuth::handle`]. Bus replies and
/// signals are queued on an internal channel; the host drains it with
/// [`FingerprintAuth::next_event`] and feeds each event back in.
pub struct FingerprintAuth {
    ready_message: String,
    present_message: String,
    arbiter: Arc<dyn AuthArbiter>,
    sleep: SleepCoordinator,
    device: DeviceSessionManager,
    session: VerificationSession,
    event_tx: EventSender,
    event_rx: EventReceiver,
    sleep_signals: Option<JoinHandle<()>>,
}

impl FingerprintAuth {
    pub fn new(
        config: &FingerprintConfig,
        login: Arc<dyn LoginManager>,
        fprint: Arc<dyn FprintManager>,
        arbiter: Arc<dyn AuthArbiter>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            ready_message: config.ready_message.clone(),
            present_message: config.present_message.clone(),
            arbiter,
            sleep: SleepCoordinator::new(login),
            device: DeviceSessionManager::new(fprint),
            session: VerificationSession::new(),
            event_tx,
            event_rx,
            sleep_signals: None,
        }
    }

    /// Query the sleep state and subscribe to PrepareForSleep
    ///
    /// Verification starts once the query reply arrives and the system is
    /// awake. A subscription error is returned after the query has been sent;
    /// verification still runs, just without sleep coordination.
    pub async fn init(&mut self) -> BusResult<()> {
        self.sleep.query(&self.event_tx);
        let forwarder = self.sleep.subscribe(&self.event_tx).await?;
        self.sleep_signals = Some(forwarder);
        Ok(())
    }

    /// Wait for the next queued reply or signal
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.recv().await
    }

    /// Apply one event
    pub async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SleepQueried(Ok(sleeping)) => {
                self.sleep.set_sleeping(sleeping);
                // When asleep, the wake signal starts verification
                if !sleeping {
                    self.begin_verification().await;
                }
            }
            SessionEvent::SleepQueried(Err(e)) => {
                warn!(error = %e, "Failed getting PreparingForSleep, assuming awake");
                self.begin_verification().await;
            }
            SessionEvent::PrepareForSleep(start) => {
                info!(start, "PrepareForSleep");
                if start {
                    self.on_sleep().await;
                } else {
                    self.on_wake().await;
                }
            }
            SessionEvent::Inhibited(Ok(lock)) => {
                self.sleep.accept_inhibitor(lock, self.wants_inhibitor());
            }
            SessionEvent::Inhibited(Err(e)) => {
                warn!(error = %e, "Could not inhibit sleep");
            }
            SessionEvent::Claimed { generation, result } => {
                let current = self.device.accepts(generation);
                if self.device.finish_claim(generation, result) {
                    if self.should_run() {
                        self.start_verify(false).await;
                    }
                } else if current {
                    // Refused; nothing runs until a restart
                    self.sleep.release();
                }
            }
            SessionEvent::VerifyStarted { retry, result } => {
                self.on_verify_started(retry, result).await;
            }
            SessionEvent::Device { generation, signal } => {
                if !self.device.accepts(generation) {
                    debug!(generation, "Ignoring signal from stale device");
                    return;
                }
                match signal {
                    DeviceSignal::FingerSelected(finger) => {
                        info!(finger = %finger, "Finger selected");
                    }
                    DeviceSignal::FingerPresent(present) => self.on_finger_present(present),
                    DeviceSignal::VerifyStatus { result, done } => {
                        self.handle_verify_status(&result, done).await;
                    }
                }
            }
        }
    }

    /// Start verification, discovering and claiming the device first if needed
    ///
    /// When a claim is requested here, verification starts from the claim
    /// reply instead.
    pub async fn start_verify(&mut self, retry: bool) {
        if self.session.is_aborted() {
            debug!("Device aborted, not starting verification");
            return;
        }
        if self.device.is_claiming() {
            debug!("Claim in flight, verification starts when it completes");
            return;
        }

        if !self.device.has_device() {
            let Ok(device) = self.device.discover_device().await else {
                self.sleep.release();
                return;
            };
            if let Err(e) = self.device.claim(device, &self.event_tx).await {
                warn!(error = %e, "Could not subscribe to device signals");
                self.sleep.release();
            }
            return;
        }

        self.device.verify_start(retry, &self.event_tx);
    }

    /// Restart after a claim or discovery failure
    pub async fn restart(&mut self) {
        if self.sleep.is_sleeping() {
            debug!("Sleeping, the wake signal restarts verification");
            return;
        }
        self.begin_verification().await;
    }

    /// Interpret one VerifyStatus signal
    pub async fn handle_verify_status(&mut self, result: &str, done: bool) -> VerifyOutcome {
        self.arbiter.post_activity(AuthMethod::Fingerprint);
        info!(result = %result, done, "Handling verify status");

        let status = MatchResult::parse(result);
        if self.sleep.is_sleeping() && status != MatchResult::Disconnected {
            debug!(result = %status, "Dropping status while sleeping");
            return VerifyOutcome::Dropped;
        }

        let mut done = done;
        let outcome = match &status {
            MatchResult::Unrecognized(other) => {
                warn!(result = %other, "Unknown verify status");
                VerifyOutcome::Unrecognized
            }
            MatchResult::NoMatch => {
                self.device.stop_verify().await;
                if self.session.retries_exhausted() {
                    self.session.set_message(MSG_TOO_MANY_ATTEMPTS);
                    done = true;
                    VerifyOutcome::Disabled
                } else {
                    // The daemon reports no-match as done; the retry keeps us going
                    done = false;
                    self.start_verify(true).await;
                    self.session.set_message(MSG_NOT_MATCHED);
                    VerifyOutcome::Failed
                }
            }
            MatchResult::UnknownError => {
                self.device.stop_verify().await;
                self.session.set_message(MSG_UNKNOWN_ERROR);
                done = true;
                VerifyOutcome::Disabled
            }
            MatchResult::Matched => {
                self.device.stop_verify().await;
                self.session.clear_message();
                done = true;
                VerifyOutcome::Authenticated
            }
            MatchResult::Retry
            | MatchResult::SwipeTooShort
            | MatchResult::FingerNotCentered
            | MatchResult::RemoveAndRetry => {
                if let Some(guidance) = status.guidance() {
                    self.session.set_message(guidance);
                }
                VerifyOutcome::AwaitingUser
            }
            MatchResult::Disconnected => {
                self.session.set_message(MSG_DISCONNECTED);
                self.session.abort();
                self.device.disarm();
                VerifyOutcome::Aborted
            }
        };

        if outcome == VerifyOutcome::Authenticated {
            self.arbiter.report_success();
        } else {
            self.arbiter.report_failure();
        }

        if done || self.session.is_aborted() {
            self.finish();
        }

        outcome
    }

    /// Stop verification and give the device back
    ///
    /// Release is attempted even when the stop fails. A disconnected device
    /// has already been released by the daemon.
    pub async fn terminate(&mut self) {
        if let Some(forwarder) = self.sleep_signals.take() {
            forwarder.abort();
        }

        if self.device.abandon_claim() {
            debug!("Claim in flight, releasing it when the reply lands");
        } else if !self.session.is_aborted() {
            if self.device.is_verifying() {
                self.device.stop_verify().await;
            }
            self.device.release().await;
        }

        self.finish();
    }

    /// Latest status message, if any
    pub fn last_fail_text(&self) -> Option<&str> {
        let message = self.session.message();
        (!message.is_empty()).then_some(message)
    }

    /// Fingerprint auth never prompts for text input
    pub fn last_prompt(&self) -> Option<&str> {
        None
    }

    pub fn check_waiting(&self) -> bool {
        false
    }

    pub fn handle_input(&mut self, _input: &str) {}

    pub fn message(&self) -> &str {
        self.session.message()
    }

    pub fn retries(&self) -> u32 {
        self.session.retries()
    }

    pub fn is_done(&self) -> bool {
        self.session.is_done()
    }

    pub fn is_aborted(&self) -> bool {
        self.session.is_aborted()
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleep.is_sleeping()
    }

    pub fn is_inhibited(&self) -> bool {
        self.sleep.is_inhibited()
    }

    pub fn has_device(&self) -> bool {
        self.device.has_device()
    }

    /// A device is claimed or being claimed for a session still in progress
    fn wants_inhibitor(&self) -> bool {
        !self.session.is_done() && (self.device.has_device() || self.device.is_claiming())
    }

    fn should_run(&self) -> bool {
        !self.sleep.is_sleeping() && !self.session.is_done()
    }

    async fn begin_verification(&mut self) {
        if self.session.is_done() {
            debug!("Session done, not starting verification");
            return;
        }
        if !self.sleep.is_inhibited() {
            self.sleep.request_inhibit(&self.event_tx);
        }
        self.start_verify(false).await;
    }

    async fn on_sleep(&mut self) {
        self.sleep.set_sleeping(true);
        if self.device.is_verifying() {
            self.device.stop_verify().await;
        }
        self.sleep.release();
    }

    async fn on_wake(&mut self) {
        self.sleep.set_sleeping(false);
        self.begin_verification().await;
    }

    async fn on_verify_started(&mut self, retry: bool, result: BusResult<()>) {
        self.device.verify_started(&result);

        if self.session.is_done() {
            debug!(retry, "Session done, ignoring verify start reply");
            if self.device.is_verifying() {
                self.device.stop_verify().await;
            }
            return;
        }

        match result {
            Ok(()) => {
                info!(retry, "Started verifying");
                if retry {
                    self.session.record_retry();
                    self.session.set_message(MSG_RETRY);
                } else {
                    self.session.set_message(self.ready_message.clone());
                }

                // Sleep began while the start was in flight
                if self.sleep.is_sleeping() {
                    self.device.stop_verify().await;
                }
            }
            Err(e) => {
                warn!(retry, error = %e, "Could not start verifying");
                if retry {
                    self.session.set_message(MSG_RESTART_FAILED);
                    self.finish();
                }
            }
        }

        self.arbiter.force_redraw();
    }

    fn on_finger_present(&mut self, present: bool) {
        if !present || self.session.is_done() {
            return;
        }
        self.session.set_message(self.present_message.clone());
        self.arbiter.force_redraw();
    }

    fn finish(&mut self) {
        self.session.mark_done();
        self.sleep.release();
    }
}
