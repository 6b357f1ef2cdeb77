//! Integration tests for fplockd
//!
//! These tests drive the fingerprint state machine end to end against the
//! mock host, the same way the daemon's event loop does.

use fplock_config::{FingerprintConfig, load_config, parse_config};
use fplock_core::{
    FingerprintAuth, MSG_DISCONNECTED, MSG_NOT_MATCHED, MSG_TOO_MANY_ATTEMPTS,
};
use fplock_host_api::{DeviceSignal, MockFprint, MockLogin, RecordingArbiter};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

struct Rig {
    login: Arc<MockLogin>,
    fprint: Arc<MockFprint>,
    arbiter: Arc<RecordingArbiter>,
    auth: FingerprintAuth,
}

impl Rig {
    fn with_config(config: &FingerprintConfig, login: MockLogin, fprint: MockFprint) -> Self {
        let login = Arc::new(login);
        let fprint = Arc::new(fprint);
        let arbiter = Arc::new(RecordingArbiter::new());
        let auth = FingerprintAuth::new(config, login.clone(), fprint.clone(), arbiter.clone());
        Self {
            login,
            fprint,
            arbiter,
            auth,
        }
    }

    fn new(login: MockLogin, fprint: MockFprint) -> Self {
        Self::with_config(&FingerprintConfig::default(), login, fprint)
    }

    async fn running() -> Self {
        let mut rig = Self::new(MockLogin::new(), MockFprint::new());
        rig.auth.init().await.unwrap();
        rig.pump().await;
        rig
    }

    async fn pump(&mut self) {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(20), self.auth.next_event()).await
        {
            self.auth.handle(event).await;
        }
    }

    async fn status(&mut self, result: &str, done: bool) {
        assert!(self.fprint.device().emit_status(result, done));
        self.pump().await;
    }
}

#[tokio::test]
async fn test_guidance_then_match_unlocks() {
    let mut rig = Rig::running().await;

    rig.status("verify-retry-scan", false).await;
    assert_eq!(rig.auth.message(), "Please retry fingerprint scan");
    rig.status("verify-finger-not-centered", false).await;
    assert_eq!(rig.auth.message(), "Finger not centered - try again");
    rig.status("verify-match", true).await;

    assert!(rig.auth.message().is_empty());
    assert!(rig.auth.is_done());
    assert!(!rig.auth.is_inhibited());
    assert_eq!(rig.arbiter.successes(), 1);
    assert_eq!(rig.arbiter.failures(), 2);
    assert_eq!(rig.fprint.device().verify_start_calls(), 1);
}

#[tokio::test]
async fn test_four_mismatches_disable_fingerprint() {
    let mut rig = Rig::running().await;

    for attempt in 1..=3 {
        rig.status("verify-no-match", true).await;
        assert_eq!(rig.auth.retries(), attempt);
        assert!(!rig.auth.is_done());
        assert!(rig.fprint.device().is_verifying());
    }
    rig.status("verify-no-match", true).await;

    assert_eq!(rig.fprint.device().verify_start_calls(), 4);
    assert_eq!(rig.auth.message(), MSG_TOO_MANY_ATTEMPTS);
    assert!(rig.auth.is_done());
    assert!(!rig.auth.is_inhibited());
    assert_eq!(rig.arbiter.successes(), 0);
    assert_eq!(rig.arbiter.failures(), 4);
}

#[tokio::test]
async fn test_mismatch_shows_retry_prompt() {
    let mut rig = Rig::running().await;

    let outcome = rig
        .auth
        .handle_verify_status("verify-no-match", true)
        .await;
    assert_eq!(outcome, fplock_core::VerifyOutcome::Failed);
    assert_eq!(rig.auth.message(), MSG_NOT_MATCHED);

    // The retry start reply replaces the message
    rig.pump().await;
    assert_eq!(rig.auth.message(), fplock_core::MSG_RETRY);
}

#[tokio::test]
async fn test_disconnect_while_asleep_aborts() {
    let mut rig = Rig::running().await;

    rig.login.emit_prepare_for_sleep(true);
    rig.pump().await;
    assert!(rig.auth.is_sleeping());

    rig.status("verify-disconnected", true).await;

    assert_eq!(rig.auth.message(), MSG_DISCONNECTED);
    assert!(rig.auth.is_aborted());
    assert!(rig.auth.is_done());
    assert_eq!(rig.arbiter.failures(), 1);

    // Waking up does not bring the aborted session back
    let starts = rig.fprint.device().verify_start_calls();
    rig.login.emit_prepare_for_sleep(false);
    rig.pump().await;
    assert_eq!(rig.fprint.device().verify_start_calls(), starts);
}

#[tokio::test]
async fn test_disconnect_before_retry_start_lands() {
    let mut rig = Rig::running().await;

    rig.auth.handle_verify_status("verify-no-match", true).await;
    rig.auth.handle_verify_status("verify-disconnected", true).await;
    rig.pump().await;

    assert_eq!(rig.auth.message(), MSG_DISCONNECTED);
    assert_eq!(rig.auth.retries(), 0);
    assert!(rig.auth.is_aborted());
    assert_eq!(rig.arbiter.failures(), 2);
    assert_eq!(rig.arbiter.successes(), 0);
}

#[tokio::test]
async fn test_statuses_while_asleep_are_dropped() {
    let mut rig = Rig::running().await;
    let before = rig.auth.message().to_string();

    rig.login.emit_prepare_for_sleep(true);
    rig.pump().await;

    for result in ["verify-match", "verify-no-match", "verify-unknown-error"] {
        rig.status(result, true).await;
    }

    assert_eq!(rig.auth.message(), before);
    assert!(!rig.auth.is_done());
    assert_eq!(rig.arbiter.successes(), 0);
    assert_eq!(rig.arbiter.failures(), 0);
    assert_eq!(rig.arbiter.activity(), 3);
}

#[tokio::test]
async fn test_claim_failure_then_restart() {
    let fprint = MockFprint::new();
    *fprint.device().fail_claim.lock().unwrap() = true;
    let mut rig = Rig::new(MockLogin::new(), fprint);
    rig.auth.init().await.unwrap();
    rig.pump().await;

    assert!(!rig.auth.has_device());
    assert_eq!(rig.fprint.device().verify_start_calls(), 0);
    assert!(rig.auth.last_fail_text().is_none());
    assert!(!rig.auth.is_inhibited());
    assert_eq!(rig.login.held_inhibitors(), 0);

    *rig.fprint.device().fail_claim.lock().unwrap() = false;
    rig.auth.restart().await;
    rig.pump().await;

    assert_eq!(rig.fprint.discovery_calls(), 2);
    assert_eq!(rig.fprint.device().claim_calls(), 2);
    assert!(rig.auth.has_device());
    assert!(rig.fprint.device().is_verifying());
    assert!(rig.auth.is_inhibited());
}

#[tokio::test]
async fn test_inhibitor_follows_sleep_cycle() {
    let mut rig = Rig::running().await;
    assert!(rig.auth.is_inhibited());
    assert_eq!(rig.login.held_inhibitors(), 1);

    rig.login.emit_prepare_for_sleep(true);
    rig.pump().await;
    assert!(!rig.auth.is_inhibited());
    assert_eq!(rig.login.held_inhibitors(), 0);
    assert!(!rig.fprint.device().is_verifying());

    rig.login.emit_prepare_for_sleep(false);
    rig.pump().await;
    assert!(rig.auth.is_inhibited());
    assert_eq!(rig.login.held_inhibitors(), 1);
    assert!(rig.fprint.device().is_verifying());
    assert_eq!(rig.login.inhibit_calls(), 2);
}

#[tokio::test]
async fn test_finger_present_uses_configured_prompt() {
    let config = parse_config(
        r#"
config_version = 1

[fingerprint]
ready_message = "Touch the sensor"
present_message = "Reading..."
"#,
    )
    .unwrap();
    let mut rig = Rig::with_config(&config.fingerprint, MockLogin::new(), MockFprint::new());
    rig.auth.init().await.unwrap();
    rig.pump().await;
    assert_eq!(rig.auth.message(), "Touch the sensor");

    rig.fprint.device().emit(DeviceSignal::FingerPresent(true));
    rig.pump().await;
    assert_eq!(rig.auth.message(), "Reading...");
}

#[tokio::test]
async fn test_config_file_drives_daemon_settings() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
config_version = 1

[daemon]
log_level = "DEBUG"
set_locked_hint = false
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.daemon.log_level, "debug");
    assert!(!config.daemon.set_locked_hint);
    assert!(config.fingerprint.enabled);
}

#[tokio::test]
async fn test_terminate_after_match_leaves_device_free() {
    let mut rig = Rig::running().await;
    rig.status("verify-match", true).await;

    rig.auth.terminate().await;

    assert!(!rig.fprint.device().is_claimed());
    assert_eq!(rig.fprint.device().release_calls(), 1);
    assert_eq!(rig.login.held_inhibitors(), 0);
}
