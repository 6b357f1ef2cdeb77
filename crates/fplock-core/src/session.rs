//! Verification session state

/// Automatic retries allowed after a no-match
pub const MAX_RETRIES: u32 = 3;

pub const MSG_NOT_MATCHED: &str = "Fingerprint not matched";
pub const MSG_RETRY: &str = "Could not match fingerprint. Try again.";
pub const MSG_TOO_MANY_ATTEMPTS: &str = "Fingerprint auth disabled (too many failed attempts)";
pub const MSG_UNKNOWN_ERROR: &str = "Fingerprint auth disabled (unknown error)";
pub const MSG_RESTART_FAILED: &str = "Fingerprint auth disabled (failed to restart)";
pub const MSG_DISCONNECTED: &str = "Fingerprint device disconnected";

/// Result of handling one verify-status signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Fingerprint matched
    Authenticated,
    /// No match, an automatic retry was issued
    Failed,
    /// Too many attempts or a daemon error; no further attempts
    Disabled,
    /// Device went away
    Aborted,
    /// Scan continues, the user was told what to do differently
    AwaitingUser,
    /// Result string not in the known vocabulary
    Unrecognized,
    /// Dropped because the system is going to sleep
    Dropped,
}

/// Per-lock verification state
#[derive(Debug, Default)]
pub struct VerificationSession {
    retries: u32,
    message: String,
    done: bool,
    abort: bool,
}

impl VerificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retries >= MAX_RETRIES
    }

    /// Count a retry whose verify start succeeded
    pub fn record_retry(&mut self) {
        self.retries = (self.retries + 1).min(MAX_RETRIES);
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn mark_done(&mut self) {
        self.done = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.abort
    }

    /// Unrecoverable: implies done
    pub fn abort(&mut self) {
        self.abort = true;
        self.done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_are_capped() {
        let mut session = VerificationSession::new();
        for _ in 0..10 {
            session.record_retry();
        }
        assert_eq!(session.retries(), MAX_RETRIES);
        assert!(session.retries_exhausted());
    }

    #[test]
    fn abort_implies_done() {
        let mut session = VerificationSession::new();
        assert!(!session.is_done());

        session.abort();
        assert!(session.is_aborted());
        assert!(session.is_done());
    }

    #[test]
    fn message_last_write_wins() {
        let mut session = VerificationSession::new();
        session.set_message(MSG_NOT_MATCHED);
        session.set_message(MSG_RETRY);
        assert_eq!(session.message(), MSG_RETRY);

        session.clear_message();
        assert!(session.message().is_empty());
    }
}
