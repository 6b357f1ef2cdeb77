//! Auth arbiter interface

use std::fmt;

/// Authentication methods known to the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    Fingerprint,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Fingerprint => write!(f, "fingerprint"),
        }
    }
}

/// The lock screen's authentication arbiter
///
/// Calls are fire-and-forget: implementations queue the request and return.
pub trait AuthArbiter: Send + Sync {
    /// A method saw input or a status event
    fn post_activity(&self, method: AuthMethod);

    /// One failed attempt (feeds cross-method lockout policy)
    fn report_failure(&self);

    /// Authentication succeeded, unlock the session
    fn report_success(&self);

    /// Redraw now instead of waiting for the next scheduled refresh
    fn force_redraw(&self);
}
