//! fprintd verify-status vocabulary

use std::fmt;

/// Result string carried by a VerifyStatus signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    Matched,
    Retry,
    SwipeTooShort,
    FingerNotCentered,
    RemoveAndRetry,
    Disconnected,
    UnknownError,
    /// Anything outside the known set
    Unrecognized(String),
}

impl MatchResult {
    pub fn parse(result: &str) -> Self {
        match result {
            "verify-no-match" => Self::NoMatch,
            "verify-match" => Self::Matched,
            "verify-retry-scan" => Self::Retry,
            "verify-swipe-too-short" => Self::SwipeTooShort,
            "verify-finger-not-centered" => Self::FingerNotCentered,
            "verify-remove-and-retry" => Self::RemoveAndRetry,
            "verify-disconnected" => Self::Disconnected,
            "verify-unknown-error" => Self::UnknownError,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Wire name as sent by the daemon
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoMatch => "verify-no-match",
            Self::Matched => "verify-match",
            Self::Retry => "verify-retry-scan",
            Self::SwipeTooShort => "verify-swipe-too-short",
            Self::FingerNotCentered => "verify-finger-not-centered",
            Self::RemoveAndRetry => "verify-remove-and-retry",
            Self::Disconnected => "verify-disconnected",
            Self::UnknownError => "verify-unknown-error",
            Self::Unrecognized(s) => s,
        }
    }

    /// User guidance for results that keep the current scan going
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::Retry => Some("Please retry fingerprint scan"),
            Self::SwipeTooShort => Some("Swipe too short - try again"),
            Self::FingerNotCentered => Some("Finger not centered - try again"),
            Self::RemoveAndRetry => Some("Remove your finger and try again"),
            _ => None,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
