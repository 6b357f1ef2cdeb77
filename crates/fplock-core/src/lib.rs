//! Fingerprint verification core for fplock
//!
//! This crate is the heart of fplock, containing:
//! - The closed vocabulary of fprintd match results
//! - Verification session state (messages, retries, terminal flags)
//! - Sleep coordination (PrepareForSleep tracking, delay inhibitor)
//! - Device lifecycle (discovery, claim, verify start/stop, release)
//! - The verification state machine (Idle -> Claiming -> Verifying -> Matched | Disabled | Aborted)

mod auth;
mod device;
mod events;
mod matching;
mod session;
mod sleep;

pub use auth::*;
pub use device::*;
pub use events::*;
pub use matching::*;
pub use session::*;
pub use sleep::*;
