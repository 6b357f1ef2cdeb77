//! Host interface traits for fplock
//!
//! This crate defines the boundary between the fingerprint core and the
//! outside world: the login manager (sleep state, inhibitors), the
//! fingerprint daemon (device discovery, claim, verification), and the
//! authentication arbiter that decides when the lock screen unlocks.
//! It contains no D-Bus code itself.

mod arbiter;
mod inhibitor;
mod mock;
mod traits;

pub use arbiter::*;
pub use inhibitor::*;
pub use mock::*;
pub use traits::*;
