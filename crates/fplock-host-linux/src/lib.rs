//! Linux host adapter for fplock
//!
//! Provides:
//! - A shared system bus connection with lazily rebuilt logind proxies
//! - logind: PreparingForSleep, PrepareForSleep, delay inhibitors, session lock hints
//! - fprintd: default device lookup, claim/release, verify start/stop and signals

mod bus;
mod fprintd;
mod logind;

pub use bus::*;
pub use fprintd::*;
pub use logind::*;
