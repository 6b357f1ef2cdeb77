//! Events consumed by the verification state machine
//!
//! Every asynchronous reply and every bus signal is turned into one of these
//! and posted to a single channel, so the state machine only ever sees one
//! event at a time.

use fplock_host_api::{BusResult, DeviceSignal, InhibitorLock};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum SessionEvent {
    /// Reply to the PreparingForSleep property read
    SleepQueried(BusResult<bool>),

    /// PrepareForSleep signal: `true` when sleep begins, `false` on wake
    PrepareForSleep(bool),

    /// Reply to the sleep inhibit request
    Inhibited(BusResult<InhibitorLock>),

    /// Reply to a device claim
    Claimed {
        generation: u64,
        result: BusResult<()>,
    },

    /// Reply to a verify start
    VerifyStarted {
        retry: bool,
        result: BusResult<()>,
    },

    /// Signal from a discovered device
    Device {
        generation: u64,
        signal: DeviceSignal,
    },
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;
