//! Channel-backed auth arbiter

use fplock_host_api::{AuthArbiter, AuthMethod};
use tokio::sync::mpsc;

/// Requests from an auth method to the service loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterEvent {
    Activity(AuthMethod),
    Failure,
    Success,
    Redraw,
}

/// Queues arbiter calls for the service loop, which owns the session
pub struct ChannelArbiter {
    tx: mpsc::UnboundedSender<ArbiterEvent>,
}

impl ChannelArbiter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ArbiterEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ArbiterEvent) {
        // Receiver gone means the service is shutting down
        let _ = self.tx.send(event);
    }
}

impl AuthArbiter for ChannelArbiter {
    fn post_activity(&self, method: AuthMethod) {
        self.send(ArbiterEvent::Activity(method));
    }

    fn report_failure(&self) {
        self.send(ArbiterEvent::Failure);
    }

    fn report_success(&self) {
        self.send(ArbiterEvent::Success);
    }

    fn force_redraw(&self) {
        self.send(ArbiterEvent::Redraw);
    }
}
