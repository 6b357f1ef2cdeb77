//! Sleep coordination
//!
//! Tracks whether logind is preparing for sleep and holds a delay inhibitor
//! while verification may run, so the sensor is never in use across suspend.

use fplock_host_api::{BusResult, InhibitRequest, InhibitorLock, LoginManager};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{EventSender, SessionEvent};

const INHIBIT_WHO: &str = "fplock";
const INHIBIT_WHY: &str = "Fingerprint verification must be stopped before sleep";

pub struct SleepCoordinator {
    login: Arc<dyn LoginManager>,
    sleeping: bool,
    inhibitor: Option<InhibitorLock>,
}

impl SleepCoordinator {
    pub fn new(login: Arc<dyn LoginManager>) -> Self {
        Self {
            login,
            sleeping: false,
            inhibitor: None,
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibitor.is_some()
    }

    pub fn set_sleeping(&mut self, sleeping: bool) {
        self.sleeping = sleeping;
    }

    /// Read PreparingForSleep; the reply arrives as `SleepQueried`
    pub fn query(&self, tx: &EventSender) -> JoinHandle<()> {
        let login = self.login.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = login.preparing_for_sleep().await;
            let _ = tx.send(SessionEvent::SleepQueried(result));
        })
    }

    /// Forward PrepareForSleep signals into the event channel
    pub async fn subscribe(&self, tx: &EventSender) -> BusResult<JoinHandle<()>> {
        let rx = self.login.subscribe_sleep().await?;
        Ok(forward_sleep_signals(rx, tx.clone()))
    }

    /// Ask for a delay inhibitor; the reply arrives as `Inhibited`
    pub fn request_inhibit(&self, tx: &EventSender) -> JoinHandle<()> {
        let login = self.login.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = login
                .inhibit(InhibitRequest::delay_sleep(INHIBIT_WHO, INHIBIT_WHY))
                .await;
            let _ = tx.send(SessionEvent::Inhibited(result));
        })
    }

    /// Keep an inhibitor reply, or drop it if it is no longer wanted
    pub fn accept_inhibitor(&mut self, lock: InhibitorLock, wanted: bool) {
        if self.sleeping || !wanted {
            debug!(sleeping = self.sleeping, "Dropping late inhibitor");
            return;
        }
        info!(lock = lock.description(), "Sleep inhibited");
        self.inhibitor = Some(lock);
    }

    /// Drop the inhibitor if held
    pub fn release(&mut self) {
        if self.inhibitor.take().is_some() {
            info!("Sleep inhibitor released");
        }
    }
}

fn forward_sleep_signals(
    mut rx: mpsc::UnboundedReceiver<bool>,
    tx: EventSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(start) = rx.recv().await {
            if tx.send(SessionEvent::PrepareForSleep(start)).is_err() {
                break;
            }
        }
    })
}
