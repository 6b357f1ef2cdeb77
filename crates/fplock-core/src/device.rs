//! Fingerprint device lifecycle
//!
//! Owns discovery, the exclusive claim, and verify start/stop. The claim is
//! held by a [`DeviceLease`]; dropping a claimed lease without an explicit
//! release schedules one on the current runtime.

use fplock_host_api::{BusResult, DeviceSignal, FprintDevice, FprintManager};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{EventSender, SessionEvent};

/// Empty username: the daemon resolves it to the calling user
const CLAIM_USERNAME: &str = "";

const ANY_FINGER: &str = "any";

/// A discovered device, claimed or with a claim in flight
pub struct DeviceLease {
    device: Arc<dyn FprintDevice>,
    signals: JoinHandle<()>,
    claimed: bool,
    released: bool,
}

impl DeviceLease {
    pub fn path(&self) -> &str {
        self.device.path()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    fn is_live(&self) -> bool {
        self.claimed && !self.released
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.signals.abort();
        if !self.claimed || self.released {
            return;
        }

        let device = self.device.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = device.release().await {
                        warn!(device = %device.path(), error = %e, "Release on drop failed");
                    }
                });
            }
            Err(_) => {
                warn!(device = %self.device.path(), "No runtime to release device on drop");
            }
        }
    }
}

pub struct DeviceSessionManager {
    fprint: Arc<dyn FprintManager>,
    lease: Option<DeviceLease>,
    /// Claim still in flight when the session ended
    abandoned: Option<DeviceLease>,
    generation: u64,
    verifying: bool,
}

impl DeviceSessionManager {
    pub fn new(fprint: Arc<dyn FprintManager>) -> Self {
        Self {
            fprint,
            lease: None,
            abandoned: None,
            generation: 0,
            verifying: false,
        }
    }

    /// A device is claimed and ready for verification
    pub fn has_device(&self) -> bool {
        self.lease.as_ref().is_some_and(DeviceLease::is_claimed)
    }

    pub fn is_claiming(&self) -> bool {
        self.lease.as_ref().is_some_and(|l| !l.claimed)
    }

    /// Last verify start succeeded and no stop has succeeded since
    pub fn is_verifying(&self) -> bool {
        self.verifying
    }

    /// Whether a reply or signal tagged with `generation` belongs to the current lease
    pub fn accepts(&self, generation: u64) -> bool {
        self.lease.is_some() && generation == self.generation
    }

    /// Look up the default device
    pub async fn discover_device(&self) -> BusResult<Arc<dyn FprintDevice>> {
        match self.fprint.default_device().await {
            Ok(device) => {
                info!(device = %device.path(), "Using fingerprint device");
                Ok(device)
            }
            Err(e) => {
                warn!(error = %e, "Couldn't connect to fingerprint service");
                Err(e)
            }
        }
    }

    /// Subscribe to the device's signals and request the claim
    ///
    /// The reply arrives as `Claimed`; see [`Self::finish_claim`].
    pub async fn claim(&mut self, device: Arc<dyn FprintDevice>, tx: &EventSender) -> BusResult<()> {
        let signals = device.subscribe().await?;

        self.generation += 1;
        let generation = self.generation;
        let forwarder = forward_device_signals(signals, tx.clone(), generation);

        let claim_device = device.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = claim_device.claim(CLAIM_USERNAME).await;
            let _ = tx.send(SessionEvent::Claimed { generation, result });
        });

        self.lease = Some(DeviceLease {
            device,
            signals: forwarder,
            claimed: false,
            released: false,
        });
        Ok(())
    }

    /// Apply a claim reply; returns true when the device is now claimed
    pub fn finish_claim(&mut self, generation: u64, result: BusResult<()>) -> bool {
        if generation == self.generation
            && let Some(mut lease) = self.abandoned.take()
        {
            // Dropping a claimed lease schedules its release
            lease.claimed = result.is_ok();
            if lease.claimed {
                info!(device = %lease.path(), "Releasing device claimed after terminate");
            }
            return false;
        }
        if !self.accepts(generation) {
            debug!(generation, "Ignoring stale claim reply");
            return false;
        }

        match result {
            Ok(()) => {
                let Some(lease) = self.lease.as_mut() else {
                    return false;
                };
                lease.claimed = true;
                info!(device = %lease.path(), "Claimed device");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not claim device");
                self.lease = None;
                false
            }
        }
    }

    /// Request a verify start for any finger; the reply arrives as `VerifyStarted`
    ///
    /// Returns false (and sends nothing) without a claimed device.
    pub fn verify_start(&self, retry: bool, tx: &EventSender) -> bool {
        let Some(lease) = self.lease.as_ref().filter(|l| l.claimed) else {
            return false;
        };

        let device = lease.device.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = device.verify_start(ANY_FINGER).await;
            let _ = tx.send(SessionEvent::VerifyStarted { retry, result });
        });
        true
    }

    /// Record the outcome of a verify start reply
    pub fn verify_started(&mut self, result: &BusResult<()>) {
        self.verifying =
            result.is_ok() && self.lease.as_ref().is_some_and(DeviceLease::is_live);
    }

    /// Best-effort verify stop; failures are logged
    pub async fn stop_verify(&mut self) -> bool {
        let Some(lease) = self.lease.as_ref().filter(|l| l.is_live()) else {
            return false;
        };

        match lease.device.verify_stop().await {
            Ok(()) => {
                self.verifying = false;
                info!("Stopped verification");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not stop verifying");
                false
            }
        }
    }

    /// Best-effort release of the claim; failures are logged
    pub async fn release(&mut self) -> bool {
        let Some(lease) = self.lease.as_mut() else {
            return false;
        };
        if !lease.is_live() {
            return false;
        }

        // One attempt only, the drop guard must not retry
        lease.released = true;
        self.verifying = false;
        match lease.device.release().await {
            Ok(()) => {
                info!(device = %lease.path(), "Released device");
                true
            }
            Err(e) => {
                warn!(device = %lease.path(), error = %e, "Could not release device");
                false
            }
        }
    }

    /// Give up on a claim whose reply has not arrived yet
    ///
    /// Nothing is sent to the daemon now. If the claim later succeeds,
    /// [`Self::finish_claim`] releases it.
    pub fn abandon_claim(&mut self) -> bool {
        if !self.is_claiming() {
            return false;
        }
        self.abandoned = self.lease.take();
        self.verifying = false;
        true
    }

    /// The daemon dropped the device; never release it ourselves
    pub fn disarm(&mut self) {
        if let Some(lease) = self.lease.as_mut() {
            lease.released = true;
        }
        self.verifying = false;
    }
}

fn forward_device_signals(
    mut rx: mpsc::UnboundedReceiver<DeviceSignal>,
    tx: EventSender,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            if tx.send(SessionEvent::Device { generation, signal }).is_err() {
                break;
            }
        }
    })
}
