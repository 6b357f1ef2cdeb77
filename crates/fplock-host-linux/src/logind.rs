//! logind manager and session adapters

use async_trait::async_trait;
use fplock_host_api::{
    BusError, BusResult, InhibitRequest, InhibitorLock, LoginManager, LoginSession,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedFd;

use crate::SystemBus;

/// org.freedesktop.login1.Manager
pub struct LogindManager {
    bus: Arc<SystemBus>,
}

impl LogindManager {
    pub fn new(bus: Arc<SystemBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl LoginManager for LogindManager {
    async fn preparing_for_sleep(&self) -> BusResult<bool> {
        let proxy = self.bus.login_proxy().await?;
        match proxy.get_property::<bool>("PreparingForSleep").await {
            Ok(sleeping) => Ok(sleeping),
            Err(e) => {
                self.bus.reset_if_lost(&e).await;
                Err(BusError::PropertyFailed(e.to_string()))
            }
        }
    }

    async fn subscribe_sleep(&self) -> BusResult<mpsc::UnboundedReceiver<bool>> {
        let proxy = self.bus.login_proxy().await?;
        let stream = proxy
            .receive_signal("PrepareForSleep")
            .await
            .map_err(|e| BusError::SubscribeFailed(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut stream = std::pin::pin!(stream);
            while let Some(message) = stream.next().await {
                match message.body().deserialize::<bool>() {
                    Ok(start) => {
                        if tx.send(start).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Malformed PrepareForSleep signal"),
                }
            }
            debug!("PrepareForSleep stream ended");
        });

        Ok(rx)
    }

    async fn inhibit(&self, request: InhibitRequest) -> BusResult<InhibitorLock> {
        let proxy = self.bus.login_proxy().await?;
        let body = (
            request.what.as_str(),
            request.who.as_str(),
            request.why.as_str(),
            request.mode.as_str(),
        );

        let reply: zbus::Result<OwnedFd> = proxy.call("Inhibit", &body).await;
        match reply {
            Ok(fd) => {
                debug!(what = %request.what, mode = %request.mode, "Inhibitor acquired");
                Ok(InhibitorLock::new(request.what, fd))
            }
            Err(e) => {
                self.bus.reset_if_lost(&e).await;
                Err(BusError::InhibitFailed(e.to_string()))
            }
        }
    }
}

/// org.freedesktop.login1.Session for the calling process
pub struct LogindSession {
    bus: Arc<SystemBus>,
}

impl LogindSession {
    pub fn new(bus: Arc<SystemBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl LoginSession for LogindSession {
    async fn set_locked_hint(&self, locked: bool) -> BusResult<()> {
        let proxy = self.bus.session_proxy().await?;
        match proxy.call_method("SetLockedHint", &(locked,)).await {
            Ok(_) => {
                info!(locked, "Sent SetLockedHint");
                Ok(())
            }
            Err(e) => {
                self.bus.reset_if_lost(&e).await;
                Err(BusError::Internal(format!("SetLockedHint({}): {}", locked, e)))
            }
        }
    }

    async fn unlock(&self) -> BusResult<()> {
        let proxy = self.bus.session_proxy().await?;
        match proxy.call_method("Unlock", &()).await {
            Ok(_) => {
                info!("Sent Unlock");
                Ok(())
            }
            Err(e) => {
                self.bus.reset_if_lost(&e).await;
                Err(BusError::Internal(format!("Unlock: {}", e)))
            }
        }
    }
}
