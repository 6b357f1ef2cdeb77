//! fprintd manager and device adapters

use async_trait::async_trait;
use fplock_host_api::{BusError, BusResult, DeviceSignal, FprintDevice, FprintManager};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, Message, Proxy};

use crate::SystemBus;

pub const FPRINT_DESTINATION: &str = "net.reactivated.Fprint";
pub const FPRINT_MANAGER_PATH: &str = "/net/reactivated/Fprint/Manager";
pub const FPRINT_MANAGER_INTERFACE: &str = "net.reactivated.Fprint.Manager";
pub const FPRINT_DEVICE_INTERFACE: &str = "net.reactivated.Fprint.Device";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Device property toggled while a finger is on the sensor
pub const FINGER_PRESENT_PROPERTY: &str = "finger-present";

/// net.reactivated.Fprint.Manager
pub struct FprintdManager {
    bus: Arc<SystemBus>,
}

impl FprintdManager {
    pub fn new(bus: Arc<SystemBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl FprintManager for FprintdManager {
    async fn default_device(&self) -> BusResult<Arc<dyn FprintDevice>> {
        let connection = self.bus.connection().await?;
        let manager = Proxy::new(
            &connection,
            FPRINT_DESTINATION,
            FPRINT_MANAGER_PATH,
            FPRINT_MANAGER_INTERFACE,
        )
        .await
        .map_err(|e| BusError::DiscoveryFailed(e.to_string()))?;

        let reply: zbus::Result<OwnedObjectPath> = manager.call("GetDefaultDevice", &()).await;
        let path = match reply {
            Ok(path) => path,
            Err(e) => {
                self.bus.reset_if_lost(&e).await;
                return Err(BusError::DiscoveryFailed(e.to_string()));
            }
        };

        debug!(path = %path.as_str(), "fprintd default device");
        let device = FprintdDevice::new(&connection, path.as_str()).await?;
        Ok(Arc::new(device))
    }
}

/// net.reactivated.Fprint.Device
pub struct FprintdDevice {
    path: String,
    device: Proxy<'static>,
    properties: Proxy<'static>,
}

impl FprintdDevice {
    pub async fn new(connection: &Connection, path: &str) -> BusResult<Self> {
        let discovery = |e: zbus::Error| BusError::DiscoveryFailed(e.to_string());

        let device = Proxy::new(
            connection,
            FPRINT_DESTINATION,
            path.to_string(),
            FPRINT_DEVICE_INTERFACE,
        )
        .await
        .map_err(discovery)?;

        let properties = Proxy::new(
            connection,
            FPRINT_DESTINATION,
            path.to_string(),
            PROPERTIES_INTERFACE,
        )
        .await
        .map_err(discovery)?;

        Ok(Self {
            path: path.to_string(),
            device,
            properties,
        })
    }
}

#[async_trait]
impl FprintDevice for FprintdDevice {
    fn path(&self) -> &str {
        &self.path
    }

    async fn claim(&self, username: &str) -> BusResult<()> {
        self.device
            .call_method("Claim", &(username,))
            .await
            .map(|_| ())
            .map_err(|e| BusError::ClaimFailed(e.to_string()))
    }

    async fn release(&self) -> BusResult<()> {
        self.device
            .call_method("Release", &())
            .await
            .map(|_| ())
            .map_err(|e| BusError::ReleaseFailed(e.to_string()))
    }

    async fn verify_start(&self, finger: &str) -> BusResult<()> {
        self.device
            .call_method("VerifyStart", &(finger,))
            .await
            .map(|_| ())
            .map_err(|e| BusError::VerifyStartFailed(e.to_string()))
    }

    async fn verify_stop(&self) -> BusResult<()> {
        self.device
            .call_method("VerifyStop", &())
            .await
            .map(|_| ())
            .map_err(|e| BusError::StopFailed(e.to_string()))
    }

    async fn subscribe(&self) -> BusResult<mpsc::UnboundedReceiver<DeviceSignal>> {
        let subscribe = |e: zbus::Error| BusError::SubscribeFailed(e.to_string());

        let selected = self
            .device
            .receive_signal("VerifyFingerSelected")
            .await
            .map_err(subscribe)?;
        let status = self
            .device
            .receive_signal("VerifyStatus")
            .await
            .map_err(subscribe)?;
        let changed = self
            .properties
            .receive_signal("PropertiesChanged")
            .await
            .map_err(subscribe)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let path = self.path.clone();
        tokio::spawn(async move {
            let mut selected = std::pin::pin!(selected);
            let mut status = std::pin::pin!(status);
            let mut changed = std::pin::pin!(changed);

            loop {
                let signal = tokio::select! {
                    Some(message) = selected.next() => parse_finger_selected(&message),
                    Some(message) = status.next() => parse_verify_status(&message),
                    Some(message) = changed.next() => parse_properties_changed(&message),
                    else => break,
                };

                if let Some(signal) = signal
                    && tx.send(signal).is_err()
                {
                    break;
                }
            }
            debug!(device = %path, "Device signal streams ended");
        });

        info!(device = %self.path, "Subscribed to device signals");
        Ok(rx)
    }
}

fn parse_finger_selected(message: &Message) -> Option<DeviceSignal> {
    match message.body().deserialize::<String>() {
        Ok(finger) => Some(DeviceSignal::FingerSelected(finger)),
        Err(e) => {
            warn!(error = %e, "Malformed VerifyFingerSelected signal");
            None
        }
    }
}

fn parse_verify_status(message: &Message) -> Option<DeviceSignal> {
    match message.body().deserialize::<(String, bool)>() {
        Ok((result, done)) => Some(DeviceSignal::VerifyStatus { result, done }),
        Err(e) => {
            warn!(error = %e, "Malformed VerifyStatus signal");
            None
        }
    }
}

fn parse_properties_changed(message: &Message) -> Option<DeviceSignal> {
    let body = message.body();
    let (interface, changed, _invalidated) = match body
        .deserialize::<(String, HashMap<String, OwnedValue>, Vec<String>)>()
    {
        Ok(args) => args,
        Err(e) => {
            warn!(error = %e, "Malformed PropertiesChanged signal");
            return None;
        }
    };

    let value = changed.get(FINGER_PRESENT_PROPERTY).map(|v| &**v);
    finger_present(&interface, value).map(DeviceSignal::FingerPresent)
}

/// `finger-present` from a PropertiesChanged payload, if this is the device interface
fn finger_present(interface: &str, value: Option<&Value<'_>>) -> Option<bool> {
    if interface != FPRINT_DEVICE_INTERFACE {
        return None;
    }
    match value {
        Some(Value::Bool(present)) => Some(*present),
        _ => None,
    }
}
