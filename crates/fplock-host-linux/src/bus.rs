//! Shared system bus connection

use fplock_host_api::{BusError, BusResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use zbus::{Connection, Proxy};

pub const LOGIN_DESTINATION: &str = "org.freedesktop.login1";
pub const LOGIN_PATH: &str = "/org/freedesktop/login1";
pub const SESSION_PATH: &str = "/org/freedesktop/login1/session/auto";
pub const LOGIN_MANAGER_INTERFACE: &str = "org.freedesktop.login1.Manager";
pub const SESSION_INTERFACE: &str = "org.freedesktop.login1.Session";

#[derive(Default)]
struct BusState {
    connection: Option<Connection>,
    login: Option<Proxy<'static>>,
    session: Option<Proxy<'static>>,
}

/// System bus connection shared by every adapter
///
/// Created once at startup and handed out as `Arc<SystemBus>`. The
/// connection and the logind proxies are rebuilt on next use after
/// [`SystemBus::reset`].
pub struct SystemBus {
    state: Mutex<BusState>,
}

impl SystemBus {
    /// Connect to the system bus
    pub async fn connect() -> BusResult<Arc<Self>> {
        let bus = Self {
            state: Mutex::new(BusState::default()),
        };
        bus.connection().await?;
        Ok(Arc::new(bus))
    }

    /// The live connection, reconnecting if it was dropped
    pub async fn connection(&self) -> BusResult<Connection> {
        let mut state = self.state.lock().await;
        Self::connection_locked(&mut state).await
    }

    /// Proxy for org.freedesktop.login1.Manager
    pub async fn login_proxy(&self) -> BusResult<Proxy<'static>> {
        let mut state = self.state.lock().await;
        if let Some(proxy) = &state.login {
            return Ok(proxy.clone());
        }

        let connection = Self::connection_locked(&mut state).await?;
        let proxy = Proxy::new(
            &connection,
            LOGIN_DESTINATION,
            LOGIN_PATH,
            LOGIN_MANAGER_INTERFACE,
        )
        .await
        .map_err(connection_error)?;

        info!(path = LOGIN_PATH, "Created logind manager proxy");
        state.login = Some(proxy.clone());
        Ok(proxy)
    }

    /// Proxy for this process's org.freedesktop.login1.Session
    pub async fn session_proxy(&self) -> BusResult<Proxy<'static>> {
        let mut state = self.state.lock().await;
        if let Some(proxy) = &state.session {
            return Ok(proxy.clone());
        }

        let connection = Self::connection_locked(&mut state).await?;
        let proxy = Proxy::new(&connection, LOGIN_DESTINATION, SESSION_PATH, SESSION_INTERFACE)
            .await
            .map_err(connection_error)?;

        info!(path = SESSION_PATH, "Created logind session proxy");
        state.session = Some(proxy.clone());
        Ok(proxy)
    }

    /// Forget the connection and proxies; the next call reconnects
    pub async fn reset(&self) {
        warn!("Dropping system bus connection");
        *self.state.lock().await = BusState::default();
    }

    /// Reset if `error` means the connection itself is gone
    pub async fn reset_if_lost(&self, error: &zbus::Error) {
        if is_connection_lost(error) {
            self.reset().await;
        }
    }

    async fn connection_locked(state: &mut BusState) -> BusResult<Connection> {
        if let Some(connection) = &state.connection {
            return Ok(connection.clone());
        }

        let connection = Connection::system().await.map_err(connection_error)?;
        info!(destination = LOGIN_DESTINATION, "Connected to system bus");
        state.connection = Some(connection.clone());
        Ok(connection)
    }
}

pub(crate) fn connection_error(e: zbus::Error) -> BusError {
    BusError::ConnectionUnavailable(e.to_string())
}

fn is_connection_lost(error: &zbus::Error) -> bool {
    matches!(error, zbus::Error::InputOutput(_))
}
