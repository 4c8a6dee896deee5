//! Exclusive device session with conflict-aware reconnection

use crate::transport::{ConnectOutcome, PortConfig, PortKind, PortTransport};
use skyfleet_shared::{DeviceStatus, FleetError};
use std::sync::Arc;
use tracing::{info, warn};

/// Connection state machine for one exclusive port
///
/// `connect` recovers from exactly one situation on its own: the port being
/// held by an earlier connection. It then releases the port and retries once
/// with the same configuration. Every other failure goes back to the caller.
///
/// Not reentrant; callers serialize access (the station holds each session
/// behind a mutex).
pub struct DeviceSession<C: PortConfig> {
    port: PortKind,
    transport: Arc<dyn PortTransport<C>>,
    status: DeviceStatus,
    config: Option<C>,
}

impl<C: PortConfig> DeviceSession<C> {
    pub fn new(port: PortKind, transport: Arc<dyn PortTransport<C>>) -> Self {
        Self {
            port,
            transport,
            status: DeviceStatus::DeviceDisconnected,
            config: None,
        }
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == DeviceStatus::DeviceConnected
    }

    /// Configuration of the active connection, if any
    pub fn current_config(&self) -> Option<C> {
        self.config.clone()
    }

    /// Open the port with `config`
    pub async fn connect(&mut self, config: C) -> Result<(), FleetError> {
        config.validate()?;

        if self.status != DeviceStatus::DeviceDisconnected {
            return Err(FleetError::State(format!(
                "{} port is {:?}, disconnect first",
                self.port, self.status
            )));
        }

        info!("[{}] Connecting to {}", self.port, config.device());
        self.status = DeviceStatus::DeviceConnecting;

        match self.transport.connect(self.port, &config).await {
            Ok(ConnectOutcome::Connected) => {
                self.mark_connected(config);
                Ok(())
            }
            Ok(ConnectOutcome::AlreadyConnected { detail }) => {
                warn!("[{}] Port busy ({}), forcing reconnect", self.port, detail);
                self.status = DeviceStatus::DeviceConflict;
                self.force_reconnect(config).await
            }
            Err(e) => {
                self.status = DeviceStatus::DeviceDisconnected;
                Err(FleetError::transport(e))
            }
        }
    }

    /// Release the port
    ///
    /// The session always ends up disconnected; a transport failure is
    /// still reported.
    pub async fn disconnect(&mut self) -> Result<(), FleetError> {
        let result = self.transport.disconnect(self.port).await;

        self.status = DeviceStatus::DeviceDisconnected;
        if let Some(config) = self.config.take() {
            info!("[{}] Disconnected from {}", self.port, config.device());
        }

        result.map_err(|e| {
            warn!("[{}] Disconnect reported failure: {}", self.port, e);
            FleetError::transport(e)
        })
    }

    /// Release whatever holds the port, then retry once
    async fn force_reconnect(&mut self, config: C) -> Result<(), FleetError> {
        if let Err(e) = self.transport.disconnect(self.port).await {
            self.status = DeviceStatus::DeviceDisconnected;
            return Err(FleetError::Transport(format!(
                "forced disconnect of {} port failed: {}",
                self.port, e
            )));
        }

        match self.transport.connect(self.port, &config).await {
            Ok(ConnectOutcome::Connected) => {
                self.mark_connected(config);
                Ok(())
            }
            Ok(ConnectOutcome::AlreadyConnected { detail }) => {
                self.status = DeviceStatus::DeviceDisconnected;
                Err(FleetError::Conflict(detail))
            }
            Err(e) => {
                self.status = DeviceStatus::DeviceDisconnected;
                Err(FleetError::transport(e))
            }
        }
    }

    fn mark_connected(&mut self, config: C) {
        info!("[{}] Connected to {}", self.port, config.device());
        self.status = DeviceStatus::DeviceConnected;
        self.config = Some(config);
    }
}
