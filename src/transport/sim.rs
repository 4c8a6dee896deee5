//! In-memory port owner for development and tests
//!
//! Mirrors the behavior of the station's serial backend: a port stays
//! occupied until it is explicitly released, and connecting an occupied port
//! reports a conflict instead of failing.

use super::traits::{ConnectOutcome, PortCatalog, PortConfig, PortKind, PortTransport};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use skyfleet_shared::PortDevice;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Simulated serial backend
pub struct SimulatedPorts {
    devices: Vec<PortDevice>,
    /// port -> device currently holding it
    held: Mutex<HashMap<PortKind, String>>,
    fail_next_connect: Mutex<Option<String>>,
    fail_next_disconnect: Mutex<Option<String>>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl SimulatedPorts {
    /// Create a backend exposing the given device paths
    pub fn new<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let devices = devices
            .into_iter()
            .map(|name| {
                let name = name.into();
                PortDevice {
                    description: format!("simulated serial device {}", name),
                    name,
                }
            })
            .collect();

        Self {
            devices,
            held: Mutex::new(HashMap::new()),
            fail_next_connect: Mutex::new(None),
            fail_next_disconnect: Mutex::new(None),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    /// Mark `port` as held by a previous connection (stale session)
    #[cfg(test)]
    pub async fn occupy(&self, port: PortKind, device: impl Into<String>) {
        self.held.lock().await.insert(port, device.into());
    }

    /// Device currently holding `port`
    #[cfg(test)]
    pub async fn holder(&self, port: PortKind) -> Option<String> {
        self.held.lock().await.get(&port).cloned()
    }

    /// Make the next connect call fail with `message`
    #[cfg(test)]
    pub async fn fail_next_connect(&self, message: impl Into<String>) {
        *self.fail_next_connect.lock().await = Some(message.into());
    }

    /// Make the next disconnect call fail with `message`
    #[cfg(test)]
    pub async fn fail_next_disconnect(&self, message: impl Into<String>) {
        *self.fail_next_disconnect.lock().await = Some(message.into());
    }

    #[cfg(test)]
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedPorts {
    fn default() -> Self {
        Self::new(["/dev/ttyUSB0", "/dev/ttyUSB1", "/dev/ttyACM0"])
    }
}

#[async_trait]
impl<C: PortConfig> PortTransport<C> for SimulatedPorts {
    async fn connect(&self, port: PortKind, config: &C) -> Result<ConnectOutcome> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.fail_next_connect.lock().await.take() {
            return Err(anyhow!(message));
        }

        let device = config.device();
        if !self.devices.iter().any(|d| d.name == device) {
            return Err(anyhow!("No such device: {}", device));
        }

        let mut held = self.held.lock().await;
        if let Some(current) = held.get(&port) {
            return Ok(ConnectOutcome::AlreadyConnected {
                detail: format!("{} port already connected to {}", port, current),
            });
        }

        debug!("[SIM] {} port opened on {}", port, device);
        held.insert(port, device.to_string());
        Ok(ConnectOutcome::Connected)
    }

    async fn disconnect(&self, port: PortKind) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.fail_next_disconnect.lock().await.take() {
            return Err(anyhow!(message));
        }

        if let Some(device) = self.held.lock().await.remove(&port) {
            debug!("[SIM] {} port released from {}", port, device);
        }
        Ok(())
    }
}

#[async_trait]
impl PortCatalog for SimulatedPorts {
    async fn available_devices(&self) -> Result<Vec<PortDevice>> {
        Ok(self.devices.clone())
    }
}
