//! Port transport abstraction for exclusive hardware ports

use anyhow::Result;
use async_trait::async_trait;
use skyfleet_shared::{FleetError, PortDevice};
use std::fmt;

/// Hardware ports managed by the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Radio link to the fleet
    Lora,
    /// RTK correction base station
    Rtk,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortKind::Lora => write!(f, "lora"),
            PortKind::Rtk => write!(f, "rtk"),
        }
    }
}

/// Answer of a connect request that reached the port owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    /// The port is already held by an earlier connection
    AlreadyConnected { detail: String },
}

/// Connection parameters for one port type
pub trait PortConfig: Clone + fmt::Debug + Send + Sync + 'static {
    /// Serial device the port should open
    fn device(&self) -> &str;

    /// Reject malformed parameters before touching the port
    fn validate(&self) -> Result<(), FleetError>;
}

/// Owner of the physical ports
///
/// Failures are reported as errors; "already connected" is not a failure
/// but a distinct [`ConnectOutcome`].
#[async_trait]
pub trait PortTransport<C: PortConfig>: Send + Sync {
    async fn connect(&self, port: PortKind, config: &C) -> Result<ConnectOutcome>;

    /// Release the port; must succeed on a port that is not connected
    async fn disconnect(&self, port: PortKind) -> Result<()>;
}

/// Lists serial devices an operator can choose from
#[async_trait]
pub trait PortCatalog: Send + Sync {
    async fn available_devices(&self) -> Result<Vec<PortDevice>>;
}
