//! Exclusive hardware port plumbing
//!
//! The station never drives serial hardware itself; it talks to a port owner
//! through [`PortTransport`] and lists candidate devices through
//! [`PortCatalog`].

pub mod sim;
pub mod traits;

pub use sim::SimulatedPorts;
pub use traits::{ConnectOutcome, PortCatalog, PortConfig, PortKind, PortTransport};
