//! Drone collaborator contracts
//!
//! The Director never talks to the fleet radio directly; movement commands
//! and position reports go through these traits.

use anyhow::Result;
use async_trait::async_trait;
use skyfleet_shared::{DroneAction, LocalOffset};

/// Reported position of one drone on the formation's tangent plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DronePose {
    pub offset: LocalOffset,
    /// Degrees, clockwise from north
    pub heading: f64,
}

impl DronePose {
    pub fn new(x: f64, y: f64, z: f64, heading: f64) -> Self {
        Self {
            offset: LocalOffset::new(x, y, z),
            heading,
        }
    }
}

/// Movement commands to individual drones
#[async_trait]
pub trait DroneCommand: Send + Sync {
    /// Fly to `offset` (meters from the formation origin) and face `heading`
    async fn move_to(&self, drone_id: u32, offset: LocalOffset, heading: f64, height: f64)
        -> Result<()>;

    /// Stop and hold the current position
    async fn hold(&self, drone_id: u32) -> Result<()>;

    async fn action(&self, drone_id: u32, action: DroneAction) -> Result<()>;

    /// Switch to flight mode `mode` (ArduCopter custom mode number)
    async fn set_mode(&self, drone_id: u32, mode: u32) -> Result<()>;
}

/// Position reports from individual drones
#[async_trait]
pub trait DronePosition: Send + Sync {
    async fn query(&self, drone_id: u32) -> Result<DronePose>;

    /// Ids of every drone currently reporting
    async fn roster(&self) -> Result<Vec<u32>>;
}
