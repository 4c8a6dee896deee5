//! Simulated fleet
//!
//! Drones jump onto their commanded target after a fixed number of position
//! polls. Unknown drones are created at the origin on their first movement
//! command; actions and mode changes need the drone to be in the fleet.

use super::traits::{DroneCommand, DronePose, DronePosition};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use skyfleet_shared::{flight_mode_name, DroneAction, LocalOffset};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

/// Command received by the simulated fleet
#[derive(Debug, Clone, PartialEq)]
pub enum FleetCommand {
    MoveTo {
        drone_id: u32,
        offset: LocalOffset,
        heading: f64,
        height: f64,
    },
    Hold {
        drone_id: u32,
    },
    Action {
        drone_id: u32,
        action: DroneAction,
    },
    SetMode {
        drone_id: u32,
        mode: u32,
    },
}

#[derive(Debug, Clone)]
struct SimDrone {
    pose: DronePose,
    target: Option<DronePose>,
    polls_left: u32,
}

impl SimDrone {
    fn at(pose: DronePose) -> Self {
        Self {
            pose,
            target: None,
            polls_left: 0,
        }
    }
}

pub struct SimulatedFleet {
    drones: Mutex<HashMap<u32, SimDrone>>,
    commands: Mutex<Vec<FleetCommand>>,
    failing_commands: Mutex<HashSet<u32>>,
    failing_queries: Mutex<HashSet<u32>>,
    /// Position polls a drone needs before it reports its target
    settle_polls: u32,
}

impl SimulatedFleet {
    pub fn new(settle_polls: u32) -> Self {
        Self {
            drones: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
            failing_commands: Mutex::new(HashSet::new()),
            failing_queries: Mutex::new(HashSet::new()),
            settle_polls,
        }
    }

    /// Put a drone somewhere, cancelling any movement in progress
    #[cfg(test)]
    pub async fn place(&self, drone_id: u32, pose: DronePose) {
        self.drones.lock().await.insert(drone_id, SimDrone::at(pose));
    }

    /// Fleet with `drone_ids` parked at the origin
    pub fn with_drones(settle_polls: u32, drone_ids: impl IntoIterator<Item = u32>) -> Self {
        let mut fleet = Self::new(settle_polls);
        let parked = SimDrone::at(DronePose::new(0.0, 0.0, 0.0, 0.0));
        *fleet.drones.get_mut() = drone_ids.into_iter().map(|id| (id, parked.clone())).collect();
        fleet
    }

    /// Every command received so far, oldest first
    #[cfg(test)]
    pub async fn commands(&self) -> Vec<FleetCommand> {
        self.commands.lock().await.clone()
    }

    /// Reject every command for `drone_id`
    #[cfg(test)]
    pub async fn fail_commands(&self, drone_id: u32) {
        self.failing_commands.lock().await.insert(drone_id);
    }

    /// Make position queries for `drone_id` fail
    #[cfg(test)]
    pub async fn fail_queries(&self, drone_id: u32) {
        self.failing_queries.lock().await.insert(drone_id);
    }

    /// Clear injected failures for `drone_id`
    #[cfg(test)]
    pub async fn recover(&self, drone_id: u32) {
        self.failing_commands.lock().await.remove(&drone_id);
        self.failing_queries.lock().await.remove(&drone_id);
    }

    async fn check_link(&self, drone_id: u32) -> Result<()> {
        if self.failing_commands.lock().await.contains(&drone_id) {
            return Err(anyhow!("drone {} did not acknowledge", drone_id));
        }
        Ok(())
    }
}

impl Default for SimulatedFleet {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl DroneCommand for SimulatedFleet {
    async fn move_to(
        &self,
        drone_id: u32,
        offset: LocalOffset,
        heading: f64,
        height: f64,
    ) -> Result<()> {
        self.commands.lock().await.push(FleetCommand::MoveTo {
            drone_id,
            offset,
            heading,
            height,
        });
        self.check_link(drone_id).await?;

        let mut drones = self.drones.lock().await;
        let drone = drones
            .entry(drone_id)
            .or_insert_with(|| SimDrone::at(DronePose::new(0.0, 0.0, 0.0, 0.0)));
        drone.target = Some(DronePose { offset, heading });
        drone.polls_left = self.settle_polls;

        debug!(
            "[SIM] drone {} moving to ({:.1}, {:.1}, {:.1}) heading {:.0}",
            drone_id, offset.x, offset.y, offset.z, heading
        );
        Ok(())
    }

    async fn hold(&self, drone_id: u32) -> Result<()> {
        self.commands
            .lock()
            .await
            .push(FleetCommand::Hold { drone_id });
        self.check_link(drone_id).await?;

        if let Some(drone) = self.drones.lock().await.get_mut(&drone_id) {
            drone.target = None;
            drone.polls_left = 0;
        }
        debug!("[SIM] drone {} holding", drone_id);
        Ok(())
    }

    async fn action(&self, drone_id: u32, action: DroneAction) -> Result<()> {
        self.commands
            .lock()
            .await
            .push(FleetCommand::Action { drone_id, action });
        self.check_link(drone_id).await?;

        let mut drones = self.drones.lock().await;
        let drone = drones
            .get_mut(&drone_id)
            .ok_or_else(|| anyhow!("drone {} is not in the fleet", drone_id))?;

        match action {
            DroneAction::ActionHold => {
                drone.target = None;
                drone.polls_left = 0;
            }
            DroneAction::ActionLand => {
                let mut ground = drone.pose;
                ground.offset.z = 0.0;
                drone.target = Some(ground);
                drone.polls_left = self.settle_polls;
            }
            DroneAction::ActionHome => {
                drone.target = Some(DronePose::new(0.0, 0.0, drone.pose.offset.z, drone.pose.heading));
                drone.polls_left = self.settle_polls;
            }
            _ => {}
        }
        debug!("[SIM] drone {} action {:?}", drone_id, action);
        Ok(())
    }

    async fn set_mode(&self, drone_id: u32, mode: u32) -> Result<()> {
        self.commands
            .lock()
            .await
            .push(FleetCommand::SetMode { drone_id, mode });
        self.check_link(drone_id).await?;

        if !self.drones.lock().await.contains_key(&drone_id) {
            return Err(anyhow!("drone {} is not in the fleet", drone_id));
        }
        debug!(
            "[SIM] drone {} mode {}",
            drone_id,
            flight_mode_name(mode).unwrap_or("?")
        );
        Ok(())
    }
}

#[async_trait]
impl DronePosition for SimulatedFleet {
    async fn query(&self, drone_id: u32) -> Result<DronePose> {
        if self.failing_queries.lock().await.contains(&drone_id) {
            return Err(anyhow!("drone {} position report timed out", drone_id));
        }

        let mut drones = self.drones.lock().await;
        let drone = drones
            .get_mut(&drone_id)
            .ok_or_else(|| anyhow!("drone {} is not in the fleet", drone_id))?;

        if drone.polls_left > 0 {
            drone.polls_left -= 1;
        }
        if drone.polls_left == 0 {
            if let Some(target) = drone.target.take() {
                drone.pose = target;
            }
        }
        Ok(drone.pose)
    }

    async fn roster(&self) -> Result<Vec<u32>> {
        let mut ids: Vec<u32> = self.drones.lock().await.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
