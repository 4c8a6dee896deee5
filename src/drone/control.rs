//! Fleet-wide actions
//!
//! Fans one action or flight mode change out over a set of drones. An empty
//! target list means every drone in the roster. A failing drone never stops
//! the others; its error lands in the report.

use super::traits::{DroneCommand, DronePosition};
use skyfleet_shared::{flight_mode_name, DroneAction, FleetError, MultiOpReport};
use std::sync::Arc;
use tracing::{info, warn};

pub struct FleetControl {
    command: Arc<dyn DroneCommand>,
    position: Arc<dyn DronePosition>,
}

impl FleetControl {
    pub fn new(command: Arc<dyn DroneCommand>, position: Arc<dyn DronePosition>) -> Self {
        Self { command, position }
    }

    /// Send `action` to `drone_ids` (the whole fleet when empty)
    pub async fn perform(
        &self,
        action: DroneAction,
        drone_ids: &[u32],
    ) -> Result<MultiOpReport, FleetError> {
        if action == DroneAction::ActionUnknown {
            return Err(FleetError::Validation("unknown drone action".into()));
        }

        let targets = self.resolve(drone_ids).await?;
        info!("[FLEET] {:?} for {} drone(s)", action, targets.len());

        let mut report = MultiOpReport::new(targets.len() as u32);
        for drone_id in targets {
            if let Err(e) = self.command.action(drone_id, action).await {
                warn!("[FLEET] drone {} rejected {:?}: {}", drone_id, action, e);
                report.record_failure(format!("drone {}: {}", drone_id, e));
            }
        }
        Ok(report)
    }

    /// Switch `drone_ids` (the whole fleet when empty) to flight mode `mode`
    pub async fn change_mode(
        &self,
        mode: u32,
        drone_ids: &[u32],
    ) -> Result<MultiOpReport, FleetError> {
        let name = flight_mode_name(mode)
            .ok_or_else(|| FleetError::Validation(format!("unknown flight mode {}", mode)))?;

        let targets = self.resolve(drone_ids).await?;
        info!("[FLEET] Mode {} for {} drone(s)", name, targets.len());

        let mut report = MultiOpReport::new(targets.len() as u32);
        for drone_id in targets {
            if let Err(e) = self.command.set_mode(drone_id, mode).await {
                warn!("[FLEET] drone {} stayed out of {}: {}", drone_id, name, e);
                report.record_failure(format!("drone {}: {}", drone_id, e));
            }
        }
        Ok(report)
    }

    /// Explicit targets in ascending order without repeats, or the roster
    async fn resolve(&self, drone_ids: &[u32]) -> Result<Vec<u32>, FleetError> {
        let mut targets = if drone_ids.is_empty() {
            self.position.roster().await.map_err(FleetError::transport)?
        } else {
            drone_ids.to_vec()
        };
        targets.sort_unstable();
        targets.dedup();
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drone::sim::FleetCommand;
    use crate::drone::SimulatedFleet;

    fn control_over(fleet: &Arc<SimulatedFleet>) -> FleetControl {
        FleetControl::new(fleet.clone(), fleet.clone())
    }

    #[tokio::test]
    async fn test_empty_targets_mean_whole_fleet() {
        let fleet = Arc::new(SimulatedFleet::with_drones(1, [3, 1, 2]));
        let control = control_over(&fleet);

        let report = control.perform(DroneAction::ActionArm, &[]).await.unwrap();
        assert_eq!(report.targets, 3);
        assert_eq!(report.failed, 0);

        let armed: Vec<u32> = fleet
            .commands()
            .await
            .into_iter()
            .filter_map(|c| match c {
                FleetCommand::Action { drone_id, .. } => Some(drone_id),
                _ => None,
            })
            .collect();
        assert_eq!(armed, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_explicit_targets_are_deduplicated() {
        let fleet = Arc::new(SimulatedFleet::with_drones(1, [1, 2, 3]));
        let control = control_over(&fleet);

        let report = control.perform(DroneAction::ActionLand, &[2, 2, 1]).await.unwrap();
        assert_eq!(report.targets, 2);
        assert_eq!(fleet.commands().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_reported_per_drone() {
        let fleet = Arc::new(SimulatedFleet::with_drones(1, [1, 2]));
        fleet.fail_commands(2).await;
        let control = control_over(&fleet);

        let report = control.perform(DroneAction::ActionTakeoff, &[1, 2, 9]).await.unwrap();
        assert_eq!(report.targets, 3);
        assert_eq!(report.failed, 2);
        assert!(report.errors[0].starts_with("drone 2:"));
        assert!(report.errors[1].starts_with("drone 9:"));
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let fleet = Arc::new(SimulatedFleet::with_drones(1, [1]));
        let control = control_over(&fleet);

        let err = control.perform(DroneAction::ActionUnknown, &[]).await.unwrap_err();
        assert!(matches!(err, FleetError::Validation(_)));
        assert!(fleet.commands().await.is_empty());
    }

    #[tokio::test]
    async fn test_change_mode() {
        let fleet = Arc::new(SimulatedFleet::with_drones(1, [5, 6]));
        let control = control_over(&fleet);

        let report = control.change_mode(4, &[]).await.unwrap();
        assert_eq!(report.targets, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(
            fleet.commands().await,
            vec![
                FleetCommand::SetMode { drone_id: 5, mode: 4 },
                FleetCommand::SetMode { drone_id: 6, mode: 4 },
            ]
        );

        let err = control.change_mode(8, &[5]).await.unwrap_err();
        assert!(matches!(err, FleetError::Validation(_)));
    }
}
