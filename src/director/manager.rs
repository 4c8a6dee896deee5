//! Director
//!
//! Owns the fleet session and drives drones through slot assignment:
//!
//! ```text
//! assign ──> ASSIGNING ──checkAssign──> ASSIGNED ──transferAssign──> TRANSFERRED
//!                │                          │
//!                └───────cancelAssign───────┴──> (slot released)
//! ```
//!
//! Slots are picked and assignments iterated in ascending slot order, so
//! identical inputs always produce identical assignments.

use super::log::OperatorLog;
use super::session::{FleetSession, Slot, SlotLayout};
use crate::drone::{DroneCommand, DronePose, DronePosition};
use skyfleet_shared::geo::heading_delta;
use skyfleet_shared::state_machine::AssignmentEvent;
use skyfleet_shared::{
    tuning, AssignmentState, CheckReport, DirectorStatus, FleetError, GpsPoint, MultiOpReport,
};
use std::sync::Arc;

/// Director tuning
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// Max horizontal distance from the slot to count as converged
    pub position_tolerance_m: f64,
    /// Max heading error to count as converged
    pub heading_tolerance_deg: f64,
    /// Operator log lines kept for polling
    pub log_capacity: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            position_tolerance_m: tuning::ASSIGN_POSITION_TOLERANCE_M,
            heading_tolerance_deg: tuning::ASSIGN_HEADING_TOLERANCE_DEG,
            log_capacity: tuning::DIRECTOR_LOG_CAPACITY,
        }
    }
}

pub struct Director {
    command: Arc<dyn DroneCommand>,
    position: Arc<dyn DronePosition>,
    config: DirectorConfig,
    session: Option<FleetSession>,
    log: OperatorLog,
}

impl Director {
    pub fn new(
        command: Arc<dyn DroneCommand>,
        position: Arc<dyn DronePosition>,
        config: DirectorConfig,
    ) -> Self {
        let log = OperatorLog::new(config.log_capacity);
        Self {
            command,
            position,
            config,
            session: None,
            log,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Open a fleet session
    pub fn init(
        &mut self,
        origin: GpsPoint,
        layout: SlotLayout,
        heading: f64,
        height: f64,
    ) -> Result<(), FleetError> {
        if self.session.is_some() {
            return Err(FleetError::AlreadyInitialized);
        }

        let session = FleetSession::open(origin, &layout, heading, height)?;
        let origin = session.origin();
        self.log.push(format!(
            "Session opened at ({:.6}, {:.6}): {} slots, heading {:.0}, height {:.1}m",
            origin.latitude,
            origin.longitude,
            session.slots().len(),
            session.heading(),
            session.height()
        ));
        self.session = Some(session);
        Ok(())
    }

    /// Drop the session and every assignment; no-op without a session
    pub fn destroy(&mut self) {
        if let Some(session) = self.session.take() {
            self.log.push(format!(
                "Session closed, {} assignments dropped",
                session.assignments().count()
            ));
        }
    }

    /// Give `drone_id` the lowest free slot and send it there
    ///
    /// Returns the slot index. A rejected movement command releases the
    /// slot again.
    pub async fn assign(&mut self, drone_id: u32) -> Result<u32, FleetError> {
        let session = self.session.as_mut().ok_or(FleetError::NotInitialized)?;

        if session.slot_of(drone_id).is_some() {
            return Err(FleetError::AlreadyAssigned(drone_id));
        }
        let slot_index = session.first_free_slot().ok_or(FleetError::NoFreeSlot)?;
        let slot = *session
            .slot(slot_index)
            .ok_or_else(|| FleetError::NotFound(format!("slot {}", slot_index)))?;

        session.insert(drone_id, slot_index);

        if let Err(e) = self
            .command
            .move_to(drone_id, slot.offset, slot.heading, slot.height)
            .await
        {
            session.remove(slot_index);
            self.log.push(format!(
                "Drone {} rejected move to slot {}: {}",
                drone_id, slot_index, e
            ));
            return Err(FleetError::transport(e));
        }

        self.log.push(format!(
            "Drone {} assigned to slot {} at ({:.1}, {:.1}, {:.1})",
            drone_id, slot_index, slot.offset.x, slot.offset.y, slot.offset.z
        ));
        Ok(slot_index)
    }

    /// Poll every ASSIGNING drone and promote the ones that reached their slot
    ///
    /// Position query failures are logged; the drone stays ASSIGNING.
    pub async fn check_assign(&mut self) -> Result<CheckReport, FleetError> {
        let session = self.session.as_mut().ok_or(FleetError::NotInitialized)?;

        let pending: Vec<(u32, Slot)> = session
            .assignments()
            .filter(|a| a.state() == AssignmentState::AssignmentAssigning)
            .filter_map(|a| session.slot(a.slot_index).map(|slot| (a.drone_id, *slot)))
            .collect();

        let mut report = CheckReport::default();
        for (drone_id, slot) in pending {
            let pose = match self.position.query(drone_id).await {
                Ok(pose) => pose,
                Err(e) => {
                    self.log
                        .push(format!("Drone {} position unavailable: {}", drone_id, e));
                    report.still_assigning += 1;
                    continue;
                }
            };

            if !has_converged(&pose, &slot, &self.config) {
                report.still_assigning += 1;
                continue;
            }

            if let Some(assignment) = session.assignment_mut(slot.index) {
                assignment.advance(AssignmentEvent::Converged)?;
                report.newly_assigned += 1;
                self.log
                    .push(format!("Drone {} reached slot {}", drone_id, slot.index));
            }
        }

        report.converged_total = (session.count(AssignmentState::AssignmentAssigned)
            + session.count(AssignmentState::AssignmentTransferred))
            as u32;
        Ok(report)
    }

    /// Hand every ASSIGNED drone over to synchronized flight
    pub fn transfer_assign(&mut self) -> Result<MultiOpReport, FleetError> {
        let session = self.session.as_mut().ok_or(FleetError::NotInitialized)?;

        let targets = session.slots_in(AssignmentState::AssignmentAssigned);
        if targets.is_empty() {
            return Err(FleetError::NothingAssigned);
        }

        let mut report = MultiOpReport::new(targets.len() as u32);
        for slot_index in targets {
            let Some(assignment) = session.assignment_mut(slot_index) else {
                continue;
            };
            match assignment.advance(AssignmentEvent::Transferred) {
                Ok(_) => self.log.push(format!(
                    "Drone {} transferred from slot {}",
                    assignment.drone_id, slot_index
                )),
                Err(e) => report.record_failure(e.to_string()),
            }
        }
        Ok(report)
    }

    /// Release every slot not yet transferred and tell those drones to hold
    ///
    /// Slots are released even when the hold command fails; failures are
    /// listed in the report.
    pub async fn cancel_assign(&mut self) -> Result<MultiOpReport, FleetError> {
        let session = self.session.as_mut().ok_or(FleetError::NotInitialized)?;

        let targets: Vec<u32> = session
            .assignments()
            .filter(|a| a.state() != AssignmentState::AssignmentTransferred)
            .map(|a| a.slot_index)
            .collect();

        let mut report = MultiOpReport::new(targets.len() as u32);
        for slot_index in targets {
            let Some(mut assignment) = session.remove(slot_index) else {
                continue;
            };
            if let Err(e) = assignment.advance(AssignmentEvent::Cancelled) {
                report.record_failure(e.to_string());
                continue;
            }

            let drone_id = assignment.drone_id;
            match self.command.hold(drone_id).await {
                Ok(()) => self
                    .log
                    .push(format!("Drone {} released slot {}", drone_id, slot_index)),
                Err(e) => {
                    self.log
                        .push(format!("Drone {} did not confirm hold: {}", drone_id, e));
                    report.record_failure(format!("drone {}: {}", drone_id, e));
                }
            }
        }
        Ok(report)
    }

    /// Leave a slot empty on purpose; it then counts as settled
    pub fn mark_unused(&mut self, slot_index: u32) -> Result<(), FleetError> {
        let session = self.session.as_mut().ok_or(FleetError::NotInitialized)?;
        session.mark_unused(slot_index)?;
        self.log.push(format!("Slot {} marked unused", slot_index));
        Ok(())
    }

    /// Read-only progress snapshot
    pub fn poll_status(&self) -> DirectorStatus {
        let Some(session) = &self.session else {
            return DirectorStatus {
                status: "Not initialized".into(),
                log: self.log.render(),
                ..Default::default()
            };
        };

        let assigning = session.count(AssignmentState::AssignmentAssigning);
        let assigned = session.count(AssignmentState::AssignmentAssigned);
        let transferred = session.count(AssignmentState::AssignmentTransferred);
        let unused = session.unused_count();
        let total = session.slots().len();
        let ready = session.is_ready();

        let status = if ready {
            format!("Ready: {} transferred, {} unused", transferred, unused)
        } else {
            format!(
                "{} assigning, {} assigned, {} transferred, {} unused, {} free",
                assigning,
                assigned,
                transferred,
                unused,
                total - assigning - assigned - transferred - unused
            )
        };

        DirectorStatus {
            assigning: assigning as u32,
            assigned: assigned as u32,
            total: total as u32,
            ready,
            status,
            log: self.log.render(),
        }
    }
}

fn has_converged(pose: &DronePose, slot: &Slot, config: &DirectorConfig) -> bool {
    pose.offset.horizontal_distance(&slot.offset) <= config.position_tolerance_m
        && heading_delta(pose.heading, slot.heading).abs() <= config.heading_tolerance_deg
}
