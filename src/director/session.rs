//! Fleet session: slot geometry and the live assignment set

use skyfleet_shared::geo::{normalize_heading, project};
use skyfleet_shared::state_machine::{AssignmentEvent, AssignmentLifecycle, TransitionResult};
use skyfleet_shared::{tuning, AssignmentState, FleetError, GpsPoint, LocalOffset, PlanarOffset};
use std::collections::{BTreeMap, BTreeSet};

/// Operator-supplied slot positions
#[derive(Debug, Clone, PartialEq)]
pub enum SlotLayout {
    /// Offsets in meters from the origin (x east, y north)
    Relative(Vec<PlanarOffset>),
    /// GNSS positions, projected onto the origin's tangent plane
    Absolute(Vec<GpsPoint>),
}

impl SlotLayout {
    pub fn len(&self) -> usize {
        match self {
            SlotLayout::Relative(slots) => slots.len(),
            SlotLayout::Absolute(slots) => slots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Horizontal slot positions in meters from `origin`
    fn resolve(&self, origin: &GpsPoint) -> Result<Vec<(f64, f64)>, FleetError> {
        match self {
            SlotLayout::Relative(slots) => slots
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    if s.x.is_finite() && s.y.is_finite() {
                        Ok((s.x, s.y))
                    } else {
                        Err(FleetError::Validation(format!(
                            "slot {} has non-finite offset",
                            i
                        )))
                    }
                })
                .collect(),
            SlotLayout::Absolute(points) => points
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    if p.is_valid() {
                        let offset = project(p, origin);
                        Ok((offset.x, offset.y))
                    } else {
                        Err(FleetError::Validation(format!(
                            "slot {} is not a valid GPS position",
                            i
                        )))
                    }
                })
                .collect(),
        }
    }
}

/// Takeoff position of one drone in the formation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub index: u32,
    /// Target position; `z` is the slot height
    pub offset: LocalOffset,
    pub heading: f64,
    pub height: f64,
}

/// A drone holding a slot
#[derive(Debug, Clone)]
pub struct Assignment {
    pub drone_id: u32,
    pub slot_index: u32,
    lifecycle: AssignmentLifecycle,
}

impl Assignment {
    fn new(drone_id: u32, slot_index: u32) -> Self {
        Self {
            drone_id,
            slot_index,
            lifecycle: AssignmentLifecycle::new(),
        }
    }

    pub fn state(&self) -> AssignmentState {
        self.lifecycle.state()
    }

    /// Apply a lifecycle event; invalid events leave the state untouched
    pub fn advance(&mut self, event: AssignmentEvent) -> Result<AssignmentState, FleetError> {
        match self.lifecycle.process_event(event) {
            TransitionResult::Success(state) => Ok(state),
            TransitionResult::Invalid { from, event } => Err(FleetError::State(format!(
                "drone {}: {:?} not allowed in {:?}",
                self.drone_id, event, from
            ))),
        }
    }
}

/// State of one fleet session, from `init` to `destroy`
///
/// Invariants: at most one assignment per drone and per slot; assignments
/// are keyed and iterated by ascending slot index; unused slots never hold
/// an assignment.
#[derive(Debug, Clone)]
pub struct FleetSession {
    origin: GpsPoint,
    heading: f64,
    height: f64,
    slots: Vec<Slot>,
    assignments: BTreeMap<u32, Assignment>,
    unused: BTreeSet<u32>,
}

impl FleetSession {
    pub fn open(
        origin: GpsPoint,
        layout: &SlotLayout,
        heading: f64,
        height: f64,
    ) -> Result<Self, FleetError> {
        if !origin.is_valid() {
            return Err(FleetError::Validation("origin is not a valid GPS position".into()));
        }
        if !heading.is_finite() {
            return Err(FleetError::Validation("heading must be finite".into()));
        }
        if !(height.is_finite() && height >= 0.0) {
            return Err(FleetError::Validation(format!(
                "height must be a non-negative number, got {}",
                height
            )));
        }
        if layout.is_empty() {
            return Err(FleetError::Validation("slot layout is empty".into()));
        }

        let positions = layout.resolve(&origin)?;
        check_spacing(&positions)?;

        let heading = normalize_heading(heading);
        let slots = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Slot {
                index: i as u32,
                offset: LocalOffset::new(x, y, height),
                heading,
                height,
            })
            .collect();

        Ok(Self {
            origin,
            heading,
            height,
            slots,
            assignments: BTreeMap::new(),
            unused: BTreeSet::new(),
        })
    }

    pub fn origin(&self) -> GpsPoint {
        self.origin
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots.get(index as usize)
    }

    /// Slot held by `drone_id`
    pub fn slot_of(&self, drone_id: u32) -> Option<u32> {
        self.assignments
            .values()
            .find(|a| a.drone_id == drone_id)
            .map(|a| a.slot_index)
    }

    /// Lowest-index slot that is neither held nor unused
    pub fn first_free_slot(&self) -> Option<u32> {
        self.slots
            .iter()
            .map(|s| s.index)
            .find(|i| !self.assignments.contains_key(i) && !self.unused.contains(i))
    }

    /// Record a new ASSIGNING assignment; caller checks the slot is free
    pub fn insert(&mut self, drone_id: u32, slot_index: u32) -> &Assignment {
        self.assignments
            .entry(slot_index)
            .or_insert_with(|| Assignment::new(drone_id, slot_index))
    }

    /// Drop the assignment of `slot_index`, freeing the slot
    pub fn remove(&mut self, slot_index: u32) -> Option<Assignment> {
        self.assignments.remove(&slot_index)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    pub fn assignment_mut(&mut self, slot_index: u32) -> Option<&mut Assignment> {
        self.assignments.get_mut(&slot_index)
    }

    /// Slot indices whose assignment is in `state`, ascending
    pub fn slots_in(&self, state: AssignmentState) -> Vec<u32> {
        self.assignments
            .values()
            .filter(|a| a.state() == state)
            .map(|a| a.slot_index)
            .collect()
    }

    pub fn count(&self, state: AssignmentState) -> usize {
        self.assignments.values().filter(|a| a.state() == state).count()
    }

    /// Exclude a free slot from assignment
    pub fn mark_unused(&mut self, slot_index: u32) -> Result<(), FleetError> {
        if self.slot(slot_index).is_none() {
            return Err(FleetError::NotFound(format!("slot {}", slot_index)));
        }
        if let Some(assignment) = self.assignments.get(&slot_index) {
            return Err(FleetError::State(format!(
                "slot {} is held by drone {}",
                slot_index, assignment.drone_id
            )));
        }
        self.unused.insert(slot_index);
        Ok(())
    }

    pub fn unused_count(&self) -> usize {
        self.unused.len()
    }

    /// Every slot is transferred or explicitly unused
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|slot| {
            self.unused.contains(&slot.index)
                || self
                    .assignments
                    .get(&slot.index)
                    .is_some_and(|a| a.state() == AssignmentState::AssignmentTransferred)
        })
    }
}

fn check_spacing(positions: &[(f64, f64)]) -> Result<(), FleetError> {
    for (i, a) in positions.iter().enumerate() {
        for (j, b) in positions.iter().enumerate().skip(i + 1) {
            let gap = (a.0 - b.0).hypot(a.1 - b.1);
            if gap < tuning::MIN_SLOT_SPACING_M {
                return Err(FleetError::Validation(format!(
                    "slots {} and {} are {:.2}m apart",
                    i, j, gap
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relative(points: &[(f64, f64)]) -> SlotLayout {
        SlotLayout::Relative(points.iter().map(|&(x, y)| PlanarOffset { x, y }).collect())
    }

    fn origin() -> GpsPoint {
        GpsPoint::new(0.0, 0.0, 0.0)
    }

    #[test]
    fn test_relative_layout_builds_slots() {
        let session =
            FleetSession::open(origin(), &relative(&[(10.0, 0.0), (0.0, 10.0)]), 370.0, 5.0)
                .unwrap();

        assert_eq!(session.slots().len(), 2);
        let slot = session.slot(0).unwrap();
        assert_eq!(slot.offset, LocalOffset::new(10.0, 0.0, 5.0));
        assert!((slot.heading - 10.0).abs() < 1e-9);
        assert_eq!(session.first_free_slot(), Some(0));
    }

    #[test]
    fn test_absolute_layout_is_projected() {
        let base = GpsPoint::new(47.0, 8.0, 400.0);
        let (lat_unit, lon_unit) = skyfleet_shared::geo::degree_lengths(&base);
        let layout = SlotLayout::Absolute(vec![
            GpsPoint::new(47.0 + 10.0 / lat_unit, 8.0, 400.0),
            GpsPoint::new(47.0, 8.0 + 10.0 / lon_unit, 400.0),
        ]);

        let session = FleetSession::open(base, &layout, 0.0, 3.0).unwrap();
        let north = session.slot(0).unwrap().offset;
        let east = session.slot(1).unwrap().offset;
        assert!(north.x.abs() < 1e-6 && (north.y - 10.0).abs() < 1e-6);
        assert!((east.x - 10.0).abs() < 1e-6 && east.y.abs() < 1e-6);
        assert_eq!(north.z, 3.0);
    }

    #[test]
    fn test_layout_validation() {
        let cases = [
            FleetSession::open(origin(), &relative(&[]), 0.0, 5.0),
            FleetSession::open(origin(), &relative(&[(0.0, 0.0), (0.3, 0.0)]), 0.0, 5.0),
            FleetSession::open(origin(), &relative(&[(f64::NAN, 0.0)]), 0.0, 5.0),
            FleetSession::open(origin(), &relative(&[(1.0, 0.0)]), f64::INFINITY, 5.0),
            FleetSession::open(origin(), &relative(&[(1.0, 0.0)]), 0.0, -1.0),
            FleetSession::open(GpsPoint::new(95.0, 0.0, 0.0), &relative(&[(1.0, 0.0)]), 0.0, 5.0),
        ];
        for result in cases {
            assert!(matches!(result, Err(FleetError::Validation(_))));
        }
    }

    #[test]
    fn test_mark_unused_rules() {
        let mut session =
            FleetSession::open(origin(), &relative(&[(0.0, 0.0), (5.0, 0.0)]), 0.0, 5.0).unwrap();
        session.insert(3, 0);

        assert!(matches!(session.mark_unused(0), Err(FleetError::State(_))));
        assert!(matches!(session.mark_unused(7), Err(FleetError::NotFound(_))));
        session.mark_unused(1).unwrap();
        assert_eq!(session.first_free_slot(), None);
    }

    #[test]
    fn test_ready_needs_every_slot_settled() {
        let mut session =
            FleetSession::open(origin(), &relative(&[(0.0, 0.0), (5.0, 0.0)]), 0.0, 5.0).unwrap();
        session.insert(1, 0);
        let assignment = session.assignment_mut(0).unwrap();
        assignment.advance(AssignmentEvent::Converged).unwrap();
        assignment.advance(AssignmentEvent::Transferred).unwrap();
        assert!(!session.is_ready());

        session.mark_unused(1).unwrap();
        assert!(session.is_ready());
    }

    #[test]
    fn test_invalid_event_is_a_state_error() {
        let mut session =
            FleetSession::open(origin(), &relative(&[(0.0, 0.0)]), 0.0, 5.0).unwrap();
        session.insert(1, 0);
        let assignment = session.assignment_mut(0).unwrap();

        let err = assignment.advance(AssignmentEvent::Transferred).unwrap_err();
        assert!(matches!(err, FleetError::State(_)));
        assert_eq!(assignment.state(), AssignmentState::AssignmentAssigning);
    }
}
