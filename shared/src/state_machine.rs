//! Assignment State Machine
//!
//! Defines the valid lifecycle transitions of a drone-to-slot assignment:
//!
//! ```text
//! ASSIGNING --Converged--> ASSIGNED --Transferred--> TRANSFERRED
//!     |                        |
//!     +-------Cancelled--------+-----> CANCELLED
//! ```

use crate::AssignmentState;

/// Events that can trigger assignment transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentEvent {
    /// Drone reached its slot within tolerance
    Converged,
    /// Control handed off to the synchronized-flight phase
    Transferred,
    /// Operator cancelled the assignment
    Cancelled,
}

/// Result of a transition attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionResult {
    /// Transition was valid and state changed
    Success(AssignmentState),
    /// Transition was invalid from current state
    Invalid {
        from: AssignmentState,
        event: AssignmentEvent,
    },
}

/// Lifecycle tracker for one assignment
#[derive(Debug, Clone)]
pub struct AssignmentLifecycle {
    current_state: AssignmentState,
}

impl Default for AssignmentLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentLifecycle {
    /// Start a lifecycle in ASSIGNING
    pub fn new() -> Self {
        Self {
            current_state: AssignmentState::AssignmentAssigning,
        }
    }

    pub fn state(&self) -> AssignmentState {
        self.current_state
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: AssignmentEvent) -> TransitionResult {
        match next_state(self.current_state, event) {
            Some(state) => {
                self.current_state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }
}

/// Get the next state for a given event, if the transition is valid
pub fn next_state(from: AssignmentState, event: AssignmentEvent) -> Option<AssignmentState> {
    use AssignmentEvent::*;
    use AssignmentState::*;

    match (from, event) {
        (AssignmentAssigning, Converged) => Some(AssignmentAssigned),
        (AssignmentAssigned, Transferred) => Some(AssignmentTransferred),
        (AssignmentAssigning | AssignmentAssigned, Cancelled) => Some(AssignmentCancelled),
        _ => None,
    }
}
