//! Fleet error taxonomy

use thiserror::Error;

use crate::{ErrorInfo, ErrorKind};

/// Errors surfaced by the Director and the device sessions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FleetError {
    /// Malformed input, rejected before any state change
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Resource already held by someone else
    #[error("Resource busy: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Director is not initialized")]
    NotInitialized,

    #[error("Director is already initialized")]
    AlreadyInitialized,

    #[error("No free slot left")]
    NoFreeSlot,

    #[error("Drone {0} already holds a slot")]
    AlreadyAssigned(u32),

    #[error("No drone is in ASSIGNED state")]
    NothingAssigned,

    /// Operation invalid in the current lifecycle state
    #[error("Invalid state: {0}")]
    State(String),

    /// Collaborator failure, message kept verbatim
    #[error("Transport error: {0}")]
    Transport(String),
}

impl FleetError {
    /// Fold the error onto the operator-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            FleetError::Validation(_) => ErrorKind::ErrValidation,
            FleetError::Conflict(_) => ErrorKind::ErrConflict,
            FleetError::NotFound(_) => ErrorKind::ErrNotFound,
            FleetError::NotInitialized
            | FleetError::AlreadyInitialized
            | FleetError::NoFreeSlot
            | FleetError::AlreadyAssigned(_)
            | FleetError::NothingAssigned
            | FleetError::State(_) => ErrorKind::ErrState,
            FleetError::Transport(_) => ErrorKind::ErrTransport,
        }
    }

    /// Wrap a collaborator failure
    pub fn transport(err: impl std::fmt::Display) -> Self {
        FleetError::Transport(err.to_string())
    }
}

impl From<&FleetError> for ErrorInfo {
    fn from(err: &FleetError) -> Self {
        ErrorInfo {
            kind: err.kind().into(),
            message: err.to_string(),
        }
    }
}
