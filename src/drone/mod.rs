//! Fleet collaborators: movement commands, position reports and fleet-wide
//! actions

pub mod control;
pub mod sim;
pub mod traits;

pub use control::FleetControl;
pub use sim::SimulatedFleet;
pub use traits::{DroneCommand, DronePose, DronePosition};
