//! RTK base station: receiver contract, survey-in tracking and the RTK port
//! link

pub mod feed;
pub mod link;
pub mod monitor;
pub mod sim;
pub mod tracker;

pub use feed::{AccuracyFeed, BaseStation, BaseStationFeed};
pub use link::RtkLink;
pub use sim::SimulatedReceiver;
