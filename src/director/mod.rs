//! Fleet orchestration: slot geometry, assignments and progress reporting

mod log;
mod manager;
mod session;

pub use manager::{Director, DirectorConfig};
pub use session::SlotLayout;
