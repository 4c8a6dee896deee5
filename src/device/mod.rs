//! Exclusive device sessions for the radio and RTK ports
//!
//! Both ports share one connection protocol ([`DeviceSession`]); they only
//! differ in their configuration type.

mod config;
mod session;

pub use session::DeviceSession;

use skyfleet_shared::LoraConfig;

/// Radio link session
pub type LoraLink = DeviceSession<LoraConfig>;
