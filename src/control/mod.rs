//! Operator control plane over TCP

pub mod dispatcher;
pub mod server;

pub use server::ControlServer;
