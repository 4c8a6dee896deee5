//! Station configuration

use crate::director::DirectorConfig;
use skyfleet_shared::{tuning, FleetError};
use std::time::Duration;

/// Everything needed to bring up a station
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Operator control plane address
    pub listen_addr: String,
    pub director: DirectorConfig,
    /// Survey-in tick period
    pub survey_in_tick: Duration,
    /// Seed for the simulated survey-in; random when unset
    pub simulation_seed: Option<u64>,
    /// Position polls a simulated drone needs to reach its slot
    pub settle_polls: u32,
    /// Drones present in the simulated fleet at startup
    pub simulated_drones: Vec<u32>,
    /// Serial devices offered by the simulated port backend
    pub serial_devices: Vec<String>,
}

impl StationConfig {
    /// Reject settings the station cannot run with
    pub fn validate(&self) -> Result<(), FleetError> {
        if self.survey_in_tick.is_zero() {
            return Err(FleetError::Validation(
                "survey-in tick period must be positive".into(),
            ));
        }

        let tolerances = [
            ("position tolerance", self.director.position_tolerance_m),
            ("heading tolerance", self.director.heading_tolerance_deg),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value <= 0.0 {
                return Err(FleetError::Validation(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7700".into(),
            director: DirectorConfig::default(),
            survey_in_tick: Duration::from_millis(tuning::SURVEY_IN_TICK_MS),
            simulation_seed: None,
            settle_polls: 3,
            simulated_drones: vec![1, 2, 3, 4],
            serial_devices: vec![
                "/dev/ttyUSB0".into(),
                "/dev/ttyUSB1".into(),
                "/dev/ttyACM0".into(),
            ],
        }
    }
}
