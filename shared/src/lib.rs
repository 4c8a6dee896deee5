//! SkyFleet Shared Protocol Types
//!
//! This crate provides the protocol types, codec, geometry and lifecycle
//! rules shared by the ground station and its operator clients.

pub mod codec;
pub mod error;
pub mod geo;
pub mod proto;
pub mod state_machine;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use error::FleetError;
pub use proto::*;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Tuning parameters for the system
pub mod tuning {
    /// Mean Earth radius used by the tangent-plane projection
    pub const EARTH_RADIUS_M: f64 = 6.371e6;

    /// Survey-in accuracy before the first sample ("unconverged")
    pub const SURVEY_IN_SENTINEL_M: f64 = 9999.0;

    /// Upper edge of the fine-convergence band
    pub const SURVEY_IN_NEAR_BAND_M: f64 = 10.0;

    /// Accuracy at which the base station is considered ready
    pub const SURVEY_IN_THRESHOLD_M: f64 = 1.0;

    /// Survey-in tick period in milliseconds
    pub const SURVEY_IN_TICK_MS: u64 = 1000;

    /// Default horizontal tolerance for slot convergence
    pub const ASSIGN_POSITION_TOLERANCE_M: f64 = 0.5;

    /// Default heading tolerance for slot convergence
    pub const ASSIGN_HEADING_TOLERANCE_DEG: f64 = 5.0;

    /// Minimum spacing between two slots of a layout
    pub const MIN_SLOT_SPACING_M: f64 = 0.5;

    /// Operator log lines retained by the Director
    pub const DIRECTOR_LOG_CAPACITY: usize = 64;

    /// Maximum control-plane frame size (1 MB)
    pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

    /// Serial rates accepted for port configurations
    pub const STANDARD_BAUD_RATES: [u32; 8] =
        [9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];
}

impl MultiOpReport {
    /// Report with `targets` drones and no failures yet
    pub fn new(targets: u32) -> Self {
        Self {
            targets,
            failed: 0,
            errors: Vec::new(),
        }
    }

    /// Record one failed target
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(message.into());
    }
}

impl Response {
    /// Successful reply carrying `body`
    pub fn ok(request_id: u64, body: response::Body) -> Self {
        Self {
            request_id,
            error: None,
            body: Some(body),
        }
    }

    /// Failed reply
    pub fn failed(request_id: u64, err: &FleetError) -> Self {
        Self {
            request_id,
            error: Some(err.into()),
            body: None,
        }
    }
}

impl RtkInfo {
    pub fn new(status: SurveyInStatus, duration_s: u64, accuracy_m: f64) -> Self {
        Self {
            status: status.into(),
            survey_in_duration_s: duration_s,
            survey_in_accuracy_m: accuracy_m,
            satellites: Vec::new(),
        }
    }
}

impl SatelliteConfig {
    /// Whether `constellation` is enabled
    pub fn enables(&self, constellation: Constellation) -> bool {
        match constellation {
            Constellation::Gps => self.gps,
            Constellation::Glonass => self.glonass,
            Constellation::Galileo => self.galileo,
            Constellation::Beidou => self.beidou,
            Constellation::ConstellationUnknown => false,
        }
    }
}

/// ArduCopter custom flight modes accepted by `ChangeModeRequest`
pub const FLIGHT_MODES: [(u32, &str); 26] = [
    (0, "STABILIZE"),
    (1, "ACRO"),
    (2, "ALTHOLD"),
    (3, "AUTO"),
    (4, "GUIDED"),
    (5, "LOITER"),
    (6, "RTL"),
    (7, "CIRCLE"),
    (9, "LAND"),
    (11, "DRIFT"),
    (13, "SPORT"),
    (14, "FLIP"),
    (15, "AUTOTUNE"),
    (16, "POSHOLD"),
    (17, "BRAKE"),
    (18, "THROW"),
    (19, "AVOID_ADSB"),
    (20, "GUIDED_NOGPS"),
    (21, "SMART_RTL"),
    (22, "FLOWHOLD"),
    (23, "FOLLOW"),
    (24, "ZIGZAG"),
    (25, "SYSTEMID"),
    (26, "HELI_AUTOROTATE"),
    (27, "AUTO_RTL"),
    (28, "TURTLE"),
];

/// Name of an ArduCopter flight mode, if the number is known
pub fn flight_mode_name(mode: u32) -> Option<&'static str> {
    FLIGHT_MODES
        .iter()
        .find(|(number, _)| *number == mode)
        .map(|(_, name)| *name)
}
