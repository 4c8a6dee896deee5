//! Port configuration validation

use crate::transport::PortConfig;
use skyfleet_shared::{tuning, FleetError, LoraConfig, RtkConfig};

fn validate_serial(device: &str, baud_rate: u32) -> Result<(), FleetError> {
    if device.trim().is_empty() {
        return Err(FleetError::Validation("device path is empty".into()));
    }
    if !tuning::STANDARD_BAUD_RATES.contains(&baud_rate) {
        return Err(FleetError::Validation(format!(
            "unsupported baud rate {}",
            baud_rate
        )));
    }
    Ok(())
}

impl PortConfig for LoraConfig {
    fn device(&self) -> &str {
        &self.device
    }

    fn validate(&self) -> Result<(), FleetError> {
        validate_serial(&self.device, self.baud_rate)
    }
}

impl PortConfig for RtkConfig {
    fn device(&self) -> &str {
        &self.device
    }

    fn validate(&self) -> Result<(), FleetError> {
        validate_serial(&self.device, self.baud_rate)?;

        if self.survey_in {
            if self.survey_in_duration_s == 0 {
                return Err(FleetError::Validation(
                    "survey-in duration must be positive".into(),
                ));
            }
            if !(self.survey_in_accuracy_m.is_finite() && self.survey_in_accuracy_m > 0.0) {
                return Err(FleetError::Validation(format!(
                    "survey-in accuracy must be positive, got {}",
                    self.survey_in_accuracy_m
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rtk(survey_in: bool, duration: u32, accuracy: f64) -> RtkConfig {
        RtkConfig {
            device: "/dev/ttyACM0".into(),
            baud_rate: 115200,
            survey_in,
            survey_in_duration_s: duration,
            survey_in_accuracy_m: accuracy,
        }
    }

    #[test]
    fn test_lora_validation() {
        let ok = LoraConfig {
            device: "/dev/ttyUSB0".into(),
            baud_rate: 57600,
        };
        assert!(ok.validate().is_ok());

        let blank = LoraConfig {
            device: "  ".into(),
            baud_rate: 57600,
        };
        assert!(matches!(blank.validate(), Err(FleetError::Validation(_))));

        let odd_rate = LoraConfig {
            device: "/dev/ttyUSB0".into(),
            baud_rate: 12345,
        };
        assert!(matches!(odd_rate.validate(), Err(FleetError::Validation(_))));
    }

    #[test]
    fn test_rtk_survey_in_parameters() {
        assert!(rtk(true, 60, 2.0).validate().is_ok());
        assert!(rtk(true, 0, 2.0).validate().is_err());
        assert!(rtk(true, 60, 0.0).validate().is_err());
        assert!(rtk(true, 60, f64::NAN).validate().is_err());
        // Survey-in parameters are ignored for a fixed base
        assert!(rtk(false, 0, 0.0).validate().is_ok());
    }
}
