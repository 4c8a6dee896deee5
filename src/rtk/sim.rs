//! Simulated base station receiver
//!
//! Each accuracy read counts as one second of survey and advances a
//! [`SimulatedSurveyIn`] curve by one step. The estimate stays at or above
//! the requested accuracy until the minimum duration has passed. Reads fail
//! until a survey-in has been started.

use super::feed::{BaseStation, SimulatedSurveyIn};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use skyfleet_shared::tuning::SURVEY_IN_SENTINEL_M;
use skyfleet_shared::Constellation;
use tokio::sync::Mutex;
use tracing::info;

/// Satellites the simulated antenna sees
const SKY: [(Constellation, u32); 4] = [
    (Constellation::Gps, 9),
    (Constellation::Glonass, 6),
    (Constellation::Galileo, 7),
    (Constellation::Beidou, 5),
];

/// Survey-in parameters last sent to the receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyInRequest {
    pub min_duration_s: u32,
    pub accuracy_limit_m: f64,
}

struct ReceiverState {
    curve: SimulatedSurveyIn,
    estimate: f64,
    seconds: u64,
    request: Option<SurveyInRequest>,
}

pub struct SimulatedReceiver {
    state: Mutex<ReceiverState>,
}

impl SimulatedReceiver {
    pub fn new() -> Self {
        Self::with_curve(SimulatedSurveyIn::new())
    }

    /// Reproducible convergence for tests and demos
    pub fn seeded(seed: u64) -> Self {
        Self::with_curve(SimulatedSurveyIn::seeded(seed))
    }

    fn with_curve(curve: SimulatedSurveyIn) -> Self {
        Self {
            state: Mutex::new(ReceiverState {
                curve,
                estimate: SURVEY_IN_SENTINEL_M,
                seconds: 0,
                request: None,
            }),
        }
    }

    #[cfg(test)]
    pub async fn survey_request(&self) -> Option<SurveyInRequest> {
        self.state.lock().await.request
    }
}

impl Default for SimulatedReceiver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseStation for SimulatedReceiver {
    async fn start_survey_in(&self, min_duration_s: u32, accuracy_limit_m: f64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.estimate = SURVEY_IN_SENTINEL_M;
        state.seconds = 0;
        state.request = Some(SurveyInRequest {
            min_duration_s,
            accuracy_limit_m,
        });
        info!(
            "[SIM] receiver surveying for at least {}s down to {:.2}m",
            min_duration_s, accuracy_limit_m
        );
        Ok(())
    }

    async fn accuracy(&self) -> Result<f64> {
        let mut state = self.state.lock().await;
        let Some(request) = state.request else {
            return Err(anyhow!("receiver is not surveying"));
        };

        state.seconds += 1;
        let previous = state.estimate;
        let next = state.curve.next_accuracy(previous);
        state.estimate = if state.seconds < u64::from(request.min_duration_s) {
            next.max(request.accuracy_limit_m)
        } else {
            next
        };
        Ok(state.estimate)
    }

    async fn satellites(&self) -> Result<Vec<(Constellation, u32)>> {
        Ok(SKY.to_vec())
    }
}
