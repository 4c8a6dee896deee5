//! Accuracy sources for the survey-in tracker
//!
//! Stations read the estimate reported by the base station receiver
//! ([`BaseStationFeed`]). [`SimulatedSurveyIn`] generates plausible
//! convergence curves for receivers without hardware attached.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skyfleet_shared::tuning::SURVEY_IN_NEAR_BAND_M;
use skyfleet_shared::Constellation;
use std::sync::Arc;

/// Half-width of the random jitter above the near-threshold band
const COARSE_JITTER_M: f64 = 2.5;

/// Mean-free part of the fine-convergence step
const FINE_STEP_M: f64 = 0.1;

/// Fine-convergence jitter range (biased towards convergence)
const FINE_JITTER_M: std::ops::Range<f64> = -0.5..0.7;

/// Supplies one accuracy estimate per tracker tick
#[async_trait]
pub trait AccuracyFeed: Send {
    /// Next estimate in meters; `previous` is the last recorded estimate
    async fn sample(&mut self, previous: f64) -> Result<f64>;
}

/// RTK base station receiver
#[async_trait]
pub trait BaseStation: Send + Sync {
    /// Begin a survey-in lasting at least `min_duration_s` that stops once
    /// the position is known to `accuracy_limit_m`
    async fn start_survey_in(&self, min_duration_s: u32, accuracy_limit_m: f64) -> Result<()>;

    /// Current survey-in accuracy estimate in meters
    async fn accuracy(&self) -> Result<f64>;

    /// Satellites currently tracked, per constellation
    async fn satellites(&self) -> Result<Vec<(Constellation, u32)>>;
}

/// Two-regime decay model of a survey-in
///
/// Above the near-threshold band the estimate moves roughly halfway towards
/// the band edge each tick, with symmetric jitter. Inside the band it shrinks
/// by a small step with smaller jitter, occasionally getting worse.
pub struct SimulatedSurveyIn {
    rng: StdRng,
}

impl SimulatedSurveyIn {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for tests and demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_accuracy(&mut self, previous: f64) -> f64 {
        let next = if previous > SURVEY_IN_NEAR_BAND_M {
            let toward_band = (previous - SURVEY_IN_NEAR_BAND_M) / 2.0;
            let jitter = self.rng.gen_range(-COARSE_JITTER_M..COARSE_JITTER_M);
            previous - toward_band + jitter
        } else {
            previous - (FINE_STEP_M + self.rng.gen_range(FINE_JITTER_M))
        };
        next.max(0.0)
    }
}

impl Default for SimulatedSurveyIn {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccuracyFeed for SimulatedSurveyIn {
    async fn sample(&mut self, previous: f64) -> Result<f64> {
        Ok(self.next_accuracy(previous))
    }
}

/// Reads the estimate straight from the receiver
pub struct BaseStationFeed {
    station: Arc<dyn BaseStation>,
}

impl BaseStationFeed {
    pub fn new(station: Arc<dyn BaseStation>) -> Self {
        Self { station }
    }
}

#[async_trait]
impl AccuracyFeed for BaseStationFeed {
    async fn sample(&mut self, _previous: f64) -> Result<f64> {
        let accuracy = self.station.accuracy().await?;
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(anyhow!("Base station reported invalid accuracy {}", accuracy));
        }
        Ok(accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReading(f64);

    #[async_trait]
    impl BaseStation for FixedReading {
        async fn start_survey_in(&self, _min_duration_s: u32, _accuracy_limit_m: f64) -> Result<()> {
            Ok(())
        }

        async fn accuracy(&self) -> Result<f64> {
            Ok(self.0)
        }

        async fn satellites(&self) -> Result<Vec<(Constellation, u32)>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_coarse_regime_roughly_halves_distance_to_band() {
        let mut feed = SimulatedSurveyIn::seeded(1);
        for _ in 0..100 {
            let next = feed.next_accuracy(9999.0);
            let expected = 9999.0 - (9999.0 - 10.0) / 2.0;
            assert!((next - expected).abs() <= COARSE_JITTER_M);
        }
    }

    #[test]
    fn test_fine_regime_small_steps() {
        let mut feed = SimulatedSurveyIn::seeded(2);
        for _ in 0..100 {
            let next = feed.next_accuracy(5.0);
            // step in [-0.4, 0.8)
            assert!(next > 5.0 - 0.8 && next <= 5.0 + 0.4);
        }
    }

    #[test]
    fn test_seeded_feeds_are_reproducible() {
        let mut a = SimulatedSurveyIn::seeded(42);
        let mut b = SimulatedSurveyIn::seeded(42);
        let mut acc_a = 9999.0;
        let mut acc_b = 9999.0;
        for _ in 0..50 {
            acc_a = a.next_accuracy(acc_a);
            acc_b = b.next_accuracy(acc_b);
        }
        assert_eq!(acc_a, acc_b);
    }

    #[tokio::test]
    async fn test_base_station_feed_passes_readings_through() {
        let mut feed = BaseStationFeed::new(Arc::new(FixedReading(2.75)));
        assert_eq!(feed.sample(9999.0).await.unwrap(), 2.75);
    }

    #[tokio::test]
    async fn test_base_station_feed_rejects_garbage() {
        let mut feed = BaseStationFeed::new(Arc::new(FixedReading(f64::NAN)));
        assert!(feed.sample(1.0).await.is_err());

        let mut feed = BaseStationFeed::new(Arc::new(FixedReading(-3.0)));
        assert!(feed.sample(1.0).await.is_err());
    }
}
