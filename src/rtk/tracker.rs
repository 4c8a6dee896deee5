//! Survey-in convergence tracker
//!
//! Turns a stream of accuracy estimates into a discrete readiness state.
//! The tracker only does threshold detection and elapsed-time bookkeeping;
//! where the estimates come from is the business of an
//! [`AccuracyFeed`](super::feed::AccuracyFeed).

use skyfleet_shared::{tuning, RtkInfo, SurveyInStatus};

/// Point-in-time view of a survey-in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyInSnapshot {
    pub status: SurveyInStatus,
    /// Completed ticks since the survey-in started
    pub elapsed: u64,
    /// Latest accuracy estimate in meters
    pub accuracy_m: f64,
}

impl From<SurveyInSnapshot> for RtkInfo {
    fn from(snapshot: SurveyInSnapshot) -> Self {
        RtkInfo::new(snapshot.status, snapshot.elapsed, snapshot.accuracy_m)
    }
}

#[derive(Debug, Clone)]
pub struct SurveyInTracker {
    status: SurveyInStatus,
    elapsed: u64,
    accuracy_m: f64,
    threshold_m: f64,
}

impl Default for SurveyInTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyInTracker {
    /// Idle tracker using the standard convergence threshold
    pub fn new() -> Self {
        Self::with_threshold(tuning::SURVEY_IN_THRESHOLD_M)
    }

    pub fn with_threshold(threshold_m: f64) -> Self {
        Self {
            status: SurveyInStatus::SvinNone,
            elapsed: 0,
            accuracy_m: 0.0,
            threshold_m,
        }
    }

    /// Begin a survey-in from an unconverged estimate
    pub fn start(&mut self) {
        self.status = SurveyInStatus::SvinInProgress;
        self.elapsed = 0;
        self.accuracy_m = tuning::SURVEY_IN_SENTINEL_M;
    }

    /// Base runs on a known position, no survey-in needed
    pub fn mark_fixed(&mut self) {
        self.status = SurveyInStatus::SvinFixed;
        self.elapsed = 0;
        self.accuracy_m = 0.0;
    }

    /// Back to NONE
    pub fn reset(&mut self) {
        self.status = SurveyInStatus::SvinNone;
        self.elapsed = 0;
        self.accuracy_m = 0.0;
    }

    /// Record one tick with the latest accuracy estimate
    ///
    /// No-op unless a survey-in is in progress.
    pub fn tick(&mut self, accuracy_m: f64) -> SurveyInStatus {
        if self.status != SurveyInStatus::SvinInProgress {
            return self.status;
        }

        self.elapsed += 1;
        self.accuracy_m = accuracy_m;
        if accuracy_m <= self.threshold_m {
            self.status = SurveyInStatus::SvinReady;
        }
        self.status
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy_m
    }

    pub fn snapshot(&self) -> SurveyInSnapshot {
        SurveyInSnapshot {
            status: self.status,
            elapsed: self.elapsed,
            accuracy_m: self.accuracy_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtk::feed::SimulatedSurveyIn;

    #[test]
    fn test_start_uses_sentinel() {
        let mut tracker = SurveyInTracker::new();
        assert_eq!(tracker.snapshot().status, SurveyInStatus::SvinNone);

        tracker.start();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.status, SurveyInStatus::SvinInProgress);
        assert_eq!(snapshot.elapsed, 0);
        assert_eq!(snapshot.accuracy_m, 9999.0);
    }

    #[test]
    fn test_ready_on_first_crossing() {
        let mut tracker = SurveyInTracker::new();
        tracker.start();

        assert_eq!(tracker.tick(12.0), SurveyInStatus::SvinInProgress);
        assert_eq!(tracker.tick(1.01), SurveyInStatus::SvinInProgress);
        assert_eq!(tracker.tick(1.0), SurveyInStatus::SvinReady);
        assert_eq!(tracker.snapshot().elapsed, 3);
    }

    #[test]
    fn test_ticks_after_ready_are_noops() {
        let mut tracker = SurveyInTracker::new();
        tracker.start();
        tracker.tick(0.5);

        let before = tracker.snapshot();
        assert_eq!(tracker.tick(30.0), SurveyInStatus::SvinReady);
        assert_eq!(tracker.snapshot(), before);
    }

    #[test]
    fn test_idle_tracker_ignores_ticks() {
        let mut tracker = SurveyInTracker::new();
        assert_eq!(tracker.tick(0.1), SurveyInStatus::SvinNone);
        assert_eq!(tracker.snapshot().elapsed, 0);

        tracker.mark_fixed();
        assert_eq!(tracker.tick(0.1), SurveyInStatus::SvinFixed);
    }

    #[test]
    fn test_simulated_survey_converges() {
        for seed in 0..20 {
            let mut feed = SimulatedSurveyIn::seeded(seed);
            let mut tracker = SurveyInTracker::new();
            tracker.start();

            let mut ticks = 0;
            while tracker.snapshot().status != SurveyInStatus::SvinReady {
                let next = feed.next_accuracy(tracker.accuracy());
                tracker.tick(next);
                ticks += 1;
                assert!(ticks < 10_000, "seed {} did not converge", seed);
            }
            assert!(tracker.accuracy() <= 1.0);
            assert_eq!(tracker.snapshot().elapsed, ticks);
        }
    }

    #[test]
    fn test_reset_returns_to_none() {
        let mut tracker = SurveyInTracker::new();
        tracker.start();
        tracker.tick(4.0);
        tracker.reset();
        assert_eq!(tracker.snapshot().status, SurveyInStatus::SvinNone);
        assert_eq!(tracker.snapshot().elapsed, 0);
    }
}
