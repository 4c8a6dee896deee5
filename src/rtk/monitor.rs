//! Survey-in Monitor
//!
//! Runs the periodic tick task that feeds the survey-in tracker. At most one
//! task exists per monitor; it ends itself once the tracker reports READY and
//! is aborted on stop, restart or drop.

use super::feed::AccuracyFeed;
use super::tracker::{SurveyInSnapshot, SurveyInTracker};
use skyfleet_shared::SurveyInStatus;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shortest tick period; `interval_at` rejects a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct SurveyInMonitor {
    tracker: Arc<RwLock<SurveyInTracker>>,
    feed: Arc<Mutex<Box<dyn AccuracyFeed>>>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl SurveyInMonitor {
    pub fn new(feed: Box<dyn AccuracyFeed>, period: Duration) -> Self {
        if period < MIN_PERIOD {
            warn!("[SVIN] Tick period {:?} too short, using {:?}", period, MIN_PERIOD);
        }
        Self {
            tracker: Arc::new(RwLock::new(SurveyInTracker::new())),
            feed: Arc::new(Mutex::new(feed)),
            period: period.max(MIN_PERIOD),
            task: None,
        }
    }

    /// Start (or restart) a survey-in
    pub async fn start(&mut self) {
        self.cancel_task().await;
        self.tracker.write().await.start();
        info!("[SVIN] Survey-in started (tick every {:?})", self.period);

        let tracker = self.tracker.clone();
        let feed = self.feed.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            survey_loop(tracker, feed, period).await;
        }));
    }

    /// Base station uses a fixed position; no ticking
    pub async fn mark_fixed(&mut self) {
        self.cancel_task().await;
        self.tracker.write().await.mark_fixed();
        info!("[SVIN] Fixed base position, survey-in skipped");
    }

    /// Tear down the survey-in, status back to NONE
    pub async fn stop(&mut self) {
        if self.is_running() {
            info!("[SVIN] Survey-in stopped before convergence");
        }
        self.cancel_task().await;
        self.tracker.write().await.reset();
    }

    pub async fn snapshot(&self) -> SurveyInSnapshot {
        self.tracker.read().await.snapshot()
    }

    /// A tick task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    async fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Wait until the task is really gone so no stale tick lands
            let _ = task.await;
        }
    }
}

impl Drop for SurveyInMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn survey_loop(
    tracker: Arc<RwLock<SurveyInTracker>>,
    feed: Arc<Mutex<Box<dyn AccuracyFeed>>>,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let previous = tracker.read().await.accuracy();
        let sample = feed.lock().await.sample(previous).await;

        let accuracy = match sample {
            Ok(accuracy) => accuracy,
            Err(e) => {
                warn!("[SVIN] Accuracy read failed, skipping tick: {}", e);
                continue;
            }
        };

        let mut guard = tracker.write().await;
        match guard.tick(accuracy) {
            SurveyInStatus::SvinInProgress => {
                debug!("[SVIN] accuracy={:.2}m elapsed={}", accuracy, guard.snapshot().elapsed);
            }
            SurveyInStatus::SvinReady => {
                info!(
                    "[SVIN] Converged to {:.2}m after {} ticks",
                    accuracy,
                    guard.snapshot().elapsed
                );
                break;
            }
            other => {
                debug!("[SVIN] Tracker left survey-in ({:?}), stopping", other);
                break;
            }
        }
    }
}
