use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{AnalysisOrchestrator, OrchestratorEvent, Trigger};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Handle to a running auto-refresh timer. Dropping it stops the timer.
///
/// Stopping only prevents future cycles. A cycle already running finishes
/// and still publishes its result.
pub struct AutoRefresh {
    timer: JoinHandle<()>,
    countdown: JoinHandle<()>,
    every: Duration,
}

impl AutoRefresh {
    pub fn every(&self) -> Duration {
        self.every
    }

    /// Cancel the timer and countdown. A cycle already running finishes.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.timer.abort();
        self.countdown.abort();
        tracing::info!(every_secs = self.every.as_secs(), "auto-refresh stopped");
    }
}

impl AnalysisOrchestrator {
    /// Start refreshing on a fixed cadence. The first cycle fires immediately.
    ///
    /// Each tick runs its cycle as a separate task, so the cadence does not
    /// depend on how long (or whether) a cycle succeeds. A tick that lands
    /// while a fetch is in flight is reported as busy and skipped.
    pub fn start_auto_refresh(self: &Arc<Self>, every: Duration) -> AutoRefresh {
        let every = every.max(COUNTDOWN_TICK);
        let period_secs = every.as_secs() as i64;
        let remaining = Arc::new(AtomicI64::new(period_secs));

        let timer = {
            let orchestrator = Arc::clone(self);
            let remaining = Arc::clone(&remaining);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    remaining.store(period_secs, Ordering::Relaxed);

                    let cycle = Arc::clone(&orchestrator);
                    tokio::spawn(async move {
                        // failures are already logged and on the event stream
                        let _ = cycle.run_cycle(Trigger::AutoRefresh).await;
                    });
                }
            })
        };

        let countdown = {
            let orchestrator = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let mut left = remaining.fetch_sub(1, Ordering::Relaxed) - 1;
                    if left < 0 {
                        remaining.store(period_secs, Ordering::Relaxed);
                        left = period_secs;
                    }
                    orchestrator.emit(OrchestratorEvent::Countdown { remaining_secs: left as u64 });
                }
            })
        };

        tracing::info!(every_secs = period_secs, "auto-refresh started");
        AutoRefresh { timer, countdown, every }
    }
}
