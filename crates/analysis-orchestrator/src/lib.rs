use analysis_core::{
    AnalysisError, AnalysisResult, BarSeries, BarSource, Interval, Period, SignalStrength,
    TechnicalAnalyzer, ThresholdConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use technical_analysis::TechnicalAnalysisEngine;
use tokio::sync::{broadcast, watch};

pub mod auto_refresh;
pub use auto_refresh::{AutoRefresh, DEFAULT_REFRESH_INTERVAL};

const EVENT_CAPACITY: usize = 256;

/// What to analyze, as currently selected by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
}

impl RequestParams {
    pub fn new(symbol: impl Into<String>, period: Period, interval: Interval) -> Self {
        Self { symbol: symbol.into(), period, interval }
    }
}

impl Default for RequestParams {
    fn default() -> Self {
        Self::new("NVDA", Period::Year1, Interval::Day1)
    }
}

/// What started a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    AutoRefresh,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::AutoRefresh => "auto-refresh",
        }
    }
}

/// Passive notifications for a log or status area
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    Started { symbol: String, trigger: Trigger },
    Published { trigger: Trigger, result: Arc<AnalysisResult> },
    Failed { symbol: String, trigger: Trigger, error: AnalysisError },
    /// A cycle was requested while another fetch was still outstanding
    Busy { trigger: Trigger },
    /// Seconds until the next auto-refresh
    Countdown { remaining_secs: u64 },
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Published(Arc<AnalysisResult>),
    /// Dropped because a fetch was already in flight
    Busy,
    /// No symbol selected; nothing was fetched
    Idle,
}

/// Clears the in-flight flag however the cycle ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Symbols are matched case-insensitively and ignore surrounding whitespace.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Drives fetch -> analyze -> publish cycles for one selection at a time.
///
/// Request parameters and thresholds are only ever read. The latest result is
/// replaced wholesale after a successful cycle; a failed cycle leaves it as it
/// was. At most one fetch is outstanding at any moment.
pub struct AnalysisOrchestrator {
    source: Arc<dyn BarSource>,
    engine: TechnicalAnalysisEngine,
    params: watch::Receiver<RequestParams>,
    thresholds: watch::Receiver<ThresholdConfig>,
    in_flight: AtomicBool,
    latest: watch::Sender<Option<Arc<AnalysisResult>>>,
    events: broadcast::Sender<OrchestratorEvent>,
}

impl AnalysisOrchestrator {
    pub fn new(
        source: Arc<dyn BarSource>,
        params: watch::Receiver<RequestParams>,
        thresholds: watch::Receiver<ThresholdConfig>,
    ) -> Arc<Self> {
        let (latest, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Arc::new(Self {
            source,
            engine: TechnicalAnalysisEngine::new(),
            params,
            thresholds,
            in_flight: AtomicBool::new(false),
            latest,
            events,
        })
    }

    /// Subscribe to cycle and countdown events.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    /// Watch the published result slot.
    pub fn subscribe_results(&self) -> watch::Receiver<Option<Arc<AnalysisResult>>> {
        self.latest.subscribe()
    }

    /// The most recently published result, if any cycle has succeeded.
    pub fn latest(&self) -> Option<Arc<AnalysisResult>> {
        self.latest.borrow().clone()
    }

    /// The latest score resolved against the thresholds as they are now.
    pub fn current_signal(&self) -> Option<SignalStrength> {
        let thresholds = *self.thresholds.borrow();
        self.latest.borrow().as_ref().map(|result| result.resignal(&thresholds))
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn emit(&self, event: OrchestratorEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Run one full cycle for the current selection.
    ///
    /// Errors are returned to the caller and also reported on the event
    /// stream; the previously published result is kept in either case.
    pub async fn run_cycle(&self, trigger: Trigger) -> Result<CycleOutcome, AnalysisError> {
        let params = self.params.borrow().clone();
        let thresholds = *self.thresholds.borrow();

        let symbol = normalize_symbol(&params.symbol);
        if symbol.is_empty() {
            tracing::debug!(trigger = trigger.as_str(), "no symbol selected, skipping cycle");
            return Ok(CycleOutcome::Idle);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!(%symbol, trigger = trigger.as_str(), "fetch already in flight, dropping request");
            self.emit(OrchestratorEvent::Busy { trigger });
            return Ok(CycleOutcome::Busy);
        };

        let period = params.period;
        tracing::info!(%symbol, %period, interval = %params.interval, trigger = trigger.as_str(), "starting analysis cycle");
        self.emit(OrchestratorEvent::Started { symbol: symbol.clone(), trigger });

        match self.compute(&symbol, period, params.interval, &thresholds).await {
            Ok(result) => {
                let result = Arc::new(result);
                self.latest.send_replace(Some(Arc::clone(&result)));
                tracing::info!(
                    %symbol,
                    score = result.score,
                    signal = result.signal.to_label(),
                    "published analysis"
                );
                self.emit(OrchestratorEvent::Published { trigger, result: Arc::clone(&result) });
                Ok(CycleOutcome::Published(result))
            }
            Err(error) => {
                tracing::warn!(%symbol, trigger = trigger.as_str(), error = %error, "analysis cycle failed");
                self.emit(OrchestratorEvent::Failed {
                    symbol,
                    trigger,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn compute(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
        thresholds: &ThresholdConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        let bars = self.source.fetch_bars(symbol, period, interval).await?;
        let series = BarSeries::new(symbol, interval, period, bars)?;
        self.engine.analyze(&series, thresholds)
    }
}
