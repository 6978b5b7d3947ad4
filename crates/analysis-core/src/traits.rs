use async_trait::async_trait;
use crate::{AnalysisError, AnalysisResult, Bar, BarSeries, Interval, Period, ThresholdConfig};

/// Anything that can hand back an ordered OHLCV series for a symbol.
///
/// Implementations return the raw bars as delivered; length and ordering
/// checks happen when the orchestrator wraps them in a [`BarSeries`].
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<Bar>, AnalysisError>;
}

/// Trait for technical analysis engines
pub trait TechnicalAnalyzer: Send + Sync {
    fn analyze(
        &self,
        series: &BarSeries,
        thresholds: &ThresholdConfig,
    ) -> Result<AnalysisResult, AnalysisError>;
}
