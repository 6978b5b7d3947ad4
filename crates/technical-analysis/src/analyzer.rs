use analysis_core::{
    AnalysisError, AnalysisResult, BarSeries, SignalStrength, TechnicalAnalyzer, ThresholdConfig,
    MIN_BARS,
};

use crate::classifier::classify_latest;
use crate::indicator_set::build_frame;
use crate::scoring::aggregate;

/// Bars -> indicator frame -> latest-bar states -> score -> signal.
///
/// Stateless: the same series and thresholds always produce the same result.
pub struct TechnicalAnalysisEngine;

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_series(
        &self,
        series: &BarSeries,
        thresholds: &ThresholdConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        let frame = build_frame(series);
        let latest = frame.latest().cloned().ok_or(AnalysisError::InsufficientHistory {
            bars: series.len(),
            required: MIN_BARS,
        })?;

        let readings = classify_latest(&frame);
        let card = aggregate(&readings);
        let signal = SignalStrength::from_score(card.score, thresholds);

        tracing::debug!(
            symbol = series.symbol(),
            bars = series.len(),
            score = card.score,
            signal = signal.to_label(),
            "scored latest bar"
        );

        Ok(AnalysisResult {
            symbol: series.symbol().to_string(),
            interval: series.interval(),
            period: series.period(),
            as_of: latest.timestamp,
            close: latest.close,
            score: card.score,
            readings,
            drivers: card.drivers,
            signal,
            thresholds: *thresholds,
            frame,
        })
    }
}

impl TechnicalAnalyzer for TechnicalAnalysisEngine {
    fn analyze(
        &self,
        series: &BarSeries,
        thresholds: &ThresholdConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_series(series, thresholds)
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
