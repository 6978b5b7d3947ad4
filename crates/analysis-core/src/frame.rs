use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Indicator values for a single bar.
///
/// Every indicator field is optional: `None` means the value could not be
/// computed for this bar (warm-up, or a degenerate input), never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub ema20: Option<f64>,
    pub sma200: Option<f64>,
    pub adx: Option<f64>,
    pub dm_plus: Option<f64>,
    pub dm_minus: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub williams_r: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_upper: Option<f64>,
    pub obv: Option<f64>,
    pub parabolic_sar: Option<f64>,
}

impl IndicatorRow {
    /// A row carrying only price data, all indicators absent.
    pub fn bare(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            close,
            ema20: None,
            sma200: None,
            adx: None,
            dm_plus: None,
            dm_minus: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            stoch_k: None,
            stoch_d: None,
            williams_r: None,
            bb_lower: None,
            bb_upper: None,
            obv: None,
            parabolic_sar: None,
        }
    }
}

/// Indicator rows aligned index-for-index with the bars they came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn new(rows: Vec<IndicatorRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// The trailing `n` rows (or all of them when the frame is shorter).
    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    /// The trailing `n` values of one column.
    pub fn column_tail<F>(&self, n: usize, field: F) -> Vec<Option<f64>>
    where
        F: Fn(&IndicatorRow) -> Option<f64>,
    {
        self.tail(n).iter().map(field).collect()
    }
}
