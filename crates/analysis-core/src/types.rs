use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, IndicatorFrame, Interval, Period};

/// Shortest series the scoring pipeline will accept
pub const MIN_BARS: usize = 20;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A validated, chronologically ordered run of bars for one symbol.
///
/// Construction is the only place the structural rules are checked: a
/// `BarSeries` that exists has at least [`MIN_BARS`] bars with strictly
/// increasing timestamps. The bars cannot be modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    symbol: String,
    interval: Interval,
    period: Period,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        period: Period,
        bars: Vec<Bar>,
    ) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(AnalysisError::NoData(symbol));
        }
        if bars.len() < MIN_BARS {
            return Err(AnalysisError::InsufficientHistory {
                bars: bars.len(),
                required: MIN_BARS,
            });
        }
        if let Some(pos) = bars.windows(2).position(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(AnalysisError::InvalidData(format!(
                "timestamps not strictly increasing at bar {} ({} after {})",
                pos + 1,
                bars[pos + 1].timestamp,
                bars[pos].timestamp
            )));
        }

        Ok(Self { symbol, interval, period, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// Final discrete recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStrength {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalStrength {
    /// Resolve a composite score against the thresholds.
    ///
    /// Rules are checked in a fixed order and the first match wins: strong
    /// buy, buy, strong sell, sell, then hold. The buy side is evaluated
    /// before the sell side, so overlapping thresholds resolve toward buying.
    pub fn from_score(score: i32, thresholds: &ThresholdConfig) -> Self {
        if score >= thresholds.strong_buy {
            SignalStrength::StrongBuy
        } else if score >= thresholds.buy {
            SignalStrength::Buy
        } else if score <= thresholds.strong_sell {
            SignalStrength::StrongSell
        } else if score <= thresholds.sell {
            SignalStrength::Sell
        } else {
            SignalStrength::Hold
        }
    }

    /// Human-readable label for the signal
    pub fn to_label(&self) -> &'static str {
        match self {
            SignalStrength::StrongBuy => "STRONG BUY",
            SignalStrength::Buy => "BUY",
            SignalStrength::Hold => "HOLD",
            SignalStrength::Sell => "SELL",
            SignalStrength::StrongSell => "STRONG SELL",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SignalStrength::StrongBuy => "#22c55e",
            SignalStrength::Buy => "#3b82f6",
            SignalStrength::Hold => "#94a3b8",
            SignalStrength::Sell => "#f472b6",
            SignalStrength::StrongSell => "#ef4444",
        }
    }
}

/// User-tunable score boundaries for the signal resolver.
///
/// The intended ordering is `strong_buy > buy > 0 > sell > strong_sell`, but
/// nothing forces it; see [`ThresholdConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub strong_buy: i32,
    pub buy: i32,
    pub sell: i32,
    pub strong_sell: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            strong_buy: 17,
            buy: 10,
            sell: -10,
            strong_sell: -17,
        }
    }
}

impl ThresholdConfig {
    pub fn new(strong_buy: i32, buy: i32, sell: i32, strong_sell: i32) -> Self {
        Self { strong_buy, buy, sell, strong_sell }
    }

    /// Check the intended ordering. The resolver never calls this; a
    /// misordered config still resolves, just asymmetrically.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let ordered = self.strong_buy > self.buy
            && self.buy > 0
            && 0 > self.sell
            && self.sell > self.strong_sell;
        if ordered {
            Ok(())
        } else {
            Err(AnalysisError::InvalidConfig(format!(
                "expected strong_buy > buy > 0 > sell > strong_sell, got {} / {} / {} / {}",
                self.strong_buy, self.buy, self.sell, self.strong_sell
            )))
        }
    }
}

/// Indicators shown in the technical matrix, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorKind {
    Trend,
    TrendStrength,
    Momentum,
    Macd,
    StochRsi,
    WilliamsR,
    Volatility,
    Volume,
    ParabolicSar,
}

impl IndicatorKind {
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Trend => "Trend (EMA/SMA)",
            IndicatorKind::TrendStrength => "Trend Strength (ADX)",
            IndicatorKind::Momentum => "Momentum (RSI)",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::StochRsi => "Stoch RSI",
            IndicatorKind::WilliamsR => "Williams %R",
            IndicatorKind::Volatility => "Volatility (BB)",
            IndicatorKind::Volume => "Volume (OBV)",
            IndicatorKind::ParabolicSar => "Parabolic SAR",
        }
    }
}

/// Display tone of a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateColor {
    Positive,
    Negative,
    Muted,
    Plain,
}

impl StateColor {
    pub fn hex(&self) -> &'static str {
        match self {
            StateColor::Positive => "#4ade80",
            StateColor::Negative => "#f87171",
            StateColor::Muted => "#94a3b8",
            StateColor::Plain => "#ffffff",
        }
    }
}

/// Categorical state of one indicator on the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IndicatorState {
    Bullish,
    Bearish,
    Strong,
    Weak,
    Oversold,
    Overbought,
    Neutral,
    LowBreak,
    HighBreak,
    Inside,
    Accumulation,
    Distribution,
    /// Display-only numeric reading
    Value(f64),
}

impl IndicatorState {
    pub fn text(&self) -> String {
        match self {
            IndicatorState::Bullish => "BULLISH".to_string(),
            IndicatorState::Bearish => "BEARISH".to_string(),
            IndicatorState::Strong => "STRONG".to_string(),
            IndicatorState::Weak => "WEAK".to_string(),
            IndicatorState::Oversold => "OVERSOLD".to_string(),
            IndicatorState::Overbought => "OVERBOUGHT".to_string(),
            IndicatorState::Neutral => "NEUTRAL".to_string(),
            IndicatorState::LowBreak => "LOW BREAK".to_string(),
            IndicatorState::HighBreak => "HIGH BREAK".to_string(),
            IndicatorState::Inside => "INSIDE".to_string(),
            IndicatorState::Accumulation => "ACCUMULATION".to_string(),
            IndicatorState::Distribution => "DISTRIBUTION".to_string(),
            IndicatorState::Value(v) => format!("{:.1}", v),
        }
    }

    pub fn color(&self) -> StateColor {
        match self {
            IndicatorState::Bullish
            | IndicatorState::Oversold
            | IndicatorState::LowBreak
            | IndicatorState::Accumulation => StateColor::Positive,
            IndicatorState::Bearish
            | IndicatorState::Overbought
            | IndicatorState::HighBreak
            | IndicatorState::Distribution => StateColor::Negative,
            IndicatorState::Neutral | IndicatorState::Inside => StateColor::Muted,
            IndicatorState::Strong | IndicatorState::Weak | IndicatorState::Value(_) => {
                StateColor::Plain
            }
        }
    }
}

/// One classified indicator: its state, score contribution, and optional driver text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub kind: IndicatorKind,
    pub state: IndicatorState,
    pub points: i32,
    pub driver: Option<String>,
}

impl IndicatorReading {
    pub fn new(kind: IndicatorKind, state: IndicatorState, points: i32) -> Self {
        Self { kind, state, points, driver: None }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Outcome of one scoring pass over a bar series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub interval: Interval,
    pub period: Period,
    /// Timestamp of the bar the states were read from
    pub as_of: DateTime<Utc>,
    pub close: f64,
    pub score: i32,
    pub readings: Vec<IndicatorReading>,
    pub drivers: Vec<String>,
    pub signal: SignalStrength,
    pub thresholds: ThresholdConfig,
    pub frame: IndicatorFrame,
}

impl AnalysisResult {
    /// Resolve this result's score against different thresholds.
    pub fn resignal(&self, thresholds: &ThresholdConfig) -> SignalStrength {
        SignalStrength::from_score(self.score, thresholds)
    }

    /// Multi-line driver summary for a log panel.
    pub fn drivers_summary(&self) -> String {
        if self.drivers.is_empty() {
            "Market following primary trend. No extremes detected.".to_string()
        } else {
            let lines: Vec<String> = self.drivers.iter().map(|d| format!("- {}", d)).collect();
            format!("Key Drivers:\n{}", lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bars(n: usize) -> Vec<Bar> {
        let start = Utc::now() - Duration::days(n as i64);
        (0..n)
            .map(|i| Bar {
                timestamp: start + Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1_000.0,
            })
            .collect()
    }

    #[test]
    fn test_series_rejects_empty() {
        let err = BarSeries::new("AAPL", Interval::Day1, Period::Year1, vec![]).unwrap_err();
        assert_eq!(err, AnalysisError::NoData("AAPL".to_string()));
    }

    #[test]
    fn test_series_minimum_length_boundary() {
        let err = BarSeries::new("AAPL", Interval::Day1, Period::Year1, bars(19)).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientHistory { bars: 19, required: 20 });

        let series = BarSeries::new("AAPL", Interval::Day1, Period::Year1, bars(20)).unwrap();
        assert_eq!(series.len(), 20);
    }

    #[test]
    fn test_series_rejects_non_monotonic() {
        let mut b = bars(25);
        b[10].timestamp = b[9].timestamp;
        let err = BarSeries::new("AAPL", Interval::Day1, Period::Year1, b).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidData(_)));
    }

    #[test]
    fn test_signal_priority_with_defaults() {
        let t = ThresholdConfig::default();
        assert_eq!(SignalStrength::from_score(40, &t), SignalStrength::StrongBuy);
        assert_eq!(SignalStrength::from_score(17, &t), SignalStrength::StrongBuy);
        assert_eq!(SignalStrength::from_score(16, &t), SignalStrength::Buy);
        assert_eq!(SignalStrength::from_score(10, &t), SignalStrength::Buy);
        assert_eq!(SignalStrength::from_score(9, &t), SignalStrength::Hold);
        assert_eq!(SignalStrength::from_score(0, &t), SignalStrength::Hold);
        assert_eq!(SignalStrength::from_score(-10, &t), SignalStrength::Sell);
        assert_eq!(SignalStrength::from_score(-17, &t), SignalStrength::StrongSell);
        assert_eq!(SignalStrength::from_score(-18, &t), SignalStrength::StrongSell);
    }

    #[test]
    fn test_signal_overlapping_thresholds_favor_buy() {
        // sell above buy: every score in the overlap resolves as a buy
        let t = ThresholdConfig::new(30, -5, 5, -30);
        assert_eq!(SignalStrength::from_score(0, &t), SignalStrength::Buy);
        assert_eq!(SignalStrength::from_score(-5, &t), SignalStrength::Buy);
        assert_eq!(SignalStrength::from_score(-6, &t), SignalStrength::Sell);
        assert_eq!(SignalStrength::from_score(-30, &t), SignalStrength::StrongSell);
    }

    #[test]
    fn test_signal_buy_above_strong_buy() {
        let t = ThresholdConfig::new(10, 20, -10, -17);
        assert_eq!(SignalStrength::from_score(15, &t), SignalStrength::StrongBuy);
        assert_eq!(SignalStrength::from_score(25, &t), SignalStrength::StrongBuy);
    }

    #[test]
    fn test_signal_every_score_resolves() {
        let configs = [
            ThresholdConfig::default(),
            ThresholdConfig::new(0, 0, 0, 0),
            ThresholdConfig::new(-5, 5, 10, -10),
        ];
        for t in &configs {
            for score in -80..=80 {
                let expected = if score >= t.strong_buy {
                    SignalStrength::StrongBuy
                } else if score >= t.buy {
                    SignalStrength::Buy
                } else if score <= t.strong_sell {
                    SignalStrength::StrongSell
                } else if score <= t.sell {
                    SignalStrength::Sell
                } else {
                    SignalStrength::Hold
                };
                assert_eq!(SignalStrength::from_score(score, t), expected);
            }
        }
    }

    #[test]
    fn test_threshold_validation() {
        assert!(ThresholdConfig::default().validate().is_ok());
        let err = ThresholdConfig::new(10, 20, -10, -17).validate().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
        assert!(ThresholdConfig::new(17, 10, 5, -17).validate().is_err());
    }

    #[test]
    fn test_state_text_and_color() {
        assert_eq!(IndicatorState::LowBreak.text(), "LOW BREAK");
        assert_eq!(IndicatorState::Value(-50.0).text(), "-50.0");
        assert_eq!(IndicatorState::Value(-12.345).text(), "-12.3");
        assert_eq!(IndicatorState::Oversold.color().hex(), "#4ade80");
        assert_eq!(IndicatorState::HighBreak.color(), StateColor::Negative);
        assert_eq!(IndicatorState::Inside.color(), StateColor::Muted);
        assert_eq!(IndicatorState::Strong.color(), StateColor::Plain);
    }

    #[test]
    fn test_drivers_summary() {
        let mut result = AnalysisResult {
            symbol: "NVDA".to_string(),
            interval: Interval::Day1,
            period: Period::Year1,
            as_of: Utc::now(),
            close: 100.0,
            score: 0,
            readings: vec![],
            drivers: vec![],
            signal: SignalStrength::Hold,
            thresholds: ThresholdConfig::default(),
            frame: IndicatorFrame::default(),
        };
        assert_eq!(
            result.drivers_summary(),
            "Market following primary trend. No extremes detected."
        );

        result.drivers = vec!["RSI Oversold (25.0)".to_string(), "Price below Lower Band".to_string()];
        assert_eq!(
            result.drivers_summary(),
            "Key Drivers:\n- RSI Oversold (25.0)\n- Price below Lower Band"
        );
    }

    #[test]
    fn test_resignal_uses_new_thresholds() {
        let result = AnalysisResult {
            symbol: "SPY".to_string(),
            interval: Interval::Day1,
            period: Period::Year1,
            as_of: Utc::now(),
            close: 100.0,
            score: 12,
            readings: vec![],
            drivers: vec![],
            signal: SignalStrength::Buy,
            thresholds: ThresholdConfig::default(),
            frame: IndicatorFrame::default(),
        };
        assert_eq!(result.resignal(&ThresholdConfig::new(12, 5, -5, -12)), SignalStrength::StrongBuy);
        assert_eq!(result.resignal(&ThresholdConfig::new(30, 20, -10, -30)), SignalStrength::Hold);
    }
}
