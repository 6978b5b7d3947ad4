use analysis_core::{IndicatorFrame, IndicatorKind, IndicatorReading, IndicatorRow, IndicatorState};

/// OBV values needed for the slope of its 5-period average over two points
pub const OBV_WINDOW: usize = 6;
const OBV_MA_PERIOD: usize = 5;

const ADX_STRONG: f64 = 25.0;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const STOCH_OVERSOLD: f64 = 20.0;
const STOCH_OVERBOUGHT: f64 = 80.0;

// Substitutes for absent fields. These only ever select a state; they are
// not readings in their own right.
const RSI_FALLBACK: f64 = 50.0;
const STOCH_FALLBACK: f64 = 50.0;
const WILLIAMS_FALLBACK: f64 = -50.0;
const MACD_FALLBACK: f64 = 0.0;
const DM_FALLBACK: f64 = 0.0;

/// Price above the 20 EMA is bullish.
pub fn classify_trend(close: f64, ema20: Option<f64>) -> IndicatorReading {
    if close > ema20.unwrap_or(close) {
        IndicatorReading::new(IndicatorKind::Trend, IndicatorState::Bullish, 10)
    } else {
        IndicatorReading::new(IndicatorKind::Trend, IndicatorState::Bearish, -10)
    }
}

/// ADX above 25 marks a strong trend; the directional lines pick its side.
pub fn classify_trend_strength(
    adx: Option<f64>,
    dm_plus: Option<f64>,
    dm_minus: Option<f64>,
) -> IndicatorReading {
    match adx {
        Some(value) if value > ADX_STRONG => {
            let points = if dm_plus.unwrap_or(DM_FALLBACK) > dm_minus.unwrap_or(DM_FALLBACK) {
                5
            } else {
                -5
            };
            IndicatorReading::new(IndicatorKind::TrendStrength, IndicatorState::Strong, points)
        }
        _ => IndicatorReading::new(IndicatorKind::TrendStrength, IndicatorState::Weak, 0),
    }
}

pub fn classify_rsi(rsi: Option<f64>) -> IndicatorReading {
    let value = rsi.unwrap_or(RSI_FALLBACK);
    if value < RSI_OVERSOLD {
        IndicatorReading::new(IndicatorKind::Momentum, IndicatorState::Oversold, 15)
            .with_driver(format!("RSI Oversold ({:.1})", value))
    } else if value > RSI_OVERBOUGHT {
        IndicatorReading::new(IndicatorKind::Momentum, IndicatorState::Overbought, -15)
            .with_driver(format!("RSI Overbought ({:.1})", value))
    } else {
        IndicatorReading::new(IndicatorKind::Momentum, IndicatorState::Neutral, 0)
    }
}

pub fn classify_macd(macd: Option<f64>, signal: Option<f64>) -> IndicatorReading {
    if macd.unwrap_or(MACD_FALLBACK) > signal.unwrap_or(MACD_FALLBACK) {
        IndicatorReading::new(IndicatorKind::Macd, IndicatorState::Bullish, 5)
    } else {
        IndicatorReading::new(IndicatorKind::Macd, IndicatorState::Bearish, -5)
    }
}

/// A close outside the bands is a mean-reversion signal.
pub fn classify_bollinger(close: f64, lower: Option<f64>, upper: Option<f64>) -> IndicatorReading {
    if close < lower.unwrap_or(close) {
        IndicatorReading::new(IndicatorKind::Volatility, IndicatorState::LowBreak, 10)
            .with_driver("Price below Lower Band")
    } else if close > upper.unwrap_or(close) {
        IndicatorReading::new(IndicatorKind::Volatility, IndicatorState::HighBreak, -10)
            .with_driver("Price above Upper Band")
    } else {
        IndicatorReading::new(IndicatorKind::Volatility, IndicatorState::Inside, 0)
    }
}

pub fn classify_stoch_rsi(stoch_k: Option<f64>) -> IndicatorReading {
    let value = stoch_k.unwrap_or(STOCH_FALLBACK);
    if value < STOCH_OVERSOLD {
        IndicatorReading::new(IndicatorKind::StochRsi, IndicatorState::Oversold, 5)
    } else if value > STOCH_OVERBOUGHT {
        IndicatorReading::new(IndicatorKind::StochRsi, IndicatorState::Overbought, -5)
    } else {
        IndicatorReading::new(IndicatorKind::StochRsi, IndicatorState::Neutral, 0)
    }
}

pub fn classify_williams_r(williams_r: Option<f64>) -> IndicatorReading {
    IndicatorReading::new(
        IndicatorKind::WilliamsR,
        IndicatorState::Value(williams_r.unwrap_or(WILLIAMS_FALLBACK)),
        0,
    )
}

fn mean(values: &[Option<f64>]) -> Option<f64> {
    let sum = values.iter().copied().sum::<Option<f64>>()?;
    Some(sum / values.len() as f64)
}

/// Direction of the OBV 5-period average between its last two points.
///
/// Returns `None` when the window carries no OBV at all. A slope that cannot
/// be formed counts as non-positive.
pub fn classify_obv(window: &[Option<f64>]) -> Option<IndicatorReading> {
    if window.iter().all(Option::is_none) {
        return None;
    }

    let slope = if window.len() > OBV_MA_PERIOD {
        let n = window.len();
        let current = mean(&window[n - OBV_MA_PERIOD..]);
        let previous = mean(&window[n - OBV_MA_PERIOD - 1..n - 1]);
        current.zip(previous).map(|(c, p)| c - p)
    } else {
        None
    };

    let state = match slope {
        Some(s) if s > 0.0 => IndicatorState::Accumulation,
        _ => IndicatorState::Distribution,
    };
    Some(IndicatorReading::new(IndicatorKind::Volume, state, 0))
}

pub fn classify_parabolic_sar(close: f64, sar: Option<f64>) -> Option<IndicatorReading> {
    let sar = sar?;
    let state = if close > sar {
        IndicatorState::Bullish
    } else {
        IndicatorState::Bearish
    };
    Some(IndicatorReading::new(IndicatorKind::ParabolicSar, state, 0))
}

/// Classify the latest row, in display order.
///
/// `obv_window` is the trailing OBV column ending at `row` (see [`OBV_WINDOW`]).
pub fn classify_row(row: &IndicatorRow, obv_window: &[Option<f64>]) -> Vec<IndicatorReading> {
    let close = row.close;
    let mut readings = vec![
        classify_trend(close, row.ema20),
        classify_trend_strength(row.adx, row.dm_plus, row.dm_minus),
        classify_rsi(row.rsi),
        classify_macd(row.macd, row.macd_signal),
        classify_stoch_rsi(row.stoch_k),
        classify_williams_r(row.williams_r),
        classify_bollinger(close, row.bb_lower, row.bb_upper),
    ];
    readings.extend(classify_obv(obv_window));
    readings.extend(classify_parabolic_sar(close, row.parabolic_sar));
    readings
}

/// Classify the last row of a frame. Empty frames yield no readings.
pub fn classify_latest(frame: &IndicatorFrame) -> Vec<IndicatorReading> {
    match frame.latest() {
        Some(row) => classify_row(row, &frame.column_tail(OBV_WINDOW, |r| r.obv)),
        None => Vec::new(),
    }
}
