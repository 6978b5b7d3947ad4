use analysis_core::{Bar, BarSeries, IndicatorFrame, IndicatorRow};

use crate::indicators::*;

pub const EMA_PERIOD: usize = 20;
pub const SMA_PERIOD: usize = 200;
pub const ADX_PERIOD: usize = 14;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const STOCH_RSI_PERIOD: usize = 14;
pub const STOCH_RSI_K: usize = 3;
pub const STOCH_RSI_D: usize = 3;
pub const WILLIAMS_PERIOD: usize = 14;
pub const BB_PERIOD: usize = 20;
pub const BB_STD_DEV: f64 = 2.0;
pub const SAR_AF_START: f64 = 0.02;
pub const SAR_AF_STEP: f64 = 0.02;
pub const SAR_AF_MAX: f64 = 0.2;

type Column = Vec<Option<f64>>;

struct TrendColumns {
    ema20: Column,
    sma200: Column,
    adx: Column,
    dm_plus: Column,
    dm_minus: Column,
    macd: Column,
    macd_signal: Column,
}

struct OscillatorColumns {
    rsi: Column,
    stoch_k: Column,
    stoch_d: Column,
    williams_r: Column,
}

struct VolatilityColumns {
    bb_lower: Column,
    bb_upper: Column,
    obv: Column,
    parabolic_sar: Column,
}

fn finite_close(close: &f64) -> bool {
    close.is_finite()
}

/// Inputs read by ADX, Williams %R and Parabolic SAR.
fn finite_range(bar: &Bar) -> bool {
    bar.high.is_finite() && bar.low.is_finite() && bar.close.is_finite()
}

fn finite_flow(bar: &Bar) -> bool {
    bar.close.is_finite() && bar.volume.is_finite()
}

/// Run `indicator` over every maximal run of usable inputs and lay its
/// outputs back onto the full timeline.
///
/// An unusable input yields `None` at its own row, and the next run warms up
/// from scratch, so a bad value only costs the rows whose lookback reaches it.
fn segmented<T, const N: usize>(
    inputs: &[T],
    usable: impl Fn(&T) -> bool,
    indicator: impl Fn(&[T]) -> [Vec<f64>; N],
) -> [Column; N] {
    let mut columns: [Column; N] = std::array::from_fn(|_| Vec::with_capacity(inputs.len()));
    let mut start = 0;

    while start < inputs.len() {
        if !usable(&inputs[start]) {
            columns.iter_mut().for_each(|column| column.push(None));
            start += 1;
            continue;
        }

        let end = inputs[start..]
            .iter()
            .position(|v| !usable(v))
            .map_or(inputs.len(), |offset| start + offset);
        let run = &inputs[start..end];
        for (column, values) in columns.iter_mut().zip(indicator(run)) {
            column.extend(align(&values, run.len()));
        }
        start = end;
    }

    columns
}

fn trend_columns(bars: &[Bar], closes: &[f64]) -> TrendColumns {
    let [ema20, sma200, macd_line, macd_signal] = segmented(closes, finite_close, |run| {
        let macd_result = macd(run, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        [
            ema(run, EMA_PERIOD),
            sma(run, SMA_PERIOD),
            macd_result.macd_line,
            macd_result.signal_line,
        ]
    });
    let [adx, dm_plus, dm_minus] = segmented(bars, finite_range, |run| {
        let adx_result = adx(run, ADX_PERIOD);
        [adx_result.adx, adx_result.plus_di, adx_result.minus_di]
    });

    TrendColumns {
        ema20,
        sma200,
        adx,
        dm_plus,
        dm_minus,
        macd: macd_line,
        macd_signal,
    }
}

fn oscillator_columns(bars: &[Bar], closes: &[f64]) -> OscillatorColumns {
    let [rsi, stoch_k, stoch_d] = segmented(closes, finite_close, |run| {
        let stoch = stoch_rsi(run, RSI_PERIOD, STOCH_RSI_PERIOD, STOCH_RSI_K, STOCH_RSI_D);
        [rsi(run, RSI_PERIOD), stoch.k, stoch.d]
    });
    let [williams_r] = segmented(bars, finite_range, |run| [williams_r(run, WILLIAMS_PERIOD)]);

    OscillatorColumns {
        rsi,
        stoch_k,
        stoch_d,
        williams_r,
    }
}

fn volatility_columns(bars: &[Bar], closes: &[f64]) -> VolatilityColumns {
    let [bb_lower, bb_upper] = segmented(closes, finite_close, |run| {
        let bands = bollinger_bands(run, BB_PERIOD, BB_STD_DEV);
        [bands.lower, bands.upper]
    });
    let [obv] = segmented(bars, finite_flow, |run| [obv(run)]);
    let [parabolic_sar] = segmented(bars, finite_range, |run| {
        [parabolic_sar(run, SAR_AF_START, SAR_AF_STEP, SAR_AF_MAX).combined()]
    });

    VolatilityColumns {
        bb_lower,
        bb_upper,
        obv,
        parabolic_sar,
    }
}

/// Compute the full indicator frame for a series.
///
/// Indicator families are independent, so they are computed in parallel and
/// then zipped into one row per bar. Non-finite inputs leave only the affected
/// rows of the indicators that read them absent; the frame itself always has
/// one row per bar.
pub fn build_frame(series: &BarSeries) -> IndicatorFrame {
    let bars = series.bars();
    let closes = series.closes();

    let unusable = bars
        .iter()
        .filter(|b| ![b.open, b.high, b.low, b.close, b.volume].iter().all(|v| v.is_finite()))
        .count();
    if unusable > 0 {
        tracing::warn!(symbol = %series.symbol(), unusable, "non-finite bars, affected indicator rows left empty");
    }

    let (trend, (oscillators, volatility)) = rayon::join(
        || trend_columns(bars, &closes),
        || {
            rayon::join(
                || oscillator_columns(bars, &closes),
                || volatility_columns(bars, &closes),
            )
        },
    );

    let rows = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            timestamp: bar.timestamp,
            close: bar.close,
            ema20: trend.ema20[i],
            sma200: trend.sma200[i],
            adx: trend.adx[i],
            dm_plus: trend.dm_plus[i],
            dm_minus: trend.dm_minus[i],
            rsi: oscillators.rsi[i],
            macd: trend.macd[i],
            macd_signal: trend.macd_signal[i],
            stoch_k: oscillators.stoch_k[i],
            stoch_d: oscillators.stoch_d[i],
            williams_r: oscillators.williams_r[i],
            bb_lower: volatility.bb_lower[i],
            bb_upper: volatility.bb_upper[i],
            obv: volatility.obv[i],
            parabolic_sar: volatility.parabolic_sar[i],
        })
        .collect();

    IndicatorFrame::new(rows)
}
