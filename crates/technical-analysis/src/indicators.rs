use analysis_core::Bar;

// Every function here returns a compact, trailing-aligned series: the last
// value always belongs to the last input. Values that cannot be formed inside
// an otherwise valid window (a flat range, 0/0) come back as NaN; `align`
// turns both the missing warm-up prefix and those NaNs into `None`.

/// Left-pad a trailing-aligned series so it lines up with `len` inputs.
pub fn align(values: &[f64], len: usize) -> Vec<Option<f64>> {
    let skip = values.len().saturating_sub(len);
    let mut out = vec![None; len.saturating_sub(values.len())];
    out.extend(values[skip..].iter().map(|v| v.is_finite().then_some(*v)));
    out
}

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, seeded with the SMA of the first `period` values
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len() - period + 1);
    let mut prev = data[..period].iter().sum::<f64>() / period as f64;
    result.push(prev);

    for &price in &data[period..] {
        prev = (price - prev) * multiplier + prev;
        result.push(prev);
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return f64::NAN;
        }
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Relative Strength Index (Wilder smoothing). First value lands on input `period`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut rsi_values = Vec::with_capacity(data.len() - period);
    rsi_values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if fast_period == 0 || signal_period == 0 || slow_period < fast_period {
        return MacdResult { macd_line: vec![], signal_line: vec![] };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let offset = slow_period - fast_period;
    let mut macd_line = Vec::with_capacity(ema_slow.len());

    for i in offset..ema_fast.len() {
        macd_line.push(ema_fast[i] - ema_slow[i - offset]);
    }

    let signal_line = ema(&macd_line, signal_period);

    MacdResult {
        macd_line,
        signal_line,
    }
}

/// Bollinger Bands
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    if period == 0 || data.len() < period {
        return BollingerBands { upper: vec![], middle: vec![], lower: vec![] };
    }

    let middle = sma(data, period);
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for i in period - 1..data.len() {
        let slice = &data[i + 1 - period..=i];
        let mean = middle[i + 1 - period];
        let variance: f64 = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();

        upper.push(mean + std_dev * std);
        lower.push(mean - std_dev * std);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// Position of `value` inside the [lowest, highest] range, 0..=100.
/// A zero-width range yields NaN.
fn range_position(value: f64, lowest: f64, highest: f64) -> f64 {
    if highest == lowest {
        f64::NAN
    } else {
        100.0 * (value - lowest) / (highest - lowest)
    }
}

/// Stochastic RSI: %K and %D of the stochastic oscillator applied to RSI
pub struct StochRsiResult {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stoch_rsi(
    data: &[f64],
    rsi_period: usize,
    stoch_period: usize,
    k_smooth: usize,
    d_smooth: usize,
) -> StochRsiResult {
    let rsi_values = rsi(data, rsi_period);
    if stoch_period == 0 || rsi_values.len() < stoch_period {
        return StochRsiResult { k: vec![], d: vec![] };
    }

    let mut raw = Vec::with_capacity(rsi_values.len() - stoch_period + 1);
    for i in stoch_period - 1..rsi_values.len() {
        let window = &rsi_values[i + 1 - stoch_period..=i];
        let highest = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = window.iter().copied().fold(f64::INFINITY, f64::min);
        raw.push(range_position(rsi_values[i], lowest, highest));
    }

    let k = sma(&raw, k_smooth);
    let d = sma(&k, d_smooth);

    StochRsiResult { k, d }
}

/// Williams %R, in -100..=0
pub fn williams_r(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period {
        return vec![];
    }

    let mut values = Vec::with_capacity(bars.len() - period + 1);
    for i in period - 1..bars.len() {
        let slice = &bars[i + 1 - period..=i];
        let highest = slice.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = slice.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        values.push(range_position(bars[i].close, lowest, highest) - 100.0);
    }

    values
}

/// On-Balance Volume
pub fn obv(bars: &[Bar]) -> Vec<f64> {
    if bars.is_empty() {
        return vec![];
    }

    let mut obv_values = Vec::with_capacity(bars.len());
    obv_values.push(bars[0].volume);

    for i in 1..bars.len() {
        let prev_obv = obv_values[i - 1];
        let new_obv = if bars[i].close > bars[i - 1].close {
            prev_obv + bars[i].volume
        } else if bars[i].close < bars[i - 1].close {
            prev_obv - bars[i].volume
        } else {
            prev_obv
        };
        obv_values.push(new_obv);
    }

    obv_values
}

/// Average Directional Index (ADX) with its directional indicators.
///
/// `plus_di`/`minus_di` start on input `period`; `adx` starts on input
/// `2 * period - 1`.
pub struct AdxResult {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

pub fn adx(bars: &[Bar], period: usize) -> AdxResult {
    if period == 0 || bars.len() < period + 1 {
        return AdxResult { adx: vec![], plus_di: vec![], minus_di: vec![] };
    }

    // +DM, -DM and TR; entry j describes the move into bar j + 1
    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);
    let mut true_range = Vec::with_capacity(bars.len() - 1);

    for i in 1..bars.len() {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });

        let hl = bars[i].high - bars[i].low;
        let hc = (bars[i].high - bars[i - 1].close).abs();
        let lc = (bars[i].low - bars[i - 1].close).abs();
        true_range.push(hl.max(hc).max(lc));
    }

    // Wilder running sums, seeded with the first `period` moves
    let mut smoothed_plus_dm = plus_dm[..period].iter().sum::<f64>();
    let mut smoothed_minus_dm = minus_dm[..period].iter().sum::<f64>();
    let mut smoothed_tr = true_range[..period].iter().sum::<f64>();

    let mut plus_di_values = Vec::with_capacity(bars.len() - period);
    let mut minus_di_values = Vec::with_capacity(bars.len() - period);
    let mut dx_values = Vec::with_capacity(bars.len() - period);

    for i in period - 1..plus_dm.len() {
        if i >= period {
            smoothed_plus_dm = smoothed_plus_dm - smoothed_plus_dm / period as f64 + plus_dm[i];
            smoothed_minus_dm = smoothed_minus_dm - smoothed_minus_dm / period as f64 + minus_dm[i];
            smoothed_tr = smoothed_tr - smoothed_tr / period as f64 + true_range[i];
        }

        let (pdi, mdi) = if smoothed_tr > 0.0 {
            (100.0 * smoothed_plus_dm / smoothed_tr, 100.0 * smoothed_minus_dm / smoothed_tr)
        } else {
            (f64::NAN, f64::NAN)
        };

        plus_di_values.push(pdi);
        minus_di_values.push(mdi);

        let di_sum = pdi + mdi;
        let dx = if di_sum > 0.0 { 100.0 * (pdi - mdi).abs() / di_sum } else { 0.0 };
        dx_values.push(dx);
    }

    if dx_values.len() < period {
        return AdxResult { adx: vec![], plus_di: plus_di_values, minus_di: minus_di_values };
    }

    let mut adx_values = Vec::with_capacity(dx_values.len() - period + 1);
    let mut adx_val = dx_values[..period].iter().sum::<f64>() / period as f64;
    adx_values.push(adx_val);

    for &dx in &dx_values[period..] {
        adx_val = (adx_val * (period - 1) as f64 + dx) / period as f64;
        adx_values.push(adx_val);
    }

    AdxResult {
        adx: adx_values,
        plus_di: plus_di_values,
        minus_di: minus_di_values,
    }
}

/// Parabolic SAR split by side. Exactly one side is finite from input 1 on;
/// input 0 has neither.
pub struct ParabolicSar {
    pub long: Vec<f64>,
    pub short: Vec<f64>,
}

impl ParabolicSar {
    /// The active side at every index: long where defined, short otherwise.
    pub fn combined(&self) -> Vec<f64> {
        self.long
            .iter()
            .zip(&self.short)
            .map(|(&long, &short)| if long.is_finite() { long } else { short })
            .collect()
    }
}

pub fn parabolic_sar(bars: &[Bar], af_start: f64, af_step: f64, af_max: f64) -> ParabolicSar {
    let n = bars.len();
    let mut long = vec![f64::NAN; n];
    let mut short = vec![f64::NAN; n];
    if n < 2 {
        return ParabolicSar { long, short };
    }

    // Initial direction from the first directional move
    let up_move = bars[1].high - bars[0].high;
    let down_move = bars[0].low - bars[1].low;
    let mut falling = down_move > up_move && down_move > 0.0;

    let mut sar = if falling { bars[0].high } else { bars[0].low };
    let mut extreme = if falling { bars[0].low } else { bars[0].high };
    let mut af = af_start;

    for i in 1..n {
        let high = bars[i].high;
        let low = bars[i].low;
        let prior = &bars[i.saturating_sub(2)..i];
        let mut next = sar + af * (extreme - sar);

        let reverse = if falling {
            let reverse = high > next;
            if low < extreme {
                extreme = low;
                af = (af + af_step).min(af_max);
            }
            next = prior.iter().map(|b| b.high).fold(next, f64::max);
            reverse
        } else {
            let reverse = low < next;
            if high > extreme {
                extreme = high;
                af = (af + af_step).min(af_max);
            }
            next = prior.iter().map(|b| b.low).fold(next, f64::min);
            reverse
        };

        if reverse {
            next = extreme;
            af = af_start;
            falling = !falling;
            extreme = if falling { low } else { high };
        }

        sar = next;
        if falling {
            short[i] = sar;
        } else {
            long[i] = sar;
        }
    }

    ParabolicSar { long, short }
}
