use analysis_core::{AnalysisResult, SignalStrength, StateColor};
use chrono::NaiveTime;
use crossterm::style::{Color, Stylize};
use serde_json::{json, Value};

/// Rows of indicator history included with JSON output for charting
pub const CHART_ROWS: usize = 100;

const LABEL_WIDTH: usize = 22;

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

fn signal_color(signal: SignalStrength) -> Color {
    match signal {
        SignalStrength::StrongBuy => rgb(0x22, 0xc5, 0x5e),
        SignalStrength::Buy => rgb(0x3b, 0x82, 0xf6),
        SignalStrength::Hold => rgb(0x94, 0xa3, 0xb8),
        SignalStrength::Sell => rgb(0xf4, 0x72, 0xb6),
        SignalStrength::StrongSell => rgb(0xef, 0x44, 0x44),
    }
}

fn state_color(tone: StateColor) -> Color {
    match tone {
        StateColor::Positive => rgb(0x4a, 0xde, 0x80),
        StateColor::Negative => rgb(0xf8, 0x71, 0x71),
        StateColor::Muted => rgb(0x94, 0xa3, 0xb8),
        StateColor::Plain => rgb(0xff, 0xff, 0xff),
    }
}

/// Text report: header, signal banner, score, and the technical matrix.
pub fn render_report(result: &AnalysisResult, signal: SignalStrength, color: bool) -> String {
    let mut out = String::new();

    let as_of_format = if result.interval.is_intraday() {
        "%Y-%m-%d %H:%M UTC"
    } else {
        "%Y-%m-%d"
    };
    out.push_str(&format!(
        "{} | {} | {} | close {:.2} | as of {}\n\n",
        result.symbol,
        result.interval,
        result.period,
        result.close,
        result.as_of.format(as_of_format)
    ));

    let banner = signal.to_label();
    if color {
        out.push_str(&banner.with(signal_color(signal)).bold().to_string());
    } else {
        out.push_str(banner);
    }
    out.push('\n');
    out.push_str(&format!("Total Score: {}\n\n", result.score));

    out.push_str(&format!("{:<width$} STATE\n", "INDICATOR", width = LABEL_WIDTH));
    for reading in &result.readings {
        let state = reading.state.text();
        let state = if color {
            state.with(state_color(reading.state.color())).to_string()
        } else {
            state
        };
        out.push_str(&format!("{:<width$} {}\n", reading.label(), state, width = LABEL_WIDTH));
    }

    out
}

/// One log-panel entry: a timestamped heading and the driver summary.
pub fn log_entry(result: &AnalysisResult, at: NaiveTime) -> String {
    format!(
        "[{}] {} Analysis\n{}",
        at.format("%H:%M:%S"),
        result.symbol,
        result.drivers_summary()
    )
}

/// Machine-readable report, including the trailing chart window.
pub fn json_report(result: &AnalysisResult, signal: SignalStrength) -> Value {
    let readings: Vec<Value> = result
        .readings
        .iter()
        .map(|r| {
            json!({
                "indicator": r.label(),
                "state": r.state.text(),
                "color": r.state.color().hex(),
                "points": r.points,
            })
        })
        .collect();

    json!({
        "symbol": result.symbol,
        "interval": result.interval,
        "period": result.period,
        "as_of": result.as_of,
        "close": result.close,
        "score": result.score,
        "signal": signal.to_label(),
        "signal_color": signal.color(),
        "thresholds": result.thresholds,
        "drivers": result.drivers,
        "readings": readings,
        "chart": result.frame.tail(CHART_ROWS),
    })
}
