use analysis_core::{AnalysisError, BarSource, Interval, Period, ThresholdConfig};
use analysis_orchestrator::RequestParams;
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::tty::IsTty;
use polygon_client::PolygonClient;
use std::path::PathBuf;
use std::sync::Arc;

use crate::source::JsonFileSource;

/// Symbols offered by `tickers`, in suggestion order
pub const POPULAR_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "AMD", "NFLX", "COIN",
    "BTC-USD", "ETH-USD", "SOL-USD", "SPY", "QQQ", "IWM", "TSM", "AVGO", "ORCL", "CRM",
    "INTC", "JPM", "V", "MA", "WMT", "DIS", "PYPL", "SQ", "MSTR", "PLTR",
];

#[derive(Parser)]
#[command(name = "technical-gauge", version, about = "Technical indicator gauge: score a symbol and print a trade signal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a single analysis and print the result
    Analyze(AnalyzeArgs),
    /// Re-run the analysis on a fixed cadence until Ctrl-C
    Watch {
        #[command(flatten)]
        analysis: AnalyzeArgs,
        /// Seconds between refreshes
        #[arg(long, default_value_t = 60)]
        refresh_secs: u64,
    },
    /// List popular symbols containing QUERY (case-insensitive)
    Tickers { query: Option<String> },
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Ticker symbol, e.g. NVDA or BTC-USD
    #[arg(short, long, default_value = "NVDA")]
    pub symbol: String,

    /// Bar interval: 1m 2m 5m 15m 30m 60m 90m 1h 1d 5d 1wk 1mo
    #[arg(short, long, default_value = "1d")]
    pub interval: Interval,

    /// History to fetch: 1d 5d 1mo 3mo 6mo 1y 2y 5y max
    #[arg(short, long, default_value = "1y")]
    pub period: Period,

    #[arg(long, default_value_t = 17, allow_negative_numbers = true)]
    pub strong_buy: i32,

    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub buy: i32,

    #[arg(long, default_value_t = -10, allow_negative_numbers = true)]
    pub sell: i32,

    #[arg(long, default_value_t = -17, allow_negative_numbers = true)]
    pub strong_sell: i32,

    /// Refuse thresholds not ordered strong_buy > buy > 0 > sell > strong_sell
    #[arg(long)]
    pub strict_thresholds: bool,

    /// Read bars from a JSON file instead of Polygon
    #[arg(long, value_name = "FILE")]
    pub bars_file: Option<PathBuf>,

    #[arg(long, env = "POLYGON_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print machine-readable JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Plain output even on a terminal
    #[arg(long)]
    pub no_color: bool,
}

impl AnalyzeArgs {
    pub fn thresholds(&self) -> Result<ThresholdConfig, AnalysisError> {
        let thresholds = ThresholdConfig::new(self.strong_buy, self.buy, self.sell, self.strong_sell);
        match thresholds.validate() {
            Err(e) if self.strict_thresholds => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "thresholds are misordered; signals will resolve asymmetrically");
                Ok(thresholds)
            }
            Ok(()) => Ok(thresholds),
        }
    }

    /// Selection for the orchestrator, with the period pulled back to what
    /// the interval supports.
    pub fn request_params(&self) -> RequestParams {
        let period = self.period.compatible_with(self.interval);
        if period != self.period {
            tracing::warn!(
                requested = %self.period,
                using = %period,
                interval = %self.interval,
                "period not available for this interval"
            );
        }
        RequestParams::new(self.symbol.clone(), period, self.interval)
    }

    pub fn bar_source(&self) -> Result<Arc<dyn BarSource>> {
        if let Some(path) = &self.bars_file {
            let source = JsonFileSource::new(path);
            tracing::info!(path = %source.path().display(), "using bar file");
            return Ok(Arc::new(source));
        }

        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Arc::new(PolygonClient::new(key.to_string()))),
            _ => bail!("POLYGON_API_KEY must be set (or pass --bars-file)"),
        }
    }

    pub fn use_color(&self) -> bool {
        !self.no_color
            && !self.json
            && std::env::var_os("NO_COLOR").is_none()
            && std::io::stdout().is_tty()
    }
}

/// Popular symbols containing `query`, ignoring case. An empty query lists all.
pub fn search_tickers(query: &str) -> Vec<&'static str> {
    let query = query.trim().to_uppercase();
    POPULAR_TICKERS
        .iter()
        .copied()
        .filter(|ticker| ticker.contains(query.as_str()))
        .collect()
}
