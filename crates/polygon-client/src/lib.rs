use analysis_core::{AnalysisError, Bar, BarSource, Interval, Period};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://api.polygon.io";
const MAX_RESULTS: &str = "50000";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }
            let Some(&oldest) = ts.front() else {
                continue;
            };

            // Wait until the oldest request falls out of the window
            let sleep_dur = (oldest + self.window).saturating_duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Bar source backed by Polygon.io aggregates
#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        // Default 500 req/min for Starter plan. Free tier users should set POLYGON_RATE_LIMIT=5.
        let rate_limit: usize = std::env::var("POLYGON_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::Transport(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::Transport("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::Transport(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 15u64;
            tracing::warn!("Polygon 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(AnalysisError::Transport("Rate limited by Polygon after 3 retries".to_string()))
    }

    /// Get aggregates (bars) for a Polygon ticker, oldest first
    pub async fn get_aggregates(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            BASE_URL,
            ticker,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", MAX_RESULTS),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::Transport(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let agg_response: AggregateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        agg_response.into_bars()
    }
}

#[async_trait]
impl BarSource for PolygonClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let (multiplier, timespan) = timespan_for(interval);
        let to = Utc::now();
        let from = range_start(period, to);
        let ticker = polygon_ticker(symbol);

        tracing::debug!(%ticker, %period, %interval, "fetching aggregates");
        let bars = self.get_aggregates(&ticker, multiplier, timespan, from, to).await?;

        if bars.is_empty() {
            return Err(AnalysisError::NoData(symbol.to_string()));
        }
        Ok(bars)
    }
}

/// Polygon's (multiplier, timespan) pair for a bar interval
pub fn timespan_for(interval: Interval) -> (u32, &'static str) {
    match interval {
        Interval::Minute1 => (1, "minute"),
        Interval::Minute2 => (2, "minute"),
        Interval::Minute5 => (5, "minute"),
        Interval::Minute15 => (15, "minute"),
        Interval::Minute30 => (30, "minute"),
        Interval::Minute60 => (60, "minute"),
        Interval::Minute90 => (90, "minute"),
        Interval::Hour1 => (1, "hour"),
        Interval::Day1 => (1, "day"),
        Interval::Day5 => (5, "day"),
        Interval::Week1 => (1, "week"),
        Interval::Month1 => (1, "month"),
    }
}

/// First day covered by `period`, counting back from `to`.
pub fn range_start(period: Period, to: DateTime<Utc>) -> DateTime<Utc> {
    match period.lookback() {
        Some(lookback) => to - lookback,
        None => Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single().unwrap_or(to),
    }
}

/// Map a display symbol to a Polygon ticker. `BTC-USD` style pairs are crypto.
pub fn polygon_ticker(symbol: &str) -> String {
    match symbol.split_once('-') {
        Some((base, "USD")) if !base.is_empty() => format!("X:{}USD", base),
        _ => symbol.to_string(),
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp
    o: f64, // open
    h: f64, // high
    l: f64, // low
    c: f64, // close
    v: f64, // volume
}

impl AggregateResponse {
    fn into_bars(self) -> Result<Vec<Bar>, AnalysisError> {
        self.results
            .into_iter()
            .map(|r| {
                let timestamp = DateTime::from_timestamp_millis(r.t).ok_or_else(|| {
                    AnalysisError::InvalidData(format!("aggregate timestamp out of range: {}", r.t))
                })?;
                Ok(Bar {
                    timestamp,
                    open: r.o,
                    high: r.h,
                    low: r.l,
                    close: r.c,
                    volume: r.v,
                })
            })
            .collect()
    }
}
