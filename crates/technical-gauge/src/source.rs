use analysis_core::{AnalysisError, Bar, BarSource, Interval, Period};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads bars from a JSON array on disk.
///
/// The file is re-read on every fetch, so a watch loop picks up edits. Period
/// and interval are not applied: the file is taken as the series to analyze.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BarSource for JsonFileSource {
    async fn fetch_bars(
        &self,
        symbol: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AnalysisError::Transport(format!("{}: {}", self.path.display(), e)))?;

        let bars: Vec<Bar> = serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::Transport(format!("{}: {}", self.path.display(), e)))?;

        if bars.is_empty() {
            return Err(AnalysisError::NoData(symbol.to_string()));
        }

        tracing::debug!(path = %self.path.display(), bars = bars.len(), "loaded bars from file");
        Ok(bars)
    }
}
