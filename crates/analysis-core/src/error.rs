use thiserror::Error;

/// Coarse grouping used by callers to decide how an error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing, short, or structurally invalid bar data. Recoverable.
    Data,
    /// An indicator could not be computed from otherwise valid bars.
    Computation,
    /// Threshold configuration rejected by explicit validation.
    Config,
    /// The bar source could not be reached or answered garbage.
    Transport,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No data found for {0}. Check ticker or internet connection.")]
    NoData(String),

    #[error("Insufficient data history for analysis: got {bars} bars, need at least {required}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Invalid threshold configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl AnalysisError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::NoData(_)
            | AnalysisError::InsufficientHistory { .. }
            | AnalysisError::InvalidData(_) => ErrorCategory::Data,
            AnalysisError::CalculationError(_) => ErrorCategory::Computation,
            AnalysisError::InvalidConfig(_) => ErrorCategory::Config,
            AnalysisError::Transport(_) => ErrorCategory::Transport,
        }
    }
}
