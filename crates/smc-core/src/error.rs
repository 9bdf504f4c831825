//! Error types for the backtester.

use thiserror::Error;

/// Top-level backtester error.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    /// A money or quantity calculation exceeded the decimal range.
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

impl BacktestError {
    /// Whether the failure was caused by the caller's input rather than the system.
    ///
    /// Client errors are reported back as-is; anything else is logged and
    /// surfaced with a generic message.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BacktestError::Config(_)
                | BacktestError::Data(_)
                | BacktestError::Strategy(_)
                | BacktestError::Overflow(_)
        )
    }
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),

    #[error("Signal count mismatch: expected {expected}, got {actual}")]
    SignalCountMismatch { expected: usize, actual: usize },
}

/// Bar data errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available")]
    NoDataAvailable,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("Bar at index {index} is not after its predecessor")]
    OutOfOrder { index: usize },

    #[error("Duplicate timestamp at index {index}")]
    DuplicateTimestamp { index: usize },

    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Data source error: {0}")]
    Internal(String),
}

/// Result type alias for backtest operations.
pub type BacktestResult<T> = Result<T, BacktestError>;
