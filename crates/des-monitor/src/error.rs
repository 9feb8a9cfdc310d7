//! Error types for des-monitor.

use thiserror::Error;

/// Errors that can occur when writing recorded statistics.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Alias for `Result<T, MonitorError>`.
pub type MonitorResult<T> = Result<T, MonitorError>;
