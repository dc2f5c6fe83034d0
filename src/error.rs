//! Error types for chokepoint.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Injected overload rejection. The only error the work handler ever
    /// returns; clients classify it as retryable.
    #[error("resource exhausted: {0}")]
    Exhausted(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a client-side retry policy should retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Exhausted(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
