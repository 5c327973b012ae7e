//! Error types shared by the NAV source, catalog and analytics layers.

use std::time::Duration;
use thiserror::Error;

/// Failure to obtain data from an external source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Shape errors are permanent; everything else may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Malformed(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Expected outcomes when a series cannot support a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("not enough NAV observations")]
    InsufficientData,
    #[error("start NAV is zero or missing")]
    DivisionGuard,
}
