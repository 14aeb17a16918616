use std::time::Duration;

use thiserror::Error;

/// Failures reported by an upstream inventory source.
///
/// The cache never surfaces these to readers; a failed refresh is recorded
/// as an empty snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream returned malformed data: {0}")]
    Malformed(String),
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Whether retrying on the next stale read may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Caller-input errors raised by the query layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Query parameter '{0}' required")]
    MissingParameter(&'static str),
}

impl QueryError {
    pub fn missing(parameter: &'static str) -> Self {
        Self::MissingParameter(parameter)
    }
}
