//! Remote Lookup Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A remote lookup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote lookup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote page (or the timestamp on it) does not exist.
    #[display("no last-updated timestamp found for: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The remote did not answer within the configured time.
    #[display("timed out")]
    Timeout,
    /// Connection failures, unexpected HTTP statuses, broken bodies.
    #[display("transport error: {_0}")]
    Transport(#[error(not(source))] String),
    /// The identifier cannot be turned into a URL.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
}
impl From<reqwest::Error> for ErrorKind {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        Self::Transport(err.to_string())
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::NotFound("details".to_string()), false)]
    #[case(ErrorKind::Timeout, true)]
    #[case(ErrorKind::Transport("connection refused".to_string()), true)]
    #[case(ErrorKind::InvalidUrl("a b".to_string()), false)]
    fn test_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
