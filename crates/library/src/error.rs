//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only run-level failures are errors. Per-add-on lookup failures are
//! [`FetchOutcome`](crate::fetch::FetchOutcome)s, and cancellation is an
//! [`Event`](crate::Event), not an error.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manifest could not be loaded; fix the file and try again.
    #[display("unable to load add-on manifest")]
    Manifest,
    /// The installation directory could not be read.
    #[display("unable to read installed add-ons")]
    Snapshot,
    /// A link could not be built for the requested add-on.
    #[display("unable to build link for: {_0}")]
    Link(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration errors are surfaced once, never retried.
        false
    }
}
