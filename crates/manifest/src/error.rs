//! Manifest Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A manifest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for manifest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant is a configuration error: the manifest has to be fixed (or
/// pointed at) before a run can start.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manifest file could not be opened or read.
    #[display("manifest unreadable: {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// The header row lacks one of the required columns.
    #[display("manifest is missing required column: {_0}")]
    MissingColumn(#[error(not(source))] &'static str),
    /// A row could not be parsed.
    #[display("malformed manifest row {_0}")]
    MalformedRow(#[error(not(source))] u64),
    /// A required value is empty.
    #[display("empty {field} on manifest row {row}")]
    EmptyValue {
        /// Column name.
        field: &'static str,
        /// 1-based data row (header excluded).
        row: u64,
    },
    /// The remote identifier cannot be appended to the base URL.
    #[display("invalid remote identifier on manifest row {row}: {value}")]
    InvalidRemoteId {
        /// 1-based data row (header excluded).
        row: u64,
        /// The offending identifier.
        value: String,
    },
    /// The same folder is listed twice; folders are the join key.
    #[display("duplicate folder in manifest: {_0}")]
    DuplicateFolder(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
