//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// All of them are fatal to the run and need the user to change something.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A config file passed explicitly doesn't exist.
    #[display("config file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    /// A config source couldn't be parsed or has a value of the wrong type.
    #[display("invalid configuration: {_0}")]
    Parse(#[error(not(source))] String),
    /// A value parsed, but is out of range.
    #[display("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// Not a known verbosity level.
    #[display("unknown log level: {_0}")]
    UnknownLogLevel(#[error(not(source))] String),
    /// The installation directory doesn't exist (or isn't a directory).
    #[display("AddOns folder not found: {}; pass --install-dir to choose another", _0.display())]
    InstallDir(#[error(not(source))] PathBuf),
    /// No installation directory is configured, persisted or discoverable.
    #[display("could not find the AddOns folder; pass --install-dir to select it")]
    InstallDirUnknown,
    /// The persisted installation directory file can't be read or written.
    #[display("unable to access install file: {}", _0.display())]
    InstallFile(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InstallFile(_))
    }
}
