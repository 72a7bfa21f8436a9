use crate::error::{Error, ErrorKind};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Log verbosity, as accepted by `--log` and the `log_level` setting.
///
/// Parsing is case-insensitive. `CRITICAL` is accepted for compatibility and
/// behaves like `ERROR`.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    #[display("OFF")]
    Off,
    #[display("CRITICAL")]
    Critical,
    #[display("ERROR")]
    Error,
    #[display("WARNING")]
    Warning,
    #[default]
    #[display("INFO")]
    Info,
    #[display("DEBUG")]
    Debug,
    #[display("TRACE")]
    Trace,
}
impl LogLevel {
    pub fn as_filter(&self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::OFF,
            Self::Critical | Self::Error => LevelFilter::ERROR,
            Self::Warning => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}
impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "critical" => Self::Critical,
            "error" => Self::Error,
            "warn" | "warning" => Self::Warning,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => exn::bail!(ErrorKind::UnknownLogLevel(s.to_string())),
        })
    }
}
impl TryFrom<String> for LogLevel {
    type Error = ErrorKind;

    fn try_from(value: String) -> Result<Self, ErrorKind> {
        value.parse().map_err(|_| ErrorKind::UnknownLogLevel(value))
    }
}
impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}
