use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

use crate::logger::LogError;

/// Severity of a log record.
///
/// Levels follow the npm ladder, from most to least urgent:
/// `error`, `warn`, `info`, `http`, `verbose`, `debug`, `silly`.
///
/// The derived ordering puts more urgent levels higher, so a transport with
/// threshold `T` accepts a record at level `L` exactly when `L >= T`.
///
/// # Example
///
/// ```
/// use sinklog::logger::Level;
///
/// assert!(Level::Error > Level::Info);
/// assert!(Level::Error.passes(Level::Info));
/// assert!(!Level::Debug.passes(Level::Info));
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Silly,
    Debug,
    Verbose,
    Http,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    /// All levels, most urgent first.
    pub const ALL: [Level; 7] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Http,
        Level::Verbose,
        Level::Debug,
        Level::Silly,
    ];

    /// Lowercase name as written to log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Http => "http",
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Silly => "silly",
        }
    }

    /// Returns `true` if a record at this level clears `threshold`.
    pub fn passes(self, threshold: Level) -> bool {
        self >= threshold
    }

    /// The closest `tracing` filter that lets every record at this level through.
    pub fn as_level_filter(&self) -> LevelFilter {
        match self {
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Http | Level::Verbose | Level::Debug => LevelFilter::DEBUG,
            Level::Silly => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "http" => Ok(Level::Http),
            "verbose" => Ok(Level::Verbose),
            "debug" => Ok(Level::Debug),
            "silly" | "trace" => Ok(Level::Silly),
            _ => Err(LogError::UnknownLevel(s.to_string())),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Silly,
        }
    }
}
