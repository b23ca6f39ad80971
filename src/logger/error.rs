use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::rolling::InitError;

/// A single transport that could not take a line.
#[derive(Debug)]
pub struct TransportFailure {
    pub transport: String,
    pub source: io::Error,
}

/// Errors raised while configuring a logger or delivering records.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),

    #[error("unknown log format '{0}'")]
    UnknownFormat(String),

    #[error("invalid logger configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to open log file '{}'", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: InitError,
    },

    #[error("failed to serialize log record")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to deliver record to {}", describe(.failures))]
    Delivery { failures: Vec<TransportFailure> },

    #[error("failed to flush transport '{transport}'")]
    Flush {
        transport: String,
        #[source]
        source: io::Error,
    },
}

fn describe(failures: &[TransportFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("'{}' ({})", failure.transport, failure.source))
        .collect::<Vec<_>>()
        .join(", ")
}
