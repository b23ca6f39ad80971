//! Structured JSON-lines logging with severity-filtered file sinks.
//!
//! The default configuration writes every record at `info` and above to
//! `logs/info.log` and every `error` record to `logs/error.log`:
//!
//! ```no_run
//! use sinklog::config::LoggerConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let logger = LoggerConfig::default().build()?;
//! sinklog::logging::init_logging(&logger)?;
//!
//! logger.info("ready");
//! tracing::error!(attempt = 3, "upstream timed out");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logger;
pub mod logging;
