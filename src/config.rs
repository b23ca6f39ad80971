//! Logger configuration.
//!
//! The default configuration is the process logger: threshold `info`, JSON
//! lines, `logs/info.log` for `info` and above, `logs/error.log` for errors.
//! [`LoggerConfig::from_env`] loads `.env` and then applies these overrides:
//!
//! - `LOG_LEVEL`: logger threshold, also a floor for every sink's own level.
//! - `LOG_DIR`: directory holding `info.log` and `error.log`.
//! - `LOG_FORMAT`: `json` or `simple`.
//! - `LOG_CONSOLE`: also write records to stderr.
//! - `LOG_TIMESTAMP`: stamp records with the current time.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logger::{ConsoleTransport, FileTransport, Format, Level, LogError, Logger};

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const INFO_LOG_FILE: &str = "info.log";
pub const ERROR_LOG_FILE: &str = "error.log";

/// One file destination and its minimum severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

impl SinkConfig {
    pub fn new(path: impl Into<PathBuf>, level: Option<Level>) -> Self {
        Self {
            path: path.into(),
            level,
        }
    }
}

/// Everything needed to build a [`Logger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
    pub console: bool,
    pub sinks: Vec<SinkConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            timestamps: true,
            console: false,
            sinks: default_sinks(Path::new(DEFAULT_LOG_DIR)),
        }
    }
}

impl LoggerConfig {
    /// Loads `.env` if present, then reads the `LOG_*` variables.
    pub fn from_env() -> Result<Self, LogError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from the default, applying overrides returned by `lookup`.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value of a `LOG_*` variable, or `None` when unset.
    ///
    /// # Returns
    ///
    /// The resulting config, or an error naming the first invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("LOG_DIR") {
            config = config.in_dir(dir);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.level = level.parse()?;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.format = format.parse()?;
        }
        if let Some(console) = lookup("LOG_CONSOLE") {
            config.console = parse_flag("LOG_CONSOLE", &console)?;
        }
        if let Some(timestamps) = lookup("LOG_TIMESTAMP") {
            config.timestamps = parse_flag("LOG_TIMESTAMP", &timestamps)?;
        }

        Ok(config)
    }

    /// Replaces the sinks with `info.log` and `error.log` under `dir`.
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.sinks = default_sinks(dir.as_ref());
        self
    }

    /// Opens every sink and assembles the logger.
    ///
    /// The logger threshold is a floor: a sink whose own level is below it
    /// is raised to it, so `LOG_LEVEL=error` keeps `info` out of `info.log`.
    ///
    /// Building twice from the same config yields two loggers with the same
    /// transports, both appending to the same files.
    pub fn build(&self) -> Result<Logger, LogError> {
        if self.sinks.is_empty() && !self.console {
            return Err(LogError::InvalidConfig(
                "at least one sink or the console must be enabled".to_string(),
            ));
        }

        let mut builder = Logger::builder(self.level)
            .format(self.format)
            .timestamps(self.timestamps);

        for sink in &self.sinks {
            builder = builder.transport(FileTransport::open(&sink.path, self.sink_level(sink))?);
        }
        if self.console {
            builder = builder.transport(ConsoleTransport::stderr(None));
        }

        debug!(
            threshold = %self.level,
            format = %self.format,
            sinks = self.sinks.len(),
            console = self.console,
            "Logger configured"
        );
        Ok(builder.build())
    }

    /// Effective threshold of `sink`: its own level raised to the logger's.
    pub fn sink_level(&self, sink: &SinkConfig) -> Option<Level> {
        sink.level.map(|level| level.max(self.level))
    }
}

fn default_sinks(dir: &Path) -> Vec<SinkConfig> {
    vec![
        SinkConfig::new(dir.join(INFO_LOG_FILE), Some(Level::Info)),
        SinkConfig::new(dir.join(ERROR_LOG_FILE), Some(Level::Error)),
    ]
}

fn parse_flag(name: &str, value: &str) -> Result<bool, LogError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(LogError::InvalidConfig(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_is_two_file_sinks() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.format, Format::Json);
        assert_eq!(
            config.sinks,
            vec![
                SinkConfig::new("logs/info.log", Some(Level::Info)),
                SinkConfig::new("logs/error.log", Some(Level::Error)),
            ]
        );
    }

    #[test]
    fn env_overrides_apply() {
        let config = LoggerConfig::from_lookup(lookup_from(&[
            ("LOG_DIR", "/var/log/app"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "simple"),
            ("LOG_CONSOLE", "true"),
            ("LOG_TIMESTAMP", "0"),
        ]))
        .unwrap();

        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.format, Format::Simple);
        assert!(config.console);
        assert!(!config.timestamps);
        assert_eq!(config.sinks[0].path, Path::new("/var/log/app/info.log"));
        assert_eq!(config.sinks[1].path, Path::new("/var/log/app/error.log"));
    }

    #[test]
    fn unset_env_keeps_defaults() {
        let config = LoggerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        assert!(matches!(
            LoggerConfig::from_lookup(lookup_from(&[("LOG_LEVEL", "chatty")])),
            Err(LogError::UnknownLevel(_))
        ));
        assert!(matches!(
            LoggerConfig::from_lookup(lookup_from(&[("LOG_FORMAT", "xml")])),
            Err(LogError::UnknownFormat(_))
        ));
        assert!(matches!(
            LoggerConfig::from_lookup(lookup_from(&[("LOG_CONSOLE", "sometimes")])),
            Err(LogError::InvalidConfig(_))
        ));
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: LoggerConfig = serde_json::from_str(
            r#"{"level":"warn","sinks":[{"path":"audit.log"},{"path":"alerts.log","level":"error"}]}"#,
        )
        .unwrap();

        assert_eq!(config.level, Level::Warn);
        assert_eq!(config.format, Format::Json);
        assert!(config.timestamps);
        assert_eq!(config.sinks[0], SinkConfig::new("audit.log", None));
        assert_eq!(config.sinks[1].level, Some(Level::Error));
    }

    #[test]
    fn build_without_destinations_fails() {
        let config = LoggerConfig {
            sinks: Vec::new(),
            ..LoggerConfig::default()
        };
        assert!(matches!(config.build(), Err(LogError::InvalidConfig(_))));
    }

    #[test]
    fn log_level_raises_the_file_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let dir_name = dir.path().to_str().unwrap().to_string();
        let config = LoggerConfig::from_lookup(lookup_from(&[
            ("LOG_LEVEL", "error"),
            ("LOG_DIR", dir_name.as_str()),
        ]))
        .unwrap();

        let logger = config.build().unwrap();
        logger.info("request served");
        logger.warn("slow query");
        logger.error("database unreachable");

        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
        let info = read(INFO_LOG_FILE);
        assert_eq!(info.lines().count(), 1);
        assert!(info.contains("database unreachable"));
        assert_eq!(read(ERROR_LOG_FILE).lines().count(), 1);
        assert!(!logger.is_level_enabled(Level::Warn));
    }

    #[test]
    fn log_level_below_a_sink_keeps_the_sink_level() {
        let config = LoggerConfig::from_lookup(lookup_from(&[("LOG_LEVEL", "debug")])).unwrap();
        assert_eq!(config.sink_level(&config.sinks[0]), Some(Level::Info));
        assert_eq!(config.sink_level(&config.sinks[1]), Some(Level::Error));
        assert_eq!(config.sink_level(&SinkConfig::new("all.log", None)), None);
    }

    #[test]
    fn console_build_adds_a_stderr_transport() {
        let config = LoggerConfig::from_lookup(lookup_from(&[("LOG_CONSOLE", "yes")])).unwrap();
        let config = LoggerConfig {
            sinks: Vec::new(),
            ..config
        };

        let logger = config.build().unwrap();
        let names: Vec<_> = logger.transports().iter().map(|t| t.name()).collect();
        assert_eq!(names, ["console:stderr"]);
        assert_eq!(logger.transports()[0].level(), None);
        assert!(logger.is_level_enabled(Level::Info));
        assert!(!logger.is_level_enabled(Level::Debug));

        logger.info("written to stderr");
        assert_eq!(logger.failed_writes(), 0);
    }
}
