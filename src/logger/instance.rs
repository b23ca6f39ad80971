use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::logger::error::TransportFailure;
use crate::logger::{Fields, Format, Level, LogError, Record, Transport};

/// A structured logger fanning records out to severity-filtered transports.
///
/// A `Logger` is built once at startup and then cloned or borrowed by every
/// component that emits records. Clones are cheap and share the same
/// transports, so concurrent callers append to the same files.
///
/// # Filtering
///
/// Each transport has an optional threshold. A record reaches a transport
/// when its level is at or above that threshold, or at or above the
/// logger's own threshold when the transport has none.
///
/// # Failures
///
/// The `log*` family and the per-level shorthands never fail at the call
/// site: a line a transport cannot take is dropped and counted in
/// [`failed_writes`](Self::failed_writes), and the first failure of each
/// transport is reported once on stderr. Use [`try_log`](Self::try_log) to
/// observe delivery errors directly.
///
/// # Example
///
/// ```no_run
/// use sinklog::logger::{FileTransport, Format, Level, Logger};
///
/// let logger = Logger::builder(Level::Info)
///     .format(Format::Json)
///     .transport(FileTransport::open("logs/info.log", Some(Level::Info)).unwrap())
///     .transport(FileTransport::open("logs/error.log", Some(Level::Error)).unwrap())
///     .build();
///
/// logger.info("service started");
/// logger.error("upstream unavailable");
/// ```
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    defaults: Fields,
}

struct Shared {
    level: Level,
    format: Format,
    timestamps: bool,
    transports: Vec<Box<dyn Transport>>,
    failed_writes: AtomicU64,
    reported: Mutex<HashSet<String>>,
}

impl Logger {
    /// Starts building a logger with the given threshold.
    pub fn builder(level: Level) -> LoggerBuilder {
        LoggerBuilder::new(level)
    }

    /// Returns a logger sharing this logger's transports whose records always
    /// carry `fields`. Fields set on an individual record take precedence.
    pub fn child(&self, fields: Fields) -> Self {
        let mut defaults = self.defaults.clone();
        defaults.extend(fields);
        Self {
            shared: Arc::clone(&self.shared),
            defaults,
        }
    }

    pub fn level(&self) -> Level {
        self.shared.level
    }

    pub fn format(&self) -> Format {
        self.shared.format
    }

    pub fn transports(&self) -> &[Box<dyn Transport>] {
        &self.shared.transports
    }

    /// Default fields attached by [`child`](Self::child).
    pub fn default_fields(&self) -> &Fields {
        &self.defaults
    }

    /// Returns `true` if at least one transport would accept a record at `level`.
    pub fn is_level_enabled(&self, level: Level) -> bool {
        self.shared
            .transports
            .iter()
            .any(|t| self.accepts(t.as_ref(), level))
    }

    /// Number of lines dropped because a transport failed to write them.
    pub fn failed_writes(&self) -> u64 {
        self.shared.failed_writes.load(Ordering::Relaxed)
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.log_record(Record::new(level, message));
    }

    pub fn log_with(&self, level: Level, message: impl Into<String>, fields: Fields) {
        self.log_record(Record::new(level, message).with_fields(fields));
    }

    /// Emits `record`, dropping it on any transport that fails.
    pub fn log_record(&self, record: Record) {
        match self.try_log(record) {
            Ok(_) => {}
            Err(LogError::Delivery { failures }) => {
                for failure in failures {
                    self.report_once(&failure.transport, &failure.source);
                }
            }
            Err(err) => {
                self.shared.failed_writes.fetch_add(1, Ordering::Relaxed);
                self.report_once("format", &err);
            }
        }
    }

    /// Emits `record` and reports delivery.
    ///
    /// # Returns
    ///
    /// The number of transports that received the line (zero when the
    /// record is below every threshold), or [`LogError::Delivery`] naming
    /// each transport that failed. Transports that did not fail still
    /// receive the line.
    pub fn try_log(&self, mut record: Record) -> Result<usize, LogError> {
        let level = record.level();
        let targets: Vec<_> = self
            .shared
            .transports
            .iter()
            .filter(|t| self.accepts(t.as_ref(), level))
            .collect();
        if targets.is_empty() {
            return Ok(0);
        }

        record.merge_defaults(&self.defaults);
        if self.shared.timestamps {
            record.stamp_if_missing();
        }
        let line = self.shared.format.render(&record)?;

        let mut failures = Vec::new();
        for transport in &targets {
            if let Err(source) = transport.write_line(&line) {
                self.shared.failed_writes.fetch_add(1, Ordering::Relaxed);
                failures.push(TransportFailure {
                    transport: transport.name().to_string(),
                    source,
                });
            }
        }

        if failures.is_empty() {
            Ok(targets.len())
        } else {
            Err(LogError::Delivery { failures })
        }
    }

    /// Flushes every transport, stopping at the first failure.
    pub fn flush(&self) -> Result<(), LogError> {
        for transport in &self.shared.transports {
            transport.flush().map_err(|source| LogError::Flush {
                transport: transport.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn http(&self, message: impl Into<String>) {
        self.log(Level::Http, message);
    }

    pub fn verbose(&self, message: impl Into<String>) {
        self.log(Level::Verbose, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn silly(&self, message: impl Into<String>) {
        self.log(Level::Silly, message);
    }

    fn accepts(&self, transport: &dyn Transport, level: Level) -> bool {
        level.passes(transport.level().unwrap_or(self.shared.level))
    }

    fn report_once(&self, source: &str, err: &dyn fmt::Display) {
        let first = self
            .shared
            .reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.to_string());
        if first {
            eprintln!("sinklog: dropping records for {source}: {err}");
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.shared.level)
            .field("format", &self.shared.format)
            .field("transports", &self.shared.transports)
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// Configures a [`Logger`] before it is shared.
#[derive(Debug)]
pub struct LoggerBuilder {
    level: Level,
    format: Format,
    timestamps: bool,
    transports: Vec<Box<dyn Transport>>,
    defaults: Fields,
}

impl LoggerBuilder {
    /// JSON output, timestamps on, no transports.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            format: Format::default(),
            timestamps: true,
            transports: Vec::new(),
            defaults: Fields::new(),
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Enables or disables the automatic `timestamp` field.
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transports.push(Box::new(transport));
        self
    }

    /// Fields attached to every record of the built logger.
    pub fn default_fields(mut self, fields: Fields) -> Self {
        self.defaults.extend(fields);
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            shared: Arc::new(Shared {
                level: self.level,
                format: self.format,
                timestamps: self.timestamps,
                transports: self.transports,
                failed_writes: AtomicU64::new(0),
                reported: Mutex::new(HashSet::new()),
            }),
            defaults: self.defaults,
        }
    }
}

/// Builds a [`Fields`] map from `key => value` pairs.
///
/// ```
/// let fields = sinklog::fields! { "user" => "ada", "attempt" => 3 };
/// assert_eq!(fields["attempt"], 3);
/// ```
#[macro_export]
macro_rules! fields {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = $crate::logger::Fields::new();
        $( map.insert(::std::string::String::from($key), $crate::logger::Value::from($value)); )*
        map
    }};
}
