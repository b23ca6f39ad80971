use std::fmt;

use anyhow::Result;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer};

use crate::logger::{Fields, Level, Logger, Record};

/// Installs `logger` as the process-wide `tracing` subscriber.
///
/// `RUST_LOG` directives take precedence; without them events are filtered
/// at the logger's own threshold. Every event that passes is forwarded to
/// the logger's transports through [`LoggerLayer`].
pub fn init_logging(logger: &Logger) -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let subscriber = tracing_subscriber::registry()
        .with(env_filter(logger.level(), &directives))
        .with(LoggerLayer::new(logger.clone()));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Builds the bridge filter: `directives` in `RUST_LOG` syntax, falling back
/// to `level` when they are empty. Invalid directives are skipped.
pub fn env_filter(level: Level, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.as_level_filter().into())
        .parse_lossy(directives)
}

/// A `tracing_subscriber` layer that turns events into log records.
///
/// The event's `message` becomes the record message. Every other field is
/// kept with its native JSON type where `tracing` provides one, and the
/// event target is recorded under `target`.
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Level::from(metadata.level());
        if !self.logger.is_level_enabled(level) {
            return;
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let record = Record::new(level, visitor.message.unwrap_or_default())
            .with_field("target", metadata.target())
            .with_fields(visitor.fields);
        self.logger.log_record(record);
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Fields,
}

impl JsonVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::FileTransport;
    use std::fs;

    fn read_lines(path: &std::path::Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn events_reach_the_logger_with_typed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let info = dir.path().join("info.log");
        let errors = dir.path().join("error.log");
        let logger = Logger::builder(Level::Info)
            .transport(FileTransport::open(&info, Some(Level::Info)).unwrap())
            .transport(FileTransport::open(&errors, Some(Level::Error)).unwrap())
            .build();

        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(user = "ada", attempts = 3u64, ok = true, "signed in");
            tracing::error!(code = -7i64, "charge declined");
            tracing::debug!("not recorded");
        });

        let info_lines = read_lines(&info);
        assert_eq!(info_lines.len(), 2);
        assert_eq!(info_lines[0]["level"], "info");
        assert_eq!(info_lines[0]["message"], "signed in");
        assert_eq!(info_lines[0]["user"], "ada");
        assert_eq!(info_lines[0]["attempts"], 3);
        assert_eq!(info_lines[0]["ok"], true);
        assert_eq!(info_lines[0]["target"], module_path!());

        let error_lines = read_lines(&errors);
        assert_eq!(error_lines.len(), 1);
        assert_eq!(error_lines[0]["message"], "charge declined");
        assert_eq!(error_lines[0]["code"], -7);
    }

    #[test]
    fn formatted_messages_are_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let info = dir.path().join("info.log");
        let logger = Logger::builder(Level::Info)
            .transport(FileTransport::open(&info, None).unwrap())
            .build();

        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, || {
            let table = "orders";
            tracing::warn!("table {table} is {}% full", 91);
        });

        let lines = read_lines(&info);
        assert_eq!(lines[0]["level"], "warn");
        assert_eq!(lines[0]["message"], "table orders is 91% full");
    }

    fn catch_all(path: &std::path::Path) -> Logger {
        Logger::builder(Level::Silly)
            .transport(FileTransport::open(path, None).unwrap())
            .build()
    }

    #[test]
    fn default_filter_follows_the_logger_level() {
        let dir = tempfile::tempdir().unwrap();
        let all = dir.path().join("all.log");
        let logger = catch_all(&all);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(Level::Info, ""))
            .with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("filtered by the default directive");
            tracing::info!("kept");
        });

        let messages: Vec<_> = read_lines(&all)
            .iter()
            .map(|line| line["message"].clone())
            .collect();
        assert_eq!(messages, [Value::from("kept")]);
    }

    #[test]
    fn explicit_directives_override_the_logger_level() {
        let dir = tempfile::tempdir().unwrap();
        let all = dir.path().join("all.log");
        let logger = catch_all(&all);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(Level::Error, "debug"))
            .with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("allowed by directive");
            tracing::trace!("still below debug");
        });

        let lines = read_lines(&all);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "debug");
        assert_eq!(lines[0]["message"], "allowed by directive");
    }

    #[test]
    fn reserved_field_names_are_dropped_but_others_survive() {
        let dir = tempfile::tempdir().unwrap();
        let all = dir.path().join("all.log");
        let logger = catch_all(&all);

        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(level = "debug", threshold = "info", "configured");
        });

        let lines = read_lines(&all);
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["threshold"], "info");
    }
}
