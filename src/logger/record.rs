use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::logger::Level;

/// Caller-supplied metadata attached to a record.
pub type Fields = Map<String, Value>;

/// Keys owned by the record itself; caller fields never shadow them.
pub const RESERVED_KEYS: [&str; 3] = ["level", "message", "timestamp"];

/// A single log record.
///
/// Serializes to one flat JSON object: `level`, `message`, an optional
/// `timestamp`, then every caller field at the top level.
///
/// # Example
///
/// ```
/// use sinklog::logger::{Level, Record};
///
/// let record = Record::new(Level::Info, "order placed").with_field("order_id", 42);
///
/// let line = serde_json::to_string(&record).unwrap();
/// assert_eq!(line, r#"{"level":"info","message":"order placed","order_id":42}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    level: Level,
    message: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    fields: Fields,
}

impl Record {
    /// Creates a record without timestamp or fields.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: None,
            fields: Fields::new(),
        }
    }

    /// Adds one metadata field. Reserved keys are ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_field(key.into(), value.into());
        self
    }

    /// Adds every entry of `fields`, overwriting fields already present.
    pub fn with_fields(mut self, fields: Fields) -> Self {
        for (key, value) in fields {
            self.insert_field(key, value);
        }
        self
    }

    /// Sets the timestamp explicitly.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Fills in fields that the record does not already carry.
    pub(crate) fn merge_defaults(&mut self, defaults: &Fields) {
        for (key, value) in defaults {
            if !self.fields.contains_key(key) && !is_reserved(key) {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    pub(crate) fn stamp_if_missing(&mut self) {
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now());
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    fn insert_field(&mut self, key: String, value: Value) {
        if !is_reserved(&key) {
            self.fields.insert(key, value);
        }
    }
}

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

fn serialize_timestamp<S>(timestamp: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timestamp {
        Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => serializer.serialize_none(),
    }
}
