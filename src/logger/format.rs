use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::logger::{LogError, Record};

/// How a record is turned into a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// One JSON object per line.
    #[default]
    Json,
    /// `level: message {"field":"value"}`
    Simple,
}

impl Format {
    /// Renders `record` as a single line, without the trailing newline.
    pub fn render(&self, record: &Record) -> Result<String, LogError> {
        match self {
            Format::Json => Ok(serde_json::to_string(record)?),
            Format::Simple => {
                let mut line = format!(
                    "{}: {}",
                    record.level(),
                    record.message().replace('\n', "\\n")
                );
                if !record.fields().is_empty() {
                    line.push(' ');
                    line.push_str(&serde_json::to_string(record.fields())?);
                }
                Ok(line)
            }
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Simple => f.write_str("simple"),
        }
    }
}

impl FromStr for Format {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "simple" => Ok(Format::Simple),
            _ => Err(LogError::UnknownFormat(s.to_string())),
        }
    }
}
