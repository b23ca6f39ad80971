//! # Logger Module
//!
//! Structured logging with severity-filtered transports.
//!
//! ## Components
//!
//! - `Logger`: The emit entry point. Cheap to clone; clones share transports.
//! - `Level`: Ordered severities (`error` > `warn` > `info` > `http` > `verbose` > `debug` > `silly`).
//! - `Record`: A level, a message, an optional timestamp and caller fields.
//! - `Format`: Turns a record into one line (`json` or `simple`).
//! - `Transport`: A destination for lines. `FileTransport` appends to a file,
//!   `ConsoleTransport` writes to stdout or stderr.
//!
//! ## Example
//!
//! ```no_run
//! use sinklog::fields;
//! use sinklog::logger::{FileTransport, Level, Logger};
//!
//! let logger = Logger::builder(Level::Info)
//!     .transport(FileTransport::open("logs/info.log", Some(Level::Info))?)
//!     .transport(FileTransport::open("logs/error.log", Some(Level::Error))?)
//!     .build();
//!
//! // info.log only
//! logger.info("listening");
//! // info.log and error.log
//! logger.log_with(Level::Error, "payment failed", fields! { "order_id" => 42 });
//! // neither
//! logger.debug("cache stats");
//! # Ok::<(), sinklog::logger::LogError>(())
//! ```

mod error;
mod format;
mod instance;
mod level;
mod record;
mod transport;

pub use error::{LogError, TransportFailure};
pub use format::Format;
pub use instance::{Logger, LoggerBuilder};
pub use level::Level;
pub use record::{Fields, Record, RESERVED_KEYS};
pub use serde_json::Value;
pub use transport::{ConsoleTransport, FileTransport, Stream, Transport};
