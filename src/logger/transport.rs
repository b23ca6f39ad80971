use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::logger::{Level, LogError};

/// A destination for rendered log lines.
///
/// Implementations receive one already-formatted line per call and must
/// append it atomically with respect to other callers of the same transport.
///
/// # Thresholds
///
/// `level()` is the transport's own minimum severity. When it returns
/// `None` the owning [`Logger`](crate::logger::Logger)'s threshold applies.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Short name used in error reports.
    fn name(&self) -> &str;

    /// Minimum severity this transport accepts, if it overrides the logger's.
    fn level(&self) -> Option<Level>;

    /// Appends `line` followed by a newline.
    fn write_line(&self, line: &str) -> io::Result<()>;

    /// Flushes any data buffered by the OS handle.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Appends lines to a file.
///
/// Backed by a non-rotating `tracing_appender` file appender: the file is
/// opened once in append mode, so restarting a process adds to existing logs
/// instead of truncating them. Missing parent directories are created on open.
///
/// # Example
///
/// ```no_run
/// use sinklog::logger::{FileTransport, Level, Transport};
///
/// let errors = FileTransport::open("logs/error.log", Some(Level::Error)).unwrap();
/// errors.write_line(r#"{"level":"error","message":"boom"}"#).unwrap();
/// ```
pub struct FileTransport {
    name: String,
    path: PathBuf,
    level: Option<Level>,
    appender: Mutex<RollingFileAppender>,
}

impl FileTransport {
    /// Opens `path` for appending.
    ///
    /// # Arguments
    ///
    /// * `path` - The log file. Parent directories are created if missing.
    /// * `level` - Minimum severity written to this file, or `None` to follow the logger.
    ///
    /// # Returns
    ///
    /// The transport, or [`LogError::Open`] if the directory or file cannot be created.
    pub fn open(path: impl AsRef<Path>, level: Option<Level>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                LogError::InvalidConfig(format!("log path '{}' has no file name", path.display()))
            })?
            .to_string();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(&dir)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), ?level, "Opened file transport");

        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            level,
            appender: Mutex::new(appender),
        })
    }

    /// Returns the path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn appender(&self) -> MutexGuard<'_, RollingFileAppender> {
        self.appender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for FileTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTransport")
            .field("path", &self.path)
            .field("level", &self.level)
            .finish()
    }
}

impl Transport for FileTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Option<Level> {
        self.level
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.appender().write_all(&buf)
    }

    fn flush(&self) -> io::Result<()> {
        self.appender().flush()
    }
}

/// Which standard stream a [`ConsoleTransport`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Writes lines to stdout or stderr.
#[derive(Debug)]
pub struct ConsoleTransport {
    stream: Stream,
    level: Option<Level>,
}

impl ConsoleTransport {
    pub fn new(stream: Stream, level: Option<Level>) -> Self {
        Self { stream, level }
    }

    pub fn stderr(level: Option<Level>) -> Self {
        Self::new(Stream::Stderr, level)
    }
}

impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        match self.stream {
            Stream::Stdout => "console:stdout",
            Stream::Stderr => "console:stderr",
        }
    }

    fn level(&self) -> Option<Level> {
        self.level
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        match self.stream {
            Stream::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Stream::Stderr => writeln!(io::stderr().lock(), "{line}"),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.stream {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
        }
    }
}
