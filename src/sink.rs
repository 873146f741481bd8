//! Durable destinations for formatted audit lines.
//!
//! A flush opens a [`SinkBatch`] (taking whatever cross-process lock the
//! sink needs), appends every pending line, then commits. If opening fails
//! nothing has been taken from the ended registry, so the records simply
//! wait for the next flush.

mod file;
mod memory;
mod syslog;

use std::fmt;
use std::io;

pub use file::{FileSink, DEFAULT_LOCK_TIMEOUT, LOCK_POLL_INTERVAL};
pub use memory::MemorySink;
pub use syslog::{Facility, Level, SyslogOptions, SyslogSink, DEFAULT_SYSLOG_SOCKET};

/// Error returned when writing to a sink fails.
///
/// # Examples
///
/// ```
/// use dlog::{SinkError, SinkErrorKind};
///
/// let error = SinkError::new(SinkErrorKind::Locked);
/// assert_eq!(error.kind(), SinkErrorKind::Locked);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    kind: SinkErrorKind,
    message: Option<String>,
}

impl SinkError {
    /// Creates a new sink error with the specified kind.
    pub fn new(kind: SinkErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new sink error with a custom message.
    pub fn with_message(kind: SinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SinkErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "sink error ({}): {}", self.kind, msg)
        } else {
            write!(f, "sink error ({})", self.kind)
        }
    }
}

impl std::error::Error for SinkError {}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        SinkError::with_message(SinkErrorKind::Io, err.to_string())
    }
}

/// Kind of sink error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    /// I/O error while opening or writing.
    Io,
    /// The exclusive lock could not be acquired in time.
    Locked,
    /// The destination is not reachable.
    Unavailable,
}

impl fmt::Display for SinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Locked => write!(f, "lock not acquired"),
            Self::Unavailable => write!(f, "sink unavailable"),
        }
    }
}

/// A destination for audit lines.
pub trait Sink: fmt::Debug + Send + Sync {
    /// Opens a batch, acquiring any lock the destination requires.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the destination cannot be opened or locked.
    fn open(&self) -> Result<Box<dyn SinkBatch + '_>, SinkError>;
}

/// One open write session against a [`Sink`].
pub trait SinkBatch {
    /// Appends one line (without trailing newline).
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the line could not be accepted; lines appended
    /// before the failing one are kept.
    fn append(&mut self, line: &str) -> Result<(), SinkError>;

    /// Makes the appended lines durable and releases the session.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the batch could not be written.
    fn commit(self: Box<Self>) -> Result<(), SinkError>;

    /// Returns `true` if `commit` failing means none of the appended lines
    /// were written.
    ///
    /// Sinks that deliver each line on `append` return `false`.
    fn buffers_until_commit(&self) -> bool {
        true
    }
}
