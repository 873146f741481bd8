//! Transfer records and the values stamped onto them.

use std::fmt;
use std::process;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::anonymize::RecordFields;
use crate::id::TransferId;
use crate::sanitizer::LogField;

/// Numeric code for [`Direction::Send`] on the raw API.
pub const DIRECTION_SEND: u32 = 0;
/// Numeric code for [`Direction::Receive`] on the raw API.
pub const DIRECTION_RECEIVE: u32 = 1;

/// Which way a file moved relative to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The application sent the file.
    Send,
    /// The application received the file.
    Receive,
}

impl Direction {
    /// Token written into the log line.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Send => "SEND",
            Direction::Receive => "RECEIVE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a raw direction code is neither send nor receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDirection(pub u32);

impl fmt::Display for InvalidDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transfer direction code {}", self.0)
    }
}

impl std::error::Error for InvalidDirection {}

impl TryFrom<u32> for Direction {
    type Error = InvalidDirection;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            DIRECTION_SEND => Ok(Direction::Send),
            DIRECTION_RECEIVE => Ok(Direction::Receive),
            other => Err(InvalidDirection(other)),
        }
    }
}

/// Identifier stamped on every record written by one process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Derives the session id from the current time and process id.
    ///
    /// The value is `((unix_seconds << 20) | pid)` truncated to 36 bits.
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::from_parts(secs, process::id())
    }

    /// Derives a session id from explicit parts.
    pub fn from_parts(unix_seconds: u64, pid: u32) -> Self {
        Self(((unix_seconds << 20) | u64::from(pid)) & 0xF_FFFF_FFFF)
    }

    /// Uses `raw` verbatim.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the numeric session id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw arguments of a begin call.
///
/// Nothing here is stored as given; the anonymization pipeline derives the
/// logged fields from it.
///
/// # Examples
///
/// ```
/// use dlog::{Direction, TransferRequest};
///
/// let request = TransferRequest::new("/a/b/file.txt", Direction::Send)
///     .size(100)
///     .user_id(7)
///     .source_host("localhost")
///     .target("/out/", "10.0.0.5")
///     .annotation("nightly sync");
/// assert_eq!(request.size, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest<'a> {
    /// Full path of the transferred file, including its extension.
    pub filename: &'a str,
    /// Size in bytes; may be `0` and supplied at end instead.
    pub size: u64,
    /// Numeric user associated with the transfer.
    pub user_id: u64,
    /// Source hostname or address literal.
    pub source_host: &'a str,
    /// Destination path.
    pub target_path: &'a str,
    /// Destination hostname or address literal.
    pub target_host: &'a str,
    /// Send or receive.
    pub direction: Direction,
    /// Free-text note.
    pub annotation: &'a str,
}

impl<'a> TransferRequest<'a> {
    /// Starts a request for `filename`; every other field is empty or zero.
    pub fn new(filename: &'a str, direction: Direction) -> Self {
        Self {
            filename,
            size: 0,
            user_id: 0,
            source_host: "",
            target_path: "",
            target_host: "",
            direction,
            annotation: "",
        }
    }

    /// Sets the file size.
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Sets the user id.
    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sets the source host.
    pub fn source_host(mut self, host: &'a str) -> Self {
        self.source_host = host;
        self
    }

    /// Sets the destination path and host.
    pub fn target(mut self, path: &'a str, host: &'a str) -> Self {
        self.target_path = path;
        self.target_host = host;
        self
    }

    /// Sets the annotation.
    pub fn annotation(mut self, note: &'a str) -> Self {
        self.annotation = note;
        self
    }
}

/// One begin/end pair.
///
/// A record is created by `begin_transfer` with all of its string fields
/// already anonymized and sanitized, lives in the active registry until
/// `end_transfer` finishes it, then waits in the ended registry until the
/// writer takes ownership of it.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    id: TransferId,
    session: SessionId,
    direction: Direction,
    fields: RecordFields,
    size: u64,
    started_at: SystemTime,
    started: Instant,
    ended: Option<Instant>,
    error: u64,
}

impl TransferRecord {
    /// Starts a record now.
    pub fn begin(
        id: TransferId,
        session: SessionId,
        direction: Direction,
        size: u64,
        fields: RecordFields,
    ) -> Self {
        Self {
            id,
            session,
            direction,
            fields,
            size,
            started_at: SystemTime::now(),
            started: Instant::now(),
            ended: None,
            error: 0,
        }
    }

    /// Finishes the record now.
    ///
    /// `size` replaces the size given at begin only when it is larger, and
    /// `error_code` is added to the error accumulator.
    pub fn finish(&mut self, size: u64, error_code: u32) {
        self.ended = Some(Instant::now());
        if size > self.size {
            self.size = size;
        }
        self.error = self.error.saturating_add(u64::from(error_code));
    }

    /// Returns the transfer id.
    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Returns the session id stamped on this record.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns the transfer direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the anonymized fields.
    pub fn fields(&self) -> &RecordFields {
        &self.fields
    }

    /// File name without directory or extension.
    pub fn file_name(&self) -> &LogField {
        &self.fields.file_name
    }

    /// File extension without the leading dot.
    pub fn file_ext(&self) -> &LogField {
        &self.fields.file_ext
    }

    /// Returns the transferred size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the accumulated error code; `0` means success.
    pub fn error(&self) -> u64 {
        self.error
    }

    /// Returns `true` if no error was recorded.
    pub fn succeeded(&self) -> bool {
        self.error == 0
    }

    /// Returns `true` once `finish` has been called.
    pub fn is_finished(&self) -> bool {
        self.ended.is_some()
    }

    /// Wall-clock start time in whole seconds since the Unix epoch.
    pub fn start_time(&self) -> u64 {
        self.started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    /// Time between begin and end; zero for unfinished records.
    pub fn duration(&self) -> Duration {
        self.ended
            .map(|end| end.saturating_duration_since(self.started))
            .unwrap_or_default()
    }

    /// Duration in milliseconds with microsecond precision.
    pub fn duration_ms(&self) -> f64 {
        self.duration().as_micros() as f64 / 1_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransferRecord {
        TransferRecord::begin(
            TransferId::new(1).unwrap(),
            SessionId::from_raw(99),
            Direction::Send,
            100,
            RecordFields::default(),
        )
    }

    #[test]
    fn direction_codes() {
        assert_eq!(Direction::try_from(0), Ok(Direction::Send));
        assert_eq!(Direction::try_from(1), Ok(Direction::Receive));
        assert_eq!(Direction::try_from(2), Err(InvalidDirection(2)));
        assert_eq!(Direction::Receive.to_string(), "RECEIVE");
    }

    #[test]
    fn session_id_layout() {
        let session = SessionId::from_parts(1, 0x1234);
        assert_eq!(session.get(), (1 << 20) | 0x1234);

        // Bits above 36 are dropped
        let wide = SessionId::from_parts(u64::MAX, 0);
        assert_eq!(wide.get() >> 36, 0);
    }

    #[test]
    fn finish_keeps_larger_size() {
        let mut rec = record();
        rec.finish(50, 0);
        assert_eq!(rec.size(), 100);

        let mut rec = record();
        rec.finish(250, 0);
        assert_eq!(rec.size(), 250);
    }

    #[test]
    fn finish_accumulates_errors() {
        let mut rec = record();
        assert!(rec.succeeded());
        rec.finish(0, 3);
        assert_eq!(rec.error(), 3);
        assert!(!rec.succeeded());
        assert!(rec.is_finished());
    }

    #[test]
    fn unfinished_record_has_zero_duration() {
        let rec = record();
        assert_eq!(rec.duration(), Duration::ZERO);
        assert!(!rec.is_finished());
    }

    #[test]
    fn duration_is_nonnegative() {
        let mut rec = record();
        std::thread::sleep(Duration::from_millis(2));
        rec.finish(0, 0);
        assert!(rec.duration_ms() >= 2.0);
        assert!(rec.start_time() > 0);
    }
}
