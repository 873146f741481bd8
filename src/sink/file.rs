use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::{debug, warn};

use super::{Sink, SinkBatch, SinkError, SinkErrorKind};

/// How long a flush waits for the exclusive file lock by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);
/// Interval between non-blocking lock attempts.
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Appends audit lines to a file shared by any number of processes.
///
/// Every batch opens the file for append and takes an exclusive advisory
/// lock (`flock`) on it, polling until [`DEFAULT_LOCK_TIMEOUT`] (or the
/// configured timeout) elapses. The whole batch is written with the lock
/// held, so lines from concurrent writers never interleave.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use dlog::FileSink;
///
/// let sink = FileSink::new("/var/log/datalog.log")
///     .with_lock_timeout(Duration::from_millis(500));
/// assert_eq!(sink.path().to_str(), Some("/var/log/datalog.log"));
/// ```
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    lock_timeout: Duration,
}

impl FileSink {
    /// Creates a sink appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long a flush waits for the file lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn acquire(&self) -> Result<Flock<File>, SinkError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let deadline = Instant::now() + self.lock_timeout;

        loop {
            match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(lock) => return Ok(lock),
                Err((unlocked, errno)) if errno == Errno::EWOULDBLOCK || errno == Errno::EINTR => {
                    if Instant::now() >= deadline {
                        return Err(SinkError::with_message(
                            SinkErrorKind::Locked,
                            format!(
                                "{} still locked after {:?}",
                                self.path.display(),
                                self.lock_timeout
                            ),
                        ));
                    }
                    file = unlocked;
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err((_, errno)) => {
                    return Err(SinkError::with_message(
                        SinkErrorKind::Io,
                        format!("flock {}: {}", self.path.display(), errno),
                    ));
                }
            }
        }
    }
}

impl Sink for FileSink {
    fn open(&self) -> Result<Box<dyn SinkBatch + '_>, SinkError> {
        let lock = self.acquire()?;
        debug!(target: "dlog", path = %self.path.display(), "log file locked");
        Ok(Box::new(FileBatch {
            path: &self.path,
            lock,
            buffer: String::new(),
        }))
    }
}

struct FileBatch<'a> {
    path: &'a Path,
    lock: Flock<File>,
    buffer: String,
}

impl SinkBatch for FileBatch<'_> {
    fn append(&mut self, line: &str) -> Result<(), SinkError> {
        self.buffer.push_str(line);
        self.buffer.push('\n');
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), SinkError> {
        let batch = *self;
        let file: &File = &batch.lock;
        let start = file.metadata()?.len();
        write_whole(&mut &*file, batch.buffer.as_bytes(), |out| out.set_len(start)).map_err(
            |e| {
                SinkError::with_message(
                    SinkErrorKind::Io,
                    format!("append to {}: {}", batch.path.display(), e),
                )
            },
        )?;

        if let Err(e) = file.sync_data() {
            warn!(target: "dlog", path = %batch.path.display(), error = %e, "failed to sync log file");
        }
        // Dropping the lock releases it before the file is closed.
        drop(batch.lock);
        Ok(())
    }
}

/// Writes all of `data`; on failure `rollback` undoes whatever part of it
/// reached `out`.
fn write_whole<W: Write>(
    out: &mut W,
    data: &[u8],
    rollback: impl FnOnce(&mut W) -> io::Result<()>,
) -> io::Result<()> {
    let Err(e) = out.write_all(data) else {
        return Ok(());
    };
    if let Err(undo) = rollback(out) {
        warn!(target: "dlog", error = %undo, "failed to roll back partial batch");
    }
    Err(e)
}
