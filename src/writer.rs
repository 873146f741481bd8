//! Formatting of audit lines and the flush discipline.

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

use crate::record::TransferRecord;
use crate::registry::{Collection, Registry};
use crate::sanitizer::{FieldSanitizer, LogField, MAX_HOST_LEN};
use crate::sink::{Sink, SinkError};

/// Token written for a transfer whose error accumulator is zero.
pub const SUCCESS_TOKEN: &str = "yes";
/// Token written for a transfer that recorded an error.
pub const FAILURE_TOKEN: &str = "no";

/// Drains ended records into a [`Sink`].
///
/// One in-process mutex serializes flushes. The sink's own lock (the
/// `flock` of a [`FileSink`](crate::FileSink)) serializes them across
/// processes. The registry lock is only taken to splice records in and out,
/// never while formatting or writing.
///
/// # Examples
///
/// ```
/// use dlog::{BatchWriter, MemorySink, Registry};
///
/// let sink = MemorySink::new();
/// let writer = BatchWriter::new("scp", Box::new(sink.clone()));
///
/// // Nothing ended yet, so the sink is never opened.
/// assert_eq!(writer.flush(&Registry::new()).unwrap(), 0);
/// assert_eq!(sink.batches(), 0);
/// ```
#[derive(Debug)]
pub struct BatchWriter {
    app_name: LogField,
    sink: Box<dyn Sink>,
    sink_lock: Mutex<()>,
}

impl BatchWriter {
    /// Creates a writer stamping `app_name` on every line.
    pub fn new(app_name: &str, sink: Box<dyn Sink>) -> Self {
        Self {
            app_name: FieldSanitizer::new(MAX_HOST_LEN).clean(app_name),
            sink,
            sink_lock: Mutex::new(()),
        }
    }

    /// Returns the application name as written.
    pub fn app_name(&self) -> &str {
        self.app_name.as_str()
    }

    /// Formats one record as a log line, without trailing newline.
    pub fn format_record(&self, record: &TransferRecord) -> String {
        let fields = record.fields();
        let mut line = String::with_capacity(256);
        // Writing into a String cannot fail.
        let _ = write!(
            line,
            "{} {} name='{}' fileExt='{}' size={} sourceDir='{}' targetDir='{}' \
             session={} user='{}' startTime={} duration={:.3} success='{}' \
             sourceIP='{}' targetIP='{}' note='{}'",
            self.app_name,
            record.direction(),
            fields.file_name,
            fields.file_ext,
            record.size(),
            fields.source_dir,
            fields.target_dir,
            record.session(),
            fields.user,
            record.start_time(),
            record.duration_ms(),
            if record.succeeded() {
                SUCCESS_TOKEN
            } else {
                FAILURE_TOKEN
            },
            fields.source_ip,
            fields.target_ip,
            fields.annotation,
        );
        line
    }

    /// Writes every ended record to the sink.
    ///
    /// The sink is opened before anything is taken from the registry, so a
    /// sink that cannot be opened or locked leaves the ended collection
    /// untouched. Records that were taken but not durably written are put
    /// back at the front of the ended collection.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the sink could not be opened, or a line could
    /// not be appended or committed.
    pub fn flush(&self, registry: &Registry) -> Result<usize, SinkError> {
        let _guard = self.sink_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if registry.is_empty(Collection::Ended) {
            return Ok(0);
        }

        let mut batch = self.sink.open()?;
        let buffered = batch.buffers_until_commit();
        let records = registry.drain(Collection::Ended);

        let mut appended = 0;
        let mut failure = None;
        for record in &records {
            match batch.append(&self.format_record(record)) {
                Ok(()) => appended += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let result = match failure {
            Some(e) => Err(e),
            None => batch.commit(),
        };

        match result {
            Ok(()) => Ok(records.len()),
            Err(e) => {
                let delivered = if buffered { 0 } else { appended };
                let retained: Vec<TransferRecord> = records.into_iter().skip(delivered).collect();
                registry.restore(Collection::Ended, retained);
                Err(e)
            }
        }
    }
}
