use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Sink, SinkBatch, SinkError, SinkErrorKind};

#[derive(Debug, Default)]
struct Store {
    lines: Vec<String>,
    batches: usize,
    unavailable: bool,
}

/// In-memory sink for tests and embedding.
///
/// Clones share the same storage, so a test can hand one clone to the
/// engine and inspect the other. Lines become visible only when their
/// batch commits.
///
/// # Examples
///
/// ```
/// use dlog::{MemorySink, Sink};
///
/// let sink = MemorySink::new();
/// let mut batch = sink.open().unwrap();
/// batch.append("scp SEND name='a'").unwrap();
/// batch.commit().unwrap();
///
/// assert_eq!(sink.lines(), vec!["scp SEND name='a'".to_string()]);
/// assert_eq!(sink.batches(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    store: Arc<Mutex<Store>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a snapshot of every committed line.
    pub fn lines(&self) -> Vec<String> {
        self.store().lines.clone()
    }

    /// Returns the number of committed lines.
    pub fn len(&self) -> usize {
        self.store().lines.len()
    }

    /// Returns `true` if nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.store().lines.is_empty()
    }

    /// Returns how many batches have committed.
    pub fn batches(&self) -> usize {
        self.store().batches
    }

    /// Makes `open` fail with [`SinkErrorKind::Unavailable`] while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.store().unavailable = unavailable;
    }
}

impl Sink for MemorySink {
    fn open(&self) -> Result<Box<dyn SinkBatch + '_>, SinkError> {
        if self.store().unavailable {
            return Err(SinkError::with_message(
                SinkErrorKind::Unavailable,
                "memory sink marked unavailable",
            ));
        }
        Ok(Box::new(MemoryBatch {
            sink: self,
            pending: Vec::new(),
        }))
    }
}

struct MemoryBatch<'a> {
    sink: &'a MemorySink,
    pending: Vec<String>,
}

impl SinkBatch for MemoryBatch<'_> {
    fn append(&mut self, line: &str) -> Result<(), SinkError> {
        self.pending.push(line.to_owned());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), SinkError> {
        let mut store = self.sink.store();
        store.lines.extend(self.pending);
        store.batches += 1;
        Ok(())
    }
}
