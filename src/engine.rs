//! The transfer-tracking engine.
//!
//! [`TransferLog`] ties the pieces together: it issues ids, builds
//! anonymized records on begin, moves them from the active to the ended
//! registry on end, flushes every `batch_size` completions, and on
//! [`finalize`](TransferLog::finalize) closes out whatever is still open.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::anonymize::{Anonymizer, FieldDigest, Md5Digest, Resolver, SystemResolver};
use crate::config::{self, Config, LogLocation};
use crate::error::{EndStatus, Error};
use crate::id::{IdGenerator, TransferId};
use crate::logging::EngineLog;
use crate::record::{SessionId, TransferRecord, TransferRequest};
use crate::registry::{Collection, Registry};
use crate::sink::Sink;
use crate::writer::BatchWriter;

/// Error code recorded for transfers still open at finalize.
pub const ABANDONED_ERROR: u32 = 1;
/// Most active transfers closed out per finalize pass.
pub const FINALIZE_CHUNK: usize = 500;

/// Builder for [`TransferLog`].
///
/// Every collaborator has a production default: the sink selected by the
/// configuration, MD5 hashing, system hostname resolution and a session id
/// derived from the clock and process id.
pub struct TransferLogBuilder {
    app: String,
    config: Config,
    sink: Option<Box<dyn Sink>>,
    digest: Option<Arc<dyn FieldDigest>>,
    resolver: Option<Arc<dyn Resolver>>,
    session: Option<SessionId>,
}

impl TransferLogBuilder {
    /// Starts a builder for `app` with the default configuration.
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            config: Config::default(),
            sink: None,
            digest: None,
            resolver: None,
            session: None,
        }
    }

    /// Uses `config` instead of the defaults.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Writes to `sink` instead of the one the configuration selects.
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Replaces the MD5 digest.
    pub fn with_digest(mut self, digest: impl FieldDigest + 'static) -> Self {
        self.digest = Some(Arc::new(digest));
        self
    }

    /// Replaces the system resolver.
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Fixes the session id.
    pub fn with_session_id(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disabled`] when the configuration turns logging off.
    pub fn build(self) -> Result<TransferLog, Error> {
        if !self.config.enabled() {
            return Err(Error::Disabled);
        }

        let session = self.session.unwrap_or_else(SessionId::generate);
        let sink = self.sink.unwrap_or_else(|| self.config.sink());
        let digest = self.digest.unwrap_or_else(|| Arc::new(Md5Digest));
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(SystemResolver));
        let log = EngineLog::new(self.app.clone(), session);

        match self.config.location() {
            LogLocation::File => log.info(format_args!(
                "audit logging to {} (batch {})",
                self.config.filename().display(),
                self.config.batch_size()
            )),
            LogLocation::Syslog => log.info(format_args!(
                "audit logging to syslog as {} (batch {})",
                self.config.ident(),
                self.config.batch_size()
            )),
        }

        Ok(TransferLog {
            session,
            ids: IdGenerator::new(),
            registry: Registry::new(),
            anonymizer: Anonymizer::new(*self.config.policy(), digest, resolver),
            writer: BatchWriter::new(&self.app, sink),
            batch_size: u64::from(self.config.batch_size().max(1)),
            completed: AtomicU64::new(0),
            log,
        })
    }
}

impl fmt::Debug for TransferLogBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferLogBuilder")
            .field("app", &self.app)
            .field("config", &self.config)
            .field("sink", &self.sink)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Audit log for the transfers of one application.
///
/// All methods take `&self` and may be called from any number of threads.
/// A record becomes visible in the sink only after both its begin and end
/// calls have returned; it is guaranteed to be written by the time
/// [`finalize`](Self::finalize) returns. Dropping the log finalizes it.
///
/// # Examples
///
/// ```
/// use dlog::{Config, Direction, MemorySink, StaticResolver, TransferLog, TransferRequest};
///
/// let sink = MemorySink::new();
/// let log = TransferLog::builder("scp")
///     .config(Config::default().with_batch_size(1))
///     .with_sink(sink.clone())
///     .with_resolver(StaticResolver::new())
///     .build()
///     .unwrap();
///
/// let request = TransferRequest::new("/data/report.csv", Direction::Send).size(2048);
/// let id = log.begin_transfer(&request);
/// assert!(log.end_transfer(id, 2048, 0).is_ok());
///
/// assert_eq!(sink.len(), 1);
/// assert!(sink.lines()[0].starts_with("scp SEND name='report' fileExt='csv' size=2048"));
/// ```
pub struct TransferLog {
    session: SessionId,
    ids: IdGenerator,
    registry: Registry,
    anonymizer: Anonymizer,
    writer: BatchWriter,
    batch_size: u64,
    completed: AtomicU64,
    log: EngineLog,
}

impl TransferLog {
    /// Starts a builder.
    pub fn builder(app: impl Into<String>) -> TransferLogBuilder {
        TransferLogBuilder::new(app)
    }

    /// Builds an engine from `config` with production collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disabled`] when the configuration turns logging off.
    pub fn from_config(app: impl Into<String>, config: Config) -> Result<Self, Error> {
        TransferLogBuilder::new(app).config(config).build()
    }

    /// Loads the configuration file at `path` and builds an engine from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed and
    /// [`Error::Disabled`] if it turns logging off.
    pub fn from_config_file(app: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, Error> {
        let config = config::load(path)?;
        Self::from_config(app, config)
    }

    /// Finds the configuration file in the standard locations and builds
    /// an engine from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no file is found or it cannot be read or
    /// parsed, and [`Error::Disabled`] if it turns logging off.
    pub fn from_discovered_config(app: impl Into<String>) -> Result<Self, Error> {
        let path = config::discover()?;
        Self::from_config_file(app, path)
    }

    /// Records the start of a transfer and returns its id.
    ///
    /// Resolution, hashing and sanitizing all happen before the registry
    /// lock is taken.
    pub fn begin_transfer(&self, request: &TransferRequest<'_>) -> TransferId {
        let fields = self.anonymizer.fields(request);
        let id = self.ids.next_id();
        let record = TransferRecord::begin(id, self.session, request.direction, request.size, fields);
        self.registry.insert(Collection::Active, record);
        id
    }

    /// Records the end of a transfer.
    ///
    /// `size` replaces the size given at begin when larger. A nonzero
    /// `error` marks the transfer as failed. Every `batch_size`-th
    /// completion flushes the ended records to the sink; a flush failure
    /// is logged and the records are retried on the next flush.
    pub fn end_transfer(&self, id: impl Into<u64>, size: u64, error: u32) -> EndStatus {
        let raw = id.into();
        let Some(id) = TransferId::new(raw) else {
            self.log.debug(format_args!("end called with transfer id 0"));
            return EndStatus::ZeroId;
        };
        if !self.registry.complete(id, |record| record.finish(size, error)) {
            self.log.debug(format_args!("end called with unknown transfer id {}", id));
            return EndStatus::NotFound;
        }

        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if completed % self.batch_size == 0 {
            let _ = self.flush();
        }
        EndStatus::Ok
    }

    /// Writes every ended record now.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the sink could not be opened, locked or
    /// written; unwritten records stay queued.
    pub fn flush(&self) -> Result<usize, Error> {
        match self.writer.flush(&self.registry) {
            Ok(0) => Ok(0),
            Ok(written) => {
                self.log.debug(format_args!("flushed {} transfer records", written));
                Ok(written)
            }
            Err(e) => {
                self.log.warn(format_args!(
                    "flush failed, {} records kept for retry: {}",
                    self.registry.len(Collection::Ended),
                    e
                ));
                Err(e.into())
            }
        }
    }

    /// Writes everything and closes out transfers that never ended.
    ///
    /// Ended records are flushed first. Then, in passes of at most
    /// [`FINALIZE_CHUNK`] ids, every still-active transfer is ended with
    /// error code [`ABANDONED_ERROR`] and the result flushed. Afterwards the
    /// active registry is empty.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns the last sink error if any flush failed; the affected
    /// records stay queued.
    pub fn finalize(&self) -> Result<usize, Error> {
        let mut written = 0;
        let mut abandoned = 0;
        let mut last_error = None;

        let mut tally = |result: Result<usize, Error>| match result {
            Ok(n) => written += n,
            Err(e) => last_error = Some(e),
        };

        tally(self.flush());
        loop {
            let ids = self.registry.active_ids(FINALIZE_CHUNK);
            if ids.is_empty() {
                break;
            }
            for id in ids {
                if self.end_transfer(id, 0, ABANDONED_ERROR).is_ok() {
                    abandoned += 1;
                }
            }
            tally(self.flush());
        }
        // Transfers ended by other threads after the last pass.
        tally(self.flush());

        if abandoned > 0 {
            self.log.info(format_args!(
                "finalized with {} unfinished transfers recorded as failed",
                abandoned
            ));
        }
        match last_error {
            Some(e) if !self.registry.is_empty(Collection::Ended) => Err(e),
            _ => Ok(written),
        }
    }

    /// Returns the session id stamped on every record.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns the application name written on every line.
    pub fn app_name(&self) -> &str {
        self.writer.app_name()
    }

    /// Returns the number of begun, not yet ended transfers.
    pub fn active(&self) -> usize {
        self.registry.len(Collection::Active)
    }

    /// Returns the number of ended records not yet written.
    pub fn pending(&self) -> usize {
        self.registry.len(Collection::Ended)
    }

    /// Returns how many transfers have ended.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Returns the flush threshold.
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }
}

impl fmt::Debug for TransferLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferLog")
            .field("app", &self.writer.app_name())
            .field("session", &self.session)
            .field("batch_size", &self.batch_size)
            .field("active", &self.active())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Drop for TransferLog {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            self.log.warn(format_args!(
                "{} transfer records lost at shutdown: {}",
                self.pending(),
                e
            ));
        }
    }
}
