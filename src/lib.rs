//! Embeddable audit logging for file-transfer tools.
//!
//! An application calls into this crate when a transfer starts and when it
//! ends; the crate pairs the two calls, anonymizes the transfer's fields as
//! configured, and appends one structured line per transfer to a shared log
//! file or to syslog. Logging failures never reach the host application.
//!
//! # Core Types
//!
//! - [`TransferLog`]: the engine; thread-safe begin/end/flush/finalize
//! - [`Config`]: immutable configuration snapshot, parsed by [`config::parse`]
//! - [`Anonymizer`]: per-field verbatim/suppress/hash/mask pipeline
//! - [`Registry`]: the active and ended transfer collections
//! - [`BatchWriter`] and [`Sink`]: line formatting and locked delivery
//!
//! The free functions [`initialize`], [`begin_transfer`], [`end_transfer`]
//! and [`finalize`] expose one process-wide engine through a numeric,
//! never-failing interface.
//!
//! # Examples
//!
//! ```
//! use dlog::{Config, Direction, FieldMode, MemorySink, StaticResolver, TransferLog,
//!            TransferRequest};
//!
//! let sink = MemorySink::new();
//! let log = TransferLog::builder("scp")
//!     .config(Config::default().with_user(FieldMode::Suppress))
//!     .with_sink(sink.clone())
//!     .with_resolver(StaticResolver::new())
//!     .build()
//!     .expect("logging enabled");
//!
//! let request = TransferRequest::new("/srv/data/run42.tar", Direction::Receive)
//!     .size(1 << 20)
//!     .user_id(1000)
//!     .target("/incoming/", "10.0.0.5");
//! let id = log.begin_transfer(&request);
//! log.end_transfer(id, 1 << 20, 0);
//!
//! log.finalize().expect("sink writable");
//! let line = &sink.lines()[0];
//! assert!(line.starts_with("scp RECEIVE name='run42' fileExt='tar'"));
//! assert!(line.contains(" user='' "));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anonymize;
mod api;
pub mod config;
mod engine;
mod error;
mod id;
mod logging;
mod net;
mod record;
mod registry;
mod sanitizer;
mod sink;
mod writer;

pub use anonymize::{
    mask_address, split_path, AnonymizationPolicy, Anonymizer, FieldDigest, FieldMode, IpMask,
    IpMode, Md5Digest, PathParts, RecordFields, Resolver, StaticResolver, SystemResolver,
    UNRESOLVED,
};
pub use api::{
    begin_transfer, end_transfer, finalize, initialize, initialize_with, is_enabled,
    FINALIZE_INCOMPLETE, FINALIZE_OK,
};
pub use config::{Config, LogLocation};
pub use engine::{TransferLog, TransferLogBuilder, ABANDONED_ERROR, FINALIZE_CHUNK};
pub use error::{ConfigError, ConfigErrorKind, EndStatus, Error, InitStatus};
pub use id::{IdGenerator, TransferId};
pub use logging::EngineLog;
pub use net::socket_ips;
pub use record::{
    Direction, InvalidDirection, SessionId, TransferRecord, TransferRequest, DIRECTION_RECEIVE,
    DIRECTION_SEND,
};
pub use registry::{Collection, Registry};
pub use sanitizer::{
    FieldSanitizer, LogField, MAX_ANNOTATION_LEN, MAX_HOST_LEN, MAX_PATH_LEN, MAX_USER_LEN,
    PLACEHOLDER,
};
pub use sink::{
    Facility, FileSink, Level, MemorySink, Sink, SinkBatch, SinkError, SinkErrorKind,
    SyslogOptions, SyslogSink, DEFAULT_LOCK_TIMEOUT, DEFAULT_SYSLOG_SOCKET, LOCK_POLL_INTERVAL,
};
pub use writer::{BatchWriter, FAILURE_TOKEN, SUCCESS_TOKEN};
