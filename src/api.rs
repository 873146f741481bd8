//! Process-wide numeric interface.
//!
//! These functions mirror the classic C-style calling convention: plain
//! numbers in and out, a single engine per process, and no error ever
//! escaping to the caller. Everything here delegates to one shared
//! [`TransferLog`].
//!
//! Until [`initialize`] succeeds, and after it fails, every call is a safe
//! no-op: [`begin_transfer`] returns `0` and the other calls report
//! success.

use std::sync::OnceLock;

use tracing::{info, warn};

use crate::config::Config;
use crate::engine::TransferLog;
use crate::error::{EndStatus, Error, InitStatus};
use crate::record::{Direction, TransferRequest};

/// `finalize` wrote every record.
pub const FINALIZE_OK: u32 = 0;
/// `finalize` could not write some records.
pub const FINALIZE_INCOMPLETE: u32 = 1;

// Set once by the first `initialize`; `None` means logging is disabled.
static ENGINE: OnceLock<Option<TransferLog>> = OnceLock::new();

fn engine() -> Option<&'static TransferLog> {
    ENGINE.get().and_then(Option::as_ref)
}

/// Initializes logging for this process from the discovered
/// configuration file.
///
/// Only the first call has any effect; later calls return
/// [`InitStatus::AlreadyInitialized`]. A missing, unreadable or malformed
/// configuration leaves logging disabled for the rest of the process.
pub fn initialize(app: &str) -> InitStatus {
    install(|| TransferLog::from_discovered_config(app))
}

/// Initializes logging for this process from an explicit configuration.
pub fn initialize_with(app: &str, config: Config) -> InitStatus {
    install(|| TransferLog::from_config(app, config))
}

fn install(build: impl FnOnce() -> Result<TransferLog, Error>) -> InitStatus {
    let mut status = InitStatus::AlreadyInitialized;
    ENGINE.get_or_init(|| {
        let (engine, outcome) = match build() {
            Ok(log) => (Some(log), InitStatus::Ok),
            Err(Error::Disabled) => {
                info!(target: "dlog", "audit logging disabled by configuration");
                (None, InitStatus::Ok)
            }
            Err(Error::Config(e)) => {
                warn!(target: "dlog", error = %e, "audit logging disabled");
                (None, InitStatus::from(&e))
            }
            Err(Error::Sink(e)) => {
                warn!(target: "dlog", error = %e, "audit logging disabled");
                (None, InitStatus::OpenFailed)
            }
        };
        status = outcome;
        engine
    });
    status
}

/// Returns `true` once initialization has produced a running engine.
pub fn is_enabled() -> bool {
    engine().is_some()
}

/// Records the start of a transfer.
///
/// Returns the transfer id, or `0` if logging is off, `direction` is
/// neither [`DIRECTION_SEND`](crate::DIRECTION_SEND) nor
/// [`DIRECTION_RECEIVE`](crate::DIRECTION_RECEIVE), or a required string
/// is missing. `annotation` may be `None`.
#[allow(clippy::too_many_arguments)]
pub fn begin_transfer(
    filename: Option<&str>,
    size: u64,
    user_id: u64,
    source_host: Option<&str>,
    target_path: Option<&str>,
    target_host: Option<&str>,
    direction: u32,
    annotation: Option<&str>,
) -> u64 {
    let Some(log) = engine() else {
        return 0;
    };
    let Some(request) = raw_request(
        filename,
        size,
        user_id,
        source_host,
        target_path,
        target_host,
        direction,
        annotation,
    ) else {
        return 0;
    };
    log.begin_transfer(&request).get()
}

#[allow(clippy::too_many_arguments)]
fn raw_request<'a>(
    filename: Option<&'a str>,
    size: u64,
    user_id: u64,
    source_host: Option<&'a str>,
    target_path: Option<&'a str>,
    target_host: Option<&'a str>,
    direction: u32,
    annotation: Option<&'a str>,
) -> Option<TransferRequest<'a>> {
    let direction = Direction::try_from(direction).ok()?;
    Some(
        TransferRequest::new(filename?, direction)
            .size(size)
            .user_id(user_id)
            .source_host(source_host?)
            .target(target_path?, target_host?)
            .annotation(annotation.unwrap_or("")),
    )
}

/// Records the end of a transfer started with [`begin_transfer`].
///
/// Returns [`EndStatus::Ok`] when logging is off.
pub fn end_transfer(id: u64, size: u64, error: u32) -> EndStatus {
    match engine() {
        Some(log) => log.end_transfer(id, size, error),
        None => EndStatus::Ok,
    }
}

/// Writes every pending record and closes out unfinished transfers as
/// failed.
///
/// Returns [`FINALIZE_OK`], or [`FINALIZE_INCOMPLETE`] if the sink
/// rejected some records; those stay queued for a later call.
pub fn finalize() -> u32 {
    let Some(log) = engine() else {
        return FINALIZE_OK;
    };
    match log.finalize() {
        Ok(_) => FINALIZE_OK,
        Err(_) => FINALIZE_INCOMPLETE,
    }
}
