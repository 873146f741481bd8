use std::fmt;

use crate::record::SessionId;

/// Diagnostics logger for one engine instance.
///
/// `EngineLog` covers the engine's own operational messages (flush
/// failures, rejected calls, finalize summaries). Audit records never go
/// through it; they go to the configured sink.
///
/// Every event carries the application name and session id as fields and
/// uses the `dlog` target, so hosts can filter engine diagnostics with
/// their own `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct EngineLog {
    app: String,
    session: SessionId,
}

impl EngineLog {
    /// Creates a logger for `app` running as `session`.
    pub fn new(app: impl Into<String>, session: SessionId) -> Self {
        Self {
            app: app.into(),
            session,
        }
    }

    /// Returns the application name.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Returns the session id.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Logs an info-level message.
    ///
    /// ```
    /// # use dlog::{EngineLog, SessionId};
    /// let log = EngineLog::new("scp", SessionId::from_raw(42));
    /// log.info(format_args!("{} transfers written", 5));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "dlog", app = %self.app, session = %self.session, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "dlog", app = %self.app, session = %self.session, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "dlog", app = %self.app, session = %self.session, "{}", args);
    }
}
