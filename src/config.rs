//! The immutable configuration snapshot.
//!
//! A [`Config`] is built once, either from a `key=value` file found by
//! [`discover`] and read by [`load`] / [`parse`], or in code through the
//! `with_*` builder methods. After that it is only read.

mod discovery;
mod parser;

use std::path::{Path, PathBuf};

pub use discovery::{candidates, discover, load, CONFIG_ENV, HOME_CONFIG, SYSTEM_CONFIG};
pub use parser::parse;

use crate::anonymize::{AnonymizationPolicy, FieldMode, IpMode};
use crate::sink::{Facility, FileSink, Level, Sink, SyslogOptions, SyslogSink};

/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "/var/log/datalog.log";
/// Default syslog ident.
pub const DEFAULT_IDENT: &str = "DLOG";
/// Default number of completions between automatic flushes.
pub const DEFAULT_BATCH_SIZE: u8 = 5;

/// Where audit lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLocation {
    /// Append to a locked file.
    #[default]
    File,
    /// Send to the local syslog daemon.
    Syslog,
}

/// Resolved engine options.
///
/// # Examples
///
/// ```
/// use dlog::{Config, FieldMode, LogLocation};
///
/// let config = Config::default()
///     .with_location(LogLocation::Syslog)
///     .with_ident("SCP")
///     .with_batch_size(10)
///     .with_user(FieldMode::Hash);
///
/// assert!(config.enabled());
/// assert_eq!(config.batch_size(), 10);
/// assert_eq!(config.policy().user, FieldMode::Hash);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    enabled: bool,
    location: LogLocation,
    filename: PathBuf,
    ident: String,
    options: SyslogOptions,
    facility: Facility,
    level: Level,
    batch_size: u8,
    policy: AnonymizationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            location: LogLocation::File,
            filename: PathBuf::from(DEFAULT_LOG_FILE),
            ident: DEFAULT_IDENT.to_string(),
            options: SyslogOptions::default(),
            facility: Facility::default(),
            level: Level::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            policy: AnonymizationPolicy::default(),
        }
    }
}

impl Config {
    /// Turns logging on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Selects the sink.
    pub fn with_location(mut self, location: LogLocation) -> Self {
        self.location = location;
        self
    }

    /// Sets the log file used with [`LogLocation::File`].
    pub fn with_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.filename = path.into();
        self
    }

    /// Sets the syslog ident.
    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = ident.into();
        self
    }

    /// Sets the syslog option flags.
    pub fn with_options(mut self, options: SyslogOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the syslog facility.
    pub fn with_facility(mut self, facility: Facility) -> Self {
        self.facility = facility;
        self
    }

    /// Sets the syslog level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the flush threshold; `0` is treated as `1`.
    pub fn with_batch_size(mut self, batch_size: u8) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Replaces the whole anonymization policy.
    pub fn with_policy(mut self, policy: AnonymizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the file name mode.
    pub fn with_file_name(mut self, mode: FieldMode) -> Self {
        self.policy.file_name = mode;
        self
    }

    /// Sets the extension mode.
    pub fn with_file_ext(mut self, mode: FieldMode) -> Self {
        self.policy.file_ext = mode;
        self
    }

    /// Sets the source directory mode.
    pub fn with_source_dir(mut self, mode: FieldMode) -> Self {
        self.policy.source_dir = mode;
        self
    }

    /// Sets the target directory mode.
    pub fn with_target_dir(mut self, mode: FieldMode) -> Self {
        self.policy.target_dir = mode;
        self
    }

    /// Sets the user id mode.
    pub fn with_user(mut self, mode: FieldMode) -> Self {
        self.policy.user = mode;
        self
    }

    /// Sets the source address mode.
    pub fn with_source_ip(mut self, mode: IpMode) -> Self {
        self.policy.source_ip = mode;
        self
    }

    /// Sets the target address mode.
    pub fn with_target_ip(mut self, mode: IpMode) -> Self {
        self.policy.target_ip = mode;
        self
    }

    /// Keeps or drops the annotation.
    pub fn with_annotation(mut self, enabled: bool) -> Self {
        self.policy.annotation = enabled;
        self
    }

    /// Returns `true` unless logging is turned off.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the selected sink.
    pub fn location(&self) -> LogLocation {
        self.location
    }

    /// Returns the log file path.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Returns the syslog ident.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Returns the syslog option flags.
    pub fn options(&self) -> SyslogOptions {
        self.options
    }

    /// Returns the syslog facility.
    pub fn facility(&self) -> Facility {
        self.facility
    }

    /// Returns the syslog level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the flush threshold, at least `1`.
    pub fn batch_size(&self) -> u8 {
        self.batch_size
    }

    /// Returns the anonymization policy.
    pub fn policy(&self) -> &AnonymizationPolicy {
        &self.policy
    }

    /// Builds the sink this configuration selects.
    pub fn sink(&self) -> Box<dyn Sink> {
        match self.location {
            LogLocation::File => Box::new(FileSink::new(&self.filename)),
            LogLocation::Syslog => Box::new(
                SyslogSink::new(&self.ident)
                    .with_options(self.options)
                    .with_facility(self.facility)
                    .with_level(self.level),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymize::IpMask;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.enabled());
        assert_eq!(config.location(), LogLocation::File);
        assert_eq!(config.filename(), Path::new("/var/log/datalog.log"));
        assert_eq!(config.ident(), "DLOG");
        assert_eq!(config.options(), SyslogOptions::PID);
        assert_eq!(config.facility(), Facility::USER);
        assert_eq!(config.level(), Level::INFO);
        assert_eq!(config.batch_size(), 5);
        assert_eq!(config.policy(), &AnonymizationPolicy::default());
    }

    #[test]
    fn batch_size_is_at_least_one() {
        assert_eq!(Config::default().with_batch_size(0).batch_size(), 1);
    }

    #[test]
    fn builder_sets_policy_fields() {
        let mask = IpMask::new(0xFFFF_FF00);
        let config = Config::default()
            .with_file_name(FieldMode::Hash)
            .with_file_ext(FieldMode::Suppress)
            .with_source_ip(IpMode::Resolve(mask))
            .with_target_ip(IpMode::Raw)
            .with_annotation(false);

        let policy = config.policy();
        assert_eq!(policy.file_name, FieldMode::Hash);
        assert_eq!(policy.file_ext, FieldMode::Suppress);
        assert_eq!(policy.source_ip, IpMode::Resolve(mask));
        assert_eq!(policy.target_ip, IpMode::Raw);
        assert!(!policy.annotation);
    }
}
