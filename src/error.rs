use std::fmt;

use crate::sink::SinkError;

/// Errors that can occur while setting up or driving a [`TransferLog`](crate::TransferLog).
#[derive(Debug)]
pub enum Error {
    /// The configuration could not be found, read or parsed.
    Config(ConfigError),
    /// The sink rejected a flush.
    Sink(SinkError),
    /// The configuration turns logging off.
    Disabled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "configuration error: {}", e),
            Error::Sink(e) => write!(f, "{}", e),
            Error::Disabled => write!(f, "logging is disabled by configuration"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Sink(e) => Some(e),
            Error::Disabled => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Error::Sink(e)
    }
}

/// A configuration file problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// What went wrong
    pub kind: ConfigErrorKind,
    /// 1-based line of a malformed entry
    pub line: Option<usize>,
    /// Human-readable detail
    pub message: String,
}

impl ConfigError {
    /// Creates an error without a line number.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            message: message.into(),
        }
    }

    /// Creates a malformed-entry error for `line`.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Malformed,
            line: Some(line),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} at line {}: {}", self.kind, line, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The kind of configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// No configuration file exists at any searched location
    NotFound,
    /// A configuration file exists but could not be read
    Open,
    /// A known key has an invalid value
    Malformed,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::NotFound => write!(f, "no configuration file"),
            ConfigErrorKind::Open => write!(f, "cannot open configuration file"),
            ConfigErrorKind::Malformed => write!(f, "malformed configuration"),
        }
    }
}

/// Outcome of [`initialize`](crate::initialize), with stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// Logging is set up (code 0)
    Ok,
    /// An earlier call already initialized the process (code 1)
    AlreadyInitialized,
    /// No configuration file was found; logging is off (code 2)
    NoConfig,
    /// The configuration file could not be opened; logging is off (code 3)
    OpenFailed,
    /// A configuration line was malformed; logging is off (code 4)
    Malformed,
}

impl InitStatus {
    /// Returns the numeric status code.
    pub fn code(self) -> u32 {
        match self {
            InitStatus::Ok => 0,
            InitStatus::AlreadyInitialized => 1,
            InitStatus::NoConfig => 2,
            InitStatus::OpenFailed => 3,
            InitStatus::Malformed => 4,
        }
    }

    /// Returns `true` for [`InitStatus::Ok`].
    pub fn is_ok(self) -> bool {
        self == InitStatus::Ok
    }
}

impl From<&ConfigError> for InitStatus {
    fn from(e: &ConfigError) -> Self {
        match e.kind {
            ConfigErrorKind::NotFound => InitStatus::NoConfig,
            ConfigErrorKind::Open => InitStatus::OpenFailed,
            ConfigErrorKind::Malformed => InitStatus::Malformed,
        }
    }
}

impl fmt::Display for InitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InitStatus::Ok => "initialized",
            InitStatus::AlreadyInitialized => "already initialized",
            InitStatus::NoConfig => "no configuration file found",
            InitStatus::OpenFailed => "configuration file could not be opened",
            InitStatus::Malformed => "malformed configuration line",
        };
        write!(f, "{} ({})", text, self.code())
    }
}

/// Outcome of ending a transfer, with stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndStatus {
    /// The transfer was recorded, or logging is off (code 0)
    Ok,
    /// The id was zero (code 1)
    ZeroId,
    /// No active transfer has this id (code 2)
    NotFound,
}

impl EndStatus {
    /// Returns the numeric status code.
    pub fn code(self) -> u32 {
        match self {
            EndStatus::Ok => 0,
            EndStatus::ZeroId => 1,
            EndStatus::NotFound => 2,
        }
    }

    /// Returns `true` for [`EndStatus::Ok`].
    pub fn is_ok(self) -> bool {
        self == EndStatus::Ok
    }
}

impl fmt::Display for EndStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndStatus::Ok => "ok",
            EndStatus::ZeroId => "transfer id is zero",
            EndStatus::NotFound => "transfer id not found",
        };
        write!(f, "{} ({})", text, self.code())
    }
}
