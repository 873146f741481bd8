use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::process;

use tracing::debug;

use super::{Sink, SinkBatch, SinkError, SinkErrorKind};

/// Local syslog socket.
pub const DEFAULT_SYSLOG_SOCKET: &str = "/dev/log";

const CONSOLE: &str = "/dev/console";

/// `openlog`-style option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyslogOptions(u32);

impl SyslogOptions {
    /// Include the process id in each message tag.
    pub const PID: SyslogOptions = SyslogOptions(0x01);
    /// Write to the system console if the syslog socket is unreachable.
    pub const CONS: SyslogOptions = SyslogOptions(0x02);
    /// Delay connecting until the first message.
    pub const ODELAY: SyslogOptions = SyslogOptions(0x04);
    /// Connect immediately.
    pub const NDELAY: SyslogOptions = SyslogOptions(0x08);
    /// Do not wait for child processes.
    pub const NOWAIT: SyslogOptions = SyslogOptions(0x10);
    /// Mirror every message to standard error.
    pub const PERROR: SyslogOptions = SyslogOptions(0x20);

    const NAMES: [(&'static str, SyslogOptions); 6] = [
        ("LOG_PID", Self::PID),
        ("LOG_CONS", Self::CONS),
        ("LOG_ODELAY", Self::ODELAY),
        ("LOG_NDELAY", Self::NDELAY),
        ("LOG_NOWAIT", Self::NOWAIT),
        ("LOG_PERROR", Self::PERROR),
    ];

    /// No options.
    pub const fn empty() -> Self {
        SyslogOptions(0)
    }

    /// Creates options from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        SyslogOptions(bits)
    }

    /// Returns the raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Looks up a single option by its `LOG_*` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, opt)| *opt)
    }

    /// Returns `true` if every bit of `other` is set.
    pub fn contains(self, other: SyslogOptions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no option is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for SyslogOptions {
    fn default() -> Self {
        Self::PID
    }
}

impl std::ops::BitOr for SyslogOptions {
    type Output = SyslogOptions;

    fn bitor(self, rhs: Self) -> Self::Output {
        SyslogOptions(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SyslogOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Syslog facility, stored as its already-shifted code (`LOG_USER` is 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Facility(u8);

impl Facility {
    /// Kernel messages.
    pub const KERN: Facility = Facility(0);
    /// Generic user-level messages.
    pub const USER: Facility = Facility(8);
    /// Mail system.
    pub const MAIL: Facility = Facility(16);
    /// System daemons.
    pub const DAEMON: Facility = Facility(24);
    /// Security/authorization messages.
    pub const AUTH: Facility = Facility(32);
    /// Messages generated by syslogd.
    pub const SYSLOG: Facility = Facility(40);
    /// Line printer subsystem.
    pub const LPR: Facility = Facility(48);
    /// Network news subsystem.
    pub const NEWS: Facility = Facility(56);
    /// UUCP subsystem.
    pub const UUCP: Facility = Facility(64);
    /// Clock daemon.
    pub const CRON: Facility = Facility(72);
    /// Private security/authorization messages.
    pub const AUTHPRIV: Facility = Facility(80);
    /// FTP daemon.
    pub const FTP: Facility = Facility(88);

    const NAMES: [(&'static str, u8); 20] = [
        ("LOG_KERN", 0),
        ("LOG_USER", 8),
        ("LOG_MAIL", 16),
        ("LOG_DAEMON", 24),
        ("LOG_AUTH", 32),
        ("LOG_SYSLOG", 40),
        ("LOG_LPR", 48),
        ("LOG_NEWS", 56),
        ("LOG_UUCP", 64),
        ("LOG_CRON", 72),
        ("LOG_AUTHPRIV", 80),
        ("LOG_FTP", 88),
        ("LOG_LOCAL0", 128),
        ("LOG_LOCAL1", 136),
        ("LOG_LOCAL2", 144),
        ("LOG_LOCAL3", 152),
        ("LOG_LOCAL4", 160),
        ("LOG_LOCAL5", 168),
        ("LOG_LOCAL6", 176),
        ("LOG_LOCAL7", 184),
    ];

    /// Local use facility `n` (0..=7).
    pub fn local(n: u8) -> Option<Self> {
        (n < 8).then(|| Facility(128 + n * 8))
    }

    /// Creates a facility from its raw code.
    pub const fn from_code(code: u8) -> Self {
        Facility(code)
    }

    /// Looks up a facility by its `LOG_*` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| Facility(*code))
    }

    /// Returns the raw code.
    pub fn code(self) -> u8 {
        self.0
    }
}

impl Default for Facility {
    fn default() -> Self {
        Self::USER
    }
}

/// Syslog severity, 0 (emergency) to 7 (debug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    /// System is unusable.
    pub const EMERG: Level = Level(0);
    /// Action must be taken immediately.
    pub const ALERT: Level = Level(1);
    /// Critical conditions.
    pub const CRIT: Level = Level(2);
    /// Error conditions.
    pub const ERR: Level = Level(3);
    /// Warning conditions.
    pub const WARNING: Level = Level(4);
    /// Normal but significant condition.
    pub const NOTICE: Level = Level(5);
    /// Informational.
    pub const INFO: Level = Level(6);
    /// Debug-level messages.
    pub const DEBUG: Level = Level(7);

    const NAMES: [&'static str; 8] = [
        "LOG_EMERG",
        "LOG_ALERT",
        "LOG_CRIT",
        "LOG_ERR",
        "LOG_WARNING",
        "LOG_NOTICE",
        "LOG_INFO",
        "LOG_DEBUG",
    ];

    /// Creates a level from its numeric value.
    pub fn from_code(code: u8) -> Option<Self> {
        (code <= 7).then_some(Level(code))
    }

    /// Looks up a level by its `LOG_*` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|code| Level(code as u8))
    }

    /// Returns the numeric value.
    pub fn code(self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::NAMES[usize::from(self.0 & 7)])
    }
}

/// Sends audit lines to the local syslog daemon.
///
/// Each line becomes one datagram `<PRI>Mmm dd hh:mm:ss TAG: line` where
/// `PRI` is facility plus level and `TAG` is the ident, followed by
/// `[pid]` under [`SyslogOptions::PID`]. The connection is opened and
/// closed around each batch. No file lock is involved.
///
/// # Examples
///
/// ```
/// use dlog::{Facility, Level, SyslogOptions, SyslogSink};
///
/// let sink = SyslogSink::new("DLOG")
///     .with_facility(Facility::local(3).unwrap())
///     .with_level(Level::NOTICE)
///     .with_options(SyslogOptions::PID | SyslogOptions::CONS);
/// assert_eq!(sink.priority(), 152 + 5);
/// ```
#[derive(Debug, Clone)]
pub struct SyslogSink {
    ident: String,
    options: SyslogOptions,
    facility: Facility,
    level: Level,
    socket_path: PathBuf,
}

impl SyslogSink {
    /// Creates a sink tagging messages with `ident`.
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            options: SyslogOptions::default(),
            facility: Facility::default(),
            level: Level::default(),
            socket_path: PathBuf::from(DEFAULT_SYSLOG_SOCKET),
        }
    }

    /// Sets the option flags.
    pub fn with_options(mut self, options: SyslogOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the facility.
    pub fn with_facility(mut self, facility: Facility) -> Self {
        self.facility = facility;
        self
    }

    /// Sets the severity.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sends to a socket other than `/dev/log`.
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Returns the `PRI` value of every message.
    pub fn priority(&self) -> u16 {
        u16::from(self.facility.code()) | u16::from(self.level.code())
    }

    fn tag(&self) -> String {
        if self.options.contains(SyslogOptions::PID) {
            format!("{}[{}]", self.ident, process::id())
        } else {
            self.ident.clone()
        }
    }

    fn connect(&self) -> io::Result<UnixDatagram> {
        let socket = UnixDatagram::unbound()?;
        socket.connect(&self.socket_path)?;
        Ok(socket)
    }
}

impl Sink for SyslogSink {
    fn open(&self) -> Result<Box<dyn SinkBatch + '_>, SinkError> {
        let socket = match self.connect() {
            Ok(socket) => Some(socket),
            Err(e) if self.options.contains(SyslogOptions::CONS) => {
                debug!(target: "dlog", error = %e, "syslog unreachable, using console");
                None
            }
            Err(e) => {
                return Err(SinkError::with_message(
                    SinkErrorKind::Unavailable,
                    format!("{}: {}", self.socket_path.display(), e),
                ));
            }
        };
        Ok(Box::new(SyslogBatch {
            sink: self,
            tag: self.tag(),
            socket,
            console: None,
        }))
    }
}

struct SyslogBatch<'a> {
    sink: &'a SyslogSink,
    tag: String,
    socket: Option<UnixDatagram>,
    console: Option<File>,
}

impl SyslogBatch<'_> {
    fn to_console(&mut self, line: &str) -> Result<(), SinkError> {
        if self.console.is_none() {
            let console = OpenOptions::new().write(true).open(CONSOLE).map_err(|e| {
                SinkError::with_message(SinkErrorKind::Unavailable, format!("{}: {}", CONSOLE, e))
            })?;
            self.console = Some(console);
        }
        if let Some(console) = self.console.as_mut() {
            writeln!(console, "{}: {}", self.tag, line)?;
        }
        Ok(())
    }
}

impl SinkBatch for SyslogBatch<'_> {
    fn append(&mut self, line: &str) -> Result<(), SinkError> {
        if self.sink.options.contains(SyslogOptions::PERROR) {
            let _ = writeln!(io::stderr(), "{}: {}", self.tag, line);
        }

        let timestamp = chrono::Local::now().format("%b %e %H:%M:%S");
        let message = format!("<{}>{} {}: {}", self.sink.priority(), timestamp, self.tag, line);

        let sent = match &self.socket {
            Some(socket) => socket.send(message.as_bytes()).map(|_| ()),
            None => Err(io::Error::from(io::ErrorKind::NotConnected)),
        };
        match sent {
            Ok(()) => Ok(()),
            Err(_) if self.sink.options.contains(SyslogOptions::CONS) => self.to_console(line),
            Err(e) => Err(SinkError::with_message(
                SinkErrorKind::Unavailable,
                format!("syslog send: {}", e),
            )),
        }
    }

    fn commit(self: Box<Self>) -> Result<(), SinkError> {
        Ok(())
    }

    fn buffers_until_commit(&self) -> bool {
        false
    }
}
