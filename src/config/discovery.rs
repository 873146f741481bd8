use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{parse, Config};
use crate::error::{ConfigError, ConfigErrorKind};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "DLOG_CONFIG";
/// Per-user configuration file, relative to `$HOME`.
pub const HOME_CONFIG: &str = ".dlog.rc";
/// System-wide configuration file.
pub const SYSTEM_CONFIG: &str = "/etc/dlog/dlog.rc";

/// Lists the configuration locations in search order.
///
/// `$DLOG_CONFIG` first, then `$HOME/.dlog.rc`, then
/// `/etc/dlog/dlog.rc`. Unset variables contribute nothing.
pub fn candidates() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        paths.push(PathBuf::from(path));
    }
    if let Some(home) = env::var_os("HOME").filter(|p| !p.is_empty()) {
        paths.push(Path::new(&home).join(HOME_CONFIG));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG));
    paths
}

/// Returns the first candidate that exists as a file.
///
/// # Errors
///
/// Returns a [`ConfigErrorKind::NotFound`] error when no candidate exists.
pub fn discover() -> Result<PathBuf, ConfigError> {
    let searched = candidates();
    for path in &searched {
        if path.is_file() {
            debug!(target: "dlog", path = %path.display(), "configuration file found");
            return Ok(path.clone());
        }
    }
    let list: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
    Err(ConfigError::new(
        ConfigErrorKind::NotFound,
        format!("searched {}", list.join(", ")),
    ))
}

/// Reads and parses the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigErrorKind::Open`] if the file cannot be read and
/// [`ConfigErrorKind::Malformed`] if a line is invalid.
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        ConfigError::new(ConfigErrorKind::Open, format!("{}: {}", path.display(), e))
    })?;
    parse(&text)
}
