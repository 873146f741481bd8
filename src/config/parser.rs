use std::path::PathBuf;

use super::{Config, LogLocation};
use crate::anonymize::{FieldMode, IpMask, IpMode};
use crate::error::ConfigError;
use crate::sink::{Facility, Level, SyslogOptions};

/// Parses the `key=value` configuration format.
///
/// The key is the first whitespace-delimited token before the first `=`;
/// the value is the first token after it. Lines starting with `#`, blank
/// lines and lines without `=` are skipped, as are unknown keys. Parsing
/// stops at the first invalid value of a known key.
///
/// # Errors
///
/// Returns a [`ConfigErrorKind::Malformed`](crate::ConfigErrorKind::Malformed)
/// error carrying the 1-based line number of the first bad entry.
///
/// # Examples
///
/// ```
/// use dlog::{config, FieldMode, LogLocation};
///
/// let config = config::parse(
///     "# audit settings\n\
///      LoggingLocation = syslog\n\
///      LogBatchSize = 20\n\
///      LogUserID = md5\n",
/// ).unwrap();
///
/// assert_eq!(config.location(), LogLocation::Syslog);
/// assert_eq!(config.batch_size(), 20);
/// assert_eq!(config.policy().user, FieldMode::Hash);
///
/// let err = config::parse("DoLogging = maybe\n").unwrap_err();
/// assert_eq!(err.line, Some(1));
/// ```
pub fn parse(text: &str) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    for (index, line) in text.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let Some((key_part, value_part)) = line.split_once('=') else {
            continue;
        };
        let Some(key) = key_part.split_whitespace().next() else {
            continue;
        };
        let value = value_part.split_whitespace().next().unwrap_or("");

        apply(&mut config, key, value, value_part)
            .map_err(|message| ConfigError::malformed(index + 1, message))?;
    }

    Ok(config)
}

fn apply(config: &mut Config, key: &str, value: &str, rest: &str) -> Result<(), String> {
    let policy = &mut config.policy;
    match key {
        "DoLogging" => config.enabled = yes_no(key, value)?,
        "LoggingLocation" => {
            config.location = match value {
                "file" => LogLocation::File,
                "syslog" => LogLocation::Syslog,
                _ => return Err(invalid(key, value, "file or syslog")),
            }
        }
        "LogFilename" => config.filename = PathBuf::from(value),
        "LogIdent" => config.ident = value.to_string(),
        "LogOption" => config.options = syslog_options(rest)?,
        "LogFacility" => {
            config.facility = match number(value) {
                Some(code) if code <= 255 => Facility::from_code(code as u8),
                _ => Facility::from_name(value)
                    .ok_or_else(|| invalid(key, value, "a LOG_* facility or 0..255"))?,
            }
        }
        "LogLevel" => {
            config.level = number(value)
                .and_then(|code| u8::try_from(code).ok())
                .and_then(Level::from_code)
                .or_else(|| Level::from_name(value))
                .ok_or_else(|| invalid(key, value, "a LOG_* level or 0..7"))?;
        }
        "LogBatchSize" => {
            config.batch_size = match number(value) {
                Some(n @ 1..=255) => n as u8,
                _ => return Err(invalid(key, value, "1..255")),
            }
        }
        "LogSourcename" => policy.file_name = field_mode(key, value)?,
        "LogExtension" => policy.file_ext = field_mode(key, value)?,
        "LogSourcePath" => policy.source_dir = field_mode(key, value)?,
        "LogTargetPath" => policy.target_dir = field_mode(key, value)?,
        "LogUserID" => policy.user = field_mode(key, value)?,
        "LogSourceIP" => policy.source_ip = ip_mode(key, value)?,
        "LogTargetIP" => policy.target_ip = ip_mode(key, value)?,
        "LogAnnotation" => policy.annotation = yes_no(key, value)?,
        _ => {}
    }
    Ok(())
}

fn invalid(key: &str, value: &str, expected: &str) -> String {
    format!("{} = '{}', expected {}", key, value, expected)
}

// Whole-token decimal, like strtol with a full-match check.
fn number(value: &str) -> Option<u32> {
    value.parse().ok()
}

fn yes_no(key: &str, value: &str) -> Result<bool, String> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(invalid(key, value, "yes or no")),
    }
}

fn field_mode(key: &str, value: &str) -> Result<FieldMode, String> {
    match value {
        "yes" => Ok(FieldMode::Include),
        "no" => Ok(FieldMode::Suppress),
        "md5" => Ok(FieldMode::Hash),
        _ => Err(invalid(key, value, "yes, no or md5")),
    }
}

fn ip_mode(key: &str, value: &str) -> Result<IpMode, String> {
    match value {
        "yes" => Ok(IpMode::Resolve(IpMask::FULL)),
        "no" => Ok(IpMode::Suppress),
        "raw" => Ok(IpMode::Raw),
        "md5" => Ok(IpMode::Hash),
        mask => mask
            .parse::<IpMask>()
            .map(IpMode::Resolve)
            .map_err(|_| invalid(key, value, "yes, no, raw, md5 or a dotted mask")),
    }
}

// Either one number in 1..=63 or names separated by spaces or '|'.
fn syslog_options(rest: &str) -> Result<SyslogOptions, String> {
    let mut tokens = rest
        .split(|c: char| c == '|' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .peekable();

    if let Some(bits) = tokens.peek().and_then(|t| number(t)) {
        if (1..64).contains(&bits) {
            return Ok(SyslogOptions::from_bits(bits));
        }
    }

    let mut options = SyslogOptions::empty();
    for token in tokens {
        options |= SyslogOptions::from_name(token)
            .ok_or_else(|| invalid("LogOption", token, "LOG_* option names or 1..63"))?;
    }
    if options.is_empty() {
        return Err(invalid("LogOption", rest.trim(), "at least one option"));
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigErrorKind;
    use std::path::Path;

    #[test]
    fn empty_input_gives_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn comments_blank_and_bare_lines_are_skipped() {
        let text = "# comment = ignored\n\n   \nno equals sign here\nLogIdent=SCP\n";
        assert_eq!(parse(text).unwrap().ident(), "SCP");
    }

    #[test]
    fn only_first_token_is_used() {
        let config = parse("  LogFilename   =  /tmp/x.log trailing words\n").unwrap();
        assert_eq!(config.filename(), Path::new("/tmp/x.log"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert!(parse("Colour=blue\nDoLogging=no\n").is_ok());
    }

    #[test]
    fn logging_switch() {
        assert!(!parse("DoLogging=no").unwrap().enabled());
        assert!(parse("DoLogging=yes").unwrap().enabled());
    }

    #[test]
    fn first_error_aborts_with_line_number() {
        let err = parse("LogIdent=A\nLoggingLocation=tape\nDoLogging=maybe\n").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Malformed);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn text_field_modes() {
        let config = parse(
            "LogSourcename=md5\nLogExtension=no\nLogSourcePath=yes\n\
             LogTargetPath=md5\nLogUserID=no\n",
        )
        .unwrap();
        let policy = config.policy();
        assert_eq!(policy.file_name, FieldMode::Hash);
        assert_eq!(policy.file_ext, FieldMode::Suppress);
        assert_eq!(policy.source_dir, FieldMode::Include);
        assert_eq!(policy.target_dir, FieldMode::Hash);
        assert_eq!(policy.user, FieldMode::Suppress);
        assert!(parse("LogUserID=maybe").is_err());
    }

    #[test]
    fn ip_modes() {
        let config = parse("LogSourceIP=255.255.0.0\nLogTargetIP=raw\n").unwrap();
        assert_eq!(
            config.policy().source_ip,
            IpMode::Resolve(IpMask::new(0xFFFF_0000))
        );
        assert_eq!(config.policy().target_ip, IpMode::Raw);

        let config = parse("LogSourceIP=no\nLogTargetIP=md5\n").unwrap();
        assert_eq!(config.policy().source_ip, IpMode::Suppress);
        assert_eq!(config.policy().target_ip, IpMode::Hash);

        assert!(parse("LogSourceIP=255.255").is_err());
    }

    #[test]
    fn batch_size_bounds() {
        assert_eq!(parse("LogBatchSize=1").unwrap().batch_size(), 1);
        assert_eq!(parse("LogBatchSize=255").unwrap().batch_size(), 255);
        assert!(parse("LogBatchSize=0").is_err());
        assert!(parse("LogBatchSize=256").is_err());
        assert!(parse("LogBatchSize=ten").is_err());
    }

    #[test]
    fn syslog_option_names() {
        let config = parse("LogOption = LOG_PID | LOG_CONS LOG_PERROR\n").unwrap();
        let options = config.options();
        assert!(options.contains(SyslogOptions::PID));
        assert!(options.contains(SyslogOptions::CONS));
        assert!(options.contains(SyslogOptions::PERROR));
        assert!(!options.contains(SyslogOptions::NDELAY));
    }

    #[test]
    fn syslog_option_number() {
        assert_eq!(parse("LogOption=9").unwrap().options().bits(), 9);
        assert!(parse("LogOption=LOG_NOPE").is_err());
        assert!(parse("LogOption=").is_err());
    }

    #[test]
    fn facility_by_name_or_number() {
        assert_eq!(parse("LogFacility=LOG_LOCAL2").unwrap().facility().code(), 144);
        assert_eq!(parse("LogFacility=88").unwrap().facility(), Facility::FTP);
        assert!(parse("LogFacility=300").is_err());
        assert!(parse("LogFacility=LOG_NOWHERE").is_err());
    }

    #[test]
    fn level_by_name_or_number() {
        assert_eq!(parse("LogLevel=LOG_CRIT").unwrap().level(), Level::CRIT);
        assert_eq!(parse("LogLevel=3").unwrap().level(), Level::ERR);
        assert!(parse("LogLevel=8").is_err());
    }

    #[test]
    fn annotation_switch() {
        assert!(!parse("LogAnnotation=no").unwrap().policy().annotation);
    }
}
