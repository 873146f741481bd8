use std::env;
use std::fmt;
use std::sync::Arc;

use super::{split_path, FieldDigest, IpMask, Resolver};
use crate::record::TransferRequest;
use crate::sanitizer::{FieldSanitizer, LogField};

/// Stored in an address field when resolution fails.
pub const UNRESOLVED: &str = "?no-IP?";

/// Treatment of a text field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldMode {
    /// Store the value verbatim.
    #[default]
    Include,
    /// Store an empty string.
    Suppress,
    /// Store the digest of the value.
    Hash,
}

/// Treatment of an address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpMode {
    /// Resolve to a dotted address, then apply the mask.
    Resolve(IpMask),
    /// Store an empty string.
    Suppress,
    /// Store the caller's string unresolved and unmasked.
    Raw,
    /// Store the digest of the caller's string.
    Hash,
}

impl Default for IpMode {
    fn default() -> Self {
        IpMode::Resolve(IpMask::FULL)
    }
}

/// Per-field anonymization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnonymizationPolicy {
    /// File name without directory or extension.
    pub file_name: FieldMode,
    /// File extension.
    pub file_ext: FieldMode,
    /// Directory of the source file.
    pub source_dir: FieldMode,
    /// Target path.
    pub target_dir: FieldMode,
    /// Numeric user id.
    pub user: FieldMode,
    /// Source host.
    pub source_ip: IpMode,
    /// Target host.
    pub target_ip: IpMode,
    /// Whether the annotation is stored.
    pub annotation: bool,
}

impl Default for AnonymizationPolicy {
    fn default() -> Self {
        Self {
            file_name: FieldMode::Include,
            file_ext: FieldMode::Include,
            source_dir: FieldMode::Include,
            target_dir: FieldMode::Include,
            user: FieldMode::Include,
            source_ip: IpMode::default(),
            target_ip: IpMode::default(),
            annotation: true,
        }
    }
}

/// The anonymized, sanitized string fields of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    /// File name without directory or extension.
    pub file_name: LogField,
    /// File extension without the dot.
    pub file_ext: LogField,
    /// Directory of the source file.
    pub source_dir: LogField,
    /// Target path.
    pub target_dir: LogField,
    /// User identifier.
    pub user: LogField,
    /// Source address.
    pub source_ip: LogField,
    /// Target address.
    pub target_ip: LogField,
    /// Free-text note.
    pub annotation: LogField,
}

/// Builds the logged form of a transfer's raw fields.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dlog::{AnonymizationPolicy, Anonymizer, Direction, FieldMode, Md5Digest,
///            StaticResolver, TransferRequest};
///
/// let policy = AnonymizationPolicy { user: FieldMode::Hash, ..Default::default() };
/// let anonymizer = Anonymizer::new(policy, Arc::new(Md5Digest), Arc::new(StaticResolver::new()));
///
/// let request = TransferRequest::new("/a/b/file.txt", Direction::Send).user_id(7);
/// let fields = anonymizer.fields(&request);
///
/// assert_eq!(fields.file_name.as_str(), "file");
/// assert_ne!(fields.user.as_str(), "7");
/// ```
#[derive(Clone)]
pub struct Anonymizer {
    policy: AnonymizationPolicy,
    digest: Arc<dyn FieldDigest>,
    resolver: Arc<dyn Resolver>,
}

impl Anonymizer {
    /// Creates a pipeline with explicit collaborators.
    pub fn new(
        policy: AnonymizationPolicy,
        digest: Arc<dyn FieldDigest>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        Self {
            policy,
            digest,
            resolver,
        }
    }

    /// Returns the active policy.
    pub fn policy(&self) -> &AnonymizationPolicy {
        &self.policy
    }

    /// Builds every string field of a record from a begin request.
    pub fn fields(&self, request: &TransferRequest<'_>) -> RecordFields {
        let parts = split_path(request.filename);
        let policy = &self.policy;

        let annotation = if policy.annotation {
            FieldSanitizer::annotation().clean(request.annotation)
        } else {
            LogField::empty()
        };

        RecordFields {
            file_name: self.text(policy.file_name, parts.name, FieldSanitizer::path()),
            file_ext: self.text(policy.file_ext, parts.ext, FieldSanitizer::path()),
            source_dir: self.source_dir(parts.dir),
            target_dir: self.text(policy.target_dir, request.target_path, FieldSanitizer::path()),
            user: self.text(
                policy.user,
                &request.user_id.to_string(),
                FieldSanitizer::user(),
            ),
            source_ip: self.address(policy.source_ip, request.source_host),
            target_ip: self.address(policy.target_ip, request.target_host),
            annotation,
        }
    }

    /// Applies a text mode to `raw`.
    pub fn text(&self, mode: FieldMode, raw: &str, sanitizer: FieldSanitizer) -> LogField {
        match mode {
            FieldMode::Include => sanitizer.clean(raw),
            FieldMode::Suppress => LogField::empty(),
            FieldMode::Hash => sanitizer.clean(&self.digest.digest(raw.as_bytes())),
        }
    }

    /// Applies an address mode to `host`.
    pub fn address(&self, mode: IpMode, host: &str) -> LogField {
        let sanitizer = FieldSanitizer::host();
        match mode {
            IpMode::Suppress => LogField::empty(),
            IpMode::Raw => sanitizer.clean(host),
            IpMode::Hash => sanitizer.clean(&self.digest.digest(host.as_bytes())),
            IpMode::Resolve(mask) => match self.resolver.resolve(host) {
                Some(addr) => sanitizer.clean(&mask.apply(addr).to_string()),
                None => sanitizer.clean(UNRESOLVED),
            },
        }
    }

    // A file name without a directory part was given relative to the
    // working directory.
    fn source_dir(&self, dir: &str) -> LogField {
        let mode = self.policy.source_dir;
        if dir.is_empty() && mode != FieldMode::Suppress {
            let cwd = env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            return self.text(mode, &cwd, FieldSanitizer::path());
        }
        self.text(mode, dir, FieldSanitizer::path())
    }
}

impl fmt::Debug for Anonymizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anonymizer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymize::{Md5Digest, StaticResolver};
    use crate::record::Direction;
    use std::net::Ipv4Addr;

    fn anonymizer(policy: AnonymizationPolicy) -> Anonymizer {
        let resolver = StaticResolver::new()
            .with_host("localhost", Ipv4Addr::new(192, 168, 1, 20))
            .with_host("files.example", Ipv4Addr::new(135, 65, 74, 31));
        Anonymizer::new(policy, Arc::new(Md5Digest), Arc::new(resolver))
    }

    fn request() -> TransferRequest<'static> {
        TransferRequest::new("/a/b/file.txt", Direction::Send)
            .size(100)
            .user_id(7)
            .source_host("localhost")
            .target("/out/", "10.0.0.5")
            .annotation("note")
    }

    #[test]
    fn verbatim_fields() {
        let fields = anonymizer(AnonymizationPolicy::default()).fields(&request());
        assert_eq!(fields.file_name.as_str(), "file");
        assert_eq!(fields.file_ext.as_str(), "txt");
        assert_eq!(fields.source_dir.as_str(), "/a/b/");
        assert_eq!(fields.target_dir.as_str(), "/out/");
        assert_eq!(fields.user.as_str(), "7");
        assert_eq!(fields.source_ip.as_str(), "192.168.1.20");
        assert_eq!(fields.target_ip.as_str(), "10.0.0.5");
        assert_eq!(fields.annotation.as_str(), "note");
    }

    #[test]
    fn suppressed_fields_are_empty() {
        let policy = AnonymizationPolicy {
            file_name: FieldMode::Suppress,
            file_ext: FieldMode::Suppress,
            source_dir: FieldMode::Suppress,
            target_dir: FieldMode::Suppress,
            user: FieldMode::Suppress,
            source_ip: IpMode::Suppress,
            target_ip: IpMode::Suppress,
            annotation: false,
        };
        let fields = anonymizer(policy).fields(&request());
        assert_eq!(fields, RecordFields::default());
    }

    #[test]
    fn hashed_fields_hide_raw_values() {
        let policy = AnonymizationPolicy {
            file_name: FieldMode::Hash,
            user: FieldMode::Hash,
            target_ip: IpMode::Hash,
            ..Default::default()
        };
        let fields = anonymizer(policy).fields(&request());
        assert_eq!(fields.file_name.as_str(), Md5Digest.digest(b"file"));
        assert_eq!(fields.user.as_str(), Md5Digest.digest(b"7"));
        assert_eq!(fields.target_ip.as_str(), Md5Digest.digest(b"10.0.0.5"));
        assert_eq!(fields.file_ext.as_str(), "txt");
    }

    #[test]
    fn raw_address_skips_resolution() {
        let policy = AnonymizationPolicy {
            source_ip: IpMode::Raw,
            ..Default::default()
        };
        let fields = anonymizer(policy).fields(&request());
        assert_eq!(fields.source_ip.as_str(), "localhost");
    }

    #[test]
    fn resolved_address_is_masked() {
        let policy = AnonymizationPolicy {
            target_ip: IpMode::Resolve(IpMask::new(0xFFFF_0000)),
            ..Default::default()
        };
        let req = request().target("/out/", "files.example");
        let fields = anonymizer(policy).fields(&req);
        assert_eq!(fields.target_ip.as_str(), "135.65.0.0");
    }

    #[test]
    fn unresolvable_host_uses_sentinel() {
        let req = request().target("/out/", "nowhere.invalid");
        let fields = anonymizer(AnonymizationPolicy::default()).fields(&req);
        assert_eq!(fields.target_ip.as_str(), UNRESOLVED);
    }

    #[test]
    fn missing_directory_falls_back_to_cwd() {
        let req = TransferRequest::new("plain.bin", Direction::Receive);
        let fields = anonymizer(AnonymizationPolicy::default()).fields(&req);
        let cwd = env::current_dir().unwrap().display().to_string();
        assert_eq!(fields.source_dir.as_str(), FieldSanitizer::path().clean(&cwd).as_str());
    }

    #[test]
    fn quotes_are_cleaned_in_every_mode() {
        let req = TransferRequest::new("/it's/a \"test\".txt", Direction::Send)
            .annotation("don't")
            .source_host("o'hara")
            .target("/x/", "y");
        let policy = AnonymizationPolicy {
            source_ip: IpMode::Raw,
            ..Default::default()
        };
        let fields = anonymizer(policy).fields(&req);
        assert_eq!(fields.source_dir.as_str(), "/it-s/");
        assert_eq!(fields.file_name.as_str(), "a -test-");
        assert_eq!(fields.annotation.as_str(), "don-t");
        assert_eq!(fields.source_ip.as_str(), "o-hara");
    }
}
