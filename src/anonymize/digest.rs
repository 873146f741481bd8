//! One-way digests for hashed fields.

/// One-way digest used for fields configured as hashed.
///
/// The output is stored as an opaque token; nothing in this crate parses
/// or attempts to reverse it. Implementations must be deterministic.
pub trait FieldDigest: Send + Sync {
    /// Returns the digest of `data` as a fixed-length printable string.
    fn digest(&self, data: &[u8]) -> String;
}

/// MD5 digest rendered as 32 lowercase hex characters.
///
/// # Examples
///
/// ```
/// use dlog::{FieldDigest, Md5Digest};
///
/// assert_eq!(Md5Digest.digest(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Digest;

impl FieldDigest for Md5Digest {
    fn digest(&self, data: &[u8]) -> String {
        format!("{:x}", md5::compute(data))
    }
}
