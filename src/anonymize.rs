//! Per-field anonymization of raw transfer data.
//!
//! This module provides:
//! - `FieldMode` / `IpMode`: the configured treatment of each field
//! - `IpMask`: network-prefix masking of dotted IPv4 addresses
//! - `FieldDigest`: the injected one-way digest (`Md5Digest` by default)
//! - `Resolver`: the injected hostname resolver (`SystemResolver` by default)
//! - `Anonymizer`: turns the raw arguments of a begin call into `RecordFields`
//!
//! Whatever the mode, every value leaves this module as a sanitized
//! [`LogField`](crate::LogField).

mod digest;
mod mask;
mod path;
mod pipeline;
mod resolver;

pub use digest::{FieldDigest, Md5Digest};
pub use mask::{mask_address, IpMask};
pub use path::{split_path, PathParts};
pub use pipeline::{AnonymizationPolicy, Anonymizer, FieldMode, IpMode, RecordFields, UNRESOLVED};
pub use resolver::{Resolver, StaticResolver, SystemResolver};
