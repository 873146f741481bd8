use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

use tracing::debug;

/// Turns a hostname or address literal into an IPv4 address.
///
/// Resolution runs while a record is being built, never while a registry
/// lock is held. Implementations return `None` on any failure; the
/// pipeline then stores a sentinel instead of failing the transfer.
pub trait Resolver: Send + Sync {
    /// Resolves `host` to an IPv4 address.
    fn resolve(&self, host: &str) -> Option<Ipv4Addr>;
}

/// Resolver backed by the operating system's name service.
///
/// - Dotted IPv4 literals are returned as-is.
/// - `localhost` and the empty string resolve the machine's own hostname.
/// - Anything else is looked up; a non-loopback address is preferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    fn lookup(host: &str) -> Option<Ipv4Addr> {
        let addrs: Vec<Ipv4Addr> = match (host, 0u16).to_socket_addrs() {
            Ok(iter) => iter
                .filter_map(|addr| match addr {
                    SocketAddr::V4(v4) => Some(*v4.ip()),
                    SocketAddr::V6(_) => None,
                })
                .collect(),
            Err(e) => {
                debug!(target: "dlog", host, error = %e, "hostname lookup failed");
                return None;
            }
        };
        addrs
            .iter()
            .find(|ip| !ip.is_loopback())
            .or_else(|| addrs.last())
            .copied()
    }

    fn local_address() -> Option<Ipv4Addr> {
        let name = nix::unistd::gethostname().ok()?;
        Self::lookup(name.to_str()?)
    }
}

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> Option<Ipv4Addr> {
        if let Ok(literal) = host.parse::<Ipv4Addr>() {
            return Some(literal);
        }
        if host.is_empty() || host == "localhost" {
            return Self::local_address();
        }
        Self::lookup(host)
    }
}

/// Resolver answering from a fixed table.
///
/// Dotted literals resolve to themselves; names not in the table fail.
/// Useful where lookups must be deterministic or must not touch the
/// network.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use dlog::{Resolver, StaticResolver};
///
/// let resolver = StaticResolver::new().with_host("files.example", Ipv4Addr::new(10, 0, 0, 9));
/// assert_eq!(resolver.resolve("files.example"), Some(Ipv4Addr::new(10, 0, 0, 9)));
/// assert_eq!(resolver.resolve("10.1.1.1"), Some(Ipv4Addr::new(10, 1, 1, 1)));
/// assert_eq!(resolver.resolve("elsewhere"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Ipv4Addr>,
}

impl StaticResolver {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn with_host(mut self, host: impl Into<String>, addr: Ipv4Addr) -> Self {
        self.hosts.insert(host.into(), addr);
        self
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, host: &str) -> Option<Ipv4Addr> {
        host.parse::<Ipv4Addr>()
            .ok()
            .or_else(|| self.hosts.get(host).copied())
    }
}
