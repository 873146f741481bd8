use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A 32-bit network mask applied to resolved IPv4 addresses.
///
/// Masking is a bitwise AND, so applying the same mask twice yields the
/// same address as applying it once.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use dlog::IpMask;
///
/// let mask: IpMask = "255.255.255.0".parse().unwrap();
/// let masked = mask.apply(Ipv4Addr::new(10, 1, 2, 3));
/// assert_eq!(masked, Ipv4Addr::new(10, 1, 2, 0));
/// assert_eq!(mask.apply(masked), masked);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpMask(u32);

impl IpMask {
    /// The all-ones mask; leaves addresses unchanged.
    pub const FULL: IpMask = IpMask(u32::MAX);

    /// Creates a mask from its 32-bit value.
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the 32-bit mask value.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Masks `addr`.
    pub fn apply(self, addr: Ipv4Addr) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(addr) & self.0)
    }
}

impl Default for IpMask {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<Ipv4Addr> for IpMask {
    fn from(addr: Ipv4Addr) -> Self {
        Self(u32::from(addr))
    }
}

impl FromStr for IpMask {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv4Addr>().map(IpMask::from)
    }
}

impl fmt::Display for IpMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self.0))
    }
}

/// Masks a dotted-decimal address string.
///
/// Returns `None` when `address` is not a dotted IPv4 address.
pub fn mask_address(address: &str, mask: IpMask) -> Option<String> {
    let addr = address.trim().parse::<Ipv4Addr>().ok()?;
    Some(mask.apply(addr).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mask_is_identity() {
        let addr = Ipv4Addr::new(135, 65, 74, 31);
        assert_eq!(IpMask::FULL.apply(addr), addr);
        assert_eq!(IpMask::default(), IpMask::FULL);
    }

    #[test]
    fn prefix_masks() {
        let mask: IpMask = "255.255.0.0".parse().unwrap();
        assert_eq!(mask.bits(), 0xFFFF_0000);
        assert_eq!(
            mask_address("135.65.74.31", mask).as_deref(),
            Some("135.65.0.0")
        );
    }

    #[test]
    fn masking_twice_is_idempotent() {
        let mask = IpMask::new(0xFFFF_FF00);
        let once = mask_address("192.168.7.77", mask).unwrap();
        let twice = mask_address(&once, mask).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!(mask_address("not-an-ip", IpMask::FULL).is_none());
        assert!(mask_address("10.0.0.300", IpMask::FULL).is_none());
        assert!("255.255.255".parse::<IpMask>().is_err());
    }

    #[test]
    fn display_is_dotted() {
        assert_eq!(IpMask::new(0xFFFF_FF00).to_string(), "255.255.255.0");
    }
}
