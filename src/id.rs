use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle pairing a `begin_transfer` call with its `end_transfer` call.
///
/// Identifiers are unique for the lifetime of the process and are never
/// zero; zero is reserved as the "no transfer" sentinel on the numeric
/// API surface. They are not persisted and restart at 1 with every process,
/// so they must not be used as a durable global key.
///
/// # Examples
///
/// ```
/// use dlog::IdGenerator;
///
/// let ids = IdGenerator::new();
/// let first = ids.next_id();
/// assert_eq!(first.get(), 1);
/// assert!(ids.next_id() > first);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransferId(NonZeroU64);

impl TransferId {
    /// Wraps a raw identifier, returning `None` for the reserved value `0`.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw numeric identifier.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl From<TransferId> for u64 {
    fn from(id: TransferId) -> Self {
        id.get()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing transfer identifiers starting at 1.
///
/// Safe to share between threads; two concurrent callers always receive
/// distinct identifiers.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    /// Creates a generator whose first identifier is 1.
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> TransferId {
        let mut raw = self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        // Only reachable after 2^64 issues; skip the reserved value.
        while raw == 0 {
            raw = self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        }
        TransferId(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Returns how many identifiers have been issued so far.
    pub fn issued(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn zero_is_not_a_transfer_id() {
        assert!(TransferId::new(0).is_none());
        assert_eq!(TransferId::new(7).map(TransferId::get), Some(7));
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let ids = IdGenerator::new();
        let issued: Vec<u64> = (0..5).map(|_| ids.next_id().get()).collect();
        assert_eq!(issued, vec![1, 2, 3, 4, 5]);
        assert_eq!(ids.issued(), 5);
    }

    #[test]
    fn concurrent_ids_are_distinct() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..500).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let batch = handle.join().expect("thread panicked");
            // Each thread observes its own ids in increasing order
            assert!(batch.windows(2).all(|w| w[0] < w[1]));
            for id in batch {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn display_is_the_raw_number() {
        let id = TransferId::new(42).unwrap();
        assert_eq!(id.to_string(), "42");
        assert_eq!(u64::from(id), 42);
    }
}
