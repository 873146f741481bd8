//! In-memory registries of active and ended transfers.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::id::TransferId;
use crate::record::TransferRecord;

/// Selects one of the two registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Begun, not yet ended.
    Active,
    /// Ended, not yet written.
    Ended,
}

#[derive(Debug, Default)]
struct Collections {
    active: HashMap<TransferId, TransferRecord>,
    // Completion order; drained front to back.
    ended: VecDeque<TransferRecord>,
}

/// The active and ended collections behind one lock.
///
/// The lock is held only while records are moved in or out; records are
/// built and formatted outside it. A record handed out by any removing
/// method is owned by the caller and no longer referenced here.
///
/// # Examples
///
/// ```
/// use dlog::{Collection, Registry};
///
/// let registry = Registry::new();
/// assert!(registry.is_empty(Collection::Active));
/// assert!(registry.remove_by_id(Collection::Ended, 0).is_none());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Collections>,
}

impl Registry {
    /// Creates empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `record` to `collection`.
    pub fn insert(&self, collection: Collection, record: TransferRecord) {
        let mut inner = self.lock();
        match collection {
            Collection::Active => {
                inner.active.insert(record.id(), record);
            }
            Collection::Ended => inner.ended.push_back(record),
        }
    }

    /// Removes the record with the given raw id.
    ///
    /// A nonzero `id` removes exactly that record, if present. An `id` of
    /// `0` removes an arbitrary record, which is how drains proceed; `None`
    /// then means the collection is empty.
    pub fn remove_by_id(&self, collection: Collection, id: u64) -> Option<TransferRecord> {
        match TransferId::new(id) {
            Some(id) => self.remove(collection, id),
            None => self.take_any(collection),
        }
    }

    /// Removes the record with `id`.
    pub fn remove(&self, collection: Collection, id: TransferId) -> Option<TransferRecord> {
        let mut inner = self.lock();
        match collection {
            Collection::Active => inner.active.remove(&id),
            Collection::Ended => {
                let pos = inner.ended.iter().position(|r| r.id() == id)?;
                inner.ended.remove(pos)
            }
        }
    }

    /// Removes one record, the oldest one for the ended collection.
    pub fn take_any(&self, collection: Collection) -> Option<TransferRecord> {
        let mut inner = self.lock();
        match collection {
            Collection::Active => {
                let id = *inner.active.keys().next()?;
                inner.active.remove(&id)
            }
            Collection::Ended => inner.ended.pop_front(),
        }
    }

    /// Moves the active record with `id` to the back of the ended
    /// collection, passing it through `finish` on the way.
    ///
    /// The move happens in one critical section, so the record is never
    /// absent from both collections. Returns `false` if no active record
    /// has `id`.
    pub fn complete(&self, id: TransferId, finish: impl FnOnce(&mut TransferRecord)) -> bool {
        let mut inner = self.lock();
        let Some(mut record) = inner.active.remove(&id) else {
            return false;
        };
        finish(&mut record);
        inner.ended.push_back(record);
        true
    }

    /// Removes every record of `collection` in one critical section.
    pub fn drain(&self, collection: Collection) -> Vec<TransferRecord> {
        let mut inner = self.lock();
        match collection {
            Collection::Active => inner.active.drain().map(|(_, r)| r).collect(),
            Collection::Ended => inner.ended.drain(..).collect(),
        }
    }

    /// Puts records back after a failed write.
    ///
    /// Restored ended records go ahead of anything that completed in the
    /// meantime, keeping their original order.
    pub fn restore(&self, collection: Collection, records: Vec<TransferRecord>) {
        let mut inner = self.lock();
        match collection {
            Collection::Active => {
                for record in records {
                    inner.active.insert(record.id(), record);
                }
            }
            Collection::Ended => {
                for record in records.into_iter().rev() {
                    inner.ended.push_front(record);
                }
            }
        }
    }

    /// Snapshots up to `limit` ids of active transfers.
    pub fn active_ids(&self, limit: usize) -> Vec<TransferId> {
        self.lock().active.keys().take(limit).copied().collect()
    }

    /// Returns the number of records in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        let inner = self.lock();
        match collection {
            Collection::Active => inner.active.len(),
            Collection::Ended => inner.ended.len(),
        }
    }

    /// Returns `true` if `collection` holds no records.
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// Returns `true` if `collection` holds a record with `id`.
    pub fn contains(&self, collection: Collection, id: TransferId) -> bool {
        let inner = self.lock();
        match collection {
            Collection::Active => inner.active.contains_key(&id),
            Collection::Ended => inner.ended.iter().any(|r| r.id() == id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymize::RecordFields;
    use crate::record::{Direction, SessionId};
    use std::sync::Arc;
    use std::thread;

    fn record(id: u64) -> TransferRecord {
        TransferRecord::begin(
            TransferId::new(id).unwrap(),
            SessionId::from_raw(1),
            Direction::Send,
            0,
            RecordFields::default(),
        )
    }

    fn id(raw: u64) -> TransferId {
        TransferId::new(raw).unwrap()
    }

    #[test]
    fn insert_and_remove_by_id() {
        let registry = Registry::new();
        registry.insert(Collection::Active, record(1));
        registry.insert(Collection::Active, record(2));

        let removed = registry.remove_by_id(Collection::Active, 2).unwrap();
        assert_eq!(removed.id(), id(2));
        assert_eq!(registry.len(Collection::Active), 1);
        assert!(registry.remove_by_id(Collection::Active, 2).is_none());
    }

    #[test]
    fn unknown_id_leaves_registry_unchanged() {
        let registry = Registry::new();
        registry.insert(Collection::Active, record(1));
        assert!(registry.remove_by_id(Collection::Active, 99).is_none());
        assert!(registry.contains(Collection::Active, id(1)));
    }

    #[test]
    fn zero_id_takes_any_record() {
        let registry = Registry::new();
        assert!(registry.remove_by_id(Collection::Active, 0).is_none());

        registry.insert(Collection::Active, record(5));
        let taken = registry.remove_by_id(Collection::Active, 0).unwrap();
        assert_eq!(taken.id(), id(5));
        assert!(registry.is_empty(Collection::Active));
    }

    #[test]
    fn ended_collection_is_fifo() {
        let registry = Registry::new();
        for raw in [3, 1, 2] {
            registry.insert(Collection::Ended, record(raw));
        }
        let order: Vec<u64> = std::iter::from_fn(|| registry.take_any(Collection::Ended))
            .map(|r| r.id().get())
            .collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn remove_specific_ended_record() {
        let registry = Registry::new();
        for raw in 1..=3 {
            registry.insert(Collection::Ended, record(raw));
        }
        assert_eq!(registry.remove(Collection::Ended, id(2)).unwrap().id(), id(2));
        assert!(!registry.contains(Collection::Ended, id(2)));
        assert_eq!(registry.len(Collection::Ended), 2);
    }

    #[test]
    fn restore_puts_records_back_in_front() {
        let registry = Registry::new();
        for raw in 1..=3 {
            registry.insert(Collection::Ended, record(raw));
        }
        let drained = registry.drain(Collection::Ended);
        assert!(registry.is_empty(Collection::Ended));

        registry.insert(Collection::Ended, record(4));
        registry.restore(Collection::Ended, drained);

        let order: Vec<u64> = registry
            .drain(Collection::Ended)
            .iter()
            .map(|r| r.id().get())
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn active_ids_respects_limit() {
        let registry = Registry::new();
        for raw in 1..=10 {
            registry.insert(Collection::Active, record(raw));
        }
        assert_eq!(registry.active_ids(4).len(), 4);
        assert_eq!(registry.active_ids(100).len(), 10);
    }

    #[test]
    fn record_lives_in_one_collection() {
        let registry = Registry::new();
        registry.insert(Collection::Active, record(1));

        let rec = registry.remove(Collection::Active, id(1)).unwrap();
        registry.insert(Collection::Ended, rec);

        assert!(!registry.contains(Collection::Active, id(1)));
        assert!(registry.contains(Collection::Ended, id(1)));
    }

    #[test]
    fn complete_moves_active_to_ended() {
        let registry = Registry::new();
        registry.insert(Collection::Active, record(1));
        registry.insert(Collection::Ended, record(2));

        assert!(registry.complete(id(1), |r| r.finish(0, 3)));
        assert!(!registry.contains(Collection::Active, id(1)));

        let ended = registry.drain(Collection::Ended);
        let order: Vec<u64> = ended.iter().map(|r| r.id().get()).collect();
        assert_eq!(order, vec![2, 1]);
        assert!(!ended[1].succeeded());
    }

    #[test]
    fn complete_unknown_id_changes_nothing() {
        let registry = Registry::new();
        registry.insert(Collection::Ended, record(1));

        assert!(!registry.complete(id(1), |_| panic!("finish must not run")));
        assert!(registry.is_empty(Collection::Active));
        assert_eq!(registry.len(Collection::Ended), 1);
    }

    #[test]
    fn completing_record_stays_visible() {
        let registry = Arc::new(Registry::new());
        for raw in 1..=2_000u64 {
            registry.insert(Collection::Active, record(raw));
            let ender = {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.complete(id(raw), |r| r.finish(0, 0)))
            };
            while !ender.is_finished() {
                let inner = registry.lock();
                assert_eq!(inner.active.len() + inner.ended.len(), 1);
            }
            assert!(ender.join().unwrap());
            assert_eq!(registry.drain(Collection::Ended).len(), 1);
        }
    }

    #[test]
    fn concurrent_inserts_and_removes() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..250 {
                        let raw = t * 1000 + i + 1;
                        registry.insert(Collection::Active, record(raw));
                        let rec = registry.remove_by_id(Collection::Active, raw).unwrap();
                        registry.insert(Collection::Ended, rec);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(registry.is_empty(Collection::Active));
        assert_eq!(registry.len(Collection::Ended), 1000);
    }
}
