//! Asynchronous mutual exclusion scoped to a key.
//!
//! A [`KeyedLock`] hands out at most one [`KeyedLockGuard`] per key at a time
//! while unrelated keys proceed independently. Waiting is cooperative: a
//! contended [`KeyedLock::acquire`] suspends the task, it never blocks a
//! worker thread. Waiters for the same key are served in FIFO order.
//!
//! Slots are created on first use and dropped from the table once the last
//! holder or waiter for their key is gone, including waiters whose acquiring
//! future was dropped before being granted the lock.

use std::{
    collections::{hash_map::RandomState, HashMap},
    fmt,
    hash::{BuildHasher, Hash},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex as SlotMutex, OwnedMutexGuard};
use tracing::trace;

mod key;

pub use key::{LockKey, LockNamespace};

/// Default number of shards of the slot table.
pub const LOCK_SHARDING: usize = 2048;

type Slot = Arc<SlotMutex<()>>;
type Shard<K> = Mutex<HashMap<K, Slot>>;

struct SlotTable<K> {
    shards: Vec<Shard<K>>,
    random_state: RandomState,
}

impl<K: Hash + Eq + Clone> SlotTable<K> {
    fn new(shards: usize) -> Self {
        Self {
            random_state: RandomState::new(),
            shards: (0..shards.max(1))
                .map(|_| Mutex::new(HashMap::new()))
                .collect(),
        }
    }

    fn shard(&self, key: &K) -> MutexGuard<'_, HashMap<K, Slot>> {
        let hash = self.random_state.hash_one(key) as usize;

        // Shards are only held for map operations that cannot panic halfway,
        // so a poisoned shard is still consistent.
        self.shards[hash % self.shards.len()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn checkout(&self, key: &K) -> Slot {
        self.shard(key)
            .entry(key.clone())
            .or_insert_with(|| Arc::new(SlotMutex::new(())))
            .clone()
    }

    fn checkin(&self, key: &K, slot: Slot) {
        let mut shard = self.shard(key);

        // New references are only handed out under the shard lock, so once
        // ours is gone a count of one means the table is the last owner.
        drop(slot);
        if shard
            .get(key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            shard.remove(key);
        }
    }

    fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }
}

/// Reference to a slot that gives it back to the table when dropped.
struct SlotLease<K: Hash + Eq + Clone> {
    table: Arc<SlotTable<K>>,
    key: K,
    slot: Option<Slot>,
}

impl<K: Hash + Eq + Clone> SlotLease<K> {
    fn checkout(table: Arc<SlotTable<K>>, key: K) -> Self {
        let slot = table.checkout(&key);

        Self {
            table,
            key,
            slot: Some(slot),
        }
    }

    fn slot(&self) -> Slot {
        // Only `Drop` takes the slot out.
        self.slot.clone().unwrap_or_default()
    }
}

impl<K: Hash + Eq + Clone> Drop for SlotLease<K> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.table.checkin(&self.key, slot);
        }
    }
}

/// Table of per-key locks.
///
/// Cloning is cheap and every clone shares the same slots.
pub struct KeyedLock<K: Hash + Eq + Clone> {
    table: Arc<SlotTable<K>>,
}

impl<K: Hash + Eq + Clone> Clone for KeyedLock<K> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<K: Hash + Eq + Clone + fmt::Debug> Default for KeyedLock<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone> fmt::Debug for KeyedLock<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLock")
            .field("shards", &self.table.shards.len())
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone + fmt::Debug> KeyedLock<K> {
    pub fn new() -> Self {
        Self::with_shards(LOCK_SHARDING)
    }

    /// Creates a lock table split into `shards` independently locked maps.
    ///
    /// A value of zero is treated as one.
    pub fn with_shards(shards: usize) -> Self {
        Self {
            table: Arc::new(SlotTable::new(shards)),
        }
    }

    /// Waits until no one else holds `key` and returns the guard for it.
    ///
    /// The lock is released when the guard is dropped. Dropping the returned
    /// future before it resolves withdraws the request without disturbing
    /// other waiters.
    pub async fn acquire(&self, key: K) -> KeyedLockGuard<K> {
        let lease = SlotLease::checkout(Arc::clone(&self.table), key);

        if let Ok(permit) = lease.slot().try_lock_owned() {
            return KeyedLockGuard {
                _permit: permit,
                lease,
                contended: false,
            };
        }

        trace!("Waiting for contended lock {:?}", lease.key);
        let permit = lease.slot().lock_owned().await;

        KeyedLockGuard {
            _permit: permit,
            lease,
            contended: true,
        }
    }

    /// Returns the guard for `key` if it is free right now.
    pub fn try_acquire(&self, key: K) -> Option<KeyedLockGuard<K>> {
        let lease = SlotLease::checkout(Arc::clone(&self.table), key);
        let permit = lease.slot().try_lock_owned().ok()?;

        Some(KeyedLockGuard {
            _permit: permit,
            lease,
            contended: false,
        })
    }

    /// Number of keys currently held or waited on.
    pub fn active_slots(&self) -> usize {
        self.table.len()
    }
}

/// Exclusive hold on one key of a [`KeyedLock`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct KeyedLockGuard<K: Hash + Eq + Clone> {
    // Declaration order matters: the permit is released before the lease
    // gives the slot back, so the slot can be removed from the table.
    _permit: OwnedMutexGuard<()>,
    lease: SlotLease<K>,
    contended: bool,
}

impl<K: Hash + Eq + Clone> KeyedLockGuard<K> {
    pub fn key(&self) -> &K {
        &self.lease.key
    }

    /// Whether the acquisition had to wait for another holder.
    pub fn was_contended(&self) -> bool {
        self.contended
    }
}

impl<K: Hash + Eq + Clone + fmt::Debug> fmt::Debug for KeyedLockGuard<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLockGuard")
            .field("key", &self.lease.key)
            .field("contended", &self.contended)
            .finish()
    }
}
