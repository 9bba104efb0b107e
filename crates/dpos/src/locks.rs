//! Per-transaction-hash mutual exclusion.

use delcore_types::H256;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;

struct Slot {
    lock: Arc<Mutex<()>>,
    refs: usize,
}

type SlotMap = Arc<Mutex<HashMap<H256, Slot>>>;

/// A map from transaction hash to a reference-counted lock.
///
/// The execution worker holds the hash's lock from before its idempotence
/// check through commit, so at most one execution attempt per hash
/// proceeds at a time. Slots are recycled once the last guard drops, so
/// the map only ever holds in-flight hashes.
#[derive(Clone, Default)]
pub struct HashLocks {
    slots: SlotMap,
}

impl HashLocks {
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock for `hash` is held and returns its guard.
    pub fn acquire(&self, hash: H256) -> HashLockGuard {
        let lock = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(hash).or_insert_with(|| Slot {
                lock: Arc::new(Mutex::new(())),
                refs: 0,
            });
            slot.refs += 1;
            Arc::clone(&slot.lock)
        };
        // The map lock is released before blocking here, so a holder of
        // this hash's lock never stalls acquisitions of other hashes.
        let guard = lock.lock_arc();
        HashLockGuard {
            slots: Arc::clone(&self.slots),
            hash,
            guard: Some(guard),
        }
    }

    /// Number of hashes currently tracked.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no hash is currently locked or waited on.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

/// Guard for one hash's lock; releasing it drops the slot when no other
/// waiter holds a reference.
pub struct HashLockGuard {
    slots: SlotMap,
    hash: H256,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for HashLockGuard {
    fn drop(&mut self) {
        // Release the hash lock before taking the map lock; the acquire
        // path takes them in the opposite nesting.
        self.guard.take();
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(&self.hash) {
            slot.refs -= 1;
            if slot.refs == 0 {
                slots.remove(&self.hash);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    #[test]
    fn test_slot_recycled_after_release() {
        let locks = HashLocks::new();
        let hash = H256::keccak256(b"tx");

        let guard = locks.acquire(hash);
        assert_eq!(locks.len(), 1);
        drop(guard);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_same_hash_serializes() {
        let locks = HashLocks::new();
        let hash = H256::keccak256(b"tx");
        let concurrent = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let concurrent = Arc::clone(&concurrent);
                thread::spawn(move || {
                    let _guard = locks.acquire(hash);
                    let inside = concurrent.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(inside, 0);
                    thread::yield_now();
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn test_distinct_hashes_do_not_block() {
        let locks = HashLocks::new();
        let _a = locks.acquire(H256::keccak256(b"a"));
        // Must not deadlock.
        let _b = locks.acquire(H256::keccak256(b"b"));
        assert_eq!(locks.len(), 2);
    }
}
