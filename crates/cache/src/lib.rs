//! # delcore Cache
//!
//! In-memory, TTL-bounded, concurrent caches shared by the workers and the
//! API surface.
//!
//! [`TtlCache`] is the generic building block; [`ChainCache`] composes one
//! typed cache per entry kind (transactions, receipts, gossips) so no
//! dynamic casts are needed when reading an entry back.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

use delcore_types::{Gossip, Receipt, Transaction, H256};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::trace;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A concurrent map with per-entry time-to-live.
///
/// Expired entries are invisible to readers immediately and reclaimed
/// lazily: reads skip them, writes overwrite them, and [`TtlCache::sweep`]
/// drops whatever remains.
pub struct TtlCache<K, V> {
    inner: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a clone of the live value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read();
        let entry = map.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Whether a live value exists for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces the value for `key` with the given TTL.
    ///
    /// Replacement is atomic with respect to concurrent readers: they see
    /// either the old value or the new one, never a partial state.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.inner.write().insert(key, entry);
    }

    /// Removes the value for `key`, returning it if it was live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let entry = self.inner.write().remove(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value)
    }

    /// Number of entries, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Drops every expired entry and returns how many were reclaimed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|_, entry| entry.expires_at > now);
        let reclaimed = before - map.len();
        if reclaimed > 0 {
            trace!(reclaimed, "cache sweep");
        }
        reclaimed
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The typed caches shared across the core, one per entry kind.
///
/// Entries expire on the configured horizon, which policy keeps longer
/// than the admission window so a receipt outlives its gossip rounds.
pub struct ChainCache {
    /// Transactions observed from ingress through commit
    pub transactions: TtlCache<H256, Transaction>,
    /// Receipts by transaction hash
    pub receipts: TtlCache<H256, Receipt>,
    /// Gossip state by transaction hash
    pub gossips: TtlCache<H256, Gossip>,
    ttl: Duration,
}

impl ChainCache {
    /// Creates the cache set with one shared TTL horizon.
    pub fn new(ttl: Duration) -> Self {
        Self {
            transactions: TtlCache::new(),
            receipts: TtlCache::new(),
            gossips: TtlCache::new(),
            ttl,
        }
    }

    /// The configured TTL horizon.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Caches a transaction under its hash.
    pub fn put_transaction(&self, tx: Transaction) {
        self.transactions.set(tx.hash, tx, self.ttl);
    }

    /// Caches a receipt under its transaction hash.
    pub fn put_receipt(&self, receipt: Receipt) {
        self.receipts.set(receipt.transaction_hash, receipt, self.ttl);
    }

    /// Caches (or atomically replaces) a gossip under its transaction hash.
    pub fn put_gossip(&self, gossip: Gossip) {
        self.gossips.set(gossip.transaction.hash, gossip, self.ttl);
    }

    /// Drops a committed transaction's entries.
    pub fn evict_transaction(&self, hash: &H256) {
        self.transactions.remove(hash);
        self.gossips.remove(hash);
    }

    /// Sweeps all three caches.
    pub fn sweep(&self) -> usize {
        self.transactions.sweep() + self.receipts.sweep() + self.gossips.sweep()
    }
}
