//! Versioned in-memory store with optimistic conflict detection.

use delcore_core::{Store, StoreError, StoreResult, StoreTxn};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Versioned {
    /// None is a tombstone left by a committed delete.
    value: Option<Vec<u8>>,
    version: u64,
}

#[derive(Debug, Default)]
struct MemInner {
    entries: BTreeMap<Vec<u8>, Versioned>,
    commit_seq: u64,
}

/// An in-memory store with badger-style optimistic concurrency.
///
/// Each transaction records the version of every key it reads or writes.
/// Commit re-checks those versions under the write lock and fails with
/// [`StoreError::Conflict`] when any tracked key was committed by another
/// transaction in between.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<RwLock<MemInner>>,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .entries
            .values()
            .filter(|v| v.value.is_some())
            .count()
    }

    /// Whether the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemStore {
    fn begin(&self, writable: bool) -> Box<dyn StoreTxn + '_> {
        Box::new(MemTxn {
            inner: Arc::clone(&self.inner),
            writable,
            tracked: HashMap::new(),
            writes: BTreeMap::new(),
        })
    }
}

struct MemTxn {
    inner: Arc<RwLock<MemInner>>,
    writable: bool,
    /// key -> version observed when the key was first read or written
    tracked: HashMap<Vec<u8>, u64>,
    /// key -> buffered value (None = delete)
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl MemTxn {
    fn track(&mut self, key: &[u8]) {
        if self.tracked.contains_key(key) {
            return;
        }
        let version = self
            .inner
            .read()
            .entries
            .get(key)
            .map(|v| v.version)
            .unwrap_or(0);
        self.tracked.insert(key.to_vec(), version);
    }
}

impl StoreTxn for MemTxn {
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        if let Some(buffered) = self.writes.get(key) {
            return Ok(buffered.clone());
        }
        if self.writable {
            self.track(key);
        }
        Ok(self
            .inner
            .read()
            .entries
            .get(key)
            .and_then(|v| v.value.clone()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.track(key);
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.track(key);
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_prefix(
        &mut self,
        prefix: &[u8],
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        // Committed view overlaid with this transaction's own writes.
        let mut view: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        {
            let inner = self.inner.read();
            for (key, versioned) in inner.entries.range(prefix.to_vec()..) {
                if !key.starts_with(prefix) {
                    break;
                }
                if let Some(value) = &versioned.value {
                    view.insert(key.clone(), value.clone());
                }
            }
        }
        for (key, buffered) in self.writes.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match buffered {
                Some(value) => {
                    view.insert(key.clone(), value.clone());
                }
                None => {
                    view.remove(key);
                }
            }
        }

        Ok(view.into_iter().skip(offset).take(limit).collect())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        if !this.writable {
            if this.writes.is_empty() {
                return Ok(());
            }
            return Err(StoreError::ReadOnly);
        }

        let mut inner = this.inner.write();
        for (key, observed) in &this.tracked {
            let current = inner.entries.get(key).map(|v| v.version).unwrap_or(0);
            if current != *observed {
                return Err(StoreError::Conflict);
            }
        }

        inner.commit_seq += 1;
        let version = inner.commit_seq;
        for (key, value) in this.writes {
            inner.entries.insert(key, Versioned { value, version });
        }
        Ok(())
    }

    fn discard(self: Box<Self>) {}
}
