//! RocksDB-backed store using optimistic transactions.

use delcore_core::{Store, StoreError, StoreResult, StoreTxn};
use rocksdb::{Direction, ErrorKind, IteratorMode, OptimisticTransactionDB, Options, Transaction};
use std::path::Path;
use tracing::info;

fn map_err(e: rocksdb::Error) -> StoreError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TryAgain | ErrorKind::MergeInProgress => StoreError::Conflict,
        _ => StoreError::Io(e.to_string()),
    }
}

/// A durable store over RocksDB optimistic transactions.
///
/// Commit-time conflict checking covers every key the transaction wrote,
/// which matches how the execution worker races are resolved: both writers
/// touch `tx:<hash>`, one commits, the other observes
/// [`StoreError::Conflict`].
pub struct RocksStore {
    db: OptimisticTransactionDB,
}

impl RocksStore {
    /// Opens (or creates) a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = OptimisticTransactionDB::open(&opts, path.as_ref()).map_err(map_err)?;
        info!(path = %path.as_ref().display(), "store opened");
        Ok(Self { db })
    }
}

impl Store for RocksStore {
    fn begin(&self, writable: bool) -> Box<dyn StoreTxn + '_> {
        Box::new(RocksTxn {
            txn: Some(self.db.transaction()),
            writable,
        })
    }
}

struct RocksTxn<'a> {
    txn: Option<Transaction<'a, OptimisticTransactionDB>>,
    writable: bool,
}

impl<'a> RocksTxn<'a> {
    fn active(&self) -> StoreResult<&Transaction<'a, OptimisticTransactionDB>> {
        self.txn.as_ref().ok_or(StoreError::Finished)
    }
}

impl StoreTxn for RocksTxn<'_> {
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.active()?.get(key).map_err(map_err)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.active()?.put(key, value).map_err(map_err)
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.active()?.delete(key).map_err(map_err)
    }

    fn scan_prefix(
        &mut self,
        prefix: &[u8],
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let txn = self.active()?;
        let mode = IteratorMode::From(prefix, Direction::Forward);
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for item in txn.iterator(mode) {
            let (key, value) = item.map_err(map_err)?;
            if !key.starts_with(prefix) {
                break;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            out.push((key.to_vec(), value.to_vec()));
            if out.len() == limit {
                break;
            }
        }
        Ok(out)
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        let txn = self.txn.take().ok_or(StoreError::Finished)?;
        txn.commit().map_err(map_err)
    }

    fn discard(mut self: Box<Self>) {
        if let Some(txn) = self.txn.take() {
            let _ = txn.rollback();
        }
    }
}
