//! Tests for the RocksDB-backed store.

use delcore_core::{Store, StoreError};
use delcore_storage::RocksStore;
use tempfile::TempDir;

fn open_store() -> (RocksStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = RocksStore::open(dir.path()).unwrap();
    (store, dir)
}

#[test]
fn test_put_get_commit() {
    let (store, _dir) = open_store();

    let mut txn = store.begin(true);
    txn.put(b"alpha", b"1").unwrap();
    txn.commit().unwrap();

    let mut reader = store.begin(false);
    assert_eq!(reader.get(b"alpha").unwrap(), Some(b"1".to_vec()));
    assert_eq!(reader.get(b"missing").unwrap(), None);
    reader.discard();
}

#[test]
fn test_rollback_discards_writes() {
    let (store, _dir) = open_store();

    let mut txn = store.begin(true);
    txn.put(b"key", b"value").unwrap();
    txn.discard();

    let mut reader = store.begin(false);
    assert_eq!(reader.get(b"key").unwrap(), None);
    reader.discard();
}

#[test]
fn test_write_write_race_conflicts() {
    let (store, _dir) = open_store();

    let mut first = store.begin(true);
    first.put(b"tx:abc", b"first").unwrap();

    let mut second = store.begin(true);
    second.put(b"tx:abc", b"second").unwrap();

    first.commit().unwrap();
    assert!(matches!(second.commit(), Err(StoreError::Conflict)));

    let mut reader = store.begin(false);
    assert_eq!(reader.get(b"tx:abc").unwrap(), Some(b"first".to_vec()));
    reader.discard();
}

#[test]
fn test_scan_prefix_pages() {
    let (store, _dir) = open_store();

    let mut txn = store.begin(true);
    for i in 0..5u8 {
        txn.put(format!("item:{i}").as_bytes(), &[i]).unwrap();
    }
    txn.put(b"zother", b"x").unwrap();
    txn.commit().unwrap();

    let mut reader = store.begin(false);
    let rows = reader.scan_prefix(b"item:", 1, 2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, b"item:1".to_vec());
    assert_eq!(rows[1].0, b"item:2".to_vec());
    reader.discard();
}
