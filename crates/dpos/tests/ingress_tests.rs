//! Ingress precondition tests: verification, receive window, duplicate
//! detection, and the pending pipeline entry.

mod common;

use common::{harness, harness_with};
use delcore_core::Store;
use delcore_storage::{model, MemStore};
use delcore_types::{Address, Status};

#[test]
fn test_non_delegate_rejects_ingress() {
    let h = harness_with(4, false, MemStore::new(), None);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    let receipt = h.service.submit(tx);
    assert_eq!(receipt.status, Status::NotDelegate);
}

#[test]
fn test_invalid_signature_is_rejected() {
    let h = harness(4);
    let mut tx = h.signed_transfer(Address::from([0x22; 20]), 40);
    tx.value = 41;

    let receipt = h.service.submit(tx.clone());
    assert_eq!(receipt.status, Status::InvalidTransaction);
    // Nothing entered the pipeline.
    assert!(h.cache.gossips.get(&tx.hash).is_none());
    assert!(h.cache.transactions.get(&tx.hash).is_none());
}

#[test]
fn test_stale_transaction_times_out_at_ingress() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    // Received 5 s after its timestamp with a 3 s window.
    h.clock.advance(5_000);
    let receipt = h.service.submit(tx.clone());
    assert_eq!(receipt.status, Status::TransactionTimeOut);
    assert!(h.cache.gossips.get(&tx.hash).is_none());
}

#[test]
fn test_future_dated_transaction_is_accepted() {
    let h = harness(4);
    let future = h.now() + 60_000;
    let tx = delcore_types::Transaction::transfer(
        h.keys[0].address(),
        Address::from([0x22; 20]),
        40,
        future,
    )
    .finalize(h.keys[0].signing_key())
    .unwrap();

    let receipt = h.service.submit(tx);
    assert_eq!(receipt.status, Status::Pending);
}

#[test]
fn test_persisted_duplicate_is_rejected() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    let mut txn = h.store.begin(true);
    model::put_transaction(txn.as_mut(), &tx).unwrap();
    txn.commit().unwrap();

    let receipt = h.service.submit(tx);
    assert_eq!(receipt.status, Status::DuplicateTransaction);
}

#[test]
fn test_in_flight_duplicate_is_rejected() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    let first = h.service.submit(tx.clone());
    assert_eq!(first.status, Status::Pending);

    let second = h.service.submit(tx);
    assert_eq!(second.status, Status::AlreadyProcessingTransaction);
}

#[test]
fn test_successful_ingress_enters_pipeline() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    let receipt = h.service.submit(tx.clone());
    assert_eq!(receipt.status, Status::Pending);
    assert_eq!(receipt.transaction_hash, tx.hash);

    // Receipt, transaction, and a gossip carrying this node's own rumor
    // are all in cache.
    let cached_receipt = h.cache.receipts.get(&tx.hash).unwrap();
    assert_eq!(cached_receipt.status, Status::Pending);
    assert!(h.cache.transactions.contains(&tx.hash));

    let gossip = h.cache.gossips.get(&tx.hash).unwrap();
    assert_eq!(gossip.rumors.len(), 1);
    assert_eq!(gossip.rumors[0].address, h.service.address());
    gossip.rumors[0].verify().unwrap();
}
