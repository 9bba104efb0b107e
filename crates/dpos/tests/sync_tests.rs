//! Tests for the gossip merge operation.

mod common;

use common::harness;
use delcore_types::{Address, Gossip, Status};

#[test]
fn test_merge_unions_rumor_sets() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    // Our cache holds rumors from delegates {0, 1}; the peer offers {1, 2}.
    let ours = h.gossip_with_rumors(&tx, 2);
    h.cache.put_gossip(ours);

    let mut incoming = Gossip::new(tx.clone());
    incoming.add_rumor(h.rumor(1, tx.hash, tx.time));
    incoming.add_rumor(h.rumor(2, tx.hash, tx.time));

    let merged = h.service.synchronize_gossip(&incoming).unwrap();
    assert_eq!(merged.rumors.len(), 3);
    for i in 0..3 {
        assert!(merged.contains_rumor(&h.keys[i].address()));
    }

    // The cache entry was replaced with the merged set.
    let cached = h.cache.gossips.get(&tx.hash).unwrap();
    assert_eq!(cached.rumors.len(), 3);
}

#[test]
fn test_merge_adds_own_rumor_to_fresh_gossip() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    // First contact with this transaction, offered by delegate 1.
    let mut incoming = Gossip::new(tx.clone());
    incoming.add_rumor(h.rumor(1, tx.hash, tx.time));

    let merged = h.service.synchronize_gossip(&incoming).unwrap();
    assert_eq!(merged.rumors.len(), 2);
    assert!(merged.contains_rumor(&h.service.address()));

    // A pending receipt was created alongside.
    let receipt = h.cache.receipts.get(&tx.hash).unwrap();
    assert_eq!(receipt.status, Status::Pending);
}

#[test]
fn test_merge_drops_forged_rumors() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    let mut incoming = Gossip::new(tx.clone());
    incoming.add_rumor(h.rumor(1, tx.hash, tx.time));
    // Forged: claims delegate 3's address but is signed by delegate 2.
    let mut forged = h.rumor(2, tx.hash, tx.time);
    forged.address = h.keys[3].address();
    incoming.rumors.push(forged);

    let merged = h.service.synchronize_gossip(&incoming).unwrap();
    // Only the honest rumor and our own survive; no error to the caller.
    assert_eq!(merged.rumors.len(), 2);
    assert!(merged.contains_rumor(&h.keys[1].address()));
    assert!(merged.contains_rumor(&h.service.address()));
    assert!(!merged.contains_rumor(&h.keys[3].address()));
}

#[test]
fn test_merge_refuses_to_rumor_for_invalid_transaction() {
    let h = harness(4);
    let mut tx = h.signed_transfer(Address::from([0x22; 20]), 40);
    tx.value = 9_999; // break the canonical hash

    let mut incoming = Gossip::new(tx.clone());
    incoming.add_rumor(h.rumor(1, tx.hash, tx.time));

    assert!(h.service.synchronize_gossip(&incoming).is_err());
}

#[test]
fn test_merge_is_idempotent_for_known_rumors() {
    let h = harness(4);
    let tx = h.signed_transfer(Address::from([0x22; 20]), 40);

    let incoming = h.gossip_with_rumors(&tx, 3);
    let first = h.service.synchronize_gossip(&incoming).unwrap();
    let second = h.service.synchronize_gossip(&incoming).unwrap();

    assert_eq!(first.rumors.len(), 3);
    assert_eq!(second.rumors.len(), 3);
}
