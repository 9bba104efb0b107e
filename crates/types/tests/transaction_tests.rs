//! Tests for transaction hashing, signing, and verification.

use delcore_types::{Address, Signature, Transaction, TxType, H256};
use k256::ecdsa::SigningKey;

fn test_key(seed: u8) -> SigningKey {
    let mut bytes = [0u8; 32];
    bytes[31] = seed;
    SigningKey::from_slice(&bytes).unwrap()
}

fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    Address::from_public_key(&point.as_bytes()[1..])
}

#[test]
fn test_signed_transfer_verifies() {
    let key = test_key(1);
    let from = address_of(&key);
    let to = Address::from([0x22; 20]);

    let tx = Transaction::transfer(from, to, 40, 1_000_000)
        .finalize(&key)
        .unwrap();

    assert_eq!(tx.hash, tx.canonical_digest());
    tx.verify().expect("signed transfer must verify");
}

#[test]
fn test_tampered_value_fails_hash_check() {
    let key = test_key(1);
    let from = address_of(&key);
    let to = Address::from([0x22; 20]);

    let mut tx = Transaction::transfer(from, to, 40, 1_000_000)
        .finalize(&key)
        .unwrap();
    tx.value = 4_000;

    assert!(tx.verify().is_err());
}

#[test]
fn test_wrong_signer_fails_recovery() {
    let signer = test_key(1);
    let impostor = test_key(2);
    let from = address_of(&impostor);
    let to = Address::from([0x22; 20]);

    // Claims to be from the impostor's address but is signed by another key.
    let tx = Transaction::transfer(from, to, 40, 1_000_000)
        .finalize(&signer)
        .unwrap();

    assert!(tx.verify().is_err());
}

#[test]
fn test_deploy_must_not_carry_recipient() {
    let key = test_key(3);
    let from = address_of(&key);

    let mut tx = Transaction::deploy(from, vec![0x60, 0x60], "6162".into(), 5)
        .finalize(&key)
        .unwrap();
    tx.verify().expect("deployment without recipient verifies");

    tx.to = Some(Address::from([0x01; 20]));
    assert!(tx.verify().is_err());
}

#[test]
fn test_transfer_requires_recipient() {
    let key = test_key(3);
    let from = address_of(&key);
    let to = Address::from([0x22; 20]);

    let mut tx = Transaction::transfer(from, to, 1, 5).finalize(&key).unwrap();
    tx.to = None;
    assert!(tx.verify().is_err());
}

#[test]
fn test_distinct_fields_produce_distinct_hashes() {
    let from = Address::from([0x01; 20]);
    let to = Address::from([0x02; 20]);

    let a = Transaction::transfer(from, to, 40, 1_000).canonical_digest();
    let b = Transaction::transfer(from, to, 41, 1_000).canonical_digest();
    let c = Transaction::transfer(from, to, 40, 1_001).canonical_digest();

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
}

#[test]
fn test_execute_params_are_hashed() {
    let from = Address::from([0x01; 20]);
    let contract = Address::from([0x02; 20]);

    let a = Transaction::execute(from, contract, "get", vec![1.into()], 1_000).canonical_digest();
    let b = Transaction::execute(from, contract, "get", vec![2.into()], 1_000).canonical_digest();
    assert_ne!(a, b);
}

#[test]
fn test_signature_byte_roundtrip() {
    let key = test_key(7);
    let digest = H256::keccak256(b"payload");
    let sig = Signature::sign_digest(&key, &digest).unwrap();

    let back = Signature::from_bytes(&sig.to_bytes()).unwrap();
    assert_eq!(sig, back);
    assert_eq!(back.recover(&digest).unwrap(), address_of(&key));
}

#[test]
fn test_transaction_json_uses_type_field() {
    let key = test_key(4);
    let from = address_of(&key);
    let to = Address::from([0x22; 20]);
    let tx = Transaction::transfer(from, to, 9, 77).finalize(&key).unwrap();

    let json = serde_json::to_value(&tx).unwrap();
    assert_eq!(json["type"], "TransferTokens");
    assert_eq!(json["value"], 9);
    // Empty deploy/execute fields are omitted on the wire.
    assert!(json.get("code").is_none());
    assert!(json.get("method").is_none());

    let back: Transaction = serde_json::from_value(json).unwrap();
    assert_eq!(back, tx);
    back.verify().expect("roundtripped transaction still verifies");
}

#[test]
fn test_tx_type_byte_roundtrip() {
    for ty in [
        TxType::TransferTokens,
        TxType::DeploySmartContract,
        TxType::ExecuteSmartContract,
    ] {
        assert_eq!(TxType::from_byte(ty.as_byte()).unwrap(), ty);
    }
    assert!(TxType::from_byte(0x7f).is_err());
}
