//! Typed persistence over the raw key-value layout.
//!
//! Values are stored as JSON; the secondary `txFrom:`/`txTo:` index rows
//! hold the bare transaction hash as their value.

use crate::keys;
use delcore_core::{StoreError, StoreResult, StoreTxn};
use delcore_types::{Account, Address, Gossip, Receipt, Transaction, H256};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Entries per page returned by the paginated scans.
pub const PAGE_SIZE: usize = 25;

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn get_decoded<T: DeserializeOwned>(txn: &mut dyn StoreTxn, key: &[u8]) -> StoreResult<T> {
    let bytes = txn.get(key)?.ok_or(StoreError::NotFound)?;
    decode(&bytes)
}

/// Persists a transaction and its sender/recipient index rows.
pub fn put_transaction(txn: &mut dyn StoreTxn, tx: &Transaction) -> StoreResult<()> {
    txn.put(&keys::transaction(&tx.hash), &encode(tx)?)?;
    let reference = tx.hash.to_plain_hex().into_bytes();
    txn.put(&keys::transaction_from(&tx.from, &tx.hash), &reference)?;
    if let Some(to) = &tx.to {
        txn.put(&keys::transaction_to(to, &tx.hash), &reference)?;
    }
    Ok(())
}

/// Loads a transaction by hash.
pub fn get_transaction(txn: &mut dyn StoreTxn, hash: &H256) -> StoreResult<Transaction> {
    get_decoded(txn, &keys::transaction(hash))
}

/// Whether a transaction is persisted.
pub fn has_transaction(txn: &mut dyn StoreTxn, hash: &H256) -> StoreResult<bool> {
    Ok(txn.get(&keys::transaction(hash))?.is_some())
}

/// Persists an account.
pub fn put_account(txn: &mut dyn StoreTxn, account: &Account) -> StoreResult<()> {
    txn.put(&keys::account(&account.address), &encode(account)?)
}

/// Loads an account by address.
pub fn get_account(txn: &mut dyn StoreTxn, address: &Address) -> StoreResult<Account> {
    get_decoded(txn, &keys::account(address))
}

/// Persists a receipt under its transaction hash.
pub fn put_receipt(txn: &mut dyn StoreTxn, receipt: &Receipt) -> StoreResult<()> {
    txn.put(&keys::receipt(&receipt.transaction_hash), &encode(receipt)?)
}

/// Loads a receipt by transaction hash.
pub fn get_receipt(txn: &mut dyn StoreTxn, hash: &H256) -> StoreResult<Receipt> {
    get_decoded(txn, &keys::receipt(hash))
}

/// Persists a gossip under its transaction hash.
pub fn put_gossip(txn: &mut dyn StoreTxn, gossip: &Gossip) -> StoreResult<()> {
    txn.put(&keys::gossip(&gossip.transaction.hash), &encode(gossip)?)
}

/// Loads a gossip by transaction hash.
pub fn get_gossip(txn: &mut dyn StoreTxn, hash: &H256) -> StoreResult<Gossip> {
    get_decoded(txn, &keys::gossip(hash))
}

/// Resolves the transaction that deployed the contract at `address`.
///
/// Follows `account:<address>` to its `transaction_hash` link and loads the
/// deploying transaction, which carries the contract's ABI.
pub fn transaction_by_contract_address(
    txn: &mut dyn StoreTxn,
    address: &Address,
) -> StoreResult<Transaction> {
    let account = get_account(txn, address)?;
    let hash = account.transaction_hash.ok_or(StoreError::NotFound)?;
    get_transaction(txn, &hash)
}

fn page_of<T: DeserializeOwned>(
    txn: &mut dyn StoreTxn,
    prefix: &str,
    page: usize,
) -> StoreResult<Vec<T>> {
    let offset = page.saturating_sub(1) * PAGE_SIZE;
    let rows = txn.scan_prefix(prefix.as_bytes(), offset, PAGE_SIZE)?;
    rows.iter().map(|(_, value)| decode(value)).collect()
}

/// One page of persisted transactions, in key order. Pages are 1-based.
pub fn transactions_page(txn: &mut dyn StoreTxn, page: usize) -> StoreResult<Vec<Transaction>> {
    page_of(txn, keys::TX_PREFIX, page)
}

/// One page of persisted accounts, in key order. Pages are 1-based.
pub fn accounts_page(txn: &mut dyn StoreTxn, page: usize) -> StoreResult<Vec<Account>> {
    page_of(txn, keys::ACCOUNT_PREFIX, page)
}

/// One page of persisted gossips, in key order. Pages are 1-based.
pub fn gossips_page(txn: &mut dyn StoreTxn, page: usize) -> StoreResult<Vec<Gossip>> {
    page_of(txn, keys::GOSSIP_PREFIX, page)
}

fn transactions_by_index(txn: &mut dyn StoreTxn, prefix: &[u8]) -> StoreResult<Vec<Transaction>> {
    let rows = txn.scan_prefix(prefix, 0, usize::MAX)?;
    let mut out = Vec::with_capacity(rows.len());
    for (_, reference) in rows {
        let hex = String::from_utf8(reference)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let hash =
            H256::from_hex(&hex).map_err(|e| StoreError::Serialization(e.to_string()))?;
        out.push(get_transaction(txn, &hash)?);
    }
    Ok(out)
}

/// Every persisted transaction sent by `from`.
pub fn transactions_by_from(txn: &mut dyn StoreTxn, from: &Address) -> StoreResult<Vec<Transaction>> {
    transactions_by_index(txn, &keys::transaction_from_prefix(from))
}

/// Every persisted transaction received by `to`.
pub fn transactions_by_to(txn: &mut dyn StoreTxn, to: &Address) -> StoreResult<Vec<Transaction>> {
    transactions_by_index(txn, &keys::transaction_to_prefix(to))
}
