//! Persistent key layout.
//!
//! | Key | Value |
//! |---|---|
//! | `tx:<hash>` | Transaction |
//! | `txFrom:<from>:<hash>` | reference to tx (hash hex) |
//! | `txTo:<to>:<hash>` | reference to tx (hash hex) |
//! | `receipt:<txHash>` | Receipt |
//! | `gossip:<txHash>` | Gossip |
//! | `account:<address>` | Account |

use delcore_types::{Address, H256};

/// Prefix for transactions by hash.
pub const TX_PREFIX: &str = "tx:";
/// Prefix for the sender secondary index.
pub const TX_FROM_PREFIX: &str = "txFrom:";
/// Prefix for the recipient secondary index.
pub const TX_TO_PREFIX: &str = "txTo:";
/// Prefix for receipts by transaction hash.
pub const RECEIPT_PREFIX: &str = "receipt:";
/// Prefix for gossips by transaction hash.
pub const GOSSIP_PREFIX: &str = "gossip:";
/// Prefix for accounts by address.
pub const ACCOUNT_PREFIX: &str = "account:";

/// `tx:<hash>`
pub fn transaction(hash: &H256) -> Vec<u8> {
    format!("{TX_PREFIX}{}", hash.to_plain_hex()).into_bytes()
}

/// `txFrom:<from>:<hash>`
pub fn transaction_from(from: &Address, hash: &H256) -> Vec<u8> {
    format!(
        "{TX_FROM_PREFIX}{}:{}",
        from.to_plain_hex(),
        hash.to_plain_hex()
    )
    .into_bytes()
}

/// `txTo:<to>:<hash>`
pub fn transaction_to(to: &Address, hash: &H256) -> Vec<u8> {
    format!(
        "{TX_TO_PREFIX}{}:{}",
        to.to_plain_hex(),
        hash.to_plain_hex()
    )
    .into_bytes()
}

/// Prefix of every sender-index row for `from`.
pub fn transaction_from_prefix(from: &Address) -> Vec<u8> {
    format!("{TX_FROM_PREFIX}{}:", from.to_plain_hex()).into_bytes()
}

/// Prefix of every recipient-index row for `to`.
pub fn transaction_to_prefix(to: &Address) -> Vec<u8> {
    format!("{TX_TO_PREFIX}{}:", to.to_plain_hex()).into_bytes()
}

/// `receipt:<txHash>`
pub fn receipt(hash: &H256) -> Vec<u8> {
    format!("{RECEIPT_PREFIX}{}", hash.to_plain_hex()).into_bytes()
}

/// `gossip:<txHash>`
pub fn gossip(hash: &H256) -> Vec<u8> {
    format!("{GOSSIP_PREFIX}{}", hash.to_plain_hex()).into_bytes()
}

/// `account:<address>`
pub fn account(address: &Address) -> Vec<u8> {
    format!("{ACCOUNT_PREFIX}{}", address.to_plain_hex()).into_bytes()
}
