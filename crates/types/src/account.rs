//! Account state: balances and contract origins.

use crate::{Address, H256};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Persistent account state.
///
/// Accounts are created on first reference and hold an arbitrary-width
/// non-negative balance; per-transaction values fit in 64 bits but balances
/// accumulate beyond that. Contract accounts additionally record the hash
/// of the transaction that deployed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The account address
    pub address: Address,
    /// Current balance; never negative at any persisted state
    pub balance: U256,
    /// Deploying transaction, for contract accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<H256>,
    /// Creation time in milliseconds since epoch
    pub created: u64,
    /// Last update time in milliseconds since epoch
    pub updated: u64,
}

impl Account {
    /// Creates a fresh zero-balance account.
    pub fn new(address: Address, now_ms: u64) -> Self {
        Self {
            address,
            balance: U256::ZERO,
            transaction_hash: None,
            created: now_ms,
            updated: now_ms,
        }
    }

    /// Creates a contract account linked to its deploying transaction.
    pub fn contract(address: Address, transaction_hash: H256, now_ms: u64) -> Self {
        Self {
            address,
            balance: U256::ZERO,
            transaction_hash: Some(transaction_hash),
            created: now_ms,
            updated: now_ms,
        }
    }

    /// Whether the account can cover `value`.
    pub fn can_debit(&self, value: u64) -> bool {
        self.balance >= U256::from(value)
    }

    /// Debits `value`; the caller must have checked [`Account::can_debit`].
    pub fn debit(&mut self, value: u64) {
        self.balance = self.balance.saturating_sub(U256::from(value));
    }

    /// Credits `value`.
    pub fn credit(&mut self, value: u64) {
        self.balance = self.balance.saturating_add(U256::from(value));
    }
}
