//! Transaction receipts: the observable outcome of a submitted transaction.

use crate::{Address, Status, H256};
use serde::{Deserialize, Serialize};

/// The observable outcome of a submitted transaction.
///
/// One receipt exists per transaction hash. It is created with status
/// [`Status::Pending`] at ingress, lives in cache while the transaction is
/// being gossiped, and is persisted with its terminal status at commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// The transaction this receipt describes
    pub transaction_hash: H256,
    /// Current status
    pub status: Status,
    /// Human-readable rendering of the status (may carry error detail)
    pub human_readable_status: String,
    /// Address of the deployed or invoked contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// Decoded contract return values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_result: Option<Vec<serde_json::Value>>,
    /// Creation time in milliseconds since epoch
    pub created: u64,
    /// Last update time in milliseconds since epoch
    pub updated: u64,
}

impl Receipt {
    /// Creates a pending receipt for a transaction.
    pub fn new(transaction_hash: H256, now_ms: u64) -> Self {
        Self::with_status(transaction_hash, Status::Pending, now_ms)
    }

    /// Creates a receipt with an explicit status.
    pub fn with_status(transaction_hash: H256, status: Status, now_ms: u64) -> Self {
        Self {
            transaction_hash,
            status,
            human_readable_status: status.human_readable().to_string(),
            contract_address: None,
            contract_result: None,
            created: now_ms,
            updated: now_ms,
        }
    }

    /// Transitions the receipt to a new status.
    pub fn set_status(&mut self, status: Status, now_ms: u64) {
        self.status = status;
        self.human_readable_status = status.human_readable().to_string();
        self.updated = now_ms;
    }

    /// Transitions the receipt to a new status with explicit detail text.
    pub fn set_status_with_detail(&mut self, status: Status, detail: impl Into<String>, now_ms: u64) {
        self.status = status;
        self.human_readable_status = detail.into();
        self.updated = now_ms;
    }
}
