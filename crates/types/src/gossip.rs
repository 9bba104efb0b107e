//! Gossip messages: one transaction plus the rumors seen for it.

use crate::{Address, Rumor, Transaction};
use serde::{Deserialize, Serialize};

/// A gossip message carrying one transaction and the set of rumors seen
/// for it.
///
/// The rumor set is keyed by delegate address: at most one rumor per
/// address, every rumor referencing `transaction.hash`. Both invariants are
/// maintained by [`Gossip::add_rumor`] and restored by [`Gossip::sanitized`]
/// for messages received off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gossip {
    /// The transaction being gossiped
    pub transaction: Transaction,
    /// Rumors observed for the transaction, at most one per address
    pub rumors: Vec<Rumor>,
}

impl Gossip {
    /// Creates a gossip for a transaction with no rumors yet.
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            rumors: Vec::new(),
        }
    }

    /// Whether a rumor from `address` is already present.
    pub fn contains_rumor(&self, address: &Address) -> bool {
        self.rumors.iter().any(|r| &r.address == address)
    }

    /// Adds a rumor unless one from the same address is already present.
    ///
    /// Returns true if the rumor was added.
    pub fn add_rumor(&mut self, rumor: Rumor) -> bool {
        if self.contains_rumor(&rumor.address) {
            return false;
        }
        self.rumors.push(rumor);
        true
    }

    /// Returns a copy retaining only rumors that verify and reference this
    /// gossip's transaction, deduplicated by address.
    ///
    /// Wire input is untrusted; quorum counting must only ever see the
    /// sanitized set.
    pub fn sanitized(&self) -> Self {
        let mut out = Self::new(self.transaction.clone());
        for rumor in &self.rumors {
            if rumor.tx_hash != self.transaction.hash {
                continue;
            }
            if rumor.verify().is_err() {
                continue;
            }
            out.add_rumor(rumor.clone());
        }
        out
    }

    /// Validates that the rumor timestamps fall within `window_ms`.
    ///
    /// A spread wider than the window means the rumor set was assembled
    /// over more hops than the policy allows (stale or malicious fan-in).
    /// Vacuously true for fewer than two rumors.
    pub fn validate_time_delta(&self, window_ms: u64) -> bool {
        if self.rumors.len() < 2 {
            return true;
        }
        let min = self.rumors.iter().map(|r| r.time).min().unwrap_or(0);
        let max = self.rumors.iter().map(|r| r.time).max().unwrap_or(0);
        max - min <= window_ms
    }

    /// The earliest rumor time, falling back to the transaction time when
    /// no rumor is present.
    pub fn first_rumor_time(&self) -> u64 {
        self.rumors
            .first()
            .map(|r| r.time)
            .unwrap_or(self.transaction.time)
    }
}
