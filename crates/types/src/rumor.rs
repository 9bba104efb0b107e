//! Signed delegate assertions over observed transactions.

use crate::{Address, Error, Result, Signature, H256};
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};

/// A signed assertion by a delegate that it has observed a transaction.
///
/// `hash` is the Keccak256 digest of `address || tx_hash || time` and the
/// signature is taken over `hash`, so a rumor cannot be re-attributed to a
/// different delegate or transaction without breaking verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rumor {
    /// Digest of `address || tx_hash || time`
    pub hash: H256,
    /// The asserting delegate's address
    pub address: Address,
    /// The observed transaction hash
    pub tx_hash: H256,
    /// Observation time in milliseconds since epoch
    pub time: u64,
    /// ECDSA signature over `hash`
    pub signature: Signature,
}

impl Rumor {
    /// Computes the canonical rumor digest.
    pub fn digest(address: &Address, tx_hash: &H256, time: u64) -> H256 {
        H256::keccak256_concat(&[
            address.as_bytes(),
            tx_hash.as_bytes(),
            &time.to_be_bytes(),
        ])
    }

    /// Creates and signs a rumor asserting that `address` saw `tx_hash` at `time`.
    pub fn signed(
        signing_key: &SigningKey,
        address: Address,
        tx_hash: H256,
        time: u64,
    ) -> Result<Self> {
        let hash = Self::digest(&address, &tx_hash, time);
        let signature = Signature::sign_digest(signing_key, &hash)?;
        Ok(Self {
            hash,
            address,
            tx_hash,
            time,
            signature,
        })
    }

    /// Verifies the rumor's structural invariants.
    ///
    /// The stored `hash` must recompute and the signature must recover to
    /// the declared `address`.
    pub fn verify(&self) -> Result<()> {
        if self.hash != Self::digest(&self.address, &self.tx_hash, self.time) {
            return Err(Error::InvalidRumor("hash mismatch".into()));
        }
        let recovered = self.signature.recover(&self.hash)?;
        if recovered != self.address {
            return Err(Error::InvalidRumor(format!(
                "signature recovers to {recovered}, expected {}",
                self.address
            )));
        }
        Ok(())
    }
}
