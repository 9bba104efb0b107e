//! Typed transactions: token transfers, contract deployment, contract calls.
//!
//! This module provides:
//! - [`Transaction`] - the core transaction structure with typed dispatch
//! - [`Signature`] - ECDSA signature components (v, r, s)
//! - [`TxType`] - transaction type enumeration
//!
//! A transaction's `hash` is the Keccak256 digest of its canonical encoding
//! (every field except `hash` and `signature`), and its `signature` is an
//! ECDSA-recoverable signature over that hash. [`Transaction::verify`]
//! enforces both: the hash must recompute and the signature must recover to
//! the `from` address.

use crate::{Address, Error, Result, H256};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Transaction type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum TxType {
    /// Move tokens from `from` to `to`
    #[default]
    TransferTokens = 0x00,
    /// Deploy the contract artifact carried in `code`
    DeploySmartContract = 0x01,
    /// Invoke `method` on the contract deployed at `to`
    ExecuteSmartContract = 0x02,
}

impl TxType {
    /// Returns the transaction type byte.
    pub const fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Creates a TxType from a byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Self::TransferTokens),
            0x01 => Ok(Self::DeploySmartContract),
            0x02 => Ok(Self::ExecuteSmartContract),
            _ => Err(Error::InvalidTransaction(format!(
                "unknown transaction type: 0x{:02x}",
                byte
            ))),
        }
    }
}

/// ECDSA signature components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Signature {
    /// Recovery ID (0 or 1)
    pub v: u8,
    /// R component (32 bytes)
    pub r: H256,
    /// S component (32 bytes)
    pub s: H256,
}

impl Signature {
    /// Creates a new signature from components.
    pub const fn new(v: u8, r: H256, s: H256) -> Self {
        Self { v, r, s }
    }

    /// Checks if this is a plausible signature (non-zero r and s).
    pub fn is_valid(&self) -> bool {
        !self.r.is_zero() && !self.s.is_zero()
    }

    /// Creates a signature from raw bytes (65 bytes: r[32] || s[32] || v[1]).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            return Err(Error::InvalidLength {
                expected: 65,
                actual: bytes.len(),
            });
        }
        let r = H256::from_slice(&bytes[0..32])?;
        let s = H256::from_slice(&bytes[32..64])?;
        Ok(Self { v: bytes[64], r, s })
    }

    /// Converts the signature to raw bytes (65 bytes: r[32] || s[32] || v[1]).
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(self.r.as_bytes());
        bytes[32..64].copy_from_slice(self.s.as_bytes());
        bytes[64] = self.v;
        bytes
    }

    /// Signs a 32-byte digest with the given key.
    pub fn sign_digest(signing_key: &SigningKey, digest: &H256) -> Result<Self> {
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| Error::Signature(e.to_string()))?;

        let sig_bytes = signature.to_bytes();
        let r = H256::from_slice(&sig_bytes[0..32])?;
        let s = H256::from_slice(&sig_bytes[32..64])?;

        Ok(Self::new(recovery_id.to_byte(), r, s))
    }

    /// Recovers the signing address from a 32-byte digest.
    pub fn recover(&self, digest: &H256) -> Result<Address> {
        let mut sig_bytes = [0u8; 64];
        sig_bytes[0..32].copy_from_slice(self.r.as_bytes());
        sig_bytes[32..64].copy_from_slice(self.s.as_bytes());

        let signature = K256Signature::from_bytes((&sig_bytes).into())
            .map_err(|e| Error::Signature(e.to_string()))?;

        let recovery_id = RecoveryId::from_byte(self.v)
            .ok_or_else(|| Error::Signature("invalid recovery id".into()))?;

        let verifying_key =
            VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
                .map_err(|e| Error::Signature(e.to_string()))?;

        // Uncompressed public key is 65 bytes with a 0x04 SEC1 prefix.
        let encoded = verifying_key.to_encoded_point(false);
        let pubkey = encoded.as_bytes();

        let hash = Keccak256::digest(&pubkey[1..]);
        let mut addr_bytes = [0u8; 20];
        addr_bytes.copy_from_slice(&hash[12..32]);

        Ok(Address::from(addr_bytes))
    }
}

/// A signed transaction observed by the delegate set.
///
/// `hash` is the canonical Keccak256 digest of the remaining fields and
/// `signature` is taken over `hash`. `to` is `None` only for contract
/// deployment; `code`, `abi`, `method` and `params` are populated according
/// to the transaction type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Canonical transaction hash
    pub hash: H256,
    /// Transaction type (typed dispatch, not inferred from field presence)
    #[serde(rename = "type")]
    pub tx_type: TxType,
    /// Sender address
    pub from: Address,
    /// Recipient address (None only for contract deployment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Token amount being transferred
    pub value: u64,
    /// Contract artifact bytes (deploy only)
    #[serde(default, with = "hex_bytes", skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<u8>,
    /// Hex-encoded JSON interface descriptor (deploy/execute)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub abi: String,
    /// Method to invoke (execute only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    /// Typed argument list (execute only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<serde_json::Value>,
    /// Client-chosen timestamp in milliseconds since epoch
    pub time: u64,
    /// ECDSA signature over `hash`
    pub signature: Signature,
}

impl Transaction {
    /// Creates an unsigned transfer; call [`Transaction::finalize`] to hash and sign it.
    pub fn transfer(from: Address, to: Address, value: u64, time: u64) -> Self {
        Self {
            hash: H256::ZERO,
            tx_type: TxType::TransferTokens,
            from,
            to: Some(to),
            value,
            code: Vec::new(),
            abi: String::new(),
            method: String::new(),
            params: Vec::new(),
            time,
            signature: Signature::default(),
        }
    }

    /// Creates an unsigned contract deployment.
    pub fn deploy(from: Address, code: Vec<u8>, abi: String, time: u64) -> Self {
        Self {
            hash: H256::ZERO,
            tx_type: TxType::DeploySmartContract,
            from,
            to: None,
            value: 0,
            code,
            abi,
            method: String::new(),
            params: Vec::new(),
            time,
            signature: Signature::default(),
        }
    }

    /// Creates an unsigned contract invocation.
    pub fn execute(
        from: Address,
        contract: Address,
        method: impl Into<String>,
        params: Vec<serde_json::Value>,
        time: u64,
    ) -> Self {
        Self {
            hash: H256::ZERO,
            tx_type: TxType::ExecuteSmartContract,
            from,
            to: Some(contract),
            value: 0,
            code: Vec::new(),
            abi: String::new(),
            method: method.into(),
            params,
            time,
            signature: Signature::default(),
        }
    }

    /// Computes the canonical digest over every field except `hash` and
    /// `signature`.
    pub fn canonical_digest(&self) -> H256 {
        let mut hasher = Keccak256::new();
        hasher.update([self.tx_type.as_byte()]);
        hasher.update(self.from.as_bytes());
        if let Some(to) = &self.to {
            hasher.update(to.as_bytes());
        }
        hasher.update(self.value.to_be_bytes());
        hasher.update(&self.code);
        hasher.update(self.abi.as_bytes());
        hasher.update(self.method.as_bytes());
        for param in &self.params {
            hasher.update(param.to_string().as_bytes());
        }
        hasher.update(self.time.to_be_bytes());

        let result = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        H256::new(bytes)
    }

    /// Stamps the canonical hash and signs it with the given key.
    ///
    /// The key must correspond to the `from` address or [`Transaction::verify`]
    /// will reject the result.
    pub fn finalize(mut self, signing_key: &SigningKey) -> Result<Self> {
        self.hash = self.canonical_digest();
        self.signature = Signature::sign_digest(signing_key, &self.hash)?;
        Ok(self)
    }

    /// Verifies the transaction's structural invariants.
    ///
    /// The stored `hash` must equal the canonical digest and the signature
    /// must recover to the `from` address. Deployments must carry no `to`
    /// address; every other type must carry one.
    pub fn verify(&self) -> Result<()> {
        match self.tx_type {
            TxType::DeploySmartContract => {
                if self.to.is_some() {
                    return Err(Error::InvalidTransaction(
                        "deployment must not carry a recipient".into(),
                    ));
                }
            }
            _ => {
                if self.to.is_none() {
                    return Err(Error::InvalidTransaction("missing recipient".into()));
                }
            }
        }

        if self.hash != self.canonical_digest() {
            return Err(Error::InvalidTransaction("hash mismatch".into()));
        }

        let recovered = self.signature.recover(&self.hash)?;
        if recovered != self.from {
            return Err(Error::InvalidTransaction(format!(
                "signature recovers to {recovered}, expected {}",
                self.from
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tx {{ hash: {}, type: {:?}, from: {}, to: {}, value: {} }}",
            self.hash,
            self.tx_type,
            self.from,
            self.to
                .map(|a| a.to_string())
                .unwrap_or_else(|| "DEPLOY".to_string()),
            self.value
        )
    }
}

/// Serde helper for serializing bytes as hex.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
