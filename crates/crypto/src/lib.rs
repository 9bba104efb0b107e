//! # delcore Crypto
//!
//! secp256k1 key material for delcore nodes.
//!
//! This crate wraps the `k256` signing primitives behind two small types:
//!
//! - [`PrivateKey`] - 32-byte secret key with recoverable prehash signing
//! - [`PublicKey`] - uncompressed public key with address derivation
//!
//! Signature verification lives with the data it protects: transactions and
//! rumors recover the signer via `delcore_types::Signature::recover`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

use delcore_types::{Address, Signature, H256};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::SecretKey;
use rand::rngs::OsRng;

/// Result type alias for crypto operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur when handling key material
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Invalid hex encoding
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Byte string has the wrong length for the key type
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Bytes do not form a valid secp256k1 secret key
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Signing failed
    #[error("signature error: {0}")]
    Signature(String),
}

/// ECDSA private key (32 bytes).
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generates a random private key using the OS entropy source.
    pub fn random() -> Self {
        let secret_key = SecretKey::random(&mut OsRng);
        Self {
            inner: SigningKey::from(secret_key),
        }
    }

    /// Creates a private key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let secret_key = SecretKey::from_bytes(bytes.into())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self {
            inner: SigningKey::from(secret_key),
        })
    }

    /// Creates a private key from a hex string (with or without 0x prefix).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex)?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Self::from_bytes(&arr)
    }

    /// Returns the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: *self.inner.verifying_key(),
        }
    }

    /// Returns the address derived from the corresponding public key.
    pub fn address(&self) -> Address {
        self.public_key().to_address()
    }

    /// Signs a 32-byte digest, producing a recoverable signature.
    pub fn sign_digest(&self, digest: &H256) -> Result<Signature> {
        Signature::sign_digest(&self.inner, digest)
            .map_err(|e| CryptoError::Signature(e.to_string()))
    }

    /// Borrows the underlying signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never render secret material.
        write!(f, "PrivateKey({})", self.address())
    }
}

/// ECDSA public key on the secp256k1 curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Returns the uncompressed SEC1 encoding (65 bytes, 0x04 prefix).
    pub fn to_uncompressed_bytes(&self) -> Vec<u8> {
        self.inner.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Derives the address: last 20 bytes of Keccak256 over the
    /// uncompressed public key without the SEC1 prefix byte.
    pub fn to_address(&self) -> Address {
        let encoded = self.inner.to_encoded_point(false);
        Address::from_public_key(&encoded.as_bytes()[1..])
    }
}
