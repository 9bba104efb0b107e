//! This node's signing identity.

use delcore_crypto::{CryptoError, PrivateKey};
use delcore_types::{Address, Signature, H256};
use thiserror::Error;

/// Errors produced when signing.
#[derive(Error, Debug)]
pub enum SignerError {
    /// The underlying key material rejected the operation.
    #[error("signing failed: {0}")]
    Crypto(#[from] CryptoError),
}

/// The node's rumor-signing identity.
pub trait Signer: Send + Sync {
    /// The address this signer's signatures recover to.
    fn address(&self) -> Address;

    /// Signs a 32-byte digest.
    fn sign(&self, digest: &H256) -> Result<Signature, SignerError>;
}

/// A signer backed by an in-memory secp256k1 keypair.
pub struct KeypairSigner {
    key: PrivateKey,
    address: Address,
}

impl KeypairSigner {
    /// Creates a signer from a private key.
    pub fn new(key: PrivateKey) -> Self {
        let address = key.address();
        Self { key, address }
    }

    /// Borrows the underlying private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.key
    }
}

impl Signer for KeypairSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign(&self, digest: &H256) -> Result<Signature, SignerError> {
        Ok(self.key.sign_digest(digest)?)
    }
}
