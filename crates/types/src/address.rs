//! 20-byte secp256k1-derived address type.
//!
//! This module provides the [`Address`] type, which represents a network
//! address as a 20-byte array. It supports:
//!
//! - Hex encoding/decoding with `0x` prefix
//! - Serde serialization as hex strings
//! - Derivation from an uncompressed secp256k1 public key

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Size of an address in bytes
pub const ADDRESS_SIZE: usize = 20;

/// A 20-byte account address.
///
/// Addresses are the last 20 bytes of the Keccak256 hash of the holder's
/// uncompressed public key and are displayed as 40 hex characters with a
/// `0x` prefix.
///
/// # Example
///
/// ```rust
/// use delcore_types::Address;
///
/// let addr: Address = "0x742d35cc6634c0532925a3b844bc9e7595f0beb1".parse().unwrap();
/// assert!(!addr.is_zero());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// The zero address (0x0000000000000000000000000000000000000000)
    pub const ZERO: Self = Self([0u8; ADDRESS_SIZE]);

    /// Creates a new address from a 20-byte array.
    #[inline]
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice.
    ///
    /// Returns an error if the slice length is not exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != ADDRESS_SIZE {
            return Err(Error::InvalidLength {
                expected: ADDRESS_SIZE,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Returns the address as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the address as a fixed-size byte array.
    #[inline]
    pub const fn as_fixed_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Checks if this is the zero address.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Creates an address from its hex representation.
    ///
    /// The input can optionally have a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let s = s.strip_prefix("0X").unwrap_or(s);

        if s.len() != 40 {
            return Err(Error::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                s.len()
            )));
        }

        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Returns the hex representation with 0x prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Returns the bare hex representation, as used in store keys.
    pub fn to_plain_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Derives an address from an uncompressed public key.
    ///
    /// Takes the last 20 bytes of the Keccak256 hash of the public key
    /// (without the 0x04 SEC1 prefix byte).
    pub fn from_public_key(pubkey: &[u8]) -> Self {
        let hash = Keccak256::digest(pubkey);
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&hash[12..32]);
        Self(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; ADDRESS_SIZE] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_hex_roundtrip() {
        let hex_str = "0x742d35cc6634c0532925a3b844bc9e7595f0beb1";
        let addr = Address::from_hex(hex_str).unwrap();
        assert_eq!(addr.to_hex(), hex_str);
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::ZERO.to_hex(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_invalid_address() {
        assert!(Address::from_hex("0xabcd").is_err());
        assert!(Address::from_hex(&"a".repeat(41)).is_err());
    }

    #[test]
    fn test_address_serde() {
        let addr = Address::from([0x11; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
