//! # delcore Types
//!
//! Core type definitions for the delcore delegate network.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - [`Address`] - 20-byte secp256k1-derived addresses
//! - [`H256`] - 32-byte hashes with Keccak256 support
//! - [`Transaction`] - typed transactions (transfer / deploy / execute)
//! - [`Rumor`] and [`Gossip`] - the admission protocol messages
//! - [`Receipt`] and [`Account`] - the observable execution outcomes
//! - [`Status`] and [`ApiResponse`] - the wire-visible response envelope

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod account;
pub mod address;
pub mod gossip;
pub mod hash;
pub mod node;
pub mod receipt;
pub mod rumor;
pub mod status;
pub mod transaction;

// Re-export main types at crate root
pub use account::Account;
pub use address::Address;
pub use gossip::Gossip;
pub use hash::H256;
pub use node::{NodeInfo, NodeType};
pub use receipt::Receipt;
pub use rumor::Rumor;
pub use status::{ApiResponse, Status};
pub use transaction::{Signature, Transaction, TxType};

/// Result type alias for delcore type operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with delcore types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Invalid length for a fixed-size type
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid address format
    #[error("invalid address format: {0}")]
    InvalidAddress(String),

    /// Invalid hash format
    #[error("invalid hash format: {0}")]
    InvalidHash(String),

    /// Invalid transaction
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Invalid rumor
    #[error("invalid rumor: {0}")]
    InvalidRumor(String),

    /// Signature error
    #[error("signature error: {0}")]
    Signature(String),
}
