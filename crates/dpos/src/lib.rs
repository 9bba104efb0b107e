//! # delcore DPoS Core
//!
//! The transaction admission and execution pipeline:
//!
//! - ingress validation and receipt creation ([`DposService::submit`])
//! - the rumor-gossip synchronization worker that drives a transaction to
//!   quorum across the delegate set
//! - the time- and quorum-gated [`queue::GossipQueue`] releasing gossips
//!   for execution
//! - the execution worker that deterministically mutates accounts under a
//!   per-hash lock and commits atomically
//!
//! The core owns no I/O: storage, cache, peers, VM, clock, and signing all
//! arrive through [`context::CoreContext`].

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod context;
pub mod locks;
pub mod queue;
pub mod service;

mod executor;
mod gossip;

pub use context::{CoreContext, Policy};
pub use locks::HashLocks;
pub use queue::GossipQueue;
pub use service::DposService;

use delcore_core::{PeerError, StoreError};
use delcore_vm::VmError;
use thiserror::Error;

/// Rumors required for quorum over a delegate set of the given size:
/// ⌈2N/3⌉ distinct verified rumors.
pub fn quorum_threshold(delegate_count: usize) -> usize {
    (2 * delegate_count).div_ceil(3)
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error kinds raised by the core, grouped by how they propagate.
///
/// Validation and policy failures become terminal receipts; peer failures
/// trigger channel re-submission and never touch receipts; store conflicts
/// are recovered silently; everything else surfaces as an internal error
/// on the receipt.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Hash mismatch, bad signature, or malformed fields.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Late arrival, duplicate, insufficient balance, or an unknown
    /// transaction type.
    #[error("policy violation: {0}")]
    Policy(String),

    /// Another worker or delegate got there first.
    #[error("lost race: {0}")]
    Race(String),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Peer transport failure.
    #[error(transparent)]
    Peer(#[from] PeerError),

    /// VM or ABI failure.
    #[error(transparent)]
    Vm(#[from] VmError),

    /// Signing failure on this node's own identity.
    #[error("signer failure: {0}")]
    Signer(String),

    /// The operation requires delegate membership.
    #[error("this node is not a delegate")]
    NotDelegate,
}
