//! The explicit dependency context handed to workers and API handlers.

use delcore_cache::ChainCache;
use delcore_core::{Clock, Directory, PeerClient, Publisher, Signer, Store};
use delcore_vm::Vm;
use std::sync::Arc;

/// Admission and execution timing policy.
///
/// These are policy knobs, not protocol constants; they arrive from
/// configuration.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    /// How far in the past a transaction's timestamp may lie at ingress,
    /// and the staleness bound between a transaction and its first rumor.
    pub tx_receive_timeout_ms: u64,
    /// Per-delegate hop budget; the rumor-spread window and the execution
    /// release delay both scale this by the delegate count.
    pub gossip_timeout_ms: u64,
    /// Re-submission bound per transaction hash before the gossip worker
    /// gives up on a gossip.
    pub max_gossip_attempts: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            tx_receive_timeout_ms: 3_000,
            gossip_timeout_ms: 200,
            max_gossip_attempts: 8,
        }
    }
}

/// Every collaborator the core touches, threaded explicitly instead of
/// through process-wide singletons.
#[derive(Clone)]
pub struct CoreContext {
    /// Durable key-value backing
    pub store: Arc<dyn Store>,
    /// Shared TTL caches
    pub cache: Arc<ChainCache>,
    /// Delegate membership
    pub directory: Arc<dyn Directory>,
    /// Smart-contract engine
    pub vm: Arc<dyn Vm>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// This node's rumor-signing identity
    pub signer: Arc<dyn Signer>,
    /// Peer gossip transport
    pub peers: Arc<dyn PeerClient>,
    /// Publish/subscribe hand-off
    pub publisher: Arc<dyn Publisher>,
    /// Timing policy
    pub policy: Policy,
}
