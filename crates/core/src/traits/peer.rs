//! Peer gossip exchange transport.

use async_trait::async_trait;
use delcore_types::{Gossip, NodeInfo};
use thiserror::Error;

/// Errors surfaced by the peer transport.
///
/// Peer failures never touch receipts; the gossip worker retries by
/// re-submitting the gossip to its own channel.
#[derive(Error, Debug)]
pub enum PeerError {
    /// The peer was unreachable or the connection broke mid-exchange.
    #[error("peer transport error: {0}")]
    Transport(String),

    /// The peer answered with a protocol-level rejection.
    #[error("peer rejected gossip: {0}")]
    Rejected(String),
}

/// Client side of the symmetric gossip exchange.
///
/// The callee merges the offered gossip with its own cached state and
/// returns its post-merge gossip, so both sides converge. Implementations
/// must preserve rumor signatures byte-for-byte across the wire.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Offers `gossip` to `node` and returns the peer's merged gossip.
    async fn peer_gossip(&self, node: &NodeInfo, gossip: &Gossip) -> Result<Gossip, PeerError>;
}
