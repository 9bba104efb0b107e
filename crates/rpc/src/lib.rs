//! # delcore RPC
//!
//! The JSON-RPC surface of a delcore node, over HTTP with JSON bodies:
//!
//! - the client namespace (`dc_*`): transaction submission, receipt and
//!   account lookups, paginated scans, queue observability, subscriptions
//! - the peer namespace (`peer_*`): the symmetric gossip exchange
//!
//! [`HttpPeerClient`] implements the core's `PeerClient` seam over the
//! same wire protocol, so two delcore nodes converge by calling each
//! other's `peer_gossip`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod api;
pub mod client;
pub mod server;

pub use api::{DelegateApiImpl, DelegateApiServer, PeerApiImpl, PeerApiServer};
pub use client::HttpPeerClient;
pub use server::{build_module, serve, RpcServerConfig};

// Callers manage the running server through its handle without needing a
// direct jsonrpsee dependency.
pub use jsonrpsee::server::ServerHandle;

use thiserror::Error;

/// Errors raised while standing up or running the RPC server.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The listen address could not be parsed or bound.
    #[error("failed to bind rpc server: {0}")]
    Bind(String),

    /// Method registration failed.
    #[error("internal rpc error: {0}")]
    Internal(String),
}
