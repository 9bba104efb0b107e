//! Peer gossip transport over HTTP JSON-RPC.

use crate::api::PeerApiClient;
use async_trait::async_trait;
use delcore_core::{PeerClient, PeerError};
use delcore_types::{Gossip, NodeInfo};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

/// Peer transport over the `peer_*` namespace.
///
/// Clients are built lazily and reused per endpoint. Rumor signatures
/// travel inside the gossip JSON untouched, so the exchange preserves
/// them byte-for-byte.
pub struct HttpPeerClient {
    request_timeout: Duration,
    clients: RwLock<HashMap<String, HttpClient>>,
}

impl HttpPeerClient {
    /// Creates a client pool with the given per-request timeout.
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            clients: RwLock::new(HashMap::new()),
        }
    }

    fn client_for(&self, endpoint: &str) -> Result<HttpClient, PeerError> {
        if let Some(client) = self.clients.read().get(endpoint) {
            return Ok(client.clone());
        }
        let client = HttpClientBuilder::default()
            .request_timeout(self.request_timeout)
            .build(endpoint)
            .map_err(|e| PeerError::Transport(e.to_string()))?;
        self.clients
            .write()
            .insert(endpoint.to_string(), client.clone());
        Ok(client)
    }
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn peer_gossip(&self, node: &NodeInfo, gossip: &Gossip) -> Result<Gossip, PeerError> {
        let client = self.client_for(&node.endpoint)?;
        client
            .gossip(gossip.clone())
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }
}
