//! Network node descriptors, provided by the directory collaborator.

use crate::Address;
use serde::{Deserialize, Serialize};

/// Node role within the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeType {
    /// Member of the fixed consensus set; may originate rumors and commit state
    Delegate,
    /// Bootstrap/seed node
    Seed,
    /// Any other participant
    #[default]
    Other,
}

/// A node known to the directory. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// The node's account address
    pub address: Address,
    /// The node's role
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Reachable RPC endpoint, e.g. `http://10.0.0.5:1975`
    pub endpoint: String,
}

impl NodeInfo {
    /// Creates a delegate descriptor.
    pub fn delegate(address: Address, endpoint: impl Into<String>) -> Self {
        Self {
            address,
            node_type: NodeType::Delegate,
            endpoint: endpoint.into(),
        }
    }

    /// Whether this node is a delegate.
    pub fn is_delegate(&self) -> bool {
        self.node_type == NodeType::Delegate
    }
}
