//! Delegate membership directory.

use delcore_types::{NodeInfo, NodeType};

/// Node discovery and delegate membership, provided by the directory
/// collaborator. Read-only to the core; workers refetch the delegate set
/// every iteration so membership changes are picked up between gossips.
pub trait Directory: Send + Sync {
    /// The current delegate set.
    fn delegates(&self) -> Vec<NodeInfo>;

    /// This node's own descriptor.
    fn this_node(&self) -> NodeInfo;
}

/// A fixed-membership directory built from configuration.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    this: NodeInfo,
    nodes: Vec<NodeInfo>,
}

impl StaticDirectory {
    /// Creates a directory over a fixed node list.
    pub fn new(this: NodeInfo, nodes: Vec<NodeInfo>) -> Self {
        Self { this, nodes }
    }
}

impl Directory for StaticDirectory {
    fn delegates(&self) -> Vec<NodeInfo> {
        self.nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Delegate)
            .cloned()
            .collect()
    }

    fn this_node(&self) -> NodeInfo {
        self.this.clone()
    }
}
