use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use super::NodeId;

/// A storage node hosting replicas.
///
/// Two descriptors with the same `id` denote the same node, whatever
/// host and port they report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub host: String,
    pub port: i32,
}

impl Node {
    pub fn new(id: NodeId, host: impl Into<String>, port: i32) -> Self {
        Self {
            id,
            host: host.into(),
            port,
        }
    }

    /// Descriptor for a node known only by id (no reachable endpoint yet)
    pub fn unknown(id: NodeId) -> Self {
        Self::new(id, "", -1)
    }

    pub fn has_endpoint(&self) -> bool {
        !self.host.is_empty() && self.port >= 0
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_endpoint() {
            write!(f, "node {} ({}:{})", self.id, self.host, self.port)
        } else {
            write!(f, "node {}", self.id)
        }
    }
}
