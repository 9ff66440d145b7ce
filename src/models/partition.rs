use serde::{Deserialize, Serialize};
use super::{NodeId, PartitionId, TopicName};

/// Identifies one partition of a topic.
///
/// Ordered by topic, then partition number, so collections keyed by it
/// iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub topic: TopicName,
    pub partition: PartitionId,
}

impl PartitionKey {
    pub fn new(topic: impl Into<TopicName>, partition: PartitionId) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }

    /// Key of this partition's replica slot on `node_id`
    pub fn on_node(&self, node_id: NodeId) -> ReplicaPlacementKey {
        ReplicaPlacementKey::new(self.clone(), node_id)
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// One physical replica slot: a partition on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplicaPlacementKey {
    pub partition: PartitionKey,
    pub node_id: NodeId,
}

impl ReplicaPlacementKey {
    pub fn new(partition: PartitionKey, node_id: NodeId) -> Self {
        Self { partition, node_id }
    }
}

impl std::fmt::Display for ReplicaPlacementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.partition, self.node_id)
    }
}
