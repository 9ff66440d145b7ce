// Type aliases used across models
pub type NodeId = u32;
pub type TopicName = String;
pub type PartitionId = u32;

// Module declarations
mod node;
mod partition;
mod replica;
mod cluster;

// Re-exports
pub use node::Node;
pub use partition::{PartitionKey, ReplicaPlacementKey};
pub use replica::{Replica, ReplicaBuilder, ReplicaState};
pub use cluster::{find_divergent_partitions, placement_match, ClusterSnapshot};
