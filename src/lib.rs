// Replica Placement Model
// Settled allocations of a partitioned, replicated log cluster: validation,
// replica migration, preferred-leader handoff and placement diffing.

pub mod models;
pub mod allocation;
pub mod actions;
pub mod policy;

pub use models::{
    find_divergent_partitions, placement_match, ClusterSnapshot, Node, NodeId, PartitionId,
    PartitionKey, Replica, ReplicaBuilder, ReplicaPlacementKey, ReplicaState, TopicName,
};
pub use allocation::{AllocationView, ValidationError};
pub use actions::{Action, MigrationPlan, PlanSummary};
pub use policy::MigrationPolicy;

pub type Result<T> = std::result::Result<T, AllocationError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("Invalid allocation: {0}")]
    Validation(#[from] ValidationError),

    #[error("Replica not found: {0}")]
    ReplicaNotFound(ReplicaPlacementKey),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
