use serde::{Deserialize, Serialize};
use super::{Node, NodeId, PartitionId, PartitionKey, ReplicaPlacementKey, TopicName};

/// Reassignment progress of a replica, as reported by the admin layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplicaState {
    /// No reassignment in flight
    #[default]
    Settled,
    /// Being added to the partition's replica set
    Joining,
    /// Being removed from the partition's replica set
    Leaving,
    /// Future copy in a new data directory on the same node
    FutureCopy,
}

impl ReplicaState {
    /// Map the raw adding/removing/future flags reported by the cluster.
    ///
    /// A future copy takes precedence over adding, adding over removing.
    pub fn from_flags(is_adding: bool, is_removing: bool, is_future: bool) -> Self {
        if is_future {
            ReplicaState::FutureCopy
        } else if is_adding {
            ReplicaState::Joining
        } else if is_removing {
            ReplicaState::Leaving
        } else {
            ReplicaState::Settled
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, ReplicaState::Settled)
    }
}

/// One physical copy of a partition, hosted on one node.
///
/// Replicas are immutable; use [`Replica::evolve`] to derive a modified copy.
/// On the wire a replica is the admin layer's flat record, with the
/// transition state spelled as `is_adding`/`is_removing`/`is_future` flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReplicaRecord", into = "ReplicaRecord")]
pub struct Replica {
    pub partition: PartitionKey,
    pub node: Node,
    /// Data directory on the node. `None` while unknown.
    pub path: Option<String>,
    pub lag: u64,
    pub size: u64,
    pub in_sync: bool,
    pub is_offline: bool,
    /// Currently serving reads and writes
    pub is_leader: bool,
    /// Designated leader once the cluster converges
    pub is_preferred_leader: bool,
    pub state: ReplicaState,
}

/// Replica record as reported by the admin layer
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReplicaRecord {
    partition: PartitionKey,
    node: Node,
    path: Option<String>,
    lag: u64,
    size: u64,
    in_sync: bool,
    is_offline: bool,
    is_leader: bool,
    is_preferred_leader: bool,
    #[serde(default)]
    is_adding: bool,
    #[serde(default)]
    is_removing: bool,
    #[serde(default)]
    is_future: bool,
}

impl From<ReplicaRecord> for Replica {
    fn from(record: ReplicaRecord) -> Self {
        Self {
            state: ReplicaState::from_flags(record.is_adding, record.is_removing, record.is_future),
            partition: record.partition,
            node: record.node,
            path: record.path,
            lag: record.lag,
            size: record.size,
            in_sync: record.in_sync,
            is_offline: record.is_offline,
            is_leader: record.is_leader,
            is_preferred_leader: record.is_preferred_leader,
        }
    }
}

impl From<Replica> for ReplicaRecord {
    fn from(replica: Replica) -> Self {
        Self {
            is_adding: replica.is_adding(),
            is_removing: replica.is_removing(),
            is_future: replica.is_future(),
            partition: replica.partition,
            node: replica.node,
            path: replica.path,
            lag: replica.lag,
            size: replica.size,
            in_sync: replica.in_sync,
            is_offline: replica.is_offline,
            is_leader: replica.is_leader,
            is_preferred_leader: replica.is_preferred_leader,
        }
    }
}

impl Replica {
    /// Start building a settled follower replica with zeroed runtime fields
    pub fn builder(partition: PartitionKey, node: Node) -> ReplicaBuilder {
        ReplicaBuilder {
            replica: Replica {
                partition,
                node,
                path: None,
                lag: 0,
                size: 0,
                in_sync: false,
                is_offline: false,
                is_leader: false,
                is_preferred_leader: false,
                state: ReplicaState::Settled,
            },
        }
    }

    /// Start building a copy of this replica with some fields overridden
    pub fn evolve(&self) -> ReplicaBuilder {
        ReplicaBuilder {
            replica: self.clone(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.partition.topic
    }

    pub fn partition_id(&self) -> PartitionId {
        self.partition.partition
    }

    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    pub fn placement_key(&self) -> ReplicaPlacementKey {
        self.partition.on_node(self.node.id)
    }

    pub fn is_adding(&self) -> bool {
        self.state == ReplicaState::Joining
    }

    pub fn is_removing(&self) -> bool {
        self.state == ReplicaState::Leaving
    }

    pub fn is_future(&self) -> bool {
        self.state == ReplicaState::FutureCopy
    }
}

/// Builder for [`Replica`]; every setter overrides one field
#[derive(Debug, Clone)]
pub struct ReplicaBuilder {
    replica: Replica,
}

impl ReplicaBuilder {
    pub fn topic(mut self, topic: impl Into<TopicName>) -> Self {
        self.replica.partition.topic = topic.into();
        self
    }

    pub fn partition(mut self, partition: PartitionId) -> Self {
        self.replica.partition.partition = partition;
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.replica.node = node;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.replica.path = Some(path.into());
        self
    }

    pub fn unknown_path(mut self) -> Self {
        self.replica.path = None;
        self
    }

    pub fn lag(mut self, lag: u64) -> Self {
        self.replica.lag = lag;
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.replica.size = size;
        self
    }

    pub fn in_sync(mut self, in_sync: bool) -> Self {
        self.replica.in_sync = in_sync;
        self
    }

    pub fn offline(mut self, is_offline: bool) -> Self {
        self.replica.is_offline = is_offline;
        self
    }

    pub fn leader(mut self, is_leader: bool) -> Self {
        self.replica.is_leader = is_leader;
        self
    }

    pub fn preferred_leader(mut self, is_preferred_leader: bool) -> Self {
        self.replica.is_preferred_leader = is_preferred_leader;
        self
    }

    pub fn state(mut self, state: ReplicaState) -> Self {
        self.replica.state = state;
        self
    }

    pub fn build(self) -> Replica {
        self.replica
    }
}
