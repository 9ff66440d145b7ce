use std::collections::HashMap;
use tracing::debug;
use crate::models::*;
use crate::policy::MigrationPolicy;
use crate::{AllocationError, Result};

/// Reasons a snapshot cannot be used as a settled allocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("replica {replica} has a reassignment in flight ({state:?})")]
    ReplicaInTransition {
        replica: ReplicaPlacementKey,
        state: ReplicaState,
    },

    #[error("no preferred leader for partition {0}")]
    NoPreferredLeader(PartitionKey),

    #[error("duplicate preferred leader for partition {partition} on nodes {nodes:?}")]
    DuplicatePreferredLeader {
        partition: PartitionKey,
        nodes: Vec<NodeId>,
    },

    #[error("more than one replica placed at {0}")]
    DuplicatePlacement(ReplicaPlacementKey),
}

/// A validated, settled replica allocation.
///
/// Every replica is [`ReplicaState::Settled`] and every partition has exactly
/// one preferred leader. A node also holds at most one replica of a
/// partition: two records for the same partition and node are rejected as
/// [`ValidationError::DuplicatePlacement`], even when the leader count is
/// right. Mutations never modify a view; they return a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationView {
    snapshot: ClusterSnapshot,
    placements: HashMap<ReplicaPlacementKey, usize>,
    policy: MigrationPolicy,
}

impl AllocationView {
    /// Validate a snapshot under the default [`MigrationPolicy`]
    pub fn of(snapshot: ClusterSnapshot) -> Result<Self> {
        Self::with_policy(snapshot, MigrationPolicy::default())
    }

    pub fn with_policy(snapshot: ClusterSnapshot, policy: MigrationPolicy) -> Result<Self> {
        let placements = index_placements(&snapshot).map_err(|err| {
            debug!(error = %err, "rejected cluster snapshot");
            err
        })?;

        Ok(Self {
            snapshot,
            placements,
            policy,
        })
    }

    pub fn snapshot(&self) -> &ClusterSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> ClusterSnapshot {
        self.snapshot
    }

    pub fn policy(&self) -> &MigrationPolicy {
        &self.policy
    }

    pub fn partition_keys(&self) -> impl Iterator<Item = &PartitionKey> + '_ {
        self.snapshot.partition_keys()
    }

    pub fn replicas(&self) -> &[Replica] {
        self.snapshot.replicas()
    }

    pub fn replicas_of(&self, partition: &PartitionKey) -> Vec<&Replica> {
        self.snapshot.replicas_of(partition)
    }

    pub fn replica(&self, key: &ReplicaPlacementKey) -> Option<&Replica> {
        self.placements
            .get(key)
            .map(|&idx| &self.snapshot.replicas()[idx])
    }

    pub fn preferred_leader(&self, partition: &PartitionKey) -> Option<&Replica> {
        self.snapshot.preferred_leader(partition)
    }

    /// Move the replica at `source` to `target_node`, into `target_path`.
    ///
    /// The new copy is a fresh replica: zero lag, not in sync, not serving.
    /// It keeps the preferred-leader designation of the replica it
    /// replaces, and its size follows the view's [`MigrationPolicy`].
    /// Replication factor is unchanged.
    pub fn migrate_replica(
        &self,
        source: &ReplicaPlacementKey,
        target_node: NodeId,
        target_path: Option<&str>,
    ) -> Result<AllocationView> {
        let target_path = target_path.ok_or(AllocationError::MissingArgument("target_path"))?;
        let idx = self.index_of(source)?;

        if target_node == source.node_id {
            if !self.policy.allow_same_node_move {
                return Err(AllocationError::InvalidArgument(format!(
                    "{} cannot move to another directory on the same node",
                    source
                )));
            }
        } else if self
            .placements
            .contains_key(&source.partition.on_node(target_node))
        {
            return Err(AllocationError::InvalidArgument(format!(
                "node {} already hosts a replica of {}",
                target_node, source.partition
            )));
        }

        let moved = &self.snapshot.replicas()[idx];
        let node = self
            .snapshot
            .node(target_node)
            .cloned()
            .unwrap_or_else(|| Node::unknown(target_node));

        let replacement = Replica::builder(moved.partition.clone(), node)
            .path(target_path)
            .size(self.policy.initial_size(moved.size))
            .preferred_leader(moved.is_preferred_leader)
            .build();

        debug!(
            partition = %source.partition,
            from = source.node_id,
            to = target_node,
            path = target_path,
            "migrating replica"
        );

        let mut replicas = self.snapshot.replicas().to_vec();
        replicas[idx] = replacement;
        self.derive(replicas)
    }

    /// Make the replica at `target` its partition's preferred leader.
    ///
    /// Only the two preferred-leader flags change. A no-op when `target`
    /// already holds the designation.
    pub fn become_leader(&self, target: &ReplicaPlacementKey) -> Result<AllocationView> {
        let idx = self.index_of(target)?;

        if self.snapshot.replicas()[idx].is_preferred_leader {
            return Ok(self.clone());
        }

        debug!(
            partition = %target.partition,
            node = target.node_id,
            "moving preferred leadership"
        );

        let replicas = self
            .snapshot
            .replicas()
            .iter()
            .enumerate()
            .map(|(i, replica)| {
                if i == idx {
                    replica.evolve().preferred_leader(true).build()
                } else if replica.partition == target.partition && replica.is_preferred_leader {
                    replica.evolve().preferred_leader(false).build()
                } else {
                    replica.clone()
                }
            })
            .collect();

        self.derive(replicas)
    }

    fn index_of(&self, key: &ReplicaPlacementKey) -> Result<usize> {
        self.placements
            .get(key)
            .copied()
            .ok_or_else(|| AllocationError::ReplicaNotFound(key.clone()))
    }

    fn derive(&self, replicas: Vec<Replica>) -> Result<AllocationView> {
        Self::with_policy(ClusterSnapshot::of(replicas), self.policy)
    }
}

impl TryFrom<ClusterSnapshot> for AllocationView {
    type Error = AllocationError;

    fn try_from(snapshot: ClusterSnapshot) -> Result<Self> {
        Self::of(snapshot)
    }
}

impl From<AllocationView> for ClusterSnapshot {
    fn from(view: AllocationView) -> Self {
        view.snapshot
    }
}

fn index_placements(
    snapshot: &ClusterSnapshot,
) -> std::result::Result<HashMap<ReplicaPlacementKey, usize>, ValidationError> {
    let mut placements = HashMap::with_capacity(snapshot.len());

    for (idx, replica) in snapshot.replicas().iter().enumerate() {
        let key = replica.placement_key();
        if !replica.state.is_settled() {
            return Err(ValidationError::ReplicaInTransition {
                replica: key,
                state: replica.state,
            });
        }
        if placements.contains_key(&key) {
            return Err(ValidationError::DuplicatePlacement(key));
        }
        placements.insert(key, idx);
    }

    for partition in snapshot.partition_keys() {
        let leaders: Vec<NodeId> = snapshot
            .replicas_of(partition)
            .into_iter()
            .filter(|r| r.is_preferred_leader)
            .map(|r| r.node.id)
            .collect();

        match leaders.len() {
            1 => {}
            0 => return Err(ValidationError::NoPreferredLeader(partition.clone())),
            _ => {
                return Err(ValidationError::DuplicatePreferredLeader {
                    partition: partition.clone(),
                    nodes: leaders,
                })
            }
        }
    }

    Ok(placements)
}
