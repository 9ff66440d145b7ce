use crate::allocation::AllocationView;
use crate::models::*;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A requested change to a settled allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Recreate a replica on another node (or directory)
    MoveReplica {
        source: ReplicaPlacementKey,
        to_node: NodeId,
        to_path: String,
    },

    /// Hand preferred leadership of a partition to one of its replicas
    ElectLeader { target: ReplicaPlacementKey },
}

impl Action {
    pub fn apply(&self, view: &AllocationView) -> Result<AllocationView> {
        match self {
            Action::MoveReplica {
                source,
                to_node,
                to_path,
            } => view.migrate_replica(source, *to_node, Some(to_path.as_str())),
            Action::ElectLeader { target } => view.become_leader(target),
        }
    }

    pub fn partition(&self) -> &PartitionKey {
        match self {
            Action::MoveReplica { source, .. } => &source.partition,
            Action::ElectLeader { target } => &target.partition,
        }
    }

    /// Get the nodes affected by this action
    pub fn affected_nodes(&self) -> Vec<NodeId> {
        match self {
            Action::MoveReplica {
                source, to_node, ..
            } => vec![source.node_id, *to_node],
            Action::ElectLeader { target } => vec![target.node_id],
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            Action::MoveReplica {
                source,
                to_node,
                to_path,
            } => format!(
                "Move replica of {} from node {} to node {} ({})",
                source.partition, source.node_id, to_node, to_path
            ),
            Action::ElectLeader { target } => format!(
                "Make node {} preferred leader for {}",
                target.node_id, target.partition
            ),
        }
    }
}

/// An ordered list of actions to hand to the execution layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub actions: Vec<Action>,
    pub metadata: PlanMetadata,
}

impl MigrationPlan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            metadata: PlanMetadata::default(),
        }
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Apply every action in order.
    ///
    /// Stops at the first failing action; nothing is returned but the error.
    pub fn apply(&self, view: &AllocationView) -> Result<AllocationView> {
        self.actions
            .iter()
            .try_fold(view.clone(), |current, action| action.apply(&current))
    }

    /// Group actions into batches that can be executed concurrently.
    ///
    /// A batch never touches the same node or the same partition twice.
    pub fn batch_actions(&self, max_concurrent: usize) -> Vec<Vec<&Action>> {
        let mut batches = Vec::new();
        let mut current_batch = Vec::new();
        let mut affected_nodes = HashSet::new();
        let mut affected_partitions = HashSet::new();

        for action in &self.actions {
            let action_nodes = action.affected_nodes();

            let has_conflict = action_nodes.iter().any(|n| affected_nodes.contains(n))
                || affected_partitions.contains(action.partition());

            if (has_conflict || current_batch.len() >= max_concurrent.max(1))
                && !current_batch.is_empty()
            {
                batches.push(std::mem::take(&mut current_batch));
                affected_nodes.clear();
                affected_partitions.clear();
            }

            current_batch.push(action);
            affected_nodes.extend(action_nodes);
            affected_partitions.insert(action.partition());
        }

        if !current_batch.is_empty() {
            batches.push(current_batch);
        }

        batches
    }

    /// Check if this plan is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        let move_count = self
            .actions
            .iter()
            .filter(|a| matches!(a, Action::MoveReplica { .. }))
            .count();

        PlanSummary {
            total_actions: self.actions.len(),
            move_count,
            leader_election_count: self.actions.len() - move_count,
            partition_count: self
                .actions
                .iter()
                .map(Action::partition)
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

impl FromIterator<Action> for MigrationPlan {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for PlanMetadata {
    fn default() -> Self {
        Self {
            created_at: Some(chrono::Utc::now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_actions: usize,
    pub move_count: usize,
    pub leader_election_count: usize,
    pub partition_count: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total Actions: {}, Moves: {}, Leader Elections: {}, Partitions: {}",
            self.total_actions, self.move_count, self.leader_election_count, self.partition_count
        )
    }
}
