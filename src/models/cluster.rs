use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace};
use super::{Node, NodeId, PartitionKey, Replica};
use crate::{AllocationError, Result};

/// Immutable snapshot of a cluster's replica records.
///
/// Records keep the order they were supplied in. A snapshot does not
/// validate anything, so it can describe a cluster mid-reassignment; see
/// [`AllocationView`](crate::AllocationView) for the validated form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Replica>", into = "Vec<Replica>")]
pub struct ClusterSnapshot {
    replicas: Vec<Replica>,
    by_partition: BTreeMap<PartitionKey, Vec<usize>>,
    by_node: BTreeMap<NodeId, Vec<usize>>,
}

impl ClusterSnapshot {
    /// Build a snapshot from replica records. Never fails.
    pub fn of(replicas: impl IntoIterator<Item = Replica>) -> Self {
        let replicas: Vec<Replica> = replicas.into_iter().collect();
        let mut by_partition: BTreeMap<PartitionKey, Vec<usize>> = BTreeMap::new();
        let mut by_node: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();

        for (idx, replica) in replicas.iter().enumerate() {
            by_partition
                .entry(replica.partition.clone())
                .or_default()
                .push(idx);
            by_node.entry(replica.node.id).or_default().push(idx);
        }

        Self {
            replicas,
            by_partition,
            by_node,
        }
    }

    /// All distinct partition keys, in (topic, partition) order
    pub fn partition_keys(&self) -> impl Iterator<Item = &PartitionKey> + '_ {
        self.by_partition.keys()
    }

    pub fn contains_partition(&self, partition: &PartitionKey) -> bool {
        self.by_partition.contains_key(partition)
    }

    /// Every replica record, in original order
    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    /// Replicas of one partition, in original relative order. Empty if absent.
    pub fn replicas_of(&self, partition: &PartitionKey) -> Vec<&Replica> {
        self.lookup(self.by_partition.get(partition))
    }

    /// Replicas hosted on one node, in original relative order
    pub fn replicas_on_node(&self, node_id: NodeId) -> Vec<&Replica> {
        self.lookup(self.by_node.get(&node_id))
    }

    /// Distinct nodes hosting at least one replica, ordered by id.
    ///
    /// When a node is described more than once, the first descriptor wins.
    pub fn nodes(&self) -> Vec<&Node> {
        self.by_node
            .values()
            .filter_map(|indices| indices.first())
            .map(|&idx| &self.replicas[idx].node)
            .collect()
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.by_node
            .get(&node_id)
            .and_then(|indices| indices.first())
            .map(|&idx| &self.replicas[idx].node)
    }

    pub fn topics(&self) -> BTreeSet<&str> {
        self.by_partition.keys().map(|pk| pk.topic.as_str()).collect()
    }

    /// Known data directories in use on a node
    pub fn data_directories(&self, node_id: NodeId) -> BTreeSet<&str> {
        self.replicas_on_node(node_id)
            .into_iter()
            .filter_map(|r| r.path.as_deref())
            .collect()
    }

    /// First replica of the partition flagged as preferred leader
    pub fn preferred_leader(&self, partition: &PartitionKey) -> Option<&Replica> {
        self.replicas_of(partition)
            .into_iter()
            .find(|r| r.is_preferred_leader)
    }

    /// First replica of the partition observed serving as leader
    pub fn leader(&self, partition: &PartitionKey) -> Option<&Replica> {
        self.replicas_of(partition).into_iter().find(|r| r.is_leader)
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    fn lookup(&self, indices: Option<&Vec<usize>>) -> Vec<&Replica> {
        indices
            .map(|indices| indices.iter().map(|&idx| &self.replicas[idx]).collect())
            .unwrap_or_default()
    }
}

impl From<Vec<Replica>> for ClusterSnapshot {
    fn from(replicas: Vec<Replica>) -> Self {
        Self::of(replicas)
    }
}

impl From<ClusterSnapshot> for Vec<Replica> {
    fn from(snapshot: ClusterSnapshot) -> Self {
        snapshot.replicas
    }
}

/// Compare the placement of one partition's replica sets.
///
/// True iff both sides put replicas on the same nodes, with equal data
/// directories and equal preferred-leader flags. Runtime fields (size,
/// lag, sync state, offline, observed leadership) are ignored. An unknown
/// path on either side never matches, nor does a side that lists the
/// same node twice.
pub fn placement_match<'a, S, T>(source: S, target: T) -> bool
where
    S: IntoIterator<Item = &'a Replica>,
    T: IntoIterator<Item = &'a Replica>,
{
    let (Some(source), Some(target)) = (placement_layout(source), placement_layout(target)) else {
        return false;
    };

    if source.len() != target.len() {
        return false;
    }

    source.iter().all(|(node_id, (path, preferred))| match target.get(node_id) {
        Some((target_path, target_preferred)) => {
            matches!((path, target_path), (Some(a), Some(b)) if a == b)
                && preferred == target_preferred
        }
        None => false,
    })
}

fn placement_layout<'a>(
    replicas: impl IntoIterator<Item = &'a Replica>,
) -> Option<HashMap<NodeId, (Option<&'a str>, bool)>> {
    let mut layout = HashMap::new();
    for replica in replicas {
        let slot = (replica.path.as_deref(), replica.is_preferred_leader);
        if layout.insert(replica.node.id, slot).is_some() {
            return None;
        }
    }
    Some(layout)
}

/// Partitions of `source` whose placement is not yet satisfied in `target`.
///
/// Every partition of `source` must exist in `target`; partitions known
/// only to `target` are ignored.
pub fn find_divergent_partitions(
    source: &ClusterSnapshot,
    target: &ClusterSnapshot,
) -> Result<BTreeSet<PartitionKey>> {
    let missing: Vec<String> = source
        .partition_keys()
        .filter(|pk| !target.contains_partition(pk))
        .map(|pk| pk.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(AllocationError::InvalidArgument(format!(
            "source partitions missing from target: {}",
            missing.join(", ")
        )));
    }

    let divergent: BTreeSet<PartitionKey> = source
        .partition_keys()
        .filter(|pk| !placement_match(source.replicas_of(pk), target.replicas_of(pk)))
        .inspect(|pk| trace!(partition = %pk, "placement diverges"))
        .cloned()
        .collect();

    debug!(
        divergent = divergent.len(),
        partitions = source.by_partition.len(),
        "compared cluster placements"
    );

    Ok(divergent)
}
