// Test code is allowed to panic on failure
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

//! Property-based tests for the replica placement model.
//!
//! Uses proptest to generate settled allocations and verify invariants.

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::sample::Index;

use log_allocation::{
    find_divergent_partitions, placement_match, AllocationError, AllocationView,
    ClusterSnapshot, Node, PartitionKey, Replica, ReplicaState,
};

/// Nodes a generated replica can live on; migrations target ids above this.
const NODE_POOL: u32 = 10;

/// Strategy for one partition with 1-5 replicas and a single preferred leader.
fn partition_replicas(topic_idx: usize) -> impl Strategy<Value = Vec<Replica>> {
    (1usize..=5)
        .prop_flat_map(|rf| {
            (
                proptest::sample::subsequence((0..NODE_POOL).collect::<Vec<_>>(), rf),
                0..rf,
                proptest::collection::vec((0u64..1_000_000, 0u64..1_000, any::<bool>()), rf),
            )
        })
        .prop_map(move |(nodes, leader, runtime)| {
            let partition = PartitionKey::new(format!("topic-{}", topic_idx), 0);
            nodes
                .into_iter()
                .zip(runtime)
                .enumerate()
                .map(|(i, (node, (size, lag, in_sync)))| {
                    Replica::builder(partition.clone(), Node::new(node, format!("host-{}", node), 9092))
                        .path(format!("/data/{}", node % 3))
                        .size(size)
                        .lag(lag)
                        .in_sync(in_sync)
                        .leader(i == leader)
                        .preferred_leader(i == leader)
                        .build()
                })
                .collect()
        })
}

/// Strategy for a settled allocation of 1-5 partitions.
fn settled_allocation() -> impl Strategy<Value = Vec<Replica>> {
    (1usize..=5)
        .prop_flat_map(|count| (0..count).map(partition_replicas).collect::<Vec<_>>())
        .prop_map(|partitions| partitions.into_iter().flatten().collect())
}

/// Ways to break a settled allocation.
#[derive(Debug, Clone, Copy)]
enum Corruption {
    InFlight(ReplicaState),
    ExtraPreferredLeader,
    NoPreferredLeader,
}

fn any_corruption() -> impl Strategy<Value = Corruption> {
    prop_oneof![
        Just(Corruption::InFlight(ReplicaState::Joining)),
        Just(Corruption::InFlight(ReplicaState::Leaving)),
        Just(Corruption::InFlight(ReplicaState::FutureCopy)),
        Just(Corruption::ExtraPreferredLeader),
        Just(Corruption::NoPreferredLeader),
    ]
}

fn corrupt(replicas: &mut [Replica], pick: &Index, corruption: Corruption) -> bool {
    let idx = pick.index(replicas.len());
    match corruption {
        Corruption::InFlight(state) => {
            replicas[idx] = replicas[idx].evolve().state(state).build();
            true
        }
        Corruption::ExtraPreferredLeader => {
            if replicas[idx].is_preferred_leader {
                return false;
            }
            replicas[idx] = replicas[idx].evolve().preferred_leader(true).build();
            true
        }
        Corruption::NoPreferredLeader => {
            let partition = replicas[idx].partition.clone();
            for replica in replicas.iter_mut().filter(|r| r.partition == partition) {
                *replica = replica.evolve().preferred_leader(false).build();
            }
            true
        }
    }
}

proptest! {
    /// Property: a snapshot hands back exactly the records it was built from.
    #[test]
    fn snapshot_round_trip(replicas in settled_allocation()) {
        let snapshot = ClusterSnapshot::of(replicas.clone());

        prop_assert_eq!(snapshot.replicas(), replicas.as_slice());

        let expected: BTreeSet<PartitionKey> =
            replicas.iter().map(|r| r.partition.clone()).collect();
        let actual: BTreeSet<PartitionKey> = snapshot.partition_keys().cloned().collect();
        prop_assert_eq!(actual, expected);
    }

    /// Property: settled allocations validate.
    #[test]
    fn settled_allocation_is_accepted(replicas in settled_allocation()) {
        prop_assert!(AllocationView::of(ClusterSnapshot::of(replicas)).is_ok());
    }

    /// Property: markers and preferred-leader miscounts are rejected.
    #[test]
    fn corrupted_allocation_is_rejected(
        mut replicas in settled_allocation(),
        pick in any::<Index>(),
        corruption in any_corruption(),
    ) {
        prop_assume!(corrupt(&mut replicas, &pick, corruption));

        let result = AllocationView::of(ClusterSnapshot::of(replicas));
        prop_assert!(matches!(result, Err(AllocationError::Validation(_))));
    }

    /// Property: migration keeps the replication factor and lands on the new node.
    #[test]
    fn migrate_preserves_replication_factor(
        replicas in settled_allocation(),
        pick in any::<Index>(),
        offset in 0u32..5,
    ) {
        let view = AllocationView::of(ClusterSnapshot::of(replicas.clone())).unwrap();
        let source = &replicas[pick.index(replicas.len())];
        let target_node = NODE_POOL + offset;

        let rejected = view.migrate_replica(&source.placement_key(), target_node, None);
        prop_assert_eq!(rejected.unwrap_err(), AllocationError::MissingArgument("target_path"));
        prop_assert_eq!(view.replicas(), replicas.as_slice());

        let migrated = view
            .migrate_replica(&source.placement_key(), target_node, Some("/dir"))
            .unwrap();
        let before = view.replicas_of(&source.partition);
        let after = migrated.replicas_of(&source.partition);

        prop_assert_eq!(after.len(), before.len());
        prop_assert!(after.iter().all(|r| r.node.id != source.node.id));
        let moved = after.iter().find(|r| r.node.id == target_node).unwrap();
        prop_assert_eq!(moved.path.as_deref(), Some("/dir"));

        let divergent = find_divergent_partitions(view.snapshot(), migrated.snapshot()).unwrap();
        prop_assert_eq!(divergent, BTreeSet::from([source.partition.clone()]));
    }

    /// Property: leadership handoff flips exactly the two preferred-leader flags.
    #[test]
    fn become_leader_flips_two_flags(
        replicas in settled_allocation(),
        pick in any::<Index>(),
    ) {
        let view = AllocationView::of(ClusterSnapshot::of(replicas.clone())).unwrap();
        let target = &replicas[pick.index(replicas.len())];

        let promoted = view.become_leader(&target.placement_key()).unwrap();
        prop_assert_eq!(view.replicas(), replicas.as_slice());
        let before = view.replicas_of(&target.partition);
        let after = promoted.replicas_of(&target.partition);
        prop_assert_eq!(before.len(), after.len());

        let flipped: Vec<_> = before
            .iter()
            .zip(&after)
            .filter(|(b, a)| b.is_preferred_leader != a.is_preferred_leader)
            .collect();
        let expected_flips = if target.is_preferred_leader { 0 } else { 2 };
        prop_assert_eq!(flipped.len(), expected_flips);

        for (b, a) in before.iter().zip(&after) {
            prop_assert_eq!(
                &a.evolve().preferred_leader(b.is_preferred_leader).build(),
                *b
            );
        }
        prop_assert_eq!(promoted.preferred_leader(&target.partition).unwrap().node.id, target.node.id);
    }

    /// Property: placement comparison is reflexive and blind to runtime fields.
    #[test]
    fn placement_match_ignores_runtime_fields(
        replicas in partition_replicas(0),
        pick in any::<Index>(),
        size in any::<u64>(),
        lag in any::<u64>(),
    ) {
        prop_assert!(placement_match(&replicas, &replicas));

        let mut altered = replicas.clone();
        let idx = pick.index(altered.len());
        altered[idx] = altered[idx].evolve().size(size).lag(lag).in_sync(!altered[idx].in_sync).build();
        prop_assert!(placement_match(&replicas, &altered));

        altered[idx] = altered[idx].evolve().path("/elsewhere").build();
        prop_assert!(!placement_match(&replicas, &altered));
    }

    /// Property: an unknown path on either side never matches.
    #[test]
    fn placement_match_rejects_unknown_paths(
        replicas in partition_replicas(0),
        pick in any::<Index>(),
    ) {
        let mut unknown = replicas.clone();
        let idx = pick.index(unknown.len());
        unknown[idx] = unknown[idx].evolve().unknown_path().build();

        prop_assert!(!placement_match(&replicas, &unknown));
        prop_assert!(!placement_match(&unknown, &replicas));
    }

    /// Property: identical snapshots never diverge.
    #[test]
    fn identical_snapshots_do_not_diverge(replicas in settled_allocation()) {
        let snapshot = ClusterSnapshot::of(replicas);
        prop_assert!(find_divergent_partitions(&snapshot, &snapshot).unwrap().is_empty());
    }
}
