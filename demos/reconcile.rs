use log_allocation::*;

fn main() -> Result<()> {
    println!("Replica Placement Model - Example Usage\n");

    // Current, settled cluster state
    let current = AllocationView::of(create_sample_snapshot())?;

    // Plan: move one follower to a new node, then hand it leadership
    let orders = PartitionKey::new("orders", 0);
    let plan = MigrationPlan::new(vec![
        Action::MoveReplica {
            source: orders.on_node(2),
            to_node: 4,
            to_path: "/data/disk1".to_string(),
        },
        Action::ElectLeader {
            target: orders.on_node(4),
        },
    ]);

    println!("=== Plan ===");
    println!("{}", plan.summary());
    for (i, action) in plan.actions.iter().enumerate() {
        println!("{}. {}", i + 1, action.description());
    }

    let desired = plan.apply(&current)?;

    println!("\n=== Desired Layout ===");
    for replica in desired.replicas() {
        println!(
            "{} on {} at {} {}",
            replica.partition,
            replica.node,
            replica.path.as_deref().unwrap_or("<unknown>"),
            if replica.is_preferred_leader { "(preferred leader)" } else { "" }
        );
    }

    // Until the cluster reports the new layout, these partitions diverge
    let pending = find_divergent_partitions(desired.snapshot(), current.snapshot())?;
    println!("\n=== Pending Partitions ===");
    for partition in &pending {
        println!("  {}", partition);
    }

    Ok(())
}

fn create_sample_snapshot() -> ClusterSnapshot {
    let mut replicas = Vec::new();

    for (topic, partitions) in [("orders", 2), ("payments", 1)] {
        for partition in 0..partitions {
            let key = PartitionKey::new(topic, partition);
            for node_id in 1..=3 {
                let is_leader = node_id == (partition % 3) + 1;
                replicas.push(
                    Replica::builder(key.clone(), Node::new(node_id, format!("broker-{}", node_id), 9092))
                        .path("/data/disk0")
                        .size(1_024 * 1_024)
                        .in_sync(true)
                        .leader(is_leader)
                        .preferred_leader(is_leader)
                        .build(),
                );
            }
        }
    }

    ClusterSnapshot::of(replicas)
}
