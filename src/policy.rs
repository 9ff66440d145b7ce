use serde::{Deserialize, Serialize};

/// Settings that control how mutations build new replicas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationPolicy {
    /// Keep the moved replica's size as an estimate for its new copy.
    /// When false the new copy starts at zero bytes.
    pub inherit_size: bool,

    /// Whether a replica may be moved to another data directory on the
    /// node it already lives on
    pub allow_same_node_move: bool,
}

impl Default for MigrationPolicy {
    fn default() -> Self {
        Self {
            inherit_size: true,
            allow_same_node_move: true,
        }
    }
}

impl MigrationPolicy {
    /// New copies start empty, as they will on the destination node
    pub fn fresh() -> Self {
        Self {
            inherit_size: false,
            ..Default::default()
        }
    }

    /// Only moves between nodes; directory moves are rejected
    pub fn cross_node_only() -> Self {
        Self {
            allow_same_node_move: false,
            ..Default::default()
        }
    }

    /// Size recorded on a new copy of a replica of `size` bytes
    pub fn initial_size(&self, size: u64) -> u64 {
        if self.inherit_size {
            size
        } else {
            0
        }
    }
}
