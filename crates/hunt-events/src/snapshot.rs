//! Snapshot Types
//!
//! Serialization structs for world snapshots and state output.
//!
//! Snapshots capture the grid and every live agent at a point in time,
//! used for analysis and debugging.

use serde::{Deserialize, Serialize};

use crate::AgentKind;

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// Grid summary. Only interior EMPTY cells are listed; the outer shell is always empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: i32,
    pub free_cells: usize,
    pub empty_cells: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interior_empty: Vec<[i32; 3]>,
}

/// Agent snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub kind: AgentKind,
    pub position: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<[i32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<usize>,
}

/// Complete world snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub snapshot_id: String,
    pub tick: u64,
    pub triggered_by: String,
    pub grid: GridSnapshot,
    pub agents: Vec<AgentSnapshot>,
}

impl WorldSnapshot {
    pub fn new(snapshot_id: impl Into<String>, tick: u64, triggered_by: impl Into<String>) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            tick,
            triggered_by: triggered_by.into(),
            grid: GridSnapshot::default(),
            agents: Vec::new(),
        }
    }

    /// Count live agents of one kind
    pub fn count(&self, kind: AgentKind) -> usize {
        self.agents.iter().filter(|a| a.kind == kind).count()
    }

    pub fn agent(&self, agent_id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }
}
