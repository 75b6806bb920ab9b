//! Output generation: snapshots and final statistics.

pub mod snapshot;
pub mod stats;

pub use snapshot::{generate_snapshot, write_current_state, write_snapshot_to_dir, SnapshotGenerator};
pub use stats::{SimulationStats, StatsCollector, STATS_FILE};
