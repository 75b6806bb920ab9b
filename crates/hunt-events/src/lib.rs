//! Shared record types and serialization for the robot hunt simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for the simulation core and for anything that reads
//! its output files.

pub mod record;
pub mod snapshot;

// Re-export record types
pub use record::{AgentKind, MemoryTrace, OperationRecord, Reading, TurnGate};

// Re-export snapshot types
pub use snapshot::{generate_snapshot_id, AgentSnapshot, GridSnapshot, WorldSnapshot};
