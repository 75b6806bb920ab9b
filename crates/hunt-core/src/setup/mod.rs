//! World Setup
//!
//! Grid generation, start cells and agent spawning.

pub mod agents;
pub mod world;

pub use agents::{get_spawn_summary, spawn_blueprint, SpawnSummary};
pub use world::{generate_blueprint, Blueprint};
