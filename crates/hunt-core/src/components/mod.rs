//! ECS Components
//!
//! Agent identity and cadence, motion vocabularies, experience memory and
//! the grid world.

pub mod agent;
pub mod memory;
pub mod motion;
pub mod world;

pub use agent::{AgentId, Cadence, Destroyed, Gate, Monster, Robot, VoidFlag};
pub use memory::{Experience, ExperienceMemory};
pub use motion::{AbsoluteDir, Heading, Label, RelativeDir, Rotation};
pub use world::{CellOccupants, CellState, Grid, GridPos, Occupancy, Position};
