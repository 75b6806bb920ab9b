//! Robot Hunt Simulation Library
//!
//! Robots and monsters on a 3D grid, each driven by an exact-match
//! percept → action rule table. Robots keep a bounded experience memory;
//! monsters move on a slower, probabilistic cadence.

pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod random;
pub mod rules;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;
pub use config::{Config, DEFAULT_TUNING_PATH};
pub use error::{ConfigError, InvalidActionError, MalformedRuleError, SetupError, SimError, UnmatchedPerceptError};
pub use random::{RandomSource, ScriptedRandom, SimRng};
pub use rules::RuleBook;
pub use setup::Blueprint;
pub use simulation::{ControlSignal, Simulation, StopReason, TickReport};
