//! Rule Tables
//!
//! Percept records, action descriptors and the validated tables that map
//! one to the other. Both agent kinds load their behaviour from CSV; the
//! default tables ship embedded in the binary.

pub mod action;
pub mod percept;
pub mod table;

use bevy_ecs::prelude::*;
use std::path::Path;

pub use action::{ActionDescriptor, ActionTag, Choice, ResolvedAction};
pub use percept::{MonsterPercept, Passage, PeerReading, Percept, Precedence, Presence, RobotPercept, Sensor, VoidReading};
pub use table::{Rule, RuleTable};

use crate::error::MalformedRuleError;

/// Default robot behaviour
pub const BUILTIN_ROBOT_RULES: &str = include_str!("../../../../data/robot_rules.csv");

/// Default monster behaviour
pub const BUILTIN_MONSTER_RULES: &str = include_str!("../../../../data/monster_rules.csv");

/// Resource holding both validated tables
#[derive(Resource, Debug, Clone)]
pub struct RuleBook {
    pub robot: RuleTable<RobotPercept>,
    pub monster: RuleTable<MonsterPercept>,
}

impl RuleBook {
    /// Tables embedded at build time
    pub fn builtin() -> Result<Self, MalformedRuleError> {
        Ok(Self {
            robot: RuleTable::parse(BUILTIN_ROBOT_RULES)?,
            monster: RuleTable::parse(BUILTIN_MONSTER_RULES)?,
        })
    }

    pub fn load(robot: impl AsRef<Path>, monster: impl AsRef<Path>) -> Result<Self, MalformedRuleError> {
        Ok(Self {
            robot: RuleTable::load(robot)?,
            monster: RuleTable::load(monster)?,
        })
    }

    /// Load each table from its path, or fall back to the embedded one
    pub fn resolve(robot: Option<&Path>, monster: Option<&Path>) -> Result<Self, MalformedRuleError> {
        Ok(Self {
            robot: match robot {
                Some(path) => RuleTable::load(path)?,
                None => RuleTable::parse(BUILTIN_ROBOT_RULES)?,
            },
            monster: match monster {
                Some(path) => RuleTable::load(path)?,
                None => RuleTable::parse(BUILTIN_MONSTER_RULES)?,
            },
        })
    }
}
