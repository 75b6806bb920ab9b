//! Operation Records
//!
//! One record per agent per tick, appended to that agent's JSONL log.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of agent living in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Robot,
    Monster,
}

impl AgentKind {
    /// Single-letter prefix used in agent identifiers
    pub fn prefix(&self) -> char {
        match self {
            AgentKind::Robot => 'R',
            AgentKind::Monster => 'M',
        }
    }

    /// Format an agent identifier, e.g. `R000`
    pub fn agent_id(&self, serial: u32) -> String {
        format!("{}{:03}", self.prefix(), serial)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Robot => write!(f, "robot"),
            AgentKind::Monster => write!(f, "monster"),
        }
    }
}

/// Whether the agent's cadence let it act this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnGate {
    /// The agent sensed, decided and acted
    Acted,
    /// The period has not elapsed yet
    Waiting,
    /// The period elapsed but the probability draw failed
    Declined,
}

/// A single named sensor reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor: String,
    pub value: i8,
}

impl Reading {
    pub fn new(sensor: impl Into<String>, value: i8) -> Self {
        Self {
            sensor: sensor.into(),
            value,
        }
    }
}

/// What the agent's experience memory contributed to a decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTrace {
    /// Memory was looked up; true for every robot decision
    pub consulted: bool,
    /// A matching productive experience, if one was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// The suggestion was used instead of a random draw
    pub applied: bool,
}

/// One agent-tick of the execution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub tick: u64,
    pub agent_id: String,
    pub kind: AgentKind,
    pub gate: TurnGate,
    pub position: [i32; 3],
    pub new_position: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<[i32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_orientation: Option<[i32; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub percept: Vec<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryTrace>,
}

impl OperationRecord {
    /// Start a record for an agent that has not acted yet
    pub fn new(tick: u64, agent_id: impl Into<String>, kind: AgentKind, position: [i32; 3]) -> Self {
        Self {
            tick,
            agent_id: agent_id.into(),
            kind,
            gate: TurnGate::Waiting,
            position,
            new_position: position,
            orientation: None,
            new_orientation: None,
            percept: Vec::new(),
            rule: None,
            precedence: None,
            action: None,
            outcome: None,
            memory: None,
        }
    }

    pub fn acted(&self) -> bool {
        self.gate == TurnGate::Acted
    }

    /// The action came from the rule table rather than a memory suggestion
    pub fn is_rule_driven(&self) -> bool {
        self.acted() && self.rule.is_some() && !self.memory.as_ref().is_some_and(|m| m.applied)
    }

    pub fn moved(&self) -> bool {
        self.position != self.new_position
    }
}
