//! Error Types
//!
//! Load-time rule errors are fatal before the run starts. An unmatched
//! percept halts a running simulation. Invalid actions are recoverable and
//! only logged.

use hunt_events::AgentKind;
use thiserror::Error;

use crate::components::world::GridPos;
pub use crate::config::ConfigError;

/// A rule table that cannot be used
#[derive(Debug, Error)]
pub enum MalformedRuleError {
    #[error("cannot read rule table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rule table is empty")]
    Empty,

    #[error("unexpected header: expected `{expected}`, found `{found}`")]
    Header { expected: String, found: String },

    #[error("row {row}: {message}")]
    Syntax { row: usize, message: String },

    #[error("row {row}: expected {expected} fields, found {found}")]
    FieldCount { row: usize, expected: usize, found: usize },

    #[error("row {row}: column {column} value `{value}` is not an integer")]
    NotInteger { row: usize, column: String, value: String },

    #[error("row {row}: sensor {sensor} reading {value} is outside its domain")]
    OutOfDomain { row: usize, sensor: &'static str, value: i64 },

    #[error("row {row}: rule index {index} already used by row {first_row}")]
    DuplicateIndex { row: usize, index: u32, first_row: usize },

    #[error("row {row}: pattern duplicates rule {index}")]
    DuplicatePattern { row: usize, index: u32 },

    #[error("row {row}: pattern is shadowed by a special rule and can never match")]
    Unreachable { row: usize },

    #[error("row {row}: invalid action JSON: {message}")]
    ActionJson { row: usize, message: String },

    #[error("row {row}: unknown action type `{tag}`")]
    UnknownAction { row: usize, tag: String },

    #[error("row {row}: action `{tag}` is not available to {kind}s")]
    UnsupportedAction { row: usize, tag: String, kind: AgentKind },

    #[error("row {row}: unknown direction `{direction}`")]
    UnknownDirection { row: usize, direction: String },

    #[error("row {row}: action `{tag}` needs at least one direction")]
    MissingDirections { row: usize, tag: String },

    #[error("row {row}: invalid probability: {reason}")]
    Probability { row: usize, reason: String },

    #[error("{missing} reachable percept(s) have no rule, e.g. {example}")]
    MissingPattern { missing: usize, example: String },
}

/// No rule covers a percept. Fatal: the run halts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {kind} rule matches percept [{percept}]")]
pub struct UnmatchedPerceptError {
    pub kind: AgentKind,
    pub percept: String,
}

/// An action that cannot be carried out. The agent's turn becomes a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidActionError {
    #[error("destroy requested at {position} with no monster in the cell")]
    DestroyWithoutMonster { position: GridPos },

    #[error("`{action}` is not available to {kind}s")]
    UnsupportedForKind { kind: AgentKind, action: String },
}

/// Initial world construction failures
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("only {placed} of {requested} {kind}s could be placed: no free cell left")]
    NoFreeCell { kind: AgentKind, placed: usize, requested: usize },

    #[error("{kind} cannot start at {position}: {reason}")]
    InvalidPlacement { kind: AgentKind, position: GridPos, reason: String },
}

/// Top-level simulation error
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Rules(#[from] MalformedRuleError),

    #[error(transparent)]
    Unmatched(#[from] UnmatchedPerceptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}
