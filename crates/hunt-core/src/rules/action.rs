//! Action Descriptors
//!
//! What a rule tells an agent to do, and the single concrete action it
//! resolves to in a given tick.

use serde::Deserialize;
use std::fmt;

use crate::components::motion::{Label, Rotation};
use crate::random::RandomSource;

/// Action families as tagged in rule files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionTag {
    Move,
    Rotate,
    Destroy,
    Idle,
    RememberVoid,
}

impl ActionTag {
    /// Parse a `type` tag, accepting the legacy aliases
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "move" | "move_random" => Some(ActionTag::Move),
            "rotate" | "rotate_random" => Some(ActionTag::Rotate),
            "destroy" => Some(ActionTag::Destroy),
            "idle" | "wait" => Some(ActionTag::Idle),
            "remember_void" | "memory" => Some(ActionTag::RememberVoid),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionTag::Move => "move",
            ActionTag::Rotate => "rotate",
            ActionTag::Destroy => "destroy",
            ActionTag::Idle => "idle",
            ActionTag::RememberVoid => "remember_void",
        }
    }
}

/// Candidate set with optional explicit weights and an optional chance to fire
#[derive(Debug, Clone, PartialEq)]
pub struct Choice<T> {
    pub candidates: Vec<T>,
    pub weights: Option<Vec<f64>>,
    /// Probability the action happens at all; otherwise the agent idles
    pub chance: Option<f64>,
}

impl<T: Copy + PartialEq> Choice<T> {
    pub fn single(candidate: T) -> Self {
        Self::uniform(vec![candidate])
    }

    pub fn uniform(candidates: Vec<T>) -> Self {
        Self {
            candidates,
            weights: None,
            chance: None,
        }
    }

    pub fn weighted(candidates: Vec<T>, weights: Vec<f64>) -> Self {
        Self {
            candidates,
            weights: Some(weights),
            chance: None,
        }
    }

    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = Some(chance);
        self
    }

    pub fn contains(&self, candidate: T) -> bool {
        self.candidates.contains(&candidate)
    }

    /// More than one outcome is possible
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }

    /// Pick one candidate. None means the chance draw failed.
    /// A single candidate with no chance consumes no randomness.
    pub fn resolve(&self, rng: &mut dyn RandomSource) -> Option<T> {
        if let Some(p) = self.chance {
            if p < 1.0 && rng.unit() >= p {
                return None;
            }
        }

        match self.candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            many => {
                let i = match &self.weights {
                    Some(weights) => rng.weighted(weights),
                    None => rng.index(many.len()),
                };
                many.get(i).copied()
            }
        }
    }
}

/// Validated action column of one rule
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDescriptor<D> {
    Move(Choice<D>),
    Rotate(Choice<Rotation>),
    Destroy,
    Idle,
    RememberVoid,
}

impl<D: Label> ActionDescriptor<D> {
    pub fn tag(&self) -> ActionTag {
        match self {
            ActionDescriptor::Move(_) => ActionTag::Move,
            ActionDescriptor::Rotate(_) => ActionTag::Rotate,
            ActionDescriptor::Destroy => ActionTag::Destroy,
            ActionDescriptor::Idle => ActionTag::Idle,
            ActionDescriptor::RememberVoid => ActionTag::RememberVoid,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        match self {
            ActionDescriptor::Move(choice) => choice.is_ambiguous(),
            ActionDescriptor::Rotate(choice) => choice.is_ambiguous(),
            _ => false,
        }
    }

    /// Whether `action` is one of the outcomes this descriptor can produce
    pub fn admits(&self, action: &ResolvedAction<D>) -> bool {
        match (self, action) {
            (ActionDescriptor::Move(choice), ResolvedAction::Move(d)) => choice.contains(*d),
            (ActionDescriptor::Rotate(choice), ResolvedAction::Rotate(r)) => choice.contains(*r),
            (ActionDescriptor::Destroy, ResolvedAction::Destroy) => true,
            (ActionDescriptor::Idle, ResolvedAction::Idle) => true,
            (ActionDescriptor::RememberVoid, ResolvedAction::RememberVoid) => true,
            _ => false,
        }
    }

    /// Collapse to one concrete action
    pub fn resolve(&self, rng: &mut dyn RandomSource) -> ResolvedAction<D> {
        match self {
            ActionDescriptor::Move(choice) => choice.resolve(rng).map(ResolvedAction::Move).unwrap_or(ResolvedAction::Idle),
            ActionDescriptor::Rotate(choice) => choice.resolve(rng).map(ResolvedAction::Rotate).unwrap_or(ResolvedAction::Idle),
            ActionDescriptor::Destroy => ResolvedAction::Destroy,
            ActionDescriptor::Idle => ResolvedAction::Idle,
            ActionDescriptor::RememberVoid => ResolvedAction::RememberVoid,
        }
    }
}

impl<D: Label> fmt::Display for ActionDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: Label>(items: &[T]) -> String {
            items.iter().map(|i| i.label()).collect::<Vec<_>>().join("|")
        }
        match self {
            ActionDescriptor::Move(choice) => write!(f, "move [{}]", list(&choice.candidates)),
            ActionDescriptor::Rotate(choice) => write!(f, "rotate [{}]", list(&choice.candidates)),
            other => write!(f, "{}", other.tag().label()),
        }
    }
}

/// A single concrete action for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedAction<D> {
    Move(D),
    Rotate(Rotation),
    Destroy,
    Idle,
    RememberVoid,
}

impl<D: Label> fmt::Display for ResolvedAction<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedAction::Move(d) => write!(f, "move {}", d.label()),
            ResolvedAction::Rotate(r) => write!(f, "rotate {}", r.label()),
            ResolvedAction::Destroy => write!(f, "destroy"),
            ResolvedAction::Idle => write!(f, "idle"),
            ResolvedAction::RememberVoid => write!(f, "remember_void"),
        }
    }
}

/// Raw JSON form of the action column
#[derive(Debug, Deserialize)]
pub(crate) struct ActionSpec {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub probability: Option<ProbabilitySpec>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A scalar firing chance or per-candidate weights
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProbabilitySpec {
    Chance(f64),
    Weights(Vec<f64>),
}
