//! Agent Components
//!
//! Identity, markers and the operating cadence for robots and monsters.

use bevy_ecs::prelude::*;
use hunt_events::{AgentKind, TurnGate};
use std::fmt;

use crate::random::RandomSource;

/// Unique agent identifier, displayed as `R000` / `M000`
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId {
    pub kind: AgentKind,
    pub serial: u32,
}

impl AgentId {
    pub fn robot(serial: u32) -> Self {
        Self {
            kind: AgentKind::Robot,
            serial,
        }
    }

    pub fn monster(serial: u32) -> Self {
        Self {
            kind: AgentKind::Monster,
            serial,
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.agent_id(self.serial))
    }
}

/// Marker for robots
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Robot;

/// Marker for monsters
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Monster;

/// Marker for agents removed by mutual destruction; despawned at end of tick
#[derive(Component, Debug, Clone, Copy)]
pub struct Destroyed {
    pub tick: u64,
}

/// Set when the robot's last executed action walked into void
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoidFlag(pub bool);

/// Result of checking an agent's cadence at the start of its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Act,
    Waiting,
    Declined,
}

impl From<Gate> for TurnGate {
    fn from(gate: Gate) -> Self {
        match gate {
            Gate::Act => TurnGate::Acted,
            Gate::Waiting => TurnGate::Waiting,
            Gate::Declined => TurnGate::Declined,
        }
    }
}

/// Operating frequency: the agent gets a turn every `period` ticks, and
/// then acts with `probability`. The counter resets on every elapsed period.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    pub period: u32,
    pub probability: f64,
    elapsed: u32,
}

impl Cadence {
    pub fn new(period: u32, probability: f64) -> Self {
        Self {
            period: period.max(1),
            probability,
            elapsed: 0,
        }
    }

    /// Act every `period` ticks without a probability draw
    pub fn every(period: u32) -> Self {
        Self::new(period, 1.0)
    }

    /// Ticks remaining until the next turn
    pub fn remaining(&self) -> u32 {
        self.period.saturating_sub(self.elapsed)
    }

    /// Advance one tick. Draws randomness only when the period has elapsed
    /// and the probability is below one.
    pub fn tick(&mut self, rng: &mut dyn RandomSource) -> Gate {
        self.elapsed += 1;
        if self.elapsed < self.period {
            return Gate::Waiting;
        }
        self.elapsed = 0;
        if self.probability < 1.0 && rng.unit() >= self.probability {
            return Gate::Declined;
        }
        Gate::Act
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_agent_id_display_and_order() {
        assert_eq!(AgentId::robot(3).to_string(), "R003");
        assert_eq!(AgentId::monster(0).to_string(), "M000");
        assert!(AgentId::robot(2) < AgentId::robot(10));
    }

    #[test]
    fn test_every_tick_cadence_always_acts() {
        let mut cadence = Cadence::every(1);
        let mut rng = ScriptedRandom::new();
        for _ in 0..5 {
            assert_eq!(cadence.tick(&mut rng), Gate::Act);
        }
    }

    #[test]
    fn test_period_then_probability() {
        let mut cadence = Cadence::new(3, 0.5);
        let mut rng = ScriptedRandom::new().with_units([0.9, 0.1]);

        assert_eq!(cadence.tick(&mut rng), Gate::Waiting);
        assert_eq!(cadence.tick(&mut rng), Gate::Waiting);
        assert_eq!(cadence.remaining(), 1);
        assert_eq!(cadence.tick(&mut rng), Gate::Declined);

        // counter restarted after the declined draw
        assert_eq!(cadence.tick(&mut rng), Gate::Waiting);
        assert_eq!(cadence.tick(&mut rng), Gate::Waiting);
        assert_eq!(cadence.tick(&mut rng), Gate::Act);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_zero_period_treated_as_one() {
        let mut cadence = Cadence::every(0);
        assert_eq!(cadence.period, 1);
        assert_eq!(cadence.tick(&mut ScriptedRandom::new()), Gate::Act);
    }
}
