//! Decision Engine
//!
//! Percept in, one concrete action out. The matched rule always wins;
//! special rules (void, same-cell, peer) beat ordinary rows through the
//! rule key, and memory can at most pick among an ordinary rule's own
//! candidates when the tie-break policy is on.

use bevy_ecs::prelude::*;
use hunt_events::MemoryTrace;

use crate::components::memory::ExperienceMemory;
use crate::components::motion::Label;
use crate::error::UnmatchedPerceptError;
use crate::random::RandomSource;
use crate::rules::{Percept, Precedence, ResolvedAction, RuleTable};

/// How memory may influence decisions
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionPolicy {
    /// Use a memory suggestion instead of a random draw when an ordinary
    /// rule offers it among several candidates
    pub memory_tie_break: bool,
}

/// Result of consulting experience memory
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConsult<D> {
    pub suggestion: Option<ResolvedAction<D>>,
    pub applied: bool,
}

impl<D: Label> MemoryConsult<D> {
    pub fn trace(&self) -> MemoryTrace {
        MemoryTrace {
            consulted: true,
            suggestion: self.suggestion.map(|s| s.to_string()),
            applied: self.applied,
        }
    }
}

/// One agent's decision for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Decision<D> {
    pub rule: u32,
    pub precedence: Precedence,
    pub action: ResolvedAction<D>,
    /// None for agents without memory
    pub memory: Option<MemoryConsult<D>>,
}

/// Match the percept against the table and resolve it to one action
pub fn decide<P: Percept>(
    percept: &P,
    table: &RuleTable<P>,
    memory: Option<&ExperienceMemory<P>>,
    policy: DecisionPolicy,
    rng: &mut dyn RandomSource,
) -> Result<Decision<P::Direction>, UnmatchedPerceptError> {
    let (rule, descriptor) = table.lookup(percept)?;
    let precedence = percept.precedence();

    let mut consult = memory.map(|m| MemoryConsult {
        suggestion: m.suggest(percept),
        applied: false,
    });

    let mut recalled = None;
    if policy.memory_tie_break && precedence == Precedence::Ordinary && descriptor.is_ambiguous() {
        if let Some(c) = consult.as_mut() {
            if let Some(suggestion) = c.suggestion.filter(|s| descriptor.admits(s)) {
                c.applied = true;
                recalled = Some(suggestion);
            }
        }
    }

    let action = match recalled {
        Some(action) => action,
        None => descriptor.resolve(rng),
    };

    Ok(Decision {
        rule,
        precedence,
        action,
        memory: consult,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::memory::Experience;
    use crate::components::motion::{AbsoluteDir, RelativeDir, Rotation};
    use crate::random::{ScriptedRandom, SimRng};
    use crate::rules::{MonsterPercept, Presence, RobotPercept, RuleBook, VoidReading};
    use crate::systems::execute::Outcome;

    fn remember(memory: &mut ExperienceMemory<RobotPercept>, percept: RobotPercept, action: ResolvedAction<RelativeDir>) {
        memory.push(Experience {
            tick: 1,
            percept,
            rule: 0,
            action,
            outcome: Outcome::Moved,
        });
    }

    #[test]
    fn test_void_rule_beats_memory() {
        let book = RuleBook::builtin().unwrap();
        let percept = RobotPercept {
            void_front: VoidReading::Collided,
            ..Default::default()
        };
        let mut memory = ExperienceMemory::new(10);
        remember(&mut memory, percept, ResolvedAction::Move(RelativeDir::Front));

        let policy = DecisionPolicy { memory_tie_break: true };
        let mut rng = ScriptedRandom::new().with_indices([1]);
        let decision = decide(&percept, &book.robot, Some(&memory), policy, &mut rng).unwrap();

        assert_eq!(decision.precedence, Precedence::Void);
        assert_eq!(decision.rule, 1);
        assert_eq!(decision.action, ResolvedAction::Rotate(Rotation::ZNeg));
        let consult = decision.memory.unwrap();
        assert_eq!(consult.suggestion, Some(ResolvedAction::Move(RelativeDir::Front)));
        assert!(!consult.applied);
    }

    #[test]
    fn test_memory_breaks_ordinary_tie_when_enabled() {
        let book = RuleBook::builtin().unwrap();
        // monsters on the left and right: uniform move between the two
        let percept = RobotPercept {
            left: Presence::Present,
            right: Presence::Present,
            ..Default::default()
        };
        let mut memory = ExperienceMemory::new(10);
        remember(&mut memory, percept, ResolvedAction::Move(RelativeDir::Right));

        let mut rng = ScriptedRandom::new().with_indices([0]);
        let off = decide(&percept, &book.robot, Some(&memory), DecisionPolicy::default(), &mut rng).unwrap();
        assert_eq!(off.action, ResolvedAction::Move(RelativeDir::Left));
        assert!(off.memory.as_ref().is_some_and(|m| !m.applied));

        let mut rng = ScriptedRandom::new().with_indices([0]);
        let policy = DecisionPolicy { memory_tie_break: true };
        let on = decide(&percept, &book.robot, Some(&memory), policy, &mut rng).unwrap();
        assert_eq!(on.action, ResolvedAction::Move(RelativeDir::Right));
        assert!(on.memory.as_ref().is_some_and(|m| m.applied));
        assert_eq!(rng.remaining(), 1);
    }

    #[test]
    fn test_memory_never_leaves_candidate_set() {
        let book = RuleBook::builtin().unwrap();
        let percept = RobotPercept {
            left: Presence::Present,
            right: Presence::Present,
            ..Default::default()
        };
        let mut memory = ExperienceMemory::new(10);
        remember(&mut memory, percept, ResolvedAction::Move(RelativeDir::Front));

        let policy = DecisionPolicy { memory_tie_break: true };
        let mut rng = ScriptedRandom::new().with_indices([1]);
        let decision = decide(&percept, &book.robot, Some(&memory), policy, &mut rng).unwrap();
        assert_eq!(decision.action, ResolvedAction::Move(RelativeDir::Right));
        assert!(!decision.memory.unwrap().applied);
    }

    #[test]
    fn test_monster_decision_has_no_memory() {
        let book = RuleBook::builtin().unwrap();
        let percept = MonsterPercept {
            top: crate::rules::Passage::Blocked,
            ..Default::default()
        };
        let mut rng = ScriptedRandom::new().with_indices([0]);
        let decision = decide(&percept, &book.monster, None, DecisionPolicy::default(), &mut rng).unwrap();
        assert_eq!(decision.action, ResolvedAction::Move(AbsoluteDir::Left));
        assert!(decision.memory.is_none());
    }

    #[test]
    fn test_uniform_resolution_is_fair() {
        let book = RuleBook::builtin().unwrap();
        // left, right and top occupied: three equal candidates
        let percept = RobotPercept {
            top: Presence::Present,
            left: Presence::Present,
            right: Presence::Present,
            ..Default::default()
        };
        let mut rng = SimRng::seeded(2024);
        let mut counts = [0usize; 3];
        let draws = 10_000;
        for _ in 0..draws {
            let decision = decide(&percept, &book.robot, None, DecisionPolicy::default(), rng.source()).unwrap();
            match decision.action {
                ResolvedAction::Move(RelativeDir::Top) => counts[0] += 1,
                ResolvedAction::Move(RelativeDir::Left) => counts[1] += 1,
                ResolvedAction::Move(RelativeDir::Right) => counts[2] += 1,
                other => panic!("unexpected action {}", other),
            }
        }
        for count in counts {
            let share = count as f64 / draws as f64;
            assert!((share - 1.0 / 3.0).abs() < 0.03, "share {} too far from 1/3", share);
        }
    }

    #[test]
    fn test_consult_trace() {
        let consult = MemoryConsult {
            suggestion: Some(ResolvedAction::<RelativeDir>::Move(RelativeDir::Down)),
            applied: false,
        };
        let trace = consult.trace();
        assert!(trace.consulted);
        assert_eq!(trace.suggestion.as_deref(), Some("move down"));

        let empty = MemoryConsult::<RelativeDir> {
            suggestion: None,
            applied: false,
        };
        let trace = empty.trace();
        assert!(trace.consulted);
        assert_eq!(trace.suggestion, None);
    }
}
