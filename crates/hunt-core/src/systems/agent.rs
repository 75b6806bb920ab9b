//! Agent bodies
//!
//! Robots and monsters run the same sense → decide → act cycle and differ
//! only in their coordinate frame, sensors and allowed actions.

use bevy_ecs::prelude::*;

use super::decision::{decide, Decision, DecisionPolicy};
use super::execute::{execute_monster, execute_robot, Executed};
use super::perception::{sense_monster, sense_robot, WorldView};
use crate::components::memory::ExperienceMemory;
use crate::components::motion::{AbsoluteDir, Heading, RelativeDir};
use crate::components::world::{Grid, GridPos, Occupancy};
use crate::error::{InvalidActionError, UnmatchedPerceptError};
use crate::random::RandomSource;
use crate::rules::{MonsterPercept, Percept, ResolvedAction, RobotPercept, RuleTable};

/// Kinematic state of one agent for the duration of its turn
pub trait Agent {
    type Percept: Percept;

    fn position(&self) -> GridPos;

    fn sense(&self, view: &WorldView<'_>) -> Self::Percept;

    fn decide(
        &self,
        percept: &Self::Percept,
        table: &RuleTable<Self::Percept>,
        memory: Option<&ExperienceMemory<Self::Percept>>,
        policy: DecisionPolicy,
        rng: &mut dyn RandomSource,
    ) -> Result<Decision<<Self::Percept as Percept>::Direction>, UnmatchedPerceptError> {
        decide(percept, table, memory, policy, rng)
    }

    fn act(
        &mut self,
        entity: Entity,
        action: ResolvedAction<<Self::Percept as Percept>::Direction>,
        grid: &mut Grid,
        occupancy: &mut Occupancy,
    ) -> Result<Executed, InvalidActionError>;
}

/// Robot: position, heading frame and void flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotBody {
    pub position: GridPos,
    pub heading: Heading,
    pub void: bool,
}

impl Agent for RobotBody {
    type Percept = RobotPercept;

    fn position(&self) -> GridPos {
        self.position
    }

    fn sense(&self, view: &WorldView<'_>) -> RobotPercept {
        sense_robot(view, self.position, &self.heading, self.void)
    }

    fn act(
        &mut self,
        entity: Entity,
        action: ResolvedAction<RelativeDir>,
        grid: &mut Grid,
        occupancy: &mut Occupancy,
    ) -> Result<Executed, InvalidActionError> {
        execute_robot(entity, self, action, grid, occupancy)
    }
}

/// Monster: position only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterBody {
    pub position: GridPos,
}

impl Agent for MonsterBody {
    type Percept = MonsterPercept;

    fn position(&self) -> GridPos {
        self.position
    }

    fn sense(&self, view: &WorldView<'_>) -> MonsterPercept {
        sense_monster(view, self.position)
    }

    fn act(
        &mut self,
        entity: Entity,
        action: ResolvedAction<AbsoluteDir>,
        grid: &mut Grid,
        occupancy: &mut Occupancy,
    ) -> Result<Executed, InvalidActionError> {
        execute_monster(entity, self, action, grid, occupancy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use crate::rules::{Presence, RuleBook};
    use crate::systems::execute::Outcome;
    use hunt_events::AgentKind;

    #[test]
    fn test_robot_cycle_moves_toward_monster() {
        let book = RuleBook::builtin().unwrap();
        let mut grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let robot = Entity::from_raw(1);
        occupancy.place(AgentKind::Robot, robot, GridPos::new(1, 2, 2));
        occupancy.place(AgentKind::Monster, Entity::from_raw(2), GridPos::new(2, 2, 2));

        let mut body = RobotBody {
            position: GridPos::new(1, 2, 2),
            heading: Heading::default(),
            void: false,
        };
        let percept = body.sense(&WorldView::new(&grid, &occupancy));
        assert_eq!(percept.front, Presence::Present);

        let mut rng = ScriptedRandom::new();
        let decision = body
            .decide(&percept, &book.robot, None, DecisionPolicy::default(), &mut rng)
            .unwrap();
        let executed = body.act(robot, decision.action, &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Moved);
        assert_eq!(body.position(), GridPos::new(2, 2, 2));
    }

    #[test]
    fn test_boxed_in_monster_waits() {
        let book = RuleBook::builtin().unwrap();
        let mut grid = Grid::open(3);
        let mut occupancy = Occupancy::new();
        let monster = Entity::from_raw(1);
        let mut body = MonsterBody {
            position: GridPos::new(1, 1, 1),
        };
        occupancy.place(AgentKind::Monster, monster, body.position);

        let percept = body.sense(&WorldView::new(&grid, &occupancy));
        let mut rng = ScriptedRandom::new();
        let decision = body
            .decide(&percept, &book.monster, None, DecisionPolicy::default(), &mut rng)
            .unwrap();
        assert_eq!(decision.action, ResolvedAction::Idle);
        let executed = body.act(monster, decision.action, &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Idle);
    }
}
