//! Action Execution
//!
//! Applies a resolved action to the grid, the occupancy index and the
//! acting agent's body.

use bevy_ecs::prelude::*;
use hunt_events::AgentKind;

use super::agent::{MonsterBody, RobotBody};
use crate::components::motion::{AbsoluteDir, RelativeDir};
use crate::components::world::{Grid, GridPos, Occupancy};
use crate::error::InvalidActionError;
use crate::rules::ResolvedAction;

/// What happened when an action was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Moved,
    /// Target was EMPTY or out of bounds; the agent stayed put
    VoidCollision,
    /// Target held an agent of the same kind; the agent stayed put
    Blocked,
    Rotated,
    Destroyed,
    Idle,
    VoidNoted,
    /// The action was invalid and skipped
    Rejected,
}

impl Outcome {
    /// Worth repeating under the same percept
    pub fn is_productive(&self) -> bool {
        !matches!(self, Outcome::VoidCollision | Outcome::Blocked | Outcome::Rejected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Moved => "moved",
            Outcome::VoidCollision => "void_collision",
            Outcome::Blocked => "blocked",
            Outcome::Rotated => "rotated",
            Outcome::Destroyed => "destroyed",
            Outcome::Idle => "idle",
            Outcome::VoidNoted => "void_noted",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Outcome plus the monster removed by a destroy, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed {
    pub outcome: Outcome,
    pub destroyed: Option<Entity>,
}

impl Executed {
    pub fn of(outcome: Outcome) -> Self {
        Self {
            outcome,
            destroyed: None,
        }
    }

    pub fn rejected() -> Self {
        Self::of(Outcome::Rejected)
    }
}

/// Move `entity` of `kind` from `from` to `target` if the cell allows it
pub fn execute_move(
    kind: AgentKind,
    entity: Entity,
    from: GridPos,
    target: GridPos,
    grid: &Grid,
    occupancy: &mut Occupancy,
) -> Outcome {
    if !grid.is_free(target) {
        return Outcome::VoidCollision;
    }
    if occupancy.occupant(target, kind).is_some() {
        return Outcome::Blocked;
    }
    occupancy.relocate(kind, entity, from, target);
    Outcome::Moved
}

/// Carry out a robot action. Destroy is only valid with a monster in the
/// robot's own cell; it removes both agents and voids the cell. The void
/// flag is left set only after a void collision.
pub fn execute_robot(
    entity: Entity,
    body: &mut RobotBody,
    action: ResolvedAction<RelativeDir>,
    grid: &mut Grid,
    occupancy: &mut Occupancy,
) -> Result<Executed, InvalidActionError> {
    body.void = false;
    let outcome = match action {
        ResolvedAction::Move(dir) => {
            let target = body.position + body.heading.offset(dir);
            let outcome = execute_move(AgentKind::Robot, entity, body.position, target, grid, occupancy);
            match outcome {
                Outcome::Moved => body.position = target,
                Outcome::VoidCollision => body.void = true,
                _ => {}
            }
            outcome
        }
        ResolvedAction::Rotate(rotation) => {
            body.heading = body.heading.rotated(rotation);
            Outcome::Rotated
        }
        ResolvedAction::Destroy => {
            let position = body.position;
            let monster = occupancy
                .monster_at(position)
                .ok_or(InvalidActionError::DestroyWithoutMonster { position })?;
            occupancy.remove(AgentKind::Monster, position);
            occupancy.remove(AgentKind::Robot, position);
            grid.set_empty(position);
            return Ok(Executed {
                outcome: Outcome::Destroyed,
                destroyed: Some(monster),
            });
        }
        ResolvedAction::Idle => Outcome::Idle,
        ResolvedAction::RememberVoid => Outcome::VoidNoted,
    };
    Ok(Executed::of(outcome))
}

/// Carry out a monster action. Monsters can only move or wait.
pub fn execute_monster(
    entity: Entity,
    body: &mut MonsterBody,
    action: ResolvedAction<AbsoluteDir>,
    grid: &Grid,
    occupancy: &mut Occupancy,
) -> Result<Executed, InvalidActionError> {
    match action {
        ResolvedAction::Move(dir) => {
            let target = body.position + dir.offset();
            let outcome = execute_move(AgentKind::Monster, entity, body.position, target, grid, occupancy);
            if outcome == Outcome::Moved {
                body.position = target;
            }
            Ok(Executed::of(outcome))
        }
        ResolvedAction::Idle => Ok(Executed::of(Outcome::Idle)),
        other => Err(InvalidActionError::UnsupportedForKind {
            kind: AgentKind::Monster,
            action: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::motion::{Heading, Rotation};
    use crate::components::world::CellState;

    fn robot_at(pos: GridPos) -> RobotBody {
        RobotBody {
            position: pos,
            heading: Heading::default(),
            void: false,
        }
    }

    #[test]
    fn test_move_into_free_cell() {
        let mut grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let robot = Entity::from_raw(1);
        let start = GridPos::new(2, 2, 2);
        occupancy.place(AgentKind::Robot, robot, start);

        let mut body = robot_at(start);
        let executed =
            execute_robot(robot, &mut body, ResolvedAction::Move(RelativeDir::Front), &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Moved);
        assert_eq!(body.position, GridPos::new(3, 2, 2));
        assert_eq!(occupancy.robot_at(GridPos::new(3, 2, 2)), Some(robot));
        assert_eq!(occupancy.robot_at(start), None);
    }

    #[test]
    fn test_move_into_free_cell_clears_void_flag() {
        let mut grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let robot = Entity::from_raw(1);
        let start = GridPos::new(2, 2, 2);
        occupancy.place(AgentKind::Robot, robot, start);

        let mut body = RobotBody {
            void: true,
            ..robot_at(start)
        };
        let executed =
            execute_robot(robot, &mut body, ResolvedAction::Move(RelativeDir::Front), &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Moved);
        assert_eq!(body.position, GridPos::new(3, 2, 2));
        assert!(!body.void);
    }

    #[test]
    fn test_move_into_void_stays_put() {
        let mut grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let robot = Entity::from_raw(1);
        let start = GridPos::new(1, 2, 2);
        occupancy.place(AgentKind::Robot, robot, start);

        let mut body = RobotBody {
            heading: Heading::facing(GridPos::new(-1, 0, 0)),
            ..robot_at(start)
        };
        let executed =
            execute_robot(robot, &mut body, ResolvedAction::Move(RelativeDir::Front), &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::VoidCollision);
        assert_eq!(body.position, start);
        assert!(body.void);
        assert_eq!(occupancy.robot_at(start), Some(robot));
    }

    #[test]
    fn test_same_kind_blocks() {
        let grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        occupancy.place(AgentKind::Monster, a, GridPos::new(2, 2, 2));
        occupancy.place(AgentKind::Monster, b, GridPos::new(2, 2, 3));

        let mut body = MonsterBody {
            position: GridPos::new(2, 2, 2),
        };
        let executed = execute_monster(a, &mut body, ResolvedAction::Move(AbsoluteDir::Top), &grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Blocked);
        assert_eq!(body.position, GridPos::new(2, 2, 2));
    }

    #[test]
    fn test_monster_may_enter_robot_cell() {
        let grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let monster = Entity::from_raw(1);
        occupancy.place(AgentKind::Monster, monster, GridPos::new(2, 2, 2));
        occupancy.place(AgentKind::Robot, Entity::from_raw(2), GridPos::new(2, 3, 2));

        let mut body = MonsterBody {
            position: GridPos::new(2, 2, 2),
        };
        let executed =
            execute_monster(monster, &mut body, ResolvedAction::Move(AbsoluteDir::Front), &grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Moved);
        assert_eq!(occupancy.monster_at(GridPos::new(2, 3, 2)), Some(monster));
    }

    #[test]
    fn test_destroy_removes_both_and_voids_cell() {
        let mut grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let robot = Entity::from_raw(1);
        let monster = Entity::from_raw(2);
        let cell = GridPos::new(2, 2, 2);
        occupancy.place(AgentKind::Robot, robot, cell);
        occupancy.place(AgentKind::Monster, monster, cell);
        let free_before = grid.count(CellState::Free);

        let mut body = robot_at(cell);
        let executed = execute_robot(robot, &mut body, ResolvedAction::Destroy, &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Destroyed);
        assert_eq!(executed.destroyed, Some(monster));
        assert!(occupancy.is_empty());
        assert!(!grid.is_free(cell));
        assert_eq!(grid.count(CellState::Free), free_before - 1);
    }

    #[test]
    fn test_destroy_without_monster_is_invalid() {
        let mut grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let robot = Entity::from_raw(1);
        let cell = GridPos::new(2, 2, 2);
        occupancy.place(AgentKind::Robot, robot, cell);
        occupancy.place(AgentKind::Monster, Entity::from_raw(2), GridPos::new(3, 2, 2));

        let mut body = RobotBody {
            void: true,
            ..robot_at(cell)
        };
        let err = execute_robot(robot, &mut body, ResolvedAction::Destroy, &mut grid, &mut occupancy).unwrap_err();
        assert_eq!(err, InvalidActionError::DestroyWithoutMonster { position: cell });
        assert!(!body.void);
        assert!(grid.is_free(cell));
        assert_eq!(occupancy.len(), 2);
    }

    #[test]
    fn test_rotate_and_remember() {
        let mut grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let robot = Entity::from_raw(1);
        let mut body = robot_at(GridPos::new(2, 2, 2));

        let executed =
            execute_robot(robot, &mut body, ResolvedAction::Rotate(Rotation::ZPos), &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::Rotated);
        assert_eq!(body.heading.forward, GridPos::new(0, 1, 0));
        assert_eq!(body.position, GridPos::new(2, 2, 2));

        let executed = execute_robot(robot, &mut body, ResolvedAction::RememberVoid, &mut grid, &mut occupancy).unwrap();
        assert_eq!(executed.outcome, Outcome::VoidNoted);
    }

    #[test]
    fn test_monster_cannot_destroy() {
        let grid = Grid::open(5);
        let mut occupancy = Occupancy::new();
        let mut body = MonsterBody {
            position: GridPos::new(2, 2, 2),
        };
        let err = execute_monster(Entity::from_raw(1), &mut body, ResolvedAction::Destroy, &grid, &mut occupancy)
            .unwrap_err();
        assert!(matches!(err, InvalidActionError::UnsupportedForKind { .. }));
    }

    #[test]
    fn test_productive_outcomes() {
        assert!(Outcome::Moved.is_productive());
        assert!(Outcome::VoidNoted.is_productive());
        assert!(!Outcome::VoidCollision.is_productive());
        assert!(!Outcome::Blocked.is_productive());
        assert!(!Outcome::Rejected.is_productive());
    }
}
