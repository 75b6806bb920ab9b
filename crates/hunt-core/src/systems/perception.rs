//! Perception System
//!
//! Builds the occupancy index each tick and turns world state into
//! percepts. Sensing is a pure read of the grid and the index.

use bevy_ecs::prelude::*;

use crate::components::agent::{Destroyed, Monster, Robot};
use crate::components::motion::{AbsoluteDir, Heading, Label, RelativeDir};
use crate::components::world::{Grid, GridPos, Occupancy, Position};
use crate::rules::{MonsterPercept, Passage, PeerReading, Presence, RobotPercept, VoidReading};
use hunt_events::AgentKind;

/// Read-only view of everything a sensor may look at
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub grid: &'a Grid,
    pub occupancy: &'a Occupancy,
}

impl<'a> WorldView<'a> {
    pub fn new(grid: &'a Grid, occupancy: &'a Occupancy) -> Self {
        Self { grid, occupancy }
    }

    pub fn has_monster(&self, pos: GridPos) -> bool {
        self.occupancy.monster_at(pos).is_some()
    }

    pub fn has_robot(&self, pos: GridPos) -> bool {
        self.occupancy.robot_at(pos).is_some()
    }
}

/// Robot sensors, relative to the heading. Void is never seen at range;
/// it comes from the robot's own collision flag.
pub fn sense_robot(view: &WorldView<'_>, position: GridPos, heading: &Heading, void: bool) -> RobotPercept {
    let monster = |dir: RelativeDir| Presence::from_flag(view.has_monster(position + heading.offset(dir)));

    RobotPercept {
        same_cell: Presence::from_flag(view.has_monster(position)),
        top: monster(RelativeDir::Top),
        left: monster(RelativeDir::Left),
        void_front: if void {
            VoidReading::Collided
        } else {
            VoidReading::Clear
        },
        front: monster(RelativeDir::Front),
        peer_front: if view.has_robot(position + heading.forward) {
            PeerReading::Robot
        } else {
            PeerReading::Clear
        },
        right: monster(RelativeDir::Right),
        down: monster(RelativeDir::Down),
    }
}

/// Monster sensors: a neighbour is open when it is in bounds, FREE and
/// holds no other monster. Monsters do not sense robots.
pub fn sense_monster(view: &WorldView<'_>, position: GridPos) -> MonsterPercept {
    let mut percept = MonsterPercept::default();
    for &dir in AbsoluteDir::ALL {
        let target = position + dir.offset();
        let open = view.grid.is_free(target) && !view.has_monster(target);
        percept.set(dir, if open { Passage::Open } else { Passage::Blocked });
    }
    percept
}

/// System to rebuild the occupancy index from live agents.
/// Runs first so every turn starts from a consistent index.
pub fn build_occupancy_index(
    mut occupancy: ResMut<Occupancy>,
    robots: Query<(Entity, &Position), (With<Robot>, Without<Destroyed>)>,
    monsters: Query<(Entity, &Position), (With<Monster>, Without<Destroyed>)>,
) {
    occupancy.clear();

    for (entity, position) in robots.iter() {
        occupancy.place(AgentKind::Robot, entity, position.0);
    }
    for (entity, position) in monsters.iter() {
        occupancy.place(AgentKind::Monster, entity, position.0);
    }
}
