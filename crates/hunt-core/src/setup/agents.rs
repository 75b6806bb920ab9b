//! Agent Spawning
//!
//! Turns a blueprint into ECS entities and resources.

use bevy_ecs::prelude::*;
use std::fmt;

use super::world::Blueprint;
use crate::components::agent::{AgentId, Cadence, Monster, Robot, VoidFlag};
use crate::components::memory::ExperienceMemory;
use crate::components::world::Position;
use crate::config::BehaviorConfig;
use crate::rules::RobotPercept;

/// Insert the blueprint's grid and spawn every agent. Ids follow the
/// blueprint order: `R000`, `R001`, … then `M000`, …
pub fn spawn_blueprint(world: &mut World, blueprint: &Blueprint, behavior: &BehaviorConfig) -> SpawnSummary {
    world.insert_resource(blueprint.grid.clone());

    for (serial, &(position, heading)) in blueprint.robots.iter().enumerate() {
        world.spawn((
            AgentId::robot(serial as u32),
            Robot,
            Position(position),
            heading,
            VoidFlag(false),
            Cadence::every(behavior.robot_period),
            ExperienceMemory::<RobotPercept>::new(behavior.memory_capacity),
        ));
    }

    for (serial, &position) in blueprint.monsters.iter().enumerate() {
        world.spawn((
            AgentId::monster(serial as u32),
            Monster,
            Position(position),
            Cadence::new(behavior.monster_period, behavior.monster_probability),
        ));
    }

    get_spawn_summary(world)
}

/// Count live agents per kind
pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let robots = world.query_filtered::<(), With<Robot>>().iter(world).count();
    let monsters = world.query_filtered::<(), With<Monster>>().iter(world).count();
    SpawnSummary { robots, monsters }
}

/// Summary of spawned agents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSummary {
    pub robots: usize,
    pub monsters: usize,
}

impl fmt::Display for SpawnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} robots, {} monsters", self.robots, self.monsters)
    }
}
