//! Snapshot Generation
//!
//! Captures the grid and every live agent, and writes the JSON files.

use bevy_ecs::prelude::*;
use hunt_events::{generate_snapshot_id, AgentSnapshot, GridSnapshot, WorldSnapshot};
use std::fs;
use std::path::Path;

use crate::components::agent::{AgentId, Destroyed};
use crate::components::memory::ExperienceMemory;
use crate::components::motion::Heading;
use crate::components::world::{CellState, Grid, Position};
use crate::rules::RobotPercept;
use crate::systems::turns::TickClock;

/// Resource tracking snapshot cadence
#[derive(Resource, Debug)]
pub struct SnapshotGenerator {
    interval: u64,
    next_sequence: u64,
}

impl SnapshotGenerator {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            next_sequence: 1,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Check if a snapshot should be taken at this tick
    pub fn should_snapshot(&self, tick: u64) -> bool {
        tick > 0 && tick % self.interval == 0
    }

    /// Generate the next snapshot ID
    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_sequence);
        self.next_sequence += 1;
        id
    }
}

/// Capture the current world. Uses the SnapshotGenerator's sequence when present.
pub fn generate_snapshot(world: &mut World, trigger: &str) -> WorldSnapshot {
    let tick = world.get_resource::<TickClock>().map(|c| c.tick).unwrap_or(0);
    let id = world
        .get_resource_mut::<SnapshotGenerator>()
        .map(|mut g| g.next_id())
        .unwrap_or_else(|| generate_snapshot_id(0));

    let mut snapshot = WorldSnapshot::new(id, tick, trigger);

    if let Some(grid) = world.get_resource::<Grid>() {
        snapshot.grid = GridSnapshot {
            size: grid.size(),
            free_cells: grid.count(CellState::Free),
            empty_cells: grid.count(CellState::Empty),
            interior_empty: grid.interior_empty_cells().into_iter().map(|p| p.to_array()).collect(),
        };
    }

    let mut query = world.query_filtered::<(
        &AgentId,
        &Position,
        Option<&Heading>,
        Option<&ExperienceMemory<RobotPercept>>,
    ), Without<Destroyed>>();
    let mut agents: Vec<(AgentId, AgentSnapshot)> = query
        .iter(world)
        .map(|(id, position, heading, memory)| {
            (
                *id,
                AgentSnapshot {
                    agent_id: id.to_string(),
                    kind: id.kind,
                    position: position.0.to_array(),
                    orientation: heading.map(|h| h.forward.to_array()),
                    memory_size: memory.map(|m| m.len()),
                },
            )
        })
        .collect();
    agents.sort_by_key(|(id, _)| *id);
    snapshot.agents = agents.into_iter().map(|(_, a)| a).collect();

    snapshot
}

/// Write a snapshot to `<dir>/snapshots/snap_<tick>.json`
pub fn write_snapshot_to_dir(dir: impl AsRef<Path>, snapshot: &WorldSnapshot) -> std::io::Result<()> {
    let snapshots = dir.as_ref().join("snapshots");
    fs::create_dir_all(&snapshots)?;
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(snapshots.join(format!("snap_{:06}.json", snapshot.tick)), json)
}

/// Write the current state to `<dir>/current_state.json`
pub fn write_current_state(dir: impl AsRef<Path>, snapshot: &WorldSnapshot) -> std::io::Result<()> {
    fs::create_dir_all(dir.as_ref())?;
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(dir.as_ref().join("current_state.json"), json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::{Monster, Robot};
    use crate::components::world::GridPos;
    use hunt_events::AgentKind;

    #[test]
    fn test_snapshot_interval() {
        let mut generator = SnapshotGenerator::new(10);
        assert!(!generator.should_snapshot(0));
        assert!(generator.should_snapshot(10));
        assert!(!generator.should_snapshot(15));
        assert_eq!(generator.next_id(), "snap_000001");
        assert_eq!(generator.next_id(), "snap_000002");
    }

    #[test]
    fn test_generate_snapshot_lists_live_agents() {
        let mut world = World::new();
        let mut grid = Grid::open(5);
        grid.set_empty(GridPos::new(2, 2, 2));
        world.insert_resource(grid);
        world.insert_resource(TickClock { tick: 7 });
        world.insert_resource(SnapshotGenerator::new(5));

        world.spawn((
            AgentId::monster(0),
            Monster,
            Position(GridPos::new(3, 3, 3)),
        ));
        world.spawn((
            AgentId::robot(0),
            Robot,
            Position(GridPos::new(1, 2, 2)),
            Heading::default(),
            ExperienceMemory::<RobotPercept>::new(8),
        ));
        world.spawn((
            AgentId::monster(1),
            Monster,
            Position(GridPos::new(1, 1, 1)),
            Destroyed { tick: 3 },
        ));

        let snapshot = generate_snapshot(&mut world, "scheduled");
        assert_eq!(snapshot.snapshot_id, "snap_000001");
        assert_eq!(snapshot.tick, 7);
        assert_eq!(snapshot.grid.free_cells, 26);
        assert_eq!(snapshot.grid.interior_empty, vec![[2, 2, 2]]);
        assert_eq!(snapshot.agents.len(), 2);
        assert_eq!(snapshot.agents[0].agent_id, "R000");
        assert_eq!(snapshot.agents[0].orientation, Some([1, 0, 0]));
        assert_eq!(snapshot.agents[0].memory_size, Some(0));
        assert_eq!(snapshot.count(AgentKind::Monster), 1);
    }

    #[test]
    fn test_write_snapshot_files() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = WorldSnapshot::new("snap_000001", 20, "scheduled");
        write_snapshot_to_dir(dir.path(), &snapshot).unwrap();
        write_current_state(dir.path(), &snapshot).unwrap();
        assert!(dir.path().join("snapshots/snap_000020.json").exists());
        assert!(dir.path().join("current_state.json").exists());
    }
}
