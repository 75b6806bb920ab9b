//! World Blueprint
//!
//! The initial grid and start cells, generated once per run and kept so a
//! reset can rebuild exactly the same world.

use hunt_events::AgentKind;
use std::collections::HashSet;

use crate::components::motion::Heading;
use crate::components::world::{Grid, GridPos};
use crate::config::Config;
use crate::error::SetupError;
use crate::random::RandomSource;

/// Initial world state
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub grid: Grid,
    /// Start cell and heading, in robot id order
    pub robots: Vec<(GridPos, Heading)>,
    /// Start cell, in monster id order
    pub monsters: Vec<GridPos>,
}

impl Blueprint {
    /// Blueprint over an existing grid with every agent placed explicitly.
    /// Used for hand-built scenarios; the grid is taken as is.
    pub fn fixed(grid: Grid, robots: Vec<(GridPos, Heading)>, monsters: Vec<GridPos>) -> Self {
        Self { grid, robots, monsters }
    }
}

/// Build the grid and choose start cells.
///
/// Fixed positions are opened even if the draw made them EMPTY; the rest
/// of each population is spread uniformly over unoccupied FREE cells,
/// robots first.
pub fn generate_blueprint(config: &Config, rng: &mut dyn RandomSource) -> Result<Blueprint, SetupError> {
    let mut grid = Grid::generate(
        config.world.size,
        config.world.free_fraction,
        config.world.empty_fraction,
        rng,
    );

    let fixed_robots = place_fixed(&mut grid, AgentKind::Robot, &config.agents.robot_positions, &HashSet::new())?;
    let robot_cells: HashSet<GridPos> = fixed_robots.iter().copied().collect();
    let fixed_monsters = place_fixed(&mut grid, AgentKind::Monster, &config.agents.monster_positions, &robot_cells)?;

    let mut taken: HashSet<GridPos> = robot_cells;
    taken.extend(fixed_monsters.iter().copied());
    let mut open: Vec<GridPos> = grid.free_cells().into_iter().filter(|p| !taken.contains(p)).collect();

    let robots = fill(AgentKind::Robot, fixed_robots, config.agents.robots, &mut open, rng)?;
    let monsters = fill(AgentKind::Monster, fixed_monsters, config.agents.monsters, &mut open, rng)?;

    Ok(Blueprint {
        grid,
        robots: robots.into_iter().map(|p| (p, Heading::default())).collect(),
        monsters,
    })
}

fn place_fixed(
    grid: &mut Grid,
    kind: AgentKind,
    positions: &[[i32; 3]],
    forbidden: &HashSet<GridPos>,
) -> Result<Vec<GridPos>, SetupError> {
    let mut placed = Vec::with_capacity(positions.len());
    for &coords in positions {
        let position = GridPos::from_array(coords);
        let invalid = |reason: &str| SetupError::InvalidPlacement {
            kind,
            position,
            reason: reason.to_string(),
        };

        if !grid.is_in_bounds(position) {
            return Err(invalid("out of bounds"));
        }
        if placed.contains(&position) {
            return Err(invalid("listed twice"));
        }
        if forbidden.contains(&position) {
            return Err(invalid("cell already holds an agent"));
        }
        if !grid.carve(position) {
            return Err(invalid("cell is on the boundary shell"));
        }
        placed.push(position);
    }
    Ok(placed)
}

/// Top up `placed` to `count` agents with uniform draws from `open`
fn fill(
    kind: AgentKind,
    mut placed: Vec<GridPos>,
    count: usize,
    open: &mut Vec<GridPos>,
    rng: &mut dyn RandomSource,
) -> Result<Vec<GridPos>, SetupError> {
    let requested = count.max(placed.len());
    while placed.len() < requested {
        if open.is_empty() {
            return Err(SetupError::NoFreeCell {
                kind,
                placed: placed.len(),
                requested,
            });
        }
        let cell = open.swap_remove(rng.index(open.len()));
        placed.push(cell);
    }
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::world::CellState;
    use crate::random::ScriptedRandom;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn config(size: i32, robots: usize, monsters: usize) -> Config {
        let mut config = Config::default();
        config.world.size = size;
        config.world.free_fraction = 1.0;
        config.world.empty_fraction = 0.0;
        config.agents.robots = robots;
        config.agents.monsters = monsters;
        config
    }

    #[test]
    fn test_agents_start_on_distinct_free_cells() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut config = config(6, 5, 5);
        config.world.free_fraction = 0.7;
        config.world.empty_fraction = 0.3;
        let blueprint = generate_blueprint(&config, &mut rng).unwrap();

        assert_eq!(blueprint.robots.len(), 5);
        assert_eq!(blueprint.monsters.len(), 5);
        let mut cells: HashSet<GridPos> = HashSet::new();
        for position in blueprint.robots.iter().map(|(p, _)| *p).chain(blueprint.monsters.iter().copied()) {
            assert!(blueprint.grid.is_free(position));
            assert!(cells.insert(position), "two agents share {}", position);
        }
    }

    #[test]
    fn test_fixed_positions_are_carved() {
        let mut config = config(5, 1, 1);
        config.world.free_fraction = 0.0;
        config.world.empty_fraction = 1.0;
        config.agents.robot_positions = vec![[1, 2, 2]];
        config.agents.monster_positions = vec![[2, 2, 2]];

        let mut rng = ScriptedRandom::new().with_units([0.0; 27]);
        let blueprint = generate_blueprint(&config, &mut rng).unwrap();
        assert_eq!(blueprint.robots[0].0, GridPos::new(1, 2, 2));
        assert_eq!(blueprint.robots[0].1, Heading::default());
        assert_eq!(blueprint.monsters, vec![GridPos::new(2, 2, 2)]);
        assert_eq!(blueprint.grid.count(CellState::Free), 2);
    }

    #[test]
    fn test_invalid_fixed_positions() {
        let mut rng = SmallRng::seed_from_u64(1);

        let mut shell = config(5, 1, 0);
        shell.agents.robot_positions = vec![[0, 2, 2]];
        assert!(matches!(
            generate_blueprint(&shell, &mut rng),
            Err(SetupError::InvalidPlacement { .. })
        ));

        let mut outside = config(5, 1, 0);
        outside.agents.robot_positions = vec![[9, 2, 2]];
        assert!(matches!(
            generate_blueprint(&outside, &mut rng),
            Err(SetupError::InvalidPlacement { .. })
        ));

        let mut shared = config(5, 1, 1);
        shared.agents.robot_positions = vec![[2, 2, 2]];
        shared.agents.monster_positions = vec![[2, 2, 2]];
        assert!(matches!(
            generate_blueprint(&shared, &mut rng),
            Err(SetupError::InvalidPlacement { kind: AgentKind::Monster, .. })
        ));
    }

    #[test]
    fn test_not_enough_free_cells() {
        // a 3×3×3 grid has a single interior cell
        let mut rng = SmallRng::seed_from_u64(3);
        let err = generate_blueprint(&config(3, 1, 1), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SetupError::NoFreeCell {
                kind: AgentKind::Monster,
                placed: 0,
                requested: 1
            }
        ));
    }
}
