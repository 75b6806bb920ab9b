//! World Components
//!
//! The 3D grid of cells, grid positions and the per-cell occupancy index.

use bevy_ecs::prelude::*;
use hunt_events::AgentKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Neg};

use crate::random::RandomSource;

/// Integer cell coordinate. Out-of-bounds values are representable and
/// read as EMPTY by every grid query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_array([x, y, z]: [i32; 3]) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: GridPos) -> i32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn scale(self, k: i32) -> GridPos {
        GridPos::new(self.x * k, self.y * k, self.z * k)
    }

    /// Right-handed cross product, used on unit direction vectors
    pub fn cross(self, other: GridPos) -> GridPos {
        GridPos::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl Add for GridPos {
    type Output = GridPos;

    fn add(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Neg for GridPos {
    type Output = GridPos;

    fn neg(self) -> GridPos {
        GridPos::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Component holding an agent's cell
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(pub GridPos);

/// State of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// Passable
    Free,
    /// Impassable void
    Empty,
}

const AXIS_STEPS: [GridPos; 6] = [
    GridPos::new(1, 0, 0),
    GridPos::new(-1, 0, 0),
    GridPos::new(0, 1, 0),
    GridPos::new(0, -1, 0),
    GridPos::new(0, 0, 1),
    GridPos::new(0, 0, -1),
];

/// Cubic N×N×N grid. Cells only ever go FREE → EMPTY once the run has started.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Grid {
    size: i32,
    cells: Vec<CellState>,
}

impl Grid {
    /// Largest supported edge length
    pub const MAX_SIZE: i32 = 256;

    /// Grid with every interior cell FREE and the shell EMPTY. The edge
    /// length is clamped to `0..=MAX_SIZE`.
    pub fn open(size: i32) -> Self {
        let size = size.clamp(0, Self::MAX_SIZE);
        let count = (size as usize).pow(3);
        let mut grid = Self {
            size,
            cells: vec![CellState::Free; count],
        };
        grid.seal_boundary();
        grid
    }

    /// Random grid: each interior cell is FREE or EMPTY by an independent
    /// weighted draw, then the whole boundary shell is forced EMPTY.
    pub fn generate(size: i32, free_weight: f64, empty_weight: f64, rng: &mut dyn RandomSource) -> Self {
        let mut grid = Self::open(size);
        let total = free_weight + empty_weight;
        let p_free = if total > 0.0 { free_weight / total } else { 1.0 };

        for z in 1..size - 1 {
            for y in 1..size - 1 {
                for x in 1..size - 1 {
                    if rng.unit() >= p_free {
                        let pos = GridPos::new(x, y, z);
                        if let Some(i) = grid.index(pos) {
                            grid.cells[i] = CellState::Empty;
                        }
                    }
                }
            }
        }
        grid
    }

    fn seal_boundary(&mut self) {
        let n = self.size;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let pos = GridPos::new(x, y, z);
                    if self.is_boundary(pos) {
                        if let Some(i) = self.index(pos) {
                            self.cells[i] = CellState::Empty;
                        }
                    }
                }
            }
        }
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if !self.is_in_bounds(pos) {
            return None;
        }
        let n = self.size as usize;
        Some(pos.x as usize + n * (pos.y as usize + n * pos.z as usize))
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn is_in_bounds(&self, pos: GridPos) -> bool {
        (0..self.size).contains(&pos.x) && (0..self.size).contains(&pos.y) && (0..self.size).contains(&pos.z)
    }

    /// Cell on the outer shell
    pub fn is_boundary(&self, pos: GridPos) -> bool {
        let edge = self.size - 1;
        [pos.x, pos.y, pos.z].iter().any(|&c| c == 0 || c == edge)
    }

    pub fn state(&self, pos: GridPos) -> CellState {
        self.index(pos).map(|i| self.cells[i]).unwrap_or(CellState::Empty)
    }

    pub fn is_free(&self, pos: GridPos) -> bool {
        self.state(pos) == CellState::Free
    }

    /// Turn a cell into void. Out-of-bounds positions are ignored.
    pub fn set_empty(&mut self, pos: GridPos) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = CellState::Empty;
        }
    }

    /// Open an interior cell during setup. Returns false on the shell or out of bounds.
    pub fn carve(&mut self, pos: GridPos) -> bool {
        if self.is_boundary(pos) {
            return false;
        }
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = CellState::Free;
                true
            }
            None => false,
        }
    }

    /// Axis-aligned in-bounds neighbours (at most six)
    pub fn neighbors(&self, pos: GridPos) -> Vec<GridPos> {
        AXIS_STEPS
            .iter()
            .map(|&step| pos + step)
            .filter(|&p| self.is_in_bounds(p))
            .collect()
    }

    /// Every FREE cell in x-fastest order
    pub fn free_cells(&self) -> Vec<GridPos> {
        self.positions().filter(|&p| self.is_free(p)).collect()
    }

    /// EMPTY cells that are not part of the shell
    pub fn interior_empty_cells(&self) -> Vec<GridPos> {
        self.positions()
            .filter(|&p| !self.is_boundary(p) && !self.is_free(p))
            .collect()
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        let n = self.size;
        (0..n).flat_map(move |z| (0..n).flat_map(move |y| (0..n).map(move |x| GridPos::new(x, y, z))))
    }
}

/// Agents present in one cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellOccupants {
    pub robot: Option<Entity>,
    pub monster: Option<Entity>,
}

impl CellOccupants {
    fn slot(&mut self, kind: AgentKind) -> &mut Option<Entity> {
        match kind {
            AgentKind::Robot => &mut self.robot,
            AgentKind::Monster => &mut self.monster,
        }
    }

    fn is_vacant(&self) -> bool {
        self.robot.is_none() && self.monster.is_none()
    }
}

/// Resource indexing agents by cell. At most one robot and one monster per cell.
#[derive(Resource, Debug, Default)]
pub struct Occupancy {
    cells: HashMap<GridPos, CellOccupants>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all occupancy data (called before rebuilding)
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn place(&mut self, kind: AgentKind, entity: Entity, pos: GridPos) {
        *self.cells.entry(pos).or_default().slot(kind) = Some(entity);
    }

    /// Remove whichever agent of `kind` sits at `pos`
    pub fn remove(&mut self, kind: AgentKind, pos: GridPos) -> Option<Entity> {
        let occupants = self.cells.get_mut(&pos)?;
        let removed = occupants.slot(kind).take();
        if occupants.is_vacant() {
            self.cells.remove(&pos);
        }
        removed
    }

    pub fn relocate(&mut self, kind: AgentKind, entity: Entity, from: GridPos, to: GridPos) {
        self.remove(kind, from);
        self.place(kind, entity, to);
    }

    pub fn occupant(&self, pos: GridPos, kind: AgentKind) -> Option<Entity> {
        self.cells.get(&pos).and_then(|c| match kind {
            AgentKind::Robot => c.robot,
            AgentKind::Monster => c.monster,
        })
    }

    pub fn robot_at(&self, pos: GridPos) -> Option<Entity> {
        self.occupant(pos, AgentKind::Robot)
    }

    pub fn monster_at(&self, pos: GridPos) -> Option<Entity> {
        self.occupant(pos, AgentKind::Monster)
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
