//! Motion Components
//!
//! Direction vocabularies and the robot heading frame.
//!
//! Robots move relative to their heading; monsters move along fixed world
//! axes. Rotations are quarter turns in the robot's own frame (right-hand
//! rule): `z` yaws about `up`, `y` pitches about `left`, `x` rolls about
//! `forward`. In the default frame these coincide with the world axes.

use bevy_ecs::prelude::*;
use std::fmt::Debug;
use std::hash::Hash;

use super::world::GridPos;

/// A closed set of named tokens as they appear in rule files
pub trait Label: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    /// Case-insensitive parse of a label
    fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.iter().copied().find(|d| d.label().eq_ignore_ascii_case(text))
    }
}

/// Robot move directions, relative to the heading. Behind is never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeDir {
    Front,
    Top,
    Left,
    Right,
    Down,
}

impl Label for RelativeDir {
    const ALL: &'static [Self] = &[
        RelativeDir::Front,
        RelativeDir::Top,
        RelativeDir::Left,
        RelativeDir::Right,
        RelativeDir::Down,
    ];

    fn label(&self) -> &'static str {
        match self {
            RelativeDir::Front => "front",
            RelativeDir::Top => "top",
            RelativeDir::Left => "left",
            RelativeDir::Right => "right",
            RelativeDir::Down => "down",
        }
    }
}

/// Monster move directions in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsoluteDir {
    Top,
    Left,
    Front,
    Right,
    Down,
    Behind,
}

impl AbsoluteDir {
    pub fn offset(&self) -> GridPos {
        match self {
            AbsoluteDir::Top => GridPos::new(0, 0, 1),
            AbsoluteDir::Left => GridPos::new(-1, 0, 0),
            AbsoluteDir::Front => GridPos::new(0, 1, 0),
            AbsoluteDir::Right => GridPos::new(1, 0, 0),
            AbsoluteDir::Down => GridPos::new(0, 0, -1),
            AbsoluteDir::Behind => GridPos::new(0, -1, 0),
        }
    }
}

impl Label for AbsoluteDir {
    const ALL: &'static [Self] = &[
        AbsoluteDir::Top,
        AbsoluteDir::Left,
        AbsoluteDir::Front,
        AbsoluteDir::Right,
        AbsoluteDir::Down,
        AbsoluteDir::Behind,
    ];

    fn label(&self) -> &'static str {
        match self {
            AbsoluteDir::Top => "top",
            AbsoluteDir::Left => "left",
            AbsoluteDir::Front => "front",
            AbsoluteDir::Right => "right",
            AbsoluteDir::Down => "down",
            AbsoluteDir::Behind => "behind",
        }
    }
}

/// Quarter turn about one axis of the heading frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    XPos,
    XNeg,
    YPos,
    YNeg,
    ZPos,
    ZNeg,
}

impl Rotation {
    /// Turn axis within `heading`
    pub fn axis(&self, heading: &Heading) -> GridPos {
        match self {
            Rotation::XPos | Rotation::XNeg => heading.forward,
            Rotation::YPos | Rotation::YNeg => heading.left(),
            Rotation::ZPos | Rotation::ZNeg => heading.up,
        }
    }

    /// Rolls keep the orientation vector fixed
    pub fn turns_forward(&self) -> bool {
        !matches!(self, Rotation::XPos | Rotation::XNeg)
    }

    fn positive(&self) -> bool {
        matches!(self, Rotation::XPos | Rotation::YPos | Rotation::ZPos)
    }
}

/// Rotate `v` by +90° (or -90°) about the unit axis `axis`:
/// v' = (a·v)a ± a×v
fn quarter_turn(axis: GridPos, positive: bool, v: GridPos) -> GridPos {
    let along = axis.scale(axis.dot(v));
    let across = axis.cross(v);
    if positive {
        along + across
    } else {
        along + -across
    }
}

impl Label for Rotation {
    const ALL: &'static [Self] = &[
        Rotation::XPos,
        Rotation::XNeg,
        Rotation::YPos,
        Rotation::YNeg,
        Rotation::ZPos,
        Rotation::ZNeg,
    ];

    fn label(&self) -> &'static str {
        match self {
            Rotation::XPos => "x+90",
            Rotation::XNeg => "x-90",
            Rotation::YPos => "y+90",
            Rotation::YNeg => "y-90",
            Rotation::ZPos => "z+90",
            Rotation::ZNeg => "z-90",
        }
    }
}

/// Axis-aligned orthonormal frame. `forward` is the robot's orientation.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading {
    pub forward: GridPos,
    pub up: GridPos,
}

impl Default for Heading {
    fn default() -> Self {
        Self {
            forward: GridPos::new(1, 0, 0),
            up: GridPos::new(0, 0, 1),
        }
    }
}

impl Heading {
    /// Heading facing `forward` with +Z up, or +Y up when facing along Z
    pub fn facing(forward: GridPos) -> Self {
        let up = if forward.z == 0 {
            GridPos::new(0, 0, 1)
        } else {
            GridPos::new(0, 1, 0)
        };
        Self { forward, up }
    }

    pub fn left(&self) -> GridPos {
        self.up.cross(self.forward)
    }

    /// World offset of a relative direction
    pub fn offset(&self, dir: RelativeDir) -> GridPos {
        match dir {
            RelativeDir::Front => self.forward,
            RelativeDir::Top => self.up,
            RelativeDir::Left => self.left(),
            RelativeDir::Right => -self.left(),
            RelativeDir::Down => -self.up,
        }
    }

    pub fn rotated(&self, rotation: Rotation) -> Self {
        let axis = rotation.axis(self);
        let positive = rotation.positive();
        Self {
            forward: quarter_turn(axis, positive, self.forward),
            up: quarter_turn(axis, positive, self.up),
        }
    }
}
