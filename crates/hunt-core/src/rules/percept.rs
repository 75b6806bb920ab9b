//! Percepts
//!
//! Fixed-arity sensor records for each agent kind, and the canonical rule
//! key each percept is looked up under.

use hunt_events::{AgentKind, Reading};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use super::action::ActionTag;
use crate::components::motion::{AbsoluteDir, Label, RelativeDir};

/// A sensor column: its name in rule files and the readings it can produce
#[derive(Debug, Clone, Copy)]
pub struct Sensor {
    pub name: &'static str,
    pub domain: &'static [i8],
}

impl Sensor {
    pub fn accepts(&self, value: i64) -> bool {
        self.domain.iter().any(|&d| i64::from(d) == value)
    }
}

/// Which rule class a percept falls into, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Void,
    SameCell,
    Peer,
    Ordinary,
}

impl Precedence {
    pub fn label(&self) -> &'static str {
        match self {
            Precedence::Void => "void",
            Precedence::SameCell => "same_cell",
            Precedence::Peer => "peer",
            Precedence::Ordinary => "ordinary",
        }
    }

    pub fn is_special(&self) -> bool {
        *self != Precedence::Ordinary
    }
}

/// A complete set of sensor readings for one agent kind
pub trait Percept: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Move direction vocabulary for this kind
    type Direction: Label;

    const KIND: AgentKind;

    /// Columns in rule-file order
    const SENSORS: &'static [Sensor];

    /// Build from readings in `SENSORS` order. None if any value is outside its domain.
    fn from_readings(values: &[i8]) -> Option<Self>;

    fn readings(&self) -> Vec<i8>;

    fn precedence(&self) -> Precedence;

    /// The key this percept is looked up under. Special rules key on their
    /// trigger sensor alone.
    fn rule_key(&self) -> Self;

    /// Whether this kind may perform actions tagged `tag`
    fn supports(tag: ActionTag) -> bool;

    /// Every percept the sensor model can produce
    fn all() -> Vec<Self> {
        let mut combos: Vec<Vec<i8>> = vec![Vec::new()];
        for sensor in Self::SENSORS {
            combos = combos
                .into_iter()
                .flat_map(|prefix| {
                    sensor.domain.iter().map(move |&v| {
                        let mut next = prefix.clone();
                        next.push(v);
                        next
                    })
                })
                .collect();
        }
        combos.iter().filter_map(|c| Self::from_readings(c)).collect()
    }

    /// Keys a complete table has to cover
    fn reachable_keys() -> HashSet<Self> {
        Self::all().into_iter().map(|p| p.rule_key()).collect()
    }

    /// Named readings for logs
    fn named_readings(&self) -> Vec<Reading> {
        Self::SENSORS
            .iter()
            .zip(self.readings())
            .map(|(s, v)| Reading::new(s.name, v))
            .collect()
    }

    fn describe(&self) -> String {
        Self::SENSORS
            .iter()
            .zip(self.readings())
            .map(|(s, v)| format!("{}={}", s.name, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Monster detector bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presence {
    #[default]
    Absent,
    Present,
}

impl Presence {
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Presence::Present
        } else {
            Presence::Absent
        }
    }

    fn value(self) -> i8 {
        match self {
            Presence::Absent => 0,
            Presence::Present => 1,
        }
    }

    fn from_value(v: i8) -> Option<Self> {
        match v {
            0 => Some(Presence::Absent),
            1 => Some(Presence::Present),
            _ => None,
        }
    }
}

/// Void detector: set after a move into an EMPTY cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VoidReading {
    #[default]
    Clear,
    Collided,
}

impl VoidReading {
    fn value(self) -> i8 {
        match self {
            VoidReading::Clear => 0,
            VoidReading::Collided => -1,
        }
    }

    fn from_value(v: i8) -> Option<Self> {
        match v {
            0 => Some(VoidReading::Clear),
            -1 => Some(VoidReading::Collided),
            _ => None,
        }
    }
}

/// Peer detector: another robot directly ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PeerReading {
    #[default]
    Clear,
    Robot,
}

impl PeerReading {
    fn value(self) -> i8 {
        match self {
            PeerReading::Clear => 0,
            PeerReading::Robot => 2,
        }
    }

    fn from_value(v: i8) -> Option<Self> {
        match v {
            0 => Some(PeerReading::Clear),
            2 => Some(PeerReading::Robot),
            _ => None,
        }
    }
}

/// Monster passage reading for one neighbour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Passage {
    #[default]
    Open,
    Blocked,
}

impl Passage {
    fn value(self) -> i8 {
        match self {
            Passage::Open => 0,
            Passage::Blocked => -1,
        }
    }

    fn from_value(v: i8) -> Option<Self> {
        match v {
            0 => Some(Passage::Open),
            -1 => Some(Passage::Blocked),
            _ => None,
        }
    }
}

const PRESENCE: &[i8] = &[0, 1];
const PASSAGE: &[i8] = &[0, -1];

/// What a robot senses in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RobotPercept {
    pub same_cell: Presence,
    pub top: Presence,
    pub left: Presence,
    pub void_front: VoidReading,
    pub front: Presence,
    pub peer_front: PeerReading,
    pub right: Presence,
    pub down: Presence,
}

impl Percept for RobotPercept {
    type Direction = RelativeDir;

    const KIND: AgentKind = AgentKind::Robot;

    const SENSORS: &'static [Sensor] = &[
        Sensor { name: "same_cell", domain: PRESENCE },
        Sensor { name: "top", domain: PRESENCE },
        Sensor { name: "left", domain: PRESENCE },
        Sensor { name: "void_front", domain: &[0, -1] },
        Sensor { name: "front", domain: PRESENCE },
        Sensor { name: "peer_front", domain: &[0, 2] },
        Sensor { name: "right", domain: PRESENCE },
        Sensor { name: "down", domain: PRESENCE },
    ];

    fn from_readings(values: &[i8]) -> Option<Self> {
        let [same_cell, top, left, void_front, front, peer_front, right, down] = values else {
            return None;
        };
        Some(Self {
            same_cell: Presence::from_value(*same_cell)?,
            top: Presence::from_value(*top)?,
            left: Presence::from_value(*left)?,
            void_front: VoidReading::from_value(*void_front)?,
            front: Presence::from_value(*front)?,
            peer_front: PeerReading::from_value(*peer_front)?,
            right: Presence::from_value(*right)?,
            down: Presence::from_value(*down)?,
        })
    }

    fn readings(&self) -> Vec<i8> {
        vec![
            self.same_cell.value(),
            self.top.value(),
            self.left.value(),
            self.void_front.value(),
            self.front.value(),
            self.peer_front.value(),
            self.right.value(),
            self.down.value(),
        ]
    }

    fn precedence(&self) -> Precedence {
        if self.void_front == VoidReading::Collided {
            Precedence::Void
        } else if self.same_cell == Presence::Present {
            Precedence::SameCell
        } else if self.peer_front == PeerReading::Robot {
            Precedence::Peer
        } else {
            Precedence::Ordinary
        }
    }

    fn rule_key(&self) -> Self {
        match self.precedence() {
            Precedence::Void => Self {
                void_front: VoidReading::Collided,
                ..Self::default()
            },
            Precedence::SameCell => Self {
                same_cell: Presence::Present,
                ..Self::default()
            },
            Precedence::Peer => Self {
                peer_front: PeerReading::Robot,
                ..Self::default()
            },
            Precedence::Ordinary => *self,
        }
    }

    fn supports(_tag: ActionTag) -> bool {
        true
    }
}

/// What a monster senses in one tick, in world directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MonsterPercept {
    pub top: Passage,
    pub left: Passage,
    pub front: Passage,
    pub right: Passage,
    pub down: Passage,
    pub behind: Passage,
}

impl MonsterPercept {
    pub fn set(&mut self, dir: AbsoluteDir, passage: Passage) {
        let slot = match dir {
            AbsoluteDir::Top => &mut self.top,
            AbsoluteDir::Left => &mut self.left,
            AbsoluteDir::Front => &mut self.front,
            AbsoluteDir::Right => &mut self.right,
            AbsoluteDir::Down => &mut self.down,
            AbsoluteDir::Behind => &mut self.behind,
        };
        *slot = passage;
    }
}

impl Percept for MonsterPercept {
    type Direction = AbsoluteDir;

    const KIND: AgentKind = AgentKind::Monster;

    const SENSORS: &'static [Sensor] = &[
        Sensor { name: "top", domain: PASSAGE },
        Sensor { name: "left", domain: PASSAGE },
        Sensor { name: "front", domain: PASSAGE },
        Sensor { name: "right", domain: PASSAGE },
        Sensor { name: "down", domain: PASSAGE },
        Sensor { name: "behind", domain: PASSAGE },
    ];

    fn from_readings(values: &[i8]) -> Option<Self> {
        let [top, left, front, right, down, behind] = values else {
            return None;
        };
        Some(Self {
            top: Passage::from_value(*top)?,
            left: Passage::from_value(*left)?,
            front: Passage::from_value(*front)?,
            right: Passage::from_value(*right)?,
            down: Passage::from_value(*down)?,
            behind: Passage::from_value(*behind)?,
        })
    }

    fn readings(&self) -> Vec<i8> {
        vec![
            self.top.value(),
            self.left.value(),
            self.front.value(),
            self.right.value(),
            self.down.value(),
            self.behind.value(),
        ]
    }

    fn precedence(&self) -> Precedence {
        Precedence::Ordinary
    }

    fn rule_key(&self) -> Self {
        *self
    }

    fn supports(tag: ActionTag) -> bool {
        matches!(tag, ActionTag::Move | ActionTag::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robot_percept_space() {
        assert_eq!(RobotPercept::all().len(), 256);
        assert_eq!(RobotPercept::reachable_keys().len(), 35);
    }

    #[test]
    fn test_monster_percept_space() {
        assert_eq!(MonsterPercept::all().len(), 64);
        assert_eq!(MonsterPercept::reachable_keys().len(), 64);
    }

    #[test]
    fn test_void_outranks_same_cell_and_peer() {
        let percept = RobotPercept {
            same_cell: Presence::Present,
            void_front: VoidReading::Collided,
            peer_front: PeerReading::Robot,
            front: Presence::Present,
            ..Default::default()
        };
        assert_eq!(percept.precedence(), Precedence::Void);
        assert_eq!(
            percept.rule_key(),
            RobotPercept {
                void_front: VoidReading::Collided,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_same_cell_outranks_peer() {
        let percept = RobotPercept {
            same_cell: Presence::Present,
            peer_front: PeerReading::Robot,
            left: Presence::Present,
            ..Default::default()
        };
        assert_eq!(percept.precedence(), Precedence::SameCell);
        assert_eq!(percept.rule_key().readings(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_ordinary_key_is_identity() {
        let percept = RobotPercept {
            top: Presence::Present,
            right: Presence::Present,
            ..Default::default()
        };
        assert_eq!(percept.precedence(), Precedence::Ordinary);
        assert_eq!(percept.rule_key(), percept);
    }

    #[test]
    fn test_readings_round_trip() {
        let values = [0, 1, 0, -1, 1, 2, 0, 1];
        let percept = RobotPercept::from_readings(&values).unwrap();
        assert_eq!(percept.readings(), values.to_vec());
        assert!(RobotPercept::from_readings(&[0, 1, 0, 1, 1, 2, 0, 1]).is_none());
        assert!(MonsterPercept::from_readings(&[0, 0, 0]).is_none());
    }

    #[test]
    fn test_describe_names_sensors() {
        let mut percept = MonsterPercept::default();
        percept.set(AbsoluteDir::Behind, Passage::Blocked);
        assert_eq!(percept.describe(), "top=0 left=0 front=0 right=0 down=0 behind=-1");
    }

    #[test]
    fn test_monster_supports_only_move_and_idle() {
        assert!(MonsterPercept::supports(ActionTag::Move));
        assert!(MonsterPercept::supports(ActionTag::Idle));
        assert!(!MonsterPercept::supports(ActionTag::Destroy));
        assert!(!MonsterPercept::supports(ActionTag::Rotate));
        assert!(RobotPercept::supports(ActionTag::RememberVoid));
    }
}
