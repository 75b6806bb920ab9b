//! ECS Systems
//!
//! Sensing, deciding and acting, plus the per-tick systems that drive them.

pub mod agent;
pub mod decision;
pub mod execute;
pub mod perception;
pub mod turns;

pub use agent::{Agent, MonsterBody, RobotBody};
pub use decision::{decide, Decision, DecisionPolicy, MemoryConsult};
pub use execute::{execute_monster, execute_move, execute_robot, Executed, Outcome};
pub use perception::{build_occupancy_index, sense_monster, sense_robot, WorldView};
pub use turns::{reap_destroyed, record_operations, run_monster_turns, run_robot_turns, Halt, TickClock};
