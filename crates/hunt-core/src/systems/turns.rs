//! Turn Systems
//!
//! Per-tick systems: robots act, then monsters, each in ascending id
//! order. Destroyed agents are despawned at the end of the tick and the
//! tick's operation records are flushed last.

use bevy_ecs::prelude::*;
use hunt_events::{AgentKind, OperationRecord};
use tracing::{debug, error, info, warn};

use super::agent::{Agent, MonsterBody, RobotBody};
use super::decision::DecisionPolicy;
use super::execute::Executed;
use super::perception::WorldView;
use crate::components::agent::{AgentId, Cadence, Destroyed, Gate, Monster, Robot, VoidFlag};
use crate::components::memory::{Experience, ExperienceMemory};
use crate::components::motion::Heading;
use crate::components::world::{Grid, Occupancy, Position};
use crate::error::UnmatchedPerceptError;
use crate::events::{OperationLog, TickRecords};
use crate::output::StatsCollector;
use crate::random::SimRng;
use crate::rules::{Percept, RobotPercept, RuleBook};

/// Current tick, counted from 1 once the first tick runs
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct TickClock {
    pub tick: u64,
}

/// Set when a fatal error stops the run mid-tick
#[derive(Resource, Debug, Default)]
pub struct Halt(pub Option<UnmatchedPerceptError>);

impl Halt {
    pub fn is_halted(&self) -> bool {
        self.0.is_some()
    }
}

/// System running every robot's sense → decide → act cycle
#[allow(clippy::too_many_arguments)]
pub fn run_robot_turns(
    clock: Res<TickClock>,
    rules: Res<RuleBook>,
    policy: Res<DecisionPolicy>,
    mut grid: ResMut<Grid>,
    mut occupancy: ResMut<Occupancy>,
    mut rng: ResMut<SimRng>,
    mut records: ResMut<TickRecords>,
    mut halt: ResMut<Halt>,
    mut commands: Commands,
    mut robots: Query<
        (
            Entity,
            &AgentId,
            &mut Position,
            &mut Heading,
            &mut VoidFlag,
            &mut Cadence,
            &mut ExperienceMemory<RobotPercept>,
        ),
        (With<Robot>, Without<Destroyed>),
    >,
) {
    if halt.is_halted() {
        return;
    }
    let tick = clock.tick;

    let mut order: Vec<(AgentId, Entity)> = robots.iter().map(|(entity, id, ..)| (*id, entity)).collect();
    order.sort();

    for (id, entity) in order {
        let Ok((_, _, mut position, mut heading, mut void, mut cadence, mut memory)) = robots.get_mut(entity) else {
            continue;
        };

        let mut record = OperationRecord::new(tick, id.to_string(), AgentKind::Robot, position.0.to_array());
        record.orientation = Some(heading.forward.to_array());
        record.new_orientation = record.orientation;

        let gate = cadence.tick(rng.source());
        record.gate = gate.into();
        if gate != Gate::Act {
            records.push(record);
            continue;
        }

        let mut body = RobotBody {
            position: position.0,
            heading: *heading,
            void: void.0,
        };
        let percept = body.sense(&WorldView::new(&grid, &occupancy));
        let decision = match body.decide(&percept, &rules.robot, Some(&*memory), *policy, rng.source()) {
            Ok(decision) => decision,
            Err(e) => {
                error!(agent = %id, tick, "{}", e);
                halt.0 = Some(e);
                return;
            }
        };

        let executed = match body.act(entity, decision.action, &mut grid, &mut occupancy) {
            Ok(executed) => executed,
            Err(e) => {
                warn!(agent = %id, tick, "{}", e);
                Executed::rejected()
            }
        };

        void.0 = body.void;
        position.0 = body.position;
        *heading = body.heading;
        memory.push(Experience {
            tick,
            percept,
            rule: decision.rule,
            action: decision.action,
            outcome: executed.outcome,
        });

        if let Some(monster) = executed.destroyed {
            commands.entity(entity).insert(Destroyed { tick });
            commands.entity(monster).insert(Destroyed { tick });
            memory.clear();
            info!(robot = %id, cell = %body.position, tick, "mutual destruction");
        }

        debug!(
            agent = %id,
            tick,
            rule = decision.rule,
            action = %decision.action,
            outcome = executed.outcome.label(),
            "robot turn"
        );

        record.new_position = body.position.to_array();
        record.new_orientation = Some(body.heading.forward.to_array());
        record.percept = percept.named_readings();
        record.rule = Some(decision.rule);
        record.precedence = Some(decision.precedence.label().to_string());
        record.action = Some(decision.action.to_string());
        record.outcome = Some(executed.outcome.label().to_string());
        record.memory = decision.memory.as_ref().map(|m| m.trace());
        records.push(record);
    }
}

/// System running every monster's turn
#[allow(clippy::too_many_arguments)]
pub fn run_monster_turns(
    clock: Res<TickClock>,
    rules: Res<RuleBook>,
    policy: Res<DecisionPolicy>,
    mut grid: ResMut<Grid>,
    mut occupancy: ResMut<Occupancy>,
    mut rng: ResMut<SimRng>,
    mut records: ResMut<TickRecords>,
    mut halt: ResMut<Halt>,
    mut monsters: Query<(Entity, &AgentId, &mut Position, &mut Cadence), (With<Monster>, Without<Destroyed>)>,
) {
    if halt.is_halted() {
        return;
    }
    let tick = clock.tick;

    let mut order: Vec<(AgentId, Entity)> = monsters.iter().map(|(entity, id, ..)| (*id, entity)).collect();
    order.sort();

    for (id, entity) in order {
        let Ok((_, _, mut position, mut cadence)) = monsters.get_mut(entity) else {
            continue;
        };
        // destroyed earlier this tick
        if occupancy.monster_at(position.0) != Some(entity) {
            continue;
        }

        let mut record = OperationRecord::new(tick, id.to_string(), AgentKind::Monster, position.0.to_array());
        let gate = cadence.tick(rng.source());
        record.gate = gate.into();
        if gate != Gate::Act {
            records.push(record);
            continue;
        }

        let mut body = MonsterBody { position: position.0 };
        let percept = body.sense(&WorldView::new(&grid, &occupancy));
        let decision = match body.decide(&percept, &rules.monster, None, *policy, rng.source()) {
            Ok(decision) => decision,
            Err(e) => {
                error!(agent = %id, tick, "{}", e);
                halt.0 = Some(e);
                return;
            }
        };

        let executed = match body.act(entity, decision.action, &mut grid, &mut occupancy) {
            Ok(executed) => executed,
            Err(e) => {
                warn!(agent = %id, tick, "{}", e);
                Executed::rejected()
            }
        };
        position.0 = body.position;

        debug!(
            agent = %id,
            tick,
            rule = decision.rule,
            action = %decision.action,
            outcome = executed.outcome.label(),
            "monster turn"
        );

        record.new_position = body.position.to_array();
        record.percept = percept.named_readings();
        record.rule = Some(decision.rule);
        record.precedence = Some(decision.precedence.label().to_string());
        record.action = Some(decision.action.to_string());
        record.outcome = Some(executed.outcome.label().to_string());
        records.push(record);
    }
}

/// System despawning agents removed by mutual destruction
pub fn reap_destroyed(
    mut commands: Commands,
    mut stats: ResMut<StatsCollector>,
    destroyed: Query<(Entity, &AgentId, &Position, &Destroyed)>,
) {
    for (entity, id, position, marker) in destroyed.iter() {
        stats.mark_destroyed(&id.to_string(), id.kind, position.0.to_array(), marker.tick);
        commands.entity(entity).despawn();
    }
}

/// System folding the tick's records into the statistics and agent logs
pub fn record_operations(
    mut records: ResMut<TickRecords>,
    mut log: ResMut<OperationLog>,
    mut stats: ResMut<StatsCollector>,
) {
    let batch = records.drain();
    for record in &batch {
        stats.record(record);
    }
    if let Err(e) = log.log_batch(&batch).and_then(|_| log.flush()) {
        warn!("failed to write operation log: {}", e);
    }
}
