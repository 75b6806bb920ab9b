//! Simulation Loop
//!
//! Owns the ECS world and the per-tick schedule, handles snapshots and
//! final statistics, and applies control signals between ticks.

use bevy_ecs::prelude::*;
use hunt_events::WorldSnapshot;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use tracing::{info, warn};

use crate::components::agent::AgentId;
use crate::components::world::{GridPos, Occupancy, Position};
use crate::config::Config;
use crate::error::SimError;
use crate::events::{OperationLog, TickRecords};
use crate::output::{
    generate_snapshot, write_current_state, write_snapshot_to_dir, SimulationStats, SnapshotGenerator,
    StatsCollector, STATS_FILE,
};
use crate::random::SimRng;
use crate::rules::RuleBook;
use crate::setup::{generate_blueprint, get_spawn_summary, spawn_blueprint, Blueprint, SpawnSummary};
use crate::systems::{
    build_occupancy_index, reap_destroyed, record_operations, run_monster_turns, run_robot_turns, DecisionPolicy,
    Halt, TickClock,
};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TickLimit,
    RobotsExtinct,
    MonstersExtinct,
    Stopped,
    Halted,
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::TickLimit => "tick_limit",
            StopReason::RobotsExtinct => "robots_extinct",
            StopReason::MonstersExtinct => "monsters_extinct",
            StopReason::Stopped => "stopped",
            StopReason::Halted => "halted",
        }
    }
}

/// External control, applied only between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Pause,
    Resume,
    /// Run exactly one tick, then stay paused
    Step,
    /// Rebuild the initial world and restart at tick 0
    Reset,
    Stop,
}

impl ControlSignal {
    /// Parse a console command: `p`/`pause`, `r`/`resume`, `s`/`step`,
    /// `x`/`reset`, `q`/`stop`/`quit`
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(ControlSignal::Pause),
            "r" | "resume" => Some(ControlSignal::Resume),
            "s" | "step" => Some(ControlSignal::Step),
            "x" | "reset" => Some(ControlSignal::Reset),
            "q" | "stop" | "quit" => Some(ControlSignal::Stop),
            _ => None,
        }
    }
}

/// Live population after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub robots: usize,
    pub monsters: usize,
}

/// Builds the random source for the initial world and for every reset
type RngSource = Box<dyn Fn() -> SimRng>;

/// A configured run
pub struct Simulation {
    world: World,
    schedule: Schedule,
    config: Config,
    rules: RuleBook,
    blueprint: Blueprint,
    rng_source: RngSource,
    /// Whether the blueprint came from the seeded generator
    generated: bool,
    output_dir: Option<PathBuf>,
}

fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            build_occupancy_index,
            run_robot_turns,
            run_monster_turns,
            reap_destroyed,
            record_operations,
        )
            .chain(),
    );
    schedule
}

fn build_world(
    config: &Config,
    rules: &RuleBook,
    blueprint: &Blueprint,
    rng: SimRng,
    output_dir: Option<&Path>,
) -> Result<World, SimError> {
    let mut world = World::new();
    world.insert_resource(rules.clone());
    world.insert_resource(DecisionPolicy {
        memory_tie_break: config.behavior.memory_tie_break,
    });
    world.insert_resource(TickClock::default());
    world.insert_resource(Halt::default());
    world.insert_resource(rng);
    world.insert_resource(Occupancy::new());
    world.insert_resource(TickRecords::new());
    world.insert_resource(SnapshotGenerator::new(config.simulation.snapshot_interval));
    world.insert_resource(match output_dir {
        Some(dir) => OperationLog::new(dir.join("agents"))?,
        None => OperationLog::null(),
    });

    spawn_blueprint(&mut world, blueprint, &config.behavior);

    let mut stats = StatsCollector::new();
    let mut query = world.query::<(&AgentId, &Position)>();
    for (id, position) in query.iter(&world) {
        stats.register(&id.to_string(), id.kind, position.0.to_array());
    }
    world.insert_resource(stats);

    Ok(world)
}

impl Simulation {
    /// Validate the config, load the rule tables and generate the world
    pub fn new(config: Config) -> Result<Self, SimError> {
        config.validate()?;
        let rules = RuleBook::resolve(config.rules.robot.as_deref(), config.rules.monster.as_deref())?;
        let seed = config.simulation.seed;
        let rng_source: RngSource = Box::new(move || SimRng::seeded(seed));
        let mut rng = rng_source();
        let blueprint = generate_blueprint(&config, rng.source())?;
        Self::assemble(config, rules, blueprint, rng, rng_source, true)
    }

    /// Run over a hand-built world. `rng` is called once now and again on
    /// every reset, so an injected source survives a reset.
    pub fn from_blueprint(
        config: Config,
        rules: RuleBook,
        blueprint: Blueprint,
        rng: impl Fn() -> SimRng + 'static,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let rng_source: RngSource = Box::new(rng);
        let first = rng_source();
        Self::assemble(config, rules, blueprint, first, rng_source, false)
    }

    fn assemble(
        config: Config,
        rules: RuleBook,
        blueprint: Blueprint,
        rng: SimRng,
        rng_source: RngSource,
        generated: bool,
    ) -> Result<Self, SimError> {
        let output_dir = config.output.write_logs.then(|| config.output.dir.clone());
        let world = build_world(&config, &rules, &blueprint, rng, output_dir.as_deref())?;
        Ok(Self {
            world,
            schedule: build_schedule(),
            config,
            rules,
            blueprint,
            rng_source,
            generated,
            output_dir,
        })
    }

    pub fn tick(&self) -> u64 {
        self.world.resource::<TickClock>().tick
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn stats(&self) -> &StatsCollector {
        self.world.resource::<StatsCollector>()
    }

    /// Directory receiving logs, snapshots and statistics; None when file
    /// output is off
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Live agents per kind
    pub fn census(&mut self) -> SpawnSummary {
        get_spawn_summary(&mut self.world)
    }

    /// Live agent positions in id order
    pub fn positions(&mut self) -> Vec<(AgentId, GridPos)> {
        let mut query = self.world.query::<(&AgentId, &Position)>();
        let mut positions: Vec<(AgentId, GridPos)> = query.iter(&self.world).map(|(id, p)| (*id, p.0)).collect();
        positions.sort_by_key(|(id, _)| *id);
        positions
    }

    /// Capture the world, writing it out when file output is on
    pub fn snapshot(&mut self, trigger: &str) -> Result<WorldSnapshot, SimError> {
        let snapshot = generate_snapshot(&mut self.world, trigger);
        if let Some(dir) = &self.output_dir {
            write_snapshot_to_dir(dir, &snapshot)?;
            write_current_state(dir, &snapshot)?;
        }
        Ok(snapshot)
    }

    /// Run one tick. An unmatched percept halts the run and is returned
    /// from this and every later call.
    pub fn step(&mut self) -> Result<TickReport, SimError> {
        if let Some(err) = self.world.resource::<Halt>().0.clone() {
            return Err(err.into());
        }

        self.world.resource_mut::<TickClock>().tick += 1;
        self.schedule.run(&mut self.world);

        if let Some(err) = self.world.resource::<Halt>().0.clone() {
            return Err(err.into());
        }

        let tick = self.tick();
        if self.world.resource::<SnapshotGenerator>().should_snapshot(tick) {
            self.snapshot("scheduled")?;
        }

        let census = self.census();
        Ok(TickReport {
            tick,
            robots: census.robots,
            monsters: census.monsters,
        })
    }

    /// Reason to stop before the next tick, if any
    pub fn pending_stop(&mut self) -> Option<StopReason> {
        if self.config.simulation.stop_when_extinct {
            let census = self.census();
            if census.robots == 0 {
                return Some(StopReason::RobotsExtinct);
            }
            if census.monsters == 0 {
                return Some(StopReason::MonstersExtinct);
            }
        }
        if self.tick() >= self.config.simulation.ticks {
            return Some(StopReason::TickLimit);
        }
        None
    }

    /// Rebuild the initial world and restart at tick 0 with a fresh random
    /// source from the same factory.
    pub fn reset(&mut self) -> Result<(), SimError> {
        let mut rng = (self.rng_source)();
        if self.generated {
            self.blueprint = generate_blueprint(&self.config, rng.source())?;
        }
        self.world = build_world(
            &self.config,
            &self.rules,
            &self.blueprint,
            rng,
            self.output_dir.as_deref(),
        )?;
        self.schedule = build_schedule();
        info!("simulation reset to tick 0");
        Ok(())
    }

    /// Run until a stop condition
    pub fn run(&mut self) -> Result<SimulationStats, SimError> {
        self.run_with(None, |_| {})
    }

    /// Run until a stop condition or a Stop signal
    pub fn run_controlled(&mut self, control: &Receiver<ControlSignal>) -> Result<SimulationStats, SimError> {
        self.run_with(Some(control), |_| {})
    }

    /// Run with an optional control channel, calling `on_tick` after every tick.
    /// While paused the loop blocks on the channel; a closed channel resumes.
    pub fn run_with(
        &mut self,
        control: Option<&Receiver<ControlSignal>>,
        mut on_tick: impl FnMut(&TickReport),
    ) -> Result<SimulationStats, SimError> {
        self.begin()?;
        let mut paused = false;

        loop {
            if let Some(reason) = self.pending_stop() {
                return self.finish(reason);
            }

            let mut step_once = false;
            let mut restarted = false;
            if let Some(rx) = control {
                loop {
                    let waiting = paused && !step_once;
                    let signal = if waiting { rx.recv().ok() } else { rx.try_recv().ok() };
                    let Some(signal) = signal else {
                        if waiting {
                            paused = false;
                        }
                        break;
                    };
                    match signal {
                        ControlSignal::Pause => paused = true,
                        ControlSignal::Resume => paused = false,
                        ControlSignal::Step => {
                            paused = true;
                            step_once = true;
                            break;
                        }
                        ControlSignal::Reset => {
                            self.reset()?;
                            self.begin()?;
                            restarted = true;
                        }
                        ControlSignal::Stop => return self.finish(StopReason::Stopped),
                    }
                }
            }
            if restarted {
                continue;
            }

            match self.step() {
                Ok(report) => on_tick(&report),
                Err(err) => {
                    if let Err(e) = self.finish(StopReason::Halted) {
                        warn!("could not write final output: {}", e);
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Initial snapshot at tick 0
    fn begin(&mut self) -> Result<(), SimError> {
        if self.tick() == 0 {
            self.snapshot("simulation_start")?;
        }
        Ok(())
    }

    /// Write the final snapshot and statistics
    pub fn finish(&mut self, reason: StopReason) -> Result<SimulationStats, SimError> {
        let tick = self.tick();
        let cadence = (self.config.behavior.monster_period, self.config.behavior.monster_probability);
        let stats = self.stats().summarize(tick, reason.label(), cadence);

        if let Some(dir) = self.output_dir.clone() {
            self.snapshot("simulation_end")?;
            stats.write(dir.join(STATS_FILE))?;
        }
        self.world.resource_mut::<OperationLog>().flush()?;

        info!(
            tick,
            reason = reason.label(),
            robots = stats.robots_alive,
            monsters = stats.monsters_alive,
            "simulation finished"
        );
        Ok(stats)
    }
}
