//! Robot Hunt Simulation
//!
//! Runs robots and monsters on a 3D grid from the configured rule tables
//! and writes per-agent logs, snapshots and final statistics.

use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;

use hunt_core::rules::{Percept, RuleTable};
use hunt_core::{Config, ControlSignal, SimError, Simulation};

/// Command line arguments; every option overrides tuning.toml
#[derive(Parser, Debug)]
#[command(name = "robot_hunt")]
#[command(about = "Rule-table robots hunting monsters on a 3D grid")]
struct Args {
    /// Tuning file (defaults to ./tuning.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Grid edge length, boundary shell included
    #[arg(long)]
    size: Option<i32>,

    #[arg(long)]
    robots: Option<usize>,

    #[arg(long)]
    monsters: Option<usize>,

    /// Monsters get a turn every K ticks
    #[arg(long)]
    monster_period: Option<u32>,

    /// Chance a monster acts on its turn
    #[arg(long)]
    monster_probability: Option<f64>,

    /// Interval between world snapshots (in ticks)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Robot rule table CSV
    #[arg(long)]
    robot_rules: Option<PathBuf>,

    /// Monster rule table CSV
    #[arg(long)]
    monster_rules: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Let memory break ties inside ordinary rules
    #[arg(long)]
    memory_tie_break: bool,

    /// Keep running after one side is extinct
    #[arg(long)]
    keep_going: bool,

    /// Skip all file output
    #[arg(long)]
    no_logs: bool,

    /// Read control commands from stdin: p(ause) r(esume) s(tep) x (reset) q(uit)
    #[arg(long)]
    interactive: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(ticks) = self.ticks {
            config.simulation.ticks = ticks;
        }
        if let Some(size) = self.size {
            config.world.size = size;
        }
        if let Some(robots) = self.robots {
            config.agents.robots = robots;
        }
        if let Some(monsters) = self.monsters {
            config.agents.monsters = monsters;
        }
        if let Some(period) = self.monster_period {
            config.behavior.monster_period = period;
        }
        if let Some(probability) = self.monster_probability {
            config.behavior.monster_probability = probability;
        }
        if let Some(interval) = self.snapshot_interval {
            config.simulation.snapshot_interval = interval;
        }
        if let Some(path) = &self.robot_rules {
            config.rules.robot = Some(path.clone());
        }
        if let Some(path) = &self.monster_rules {
            config.rules.monster = Some(path.clone());
        }
        if let Some(dir) = &self.output {
            config.output.dir = dir.clone();
        }
        if self.memory_tie_break {
            config.behavior.memory_tie_break = true;
        }
        if self.keep_going {
            config.simulation.stop_when_extinct = false;
        }
        if self.no_logs {
            config.output.write_logs = false;
        }
    }
}

fn print_table_summary<P: Percept>(name: &str, table: &RuleTable<P>) {
    let special = table.rules().iter().filter(|r| r.pattern.precedence().is_special()).count();
    println!(
        "  {} rules: {} ({} special, {} ordinary)",
        name,
        table.len(),
        special,
        table.len() - special
    );
}

fn spawn_stdin_control() -> mpsc::Receiver<ControlSignal> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match ControlSignal::parse(&line) {
                Some(signal) => {
                    if tx.send(signal).is_err() {
                        break;
                    }
                }
                None => eprintln!("unknown command `{}` (p, r, s, x, q)", line.trim()),
            }
        }
    });
    rx
}

fn run(args: Args) -> Result<(), SimError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    args.apply(&mut config);

    println!("Robot Hunt Simulation");
    println!("=====================");
    println!("Seed: {}", config.simulation.seed);
    println!("Ticks: {}", config.simulation.ticks);
    println!("Grid: {}^3", config.world.size);
    println!(
        "Monster cadence: every {} ticks, p = {}",
        config.behavior.monster_period, config.behavior.monster_probability
    );
    println!();

    let mut sim = Simulation::new(config)?;

    println!("Rule tables:");
    print_table_summary("robot", &sim.rules().robot);
    print_table_summary("monster", &sim.rules().monster);
    let census = sim.census();
    println!("Spawned {}", census);
    for (id, position) in sim.positions() {
        println!("  {} at {}", id, position);
    }
    match sim.output_dir() {
        Some(dir) => println!("Output: {}", dir.display()),
        None => println!("Output: disabled"),
    }
    println!();

    let control = args.interactive.then(spawn_stdin_control);
    if control.is_some() {
        println!("Interactive: p = pause, r = resume, s = step, x = reset, q = quit");
    }
    println!("Starting simulation...");
    println!();

    let stats = sim.run_with(control.as_ref(), |report| {
        println!(
            "[Tick {:>4}] robots: {} monsters: {}",
            report.tick, report.robots, report.monsters
        );
    })?;

    println!();
    println!("Simulation complete ({}) after {} ticks", stats.stop_reason, stats.total_ticks);
    println!(
        "  Robots: {} alive, {} destroyed",
        stats.robots_alive, stats.robots_destroyed
    );
    println!(
        "  Monsters: {} alive, {} destroyed",
        stats.monsters_alive, stats.monsters_destroyed
    );
    for robot in &stats.robots {
        println!(
            "  {}: {} operations, memory recalled {:.1}%, rule-driven {:.1}%",
            robot.agent_id, robot.operations, robot.memory_recalled_pct, robot.rule_driven_pct
        );
    }
    for (id, position) in sim.positions() {
        println!("  {} at {}", id, position);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
