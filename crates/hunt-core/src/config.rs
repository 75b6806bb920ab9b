//! Configuration System
//!
//! Loads run parameters from tuning.toml. Every section and field is
//! optional; missing values fall back to the defaults below, and the CLI
//! may override them afterwards.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::components::world::Grid;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub world: WorldConfig,
    pub agents: AgentConfig,
    pub behavior: BehaviorConfig,
    pub simulation: SimulationConfig,
    pub rules: RulesConfig,
    pub output: OutputConfig,
}

/// Grid generation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length N of the N×N×N grid, shell included (3 to 256)
    pub size: i32,
    /// Relative weight of FREE interior cells
    pub free_fraction: f64,
    /// Relative weight of EMPTY interior cells
    pub empty_fraction: f64,
}

/// Agent populations and optional fixed start cells
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub robots: usize,
    pub monsters: usize,
    /// Fixed robot start cells; robots beyond the list are placed randomly
    pub robot_positions: Vec<[i32; 3]>,
    pub monster_positions: Vec<[i32; 3]>,
}

/// Cadence and memory parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub robot_period: u32,
    /// K: monsters get a turn every K ticks
    pub monster_period: u32,
    /// p: chance a monster acts when its turn comes
    pub monster_probability: f64,
    pub memory_capacity: usize,
    pub memory_tie_break: bool,
}

/// Run length and output cadence
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub ticks: u64,
    pub seed: u64,
    pub snapshot_interval: u64,
    pub stop_when_extinct: bool,
}

/// Rule table paths; absent means the embedded tables
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub robot: Option<PathBuf>,
    pub monster: Option<PathBuf>,
}

/// Output location
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub write_logs: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 6,
            free_fraction: 0.7,
            empty_fraction: 0.3,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            robots: 1,
            monsters: 1,
            robot_positions: Vec::new(),
            monster_positions: Vec::new(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            robot_period: 1,
            monster_period: 3,
            monster_probability: 0.5,
            memory_capacity: 1000,
            memory_tie_break: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 100,
            seed: 42,
            snapshot_interval: 10,
            stop_when_extinct: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            write_logs: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        if !Path::new(DEFAULT_TUNING_PATH).exists() {
            return Self::default();
        }
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("could not load {}: {}. Using defaults.", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }

    /// Check value ranges. Placement and population feasibility are
    /// checked when the world is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn out_of_range(field: &'static str, value: impl ToString) -> ConfigError {
            ConfigError::OutOfRange {
                field,
                value: value.to_string(),
            }
        }
        let unit = |v: f64| (0.0..=1.0).contains(&v);

        if !(3..=Grid::MAX_SIZE).contains(&self.world.size) {
            return Err(out_of_range("world.size", self.world.size));
        }
        if !unit(self.world.free_fraction) {
            return Err(out_of_range("world.free_fraction", self.world.free_fraction));
        }
        if !unit(self.world.empty_fraction) {
            return Err(out_of_range("world.empty_fraction", self.world.empty_fraction));
        }
        if self.behavior.robot_period == 0 {
            return Err(out_of_range("behavior.robot_period", 0));
        }
        if self.behavior.monster_period == 0 {
            return Err(out_of_range("behavior.monster_period", 0));
        }
        if !unit(self.behavior.monster_probability) {
            return Err(out_of_range(
                "behavior.monster_probability",
                self.behavior.monster_probability,
            ));
        }
        if self.behavior.memory_capacity == 0 {
            return Err(out_of_range("behavior.memory_capacity", 0));
        }
        if self.simulation.snapshot_interval == 0 {
            return Err(out_of_range("simulation.snapshot_interval", 0));
        }
        Ok(())
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}
