//! Statistics Output
//!
//! Collects per-agent tallies from the operation records and writes the
//! final statistics file.

use bevy_ecs::prelude::*;
use hunt_events::{AgentKind, OperationRecord, TurnGate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// File name of the final statistics inside the output directory
pub const STATS_FILE: &str = "final_stats.json";

const TOP_RULES: usize = 5;

/// Running counts for one agent
#[derive(Debug, Clone)]
pub struct AgentTally {
    pub kind: AgentKind,
    pub operations: usize,
    pub acted: usize,
    pub waits: usize,
    pub declined: usize,
    pub moves: usize,
    pub rule_driven: usize,
    pub memory_consulted: usize,
    pub memory_recalled: usize,
    pub memory_applied: usize,
    pub rule_usage: HashMap<u32, usize>,
    pub final_position: [i32; 3],
    pub final_orientation: Option<[i32; 3]>,
    pub destroyed_at: Option<u64>,
}

impl AgentTally {
    fn new(kind: AgentKind, position: [i32; 3]) -> Self {
        Self {
            kind,
            operations: 0,
            acted: 0,
            waits: 0,
            declined: 0,
            moves: 0,
            rule_driven: 0,
            memory_consulted: 0,
            memory_recalled: 0,
            memory_applied: 0,
            rule_usage: HashMap::new(),
            final_position: position,
            final_orientation: None,
            destroyed_at: None,
        }
    }

    /// Most used rules, ties broken by lower index
    pub fn top_rules(&self) -> Vec<RuleUsage> {
        let mut usage: Vec<RuleUsage> = self
            .rule_usage
            .iter()
            .map(|(&rule, &count)| RuleUsage { rule, count })
            .collect();
        usage.sort_by(|a, b| b.count.cmp(&a.count).then(a.rule.cmp(&b.rule)));
        usage.truncate(TOP_RULES);
        usage
    }
}

/// Rule index with its use count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleUsage {
    pub rule: u32,
    pub count: usize,
}

/// Robot section of the final statistics
#[derive(Debug, Clone, Serialize)]
pub struct RobotSummary {
    pub agent_id: String,
    pub operations: usize,
    pub memory_consulted: usize,
    pub memory_consulted_pct: f64,
    /// Decisions where memory held a productive match
    pub memory_recalled: usize,
    pub memory_recalled_pct: f64,
    pub memory_applied: usize,
    pub rule_driven: usize,
    pub rule_driven_pct: f64,
    pub top_rules: Vec<RuleUsage>,
    pub final_position: [i32; 3],
    pub final_orientation: Option<[i32; 3]>,
    pub destroyed_at: Option<u64>,
}

/// Monster section of the final statistics
#[derive(Debug, Clone, Serialize)]
pub struct MonsterSummary {
    pub agent_id: String,
    pub operations: usize,
    pub waits: usize,
    pub declined: usize,
    pub moves: usize,
    pub top_rules: Vec<RuleUsage>,
    pub final_position: [i32; 3],
    pub destroyed_at: Option<u64>,
    pub period: u32,
    pub probability: f64,
}

/// Overall simulation statistics
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStats {
    pub total_ticks: u64,
    pub stop_reason: String,
    pub robots_alive: usize,
    pub robots_destroyed: usize,
    pub monsters_alive: usize,
    pub monsters_destroyed: usize,
    pub robots: Vec<RobotSummary>,
    pub monsters: Vec<MonsterSummary>,
}

impl SimulationStats {
    /// Write statistics as pretty JSON
    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

/// Resource to accumulate statistics during simulation
#[derive(Resource, Default)]
pub struct StatsCollector {
    pub agents: BTreeMap<String, AgentTally>,
    pub total_records: usize,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tally for an agent before its first record
    pub fn register(&mut self, agent_id: &str, kind: AgentKind, position: [i32; 3]) {
        self.agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentTally::new(kind, position));
    }

    /// Fold one operation record into its agent's tally
    pub fn record(&mut self, record: &OperationRecord) {
        self.total_records += 1;
        let tally = self
            .agents
            .entry(record.agent_id.clone())
            .or_insert_with(|| AgentTally::new(record.kind, record.position));

        tally.operations += 1;
        match record.gate {
            TurnGate::Acted => tally.acted += 1,
            TurnGate::Waiting => tally.waits += 1,
            TurnGate::Declined => tally.declined += 1,
        }
        if record.moved() {
            tally.moves += 1;
        }
        if record.is_rule_driven() {
            tally.rule_driven += 1;
        }
        if let Some(memory) = &record.memory {
            if memory.consulted {
                tally.memory_consulted += 1;
            }
            if memory.suggestion.is_some() {
                tally.memory_recalled += 1;
            }
            if memory.applied {
                tally.memory_applied += 1;
            }
        }
        if let Some(rule) = record.rule {
            *tally.rule_usage.entry(rule).or_insert(0) += 1;
        }
        if record.outcome.as_deref() == Some("destroyed") {
            tally.destroyed_at = Some(record.tick);
        }
        tally.final_position = record.new_position;
        if record.new_orientation.is_some() {
            tally.final_orientation = record.new_orientation;
        }
    }

    /// Mark an agent removed by mutual destruction. Agents that never
    /// produced a record still get a tally.
    pub fn mark_destroyed(&mut self, agent_id: &str, kind: AgentKind, position: [i32; 3], tick: u64) {
        let tally = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentTally::new(kind, position));
        tally.final_position = position;
        tally.destroyed_at = Some(tick);
    }

    pub fn tally(&self, agent_id: &str) -> Option<&AgentTally> {
        self.agents.get(agent_id)
    }

    /// Build the final summary. `monster_cadence` is (period, probability).
    pub fn summarize(&self, total_ticks: u64, stop_reason: &str, monster_cadence: (u32, f64)) -> SimulationStats {
        let mut robots = Vec::new();
        let mut monsters = Vec::new();

        for (agent_id, tally) in &self.agents {
            match tally.kind {
                AgentKind::Robot => robots.push(RobotSummary {
                    agent_id: agent_id.clone(),
                    operations: tally.operations,
                    memory_consulted: tally.memory_consulted,
                    memory_consulted_pct: percent(tally.memory_consulted, tally.acted),
                    memory_recalled: tally.memory_recalled,
                    memory_recalled_pct: percent(tally.memory_recalled, tally.acted),
                    memory_applied: tally.memory_applied,
                    rule_driven: tally.rule_driven,
                    rule_driven_pct: percent(tally.rule_driven, tally.acted),
                    top_rules: tally.top_rules(),
                    final_position: tally.final_position,
                    final_orientation: tally.final_orientation,
                    destroyed_at: tally.destroyed_at,
                }),
                AgentKind::Monster => monsters.push(MonsterSummary {
                    agent_id: agent_id.clone(),
                    operations: tally.operations,
                    waits: tally.waits,
                    declined: tally.declined,
                    moves: tally.moves,
                    top_rules: tally.top_rules(),
                    final_position: tally.final_position,
                    destroyed_at: tally.destroyed_at,
                    period: monster_cadence.0,
                    probability: monster_cadence.1,
                }),
            }
        }

        let destroyed = |list: &[Option<u64>]| list.iter().filter(|d| d.is_some()).count();
        let robot_deaths: Vec<Option<u64>> = robots.iter().map(|r| r.destroyed_at).collect();
        let monster_deaths: Vec<Option<u64>> = monsters.iter().map(|m| m.destroyed_at).collect();

        SimulationStats {
            total_ticks,
            stop_reason: stop_reason.to_string(),
            robots_alive: robots.len() - destroyed(&robot_deaths),
            robots_destroyed: destroyed(&robot_deaths),
            monsters_alive: monsters.len() - destroyed(&monster_deaths),
            monsters_destroyed: destroyed(&monster_deaths),
            robots,
            monsters,
        }
    }
}
