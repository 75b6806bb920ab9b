//! Operation Logger
//!
//! Append-only JSONL execution logs, one file per agent.

use bevy_ecs::prelude::*;
use hunt_events::OperationRecord;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Resource writing each agent's records to `<dir>/<agent_id>.jsonl`
#[derive(Resource)]
pub struct OperationLog {
    dir: Option<PathBuf>,
    writers: BTreeMap<String, BufWriter<File>>,
    record_count: u64,
}

impl OperationLog {
    /// Create a logger writing into `dir`, creating it if needed
    pub fn new(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: Some(dir.as_ref().to_path_buf()),
            writers: BTreeMap::new(),
            record_count: 0,
        })
    }

    /// Create a logger that discards records (for testing)
    pub fn null() -> Self {
        Self {
            dir: None,
            writers: BTreeMap::new(),
            record_count: 0,
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Get the number of records logged
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    fn writer(&mut self, agent_id: &str) -> std::io::Result<Option<&mut BufWriter<File>>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        if !self.writers.contains_key(agent_id) {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(dir.join(format!("{}.jsonl", agent_id)))?;
            self.writers.insert(agent_id.to_string(), BufWriter::new(file));
        }
        Ok(self.writers.get_mut(agent_id))
    }

    /// Append a record to its agent's file
    pub fn log(&mut self, record: &OperationRecord) -> std::io::Result<()> {
        self.record_count += 1;
        if let Some(writer) = self.writer(&record.agent_id)? {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Log multiple records
    pub fn log_batch(&mut self, records: &[OperationRecord]) -> std::io::Result<()> {
        for record in records {
            self.log(record)?;
        }
        Ok(())
    }

    /// Flush every open file to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for OperationLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to flush operation log: {}", e);
        }
    }
}
