//! Operation records produced during a tick and the logger that persists them.

pub mod logger;

use bevy_ecs::prelude::*;
use hunt_events::OperationRecord;

pub use logger::OperationLog;

/// Records produced by the current tick
#[derive(Resource, Debug, Default)]
pub struct TickRecords {
    pub records: Vec<OperationRecord>,
}

impl TickRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OperationRecord) {
        self.records.push(record);
    }

    pub fn drain(&mut self) -> Vec<OperationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
