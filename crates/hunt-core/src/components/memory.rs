//! Experience Memory
//!
//! A robot's private, bounded FIFO log of what it sensed, what it did and
//! how that turned out. Memory is advisory: it can break ties inside a
//! matched rule but never overrides one.

use bevy_ecs::prelude::*;
use std::collections::VecDeque;

use crate::rules::{Percept, ResolvedAction};
use crate::systems::execute::Outcome;

/// One executed action
#[derive(Debug, Clone, PartialEq)]
pub struct Experience<P: Percept> {
    pub tick: u64,
    pub percept: P,
    pub rule: u32,
    pub action: ResolvedAction<P::Direction>,
    pub outcome: Outcome,
}

/// Bounded experience log. Oldest records are evicted first.
#[derive(Component, Debug, Clone)]
pub struct ExperienceMemory<P: Percept> {
    records: VecDeque<Experience<P>>,
    capacity: usize,
}

impl<P: Percept> ExperienceMemory<P> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a record, returning the evicted one when full
    pub fn push(&mut self, experience: Experience<P>) -> Option<Experience<P>> {
        let evicted = if self.records.len() >= self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(experience);
        evicted
    }

    /// Most recent productive action taken under an identical percept
    pub fn suggest(&self, percept: &P) -> Option<ResolvedAction<P::Direction>> {
        self.records
            .iter()
            .rev()
            .find(|e| e.percept == *percept && e.outcome.is_productive())
            .map(|e| e.action)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Experience<P>> {
        self.records.iter()
    }

    pub fn newest(&self) -> Option<&Experience<P>> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
