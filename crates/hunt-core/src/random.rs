//! Random Source
//!
//! Every random draw in the simulation goes through [`RandomSource`], so a
//! run can use a seeded `SmallRng` in production and a scripted sequence in
//! tests.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of the draws the decision engine and world generator need
pub trait RandomSource {
    /// Uniform value in [0, 1)
    fn unit(&mut self) -> f64;

    /// Uniform index in [0, len); `len` must be non-zero
    fn index(&mut self, len: usize) -> usize;

    /// Index chosen with probability proportional to its weight.
    /// Falls back to a uniform pick when the weights sum to zero.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return self.index(weights.len());
        }

        let roll = self.unit() * total;
        let mut cumulative = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            cumulative += w;
            if roll < cumulative {
                return i;
            }
        }
        weights.len() - 1
    }
}

impl RandomSource for SmallRng {
    fn unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Replays fixed draws in order; used to pin down random branches in tests.
/// Once a queue runs dry it keeps returning the first option.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    units: VecDeque<f64>,
    indices: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(mut self, units: impl IntoIterator<Item = f64>) -> Self {
        self.units.extend(units);
        self
    }

    pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(indices);
        self
    }

    /// Draws not yet consumed
    pub fn remaining(&self) -> usize {
        self.units.len() + self.indices.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(0.0)
    }

    fn index(&mut self, len: usize) -> usize {
        self.indices.pop_front().map(|i| i % len.max(1)).unwrap_or(0)
    }
}

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub Box<dyn RandomSource + Send + Sync>);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(Box::new(SmallRng::seed_from_u64(seed)))
    }

    pub fn scripted(script: ScriptedRandom) -> Self {
        Self(Box::new(script))
    }

    pub fn source(&mut self) -> &mut dyn RandomSource {
        self.0.as_mut()
    }
}
