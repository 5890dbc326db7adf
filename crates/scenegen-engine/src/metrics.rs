//! Per-scene generation metrics.
//!
//! [`GenerationReport`] records what one call to
//! [`SceneGenerator::generate_with_report`](crate::generator::SceneGenerator::generate_with_report)
//! did: how many attempts ran, why each discarded attempt failed, and how
//! much rejection sampling the planner needed.

use scenegen_core::{AttemptFailure, FailureKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters collected while generating one scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    /// Seed the caller asked for.
    pub seed: u64,
    /// Attempts started, including the successful one.
    pub attempts: u32,
    /// Discarded attempts per failure kind.
    pub discarded: BTreeMap<FailureKind, u32>,
    /// One record per discarded attempt, in attempt order.
    pub failures: Vec<AttemptFailure>,
    /// Rejection-sampling candidates drawn across all planned attempts.
    pub placement_candidates: u64,
    /// Wall-clock time for the whole call, in microseconds.
    pub total_us: u64,
}

impl GenerationReport {
    /// Empty report for `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Record a discarded attempt.
    pub fn record(&mut self, failure: AttemptFailure) {
        *self.discarded.entry(failure.kind).or_insert(0) += 1;
        self.failures.push(failure);
    }

    /// Total discarded attempts.
    pub fn discarded_total(&self) -> u32 {
        self.discarded.values().sum()
    }
}
