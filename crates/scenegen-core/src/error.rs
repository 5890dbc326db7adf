//! Error taxonomy for scene generation.
//!
//! Errors split into two families. Recoverable failures
//! ([`PlacementExhausted`](GenerationError::PlacementExhausted),
//! [`PathConstraintViolation`](GenerationError::PathConstraintViolation),
//! [`InvariantViolation`](GenerationError::InvariantViolation)) discard the
//! current attempt and retry with a fresh seed. Everything else is a
//! property of the configuration itself and surfaces immediately.

use crate::id::{EventId, Label, ObjectId, RegionId};
use crate::value::ValueError;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while generating a scene.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The scenario configuration is malformed or self-contradictory.
    #[error("configuration error at `{path}`: {reason}")]
    Configuration {
        /// Dotted path of the offending configuration entry.
        path: String,
        /// Human-readable description.
        reason: String,
    },
    /// Rejection sampling ran out of tries.
    #[error("could not place {what} after {tries} tries")]
    PlacementExhausted {
        /// What was being placed or sampled.
        what: String,
        /// Number of candidates drawn.
        tries: u32,
    },
    /// Label references form a cycle.
    #[error("cyclic label dependency: {}", cycle.join(" -> "))]
    CyclicLabelDependency {
        /// Labels along the cycle; the first label is repeated at the end.
        cycle: Vec<String>,
    },
    /// `activate_after` references form a cycle.
    #[error("cyclic event dependency: {}", cycle.join(" -> "))]
    CyclicEventDependency {
        /// Event descriptions along the cycle.
        cycle: Vec<String>,
    },
    /// A reachability requirement failed on the final scene state.
    #[error("path constraint violated for {target} ({mode}): {reason}")]
    PathConstraintViolation {
        /// The object whose reachability was checked.
        target: ObjectId,
        /// The validation mode in force.
        mode: String,
        /// Which part of the check failed.
        reason: String,
    },
    /// Final global validation of the assembled scene failed.
    #[error("scene invariant violated: {0}")]
    InvariantViolation(Invariant),
    /// Every attempt failed.
    #[error("scene generation failed after {attempts} attempts; last failure: {last}")]
    SceneGenerationFailed {
        /// Attempts made.
        attempts: u32,
        /// The failure that ended the final attempt.
        last: Box<GenerationError>,
        /// One record per discarded attempt.
        failures: Vec<AttemptFailure>,
    },
}

impl GenerationError {
    /// Build a [`Configuration`](Self::Configuration) error.
    pub fn config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying with a fresh seed may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PlacementExhausted { .. }
                | Self::PathConstraintViolation { .. }
                | Self::InvariantViolation(_)
        )
    }

    /// Coarse classification used by attempt diagnostics.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration { .. } => FailureKind::Configuration,
            Self::PlacementExhausted { .. } => FailureKind::PlacementExhausted,
            Self::CyclicLabelDependency { .. } => FailureKind::CyclicLabelDependency,
            Self::CyclicEventDependency { .. } => FailureKind::CyclicEventDependency,
            Self::PathConstraintViolation { .. } => FailureKind::PathConstraintViolation,
            Self::InvariantViolation(_) => FailureKind::InvariantViolation,
            Self::SceneGenerationFailed { .. } => FailureKind::SceneGenerationFailed,
        }
    }
}

impl From<ValueError> for GenerationError {
    fn from(e: ValueError) -> Self {
        Self::config("value", e.to_string())
    }
}

impl From<Invariant> for GenerationError {
    fn from(i: Invariant) -> Self {
        Self::InvariantViolation(i)
    }
}

/// Discriminant of [`GenerationError`], for counting and reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`GenerationError::Configuration`].
    Configuration,
    /// See [`GenerationError::PlacementExhausted`].
    PlacementExhausted,
    /// See [`GenerationError::CyclicLabelDependency`].
    CyclicLabelDependency,
    /// See [`GenerationError::CyclicEventDependency`].
    CyclicEventDependency,
    /// See [`GenerationError::PathConstraintViolation`].
    PathConstraintViolation,
    /// See [`GenerationError::InvariantViolation`].
    InvariantViolation,
    /// See [`GenerationError::SceneGenerationFailed`].
    SceneGenerationFailed,
}

/// Record of one discarded generation attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttemptFailure {
    /// Zero-based attempt index.
    pub attempt: u32,
    /// Seed the attempt ran with.
    pub seed: u64,
    /// Failure classification.
    pub kind: FailureKind,
    /// Rendered error message.
    pub message: String,
}

/// Global scene invariants checked by the assembler.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Invariant {
    /// An object's footprint extends past the room walls.
    #[error("{object} lies outside the room")]
    ObjectOutOfBounds {
        /// Offending object.
        object: ObjectId,
    },
    /// A floor-standing object overlaps lava or a hole.
    #[error("{object} overlaps hazard {region}")]
    ObjectOverHazard {
        /// Offending object.
        object: ObjectId,
        /// Hazard region.
        region: RegionId,
    },
    /// Two floor objects occupy the same space.
    #[error("{a} overlaps {b}")]
    ObjectOverlap {
        /// First object.
        a: ObjectId,
        /// Second object.
        b: ObjectId,
    },
    /// Two mutually exclusive regions share a cell.
    #[error("{a} conflicts with {b}")]
    RegionConflict {
        /// First region.
        a: RegionId,
        /// Second region.
        b: RegionId,
    },
    /// A label was declared but never bound.
    #[error("label `{label}` never resolved")]
    UnresolvedLabel {
        /// The dangling label.
        label: Label,
    },
    /// The goal has the wrong number of targets.
    #[error("{category} goal expects {expected} targets, found {found}")]
    GoalArity {
        /// Goal category.
        category: String,
        /// Expected count, rendered (`"1"`, `">= 1"`).
        expected: String,
        /// Actual count.
        found: usize,
    },
    /// Forced-choice groups ended with equal counts.
    #[error("forced-choice groups tie at {count}")]
    ForcedChoiceTie {
        /// The shared count.
        count: usize,
    },
    /// Forced-choice goal targets differ from the larger group.
    #[error("forced-choice targets are not the larger group of {expected}")]
    ForcedChoiceTargets {
        /// Size of the larger group.
        expected: usize,
    },
    /// An event starts before one of its dependencies completes.
    #[error("{event} starts before {dependency} completes")]
    EventOrder {
        /// Dependent event.
        event: EventId,
        /// Dependency.
        dependency: EventId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(GenerationError::PlacementExhausted {
            what: "tool".into(),
            tries: 50
        }
        .is_recoverable());
        assert!(GenerationError::InvariantViolation(Invariant::ForcedChoiceTie { count: 2 })
            .is_recoverable());
        assert!(!GenerationError::config("goal", "bad").is_recoverable());
        assert!(!GenerationError::CyclicLabelDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()]
        }
        .is_recoverable());
    }

    #[test]
    fn cycle_renders_as_arrow_chain() {
        let e = GenerationError::CyclicEventDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(e.to_string(), "cyclic event dependency: a -> b -> a");
    }

    #[test]
    fn value_errors_become_configuration_errors() {
        let e: GenerationError = ValueError::EmptyChoice.into();
        assert_eq!(e.kind(), FailureKind::Configuration);
    }
}
