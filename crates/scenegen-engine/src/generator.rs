//! Scene generator: the attempt loop around plan, schedule, validate and
//! assemble.
//!
//! Each attempt runs on its own derived seed, so a discarded attempt
//! leaves nothing behind and a given `(config, seed)` pair always walks
//! the same sequence of attempts. Recoverable failures are recorded and
//! retried; configuration errors and dependency cycles surface at once.

use crate::assemble::assemble;
use crate::config::{GenerationOptions, ScenarioConfig};
use crate::metrics::GenerationReport;
use crate::path::PathValidator;
use crate::planner::plan;
use crate::scene::Scene;
use crate::schedule::schedule;
use scenegen_core::{AttemptFailure, GenerationError};
use std::time::Instant;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed for attempt `attempt` of a scene requested with `seed`.
///
/// A SplitMix64 finalizer over the seed offset by the attempt index.
pub fn mix(seed: u64, attempt: u32) -> u64 {
    let mut z = seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(u64::from(attempt) + 1));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generates scenes for one validated scenario.
#[derive(Clone, Debug)]
pub struct SceneGenerator {
    config: ScenarioConfig,
    options: GenerationOptions,
}

impl SceneGenerator {
    /// Validate `config` and `options` and build a generator.
    ///
    /// # Errors
    ///
    /// [`GenerationError::Configuration`] when either fails validation.
    pub fn new(config: ScenarioConfig, options: GenerationOptions) -> Result<Self, GenerationError> {
        config.validate()?;
        options.validate()?;
        Ok(Self { config, options })
    }

    /// Generator with default options.
    ///
    /// # Errors
    ///
    /// See [`SceneGenerator::new`].
    pub fn with_defaults(config: ScenarioConfig) -> Result<Self, GenerationError> {
        Self::new(config, GenerationOptions::default())
    }

    /// The scenario.
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// The engine options.
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate one scene.
    ///
    /// # Errors
    ///
    /// A fatal [`GenerationError`] from the first attempt that hit one, or
    /// [`GenerationError::SceneGenerationFailed`] once every attempt was
    /// discarded.
    pub fn generate(&self, seed: u64) -> Result<Scene, GenerationError> {
        self.generate_with_report(seed).map(|(scene, _)| scene)
    }

    /// Generate one scene and report what it took.
    ///
    /// # Errors
    ///
    /// See [`SceneGenerator::generate`].
    pub fn generate_with_report(
        &self,
        seed: u64,
    ) -> Result<(Scene, GenerationReport), GenerationError> {
        let started = Instant::now();
        let mut report = GenerationReport::new(seed);
        let mut last: Option<GenerationError> = None;

        for attempt in 0..self.options.max_attempts {
            let attempt_seed = mix(seed, attempt);
            report.attempts = attempt + 1;
            match self.attempt(seed, attempt, attempt_seed, &mut report) {
                Ok(scene) => {
                    report.total_us = started.elapsed().as_micros() as u64;
                    tracing::info!(
                        seed,
                        attempts = report.attempts,
                        objects = scene.objects.len(),
                        events = scene.events.len(),
                        "scene generated"
                    );
                    return Ok((scene, report));
                }
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(seed, attempt, attempt_seed, error = %e, "attempt discarded");
                    report.record(AttemptFailure {
                        attempt,
                        seed: attempt_seed,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                    last = Some(e);
                }
                Err(e) => {
                    tracing::warn!(seed, attempt, error = %e, "scene generation aborted");
                    return Err(e);
                }
            }
        }

        let attempts = report.attempts;
        tracing::warn!(seed, attempts, "scene generation failed");
        Err(GenerationError::SceneGenerationFailed {
            attempts,
            last: Box::new(last.unwrap_or_else(|| {
                GenerationError::config("options.max_attempts", "no attempt ran")
            })),
            failures: report.failures,
        })
    }

    fn attempt(
        &self,
        seed: u64,
        attempt: u32,
        attempt_seed: u64,
        report: &mut GenerationReport,
    ) -> Result<Scene, GenerationError> {
        let plan = plan(&self.config, &self.options, attempt_seed)?;
        report.placement_candidates += plan.candidates_drawn;
        let timeline = schedule(&plan.events, &plan.registry, &self.config.freeze_while_moving)?;
        PathValidator::new(&plan.index, &plan.objects, &plan.room.performer)
            .with_events(&timeline.events)
            .validate(&plan.path_checks)?;
        assemble(&self.config, plan, timeline, seed, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegen_core::FailureKind;

    fn generator(json: &str) -> SceneGenerator {
        SceneGenerator::with_defaults(ScenarioConfig::from_json_str(json).unwrap()).unwrap()
    }

    #[test]
    fn attempt_seeds_differ() {
        let seeds: Vec<u64> = (0..8).map(|i| mix(42, i)).collect();
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(mix(42, 3), mix(42, 3));
        assert_ne!(mix(42, 0), mix(43, 0));
    }

    #[test]
    fn empty_scenario_generates_first_try() {
        let g = generator("{}");
        let (scene, report) = g.generate_with_report(1).unwrap();
        assert_eq!(report.attempts, 1);
        assert_eq!(report.discarded_total(), 0);
        assert_eq!(scene.attempt, 0);
        assert_eq!(scene.seed, 1);
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn same_seed_same_scene() {
        let g = generator(
            r#"{
                "room_dimensions": {"x": 10, "y": 3, "z": 10},
                "specific_interactable_objects": [{"num": 3}],
                "keyword_objects": [{"keyword": "obstacles", "num": 2}]
            }"#,
        );
        let a = g.generate(99).unwrap().to_json().unwrap();
        let b = g.generate(99).unwrap().to_json().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn impossible_placement_exhausts_attempts() {
        let g = SceneGenerator::new(
            ScenarioConfig::from_json_str(
                r#"{
                    "room_dimensions": {"x": 2, "y": 3, "z": 2},
                    "structural_walls": [{"num": 40}]
                }"#,
            )
            .unwrap(),
            GenerationOptions {
                max_attempts: 3,
                placement_tries: 5,
                ..GenerationOptions::default()
            },
        )
        .unwrap();
        let err = g.generate(5).unwrap_err();
        let GenerationError::SceneGenerationFailed {
            attempts, failures, ..
        } = err
        else {
            panic!("expected exhaustion, got {err:?}");
        };
        assert_eq!(attempts, 3);
        assert_eq!(failures.len(), 3);
        assert!(failures
            .iter()
            .all(|f| f.kind == FailureKind::PlacementExhausted));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let err = SceneGenerator::new(
            ScenarioConfig::default(),
            GenerationOptions {
                max_attempts: 0,
                ..GenerationOptions::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
    }
}
