//! scenegen: constraint-driven procedural scene generation for embodied-AI
//! training environments.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! scenegen sub-crates. For most users, adding `scenegen` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use scenegen::prelude::*;
//!
//! let config = ScenarioConfig::from_json_str(
//!     r#"{
//!         "room_dimensions": {"x": 10, "y": 3, "z": 10},
//!         "goal": {"category": "retrieval", "target": {}},
//!         "check_valid_path": true
//!     }"#,
//! )
//! .unwrap();
//! let generator = SceneGenerator::with_defaults(config).unwrap();
//! let scene = generator.generate(7).unwrap();
//! assert_eq!(scene.goal.as_ref().unwrap().targets.len(), 1);
//! assert_eq!(scene.format_version, FORMAT_VERSION);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `scenegen-core` | ids, steps, labels, vectors, randomizable values, errors |
//! | [`space`] | `scenegen-space` | room grid, bounds, footprints, regions, reachability |
//! | [`engine`] | `scenegen-engine` | configuration, planner, scheduler, validator, generator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and the error taxonomy (`scenegen-core`).
pub use scenegen_core as types;

/// Room geometry and spatial queries (`scenegen-space`).
///
/// [`space::SpatialIndex`] answers overlap and free-cell queries;
/// [`space::NavGrid`] answers reachability.
pub use scenegen_space as space;

/// Scene generation (`scenegen-engine`).
///
/// [`engine::SceneGenerator`] for single scenes,
/// [`engine::generate_batch`] for many.
pub use scenegen_engine as engine;

/// Common imports for typical scenegen usage.
///
/// ```rust
/// use scenegen::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use scenegen_core::{EventId, Label, ObjectId, RegionId, Step, Vec3};

    // Errors
    pub use scenegen_core::{AttemptFailure, FailureKind, GenerationError, Invariant};

    // Space
    pub use scenegen_space::{Cell, RegionKind, ToolKind};

    // Configuration
    pub use scenegen_engine::{ConfigError, GenerationOptions, GoalCategory, PathCheck, ScenarioConfig};

    // Generation
    pub use scenegen_engine::{generate_batch, GenerationReport, SceneGenerator};

    // Output
    pub use scenegen_engine::{
        Goal, ObjectInstance, ObjectKind, Scene, ScheduledEvent, FORMAT_VERSION,
    };
}
