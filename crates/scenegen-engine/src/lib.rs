//! Scene generation engine for scenegen.
//!
//! Turns a declarative [`ScenarioConfig`] into a fully resolved [`Scene`].
//! One generation attempt runs the pipeline
//!
//! ```text
//! planner::plan → schedule::schedule → PathValidator::validate → assemble
//! ```
//!
//! on a seed derived from the caller's seed and the attempt index.
//! [`SceneGenerator`] retries recoverable failures with fresh seeds, and
//! [`generate_batch`] runs many independent scenes on worker threads.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod generator;
pub mod labels;
pub mod metrics;
pub mod path;
pub mod planner;
pub mod sampler;
pub mod scene;
pub mod schedule;

pub use assemble::{assemble, validate};
pub use batch::{generate_batch, scene_seed};
pub use config::{ConfigError, GenerationOptions, GoalCategory, PathCheck, ScenarioConfig};
pub use generator::{mix, SceneGenerator};
pub use labels::LabelRegistry;
pub use metrics::GenerationReport;
pub use path::PathValidator;
pub use planner::{plan, Phase, Plan};
pub use sampler::Sampler;
pub use scene::{
    DeclarationKey, ForcedChoiceOutcome, Goal, LipGap, LipSide, ObjectInstance, ObjectKind,
    PerformerStart, PlatformLips, RoomDescriptor, RoomMaterials, Scene, SceneRegion,
    WallMaterials, FORMAT_VERSION,
};
pub use schedule::{schedule, EventKind, EventTrigger, FreezeWindow, ScheduledEvent, Timeline};
