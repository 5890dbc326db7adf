//! Core types for the scenegen procedural scene generator.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! vocabulary shared by the spatial index and the engine: identifiers,
//! simulation steps, labels, vectors, randomizable configuration values,
//! and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod value;
pub mod vector;

pub use error::{AttemptFailure, FailureKind, GenerationError, Invariant};
pub use id::{EventId, Label, ObjectId, RegionId, Step};
pub use value::{
    MinMax, Numeric, NumericChoice, OneOf, PartialVec3, Randomizable, ScaleConfig, ValueError,
    VectorRandomizable, Weighted,
};
pub use vector::{approx_eq, approx_le, Vec3, EPSILON};
