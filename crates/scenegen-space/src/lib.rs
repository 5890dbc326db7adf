//! Room geometry and spatial queries for scenegen.
//!
//! This crate holds the geometric substrate every placement decision is
//! checked against:
//!
//! - [`RoomGrid`]: room dimensions and the unit floor grid
//! - [`ObjectBounds`]: oriented boxes with separating-axis overlap tests
//! - [`Footprint`]: `rect`, `hooked` and `isosceles` tool masks
//! - [`SpatialIndex`]: regions and placed objects, with `query_overlap`,
//!   `find_free_cells` and `adjacent_offsets`
//! - [`NavGrid`]: directed breadth-first reachability for the performer

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bounds;
pub mod cell;
pub mod error;
pub mod footprint;
pub mod grid;
pub mod index;
pub mod reach;
pub mod region;

pub use bounds::{rects_overlap, Corners, ObjectBounds};
pub use cell::Cell;
pub use error::SpaceError;
pub use footprint::{Footprint, ToolKind};
pub use grid::{RoomGrid, ROOM_MAX_XZ, ROOM_MAX_Y, ROOM_MIN_XZ, ROOM_MIN_Y};
pub use index::{Collision, SpatialIndex, COMPASS_DEGREES};
pub use reach::{NavGrid, MAX_STEP_UP};
pub use region::{RegionKind, SpatialRegion};
