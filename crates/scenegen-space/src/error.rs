//! Error types for spatial operations.

use crate::cell::Cell;
use scenegen_core::RegionId;
use thiserror::Error;

/// Errors arising from room construction or region bookkeeping.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SpaceError {
    /// Room dimensions outside the supported range.
    #[error("invalid room: {reason}")]
    InvalidRoom {
        /// What went wrong.
        reason: String,
    },
    /// A cell lies outside the room's floor grid.
    #[error("cell {cell} is outside the room")]
    CellOutOfRoom {
        /// The offending cell.
        cell: Cell,
    },
    /// A new region would share cells with an incompatible one.
    #[error("region overlaps incompatible region {existing}")]
    RegionConflict {
        /// The region already occupying the cells.
        existing: RegionId,
    },
    /// A region or footprint with no cells.
    #[error("region must contain at least one cell")]
    EmptyRegion,
}
