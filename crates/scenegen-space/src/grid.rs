//! The room and its floor grid.

use crate::cell::Cell;
use crate::error::SpaceError;
use scenegen_core::{approx_le, Vec3, EPSILON};
use serde::{Deserialize, Serialize};

/// Smallest supported room width/depth.
pub const ROOM_MIN_XZ: u32 = 2;
/// Largest supported room width/depth.
pub const ROOM_MAX_XZ: u32 = 100;
/// Smallest supported room height.
pub const ROOM_MIN_Y: u32 = 2;
/// Largest supported room height.
pub const ROOM_MAX_Y: u32 = 10;

/// A rectangular room centred on the origin.
///
/// The floor spans `[-x/2, x/2] × [-z/2, z/2]` at `y = 0`; the ceiling is
/// at `y`. Floor cells are the unit squares centred on integer
/// coordinates that lie entirely inside the walls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomGrid {
    x: u32,
    y: u32,
    z: u32,
}

impl RoomGrid {
    /// Create a room, validating every dimension against the supported
    /// range.
    pub fn new(x: u32, y: u32, z: u32) -> Result<Self, SpaceError> {
        for (axis, v) in [("x", x), ("z", z)] {
            if !(ROOM_MIN_XZ..=ROOM_MAX_XZ).contains(&v) {
                return Err(SpaceError::InvalidRoom {
                    reason: format!("{axis} = {v} outside [{ROOM_MIN_XZ}, {ROOM_MAX_XZ}]"),
                });
            }
        }
        if !(ROOM_MIN_Y..=ROOM_MAX_Y).contains(&y) {
            return Err(SpaceError::InvalidRoom {
                reason: format!("y = {y} outside [{ROOM_MIN_Y}, {ROOM_MAX_Y}]"),
            });
        }
        Ok(Self { x, y, z })
    }

    /// Room dimensions as a vector.
    pub fn dimensions(&self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Width along x.
    pub fn width(&self) -> u32 {
        self.x
    }

    /// Ceiling height.
    pub fn height(&self) -> u32 {
        self.y
    }

    /// Depth along z.
    pub fn depth(&self) -> u32 {
        self.z
    }

    /// Half of the width.
    pub fn half_x(&self) -> f64 {
        self.x as f64 / 2.0
    }

    /// Half of the depth.
    pub fn half_z(&self) -> f64 {
        self.z as f64 / 2.0
    }

    /// Largest absolute x index of an in-room cell.
    pub fn max_cell_x(&self) -> i32 {
        (self.half_x() - 0.5 + EPSILON).floor() as i32
    }

    /// Largest absolute z index of an in-room cell.
    pub fn max_cell_z(&self) -> i32 {
        (self.half_z() - 0.5 + EPSILON).floor() as i32
    }

    /// Whether `cell` lies entirely inside the room.
    pub fn contains_cell(&self, cell: Cell) -> bool {
        cell.x.abs() <= self.max_cell_x() && cell.z.abs() <= self.max_cell_z()
    }

    /// Whether a floor point lies inside the walls.
    pub fn contains_point(&self, p: Vec3) -> bool {
        approx_le(p.x.abs(), self.half_x()) && approx_le(p.z.abs(), self.half_z())
    }

    /// Number of in-room cells along x.
    pub fn cols(&self) -> usize {
        (2 * self.max_cell_x() + 1) as usize
    }

    /// Number of in-room cells along z.
    pub fn rows(&self) -> usize {
        (2 * self.max_cell_z() + 1) as usize
    }

    /// Total number of in-room cells.
    pub fn cell_count(&self) -> usize {
        self.cols() * self.rows()
    }

    /// Dense index of a cell, or `None` if outside the room.
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.contains_cell(cell) {
            return None;
        }
        let col = (cell.x + self.max_cell_x()) as usize;
        let row = (cell.z + self.max_cell_z()) as usize;
        Some(row * self.cols() + col)
    }

    /// Every in-room cell in canonical order (z-major, then x).
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let mx = self.max_cell_x();
        let mz = self.max_cell_z();
        (-mz..=mz).flat_map(move |z| (-mx..=mx).map(move |x| Cell::new(x, z)))
    }

    /// Length of the floor diagonal.
    pub fn diagonal(&self) -> f64 {
        ((self.x as f64).powi(2) + (self.z as f64).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_room_is_fully_tiled() {
        let room = RoomGrid::new(15, 4, 9).unwrap();
        assert_eq!(room.max_cell_x(), 7);
        assert_eq!(room.max_cell_z(), 4);
        assert_eq!(room.cell_count(), 15 * 9);
    }

    #[test]
    fn even_room_leaves_half_cell_margins() {
        let room = RoomGrid::new(14, 4, 14).unwrap();
        assert_eq!(room.max_cell_x(), 6);
        assert!(!room.contains_cell(Cell::new(7, 0)));
        assert_eq!(room.cols(), 13);
    }

    #[test]
    fn index_round_trips_canonical_order() {
        let room = RoomGrid::new(5, 3, 7).unwrap();
        for (i, cell) in room.cells().enumerate() {
            assert_eq!(room.index_of(cell), Some(i));
        }
        assert_eq!(room.index_of(Cell::new(3, 0)), None);
    }

    #[test]
    fn out_of_range_dimensions_rejected() {
        assert!(RoomGrid::new(1, 3, 5).is_err());
        assert!(RoomGrid::new(5, 11, 5).is_err());
        assert!(RoomGrid::new(5, 3, 101).is_err());
    }
}
