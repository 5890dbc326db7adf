//! Unit floor cells.

use scenegen_core::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A one-by-one floor cell centred on integer `(x, z)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Lateral index (equals the centre's x coordinate).
    pub x: i32,
    /// Depth index (equals the centre's z coordinate).
    pub z: i32,
}

impl Cell {
    /// Construct a cell.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The cell containing a floor point.
    pub fn containing(p: Vec3) -> Self {
        Self::new(p.x.round() as i32, p.z.round() as i32)
    }

    /// Centre of the cell at floor height.
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f64, 0.0, self.z as f64)
    }

    /// This cell shifted by `(dx, dz)`.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Orthogonal neighbours in `+x, -x, +z, -z` order.
    pub fn neighbours4(self) -> [Cell; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// Orthogonal and diagonal neighbours.
    pub fn neighbours8(self) -> [Cell; 8] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(1, 1),
            self.offset(1, -1),
            self.offset(-1, 1),
            self.offset(-1, -1),
        ]
    }

    /// Manhattan distance.
    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_rounds_to_nearest_centre() {
        assert_eq!(Cell::containing(Vec3::new(1.4, 0.0, -2.6)), Cell::new(1, -3));
        assert_eq!(Cell::containing(Vec3::new(-0.4, 3.0, 0.4)), Cell::new(0, 0));
    }

    #[test]
    fn neighbours_are_unit_steps() {
        let c = Cell::new(2, 2);
        for n in c.neighbours4() {
            assert_eq!(c.manhattan(n), 1);
        }
        assert_eq!(c.neighbours8().len(), 8);
    }
}
