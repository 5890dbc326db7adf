//! Oriented bounding boxes and separating-axis overlap tests.

use crate::cell::Cell;
use crate::grid::RoomGrid;
use scenegen_core::{approx_le, Vec3, EPSILON};
use serde::{Deserialize, Serialize};

/// Floor-plane corners of an oriented rectangle, `(x, z)` pairs in
/// winding order.
pub type Corners = [(f64, f64); 4];

/// An object's oriented bounding box: a rotated floor rectangle extruded
/// between `min_y` and `max_y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectBounds {
    /// Floor-plane corners.
    pub corners: Corners,
    /// Bottom of the box.
    pub min_y: f64,
    /// Top of the box.
    pub max_y: f64,
}

impl ObjectBounds {
    /// Box whose bottom face is centred on `base`, with the given
    /// dimensions, rotated `rotation_y` degrees about the vertical axis.
    pub fn new(base: Vec3, dimensions: Vec3, rotation_y: f64) -> Self {
        let hx = dimensions.x / 2.0;
        let hz = dimensions.z / 2.0;
        let local = [(-hx, -hz), (hx, -hz), (hx, hz), (-hx, hz)];
        let mut corners = [(0.0, 0.0); 4];
        for (slot, (lx, lz)) in corners.iter_mut().zip(local) {
            let r = Vec3::new(lx, 0.0, lz).rotate_y(rotation_y);
            *slot = (base.x + r.x, base.z + r.z);
        }
        Self {
            corners,
            min_y: base.y,
            max_y: base.y + dimensions.y,
        }
    }

    /// Axis-aligned box spanning a single floor cell up to `height`.
    pub fn of_cell(cell: Cell, height: f64) -> Self {
        Self::new(cell.center(), Vec3::new(1.0, height, 1.0), 0.0)
    }

    /// Centre of the floor rectangle.
    pub fn center(&self) -> Vec3 {
        let (sx, sz) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(ax, az), (x, z)| (ax + x, az + z));
        Vec3::new(sx / 4.0, self.min_y, sz / 4.0)
    }

    /// Axis-aligned extents `(min_x, max_x, min_z, max_z)`.
    pub fn extents(&self) -> (f64, f64, f64, f64) {
        self.corners.iter().fold(
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            |(lx, hx, lz, hz), &(x, z)| (lx.min(x), hx.max(x), lz.min(z), hz.max(z)),
        )
    }

    /// Whether the vertical extents intersect with positive thickness.
    pub fn overlaps_vertically(&self, other: &ObjectBounds) -> bool {
        self.min_y < other.max_y - EPSILON && other.min_y < self.max_y - EPSILON
    }

    /// Whether the two boxes intersect with positive volume. Touching
    /// faces do not count.
    pub fn overlaps(&self, other: &ObjectBounds) -> bool {
        self.overlaps_vertically(other) && rects_overlap(&self.corners, &other.corners)
    }

    /// Whether the floor rectangles intersect, ignoring height.
    pub fn overlaps_floor(&self, other: &ObjectBounds) -> bool {
        rects_overlap(&self.corners, &other.corners)
    }

    /// Whether the floor rectangle intersects a cell's square.
    pub fn overlaps_cell(&self, cell: Cell) -> bool {
        rects_overlap(&self.corners, &ObjectBounds::of_cell(cell, 1.0).corners)
    }

    /// Whether every corner lies inside the room walls and the top is
    /// below the ceiling.
    pub fn is_within_room(&self, room: &RoomGrid) -> bool {
        self.corners.iter().all(|&(x, z)| {
            approx_le(x.abs(), room.half_x()) && approx_le(z.abs(), room.half_z())
        }) && approx_le(self.max_y, room.height() as f64)
    }

    /// In-room cells whose squares the floor rectangle touches.
    pub fn covered_cells(&self, room: &RoomGrid) -> Vec<Cell> {
        let (lx, hx, lz, hz) = self.extents();
        let mut out = Vec::new();
        for z in (lz.round() as i32 - 1)..=(hz.round() as i32 + 1) {
            for x in (lx.round() as i32 - 1)..=(hx.round() as i32 + 1) {
                let cell = Cell::new(x, z);
                if room.contains_cell(cell) && self.overlaps_cell(cell) {
                    out.push(cell);
                }
            }
        }
        out
    }
}

fn project(corners: &Corners, ax: f64, az: f64) -> (f64, f64) {
    corners
        .iter()
        .map(|&(x, z)| x * ax + z * az)
        .fold((f64::MAX, f64::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)))
}

/// Separating-axis test on two convex rectangles. Projections that only
/// touch within [`EPSILON`] are treated as separated.
pub fn rects_overlap(a: &Corners, b: &Corners) -> bool {
    for corners in [a, b] {
        for i in 0..2 {
            let j = (i + 1) % 4;
            let ex = corners[j].0 - corners[i].0;
            let ez = corners[j].1 - corners[i].1;
            let len = (ex * ex + ez * ez).sqrt();
            if len <= EPSILON {
                continue;
            }
            let (ax, az) = (-ez / len, ex / len);
            let (min_a, max_a) = project(a, ax, az);
            let (min_b, max_b) = project(b, ax, az);
            if max_a <= min_b + EPSILON || max_b <= min_a + EPSILON {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f64, z: f64, rot: f64) -> ObjectBounds {
        ObjectBounds::new(Vec3::new(x, 0.0, z), Vec3::splat(1.0), rot)
    }

    #[test]
    fn separated_boxes_do_not_overlap() {
        assert!(!unit_box(0.0, 0.0, 0.0).overlaps(&unit_box(3.0, 0.0, 0.0)));
    }

    #[test]
    fn touching_faces_do_not_overlap() {
        assert!(!unit_box(0.0, 0.0, 0.0).overlaps(&unit_box(1.0, 0.0, 0.0)));
    }

    #[test]
    fn rotated_box_catches_corner() {
        // A 45 degree diamond reaches ~0.707 from its centre.
        assert!(unit_box(0.0, 0.0, 0.0).overlaps(&unit_box(1.1, 0.0, 45.0)));
        assert!(!unit_box(0.0, 0.0, 0.0).overlaps(&unit_box(1.3, 0.0, 45.0)));
    }

    #[test]
    fn stacked_boxes_do_not_overlap() {
        let low = unit_box(0.0, 0.0, 0.0);
        let high = ObjectBounds::new(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(1.0), 0.0);
        assert!(!low.overlaps(&high));
        assert!(low.overlaps_floor(&high));
    }

    #[test]
    fn room_containment_respects_rotation() {
        let room = RoomGrid::new(4, 3, 4).unwrap();
        let square = ObjectBounds::new(Vec3::ZERO, Vec3::new(3.0, 1.0, 3.0), 0.0);
        assert!(square.is_within_room(&room));
        assert!(!ObjectBounds::new(Vec3::ZERO, Vec3::new(3.0, 1.0, 3.0), 45.0)
            .is_within_room(&room));
    }

    #[test]
    fn covered_cells_of_centred_unit_box() {
        let room = RoomGrid::new(5, 3, 5).unwrap();
        assert_eq!(unit_box(0.0, 0.0, 0.0).covered_cells(&room), vec![Cell::new(0, 0)]);
        let straddle = unit_box(0.5, 0.0, 0.0).covered_cells(&room);
        assert_eq!(straddle, vec![Cell::new(0, 0), Cell::new(1, 0)]);
    }
}
