//! The per-attempt spatial index.
//!
//! [`SpatialIndex`] owns the room, every floor region, and the bounds of
//! every placed object. Placement code asks it whether a candidate
//! footprint is free before committing the candidate.

use crate::bounds::ObjectBounds;
use crate::cell::Cell;
use crate::error::SpaceError;
use crate::grid::RoomGrid;
use crate::region::{RegionKind, SpatialRegion};
use scenegen_core::{ObjectId, RegionId, Vec3, EPSILON};
use std::collections::BTreeSet;

/// The eight compass directions used by adjacency queries, in degrees
/// clockwise from `+z`.
pub const COMPASS_DEGREES: [f64; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];

/// Why a candidate footprint was rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collision {
    /// Part of the footprint is outside the room.
    OutOfRoom,
    /// Overlaps a reserved volume such as the performer's start.
    Reserved,
    /// Overlaps a placed object.
    Object(ObjectId),
    /// A floor-standing footprint overlaps lava or a hole.
    Hazard(RegionId),
}

/// Room, regions and placed-object bounds for one generation attempt.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    room: RoomGrid,
    regions: Vec<SpatialRegion>,
    objects: Vec<(ObjectId, ObjectBounds)>,
    reserved: Vec<ObjectBounds>,
}

impl SpatialIndex {
    /// Empty index for `room`.
    pub fn new(room: RoomGrid) -> Self {
        Self {
            room,
            regions: Vec::new(),
            objects: Vec::new(),
            reserved: Vec::new(),
        }
    }

    /// The room.
    pub fn room(&self) -> &RoomGrid {
        &self.room
    }

    // ── Regions ─────────────────────────────────────────────────────

    /// Add a region, rejecting cells outside the room and overlap with
    /// incompatible regions. Returns the new region's id.
    pub fn add_region(
        &mut self,
        kind: RegionKind,
        cells: impl IntoIterator<Item = Cell>,
    ) -> Result<RegionId, SpaceError> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if cells.is_empty() {
            return Err(SpaceError::EmptyRegion);
        }
        if let Some(cell) = cells.iter().find(|c| !self.room.contains_cell(**c)) {
            return Err(SpaceError::CellOutOfRoom { cell: *cell });
        }
        let id = RegionId(self.regions.len() as u32);
        let region = SpatialRegion { id, kind, cells };
        if let Some(existing) = self
            .regions
            .iter()
            .find(|r| r.kind.conflicts_with(kind) && r.intersects(&region))
        {
            return Err(SpaceError::RegionConflict {
                existing: existing.id,
            });
        }
        self.regions.push(region);
        Ok(id)
    }

    /// Look up a region.
    pub fn region(&self, id: RegionId) -> Option<&SpatialRegion> {
        self.regions.get(id.0 as usize)
    }

    /// Every region, in insertion order.
    pub fn regions(&self) -> &[SpatialRegion] {
        &self.regions
    }

    /// Whether two regions share any cell. Unknown ids never overlap.
    pub fn query_overlap(&self, a: RegionId, b: RegionId) -> bool {
        match (self.region(a), self.region(b)) {
            (Some(ra), Some(rb)) => ra.intersects(rb),
            _ => false,
        }
    }

    /// The hazard region covering `cell`, if any.
    pub fn hazard_at(&self, cell: Cell) -> Option<&SpatialRegion> {
        self.regions
            .iter()
            .find(|r| r.kind.is_hazard() && r.contains(cell))
    }

    /// Whether any region of `kind` covers `cell`.
    pub fn has_kind_at(&self, cell: Cell, kind: RegionKind) -> bool {
        self.regions
            .iter()
            .any(|r| r.kind == kind && r.contains(cell))
    }

    /// Cells covered by any region of the given kinds.
    pub fn cells_of(&self, kinds: &[RegionKind]) -> BTreeSet<Cell> {
        self.regions
            .iter()
            .filter(|r| kinds.contains(&r.kind))
            .flat_map(|r| r.cells.iter().copied())
            .collect()
    }

    // ── Objects ─────────────────────────────────────────────────────

    /// Record a placed object's bounds.
    pub fn insert_object(&mut self, id: ObjectId, bounds: ObjectBounds) {
        self.objects.push((id, bounds));
    }

    /// Forget an object's bounds.
    pub fn remove_object(&mut self, id: ObjectId) {
        self.objects.retain(|(oid, _)| *oid != id);
    }

    /// Bounds of a placed object.
    pub fn object_bounds(&self, id: ObjectId) -> Option<&ObjectBounds> {
        self.objects
            .iter()
            .find(|(oid, _)| *oid == id)
            .map(|(_, b)| b)
    }

    /// Reserve a volume no object may overlap, such as the space around
    /// the performer's start position.
    pub fn reserve(&mut self, bounds: ObjectBounds) {
        self.reserved.push(bounds);
    }

    /// Drop all reservations.
    pub fn clear_reservations(&mut self) {
        self.reserved.clear();
    }

    /// First reason `bounds` cannot be placed, ignoring the objects in
    /// `ignore`. `None` means the footprint is free.
    pub fn collision(&self, bounds: &ObjectBounds, ignore: &[ObjectId]) -> Option<Collision> {
        if !bounds.is_within_room(&self.room) {
            return Some(Collision::OutOfRoom);
        }
        if self.reserved.iter().any(|r| r.overlaps(bounds)) {
            return Some(Collision::Reserved);
        }
        if let Some((id, _)) = self
            .objects
            .iter()
            .find(|(id, b)| !ignore.contains(id) && b.overlaps(bounds))
        {
            return Some(Collision::Object(*id));
        }
        if bounds.min_y <= EPSILON {
            if let Some(region) = self.hazard_under(bounds) {
                return Some(Collision::Hazard(region));
            }
        }
        None
    }

    /// Whether `bounds` can be placed without any collision.
    pub fn is_free(&self, bounds: &ObjectBounds) -> bool {
        self.collision(bounds, &[]).is_none()
    }

    /// The first hazard region under a footprint.
    pub fn hazard_under(&self, bounds: &ObjectBounds) -> Option<RegionId> {
        bounds
            .covered_cells(&self.room)
            .into_iter()
            .find_map(|c| self.hazard_at(c).map(|r| r.id))
    }

    /// Whether a cell is overlapped by a placed object or reservation.
    pub fn cell_occupied(&self, cell: Cell) -> bool {
        self.objects
            .iter()
            .map(|(_, b)| b)
            .chain(self.reserved.iter())
            .any(|b| b.overlaps_cell(cell))
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Cells `c` such that the `size × size` block with `c` as its
    /// minimum corner is inside the room, covered by no region of an
    /// `excluded` kind, and overlapped by no object or reservation.
    pub fn find_free_cells(&self, excluded: &[RegionKind], size: u32) -> Vec<Cell> {
        let size = size.max(1) as i32;
        let blocked: BTreeSet<Cell> = self.cells_of(excluded);
        self.room
            .cells()
            .filter(|base| {
                (0..size).all(|dz| {
                    (0..size).all(|dx| {
                        let c = base.offset(dx, dz);
                        self.room.contains_cell(c)
                            && !blocked.contains(&c)
                            && !self.cell_occupied(c)
                    })
                })
            })
            .collect()
    }

    /// Points at each distance in `distances` from `base` along the eight
    /// compass directions, keeping only points inside the room.
    pub fn adjacent_offsets(&self, base: Vec3, distances: &[f64]) -> Vec<Vec3> {
        let mut out = Vec::with_capacity(distances.len() * COMPASS_DEGREES.len());
        for &d in distances {
            for deg in COMPASS_DEGREES {
                let (sin, cos) = deg.to_radians().sin_cos();
                let p = Vec3::new(base.x + sin * d, base.y, base.z + cos * d);
                if self.room.contains_point(p) {
                    out.push(p);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex {
        SpatialIndex::new(RoomGrid::new(9, 3, 9).unwrap())
    }

    #[test]
    fn incompatible_regions_are_rejected() {
        let mut idx = index();
        let lava = idx.add_region(RegionKind::Lava, [Cell::new(0, 0)]).unwrap();
        let err = idx
            .add_region(RegionKind::Island, [Cell::new(0, 0), Cell::new(1, 0)])
            .unwrap_err();
        assert_eq!(err, SpaceError::RegionConflict { existing: lava });
        let island = idx.add_region(RegionKind::Island, [Cell::new(1, 0)]).unwrap();
        assert!(!idx.query_overlap(lava, island));
    }

    #[test]
    fn out_of_room_region_is_rejected() {
        let mut idx = index();
        assert!(matches!(
            idx.add_region(RegionKind::Hole, [Cell::new(5, 0)]),
            Err(SpaceError::CellOutOfRoom { .. })
        ));
    }

    #[test]
    fn floor_object_over_lava_collides() {
        let mut idx = index();
        let lava = idx.add_region(RegionKind::Lava, [Cell::new(2, 2)]).unwrap();
        let over = ObjectBounds::new(Vec3::new(2.0, 0.0, 2.0), Vec3::splat(0.5), 0.0);
        assert_eq!(idx.collision(&over, &[]), Some(Collision::Hazard(lava)));
        let airborne = ObjectBounds::new(Vec3::new(2.0, 2.0, 2.0), Vec3::splat(0.5), 0.0);
        assert_eq!(idx.collision(&airborne, &[]), None);
    }

    #[test]
    fn placed_objects_block_free_cells() {
        let mut idx = index();
        let all = idx.find_free_cells(&[], 1).len();
        idx.insert_object(
            ObjectId(0),
            ObjectBounds::new(Vec3::ZERO, Vec3::splat(0.8), 0.0),
        );
        assert_eq!(idx.find_free_cells(&[], 1).len(), all - 1);
        idx.remove_object(ObjectId(0));
        assert_eq!(idx.find_free_cells(&[], 1).len(), all);
    }

    #[test]
    fn free_blocks_respect_size() {
        let idx = index();
        // 9x9 cells; 2x2 blocks need a neighbour in +x and +z.
        assert_eq!(idx.find_free_cells(&[], 2).len(), 8 * 8);
    }

    #[test]
    fn adjacent_offsets_clip_to_room() {
        let idx = index();
        let centre = idx.adjacent_offsets(Vec3::ZERO, &[1.0]);
        assert_eq!(centre.len(), 8);
        let corner = idx.adjacent_offsets(Vec3::new(4.0, 0.0, 4.0), &[1.0]);
        assert!(corner.len() < 8);
        assert!(corner.iter().all(|p| p.x <= 4.5 && p.z <= 4.5));
    }
}
