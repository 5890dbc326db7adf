//! Typed floor regions.

use crate::cell::Cell;
use scenegen_core::RegionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a floor region represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Impassable hazard; nothing may stand on it.
    Lava,
    /// Gap in the floor; nothing may stand on it.
    Hole,
    /// Walkable floor surrounded by a hazard.
    Island,
    /// Top surface of a raised platform.
    Platform,
    /// Floor kept clear of hazards so a path exists.
    Walkway,
}

impl RegionKind {
    /// Lava and holes.
    pub fn is_hazard(self) -> bool {
        matches!(self, Self::Lava | Self::Hole)
    }

    /// Whether regions of the two kinds may not share a cell.
    ///
    /// Hazards exclude every non-hazard kind and each other; non-hazard
    /// kinds may coexist.
    pub fn conflicts_with(self, other: RegionKind) -> bool {
        match (self.is_hazard(), other.is_hazard()) {
            (true, true) => self != other,
            (false, false) => false,
            _ => true,
        }
    }
}

/// A set of floor cells of one kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialRegion {
    /// Region identifier, unique per scene.
    pub id: RegionId,
    /// Region kind.
    pub kind: RegionKind,
    /// Covered cells in canonical order.
    pub cells: BTreeSet<Cell>,
}

impl SpatialRegion {
    /// Whether `cell` belongs to the region.
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Whether the two regions share a cell.
    pub fn intersects(&self, other: &SpatialRegion) -> bool {
        let (small, large) = if self.cells.len() <= other.cells.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.cells.iter().any(|c| large.cells.contains(c))
    }

    /// Cells orthogonally adjacent to the region but not part of it.
    pub fn border(&self) -> BTreeSet<Cell> {
        self.cells
            .iter()
            .flat_map(|c| c.neighbours4())
            .filter(|c| !self.cells.contains(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: u32, kind: RegionKind, cells: &[(i32, i32)]) -> SpatialRegion {
        SpatialRegion {
            id: RegionId(id),
            kind,
            cells: cells.iter().map(|&(x, z)| Cell::new(x, z)).collect(),
        }
    }

    #[test]
    fn hazard_compatibility_matrix() {
        use RegionKind::*;
        assert!(Lava.conflicts_with(Island));
        assert!(Hole.conflicts_with(Lava));
        assert!(!Lava.conflicts_with(Lava));
        assert!(!Island.conflicts_with(Platform));
        assert!(Walkway.conflicts_with(Hole));
    }

    #[test]
    fn intersection_and_border() {
        let a = region(0, RegionKind::Lava, &[(0, 0), (1, 0)]);
        let b = region(1, RegionKind::Island, &[(1, 0), (5, 5)]);
        let c = region(2, RegionKind::Island, &[(3, 3)]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.border().len(), 6);
    }
}
