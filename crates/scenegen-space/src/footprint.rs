//! Tool footprints as occupied-cell masks.
//!
//! A footprint is described in a local frame where the tool's near end
//! sits on cell `(0, 0)` and its long axis points along local `+z`.
//! Rotating by quarter turns and translating to an origin cell yields
//! the world cells the tool covers.

use crate::cell::Cell;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Tool silhouette family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Straight bar.
    Rect,
    /// Bar with a two-cell hook at the far end.
    Hooked,
    /// Bar with a diagonal brace running back from the far end.
    Isosceles,
}

impl ToolKind {
    /// Every kind, in declaration order.
    pub const ALL: [ToolKind; 3] = [ToolKind::Rect, ToolKind::Hooked, ToolKind::Isosceles];

    /// Lower-case name used in shape identifiers.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Hooked => "hooked",
            Self::Isosceles => "isosceles",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Occupied-cell mask of a tool at a given orientation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    kind: ToolKind,
    length: u32,
    quarter_turns: u8,
    cells: SmallVec<[Cell; 24]>,
}

impl Footprint {
    /// Unrotated mask for a tool `length` cells long.
    ///
    /// Returns `None` for zero-length tools.
    pub fn tool(kind: ToolKind, length: u32) -> Option<Self> {
        if length == 0 {
            return None;
        }
        let len = length as i32;
        let mut cells: SmallVec<[Cell; 24]> = (0..len).map(|z| Cell::new(0, z)).collect();
        match kind {
            ToolKind::Rect => {}
            ToolKind::Hooked => {
                cells.push(Cell::new(1, len - 1));
                cells.push(Cell::new(2, len - 1));
            }
            ToolKind::Isosceles => {
                let arm = (len / 3).max(1);
                for k in 1..=arm {
                    cells.push(Cell::new(k, len - 1 - k));
                }
            }
        }
        Some(Self {
            kind,
            length,
            quarter_turns: 0,
            cells,
        })
    }

    /// Tool family.
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Length of the long axis in cells.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Clockwise rotation in degrees (multiples of 90).
    pub fn rotation_degrees(&self) -> f64 {
        f64::from(self.quarter_turns) * 90.0
    }

    /// Local offsets at the current orientation.
    pub fn offsets(&self) -> &[Cell] {
        &self.cells
    }

    /// The same mask rotated clockwise by `turns` quarter turns.
    pub fn rotated(&self, turns: u8) -> Self {
        let mut out = self.clone();
        for _ in 0..turns % 4 {
            for c in out.cells.iter_mut() {
                *c = Cell::new(c.z, -c.x);
            }
        }
        out.quarter_turns = (self.quarter_turns + turns) % 4;
        out
    }

    /// Unit step along the long axis, as a cell delta.
    pub fn forward(&self) -> (i32, i32) {
        match self.quarter_turns {
            0 => (0, 1),
            1 => (1, 0),
            2 => (0, -1),
            _ => (-1, 0),
        }
    }

    /// World cells covered when the near end sits on `origin`.
    pub fn world_cells(&self, origin: Cell) -> Vec<Cell> {
        self.cells
            .iter()
            .map(|c| origin.offset(c.x, c.z))
            .collect()
    }

    /// World cells covered after pushing the tool `steps` cells forward.
    pub fn pushed_cells(&self, origin: Cell, steps: u32) -> Vec<Cell> {
        let (dx, dz) = self.forward();
        let s = steps as i32;
        self.world_cells(origin.offset(dx * s, dz * s))
    }

    /// Every cell the tool passes over while being pushed `steps` cells
    /// forward, including its start and end positions.
    pub fn swept_cells(&self, origin: Cell, steps: u32) -> Vec<Cell> {
        let mut out: Vec<Cell> = (0..=steps)
            .flat_map(|s| self.pushed_cells(origin, s))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// The cell a performer stands on to push the tool forward.
    pub fn push_cell(&self, origin: Cell) -> Cell {
        let (dx, dz) = self.forward();
        origin.offset(-dx, -dz)
    }

    /// World cell at the far end of the long axis.
    pub fn far_end(&self, origin: Cell) -> Cell {
        let (dx, dz) = self.forward();
        let l = self.length as i32 - 1;
        origin.offset(dx * l, dz * l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_are_distinct_per_kind() {
        let rect = Footprint::tool(ToolKind::Rect, 6).unwrap();
        let hooked = Footprint::tool(ToolKind::Hooked, 6).unwrap();
        let iso = Footprint::tool(ToolKind::Isosceles, 6).unwrap();
        assert_eq!(rect.offsets().len(), 6);
        assert_eq!(hooked.offsets().len(), 8);
        assert_eq!(iso.offsets().len(), 8);
        assert_ne!(hooked.offsets(), iso.offsets());
    }

    #[test]
    fn rotation_turns_forward_axis() {
        let rect = Footprint::tool(ToolKind::Rect, 3).unwrap();
        assert_eq!(rect.forward(), (0, 1));
        let turned = rect.rotated(1);
        assert_eq!(turned.forward(), (1, 0));
        assert_eq!(
            turned.world_cells(Cell::new(0, 0)),
            vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)]
        );
        assert_eq!(turned.rotated(3).offsets(), rect.offsets());
    }

    #[test]
    fn push_cell_sits_behind_near_end() {
        let rect = Footprint::tool(ToolKind::Rect, 4).unwrap();
        assert_eq!(rect.push_cell(Cell::new(2, 2)), Cell::new(2, 1));
        assert_eq!(rect.far_end(Cell::new(2, 2)), Cell::new(2, 5));
    }

    #[test]
    fn swept_cells_cover_start_and_end() {
        let rect = Footprint::tool(ToolKind::Rect, 2).unwrap();
        let swept = rect.swept_cells(Cell::new(0, 0), 2);
        assert_eq!(
            swept,
            vec![
                Cell::new(0, 0),
                Cell::new(0, 1),
                Cell::new(0, 2),
                Cell::new(0, 3)
            ]
        );
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(Footprint::tool(ToolKind::Rect, 0).is_none());
    }
}
