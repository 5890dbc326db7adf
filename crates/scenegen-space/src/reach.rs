//! Performer navigation over the floor grid.
//!
//! [`NavGrid`] stores, per in-room cell, whether the performer can stand
//! there and the height of the surface it would stand on. Moves are
//! orthogonal and directed: the performer may drop down any distance but
//! may only step up by [`MAX_STEP_UP`]. Ramps add explicit climbs that
//! ignore the step limit; platform lips forbid individual moves.

use crate::cell::Cell;
use crate::grid::RoomGrid;
use crate::index::SpatialIndex;
use scenegen_core::EPSILON;
use std::collections::{BTreeSet, VecDeque};

/// Largest upward step the performer can take without a ramp.
pub const MAX_STEP_UP: f64 = 0.1;

/// Passability and surface height for every in-room cell.
#[derive(Clone, Debug)]
pub struct NavGrid {
    room: RoomGrid,
    passable: Vec<bool>,
    height: Vec<f64>,
    climbs: BTreeSet<(usize, usize)>,
    forbidden: BTreeSet<(usize, usize)>,
}

impl NavGrid {
    /// Fully open floor at height zero.
    pub fn open(room: RoomGrid) -> Self {
        let n = room.cell_count();
        Self {
            room,
            passable: vec![true; n],
            height: vec![0.0; n],
            climbs: BTreeSet::new(),
            forbidden: BTreeSet::new(),
        }
    }

    /// Open floor with every hazard cell of `index` blocked.
    pub fn from_index(index: &SpatialIndex) -> Self {
        let mut nav = Self::open(*index.room());
        for region in index.regions().iter().filter(|r| r.kind.is_hazard()) {
            for &cell in &region.cells {
                nav.block(cell);
            }
        }
        nav
    }

    /// The room this grid covers.
    pub fn room(&self) -> &RoomGrid {
        &self.room
    }

    /// Mark a cell impassable. Out-of-room cells are ignored.
    pub fn block(&mut self, cell: Cell) {
        if let Some(i) = self.room.index_of(cell) {
            self.passable[i] = false;
        }
    }

    /// Mark a cell passable. Out-of-room cells are ignored.
    pub fn unblock(&mut self, cell: Cell) {
        if let Some(i) = self.room.index_of(cell) {
            self.passable[i] = true;
        }
    }

    /// Set the standing height of a cell.
    pub fn set_height(&mut self, cell: Cell, height: f64) {
        if let Some(i) = self.room.index_of(cell) {
            self.height[i] = height;
        }
    }

    /// Allow the move `from -> to` whatever the height difference.
    pub fn allow_climb(&mut self, from: Cell, to: Cell) {
        if let (Some(a), Some(b)) = (self.room.index_of(from), self.room.index_of(to)) {
            self.climbs.insert((a, b));
        }
    }

    /// Forbid the move `from -> to`. The reverse move is unaffected.
    pub fn forbid(&mut self, from: Cell, to: Cell) {
        if let (Some(a), Some(b)) = (self.room.index_of(from), self.room.index_of(to)) {
            self.forbidden.insert((a, b));
        }
    }

    /// Whether the performer can stand on `cell`.
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.room
            .index_of(cell)
            .is_some_and(|i| self.passable[i])
    }

    /// Standing height of `cell`, if in the room.
    pub fn height(&self, cell: Cell) -> Option<f64> {
        self.room.index_of(cell).map(|i| self.height[i])
    }

    fn can_move(&self, from: usize, to: usize) -> bool {
        if !self.passable[to] || self.forbidden.contains(&(from, to)) {
            return false;
        }
        self.height[to] <= self.height[from] + MAX_STEP_UP + EPSILON
            || self.climbs.contains(&(from, to))
    }

    /// Breadth-first flood fill from `start`. Returns a dense visited
    /// mask indexed by [`RoomGrid::index_of`]; an impassable or
    /// out-of-room start reaches nothing.
    pub fn flood(&self, start: Cell) -> Vec<bool> {
        let n = self.room.cell_count();
        let mut visited = vec![false; n];
        let Some(si) = self.room.index_of(start) else {
            return visited;
        };
        if !self.passable[si] {
            return visited;
        }
        let mut queue = VecDeque::new();
        visited[si] = true;
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            let Some(ci) = self.room.index_of(cell) else {
                continue;
            };
            for next in cell.neighbours4() {
                let Some(ni) = self.room.index_of(next) else {
                    continue;
                };
                if !visited[ni] && self.can_move(ci, ni) {
                    visited[ni] = true;
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Whether any cell of `goals` is reachable from `start`.
    pub fn is_reachable(&self, start: Cell, goals: &[Cell]) -> bool {
        let visited = self.flood(start);
        goals
            .iter()
            .filter_map(|g| self.room.index_of(*g))
            .any(|i| visited[i])
    }

    /// Every cell reachable from `start`, in canonical order.
    pub fn reachable_cells(&self, start: Cell) -> Vec<Cell> {
        let visited = self.flood(start);
        self.room
            .cells()
            .zip(visited)
            .filter_map(|(c, v)| v.then_some(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionKind;

    fn room() -> RoomGrid {
        RoomGrid::new(7, 3, 7).unwrap()
    }

    #[test]
    fn open_room_is_connected() {
        let nav = NavGrid::open(room());
        assert_eq!(nav.reachable_cells(Cell::new(0, 0)).len(), 49);
    }

    #[test]
    fn lava_wall_splits_room() {
        let mut index = SpatialIndex::new(room());
        index
            .add_region(RegionKind::Lava, (-3..=3).map(|x| Cell::new(x, 0)))
            .unwrap();
        let nav = NavGrid::from_index(&index);
        assert!(!nav.is_reachable(Cell::new(0, -2), &[Cell::new(0, 2)]));
        assert!(nav.is_reachable(Cell::new(0, -2), &[Cell::new(3, -3)]));
    }

    #[test]
    fn dropping_down_is_one_way() {
        let mut nav = NavGrid::open(room());
        for z in -3..=3 {
            nav.set_height(Cell::new(0, z), 1.0);
        }
        // From the platform the performer can step off.
        assert!(nav.is_reachable(Cell::new(0, 0), &[Cell::new(2, 0)]));
        // From the floor they cannot climb back up.
        assert!(!nav.is_reachable(Cell::new(2, 0), &[Cell::new(0, 0)]));
    }

    #[test]
    fn climbs_lead_up_to_a_platform() {
        let mut nav = NavGrid::open(room());
        for z in 1..=3 {
            nav.set_height(Cell::new(0, z), 1.0);
        }
        nav.set_height(Cell::new(0, 0), 0.5);
        assert!(!nav.is_reachable(Cell::new(0, -2), &[Cell::new(0, 2)]));

        nav.allow_climb(Cell::new(0, -1), Cell::new(0, 0));
        nav.allow_climb(Cell::new(0, 0), Cell::new(0, 1));
        assert!(nav.is_reachable(Cell::new(0, -2), &[Cell::new(0, 2)]));
    }

    #[test]
    fn climbs_do_not_open_the_sides() {
        let mut nav = NavGrid::open(room());
        nav.set_height(Cell::new(0, 0), 0.5);
        nav.allow_climb(Cell::new(0, -1), Cell::new(0, 0));
        let mut walled = nav.clone();
        walled.block(Cell::new(0, -1));
        assert!(!walled.is_reachable(Cell::new(1, 0), &[Cell::new(0, 0)]));
        assert!(nav.is_reachable(Cell::new(1, 0), &[Cell::new(0, 0)]));
    }

    #[test]
    fn forbidden_moves_are_one_way() {
        let mut nav = NavGrid::open(RoomGrid::new(3, 3, 3).unwrap());
        nav.block(Cell::new(0, 1));
        nav.block(Cell::new(0, -1));
        nav.forbid(Cell::new(0, 0), Cell::new(1, 0));
        assert!(!nav.is_reachable(Cell::new(0, 0), &[Cell::new(1, 0)]));
        assert!(nav.is_reachable(Cell::new(1, 0), &[Cell::new(0, 0)]));
    }

    #[test]
    fn blocked_start_reaches_nothing() {
        let mut nav = NavGrid::open(room());
        nav.block(Cell::new(0, 0));
        assert!(nav.reachable_cells(Cell::new(0, 0)).is_empty());
    }
}
