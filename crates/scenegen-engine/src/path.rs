//! Path validation on the final scene state.
//!
//! Path checks are evaluated once every event has finished: placed
//! objects rest where their placers release them, picked-up objects are
//! gone and moving occluders stand on the floor. [`PathValidator::is_reachable`]
//! can also answer for an earlier step when the validator knows the
//! scheduled events. The performer walks the
//! unit floor grid; hazard cells and cells under navigation-blocking
//! objects are impassable, platform cells stand at the platform's top.
//! Ramps can be climbed toward their high end, lipped platform edges
//! cannot be crossed and doors are open passages.
//!
//! Three modes are supported, see [`PathCheck`]. In `tools` mode a tool
//! is pushed forward one cell at a time; the cells it covers become a
//! bridge over any hazard beneath them.

use crate::config::PathCheck;
use crate::planner::PERFORMER_HEIGHT;
use crate::scene::{LipSide, ObjectInstance, ObjectKind, PerformerStart, PlatformLips};
use crate::schedule::ScheduledEvent;
use scenegen_core::{GenerationError, ObjectId, RegionId, Step, Vec3, EPSILON};
use scenegen_space::{
    Cell, Footprint, NavGrid, ObjectBounds, RegionKind, RoomGrid, SpatialIndex,
};
use std::collections::BTreeSet;

/// Reachability queries against one planned scene.
pub struct PathValidator<'a> {
    index: &'a SpatialIndex,
    objects: &'a [ObjectInstance],
    events: &'a [ScheduledEvent],
    start: Cell,
}

impl<'a> PathValidator<'a> {
    /// Validator for a scene whose performer starts at `performer`.
    pub fn new(
        index: &'a SpatialIndex,
        objects: &'a [ObjectInstance],
        performer: &PerformerStart,
    ) -> Self {
        Self {
            index,
            objects,
            events: &[],
            start: Cell::containing(performer.position),
        }
    }

    /// Attach the scheduled events, for queries at an earlier step.
    pub fn with_events(mut self, events: &'a [ScheduledEvent]) -> Self {
        self.events = events;
        self
    }

    /// Cell the performer starts on.
    pub fn start(&self) -> Cell {
        self.start
    }

    /// Final-state navigation grid, treating the objects in `ignore` as
    /// absent.
    pub fn nav_grid(&self, ignore: &[ObjectId]) -> NavGrid {
        self.nav_grid_at(None, ignore)
    }

    /// Navigation grid as of `step`, or after every event when `None`.
    ///
    /// Platforms and ramps raise the cells under them; an object blocks
    /// a cell only where it overlaps the performer standing there. Wall
    /// pieces around a door leave the doorway open.
    pub fn nav_grid_at(&self, step: Option<Step>, ignore: &[ObjectId]) -> NavGrid {
        let room = *self.index.room();
        let mut nav = NavGrid::from_index(self.index);
        for obj in self.objects.iter().filter(|o| o.kind == ObjectKind::Platform) {
            let bounds = obj.final_bounds();
            let cells = centre_cells(&bounds, &room);
            for &cell in &cells {
                nav.set_height(cell, bounds.max_y);
            }
            if let Some(lips) = &obj.lips {
                add_lips(&mut nav, obj, lips, &cells);
            }
        }
        for obj in self.objects.iter().filter(|o| o.kind == ObjectKind::Ramp) {
            add_ramp(&mut nav, obj);
        }

        let doorways: BTreeSet<Cell> = self
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Door)
            .flat_map(|o| centre_cells(&o.final_bounds(), &room))
            .collect();
        for obj in self.objects.iter().filter(|o| !ignore.contains(&o.id)) {
            let Some(bounds) = self.blocking_bounds(obj, step) else {
                continue;
            };
            for cell in bounds.covered_cells(&room) {
                if obj.kind == ObjectKind::Wall && doorways.contains(&cell) {
                    continue;
                }
                let floor = nav.height(cell).unwrap_or(0.0);
                if bounds.min_y < floor + PERFORMER_HEIGHT && bounds.max_y > floor + EPSILON {
                    nav.block(cell);
                }
            }
        }
        nav
    }

    /// Bounds in which `obj` blocks the performer as of `step`. An object
    /// with an event still running stands where it started, unless a
    /// placer still holds it.
    fn blocking_bounds(&self, obj: &ObjectInstance, step: Option<Step>) -> Option<ObjectBounds> {
        let pending = step.is_some_and(|step| {
            self.events
                .iter()
                .any(|e| (e.object == obj.id || e.subject == Some(obj.id)) && e.end > step)
        });
        if !pending {
            return blocks(obj).then(|| obj.final_bounds());
        }
        let stands = (obj.kind.blocks_navigation() || obj.kind == ObjectKind::Tool)
            && obj.held_by.is_none()
            && obj.contained_in.is_none()
            && !obj.kind.is_mechanism();
        stands.then(|| ObjectBounds::new(obj.position, obj.dimensions, obj.rotation_y))
    }

    /// Whether the performer can walk from `start` to any cell of `goal`
    /// as of `as_of_step`, or once every event has finished when `None`.
    /// Regions in `obstacles` are treated as impassable in addition to
    /// hazards.
    pub fn is_reachable(
        &self,
        start: Cell,
        goal: &[Cell],
        obstacles: &[RegionId],
        as_of_step: Option<Step>,
    ) -> bool {
        let mut nav = self.nav_grid_at(as_of_step, &[]);
        for region in obstacles.iter().filter_map(|r| self.index.region(*r)) {
            for &cell in &region.cells {
                nav.block(cell);
            }
        }
        nav.is_reachable(start, goal)
    }

    /// Cells from which the performer can take `target`: the cells under
    /// it, or under its container, and their four neighbours.
    pub fn approach_cells(&self, target: &ObjectInstance) -> Vec<Cell> {
        let room = self.index.room();
        let anchor = target
            .contained_in
            .and_then(|c| self.objects.iter().find(|o| o.id == c))
            .unwrap_or(target);
        let mut out: Vec<Cell> = anchor
            .final_bounds()
            .covered_cells(room)
            .into_iter()
            .flat_map(|c| std::iter::once(c).chain(c.neighbours4()))
            .filter(|c| room.contains_cell(*c))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Check every requirement.
    ///
    /// # Errors
    ///
    /// [`GenerationError::PathConstraintViolation`] for the first target
    /// that fails its check.
    pub fn validate(&self, checks: &[(ObjectId, PathCheck)]) -> Result<(), GenerationError> {
        for &(id, mode) in checks {
            let Some(target) = self.objects.iter().find(|o| o.id == id) else {
                continue;
            };
            if target.picked_up_by.is_some() {
                continue;
            }
            match mode {
                PathCheck::Off => {}
                PathCheck::Reachable => self.check_reachable(target)?,
                PathCheck::Tools => self.check_tools(target)?,
            }
        }
        Ok(())
    }

    fn check_reachable(&self, target: &ObjectInstance) -> Result<(), GenerationError> {
        let goal = self.approach_cells(target);
        if self.nav_grid(&[]).is_reachable(self.start, &goal) {
            return Ok(());
        }
        Err(violation(target, PathCheck::Reachable, "no path from the performer start"))
    }

    fn check_tools(&self, target: &ObjectInstance) -> Result<(), GenerationError> {
        let goal = self.approach_cells(target);
        let tools: Vec<&ObjectInstance> = self
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Tool && o.tool.is_some())
            .collect();
        if tools.is_empty() {
            return self.check_reachable(target);
        }

        let enclosed = target
            .final_bounds()
            .covered_cells(self.index.room())
            .iter()
            .any(|c| self.index.has_kind_at(*c, RegionKind::Island));
        let direct = self.nav_grid(&[]).is_reachable(self.start, &goal);
        if enclosed && direct {
            return Err(violation(
                target,
                PathCheck::Tools,
                "target on an island is reachable without the tool",
            ));
        }

        let mut push_reachable = false;
        for tool in tools {
            let Some(placement) = tool.tool else { continue };
            let Some(footprint) = Footprint::tool(placement.kind, placement.length)
                .map(|f| f.rotated(placement.quarter_turns))
            else {
                continue;
            };
            let at_rest = self.nav_grid(&[]);
            if !at_rest.is_reachable(self.start, &[footprint.push_cell(placement.origin)]) {
                continue;
            }
            push_reachable = true;
            if direct || self.bridge_reaches(tool.id, &footprint, placement.origin, &goal) {
                return Ok(());
            }
        }
        let reason = if push_reachable {
            "target unreachable with the tool pushed across"
        } else {
            "no tool can be pushed from a reachable cell"
        };
        Err(violation(target, PathCheck::Tools, reason))
    }

    /// Push the tool forward a cell at a time and check whether its cells,
    /// used as a bridge, connect the performer to `goal`.
    fn bridge_reaches(&self, tool: ObjectId, footprint: &Footprint, origin: Cell, goal: &[Cell]) -> bool {
        let room = *self.index.room();
        let base = self.nav_grid(&[tool]);
        let max_steps = room.cols().max(room.rows()) as u32;
        for step in 1..=max_steps {
            let cells = footprint.pushed_cells(origin, step);
            if cells.iter().any(|c| !room.contains_cell(*c)) {
                return false;
            }
            if cells
                .iter()
                .any(|c| !base.is_passable(*c) && self.index.hazard_at(*c).is_none())
            {
                return false;
            }
            let mut nav = base.clone();
            for &cell in &cells {
                nav.unblock(cell);
                nav.set_height(cell, 0.0);
            }
            if nav.is_reachable(self.start, goal) {
                tracing::trace!(%tool, step, "bridge reaches the target");
                return true;
            }
        }
        false
    }
}

/// Whether `obj` blocks the performer once every event has finished.
/// Cells whose centre lies on the floor rectangle of `bounds`.
fn centre_cells(bounds: &ObjectBounds, room: &RoomGrid) -> Vec<Cell> {
    let column = Vec3::new(0.02, 1.0, 0.02);
    bounds
        .covered_cells(room)
        .into_iter()
        .filter(|c| bounds.overlaps_floor(&ObjectBounds::new(c.center(), column, 0.0)))
        .collect()
}

/// Raise the cells under a ramp along its slope and let the performer
/// climb it in the direction it rises.
fn add_ramp(nav: &mut NavGrid, ramp: &ObjectInstance) {
    let bounds = ramp.final_bounds();
    let base = ramp.resting_position();
    let length = ramp.dimensions.z.max(EPSILON);
    let (sin, cos) = ramp.rotation_y.to_radians().sin_cos();
    let (dx, dz) = if sin.abs() >= cos.abs() {
        (sin.signum() as i32, 0)
    } else {
        (0, cos.signum() as i32)
    };
    for cell in centre_cells(&bounds, nav.room()) {
        let c = cell.center();
        let along = (c.x - base.x) * sin + (c.z - base.z) * cos;
        let t = ((along + length / 2.0) / length).clamp(0.0, 1.0);
        nav.set_height(cell, bounds.min_y + t * ramp.dimensions.y);
        nav.allow_climb(cell.offset(-dx, -dz), cell);
        nav.allow_climb(cell, cell.offset(dx, dz));
    }
}

/// Forbid moves across the lipped edges of a platform.
fn add_lips(nav: &mut NavGrid, platform: &ObjectInstance, lips: &PlatformLips, cells: &[Cell]) {
    let base = platform.resting_position();
    let (half_w, half_d) = (platform.dimensions.x / 2.0, platform.dimensions.z / 2.0);
    for &cell in cells {
        for n in cell.neighbours4() {
            if cells.contains(&n) {
                continue;
            }
            let (a, b) = (cell.center(), n.center());
            let edge = Vec3::new((a.x + b.x) / 2.0 - base.x, 0.0, (a.z + b.z) / 2.0 - base.z)
                .rotate_y(-platform.rotation_y);
            let (side, t) = if edge.x.abs() / half_w >= edge.z.abs() / half_d {
                let side = if edge.x > 0.0 { LipSide::Right } else { LipSide::Left };
                (side, (edge.z + half_d) / (2.0 * half_d))
            } else {
                let side = if edge.z > 0.0 { LipSide::Front } else { LipSide::Back };
                (side, (edge.x + half_w) / (2.0 * half_w))
            };
            if !lips.is_open(side, t) {
                nav.forbid(cell, n);
                nav.forbid(n, cell);
            }
        }
    }
}

fn blocks(obj: &ObjectInstance) -> bool {
    (obj.kind.blocks_navigation() || obj.kind == ObjectKind::Tool) && obj.is_free_standing()
}

fn violation(target: &ObjectInstance, mode: PathCheck, reason: &str) -> GenerationError {
    GenerationError::PathConstraintViolation {
        target: target.id,
        mode: mode.name().to_owned(),
        reason: reason.to_owned(),
    }
}
