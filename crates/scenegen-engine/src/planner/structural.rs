//! `StructuralPlacement`: walls, platforms, ramps, doors, floor hazards,
//! tools, occluding walls, moving occluders and placers.

use super::placement::{kind_for, Appearance, FloorRequest, Look};
use super::{with_label, PhaseContext, Pose, SharedValue, PERFORMER_HEIGHT};
use crate::catalog::{
    self, ShapeCategory, ToolShape, DOOR_MATERIALS, LAVA_MATERIAL, MECHANISM_MATERIAL,
    ROOM_MATERIALS, TOOL_HEIGHT, TOOL_MATERIAL, TOOL_MAX_LENGTH, TOOL_MIN_LENGTH,
};
use crate::config::{
    DoorConfig, FloorAreaConfig, MovingOccluderConfig, OccluderOrigin, OccludingWallConfig,
    PlacerConfig, PlatformConfig, RampConfig, SharedObjectConfig, SharedPlacerConfig, ToolConfig,
    Trigger, WallConfig,
};
use crate::sampler::Sampler;
use crate::scene::{DeclarationKey, ObjectInstance, ObjectKind, ToolPlacement};
use crate::schedule::{
    travel_steps, EventKind, EventSpec, EventTrigger, OCCLUDER_SPEED, PLACER_SPEED,
};
use scenegen_core::{
    EventId, GenerationError, Label, ObjectId, OneOf, Randomizable, Step, Vec3,
    VectorRandomizable, Weighted, EPSILON,
};
use scenegen_space::{Cell, Footprint, ObjectBounds, RegionKind, SpatialIndex, ToolKind};
use std::collections::BTreeSet;

/// Thickness of structural and occluding walls.
pub const WALL_THICKNESS: f64 = 0.1;

/// Gap between a held object and the ceiling.
pub const CEILING_GAP: f64 = 0.1;

/// Placer housing dimensions.
pub const PLACER_DIMENSIONS: Vec3 = Vec3::new(0.3, 0.2, 0.3);

/// Label attached to every ramp.
pub const RAMP_LABEL: &str = "ramps";

/// Label attached to every door panel.
pub const DOOR_LABEL: &str = "doors";

/// Door panel width.
pub const DOOR_WIDTH: f64 = 1.0;

/// Door panel height.
pub const DOOR_HEIGHT: f64 = 2.0;

const DEFAULT_PLACER_STEP: (u32, u32) = (1, 10);

/// Free-standing ramp size as fractions of the room's shorter side.
const RAMP_WIDTH_FRACTION: (f64, f64) = (0.05, 0.5);
const RAMP_LENGTH_FRACTION: (f64, f64) = (0.05, 1.0);

const ATTACHED_RAMP_WIDTH: (f64, f64) = (0.5, 1.5);
const ATTACHED_RAMP_LENGTH: (f64, f64) = (0.5, 3.0);

// ── Shared helpers ──────────────────────────────────────────────────

impl PhaseContext<'_> {
    /// Queue an event and return its id.
    pub(crate) fn push_event(
        &mut self,
        object: ObjectId,
        subject: Option<ObjectId>,
        kind: EventKind,
        trigger: EventTrigger,
    ) -> EventId {
        let id = EventId(self.events.len() as u32);
        self.events.push(EventSpec {
            id,
            object,
            subject,
            kind,
            trigger,
        });
        id
    }

    /// Build an event trigger; `step` overrides the configured activation
    /// step when present.
    pub(crate) fn trigger(
        &mut self,
        trigger: Trigger<'_>,
        step: Option<u32>,
        default: &Randomizable<u32>,
    ) -> Result<EventTrigger, GenerationError> {
        let step = match step {
            Some(s) => s,
            None => self.sampler.sample_or(trigger.activation_step, default)?,
        };
        Ok(if !trigger.activate_after.is_empty() {
            EventTrigger::After {
                labels: trigger.activate_after.to_vec(),
                fallback: Step(step),
            }
        } else if !trigger.activate_on_start_or_after.is_empty() {
            EventTrigger::OnStartOrAfter {
                labels: trigger.activate_on_start_or_after.to_vec(),
            }
        } else {
            EventTrigger::Step { step: Step(step) }
        })
    }

    pub(crate) fn room_material(&mut self, configured: Option<&OneOf<String>>) -> Result<String, GenerationError> {
        match configured {
            Some(o) => self.sampler.choose(o),
            None => Ok(self
                .sampler
                .pick(ROOM_MATERIALS)
                .map_or_else(|| ROOM_MATERIALS[0].to_owned(), |m| (*m).to_owned())),
        }
    }
}

/// Cells whose centre lies on the floor rectangle of `bounds`.
pub(crate) fn centre_cells(bounds: &ObjectBounds, index: &SpatialIndex) -> Vec<Cell> {
    let column = Vec3::new(0.02, 1.0, 0.02);
    bounds
        .covered_cells(index.room())
        .into_iter()
        .filter(|c| bounds.overlaps_floor(&ObjectBounds::new(c.center(), column, 0.0)))
        .collect()
}

fn count(ctx: &mut PhaseContext<'_>, num: &Randomizable<u32>) -> Result<u32, GenerationError> {
    ctx.sampler.sample(num)
}

/// Configured rotation snapped to a quarter turn, or a random one.
fn quarter_turn(s: &mut Sampler, rotation: Option<&Randomizable<f64>>) -> Result<f64, GenerationError> {
    let turns = match rotation {
        Some(r) => (s.sample(r)? / 90.0).round().rem_euclid(4.0),
        None => f64::from(s.int(0, 3)),
    };
    Ok(turns * 90.0)
}

// ── Walls and platforms ─────────────────────────────────────────────

pub(super) fn walls(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &WallConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    let room_height = f64::from(ctx.room.grid.height());
    for i in 0..n {
        let width = ctx.sampler.sample(&c.width)?;
        let height = match &c.height {
            Some(h) => ctx.sampler.sample(h)?.min(room_height),
            None => room_height,
        };
        let dims = Vec3::new(width, height, WALL_THICKNESS);
        let material = ctx.room_material(c.material.as_ref())?;
        let what = format!("{key} wall {i}");
        let pose = ctx.floor_pose(&FloorRequest {
            what: &what,
            dimensions: dims,
            position: c.position.as_ref(),
            rotation: c.rotation_y.as_ref(),
            distance_from_performer: None,
        })?;
        let obj = ObjectInstance::new(ObjectId(0), ObjectKind::Wall, "structural_wall", key.clone())
            .at(pose.position, pose.rotation_y)
            .sized(dims, dims)
            .with_material(material);
        ctx.commit(obj, &c.labels);
    }
    Ok(())
}

pub(super) fn platforms(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &PlatformConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    for i in 0..n {
        let dims = match &c.scale {
            Some(scale) => scale.sample(ctx.sampler.rng())?,
            None => Vec3::new(
                ctx.sampler.uniform(1.0, 3.0),
                ctx.sampler.uniform(0.25, 1.5),
                ctx.sampler.uniform(1.0, 3.0),
            ),
        };
        let material = ctx.room_material(c.material.as_ref())?;
        let what = format!("{key} platform {i}");
        let pose = ctx.floor_pose(&FloorRequest {
            what: &what,
            dimensions: dims,
            position: c.position.as_ref(),
            rotation: c.rotation_y.as_ref(),
            distance_from_performer: None,
        })?;
        let ramps = ctx.sampler.sample(&c.attached_ramps)?;
        let id = add_platform(ctx, key, pose.position, pose.rotation_y, dims, material, &c.labels)?;
        for r in 0..ramps {
            attach_ramp(ctx, key, id, &format!("{what} ramp {r}"))?;
        }
    }
    Ok(())
}

/// Commit a platform and its top-surface region.
pub(crate) fn add_platform(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    position: Vec3,
    rotation_y: f64,
    dims: Vec3,
    material: String,
    labels: &[Label],
) -> Result<ObjectId, GenerationError> {
    let obj = ObjectInstance::new(ObjectId(0), ObjectKind::Platform, "structural_platform", key.clone())
        .at(position, rotation_y)
        .sized(dims, dims)
        .with_material(material.clone());
    let cells = centre_cells(&obj.bounds(), &ctx.index);
    let id = ctx.commit(obj, labels);
    if !cells.is_empty() {
        let region = ctx
            .index
            .add_region(RegionKind::Platform, cells)
            .map_err(|e| GenerationError::PlacementExhausted {
                what: format!("{key} platform region ({e})"),
                tries: 1,
            })?;
        ctx.region_materials.insert(region, material);
    }
    Ok(id)
}

// ── Ramps ───────────────────────────────────────────────────────────

fn ramp_object(key: &DeclarationKey, pose: Pose, dims: Vec3, material: String) -> ObjectInstance {
    ObjectInstance::new(ObjectId(0), ObjectKind::Ramp, "structural_ramp", key.clone())
        .at(pose.position, pose.rotation_y)
        .sized(dims, dims)
        .with_material(material)
}

pub(super) fn ramps(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &RampConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    let room = ctx.room.grid;
    let min_dim = f64::from(room.width().min(room.depth()));
    let headroom = f64::from(room.height()) - PERFORMER_HEIGHT;
    let labels = with_label(&c.labels, RAMP_LABEL);
    for i in 0..n {
        let slope = ctx.sampler.sample(&c.angle)?.to_radians().tan();
        let width = match &c.width {
            Some(w) => ctx.sampler.sample(w)?,
            None => ctx.sampler.uniform(
                min_dim * RAMP_WIDTH_FRACTION.0,
                min_dim * RAMP_WIDTH_FRACTION.1,
            ),
        };
        let length = match &c.length {
            Some(l) => ctx.sampler.sample(l)?,
            None => {
                let lo = min_dim * RAMP_LENGTH_FRACTION.0;
                let hi = (min_dim * RAMP_LENGTH_FRACTION.1).min(headroom / slope);
                ctx.sampler.uniform(lo, hi.max(lo))
            }
        };
        let height = length * slope;
        let what = format!("{key} ramp {i}");
        if height > headroom + EPSILON {
            return Err(GenerationError::PlacementExhausted {
                what: format!("{what}: top leaves no headroom"),
                tries: 1,
            });
        }
        let material = ctx.room_material(c.material.as_ref())?;
        let rotation = Randomizable::Fixed(quarter_turn(&mut ctx.sampler, c.rotation_y.as_ref())?);
        let dims = Vec3::new(width, height, length);
        let pose = ctx.floor_pose(&FloorRequest {
            what: &what,
            dimensions: dims,
            position: c.position.as_ref(),
            rotation: Some(&rotation),
            distance_from_performer: None,
        })?;
        ctx.commit(ramp_object(key, pose, dims, material), &labels);
    }
    Ok(())
}

/// Add a ramp flush against one side of `platform`, rising to its top.
fn attach_ramp(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    platform: ObjectId,
    what: &str,
) -> Result<ObjectId, GenerationError> {
    let (base, rotation_y, dims, material) = {
        let p = ctx.require(platform)?;
        (p.position, p.rotation_y, p.dimensions, p.material.clone())
    };
    let top = base.y + dims.y;
    let material = match material {
        Some(m) => m,
        None => ctx.room_material(None)?,
    };
    let index = &ctx.index;
    let (pose, ramp_dims) = ctx.sampler.retry(what, |s| {
        // (local direction of the side, platform extent across it, side length)
        let (ux, uz, extent, span) = match s.int(0, 3) {
            0 => (-1.0, 0.0, dims.x, dims.z),
            1 => (1.0, 0.0, dims.x, dims.z),
            2 => (0.0, -1.0, dims.z, dims.x),
            _ => (0.0, 1.0, dims.z, dims.x),
        };
        let width = s.uniform(
            ATTACHED_RAMP_WIDTH.0,
            ATTACHED_RAMP_WIDTH.1.min(span).max(ATTACHED_RAMP_WIDTH.0),
        );
        // No steeper than 45 degrees.
        let shortest = top.max(ATTACHED_RAMP_LENGTH.0);
        let length = s.uniform(shortest, ATTACHED_RAMP_LENGTH.1.max(shortest));
        let reach = (extent + length) / 2.0;
        let offset = Vec3::new(ux * reach, 0.0, uz * reach).rotate_y(rotation_y);
        let position = Vec3::new(base.x + offset.x, 0.0, base.z + offset.z);
        let facing = rotation_y + f64::atan2(-ux, -uz).to_degrees();
        let ramp_dims = Vec3::new(width, top, length);
        let bounds = ObjectBounds::new(position, ramp_dims, facing);
        (bounds.is_within_room(index.room()) && index.collision(&bounds, &[]).is_none()).then_some((
            Pose {
                position,
                rotation_y: facing,
            },
            ramp_dims,
        ))
    })?;
    let id = ctx.commit(ramp_object(key, pose, ramp_dims, material), &[Label::from(RAMP_LABEL)]);
    tracing::trace!(%platform, ramp = %id, "ramp attached");
    Ok(id)
}

// ── Doors ───────────────────────────────────────────────────────────

/// Door and wall materials shared by every door of one declaration.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DoorLook {
    pub door: String,
    pub wall: String,
}

fn pick_other(s: &mut Sampler, pool: &[&str], avoid: &str) -> Result<String, GenerationError> {
    let options: Vec<&str> = pool.iter().copied().filter(|m| *m != avoid).collect();
    s.pick(&options)
        .map(|m| (*m).to_owned())
        .ok_or_else(|| GenerationError::config("materials", format!("nothing differs from `{avoid}`")))
}

/// Draw door and wall materials. Unless both are configured, the wall
/// never shares the door's material.
pub(crate) fn door_look(
    s: &mut Sampler,
    door: Option<&OneOf<String>>,
    wall: Option<&OneOf<String>>,
) -> Result<DoorLook, GenerationError> {
    if let Some(w) = wall {
        let wall = s.choose(w)?;
        let door = match door {
            Some(d) => s.choose(d)?,
            None => pick_other(s, DOOR_MATERIALS, &wall)?,
        };
        return Ok(DoorLook { door, wall });
    }
    let door = match door {
        Some(d) => s.choose(d)?,
        None => pick_other(s, DOOR_MATERIALS, "")?,
    };
    let wall = pick_other(s, ROOM_MATERIALS, &door)?;
    Ok(DoorLook { door, wall })
}

/// Commit a door panel centred in a wall of `wall.x` by `wall.y` whose
/// bottom centre is `base`. When `raise` is positive every piece starts
/// that much higher and rests at its place once dropped. Returns the
/// door panel first, then the wall pieces.
#[allow(clippy::too_many_arguments)]
pub(crate) fn add_door(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    base: Vec3,
    rotation_y: f64,
    wall: Vec3,
    look: &DoorLook,
    labels: &[Label],
    raise: f64,
) -> Vec<ObjectId> {
    let side = (wall.x - DOOR_WIDTH) / 2.0;
    let mut pieces = vec![(
        ObjectKind::Door,
        "door",
        Vec3::ZERO,
        Vec3::new(DOOR_WIDTH, DOOR_HEIGHT, WALL_THICKNESS),
    )];
    if side > EPSILON {
        let offset = (DOOR_WIDTH + side) / 2.0;
        let dims = Vec3::new(side, wall.y, WALL_THICKNESS);
        pieces.push((ObjectKind::Wall, "door_wall", Vec3::new(-offset, 0.0, 0.0), dims));
        pieces.push((ObjectKind::Wall, "door_wall", Vec3::new(offset, 0.0, 0.0), dims));
    }
    if wall.y > DOOR_HEIGHT + EPSILON {
        pieces.push((
            ObjectKind::Wall,
            "door_wall",
            Vec3::new(0.0, DOOR_HEIGHT, 0.0),
            Vec3::new(DOOR_WIDTH, wall.y - DOOR_HEIGHT, WALL_THICKNESS),
        ));
    }

    let door_labels = with_label(labels, DOOR_LABEL);
    let mut ids = Vec::with_capacity(pieces.len());
    for (kind, shape, local, dims) in pieces {
        let r = local.rotate_y(rotation_y);
        let rest = Vec3::new(base.x + r.x, base.y + local.y, base.z + r.z);
        let material = if kind == ObjectKind::Door { &look.door } else { &look.wall };
        let mut obj = ObjectInstance::new(ObjectId(0), kind, shape, key.clone())
            .at(Vec3::new(rest.x, rest.y + raise, rest.z), rotation_y)
            .sized(dims, dims)
            .with_material(material.clone());
        if raise > 0.0 {
            obj.final_position = Some(rest);
        }
        let piece_labels: &[Label] = if kind == ObjectKind::Door { &door_labels } else { &[] };
        ids.push(ctx.commit(obj, piece_labels));
    }
    ids
}

pub(super) fn doors(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &DoorConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    let room = ctx.room.grid;
    let room_height = f64::from(room.height());
    let look = door_look(&mut ctx.sampler, c.material.as_ref(), c.wall_material.as_ref())?;
    for i in 0..n {
        let rotation_y = quarter_turn(&mut ctx.sampler, c.rotation_y.as_ref())?;
        let along = if (rotation_y / 90.0).round() as i64 % 2 == 0 {
            room.width()
        } else {
            room.depth()
        };
        let width = match &c.wall_scale_x {
            Some(x) => ctx.sampler.sample(x)?,
            None => f64::from(ctx.sampler.int(2, along.max(2) as i32)),
        };
        let height = match &c.wall_scale_y {
            Some(y) => ctx.sampler.sample(y)?,
            None => f64::from(ctx.sampler.int(2, room.height().max(2) as i32)),
        };
        let mut wall = Vec3::new(
            width.max(DOOR_WIDTH),
            height.max(DOOR_HEIGHT).min(room_height),
            WALL_THICKNESS,
        );
        let what = format!("{key} door {i}");
        let fixed = Randomizable::Fixed(rotation_y);
        let pose = ctx.floor_pose(&FloorRequest {
            what: &what,
            dimensions: wall,
            position: c.position.as_ref(),
            rotation: Some(&fixed),
            distance_from_performer: None,
        })?;
        wall.y = wall.y.min(room_height - pose.position.y);
        if wall.y < DOOR_HEIGHT - EPSILON {
            return Err(GenerationError::PlacementExhausted {
                what: format!("{what}: no room for the door under the ceiling"),
                tries: 1,
            });
        }
        add_door(ctx, key, pose.position, rotation_y, wall, &look, &c.labels, 0.0);
    }
    Ok(())
}

// ── Lava and holes ──────────────────────────────────────────────────

fn grow_area(
    s: &mut Sampler,
    index: &SpatialIndex,
    seed: Cell,
    size: u32,
    blocked: &BTreeSet<Cell>,
) -> Option<Vec<Cell>> {
    let ok = |c: Cell| {
        index.room().contains_cell(c) && !blocked.contains(&c) && !index.cell_occupied(c)
    };
    if !ok(seed) {
        return None;
    }
    let mut cells = vec![seed];
    while cells.len() < size as usize {
        let mut frontier: Vec<Cell> = cells
            .iter()
            .flat_map(|c| c.neighbours4())
            .filter(|c| !cells.contains(c) && ok(*c))
            .collect();
        frontier.sort();
        frontier.dedup();
        cells.push(*s.pick(&frontier)?);
    }
    Some(cells)
}

pub(super) fn floor_areas(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &FloorAreaConfig,
    kind: RegionKind,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    for i in 0..n {
        let size = ctx.sampler.sample(&c.size)?.max(1);
        let index = &ctx.index;
        let mut blocked = index.cells_of(&[
            RegionKind::Lava,
            RegionKind::Hole,
            RegionKind::Island,
            RegionKind::Walkway,
            RegionKind::Platform,
        ]);
        blocked.insert(Cell::containing(ctx.room.performer.position));
        let free = index.find_free_cells(
            &[
                RegionKind::Lava,
                RegionKind::Hole,
                RegionKind::Island,
                RegionKind::Walkway,
                RegionKind::Platform,
            ],
            1,
        );
        let what = format!("{key} area {i}");
        let cells = ctx.sampler.retry(&what, |s| {
            let x = match &c.position_x {
                Some(x) => Some(s.sample(x).ok()?),
                None => None,
            };
            let z = match &c.position_z {
                Some(z) => Some(s.sample(z).ok()?),
                None => None,
            };
            let seed = match (x, z) {
                (Some(x), Some(z)) => Cell::new(x, z),
                _ => {
                    let pool: Vec<Cell> = free
                        .iter()
                        .copied()
                        .filter(|cell| x.is_none_or(|x| cell.x == x) && z.is_none_or(|z| cell.z == z))
                        .collect();
                    *s.pick(&pool)?
                }
            };
            grow_area(s, index, seed, size, &blocked)
        })?;
        let region = ctx.index.add_region(kind, cells).map_err(|e| {
            GenerationError::PlacementExhausted {
                what: format!("{what} ({e})"),
                tries: 1,
            }
        })?;
        if kind == RegionKind::Lava {
            ctx.region_materials.insert(region, LAVA_MATERIAL.to_owned());
        }
        tracing::trace!(%region, ?kind, size, "floor area added");
    }
    Ok(())
}

// ── Tools ───────────────────────────────────────────────────────────

/// Resolve a configured tool shape: a full tool name, or a kind name
/// with a random width and length.
pub(crate) fn draw_tool_shape(
    s: &mut Sampler,
    options: Option<&OneOf<String>>,
    max_length: u32,
) -> Result<ToolShape, GenerationError> {
    let max_length = max_length.clamp(TOOL_MIN_LENGTH, TOOL_MAX_LENGTH);
    let name = match options {
        Some(o) => s.choose(o)?,
        None => s
            .pick(&ToolKind::ALL)
            .map(|k| k.name().to_owned())
            .unwrap_or_default(),
    };
    if let Some(exact) = ToolShape::parse(&name) {
        return Ok(exact);
    }
    let kind = ToolKind::ALL
        .into_iter()
        .find(|k| k.name() == name)
        .ok_or_else(|| GenerationError::config("tools", format!("unknown tool shape `{name}`")))?;
    let length = s.int(TOOL_MIN_LENGTH as i32, max_length as i32) as u32;
    let widths = ToolShape::with_length(kind, length);
    s.pick(&widths)
        .copied()
        .ok_or_else(|| GenerationError::config("tools", "no tool widths"))
}

/// Unpositioned tool object whose near end sits on `origin`.
pub(crate) fn tool_object(
    key: &DeclarationKey,
    shape: ToolShape,
    quarter_turns: u8,
    origin: Cell,
) -> Option<(ObjectInstance, Footprint)> {
    let footprint = Footprint::tool(shape.kind, shape.length)?.rotated(quarter_turns);
    let far = footprint.far_end(origin);
    let centre = Vec3::new(
        f64::from(origin.x + far.x) / 2.0,
        0.0,
        f64::from(origin.z + far.z) / 2.0,
    );
    let dims = shape.dimensions();
    let mut obj = ObjectInstance::new(ObjectId(0), ObjectKind::Tool, shape.name(), key.clone())
        .at(centre, footprint.rotation_degrees())
        .sized(Vec3::splat(1.0), dims)
        .with_material(TOOL_MATERIAL);
    obj.tool = Some(ToolPlacement {
        kind: shape.kind,
        length: shape.length,
        quarter_turns: quarter_turns % 4,
        origin,
    });
    Some((obj, footprint))
}

/// Whether every cell of the footprint is in the room, hazard-free and
/// unoccupied.
pub(crate) fn footprint_is_free(index: &SpatialIndex, footprint: &Footprint, origin: Cell) -> bool {
    footprint.world_cells(origin).into_iter().all(|c| {
        index.room().contains_cell(c) && index.hazard_at(c).is_none() && !index.cell_occupied(c)
    })
}

/// Commit a tool and occupy every cell of its footprint.
pub(crate) fn commit_tool(
    ctx: &mut PhaseContext<'_>,
    obj: ObjectInstance,
    footprint: &Footprint,
    labels: &[Label],
) -> ObjectId {
    let origin = obj.tool.map(|t| t.origin);
    let id = ctx.commit(obj, labels);
    if let Some(origin) = origin {
        for cell in footprint.world_cells(origin) {
            ctx.index.insert_object(id, ObjectBounds::of_cell(cell, TOOL_HEIGHT));
        }
    }
    id
}

pub(super) fn tools(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &ToolConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    let room = ctx.room.grid;
    let max_length = room.cols().max(room.rows()) as u32;
    for i in 0..n {
        let shape = draw_tool_shape(&mut ctx.sampler, c.shape.as_ref(), max_length)?;
        let what = format!("{key} tool {i}");
        let index = &ctx.index;
        let cells: Vec<Cell> = room.cells().collect();
        let (obj, footprint) = ctx.sampler.retry(&what, |s| {
            let turns = match &c.rotation_y {
                Some(r) => ((s.sample(r).ok()? / 90.0).round().rem_euclid(4.0)) as u8,
                None => s.int(0, 3) as u8,
            };
            let origin = match &c.position {
                Some(p) => {
                    let fixed = p.sample(s.rng()).ok()?;
                    let x = fixed.x.unwrap_or_else(|| f64::from(s.int(-room.max_cell_x(), room.max_cell_x())));
                    let z = fixed.z.unwrap_or_else(|| f64::from(s.int(-room.max_cell_z(), room.max_cell_z())));
                    Cell::containing(Vec3::new(x, 0.0, z))
                }
                None => *s.pick(&cells)?,
            };
            let (obj, footprint) = tool_object(key, shape, turns, origin)?;
            (footprint_is_free(index, &footprint, origin) && index.is_free(&obj.bounds()))
                .then_some((obj, footprint))
        })?;
        commit_tool(ctx, obj, &footprint, &c.labels);
    }
    Ok(())
}

// ── Occluding walls ─────────────────────────────────────────────────

pub(super) fn occluding_walls(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &OccludingWallConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    let target = match &c.target_label {
        Some(label) => {
            let id = ctx.resolve_one(label)?;
            Some(ctx.require(id)?.clone())
        }
        None => None,
    };
    let performer = ctx.room.performer;
    for i in 0..n {
        let margin = ctx.sampler.sample(&c.width_margin)?;
        let height = ctx.sampler.sample(&c.height)?;
        let material = ctx.room_material(None)?;
        let what = format!("{key} occluding wall {i}");
        let index = &ctx.index;
        let far = ctx.room.grid.diagonal() / 2.0;
        let pose = ctx.sampler.retry(&what, |s| {
            let (anchor, width) = match &target {
                Some(t) => (t.position, t.dimensions.x.max(t.dimensions.z) + margin),
                None => {
                    let a = (performer.rotation_y + s.uniform(-30.0, 30.0)).to_radians();
                    let d = s.uniform(1.5, far);
                    (
                        Vec3::new(
                            performer.position.x + a.sin() * d,
                            0.0,
                            performer.position.z + a.cos() * d,
                        ),
                        1.0 + margin,
                    )
                }
            };
            let dx = anchor.x - performer.position.x;
            let dz = anchor.z - performer.position.z;
            let t = s.uniform(0.3, 0.7);
            let position = Vec3::new(
                performer.position.x + dx * t,
                0.0,
                performer.position.z + dz * t,
            );
            let rotation_y = dx.atan2(dz).to_degrees();
            let dims = Vec3::new(width, height, WALL_THICKNESS);
            index
                .is_free(&ObjectBounds::new(position, dims, rotation_y))
                .then_some((position, rotation_y, dims))
        })?;
        let (position, rotation_y, dims) = pose;
        let obj = ObjectInstance::new(ObjectId(0), ObjectKind::Wall, "occluding_wall", key.clone())
            .at(position, rotation_y)
            .sized(dims, dims)
            .with_material(material);
        ctx.commit(obj, &c.labels);
    }
    Ok(())
}

// ── Moving occluders ────────────────────────────────────────────────

fn default_origin() -> OneOf<OccluderOrigin> {
    OneOf::Weighted(Weighted {
        options: vec![
            OccluderOrigin::Top,
            OccluderOrigin::Front,
            OccluderOrigin::Back,
            OccluderOrigin::Left,
            OccluderOrigin::Right,
        ],
        weights: vec![0.5, 0.125, 0.125, 0.125, 0.125],
    })
}

pub(super) fn moving_occluders(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &MovingOccluderConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    let room_height = f64::from(ctx.room.grid.height());
    let position = VectorRandomizable {
        x: c.position_x.clone(),
        y: None,
        z: c.position_z.clone(),
    };
    let materials = catalog::lookup("occluder_screen").map_or(&[][..], |d| d.materials);
    for i in 0..n {
        let dims = Vec3::new(
            ctx.sampler.sample(&c.occluder_width)?,
            ctx.sampler.sample(&c.occluder_height)?.min(room_height - CEILING_GAP),
            ctx.sampler.sample(&c.occluder_thickness)?,
        );
        let origin = ctx
            .sampler
            .choose(c.origin.as_ref().unwrap_or(&default_origin()))?;
        let down_only = ctx.sampler.choose(&c.move_down_only)?;
        let repeat = ctx.sampler.choose(&c.repeat_movement)?;
        let interval = ctx.sampler.sample(&c.repeat_interval)?;
        let what = format!("{key} moving occluder {i}");
        let pose = ctx.floor_pose(&FloorRequest {
            what: &what,
            dimensions: dims,
            position: Some(&position),
            rotation: c.rotation_y.as_ref(),
            distance_from_performer: None,
        })?;
        let material = ctx
            .sampler
            .pick(materials)
            .map(|m| (*m).to_owned())
            .unwrap_or_else(|| MECHANISM_MATERIAL.to_owned());

        let mut obj = ObjectInstance::new(ObjectId(0), ObjectKind::MovingOccluder, "moving_occluder", key.clone())
            .sized(dims, dims)
            .with_material(material);
        obj.pole_origin = Some(origin);
        let kind = if down_only {
            let raised = room_height - dims.y - CEILING_GAP;
            obj = obj.at(Vec3::new(pose.position.x, raised, pose.position.z), pose.rotation_y);
            obj.final_position = Some(pose.position);
            EventKind::OccluderDescend {
                travel_steps: travel_steps(raised, OCCLUDER_SPEED),
            }
        } else {
            obj = obj.at(pose.position, pose.rotation_y);
            EventKind::OccluderCycle {
                repeat_interval: repeat.then_some(interval),
            }
        };
        let id = ctx.commit(obj, &c.labels);
        let trigger = ctx.trigger(c.trigger(), None, &Randomizable::Fixed(1))?;
        ctx.push_event(id, None, kind, trigger);
    }
    Ok(())
}

// ── Placers ─────────────────────────────────────────────────────────

fn placer_object(key: &DeclarationKey, x: f64, z: f64, room_height: f64) -> ObjectInstance {
    ObjectInstance::new(ObjectId(0), ObjectKind::Placer, "placer", key.clone())
        .at(
            Vec3::new(x, room_height - PLACER_DIMENSIONS.y, z),
            0.0,
        )
        .sized(Vec3::splat(1.0), PLACER_DIMENSIONS)
        .with_material(MECHANISM_MATERIAL)
}

/// Objects a pickup placer may take: free-standing, unheld, unclaimed.
fn pickup_candidates(ctx: &PhaseContext<'_>, labels: &[Label]) -> Result<Vec<ObjectId>, GenerationError> {
    let mut out = Vec::new();
    for label in labels {
        for id in ctx.resolve_all(label)? {
            let Some(obj) = ctx.object(id) else { continue };
            if obj.is_free_standing()
                && obj.held_by.is_none()
                && !ctx.claimed.contains(&id)
                && !out.contains(&id)
            {
                out.push(id);
            }
        }
    }
    Ok(out)
}

pub(super) fn placers(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &PlacerConfig,
) -> Result<(), GenerationError> {
    let n = count(ctx, &c.num)?;
    let shared = c.randomize_once.clone().unwrap_or_default();
    let default_step = Randomizable::range(DEFAULT_PLACER_STEP.0, DEFAULT_PLACER_STEP.1);
    for i in 0..n {
        let pickup = match &shared.pickup_object {
            Some(opts) => ctx.decide(
                key,
                "pickup_object",
                true,
                |s| s.choose(opts),
                SharedValue::Flag,
                |v| match v {
                    SharedValue::Flag(b) => Some(*b),
                    _ => None,
                },
            )?,
            None => ctx.sampler.choose(&c.pickup_object)?,
        };
        let step = match &shared.activation_step {
            Some(r) => Some(ctx.decide(
                key,
                "activation_step",
                true,
                |s| s.sample(r),
                SharedValue::Step,
                |v| match v {
                    SharedValue::Step(n) => Some(*n),
                    _ => None,
                },
            )?),
            None => None,
        };
        let trigger = ctx.trigger(c.trigger(), step, &default_step)?;
        let what = format!("{key} placer {i}");

        if c.empty_placer {
            empty_placer(ctx, key, c, &what, trigger)?;
        } else if pickup {
            pickup_placer(ctx, key, c, &what, trigger)?;
        } else {
            place_placer(ctx, key, c, &shared, &what, trigger)?;
        }
    }
    Ok(())
}

fn empty_placer(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &PlacerConfig,
    what: &str,
    trigger: EventTrigger,
) -> Result<(), GenerationError> {
    let room_height = f64::from(ctx.room.grid.height());
    let pose = ctx.floor_pose(&FloorRequest {
        what,
        dimensions: PLACER_DIMENSIONS,
        position: c.placed_object_position.as_ref(),
        rotation: Some(&Randomizable::Fixed(0.0)),
        distance_from_performer: None,
    })?;
    let end = ctx.sampler.sample(&c.end_height)?;
    let placer = placer_object(key, pose.position.x, pose.position.z, room_height);
    let id = ctx.commit(placer, &c.labels);
    let travel = travel_steps(room_height - PLACER_DIMENSIONS.y - end, PLACER_SPEED);
    ctx.push_event(id, None, EventKind::Empty { travel_steps: travel }, trigger);
    Ok(())
}

/// Hang a new placer above `target` and queue the pickup.
pub(crate) fn hang_and_pick(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    target: ObjectId,
    trigger: EventTrigger,
    labels: &[Label],
) -> Result<ObjectId, GenerationError> {
    let room_height = f64::from(ctx.room.grid.height());
    let (x, z, top) = {
        let t = ctx.require(target)?;
        let p = t.resting_position();
        (p.x, p.z, p.y + t.dimensions.y)
    };
    let placer = placer_object(key, x, z, room_height);
    let id = ctx.commit(placer, labels);
    ctx.index.remove_object(target);
    if let Some(t) = ctx.object_mut(target) {
        t.picked_up_by = Some(id);
    }
    ctx.claimed.push(target);
    if let Some(sides) = ctx.forced_choice.as_mut() {
        sides.removed.push(target);
    }
    let travel = travel_steps(room_height - PLACER_DIMENSIONS.y - top, PLACER_SPEED);
    ctx.push_event(id, Some(target), EventKind::Pickup { travel_steps: travel }, trigger);
    Ok(id)
}

/// Hang `appearance` from a new placer above `rest` and queue its
/// release. Returns the placer and the placed object.
#[allow(clippy::too_many_arguments)]
pub(crate) fn hang_and_place(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    appearance: &Appearance,
    rest: Pose,
    trigger: EventTrigger,
    deactivation_step: Option<Step>,
    placer_labels: &[Label],
    object_labels: &[Label],
) -> Result<(ObjectId, ObjectId), GenerationError> {
    let room_height = f64::from(ctx.room.grid.height());
    let held_y = room_height - PLACER_DIMENSIONS.y - appearance.dimensions.y - CEILING_GAP;
    if held_y < rest.position.y {
        return Err(GenerationError::PlacementExhausted {
            what: format!("{key}: object too tall to hang from the ceiling"),
            tries: 1,
        });
    }
    let placer = placer_object(key, rest.position.x, rest.position.z, room_height);
    let placer_id = ctx.commit(placer, placer_labels);

    let mut obj = appearance.instance(kind_for(appearance.category), key).at(
        Vec3::new(rest.position.x, held_y, rest.position.z),
        rest.rotation_y,
    );
    obj.final_position = Some(rest.position);
    obj.held_by = Some(placer_id);
    let object_id = ctx.commit(obj, object_labels);

    let travel = travel_steps(held_y - rest.position.y, PLACER_SPEED);
    ctx.push_event(
        placer_id,
        Some(object_id),
        EventKind::Place {
            travel_steps: travel,
            deactivation_step,
        },
        trigger,
    );
    Ok((placer_id, object_id))
}

fn pickup_placer(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &PlacerConfig,
    what: &str,
    trigger: EventTrigger,
) -> Result<(), GenerationError> {
    let candidates = pickup_candidates(ctx, &c.placed_object_labels)?;
    let target = *ctx
        .sampler
        .pick(&candidates)
        .ok_or_else(|| GenerationError::PlacementExhausted {
            what: format!("{what}: no object left to pick up"),
            tries: 0,
        })?;
    hang_and_pick(ctx, key, target, trigger, &c.labels)?;
    Ok(())
}

fn place_placer(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &PlacerConfig,
    shared: &SharedPlacerConfig,
    what: &str,
    trigger: EventTrigger,
) -> Result<(), GenerationError> {
    let shared_look = SharedObjectConfig {
        shape: shared.placed_object_shape.clone(),
        scale: shared.placed_object_scale.clone(),
        material: None,
        rotation_y: None,
    };
    let look = Look {
        shape: c.placed_object_shape.as_ref(),
        scale: c.placed_object_scale.as_ref(),
        material: c.placed_object_material.as_ref(),
        shared: Some(&shared_look),
    };
    let appearance = ctx.appearance(key, look, ShapeCategory::Pickupable)?;
    let dims = appearance.dimensions;

    let end_height = ctx.sampler.sample(&c.end_height)?;
    let floor_y = match &c.end_height_relative_object_label {
        Some(label) => {
            let id = ctx.resolve_one(label)?;
            let r = ctx.require(id)?;
            r.resting_position().y + r.dimensions.y + end_height
        }
        None => end_height,
    };

    let rest = match &c.placed_object_above {
        Some(label) => {
            let id = ctx.resolve_one(label)?;
            let r = ctx.require(id)?;
            let p = r.resting_position();
            let position = Vec3::new(p.x, p.y + r.dimensions.y, p.z);
            let rotation_y = ctx.sampler.rotation();
            if ctx
                .index
                .collision(&ObjectBounds::new(position, dims, rotation_y), &[])
                .is_some()
            {
                return Err(GenerationError::PlacementExhausted {
                    what: what.to_owned(),
                    tries: 1,
                });
            }
            Pose {
                position,
                rotation_y,
            }
        }
        None => {
            let mut pose = ctx.floor_pose(&FloorRequest {
                what,
                dimensions: dims,
                position: c.placed_object_position.as_ref(),
                rotation: None,
                distance_from_performer: None,
            })?;
            pose.position.y = floor_y;
            pose
        }
    };

    let deactivation_step = match &c.deactivation_step {
        Some(r) => Some(Step(ctx.sampler.sample(r)?)),
        None => None,
    };
    hang_and_place(
        ctx,
        key,
        &appearance,
        rest,
        trigger,
        deactivation_step,
        &c.labels,
        &c.placed_object_labels,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::room;
    use super::*;
    use crate::config::{GenerationOptions, ScenarioConfig};
    use scenegen_space::RoomGrid;

    fn context(json: &str, seed: u64) -> PhaseContext<'static> {
        let cfg: &'static ScenarioConfig =
            Box::leak(Box::new(ScenarioConfig::from_json_str(json).unwrap()));
        let opts: &'static GenerationOptions = Box::leak(Box::default());
        room::init(cfg, opts, Sampler::new(seed, 100)).unwrap()
    }

    #[test]
    fn kind_names_draw_in_range_tools() {
        let mut s = Sampler::new(5, 50);
        let opts = OneOf::Fixed("hooked".to_owned());
        for _ in 0..20 {
            let t = draw_tool_shape(&mut s, Some(&opts), 6).unwrap();
            assert_eq!(t.kind, ToolKind::Hooked);
            assert!((TOOL_MIN_LENGTH..=6).contains(&t.length));
        }
    }

    #[test]
    fn exact_tool_names_are_kept() {
        let mut s = Sampler::new(5, 50);
        let opts = OneOf::Fixed("tool_rect_1_00_x_4_00".to_owned());
        let t = draw_tool_shape(&mut s, Some(&opts), 10).unwrap();
        assert_eq!((t.kind, t.length), (ToolKind::Rect, 4));
    }

    #[test]
    fn unknown_tool_names_are_configuration_errors() {
        let mut s = Sampler::new(5, 50);
        let opts = OneOf::Fixed("spoon".to_owned());
        assert!(matches!(
            draw_tool_shape(&mut s, Some(&opts), 10),
            Err(GenerationError::Configuration { .. })
        ));
    }

    #[test]
    fn tool_bar_is_centred_between_its_ends() {
        let shape = ToolShape {
            kind: ToolKind::Rect,
            width: 1.0,
            length: 5,
        };
        let key = DeclarationKey::new("tools", 0);
        let (obj, footprint) = tool_object(&key, shape, 1, Cell::new(-2, 0)).unwrap();
        assert_eq!(footprint.far_end(Cell::new(-2, 0)), Cell::new(2, 0));
        assert!(obj.position.approx_eq(Vec3::ZERO));
        assert_eq!(obj.rotation_y, 90.0);
        let cells = obj.bounds().covered_cells(&RoomGrid::new(9, 3, 9).unwrap());
        for c in footprint.world_cells(Cell::new(-2, 0)) {
            assert!(cells.contains(&c));
        }
    }

    #[test]
    fn grown_areas_are_contiguous() {
        let index = SpatialIndex::new(RoomGrid::new(9, 3, 9).unwrap());
        let mut s = Sampler::new(11, 50);
        let cells = grow_area(&mut s, &index, Cell::new(0, 0), 6, &BTreeSet::new()).unwrap();
        assert_eq!(cells.len(), 6);
        for c in &cells[1..] {
            assert!(cells.iter().any(|o| o.manhattan(*c) == 1));
        }
    }

    #[test]
    fn growth_stops_at_blocked_cells() {
        let index = SpatialIndex::new(RoomGrid::new(3, 3, 3).unwrap());
        let mut s = Sampler::new(1, 50);
        let blocked: BTreeSet<Cell> = index.room().cells().filter(|c| *c != Cell::new(0, 0)).collect();
        assert!(grow_area(&mut s, &index, Cell::new(0, 0), 2, &blocked).is_none());
    }

    #[test]
    fn attached_ramps_rise_to_the_platform_top() {
        for seed in 0..10 {
            let mut ctx = context(r#"{"room_dimensions": {"x": 12, "y": 3, "z": 12}}"#, seed);
            let key = DeclarationKey::new("structural_platforms", 0);
            let c = PlatformConfig {
                attached_ramps: Randomizable::Fixed(1),
                ..PlatformConfig::default()
            };
            platforms(&mut ctx, &key, &c).unwrap();
            let platform = ctx.objects.iter().find(|o| o.kind == ObjectKind::Platform).unwrap();
            let ramps: Vec<_> = ctx.objects.iter().filter(|o| o.kind == ObjectKind::Ramp).collect();
            assert_eq!(ramps.len(), 1, "seed {seed}");
            for ramp in ramps {
                assert!((ramp.dimensions.y - platform.dimensions.y).abs() < EPSILON);
                assert!(ramp.dimensions.y <= ramp.dimensions.z + EPSILON, "steeper than 45 degrees");
                assert_eq!(ramp.material, platform.material);
                assert!(ramp.labels.contains(&Label::from(RAMP_LABEL)));
                let high_end = Vec3::new(0.0, 0.0, ramp.dimensions.z / 2.0 + 0.05)
                    .rotate_y(ramp.rotation_y);
                let tip = Vec3::new(ramp.position.x + high_end.x, 0.0, ramp.position.z + high_end.z);
                let column = ObjectBounds::new(tip, Vec3::new(0.02, 1.0, 0.02), 0.0);
                assert!(column.overlaps_floor(&platform.bounds()), "seed {seed}: ramp faces away");
            }
        }
    }

    #[test]
    fn free_ramps_leave_headroom_and_face_the_walls() {
        for seed in 0..10 {
            let mut ctx = context(r#"{"room_dimensions": {"x": 8, "y": 3, "z": 8}}"#, seed);
            let key = DeclarationKey::new("structural_ramps", 0);
            let c = RampConfig {
                num: Randomizable::Fixed(2),
                ..RampConfig::default()
            };
            ramps(&mut ctx, &key, &c).unwrap();
            for ramp in ctx.objects.iter().filter(|o| o.kind == ObjectKind::Ramp) {
                assert!(ramp.dimensions.y <= 3.0 - PERFORMER_HEIGHT + EPSILON);
                assert_eq!(ramp.rotation_y % 90.0, 0.0);
                let slope = ramp.dimensions.y / ramp.dimensions.z;
                let (lo, hi) = (15f64.to_radians().tan(), 45f64.to_radians().tan());
                assert!(slope >= lo - EPSILON && slope <= hi + EPSILON, "seed {seed}: slope {slope}");
                assert!(ramp.labels.contains(&Label::from(RAMP_LABEL)));
            }
        }
    }

    #[test]
    fn door_walls_frame_the_door() {
        let mut ctx = context(r#"{"room_dimensions": {"x": 8, "y": 4, "z": 8}}"#, 3);
        let key = DeclarationKey::new("structural_doors", 0);
        let c = DoorConfig {
            rotation_y: Some(Randomizable::Fixed(90.0)),
            wall_scale_x: Some(Randomizable::Fixed(3.0)),
            wall_scale_y: Some(Randomizable::Fixed(3.0)),
            ..DoorConfig::default()
        };
        doors(&mut ctx, &key, &c).unwrap();
        let door = ctx.objects.iter().find(|o| o.kind == ObjectKind::Door).unwrap();
        let walls: Vec<_> = ctx.objects.iter().filter(|o| o.kind == ObjectKind::Wall).collect();
        assert_eq!(walls.len(), 3);
        assert!(door.labels.contains(&Label::from(DOOR_LABEL)));
        assert_eq!(door.rotation_y, 90.0);
        assert!(DOOR_MATERIALS.contains(&door.material.as_deref().unwrap()));

        let total_width: f64 = walls
            .iter()
            .filter(|w| w.position.y == door.position.y)
            .map(|w| w.dimensions.x)
            .sum::<f64>()
            + door.dimensions.x;
        assert!((total_width - 3.0).abs() < EPSILON);
        let top = walls.iter().find(|w| w.position.y > door.position.y).unwrap();
        assert!((top.position.y + top.dimensions.y - 3.0).abs() < EPSILON);
        for w in &walls {
            assert_eq!(w.material, walls[0].material);
            assert_ne!(w.material, door.material);
            assert_eq!(w.rotation_y, 90.0);
        }
    }

    #[test]
    fn narrow_door_walls_have_no_side_pieces() {
        let mut ctx = context(r#"{"room_dimensions": {"x": 6, "y": 2, "z": 6}}"#, 8);
        let key = DeclarationKey::new("structural_doors", 0);
        let c = DoorConfig {
            wall_scale_x: Some(Randomizable::Fixed(1.0)),
            ..DoorConfig::default()
        };
        doors(&mut ctx, &key, &c).unwrap();
        let kinds: Vec<_> = ctx.objects.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec![ObjectKind::Door]);
    }

    #[test]
    fn configured_wall_material_is_never_the_door_material() {
        let wall = OneOf::Fixed("wood_light".to_owned());
        for seed in 0..30 {
            let mut s = Sampler::new(seed, 10);
            let look = door_look(&mut s, None, Some(&wall)).unwrap();
            assert_eq!(look.wall, "wood_light");
            assert_ne!(look.door, look.wall);
            let free = door_look(&mut s, None, None).unwrap();
            assert_ne!(free.door, free.wall);
        }
    }

    #[test]
    fn lava_never_covers_the_performer() {
        for seed in 0..20 {
            let mut ctx = context(r#"{"room_dimensions": {"x": 4, "y": 3, "z": 4}}"#, seed);
            let start = Cell::containing(ctx.room.performer.position);
            let c = FloorAreaConfig {
                num: Randomizable::Fixed(3),
                position_x: None,
                position_z: None,
                size: Randomizable::Fixed(4),
                labels: Vec::new(),
            };
            let key = DeclarationKey::new("lava", 0);
            if floor_areas(&mut ctx, &key, &c, RegionKind::Lava).is_ok() {
                assert!(!ctx.index.cells_of(&[RegionKind::Lava]).contains(&start), "seed {seed}");
            }
        }
    }
}
