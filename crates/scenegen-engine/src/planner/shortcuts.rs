//! Shortcuts: canned structural layouts that run before the configured
//! structural declarations.
//!
//! Order is fixed: bisecting platform or triple door, lava room,
//! lava-target-tool, agent-with-target, forced choice. `start_on_platform` runs after the
//! structural declarations because it needs a labelled platform.

use super::agents::{place_agent, AgentRequest};
use super::placement::{Appearance, FloorRequest, Look};
use super::specific::Placement;
use super::structural::{
    add_door, add_platform, commit_tool, door_look, footprint_is_free, hang_and_pick,
    hang_and_place, tool_object, CEILING_GAP, DOOR_WIDTH, WALL_THICKNESS,
};
use super::{ForcedChoiceSides, PhaseContext, MIN_GAP, PERFORMER_HALF_WIDTH};
use crate::catalog::{self, ShapeCategory, ToolShape, LAVA_MATERIAL, MECHANISM_MATERIAL};
use crate::config::{
    AgentWithTargetConfig, BisectingPlatformConfig, ForcedChoiceConfig, GoalCategory,
    KeywordLocation, KeywordLocationConfig, LavaTargetToolConfig, OccluderOrigin, PathCheck,
    ScenarioConfig, TripleDoorConfig,
};
use crate::scene::{DeclarationKey, LipGap, LipSide, ObjectInstance, ObjectKind, PlatformLips};
use crate::schedule::{travel_steps, EventKind, EventTrigger, FreezeWindow, OCCLUDER_SPEED};
use scenegen_core::{
    GenerationError, Label, ObjectId, OneOf, Randomizable, ScaleConfig, Step, Vec3,
    VectorRandomizable,
};
use scenegen_space::{Cell, ObjectBounds, RegionKind, ToolKind};

/// Label attached to the agent created by `shortcut_agent_with_target`.
pub const AGENT_WITH_TARGET_LABEL: &str = "agent_with_target";

/// Label `shortcut_start_on_platform` looks for.
pub const START_STRUCTURE_LABEL: &str = "start_structure";

/// Label attached to every forced-choice placer.
pub const FORCED_CHOICE_PLACER_LABEL: &str = "forced_choice_placers";

/// Label attached to the three doors of `shortcut_triple_door_choice`.
pub const TRIPLE_DOOR_LABEL: &str = "triple_doors";

const MIN_LAVA_WIDTH: u32 = 2;
const MAX_LAVA_WIDTH: u32 = 6;
const MAX_ISLAND_SIZE: u32 = 3;
const BLOCKING_WALL_DIMENSIONS: Vec3 = Vec3::new(0.99, 0.25, 0.1);
const DEFAULT_TARGET_SHAPE: &str = "soccer_ball";
const TRIPLE_DOOR_PLATFORM_HEIGHT: f64 = 2.0;
/// Height of the triple-door wall above the floor.
const TRIPLE_DOOR_WALL_TOP: f64 = 4.25;

/// Whether any enabled shortcut creates the goal targets itself.
pub(super) fn produces_targets(config: &ScenarioConfig) -> bool {
    lava_tool(config).is_some()
        || config
            .shortcut_agent_with_target
            .as_ref()
            .and_then(|s| s.enabled())
            .is_some()
        || forced_choice(config).is_some()
}

/// Goal category of the scene: configured, or implied by a shortcut.
pub(crate) fn goal_category(config: &ScenarioConfig) -> Option<GoalCategory> {
    if let Some(goal) = &config.goal {
        return Some(goal.category);
    }
    if forced_choice(config).is_some() {
        Some(GoalCategory::MultiRetrieval)
    } else if produces_targets(config) {
        Some(GoalCategory::Retrieval)
    } else {
        None
    }
}

fn lava_tool(config: &ScenarioConfig) -> Option<LavaTargetToolConfig> {
    config.shortcut_lava_target_tool.as_ref().and_then(|s| s.enabled())
}

fn forced_choice(config: &ScenarioConfig) -> Option<ForcedChoiceConfig> {
    config
        .forced_choice_multi_retrieval_target
        .as_ref()
        .and_then(|s| s.enabled())
}

pub(super) fn structural(ctx: &mut PhaseContext<'_>) -> Result<(), GenerationError> {
    let config = ctx.config;
    let choice = forced_choice(config);
    let bisect = config
        .shortcut_bisecting_platform
        .as_ref()
        .and_then(|s| s.enabled())
        .or_else(|| choice.as_ref().map(|_| BisectingPlatformConfig::default()));
    if let Some(c) = bisect {
        let key = DeclarationKey::shortcut("shortcut_bisecting_platform");
        bisecting_platform(ctx, &key, &c)?;
    }
    if let Some(c) = config
        .shortcut_triple_door_choice
        .as_ref()
        .and_then(|s| s.enabled())
    {
        triple_door(ctx, &c)?;
    }
    if config.shortcut_lava_room {
        lava_room(ctx)?;
    }
    if let Some(c) = lava_tool(config) {
        lava_target_tool(ctx, &c)?;
    }
    if let Some(c) = config
        .shortcut_agent_with_target
        .as_ref()
        .and_then(|s| s.enabled())
    {
        agent_with_target(ctx, &c)?;
    }
    if let Some(c) = choice {
        forced_choice_sides(ctx, &c)?;
    }
    Ok(())
}

/// Runs once the structural declarations have settled.
pub(super) fn after_structural(ctx: &mut PhaseContext<'_>) -> Result<(), GenerationError> {
    if ctx.config.shortcut_start_on_platform {
        start_on_platform(ctx)?;
    }
    Ok(())
}

// ── Goal targets ────────────────────────────────────────────────────

fn target_appearance(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    shape: Option<&OneOf<String>>,
    scale: Option<&ScaleConfig>,
) -> Result<Appearance, GenerationError> {
    let config = ctx.config;
    let goal_target = config.goal.as_ref().and_then(|g| g.target.as_ref());
    let fallback = OneOf::Fixed(DEFAULT_TARGET_SHAPE.to_owned());
    let look = Look {
        shape: Some(
            shape
                .or(goal_target.and_then(|t| t.shape.as_ref()))
                .unwrap_or(&fallback),
        ),
        scale: scale.or(goal_target.and_then(|t| t.scale.as_ref())),
        material: goal_target.and_then(|t| t.material.as_ref()),
        shared: None,
    };
    ctx.appearance(key, look, ShapeCategory::Pickupable)
}

fn target_labels(ctx: &PhaseContext<'_>) -> Vec<Label> {
    ctx.config
        .goal
        .as_ref()
        .and_then(|g| g.target.as_ref())
        .map(|t| t.labels.clone())
        .unwrap_or_default()
}

fn add_goal_target(ctx: &mut PhaseContext<'_>, id: ObjectId, check: PathCheck) {
    ctx.goal_targets.push(id);
    if check != PathCheck::Off {
        ctx.path_checks.push((id, check));
    }
}

// ── Bisecting platform ──────────────────────────────────────────────

fn bisecting_platform(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &BisectingPlatformConfig,
) -> Result<ObjectId, GenerationError> {
    let room = ctx.room.grid;
    let height = ctx.sampler.sample(&c.platform_height)?;
    if height + PERFORMER_HALF_WIDTH >= f64::from(room.height()) {
        return Err(GenerationError::config(
            key.to_string(),
            format!("platform height {height} leaves no headroom"),
        ));
    }
    let depth = f64::from(room.depth());
    let material = ctx.room_material(None)?;
    let platform = add_platform(
        ctx,
        key,
        Vec3::ZERO,
        0.0,
        Vec3::new(1.0, height, depth),
        material.clone(),
        &[],
    )?;
    ctx.move_performer(Vec3::new(0.0, height, -room.half_z() + 0.5), 0.0);

    if c.has_blocking_wall {
        let wall = ObjectInstance::new(ObjectId(0), ObjectKind::Wall, "structural_wall", key.clone())
            .at(Vec3::new(0.0, height, -room.half_z() + 1.5), 0.0)
            .sized(BLOCKING_WALL_DIMENSIONS, BLOCKING_WALL_DIMENSIONS)
            .with_material(material);
        ctx.commit(wall, &[]);
    }
    tracing::debug!(height, blocking_wall = c.has_blocking_wall, "bisecting platform added");
    Ok(platform)
}

// ── Triple door ─────────────────────────────────────────────────────

/// A bisecting platform cut across by a wall with three doors: one on
/// the platform and one over the floor on either side.
fn triple_door(ctx: &mut PhaseContext<'_>, c: &TripleDoorConfig) -> Result<(), GenerationError> {
    let key = DeclarationKey::shortcut("shortcut_triple_door_choice");
    let platform = bisecting_platform(
        ctx,
        &key,
        &BisectingPlatformConfig {
            has_blocking_wall: false,
            platform_height: Randomizable::Fixed(TRIPLE_DOOR_PLATFORM_HEIGHT),
        },
    )?;
    let room = ctx.room.grid;
    let height = f64::from(room.height());

    let lips = ctx.sampler.choose(&c.add_lips)?;
    if lips {
        if let Some(p) = ctx.object_mut(platform) {
            p.lips = Some(PlatformLips {
                left: true,
                right: true,
                gaps: vec![
                    LipGap {
                        side: LipSide::Left,
                        low: 0.0,
                        high: 0.5,
                    },
                    LipGap {
                        side: LipSide::Right,
                        low: 0.0,
                        high: 0.5,
                    },
                ],
                ..PlatformLips::default()
            });
        }
    }

    let start = match &c.start_drop_step {
        Some(s) => ctx.sampler.sample(s)?,
        None => 0,
    };
    let raise = if start > 0 { height } else { 0.0 };
    let look = door_look(&mut ctx.sampler, c.door_material.as_ref(), c.wall_material.as_ref())?;
    let labels = [Label::from(TRIPLE_DOOR_LABEL)];

    let mut pieces = add_door(
        ctx,
        &key,
        Vec3::new(0.0, TRIPLE_DOOR_PLATFORM_HEIGHT, 0.0),
        0.0,
        Vec3::new(
            DOOR_WIDTH,
            TRIPLE_DOOR_WALL_TOP - TRIPLE_DOOR_PLATFORM_HEIGHT,
            WALL_THICKNESS,
        ),
        &look,
        &labels,
        raise,
    );
    let side_width = f64::from(room.width()) / 2.0 - 0.5;
    for sign in [-1.0, 1.0] {
        pieces.extend(add_door(
            ctx,
            &key,
            Vec3::new(sign * (side_width / 2.0 + 0.5), 0.0, 0.0),
            0.0,
            Vec3::new(side_width, TRIPLE_DOOR_WALL_TOP, WALL_THICKNESS),
            &look,
            &labels,
            raise,
        ));
    }

    if start > 0 {
        let travel = travel_steps(raise, OCCLUDER_SPEED);
        for id in &pieces {
            ctx.push_event(
                *id,
                None,
                EventKind::StructureDrop {
                    travel_steps: travel,
                },
                EventTrigger::Step { step: Step(start) },
            );
        }
        if ctx.sampler.choose(&c.add_freeze)? {
            ctx.freezes.push(FreezeWindow {
                start: Step(1),
                end: Step(start + travel - 1),
            });
        }
    }
    ctx.room.restrict_open_doors = ctx.sampler.choose(&c.restrict_open_doors)?;
    tracing::debug!(lips, start_drop_step = start, pieces = pieces.len(), "triple door added");
    Ok(())
}

// ── Lava room ───────────────────────────────────────────────────────

/// Cells of the two lava strips along the x walls: columns with
/// `|x|` in `ceil(w/2 - floor(w/3))..=floor(w/2)`, clipped to the room.
fn lava_room_strips(width: u32, room: &scenegen_space::RoomGrid) -> (Vec<Cell>, Vec<Cell>) {
    let half = f64::from(width) / 2.0;
    let lo = (half - f64::from(width / 3)).ceil() as i32;
    let hi = half.floor() as i32;
    let mz = room.max_cell_z();
    let mut left = Vec::new();
    let mut right = Vec::new();
    for x in lo.max(1)..=hi {
        for z in -mz..=mz {
            for (side, cell) in [(&mut left, Cell::new(-x, z)), (&mut right, Cell::new(x, z))] {
                if room.contains_cell(cell) {
                    side.push(cell);
                }
            }
        }
    }
    (left, right)
}

fn lava_room(ctx: &mut PhaseContext<'_>) -> Result<(), GenerationError> {
    let room = ctx.room.grid;
    let rotation_y = f64::from(ctx.sampler.int(-90, 90).rem_euclid(360));
    ctx.move_performer(Vec3::new(0.0, 0.0, -room.half_z() + 0.5), rotation_y);
    let (left, right) = lava_room_strips(room.width(), &room);
    for cells in [left, right] {
        if cells.is_empty() {
            continue;
        }
        let region = ctx
            .index
            .add_region(RegionKind::Lava, cells)
            .map_err(|e| GenerationError::PlacementExhausted {
                what: format!("shortcut_lava_room ({e})"),
                tries: 1,
            })?;
        ctx.region_materials.insert(region, LAVA_MATERIAL.to_owned());
    }
    tracing::debug!(rotation_y, "lava room added");
    Ok(())
}

// ── Lava island with tool ───────────────────────────────────────────

/// Island and lava sizes, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LavaSizes {
    island: u32,
    front: u32,
    rear: u32,
    left: u32,
    right: u32,
}

fn too_small(what: &str) -> GenerationError {
    GenerationError::PlacementExhausted {
        what: format!("shortcut_lava_target_tool: room too small for the {what}"),
        tries: 1,
    }
}

fn draw_width(
    ctx: &mut PhaseContext<'_>,
    configured: Option<&Randomizable<u32>>,
    max: i64,
    what: &str,
) -> Result<u32, GenerationError> {
    if let Some(r) = configured {
        return ctx.sampler.sample(r);
    }
    let max = max.min(i64::from(MAX_LAVA_WIDTH));
    if max < i64::from(MIN_LAVA_WIDTH) {
        return Err(too_small(what));
    }
    Ok(ctx.sampler.int(MIN_LAVA_WIDTH as i32, max as i32) as u32)
}

/// Draw the layout. `long` and `short` are the largest in-room cell
/// indices along each axis. Front lava, island and rear lava together
/// leave at least three free cells between the performer's wall and the
/// lava, and one behind it.
fn lava_sizes(
    ctx: &mut PhaseContext<'_>,
    c: &LavaTargetToolConfig,
    long: i32,
    short: i32,
) -> Result<LavaSizes, GenerationError> {
    let span = i64::from(long) - 1;
    let island = match &c.island_size {
        Some(r) => ctx.sampler.sample(r)?.max(1),
        None => {
            let max = (span - 2 * i64::from(MIN_LAVA_WIDTH)).min(i64::from(MAX_ISLAND_SIZE));
            if max < 1 {
                return Err(too_small("island"));
            }
            ctx.sampler.int(1, max as i32) as u32
        }
    };
    let front = draw_width(
        ctx,
        c.front_lava_width.as_ref(),
        span - i64::from(island) - i64::from(MIN_LAVA_WIDTH),
        "front lava",
    )?;
    let rear = draw_width(
        ctx,
        c.rear_lava_width.as_ref(),
        span - i64::from(island) - i64::from(front),
        "rear lava",
    )?;
    if i64::from(front + island + rear) > span {
        return Err(too_small("configured lava widths"));
    }
    let island_left = i64::from((island - 1) / 2);
    let island_right = i64::from(island) - 1 - island_left;
    let left = draw_width(
        ctx,
        c.left_lava_width.as_ref(),
        i64::from(short) - island_left - 1,
        "left lava",
    )?;
    let right = draw_width(
        ctx,
        c.right_lava_width.as_ref(),
        i64::from(short) - island_right - 1,
        "right lava",
    )?;
    Ok(LavaSizes {
        island,
        front,
        rear,
        left,
        right,
    })
}

/// Lava-island geometry in (long, short) cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct IslandLayout {
    /// First island row along the long axis.
    near: i32,
    /// Last island row along the long axis.
    far: i32,
    /// First island column along the short axis.
    left: i32,
    /// Last island column along the short axis.
    right: i32,
    sizes: LavaSizes,
}

impl IslandLayout {
    fn new(sizes: LavaSizes, long_max: i32) -> Self {
        let far = long_max - sizes.rear as i32 - 1;
        let near = far - sizes.island as i32 + 1;
        let left = -((sizes.island as i32 - 1) / 2);
        let right = left + sizes.island as i32 - 1;
        Self {
            near,
            far,
            left,
            right,
            sizes,
        }
    }

    fn island_cells(&self) -> Vec<(i32, i32)> {
        (self.near..=self.far)
            .flat_map(|l| (self.left..=self.right).map(move |s| (l, s)))
            .collect()
    }

    fn lava_cells(&self) -> Vec<(i32, i32)> {
        let s = self.sizes;
        let first = self.near - s.front as i32;
        let last = self.far + s.rear as i32;
        let mut out = Vec::new();
        for l in first..self.near {
            out.extend((self.left..=self.right).map(|x| (l, x)));
        }
        for l in self.far + 1..=last {
            out.extend((self.left..=self.right).map(|x| (l, x)));
        }
        for l in first..=last {
            out.extend((self.left - s.left as i32..self.left).map(|x| (l, x)));
            out.extend((self.right + 1..=self.right + s.right as i32).map(|x| (l, x)));
        }
        out
    }

    /// Island centre as (long, short).
    fn centre(&self) -> (f64, f64) {
        (
            f64::from(self.near + self.far) / 2.0,
            f64::from(self.left + self.right) / 2.0,
        )
    }
}

fn lava_target_tool(
    ctx: &mut PhaseContext<'_>,
    c: &LavaTargetToolConfig,
) -> Result<(), GenerationError> {
    let key = DeclarationKey::shortcut("shortcut_lava_target_tool");
    let room = ctx.room.grid;
    let z_long = room.depth() >= room.width();
    let (long_max, short_max) = if z_long {
        (room.max_cell_z(), room.max_cell_x())
    } else {
        (room.max_cell_x(), room.max_cell_z())
    };
    let to_cell = |long: i32, short: i32| {
        if z_long {
            Cell::new(short, long)
        } else {
            Cell::new(long, short)
        }
    };
    let to_point = |long: f64, short: f64| {
        if z_long {
            Vec3::new(short, 0.0, long)
        } else {
            Vec3::new(long, 0.0, short)
        }
    };

    let sizes = lava_sizes(ctx, c, long_max, short_max)?;
    let layout = IslandLayout::new(sizes, long_max);
    let performer_short = if sizes.island % 2 == 1 { 0.0 } else { 0.5 };
    ctx.move_performer(
        to_point(-f64::from(long_max), performer_short),
        if z_long { 0.0 } else { 90.0 },
    );

    let lava: Vec<Cell> = layout
        .lava_cells()
        .into_iter()
        .map(|(l, s)| to_cell(l, s))
        .filter(|cell| room.contains_cell(*cell))
        .collect();
    let island: Vec<Cell> = layout
        .island_cells()
        .into_iter()
        .map(|(l, s)| to_cell(l, s))
        .collect();
    let region_err = |e| GenerationError::PlacementExhausted {
        what: format!("{key} regions ({e})"),
        tries: 1,
    };
    let lava_region = ctx.index.add_region(RegionKind::Lava, lava).map_err(region_err)?;
    ctx.region_materials.insert(lava_region, LAVA_MATERIAL.to_owned());
    ctx.index.add_region(RegionKind::Island, island).map_err(region_err)?;

    // The bar ends one cell short of the front lava and reaches the far
    // side of the island once pushed across it.
    let kind = match &c.tool_type {
        Some(t) => ctx.sampler.choose(t)?,
        None => *ctx.sampler.pick(&ToolKind::ALL).unwrap_or(&ToolKind::Rect),
    };
    let length = sizes.front + sizes.island;
    let widths = ToolShape::with_length(kind, length);
    let shape = *ctx.sampler.pick(&widths).ok_or_else(|| {
        GenerationError::config(key.to_string(), format!("no {kind} tool of length {length}"))
    })?;
    let turns = if z_long { 0 } else { 1 };
    let origin = to_cell(layout.near - sizes.front as i32 - length as i32, 0);
    let (tool, footprint) = tool_object(&key, shape, turns, origin)
        .ok_or_else(|| GenerationError::config(key.to_string(), "zero-length tool"))?;
    let push = footprint.push_cell(origin);
    if !footprint_is_free(&ctx.index, &footprint, origin) || !room.contains_cell(push) {
        return Err(too_small("tool"));
    }
    let tool_id = commit_tool(ctx, tool, &footprint, &[]);
    ctx.index
        .insert_object(tool_id, ObjectBounds::of_cell(push, catalog::TOOL_HEIGHT));

    let mut appearance = target_appearance(ctx, &key, c.target_shape.as_ref(), c.target_scale.as_ref())?;
    let random_position = match &c.random_target_position {
        Some(o) => ctx.sampler.choose(o)?,
        None => !ctx.sampler.chance(ctx.options.island_target_probability),
    };
    let labels = target_labels(ctx);
    let target = if random_position {
        let pose = ctx.floor_pose(&FloorRequest {
            what: "lava-tool target",
            dimensions: appearance.dimensions,
            position: None,
            rotation: None,
            distance_from_performer: None,
        })?;
        let obj = appearance
            .instance(ObjectKind::Target, &key)
            .at(pose.position, pose.rotation_y);
        ctx.commit(obj, &labels)
    } else {
        let fit = f64::from(sizes.island) - 2.0 * MIN_GAP;
        let widest = appearance.dimensions.x.max(appearance.dimensions.z);
        if widest > fit {
            let f = fit / widest;
            appearance.dimensions = appearance.dimensions * f;
            appearance.scale = appearance.scale * f;
        }
        let (l, s) = layout.centre();
        let obj = appearance
            .instance(ObjectKind::Target, &key)
            .at(to_point(l, s), 0.0);
        ctx.commit(obj, &labels)
    };
    add_goal_target(ctx, target, PathCheck::Tools);
    tracing::debug!(
        island = sizes.island,
        front = sizes.front,
        rear = sizes.rear,
        tool = %shape,
        on_island = !random_position,
        "lava target tool added"
    );
    Ok(())
}

// ── Agent with target ───────────────────────────────────────────────

fn agent_with_target(
    ctx: &mut PhaseContext<'_>,
    c: &AgentWithTargetConfig,
) -> Result<(), GenerationError> {
    let key = DeclarationKey::shortcut("shortcut_agent_with_target");
    let label = Label::new(AGENT_WITH_TARGET_LABEL);
    let agent = place_agent(
        ctx,
        &key,
        "agent holding the target",
        AgentRequest {
            position: c.agent_position.as_ref(),
            movement: c.movement.as_ref(),
            ..AgentRequest::default()
        },
        std::slice::from_ref(&label),
    )?;

    if let Some(&target) = ctx.goal_targets.first() {
        if let Some(t) = ctx.object_mut(target) {
            t.associated_with = Some(agent);
        }
        return Ok(());
    }
    let appearance = target_appearance(ctx, &key, None, None)?;
    let location = KeywordLocationConfig {
        keyword: KeywordLocation::AssociatedWithAgent,
        relative_object_label: Some(label),
        distance: None,
    };
    let labels = target_labels(ctx);
    let id = ctx.place(
        &key,
        "target beside the agent",
        &appearance,
        ObjectKind::Target,
        Placement {
            location: Some(&location),
            ..Placement::default()
        },
        &labels,
    )?;
    let check = ctx.config.check_valid_path;
    add_goal_target(ctx, id, check);
    Ok(())
}

// ── Forced choice ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Change {
    Add(Side),
    Remove(Side),
}

/// Objects on one side of the forced choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SideCount {
    total: u32,
    /// Objects standing there from the start. Placed objects stay in
    /// their placer's hold, so only these can be picked up.
    removable: u32,
}

impl SideCount {
    fn new(n: u32) -> Self {
        Self {
            total: n,
            removable: n,
        }
    }
}

impl Change {
    fn side(self) -> Side {
        match self {
            Self::Add(side) | Self::Remove(side) => side,
        }
    }

    fn apply(self, (mut left, mut right): (SideCount, SideCount)) -> (SideCount, SideCount) {
        let count = match self.side() {
            Side::Left => &mut left,
            Side::Right => &mut right,
        };
        match self {
            Self::Add(_) => count.total += 1,
            Self::Remove(_) => {
                count.total = count.total.saturating_sub(1);
                count.removable = count.removable.saturating_sub(1);
            }
        }
        (left, right)
    }

    fn possible(self, (left, right): (SideCount, SideCount)) -> bool {
        match self {
            Self::Remove(Side::Left) => left.removable > 0,
            Self::Remove(Side::Right) => right.removable > 0,
            Self::Add(_) => true,
        }
    }
}

const CHANGES: [Change; 4] = [
    Change::Add(Side::Left),
    Change::Add(Side::Right),
    Change::Remove(Side::Left),
    Change::Remove(Side::Right),
];

/// Draw `n` changes to the side counts; the final counts never tie when
/// `n > 0`, and nothing is removed that a placer put down.
fn plan_changes(s: &mut crate::sampler::Sampler, start: (u32, u32), n: u32) -> Vec<Change> {
    let mut counts = (SideCount::new(start.0), SideCount::new(start.1));
    let mut out = Vec::with_capacity(n as usize);
    for i in 0..n {
        let last = i + 1 == n;
        let options: Vec<Change> = CHANGES
            .into_iter()
            .filter(|c| c.possible(counts))
            .filter(|c| {
                let (l, r) = c.apply(counts);
                !last || l.total != r.total
            })
            .collect();
        let Some(&change) = s.pick(&options) else {
            break;
        };
        counts = change.apply(counts);
        out.push(change);
    }
    out
}

/// Floor range for objects on one side of the platform.
fn side_position(side: Side, half_x: f64, z: (f64, f64), radius: f64) -> Option<VectorRandomizable> {
    let inner = 0.5 + radius + MIN_GAP;
    let outer = half_x - radius - MIN_GAP;
    if inner > outer || z.0 > z.1 {
        return None;
    }
    let x = match side {
        Side::Left => Randomizable::range(-outer, -inner),
        Side::Right => Randomizable::range(inner, outer),
    };
    Some(VectorRandomizable {
        x: Some(x),
        y: None,
        z: Some(Randomizable::range(z.0, z.1)),
    })
}

fn forced_choice_sides(
    ctx: &mut PhaseContext<'_>,
    c: &ForcedChoiceConfig,
) -> Result<(), GenerationError> {
    let key = DeclarationKey::shortcut("forced_choice_multi_retrieval_target");
    let room = ctx.room.grid;
    let room_height = f64::from(room.height());
    let appearance = ctx.appearance(
        &key,
        Look {
            shape: Some(&c.target_shape),
            scale: c.target_scale.as_ref(),
            ..Look::default()
        },
        ShapeCategory::Pickupable,
    )?;
    let radius = appearance.radius();

    let screen_z = -room.half_z() + 2.0;
    let mut z_range = (-room.half_z() + radius + MIN_GAP, room.half_z() - radius - MIN_GAP);
    if c.occluders {
        z_range.0 = z_range.0.max(screen_z + WALL_THICKNESS + radius + MIN_GAP);
    }
    let left_pos = side_position(Side::Left, room.half_x(), z_range, radius);
    let right_pos = side_position(Side::Right, room.half_x(), z_range, radius);
    let (Some(left_pos), Some(right_pos)) = (left_pos, right_pos) else {
        return Err(GenerationError::PlacementExhausted {
            what: format!("{key}: room too narrow for two sides"),
            tries: 1,
        });
    };

    let placer_count = ctx.sampler.sample(&c.placers)?;
    let placer_label = Label::new(FORCED_CHOICE_PLACER_LABEL);
    if c.occluders {
        let trigger = if placer_count > 0 {
            EventTrigger::After {
                labels: vec![placer_label.clone()],
                fallback: Step(1),
            }
        } else {
            EventTrigger::Step { step: Step(1) }
        };
        for side in [Side::Left, Side::Right] {
            side_screen(ctx, &key, side, screen_z, room_height, trigger.clone())?;
        }
    }

    let left_n = ctx.sampler.sample(&c.left_count)?;
    let right_n = ctx.sampler.sample(&c.right_count)?;
    let mut sides = ForcedChoiceSides::default();
    for (side, n, pos) in [(Side::Left, left_n, &left_pos), (Side::Right, right_n, &right_pos)] {
        for i in 0..n {
            let what = format!("{key} {side:?} object {i}");
            let id = ctx.place(
                &key,
                &what,
                &appearance,
                ObjectKind::Target,
                Placement {
                    position: Some(pos),
                    ..Placement::default()
                },
                &[],
            )?;
            match side {
                Side::Left => sides.left.push(id),
                Side::Right => sides.right.push(id),
            }
        }
    }
    ctx.forced_choice = Some(sides);

    let changes = plan_changes(&mut ctx.sampler, (left_n, right_n), placer_count);
    for (i, change) in changes.into_iter().enumerate() {
        let step = ctx.sampler.int(1, 10) as u32;
        let trigger = EventTrigger::Step { step: Step(step) };
        let labels = std::slice::from_ref(&placer_label);
        match change {
            Change::Add(side) => {
                let pos = if side == Side::Left { &left_pos } else { &right_pos };
                let rest = ctx.floor_pose(&FloorRequest {
                    what: &format!("{key} placed object {i}"),
                    dimensions: appearance.dimensions,
                    position: Some(pos),
                    rotation: None,
                    distance_from_performer: None,
                })?;
                let (_, object) = hang_and_place(
                    ctx,
                    &key,
                    &appearance,
                    rest,
                    trigger,
                    None,
                    labels,
                    &[],
                )?;
                if let Some(sides) = ctx.forced_choice.as_mut() {
                    match side {
                        Side::Left => sides.added_left.push(object),
                        Side::Right => sides.added_right.push(object),
                    }
                }
            }
            Change::Remove(side) => {
                let current = ctx
                    .forced_choice
                    .as_ref()
                    .map(|s| {
                        let (l, r) = s.final_sides();
                        if side == Side::Left { l } else { r }
                    })
                    .unwrap_or_default();
                let candidates: Vec<ObjectId> = current
                    .into_iter()
                    .filter(|id| {
                        !ctx.claimed.contains(id)
                            && ctx.object(*id).is_some_and(|o| o.held_by.is_none())
                    })
                    .collect();
                let target = *ctx.sampler.pick(&candidates).ok_or_else(|| {
                    GenerationError::PlacementExhausted {
                        what: format!("{key}: nothing left to remove"),
                        tries: 0,
                    }
                })?;
                hang_and_pick(ctx, &key, target, trigger, labels)?;
            }
        }
    }
    tracing::debug!(left = left_n, right = right_n, placers = placer_count, "forced choice added");
    Ok(())
}

/// Screen that drops over one side once the placers finish.
fn side_screen(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    side: Side,
    z: f64,
    room_height: f64,
    trigger: EventTrigger,
) -> Result<ObjectId, GenerationError> {
    let half_x = ctx.room.grid.half_x();
    let width = half_x - 0.5 - 2.0 * MIN_GAP;
    let height = (room_height - CEILING_GAP - 0.5).min(2.0);
    let dims = Vec3::new(width, height, WALL_THICKNESS);
    let x = 0.5 + MIN_GAP + width / 2.0;
    let x = if side == Side::Left { -x } else { x };
    let floor = Vec3::new(x, 0.0, z);
    if width <= 0.0 || ctx.index.collision(&ObjectBounds::new(floor, dims, 0.0), &[]).is_some() {
        return Err(GenerationError::PlacementExhausted {
            what: format!("{key}: no room for the {side:?} screen"),
            tries: 1,
        });
    }
    let material = catalog::lookup("occluder_screen")
        .and_then(|d| ctx.sampler.pick(d.materials))
        .map_or_else(|| MECHANISM_MATERIAL.to_owned(), |m| (*m).to_owned());
    let raised = room_height - height - CEILING_GAP;
    let mut obj = ObjectInstance::new(ObjectId(0), ObjectKind::MovingOccluder, "moving_occluder", key.clone())
        .at(Vec3::new(x, raised, z), 0.0)
        .sized(dims, dims)
        .with_material(material);
    obj.pole_origin = Some(OccluderOrigin::Top);
    obj.final_position = Some(floor);
    let id = ctx.commit(obj, &[]);
    ctx.push_event(
        id,
        None,
        EventKind::OccluderDescend {
            travel_steps: travel_steps(raised, OCCLUDER_SPEED),
        },
        trigger,
    );
    Ok(id)
}

// ── Start on platform ───────────────────────────────────────────────

fn start_on_platform(ctx: &mut PhaseContext<'_>) -> Result<(), GenerationError> {
    let label = Label::new(START_STRUCTURE_LABEL);
    let id = ctx.resolve_one(&label)?;
    let platform = ctx.require(id)?.clone();
    if platform.kind != ObjectKind::Platform {
        return Err(GenerationError::config(
            "shortcut_start_on_platform",
            format!("`{label}` names {}, which is not a platform", platform.id),
        ));
    }
    let pad = PERFORMER_HALF_WIDTH + MIN_GAP;
    let slack_x = (platform.dimensions.x / 2.0 - pad).max(0.0);
    let slack_z = (platform.dimensions.z / 2.0 - pad).max(0.0);
    let top = platform.position.y + platform.dimensions.y;
    ctx.index.clear_reservations();
    let index = &ctx.index;
    let position = ctx.sampler.retry("performer start on the platform", |s| {
        let local = Vec3::new(s.uniform(-slack_x, slack_x), 0.0, s.uniform(-slack_z, slack_z))
            .rotate_y(platform.rotation_y);
        let p = Vec3::new(platform.position.x + local.x, top, platform.position.z + local.z);
        index
            .collision(&super::room::performer_area(p), &[platform.id])
            .is_none()
            .then_some(p)
    })?;
    let rotation_y = f64::from(ctx.sampler.int(0, 359));
    ctx.move_performer(position, rotation_y);
    tracing::debug!(platform = %platform.id, "performer starts on platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::room;
    use super::*;
    use crate::config::GenerationOptions;
    use crate::sampler::Sampler;
    use scenegen_space::RoomGrid;

    fn context(json: &str, seed: u64) -> PhaseContext<'static> {
        let cfg: &'static ScenarioConfig =
            Box::leak(Box::new(ScenarioConfig::from_json_str(json).unwrap()));
        let opts: &'static GenerationOptions = Box::leak(Box::default());
        room::init(cfg, opts, Sampler::new(seed, 100)).unwrap()
    }

    #[test]
    fn lava_room_leaves_a_middle_corridor() {
        let room = RoomGrid::new(12, 3, 9).unwrap();
        let (left, right) = lava_room_strips(12, &room);
        assert!(!left.is_empty());
        assert_eq!(left.len(), right.len());
        assert!(left.iter().all(|c| c.x <= -2));
        assert!(right.iter().all(|c| c.x >= 2 && room.contains_cell(*c)));
    }

    #[test]
    fn island_is_ringed_by_lava() {
        let sizes = LavaSizes {
            island: 2,
            front: 2,
            rear: 2,
            left: 2,
            right: 2,
        };
        let layout = IslandLayout::new(sizes, 7);
        assert_eq!((layout.near, layout.far), (3, 4));
        let lava = layout.lava_cells();
        for (l, s) in layout.island_cells() {
            for (dl, ds) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let n = (l + dl, s + ds);
                assert!(lava.contains(&n) || layout.island_cells().contains(&n));
            }
        }
    }

    #[test]
    fn final_side_counts_never_tie() {
        let mut s = Sampler::new(5, 10);
        for start in [(1, 1), (2, 3), (0, 4)] {
            for n in 1..5 {
                let changes = plan_changes(&mut s, start, n);
                assert_eq!(changes.len(), n as usize);
                let counts = (SideCount::new(start.0), SideCount::new(start.1));
                let (l, r) = changes.iter().fold(counts, |c, ch| ch.apply(c));
                assert_ne!(l.total, r.total);
            }
        }
    }

    #[test]
    fn placed_objects_are_never_removed() {
        let mut s = Sampler::new(3, 10);
        for start in [(0, 0), (1, 0), (0, 2), (1, 1)] {
            for n in 1..8 {
                let changes = plan_changes(&mut s, start, n);
                assert_eq!(changes.len(), n as usize);
                let (mut left, mut right) = start;
                for change in changes {
                    let removable = match change.side() {
                        Side::Left => &mut left,
                        Side::Right => &mut right,
                    };
                    if let Change::Remove(_) = change {
                        assert!(*removable > 0, "{change:?} after the start objects are gone");
                        *removable -= 1;
                    }
                }
            }
        }
    }

    #[test]
    fn empty_sides_only_take_additions() {
        let mut s = Sampler::new(8, 10);
        for _ in 0..20 {
            let changes = plan_changes(&mut s, (0, 0), 3);
            assert!(changes.iter().all(|c| matches!(c, Change::Add(_))), "{changes:?}");
        }
    }

    #[test]
    fn lava_target_tool_creates_one_target() {
        let mut ctx = context(
            r#"{"room_dimensions": {"x": 13, "y": 4, "z": 17}, "shortcut_lava_target_tool": true}"#,
            8,
        );
        structural(&mut ctx).unwrap();
        assert_eq!(ctx.goal_targets.len(), 1);
        assert_eq!(ctx.path_checks, vec![(ctx.goal_targets[0], PathCheck::Tools)]);
        assert_eq!(ctx.objects.iter().filter(|o| o.kind == ObjectKind::Tool).count(), 1);
        assert!(ctx.index.regions().iter().any(|r| r.kind == RegionKind::Island));
        assert_eq!(ctx.room.performer.rotation_y, 0.0);
    }

    #[test]
    fn forced_choice_sides_differ() {
        for seed in 0..5 {
            let mut ctx = context(
                r#"{"room_dimensions": {"x": 12, "y": 4, "z": 12},
                    "forced_choice_multi_retrieval_target": true}"#,
                seed,
            );
            structural(&mut ctx).unwrap();
            let (l, r) = ctx.forced_choice.as_ref().unwrap().final_sides();
            assert_ne!(l.len(), r.len());
            assert!(ctx.objects.iter().any(|o| o.kind == ObjectKind::Platform));
        }
    }

    #[test]
    fn triple_door_drops_three_doors_across_the_platform() {
        let mut ctx = context(
            r#"{"room_dimensions": {"x": 9, "y": 5, "z": 8},
                "shortcut_triple_door_choice": {"start_drop_step": 10}}"#,
            4,
        );
        structural(&mut ctx).unwrap();
        let doors: Vec<_> = ctx.objects.iter().filter(|o| o.kind == ObjectKind::Door).collect();
        assert_eq!(doors.len(), 3);
        let mut xs: Vec<f64> = doors.iter().map(|d| d.final_position.unwrap().x).collect();
        xs.sort_by(f64::total_cmp);
        assert_eq!(xs, vec![-2.5, 0.0, 2.5]);
        for d in &doors {
            assert!(d.labels.contains(&Label::from(TRIPLE_DOOR_LABEL)));
            let rest = d.final_position.unwrap();
            assert_eq!(d.position.y - rest.y, 5.0);
            let expected_y = if rest.x == 0.0 { TRIPLE_DOOR_PLATFORM_HEIGHT } else { 0.0 };
            assert_eq!(rest.y, expected_y);
        }

        let pieces = ctx.objects.iter().filter(|o| o.final_position.is_some()).count();
        assert_eq!(ctx.events.len(), pieces);
        assert!(ctx
            .events
            .iter()
            .all(|e| e.kind == EventKind::StructureDrop { travel_steps: 20 }));
        assert_eq!(
            ctx.freezes,
            vec![FreezeWindow {
                start: Step(1),
                end: Step(29)
            }]
        );
        assert!(ctx.room.restrict_open_doors);

        let platform = ctx.objects.iter().find(|o| o.kind == ObjectKind::Platform).unwrap();
        assert_eq!(platform.dimensions.y, TRIPLE_DOOR_PLATFORM_HEIGHT);
        let lips = platform.lips.as_ref().unwrap();
        assert!(lips.is_open(LipSide::Left, 0.25));
        assert!(!lips.is_open(LipSide::Right, 0.75));
        assert!(lips.is_open(LipSide::Front, 0.5));
        assert_eq!(ctx.room.performer.position.y, TRIPLE_DOOR_PLATFORM_HEIGHT);
    }

    #[test]
    fn triple_door_without_a_drop_starts_in_place() {
        let mut ctx = context(
            r#"{"room_dimensions": {"x": 5, "y": 5, "z": 6},
                "shortcut_triple_door_choice": {"add_lips": false, "restrict_open_doors": false}}"#,
            2,
        );
        structural(&mut ctx).unwrap();
        assert!(ctx.events.is_empty());
        assert!(ctx.freezes.is_empty());
        assert!(!ctx.room.restrict_open_doors);
        assert!(ctx.objects.iter().all(|o| o.final_position.is_none() && o.lips.is_none()));
        let top = ctx
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Wall)
            .map(|o| o.position.y + o.dimensions.y)
            .fold(0.0, f64::max);
        assert!((top - TRIPLE_DOOR_WALL_TOP).abs() < 1e-9);
    }

    #[test]
    fn shortcut_goals_imply_a_category() {
        let cfg = ScenarioConfig::from_json_str(r#"{"forced_choice_multi_retrieval_target": true}"#)
            .unwrap();
        assert_eq!(goal_category(&cfg), Some(GoalCategory::MultiRetrieval));
        let cfg = ScenarioConfig::from_json_str(r#"{"shortcut_agent_with_target": true}"#).unwrap();
        assert_eq!(goal_category(&cfg), Some(GoalCategory::Retrieval));
        assert_eq!(goal_category(&ScenarioConfig::default()), None);
    }
}
