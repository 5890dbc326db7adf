//! `RoomInit`: room size, materials and the performer start.

use super::{
    PhaseContext, RoomState, SharedDecisions, MIN_GAP, PERFORMER_HALF_WIDTH, PERFORMER_HEIGHT,
};
use crate::catalog::ROOM_MATERIALS;
use crate::config::{
    GenerationOptions, RoomShape, ScenarioConfig, TRIPLE_DOOR_MIN_ROOM_X, TRIPLE_DOOR_MIN_ROOM_Y,
};
use crate::labels::LabelRegistry;
use crate::sampler::Sampler;
use crate::scene::{PerformerStart, RoomMaterials, WallMaterials};
use indexmap::IndexMap;
use scenegen_core::{GenerationError, OneOf, PartialVec3, Randomizable, Vec3};
use scenegen_space::{ObjectBounds, RoomGrid, SpatialIndex, ROOM_MAX_XZ};

/// Width and depth drawn when the scenario leaves them unset.
pub const DEFAULT_ROOM_XZ: (u32, u32) = (5, 30);

/// Height drawn when the scenario leaves it unset.
pub const DEFAULT_ROOM_Y: (u32, u32) = (3, 8);

/// Smallest long side that fits a lava moat, an island and a tool.
pub const LAVA_TOOL_MIN_LONG: u32 = 13;

/// Smallest short side that fits a lava moat and an island.
pub const LAVA_TOOL_MIN_SHORT: u32 = 7;

fn sample_room(config: &ScenarioConfig, sampler: &mut Sampler) -> Result<RoomGrid, GenerationError> {
    let dims = config.room_dimensions.clone().unwrap_or_default();
    let xz = Randomizable::range(DEFAULT_ROOM_XZ.0, DEFAULT_ROOM_XZ.1);
    let y = Randomizable::range(DEFAULT_ROOM_Y.0, DEFAULT_ROOM_Y.1);
    let lava_tool = config
        .shortcut_lava_target_tool
        .as_ref()
        .and_then(|s| s.enabled())
        .is_some();
    let triple_door = config
        .shortcut_triple_door_choice
        .as_ref()
        .and_then(|s| s.enabled())
        .is_some();

    sampler.retry("room dimensions", |s| {
        let x = s.sample_or(dims.x.as_ref(), &xz).ok()?;
        let z = match config.room_shape {
            Some(RoomShape::Square) => x,
            _ => s.sample_or(dims.z.as_ref(), &xz).ok()?,
        };
        let mut h = s.sample_or(dims.y.as_ref(), &y).ok()?;
        if triple_door {
            if x < TRIPLE_DOOR_MIN_ROOM_X {
                return None;
            }
            h = h.max(TRIPLE_DOOR_MIN_ROOM_Y);
        }
        if config.room_shape == Some(RoomShape::Rectangle) && x == z {
            return None;
        }
        if lava_tool && (x.max(z) < LAVA_TOOL_MIN_LONG || x.min(z) < LAVA_TOOL_MIN_SHORT) {
            return None;
        }
        let room = RoomGrid::new(x, h, z).ok()?;
        (room.diagonal() <= ROOM_MAX_XZ as f64).then_some(room)
    })
}

fn material(
    sampler: &mut Sampler,
    configured: Option<&OneOf<String>>,
) -> Result<String, GenerationError> {
    match configured {
        Some(options) => sampler.choose(options),
        None => sampler
            .pick(ROOM_MATERIALS)
            .map(|m| (*m).to_owned())
            .ok_or_else(|| GenerationError::config("materials", "no room materials")),
    }
}

/// Bounds kept clear around a performer standing at `position`.
pub(crate) fn performer_area(position: Vec3) -> ObjectBounds {
    let side = 2.0 * (PERFORMER_HALF_WIDTH + MIN_GAP);
    ObjectBounds::new(position, Vec3::new(side, PERFORMER_HEIGHT, side), 0.0)
}

/// Run `RoomInit` and build the attempt context.
pub(crate) fn init<'a>(
    config: &'a ScenarioConfig,
    options: &'a GenerationOptions,
    mut sampler: Sampler,
) -> Result<PhaseContext<'a>, GenerationError> {
    let grid = sample_room(config, &mut sampler)?;
    let shape = config.room_shape.unwrap_or(if grid.width() == grid.depth() {
        RoomShape::Square
    } else {
        RoomShape::Rectangle
    });
    let ceiling = material(&mut sampler, config.ceiling_material.as_ref())?;
    let floor = material(&mut sampler, config.floor_material.as_ref())?;
    let wall = material(&mut sampler, config.wall_material.as_ref())?;
    let mut wall_for = |configured: Option<&OneOf<String>>| match configured {
        Some(options) => sampler.choose(options),
        None => Ok(wall.clone()),
    };
    let walls = WallMaterials {
        back: wall_for(config.wall_back_material.as_ref())?,
        front: wall_for(config.wall_front_material.as_ref())?,
        left: wall_for(config.wall_left_material.as_ref())?,
        right: wall_for(config.wall_right_material.as_ref())?,
    };
    let materials = RoomMaterials {
        ceiling,
        floor,
        wall,
        walls,
    };

    let margin = PERFORMER_HALF_WIDTH + MIN_GAP;
    let start = sampler.retry("performer start", |s| {
        let fixed = match &config.performer_start_position {
            Some(p) => p.sample(s.rng()).ok()?,
            None => PartialVec3::default(),
        };
        let x = match fixed.x {
            Some(x) => x,
            None => s.uniform(-grid.half_x() + margin, grid.half_x() - margin),
        };
        let z = match fixed.z {
            Some(z) => z,
            None => s.uniform(-grid.half_z() + margin, grid.half_z() - margin),
        };
        let position = Vec3::new(x, fixed.y.unwrap_or(0.0), z);
        grid.contains_point(position).then_some(position)
    })?;
    let rotation_y = match &config.performer_start_rotation_y {
        Some(r) => sampler.sample(r)?,
        None => f64::from(sampler.int(0, 359)),
    };
    let last_step = config
        .last_step
        .as_ref()
        .map(|r| sampler.sample(r))
        .transpose()?;

    let mut index = SpatialIndex::new(grid);
    index.reserve(performer_area(start));
    tracing::trace!(x = start.x, z = start.z, rotation_y, "performer start");

    Ok(PhaseContext {
        config,
        options,
        sampler,
        index,
        registry: LabelRegistry::new(),
        room: RoomState {
            grid,
            shape,
            materials,
            performer: PerformerStart {
                position: start,
                rotation_y,
            },
            last_step,
            restrict_open_doors: config.restrict_open_doors,
        },
        objects: Vec::new(),
        region_materials: IndexMap::new(),
        events: Vec::new(),
        shared: SharedDecisions::default(),
        goal_targets: Vec::new(),
        path_checks: Vec::new(),
        forced_choice: None,
        claimed: Vec::new(),
        freezes: Vec::new(),
    })
}

impl PhaseContext<'_> {
    /// Move the performer start and its reservation.
    pub(crate) fn move_performer(&mut self, position: Vec3, rotation_y: f64) {
        self.index.clear_reservations();
        self.index.reserve(performer_area(position));
        self.room.performer = PerformerStart {
            position,
            rotation_y,
        };
    }
}
