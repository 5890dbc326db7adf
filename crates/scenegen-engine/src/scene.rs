//! The scene document: the only externally serialized entity.

use crate::config::{GoalCategory, OccluderOrigin, RoomShape};
use crate::schedule::{FreezeWindow, ScheduledEvent};
use scenegen_core::{Label, ObjectId, RegionId, Vec3, EPSILON};
use scenegen_space::{Cell, ObjectBounds, SpatialRegion, ToolKind};
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

/// Document format version written into every scene.
pub const FORMAT_VERSION: &str = "1.0";

/// Role of an object in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Goal target.
    Target,
    /// Pickupable object that is not a target.
    Interactable,
    /// Openable container.
    Container,
    /// Furniture.
    Obstacle,
    /// Free-standing screen.
    Occluder,
    /// Decoration.
    Context,
    /// Simulated agent.
    Agent,
    /// Interior wall.
    Wall,
    /// Raised platform.
    Platform,
    /// Pushable tool.
    Tool,
    /// Screen on a pole that moves during the scene.
    MovingOccluder,
    /// Ceiling-mounted placer.
    Placer,
    /// Sloped walkway up to a raised surface.
    Ramp,
    /// Door panel set into a structural wall.
    Door,
}

impl ObjectKind {
    /// Whether the performer cannot walk through objects of this kind.
    pub fn blocks_navigation(self) -> bool {
        matches!(
            self,
            Self::Container
                | Self::Obstacle
                | Self::Occluder
                | Self::Context
                | Self::Agent
                | Self::Wall
                | Self::MovingOccluder
        )
    }

    /// Whether objects of this kind hang from the ceiling.
    pub fn is_mechanism(self) -> bool {
        matches!(self, Self::Placer)
    }
}

/// Configuration entry an object was created from, e.g. `placers[2]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeclarationKey(pub String);

impl DeclarationKey {
    /// Key for element `index` of list `list`.
    pub fn new(list: &str, index: usize) -> Self {
        Self(format!("{list}[{index}]"))
    }

    /// Key for an object created by a shortcut.
    pub fn shortcut(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for DeclarationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grid placement of a tool.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ToolPlacement {
    /// Silhouette family.
    pub kind: ToolKind,
    /// Bar length in cells.
    pub length: u32,
    /// Clockwise quarter turns from `+z`.
    pub quarter_turns: u8,
    /// Cell under the near end of the bar.
    pub origin: Cell,
}

/// Edge of a platform, in the platform's own frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LipSide {
    /// Local `+z`.
    Front,
    /// Local `-z`.
    Back,
    /// Local `-x`.
    Left,
    /// Local `+x`.
    Right,
}

/// Opening in a lip. `low` and `high` are fractions of the side's length,
/// measured from the back for `left`/`right` and from the left for
/// `front`/`back`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LipGap {
    /// Side the gap is cut into.
    pub side: LipSide,
    /// Start of the opening.
    pub low: f64,
    /// End of the opening.
    pub high: f64,
}

/// Raised edges that keep the performer from stepping off a platform.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlatformLips {
    /// Lip along local `+z`.
    pub front: bool,
    /// Lip along local `-z`.
    pub back: bool,
    /// Lip along local `-x`.
    pub left: bool,
    /// Lip along local `+x`.
    pub right: bool,
    /// Openings in the lips.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<LipGap>,
}

impl PlatformLips {
    /// Whether `side` carries a lip.
    pub fn has(&self, side: LipSide) -> bool {
        match side {
            LipSide::Front => self.front,
            LipSide::Back => self.back,
            LipSide::Left => self.left,
            LipSide::Right => self.right,
        }
    }

    /// Whether the performer can cross `side` at fraction `t` of its
    /// length.
    pub fn is_open(&self, side: LipSide, t: f64) -> bool {
        !self.has(side)
            || self
                .gaps
                .iter()
                .any(|g| g.side == side && t >= g.low - EPSILON && t <= g.high + EPSILON)
    }
}

/// A concrete object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectInstance {
    /// Scene-unique id.
    pub id: ObjectId,
    /// Role.
    pub kind: ObjectKind,
    /// Catalog shape name.
    pub shape: String,
    /// Material, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Bottom centre at step 0.
    pub position: Vec3,
    /// Rotation about the vertical axis, degrees.
    pub rotation_y: f64,
    /// Scale applied to the catalog dimensions.
    pub scale: Vec3,
    /// Scaled dimensions.
    pub dimensions: Vec3,
    /// Labels the object was registered under.
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub labels: SmallVec<[Label; 2]>,
    /// Declaration that created the object.
    pub declaration: DeclarationKey,
    /// Where the object rests once its events finish, when it moves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_position: Option<Vec3>,
    /// Placer holding the object at step 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub held_by: Option<ObjectId>,
    /// Placer that removes the object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_by: Option<ObjectId>,
    /// Container the object starts inside.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contained_in: Option<ObjectId>,
    /// Agent the object is associated with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_with: Option<ObjectId>,
    /// Grid placement, for tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolPlacement>,
    /// Side the pole attaches from, for moving occluders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pole_origin: Option<OccluderOrigin>,
    /// Edge lips, for platforms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lips: Option<PlatformLips>,
}

impl ObjectInstance {
    /// Unit-scale object of `kind` at the origin with no relations.
    pub fn new(
        id: ObjectId,
        kind: ObjectKind,
        shape: impl Into<String>,
        declaration: DeclarationKey,
    ) -> Self {
        Self {
            id,
            kind,
            shape: shape.into(),
            material: None,
            position: Vec3::ZERO,
            rotation_y: 0.0,
            scale: Vec3::splat(1.0),
            dimensions: Vec3::ZERO,
            labels: SmallVec::new(),
            declaration,
            final_position: None,
            held_by: None,
            picked_up_by: None,
            contained_in: None,
            associated_with: None,
            tool: None,
            pole_origin: None,
            lips: None,
        }
    }

    /// Set the step-0 pose.
    pub fn at(mut self, position: Vec3, rotation_y: f64) -> Self {
        self.position = position;
        self.rotation_y = rotation_y;
        self
    }

    /// Set scale and scaled dimensions.
    pub fn sized(mut self, scale: Vec3, dimensions: Vec3) -> Self {
        self.scale = scale;
        self.dimensions = dimensions;
        self
    }

    /// Set the material.
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Bounds at step 0.
    pub fn bounds(&self) -> ObjectBounds {
        ObjectBounds::new(self.position, self.dimensions, self.rotation_y)
    }

    /// Where the object rests after every event.
    pub fn resting_position(&self) -> Vec3 {
        self.final_position.unwrap_or(self.position)
    }

    /// Bounds after every event.
    pub fn final_bounds(&self) -> ObjectBounds {
        ObjectBounds::new(self.resting_position(), self.dimensions, self.rotation_y)
    }

    /// Whether the object is still in the scene after every event and
    /// stands on its own footprint.
    pub fn is_free_standing(&self) -> bool {
        self.picked_up_by.is_none() && self.contained_in.is_none() && !self.kind.is_mechanism()
    }

    /// Whether the object carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.as_str() == label)
    }
}

/// Room geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RoomDescriptor {
    /// Width, height and depth.
    pub dimensions: Vec3,
    /// Footprint shape.
    pub shape: RoomShape,
}

/// Material of each outer wall.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WallMaterials {
    /// Far wall, at `+z`.
    pub back: String,
    /// Near wall, at `-z`.
    pub front: String,
    /// Wall at `-x`.
    pub left: String,
    /// Wall at `+x`.
    pub right: String,
}

impl WallMaterials {
    /// Every wall in `material`.
    pub fn uniform(material: &str) -> Self {
        Self {
            back: material.to_owned(),
            front: material.to_owned(),
            left: material.to_owned(),
            right: material.to_owned(),
        }
    }
}

/// Ceiling, floor and wall materials.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoomMaterials {
    /// Ceiling material.
    pub ceiling: String,
    /// Floor material.
    pub floor: String,
    /// Shared wall material; the default for every outer wall.
    pub wall: String,
    /// Per-wall materials.
    pub walls: WallMaterials,
}

/// Where the performer starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PerformerStart {
    /// Position of the performer's feet.
    pub position: Vec3,
    /// Facing, degrees clockwise from `+z`.
    pub rotation_y: f64,
}

/// Final object ids on each side of a forced-choice scene.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForcedChoiceOutcome {
    /// Objects left of the platform after every placer finishes.
    pub left: Vec<ObjectId>,
    /// Objects right of the platform after every placer finishes.
    pub right: Vec<ObjectId>,
}

/// Goal descriptor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Goal {
    /// Goal category.
    pub category: GoalCategory,
    /// Target objects.
    pub targets: Vec<ObjectId>,
    /// Step limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_step: Option<u32>,
    /// Steps during which the performer may not act.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub action_freezes: Vec<FreezeWindow>,
    /// Side membership for forced-choice scenes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_choice: Option<ForcedChoiceOutcome>,
}

/// A floor region with its render material.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneRegion {
    /// Region geometry.
    #[serde(flatten)]
    pub region: SpatialRegion,
    /// Render material, when the region is drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl SceneRegion {
    /// Region id.
    pub fn id(&self) -> RegionId {
        self.region.id
    }
}

/// A complete generated scene.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    /// Document format version.
    pub format_version: String,
    /// Seed the caller asked for.
    pub seed: u64,
    /// Zero-based attempt that produced the scene.
    pub attempt: u32,
    /// Room geometry.
    pub room: RoomDescriptor,
    /// Room materials.
    pub materials: RoomMaterials,
    /// Performer start.
    pub performer_start: PerformerStart,
    /// Every object, in creation order.
    pub objects: Vec<ObjectInstance>,
    /// Every floor region, in creation order.
    pub regions: Vec<SceneRegion>,
    /// Goal, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    /// Event timeline in start order.
    pub events: Vec<ScheduledEvent>,
    /// The performer may open only one door.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub restrict_open_doors: bool,
}

impl Scene {
    /// Look up an object.
    pub fn object(&self, id: ObjectId) -> Option<&ObjectInstance> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Objects carrying `label`.
    pub fn objects_labelled<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a ObjectInstance> + 'a {
        self.objects.iter().filter(move |o| o.has_label(label))
    }

    /// Objects of `kind`.
    pub fn objects_of(&self, kind: ObjectKind) -> impl Iterator<Item = &ObjectInstance> + '_ {
        self.objects.iter().filter(move |o| o.kind == kind)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
