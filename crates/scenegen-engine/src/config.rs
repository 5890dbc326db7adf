//! Scenario configuration and generator options.
//!
//! A [`ScenarioConfig`] is the declarative description of a family of
//! scenes. It deserializes from any serde format; JSON documents are read
//! through [`ScenarioConfig::from_json_str`], which reports the path of
//! the offending entry on failure. Unknown keys are rejected everywhere.
//!
//! [`GenerationOptions`] holds engine-side knobs that are not part of the
//! scenario itself: attempt cap, placement budget and placement policies.

use crate::catalog::{self, ToolShape};
use scenegen_core::{
    GenerationError, Label, MinMax, OneOf, Randomizable, ScaleConfig, ValueError,
    VectorRandomizable,
};
use scenegen_space::{ToolKind, ROOM_MAX_XZ, ROOM_MAX_Y, ROOM_MIN_XZ, ROOM_MIN_Y};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Narrowest room the triple-door shortcut fits in.
pub const TRIPLE_DOOR_MIN_ROOM_X: u32 = 5;

/// Lowest room the triple-door shortcut fits in; lower rooms are raised.
pub const TRIPLE_DOOR_MIN_ROOM_Y: u32 = 5;

// ── Errors ──────────────────────────────────────────────────────────

/// Errors from reading or validating a scenario configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The document could not be deserialized.
    #[error("cannot parse `{path}`: {reason}")]
    Parse {
        /// Path of the entry that failed to parse.
        path: String,
        /// Deserializer message.
        reason: String,
    },
    /// The document parsed but violates a constraint.
    #[error("invalid `{path}`: {reason}")]
    Invalid {
        /// Path of the offending entry.
        path: String,
        /// What is wrong.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    fn value(path: impl Into<String>, err: ValueError) -> Self {
        Self::invalid(path, err.to_string())
    }
}

impl From<ConfigError> for GenerationError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Parse { path, reason } | ConfigError::Invalid { path, reason } => {
                GenerationError::Configuration { path, reason }
            }
        }
    }
}

// ── Serde helpers ───────────────────────────────────────────────────

fn one_or_many<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }
    Ok(match OneOrMany::deserialize(d)? {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(v) => v,
    })
}

fn default_num() -> Randomizable<u32> {
    Randomizable::Fixed(1)
}

fn is_default_num(n: &Randomizable<u32>) -> bool {
    *n == default_num()
}

fn is_zero(n: &Randomizable<u32>) -> bool {
    *n == Randomizable::Fixed(0)
}

/// A shortcut toggled with `true` or configured with options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shortcut<T> {
    /// `true` enables the shortcut with default options.
    Flag(bool),
    /// Enabled with explicit options.
    Options(T),
}

impl<T: Clone + Default> Shortcut<T> {
    /// Options if the shortcut is enabled.
    pub fn enabled(&self) -> Option<T> {
        match self {
            Self::Flag(true) => Some(T::default()),
            Self::Flag(false) => None,
            Self::Options(o) => Some(o.clone()),
        }
    }
}

// ── Enumerations ────────────────────────────────────────────────────

/// Room footprint constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomShape {
    /// Width equals depth.
    Square,
    /// Width differs from depth.
    Rectangle,
}

/// Reachability requirement checked after events resolve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PathCheck {
    /// No reachability check.
    #[default]
    Off,
    /// A walkable path from the performer's start to the target must
    /// exist.
    Reachable,
    /// The target is reachable only by pushing a tool across the hazard
    /// as a bridge.
    Tools,
}

impl PathCheck {
    /// Mode name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Reachable => "reachable",
            Self::Tools => "tools",
        }
    }
}

impl Serialize for PathCheck {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Off => s.serialize_bool(false),
            Self::Reachable => s.serialize_bool(true),
            Self::Tools => s.serialize_str("tools"),
        }
    }
}

impl<'de> Deserialize<'de> for PathCheck {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Named(String),
        }
        match Raw::deserialize(d)? {
            Raw::Flag(false) => Ok(Self::Off),
            Raw::Flag(true) => Ok(Self::Reachable),
            Raw::Named(s) => match s.as_str() {
                "off" => Ok(Self::Off),
                "reachable" => Ok(Self::Reachable),
                "tools" => Ok(Self::Tools),
                other => Err(serde::de::Error::unknown_variant(
                    other,
                    &["off", "reachable", "tools"],
                )),
            },
        }
    }
}

/// Goal category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalCategory {
    /// Retrieve exactly one target.
    #[serde(rename = "retrieval")]
    Retrieval,
    /// Retrieve every target.
    #[serde(rename = "multi retrieval", alias = "multi_retrieval")]
    MultiRetrieval,
}

impl GoalCategory {
    /// Category name as written in documents.
    pub fn name(self) -> &'static str {
        match self {
            Self::Retrieval => "retrieval",
            Self::MultiRetrieval => "multi retrieval",
        }
    }
}

/// Keyword object family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordKind {
    /// Containers that can hold pickupables.
    Containers,
    /// Furniture to walk around.
    Obstacles,
    /// Free-standing screens.
    Occluders,
    /// Pickupables that resemble the goal target but differ from it.
    Confusors,
    /// Decorative context objects.
    Context,
}

/// Position of an object relative to the performer or another object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordLocation {
    /// In the performer's initial view.
    Front,
    /// Behind the performer's initial view.
    Back,
    /// Between the performer and the relative object.
    Between,
    /// Behind the relative object from the performer's viewpoint.
    Behind,
    /// Next to the relative object.
    Adjacent,
    /// Next to the performer's start.
    AdjacentPerformer,
    /// Inside a container.
    In,
    /// On top of the relative object.
    OnTop,
    /// Mirrored across the x axis from the relative object.
    OppositeX,
    /// Mirrored across the z axis from the relative object.
    OppositeZ,
    /// Anywhere free.
    Random,
    /// Next to an agent, which is associated with the object.
    AssociatedWithAgent,
}

impl KeywordLocation {
    /// Whether the keyword needs `relative_object_label`.
    pub fn needs_relative_object(self) -> bool {
        matches!(
            self,
            Self::Between
                | Self::Behind
                | Self::Adjacent
                | Self::In
                | Self::OnTop
                | Self::OppositeX
                | Self::OppositeZ
                | Self::AssociatedWithAgent
        )
    }
}

/// Side from which a moving occluder's pole attaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccluderOrigin {
    /// Pole descends from the ceiling.
    Top,
    /// Pole extends from the front wall.
    Front,
    /// Pole extends from the back wall.
    Back,
    /// Pole extends from the left wall.
    Left,
    /// Pole extends from the right wall.
    Right,
}

// ── Room & global settings ──────────────────────────────────────────

/// Per-axis room dimensions; unset axes use the default range.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoomDimensionsConfig {
    /// Width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Randomizable<u32>>,
    /// Ceiling height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Randomizable<u32>>,
    /// Depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Randomizable<u32>>,
}

/// Goal declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoalConfig {
    /// Goal category.
    pub category: GoalCategory,
    /// Template for newly created targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<InteractableObjectConfig>,
    /// Bind already-labelled objects as targets instead of creating new
    /// ones.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub target_labels: Vec<Label>,
}

// ── Objects ─────────────────────────────────────────────────────────

/// Relative placement directive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordLocationConfig {
    /// Placement keyword.
    pub keyword: KeywordLocation,
    /// Object the keyword is relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_object_label: Option<Label>,
    /// Distance for `adjacent` and `adjacent_performer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Randomizable<f64>>,
}

/// Properties sampled once per declaration and shared by every instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharedObjectConfig {
    /// Shared shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<OneOf<String>>,
    /// Shared scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleConfig>,
    /// Shared material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<OneOf<String>>,
    /// Shared vertical rotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
}

/// Interactable object declaration (`specific_interactable_objects` and
/// goal targets).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractableObjectConfig {
    /// How many objects to create.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Shape; random pickupable if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<OneOf<String>>,
    /// Scale factor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleConfig>,
    /// Material; random compatible material if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<OneOf<String>>,
    /// Explicit position; unset components are sampled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorRandomizable>,
    /// Rotation about the vertical axis in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Relative placement; overrides `position`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_location: Option<OneOf<KeywordLocationConfig>>,
    /// Labels attached to every created object.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    /// Copy shape, scale and material from the labelled object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identical_to: Option<Label>,
    /// Copy shape and scale but choose a different material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identical_except_color: Option<Label>,
    /// Allowed floor distance from the performer's start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_performer: Option<MinMax<f64>>,
    /// Reachability requirement for these objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_valid_path: Option<PathCheck>,
    /// Values drawn once and shared by all `num` instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomize_once: Option<SharedObjectConfig>,
}

impl Default for InteractableObjectConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            shape: None,
            scale: None,
            material: None,
            position: None,
            rotation_y: None,
            keyword_location: None,
            labels: Vec::new(),
            identical_to: None,
            identical_except_color: None,
            distance_from_performer: None,
            check_valid_path: None,
            randomize_once: None,
        }
    }
}

/// Keyword object declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordObjectsConfig {
    /// Object family.
    pub keyword: KeywordKind,
    /// How many objects to create.
    #[serde(default = "default_num", skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Relative placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_location: Option<OneOf<KeywordLocationConfig>>,
    /// Labels attached to every created object.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub labels: Vec<Label>,
}

/// Agent movement along sampled waypoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentMovementConfig {
    /// Step on which the agent starts walking.
    pub step_begin: Randomizable<u32>,
    /// Start after the labelled objects finish moving.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub activate_after: Vec<Label>,
    /// Number of random waypoints.
    pub num_points: Randomizable<u32>,
}

impl Default for AgentMovementConfig {
    fn default() -> Self {
        Self {
            step_begin: Randomizable::range(1, 10),
            activate_after: Vec::new(),
            num_points: Randomizable::range(1, 4),
        }
    }
}

/// Agent declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// How many agents to create.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Agent shape; random agent if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<OneOf<String>>,
    /// Explicit position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorRandomizable>,
    /// Rotation about the vertical axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Labels attached to every created agent.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    /// Optional walking route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<AgentMovementConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            shape: None,
            position: None,
            rotation_y: None,
            labels: Vec::new(),
            movement: None,
        }
    }
}

// ── Structural objects ──────────────────────────────────────────────

/// Interior wall declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WallConfig {
    /// How many walls.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Explicit position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorRandomizable>,
    /// Rotation about the vertical axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Wall length.
    pub width: Randomizable<f64>,
    /// Wall height; room height if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Randomizable<f64>>,
    /// Material; a room material if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<OneOf<String>>,
    /// Labels.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            position: None,
            rotation_y: None,
            width: Randomizable::range(1.0, 5.0),
            height: None,
            material: None,
            labels: Vec::new(),
        }
    }
}

/// Raised platform declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// How many platforms.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Explicit position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorRandomizable>,
    /// Rotation about the vertical axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Width, height and depth of the platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleConfig>,
    /// Material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<OneOf<String>>,
    /// Ramps leading up to each platform's top.
    #[serde(skip_serializing_if = "is_zero")]
    pub attached_ramps: Randomizable<u32>,
    /// Labels.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            position: None,
            rotation_y: None,
            scale: None,
            material: None,
            attached_ramps: Randomizable::Fixed(0),
            labels: Vec::new(),
        }
    }
}

/// Free-standing ramp declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RampConfig {
    /// How many ramps.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Explicit position of the ramp's footprint centre.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorRandomizable>,
    /// Rotation; snapped to multiples of 90 degrees. The ramp rises
    /// toward its local `+z`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Slope in degrees.
    pub angle: Randomizable<f64>,
    /// Width across the slope; drawn from the room size if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Randomizable<f64>>,
    /// Length along the floor; drawn from the room size and the headroom
    /// if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<Randomizable<f64>>,
    /// Material; a room material if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<OneOf<String>>,
    /// Labels, in addition to `ramps`.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            position: None,
            rotation_y: None,
            angle: Randomizable::range(15.0, 45.0),
            width: None,
            length: None,
            material: None,
            labels: Vec::new(),
        }
    }
}

/// Door set into a wall that spans part of the room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoorConfig {
    /// How many doors.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Explicit position; `y` raises the door and its wall.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorRandomizable>,
    /// Rotation; snapped to multiples of 90 degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Door material; a metal, plastic or wood if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<OneOf<String>>,
    /// Wall material; a room material other than the door's if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_material: Option<OneOf<String>>,
    /// Wall width including the door; drawn between 2 and the room size
    /// along the wall if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_scale_x: Option<Randomizable<f64>>,
    /// Wall height; drawn between 2 and the room height if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_scale_y: Option<Randomizable<f64>>,
    /// Labels, in addition to `doors`. Attached to the door panel only.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            position: None,
            rotation_y: None,
            material: None,
            wall_material: None,
            wall_scale_x: None,
            wall_scale_y: None,
            labels: Vec::new(),
        }
    }
}

/// Lava pool or floor hole declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FloorAreaConfig {
    /// How many areas.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Seed cell x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<Randomizable<i32>>,
    /// Seed cell z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_z: Option<Randomizable<i32>>,
    /// Number of contiguous cells grown from the seed.
    pub size: Randomizable<u32>,
    /// Labels.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for FloorAreaConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            position_x: None,
            position_z: None,
            size: Randomizable::Fixed(1),
            labels: Vec::new(),
        }
    }
}

/// Tool declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// How many tools.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Tool name or kind (`rect`, `hooked`, `isosceles`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<OneOf<String>>,
    /// Explicit position of the tool's centre.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorRandomizable>,
    /// Rotation; snapped to multiples of 90 degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Labels.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            shape: None,
            position: None,
            rotation_y: None,
            labels: Vec::new(),
        }
    }
}

/// Static wall placed to hide a labelled object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OccludingWallConfig {
    /// How many walls.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Object to hide from the performer's start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_label: Option<Label>,
    /// Extra width beyond the hidden object's width.
    pub width_margin: Randomizable<f64>,
    /// Wall height.
    pub height: Randomizable<f64>,
    /// Labels.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for OccludingWallConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            target_label: None,
            width_margin: Randomizable::range(0.5, 1.5),
            height: Randomizable::range(1.0, 2.0),
            labels: Vec::new(),
        }
    }
}

/// Borrowed view of the trigger options every mechanism carries.
#[derive(Clone, Copy, Debug)]
pub struct Trigger<'a> {
    /// Absolute step.
    pub activation_step: Option<&'a Randomizable<u32>>,
    /// Start after every labelled mechanism finishes moving.
    pub activate_after: &'a [Label],
    /// Start at step 1 unless a labelled mechanism starts at step 1 or
    /// earlier, in which case start after all of them finish.
    pub activate_on_start_or_after: &'a [Label],
}

/// Moving occluder declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovingOccluderConfig {
    /// How many occluders.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Centre x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<Randomizable<f64>>,
    /// Centre z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_z: Option<Randomizable<f64>>,
    /// Rotation about the vertical axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<Randomizable<f64>>,
    /// Screen width.
    pub occluder_width: Randomizable<f64>,
    /// Screen height.
    pub occluder_height: Randomizable<f64>,
    /// Screen thickness.
    pub occluder_thickness: Randomizable<f64>,
    /// Pole origin; weighted towards `top` by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<OneOf<OccluderOrigin>>,
    /// Start raised and only descend.
    pub move_down_only: OneOf<bool>,
    /// Repeat the full cycle.
    pub repeat_movement: OneOf<bool>,
    /// Steps between repeated cycles.
    pub repeat_interval: Randomizable<u32>,
    /// Absolute start step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_step: Option<Randomizable<u32>>,
    /// Start after every labelled mechanism finishes moving.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub activate_after: Vec<Label>,
    /// Start at step 1 unless a labelled mechanism starts that early.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub activate_on_start_or_after: Vec<Label>,
    /// Labels.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for MovingOccluderConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            position_x: None,
            position_z: None,
            rotation_y: None,
            occluder_width: Randomizable::range(0.25, 3.0),
            occluder_height: Randomizable::range(1.0, 1.8),
            occluder_thickness: Randomizable::Fixed(0.1),
            origin: None,
            move_down_only: OneOf::Fixed(false),
            repeat_movement: OneOf::Fixed(false),
            repeat_interval: Randomizable::range(1, 20),
            activation_step: None,
            activate_after: Vec::new(),
            activate_on_start_or_after: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl MovingOccluderConfig {
    /// Trigger options.
    pub fn trigger(&self) -> Trigger<'_> {
        Trigger {
            activation_step: self.activation_step.as_ref(),
            activate_after: &self.activate_after,
            activate_on_start_or_after: &self.activate_on_start_or_after,
        }
    }
}

/// Placer values drawn once per declaration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharedPlacerConfig {
    /// Shared pickup-or-place decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_object: Option<OneOf<bool>>,
    /// Shared activation step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_step: Option<Randomizable<u32>>,
    /// Shared held-object shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_object_shape: Option<OneOf<String>>,
    /// Shared held-object scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_object_scale: Option<ScaleConfig>,
}

/// Placer declaration: a cylinder descending from the ceiling to place
/// or pick up an object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacerConfig {
    /// How many placers.
    #[serde(skip_serializing_if = "is_default_num")]
    pub num: Randomizable<u32>,
    /// Absolute start step; `1..=10` when no trigger is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_step: Option<Randomizable<u32>>,
    /// Start after every labelled mechanism finishes moving.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub activate_after: Vec<Label>,
    /// Start at step 1 unless a labelled mechanism starts that early.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub activate_on_start_or_after: Vec<Label>,
    /// Step on which the held object is released.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivation_step: Option<Randomizable<u32>>,
    /// Height of the held object's bottom when released.
    pub end_height: Randomizable<f64>,
    /// Release at the top of the labelled object instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_height_relative_object_label: Option<Label>,
    /// Held object position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_object_position: Option<VectorRandomizable>,
    /// Position the placer above the labelled object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_object_above: Option<Label>,
    /// Held object shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_object_shape: Option<OneOf<String>>,
    /// Held object scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_object_scale: Option<ScaleConfig>,
    /// Held object material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_object_material: Option<OneOf<String>>,
    /// Labels for the held object; for pickups, the object to pick up.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub placed_object_labels: Vec<Label>,
    /// Pick up an existing object instead of placing a new one.
    pub pickup_object: OneOf<bool>,
    /// Descend and ascend without holding anything.
    pub empty_placer: bool,
    /// Values drawn once per declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomize_once: Option<SharedPlacerConfig>,
    /// Labels for the placer itself.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            num: default_num(),
            activation_step: None,
            activate_after: Vec::new(),
            activate_on_start_or_after: Vec::new(),
            deactivation_step: None,
            end_height: Randomizable::Fixed(0.0),
            end_height_relative_object_label: None,
            placed_object_position: None,
            placed_object_above: None,
            placed_object_shape: None,
            placed_object_scale: None,
            placed_object_material: None,
            placed_object_labels: Vec::new(),
            pickup_object: OneOf::Fixed(false),
            empty_placer: false,
            randomize_once: None,
            labels: Vec::new(),
        }
    }
}

impl PlacerConfig {
    /// Trigger options.
    pub fn trigger(&self) -> Trigger<'_> {
        Trigger {
            activation_step: self.activation_step.as_ref(),
            activate_after: &self.activate_after,
            activate_on_start_or_after: &self.activate_on_start_or_after,
        }
    }
}

// ── Shortcuts ───────────────────────────────────────────────────────

/// Options for the lava-island tool puzzle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LavaTargetToolConfig {
    /// Place the target anywhere instead of on the island. Unset uses
    /// the generator's island policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_target_position: Option<OneOf<bool>>,
    /// Target shape; `soccer_ball` by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_shape: Option<OneOf<String>>,
    /// Target scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_scale: Option<ScaleConfig>,
    /// Tool family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<OneOf<ToolKind>>,
    /// Island side length in cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub island_size: Option<Randomizable<u32>>,
    /// Lava width in front of the island.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_lava_width: Option<Randomizable<u32>>,
    /// Lava width behind the island.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rear_lava_width: Option<Randomizable<u32>>,
    /// Lava width to the left of the island.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_lava_width: Option<Randomizable<u32>>,
    /// Lava width to the right of the island.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_lava_width: Option<Randomizable<u32>>,
}

/// Options for the bisecting platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BisectingPlatformConfig {
    /// Add a wall in front of the performer so the first move is a
    /// choice of side.
    pub has_blocking_wall: bool,
    /// Platform height.
    pub platform_height: Randomizable<f64>,
}

impl Default for BisectingPlatformConfig {
    fn default() -> Self {
        Self {
            has_blocking_wall: true,
            platform_height: Randomizable::Fixed(1.0),
        }
    }
}

/// Options for the forced-choice multi-retrieval task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForcedChoiceConfig {
    /// Target shape.
    pub target_shape: OneOf<String>,
    /// Target scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_scale: Option<ScaleConfig>,
    /// Initial objects on the left side.
    pub left_count: Randomizable<u32>,
    /// Initial objects on the right side.
    pub right_count: Randomizable<u32>,
    /// Number of placers that add or remove objects.
    pub placers: Randomizable<u32>,
    /// Lower moving occluders over both sides after the placers finish.
    pub occluders: bool,
}

impl Default for ForcedChoiceConfig {
    fn default() -> Self {
        Self {
            target_shape: OneOf::Fixed("soccer_ball".to_owned()),
            target_scale: None,
            left_count: Randomizable::range(1, 4),
            right_count: Randomizable::range(1, 4),
            placers: Randomizable::range(1, 4),
            occluders: true,
        }
    }
}

/// Options for the triple-door choice: a bisecting platform crossed by a
/// wall with three doors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TripleDoorConfig {
    /// Step at which the wall and doors start dropping into place. Unset
    /// or zero starts them in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_drop_step: Option<Randomizable<u32>>,
    /// Lip the front half of the platform so the performer has to use
    /// the door in front of the area it wants to enter.
    pub add_lips: OneOf<bool>,
    /// Freeze the performer until the wall has dropped.
    pub add_freeze: OneOf<bool>,
    /// Let the performer open only one door.
    pub restrict_open_doors: OneOf<bool>,
    /// Door material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door_material: Option<OneOf<String>>,
    /// Wall material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_material: Option<OneOf<String>>,
}

impl Default for TripleDoorConfig {
    fn default() -> Self {
        Self {
            start_drop_step: None,
            add_lips: OneOf::Fixed(true),
            add_freeze: OneOf::Fixed(true),
            restrict_open_doors: OneOf::Fixed(true),
            door_material: None,
            wall_material: None,
        }
    }
}

/// Options for the agent-holds-target shortcut.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentWithTargetConfig {
    /// Agent position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_position: Option<VectorRandomizable>,
    /// Give the agent a walking route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<AgentMovementConfig>,
}

// ── ScenarioConfig ──────────────────────────────────────────────────

/// Declarative description of a family of scenes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Room dimensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_dimensions: Option<RoomDimensionsConfig>,
    /// Room footprint constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_shape: Option<RoomShape>,
    /// Ceiling material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling_material: Option<OneOf<String>>,
    /// Floor material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_material: Option<OneOf<String>>,
    /// Wall material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_material: Option<OneOf<String>>,
    /// Material of the far wall (`+z`); `wall_material` if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_back_material: Option<OneOf<String>>,
    /// Material of the near wall (`-z`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_front_material: Option<OneOf<String>>,
    /// Material of the `-x` wall.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_left_material: Option<OneOf<String>>,
    /// Material of the `+x` wall.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_right_material: Option<OneOf<String>>,
    /// The performer may open only one door.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub restrict_open_doors: bool,
    /// Performer start position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer_start_position: Option<VectorRandomizable>,
    /// Performer start rotation about the vertical axis.
    #[serde(alias = "performer_start_rotation", skip_serializing_if = "Option::is_none")]
    pub performer_start_rotation_y: Option<Randomizable<f64>>,
    /// Step limit recorded in the goal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_step: Option<Randomizable<u32>>,
    /// Shapes never chosen at random.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_shapes: Vec<String>,
    /// Goal declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<GoalConfig>,
    /// Reachability requirement for goal targets.
    pub check_valid_path: PathCheck,
    /// Freeze the performer while labelled mechanisms move.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub freeze_while_moving: Vec<Label>,
    /// Keyword object declarations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keyword_objects: Vec<KeywordObjectsConfig>,
    /// Interactable object declarations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specific_interactable_objects: Vec<InteractableObjectConfig>,
    /// Agent declarations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specific_agents: Vec<AgentConfig>,
    /// Interior walls.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_walls: Vec<WallConfig>,
    /// Raised platforms.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_platforms: Vec<PlatformConfig>,
    /// Free-standing ramps.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_ramps: Vec<RampConfig>,
    /// Doors in partial walls.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_doors: Vec<DoorConfig>,
    /// Lava pools.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lava: Vec<FloorAreaConfig>,
    /// Floor holes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<FloorAreaConfig>,
    /// Tools.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,
    /// Walls hiding labelled objects.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_occluding_walls: Vec<OccludingWallConfig>,
    /// Moving occluders.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_moving_occluders: Vec<MovingOccluderConfig>,
    /// Placers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub placers: Vec<PlacerConfig>,
    /// Lava-island tool puzzle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_lava_target_tool: Option<Shortcut<LavaTargetToolConfig>>,
    /// Performer starts on a platform splitting the room in two.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_bisecting_platform: Option<Shortcut<BisectingPlatformConfig>>,
    /// Ring of lava along the room walls.
    pub shortcut_lava_room: bool,
    /// Performer starts on a random platform.
    pub shortcut_start_on_platform: bool,
    /// An agent stands next to the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_agent_with_target: Option<Shortcut<AgentWithTargetConfig>>,
    /// Forced-choice multi-retrieval on a bisecting platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_choice_multi_retrieval_target: Option<Shortcut<ForcedChoiceConfig>>,
    /// Bisecting platform crossed by a wall with three doors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_triple_door_choice: Option<Shortcut<TripleDoorConfig>>,
}

impl ScenarioConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        let de = &mut serde_json::Deserializer::from_str(src);
        let cfg: ScenarioConfig = serde_path_to_error::deserialize(de).map_err(|e| {
            ConfigError::Parse {
                path: e.path().to_string(),
                reason: e.inner().to_string(),
            }
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Convert and validate an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let cfg: ScenarioConfig =
            serde_path_to_error::deserialize(value).map_err(|e| ConfigError::Parse {
                path: e.path().to_string(),
                reason: e.inner().to_string(),
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check internal consistency that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_room()?;
        let excluded = &self.excluded_shapes;
        for (path, m) in [
            ("ceiling_material", &self.ceiling_material),
            ("floor_material", &self.floor_material),
            ("wall_material", &self.wall_material),
            ("wall_back_material", &self.wall_back_material),
            ("wall_front_material", &self.wall_front_material),
            ("wall_left_material", &self.wall_left_material),
            ("wall_right_material", &self.wall_right_material),
        ] {
            if let Some(m) = m {
                m.validate().map_err(|e| ConfigError::value(path, e))?;
            }
        }
        if let Some(p) = &self.performer_start_position {
            p.validate()
                .map_err(|e| ConfigError::value("performer_start_position", e))?;
        }
        if let Some(r) = &self.performer_start_rotation_y {
            r.validate()
                .map_err(|e| ConfigError::value("performer_start_rotation_y", e))?;
        }
        if let Some(l) = &self.last_step {
            l.validate().map_err(|e| ConfigError::value("last_step", e))?;
        }
        for name in excluded {
            if !catalog::is_known_shape(name) {
                return Err(ConfigError::invalid(
                    "excluded_shapes",
                    format!("unknown shape `{name}`"),
                ));
            }
        }
        if self.freeze_while_moving.iter().any(|l| l.as_str().is_empty()) {
            return Err(ConfigError::invalid(
                "freeze_while_moving",
                "labels must not be empty",
            ));
        }
        self.validate_goal()?;
        for (i, o) in self.specific_interactable_objects.iter().enumerate() {
            validate_interactable(&format!("specific_interactable_objects[{i}]"), o, excluded)?;
        }
        for (i, k) in self.keyword_objects.iter().enumerate() {
            let path = format!("keyword_objects[{i}]");
            validate_num(&path, &k.num)?;
            validate_keyword_location(&path, k.keyword_location.as_ref())?;
        }
        for (i, a) in self.specific_agents.iter().enumerate() {
            let path = format!("specific_agents[{i}]");
            validate_num(&path, &a.num)?;
            validate_shape(&path, a.shape.as_ref(), excluded)?;
            if let Some(m) = &a.movement {
                m.step_begin
                    .validate()
                    .and_then(|_| m.num_points.validate())
                    .map_err(|e| ConfigError::value(format!("{path}.movement"), e))?;
            }
        }
        for (i, w) in self.structural_walls.iter().enumerate() {
            let path = format!("structural_walls[{i}]");
            validate_num(&path, &w.num)?;
            validate_positive(&format!("{path}.width"), &w.width)?;
            if let Some(h) = &w.height {
                validate_positive(&format!("{path}.height"), h)?;
            }
        }
        for (i, p) in self.structural_platforms.iter().enumerate() {
            let path = format!("structural_platforms[{i}]");
            validate_num(&path, &p.num)?;
            if let Some(s) = &p.scale {
                s.validate()
                    .map_err(|e| ConfigError::value(format!("{path}.scale"), e))?;
            }
        }
        for (i, p) in self.structural_platforms.iter().enumerate() {
            p.attached_ramps.validate().map_err(|e| {
                ConfigError::value(format!("structural_platforms[{i}].attached_ramps"), e)
            })?;
        }
        for (i, r) in self.structural_ramps.iter().enumerate() {
            let path = format!("structural_ramps[{i}]");
            validate_num(&path, &r.num)?;
            validate_positive(&format!("{path}.angle"), &r.angle)?;
            if r.angle.bounds().is_some_and(|(_, hi)| hi >= 90.0) {
                return Err(ConfigError::invalid(
                    format!("{path}.angle"),
                    "must be below 90 degrees",
                ));
            }
            for (field, v) in [("width", &r.width), ("length", &r.length)] {
                if let Some(v) = v {
                    validate_positive(&format!("{path}.{field}"), v)?;
                }
            }
        }
        for (i, d) in self.structural_doors.iter().enumerate() {
            let path = format!("structural_doors[{i}]");
            validate_num(&path, &d.num)?;
            if let Some(x) = &d.wall_scale_x {
                validate_positive(&format!("{path}.wall_scale_x"), x)?;
                if x.bounds().is_some_and(|(lo, _)| lo < 1.0) {
                    return Err(ConfigError::invalid(
                        format!("{path}.wall_scale_x"),
                        "the wall must be at least as wide as the door",
                    ));
                }
            }
            if let Some(y) = &d.wall_scale_y {
                validate_positive(&format!("{path}.wall_scale_y"), y)?;
            }
        }
        self.validate_triple_door()?;
        for (key, list) in [("lava", &self.lava), ("holes", &self.holes)] {
            for (i, a) in list.iter().enumerate() {
                let path = format!("{key}[{i}]");
                validate_num(&path, &a.num)?;
                a.size
                    .validate()
                    .map_err(|e| ConfigError::value(format!("{path}.size"), e))?;
                if a.size.bounds().is_some_and(|(lo, _)| lo == 0) {
                    return Err(ConfigError::invalid(
                        format!("{path}.size"),
                        "areas need at least one cell",
                    ));
                }
            }
        }
        for (i, t) in self.tools.iter().enumerate() {
            let path = format!("tools[{i}]");
            validate_num(&path, &t.num)?;
            if let Some(shape) = &t.shape {
                validate_tool_shape(&format!("{path}.shape"), shape)?;
            }
        }
        for (i, w) in self.structural_occluding_walls.iter().enumerate() {
            let path = format!("structural_occluding_walls[{i}]");
            validate_num(&path, &w.num)?;
            validate_positive(&format!("{path}.height"), &w.height)?;
        }
        for (i, o) in self.structural_moving_occluders.iter().enumerate() {
            let path = format!("structural_moving_occluders[{i}]");
            validate_num(&path, &o.num)?;
            validate_trigger(&path, o.trigger())?;
            for (field, r) in [
                ("occluder_width", &o.occluder_width),
                ("occluder_height", &o.occluder_height),
                ("occluder_thickness", &o.occluder_thickness),
            ] {
                validate_positive(&format!("{path}.{field}"), r)?;
            }
            o.repeat_interval
                .validate()
                .map_err(|e| ConfigError::value(format!("{path}.repeat_interval"), e))?;
        }
        for (i, p) in self.placers.iter().enumerate() {
            validate_placer(&format!("placers[{i}]"), p, excluded)?;
        }
        if let Some(Shortcut::Options(fc)) = &self.forced_choice_multi_retrieval_target {
            for (field, r) in [
                ("left_count", &fc.left_count),
                ("right_count", &fc.right_count),
                ("placers", &fc.placers),
            ] {
                r.validate().map_err(|e| {
                    ConfigError::value(format!("forced_choice_multi_retrieval_target.{field}"), e)
                })?;
            }
        }
        if let Some(Shortcut::Options(lt)) = &self.shortcut_lava_target_tool {
            for (field, r) in [
                ("island_size", &lt.island_size),
                ("front_lava_width", &lt.front_lava_width),
                ("rear_lava_width", &lt.rear_lava_width),
                ("left_lava_width", &lt.left_lava_width),
                ("right_lava_width", &lt.right_lava_width),
            ] {
                if let Some(r) = r {
                    r.validate().map_err(|e| {
                        ConfigError::value(format!("shortcut_lava_target_tool.{field}"), e)
                    })?;
                    if r.bounds().is_some_and(|(lo, _)| lo == 0) {
                        return Err(ConfigError::invalid(
                            format!("shortcut_lava_target_tool.{field}"),
                            "must be at least 1",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_room(&self) -> Result<(), ConfigError> {
        let Some(dims) = &self.room_dimensions else {
            return Ok(());
        };
        for (axis, value, lo, hi) in [
            ("x", &dims.x, ROOM_MIN_XZ, ROOM_MAX_XZ),
            ("y", &dims.y, ROOM_MIN_Y, ROOM_MAX_Y),
            ("z", &dims.z, ROOM_MIN_XZ, ROOM_MAX_XZ),
        ] {
            let Some(v) = value else { continue };
            let path = format!("room_dimensions.{axis}");
            v.validate().map_err(|e| ConfigError::value(&path, e))?;
            if let Some((min, max)) = v.bounds() {
                if min < lo || max > hi {
                    return Err(ConfigError::invalid(
                        path,
                        format!("must lie within [{lo}, {hi}]"),
                    ));
                }
            }
        }
        if self.room_shape == Some(RoomShape::Rectangle) {
            if let (Some(Randomizable::Fixed(x)), Some(Randomizable::Fixed(z))) = (&dims.x, &dims.z)
            {
                if x == z {
                    return Err(ConfigError::invalid(
                        "room_shape",
                        "rectangle requires x != z",
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_triple_door(&self) -> Result<(), ConfigError> {
        let Some(td) = self
            .shortcut_triple_door_choice
            .as_ref()
            .and_then(Shortcut::enabled)
        else {
            return Ok(());
        };
        for (other, on) in [
            (
                "shortcut_bisecting_platform",
                self.shortcut_bisecting_platform
                    .as_ref()
                    .and_then(Shortcut::enabled)
                    .is_some(),
            ),
            (
                "forced_choice_multi_retrieval_target",
                self.forced_choice_multi_retrieval_target
                    .as_ref()
                    .and_then(Shortcut::enabled)
                    .is_some(),
            ),
            ("shortcut_lava_room", self.shortcut_lava_room),
            (
                "shortcut_lava_target_tool",
                self.shortcut_lava_target_tool
                    .as_ref()
                    .and_then(Shortcut::enabled)
                    .is_some(),
            ),
        ] {
            if on {
                return Err(ConfigError::invalid(
                    "shortcut_triple_door_choice",
                    format!("cannot be combined with `{other}`"),
                ));
            }
        }
        if let Some(s) = &td.start_drop_step {
            s.validate().map_err(|e| {
                ConfigError::value("shortcut_triple_door_choice.start_drop_step", e)
            })?;
        }
        for (field, o) in [
            ("add_lips", &td.add_lips),
            ("add_freeze", &td.add_freeze),
            ("restrict_open_doors", &td.restrict_open_doors),
        ] {
            o.validate().map_err(|e| {
                ConfigError::value(format!("shortcut_triple_door_choice.{field}"), e)
            })?;
        }
        let too_narrow = self
            .room_dimensions
            .as_ref()
            .and_then(|d| d.x.as_ref())
            .and_then(Randomizable::bounds)
            .is_some_and(|(_, hi)| hi < TRIPLE_DOOR_MIN_ROOM_X);
        if too_narrow {
            return Err(ConfigError::invalid(
                "room_dimensions.x",
                format!("the triple door needs a room at least {TRIPLE_DOOR_MIN_ROOM_X} wide"),
            ));
        }
        Ok(())
    }

    fn validate_goal(&self) -> Result<(), ConfigError> {
        let forced = self
            .forced_choice_multi_retrieval_target
            .as_ref()
            .and_then(Shortcut::enabled)
            .is_some();
        let Some(goal) = &self.goal else {
            return Ok(());
        };
        if goal.target.is_some() && !goal.target_labels.is_empty() {
            return Err(ConfigError::invalid(
                "goal",
                "set either `target` or `target_labels`, not both",
            ));
        }
        if forced && goal.category == GoalCategory::Retrieval {
            return Err(ConfigError::invalid(
                "goal.category",
                "forced choice requires a multi retrieval goal",
            ));
        }
        if let Some(target) = &goal.target {
            validate_interactable("goal.target", target, &self.excluded_shapes)?;
            if goal.category == GoalCategory::Retrieval && target.num.bounds() != Some((1, 1)) {
                return Err(ConfigError::invalid(
                    "goal.target.num",
                    "retrieval goals have exactly one target",
                ));
            }
        }
        Ok(())
    }

    /// Whether any structural mechanism, agent route, or shortcut that
    /// creates events is configured.
    pub fn has_events(&self) -> bool {
        !self.placers.is_empty()
            || !self.structural_moving_occluders.is_empty()
            || self.specific_agents.iter().any(|a| a.movement.is_some())
            || self.forced_choice_multi_retrieval_target.is_some()
            || self
                .shortcut_triple_door_choice
                .as_ref()
                .and_then(Shortcut::enabled)
                .is_some_and(|td| td.start_drop_step.is_some())
    }
}

fn validate_num(path: &str, num: &Randomizable<u32>) -> Result<(), ConfigError> {
    num.validate()
        .map_err(|e| ConfigError::value(format!("{path}.num"), e))
}

fn validate_positive(path: &str, r: &Randomizable<f64>) -> Result<(), ConfigError> {
    r.validate().map_err(|e| ConfigError::value(path, e))?;
    if r.bounds().is_some_and(|(lo, _)| lo <= 0.0) {
        return Err(ConfigError::invalid(path, "must be positive"));
    }
    Ok(())
}

fn validate_shape(
    path: &str,
    shape: Option<&OneOf<String>>,
    excluded: &[String],
) -> Result<(), ConfigError> {
    let Some(shape) = shape else {
        return Ok(());
    };
    let path = format!("{path}.shape");
    shape.validate().map_err(|e| ConfigError::value(&path, e))?;
    let options = shape.options();
    if let Some(bad) = options.iter().find(|s| !catalog::is_known_shape(s)) {
        return Err(ConfigError::invalid(path, format!("unknown shape `{bad}`")));
    }
    if options.iter().all(|s| excluded.contains(s)) {
        return Err(ConfigError::invalid(
            path,
            "every shape option is in excluded_shapes",
        ));
    }
    Ok(())
}

fn validate_tool_shape(path: &str, shape: &OneOf<String>) -> Result<(), ConfigError> {
    shape.validate().map_err(|e| ConfigError::value(path, e))?;
    for s in shape.options() {
        let is_kind = ToolKind::ALL.iter().any(|k| k.name() == s);
        if !is_kind && ToolShape::parse(&s).is_none() {
            return Err(ConfigError::invalid(path, format!("unknown tool `{s}`")));
        }
    }
    Ok(())
}

fn validate_keyword_location(
    path: &str,
    location: Option<&OneOf<KeywordLocationConfig>>,
) -> Result<(), ConfigError> {
    let Some(location) = location else {
        return Ok(());
    };
    let path = format!("{path}.keyword_location");
    location
        .validate()
        .map_err(|e| ConfigError::value(&path, e))?;
    for kl in location.options() {
        if kl.keyword.needs_relative_object() && kl.relative_object_label.is_none() {
            return Err(ConfigError::invalid(
                path,
                format!("`{:?}` requires relative_object_label", kl.keyword),
            ));
        }
        if let Some(d) = &kl.distance {
            validate_positive(&format!("{path}.distance"), d)?;
        }
    }
    Ok(())
}

fn validate_interactable(
    path: &str,
    o: &InteractableObjectConfig,
    excluded: &[String],
) -> Result<(), ConfigError> {
    validate_num(path, &o.num)?;
    validate_shape(path, o.shape.as_ref(), excluded)?;
    if let Some(s) = &o.scale {
        s.validate()
            .map_err(|e| ConfigError::value(format!("{path}.scale"), e))?;
    }
    if let Some(p) = &o.position {
        p.validate()
            .map_err(|e| ConfigError::value(format!("{path}.position"), e))?;
    }
    validate_keyword_location(path, o.keyword_location.as_ref())?;
    if o.identical_to.is_some() && o.identical_except_color.is_some() {
        return Err(ConfigError::invalid(
            path,
            "identical_to and identical_except_color are mutually exclusive",
        ));
    }
    if let Some(d) = &o.distance_from_performer {
        if d.min < 0.0 || d.min > d.max {
            return Err(ConfigError::invalid(
                format!("{path}.distance_from_performer"),
                "need 0 <= min <= max",
            ));
        }
    }
    if let Some(shared) = &o.randomize_once {
        validate_shape(&format!("{path}.randomize_once"), shared.shape.as_ref(), excluded)?;
    }
    Ok(())
}

fn validate_trigger(path: &str, t: Trigger<'_>) -> Result<(), ConfigError> {
    if let Some(s) = t.activation_step {
        s.validate()
            .map_err(|e| ConfigError::value(format!("{path}.activation_step"), e))?;
    }
    if !t.activate_after.is_empty() && !t.activate_on_start_or_after.is_empty() {
        return Err(ConfigError::invalid(
            path,
            "activate_after and activate_on_start_or_after are mutually exclusive",
        ));
    }
    Ok(())
}

fn validate_placer(path: &str, p: &PlacerConfig, excluded: &[String]) -> Result<(), ConfigError> {
    validate_num(path, &p.num)?;
    validate_trigger(path, p.trigger())?;
    validate_shape(path, p.placed_object_shape.as_ref(), excluded)?;
    p.end_height
        .validate()
        .map_err(|e| ConfigError::value(format!("{path}.end_height"), e))?;
    p.pickup_object
        .validate()
        .map_err(|e| ConfigError::value(format!("{path}.pickup_object"), e))?;
    let may_pickup = p.pickup_object.options().contains(&true)
        || p
            .randomize_once
            .as_ref()
            .and_then(|r| r.pickup_object.as_ref())
            .is_some_and(|o| o.options().contains(&true));
    if may_pickup && p.placed_object_labels.is_empty() {
        return Err(ConfigError::invalid(
            path,
            "pickup_object requires placed_object_labels naming the object to pick up",
        ));
    }
    if p.empty_placer
        && (p.placed_object_shape.is_some()
            || p.placed_object_scale.is_some()
            || p.placed_object_material.is_some()
            || !p.placed_object_labels.is_empty())
    {
        return Err(ConfigError::invalid(
            path,
            "empty_placer cannot be combined with placed_object_* options",
        ));
    }
    Ok(())
}

// ── GenerationOptions ───────────────────────────────────────────────

/// Engine-side generation knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    /// Attempts per scene before giving up. Default: 20.
    pub max_attempts: u32,
    /// Candidates drawn per rejection-sampled placement. Default: 50.
    pub placement_tries: u32,
    /// Probability that the lava-tool target goes on the island when the
    /// configuration does not decide. Default: 0.5.
    pub island_target_probability: f64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            placement_tries: 50,
            island_target_probability: 0.5,
        }
    }
}

impl GenerationOptions {
    /// Check the options are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts", "must be at least 1"));
        }
        if self.placement_tries == 0 {
            return Err(ConfigError::invalid("placement_tries", "must be at least 1"));
        }
        let p = self.island_target_probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::invalid(
                "island_target_probability",
                format!("{p} outside [0, 1]"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_valid() {
        let cfg = ScenarioConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, ScenarioConfig::default());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let err = ScenarioConfig::from_json_str(r#"{"room_dimensionz": {"x": 10}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn unknown_nested_key_reports_path() {
        let err = ScenarioConfig::from_json_str(
            r#"{"room_dimensions": {"x": 10, "w": 3}}"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert!(path.starts_with("room_dimensions")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn check_valid_path_accepts_bool_and_tools() {
        for (src, want) in [
            ("false", PathCheck::Off),
            ("true", PathCheck::Reachable),
            ("\"tools\"", PathCheck::Tools),
        ] {
            let cfg =
                ScenarioConfig::from_json_str(&format!(r#"{{"check_valid_path": {src}}}"#))
                    .unwrap();
            assert_eq!(cfg.check_valid_path, want);
        }
        assert!(ScenarioConfig::from_json_str(r#"{"check_valid_path": "maybe"}"#).is_err());
    }

    #[test]
    fn labels_accept_string_or_list() {
        let cfg = ScenarioConfig::from_json_str(
            r#"{"specific_interactable_objects": [
                {"labels": "a"},
                {"labels": ["b", "c"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(cfg.specific_interactable_objects[0].labels, vec![Label::from("a")]);
        assert_eq!(cfg.specific_interactable_objects[1].labels.len(), 2);
    }

    #[test]
    fn performer_rotation_accepts_short_key() {
        let cfg = ScenarioConfig::from_json_str(r#"{"performer_start_rotation": 90}"#).unwrap();
        assert_eq!(cfg.performer_start_rotation_y, Some(Randomizable::Fixed(90.0)));
    }

    #[test]
    fn room_out_of_range_is_invalid() {
        let err = ScenarioConfig::from_json_str(r#"{"room_dimensions": {"x": {"min": 1, "max": 5}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn fixed_square_rectangle_is_invalid() {
        let err = ScenarioConfig::from_json_str(
            r#"{"room_shape": "rectangle", "room_dimensions": {"x": 10, "z": 10}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref path, .. } if path == "room_shape"));
    }

    #[test]
    fn retrieval_goal_needs_single_target() {
        let err = ScenarioConfig::from_json_str(
            r#"{"goal": {"category": "retrieval", "target": {"num": 2}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref path, .. } if path == "goal.target.num"));
    }

    #[test]
    fn multi_retrieval_category_name() {
        let cfg = ScenarioConfig::from_json_str(
            r#"{"goal": {"category": "multi retrieval", "target": {"num": 3}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.goal.unwrap().category, GoalCategory::MultiRetrieval);
    }

    #[test]
    fn pickup_without_labels_is_invalid() {
        let err = ScenarioConfig::from_json_str(r#"{"placers": [{"pickup_object": true}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn keyword_needing_relative_object_is_checked() {
        let err = ScenarioConfig::from_json_str(
            r#"{"keyword_objects": [{"keyword": "containers",
                "keyword_location": {"keyword": "adjacent"}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn shortcut_accepts_flag_or_options() {
        let cfg = ScenarioConfig::from_json_str(
            r#"{"shortcut_bisecting_platform": true,
                "shortcut_lava_target_tool": {"random_target_position": [true, false]}}"#,
        )
        .unwrap();
        let bp = cfg.shortcut_bisecting_platform.unwrap().enabled().unwrap();
        assert!(bp.has_blocking_wall);
        let lt = cfg.shortcut_lava_target_tool.unwrap().enabled().unwrap();
        assert!(lt.random_target_position.is_some());
    }

    #[test]
    fn unknown_tool_shape_is_invalid() {
        let err =
            ScenarioConfig::from_json_str(r#"{"tools": [{"shape": "spoon"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn options_validate_probability() {
        let mut opts = GenerationOptions::default();
        assert!(opts.validate().is_ok());
        opts.island_target_probability = 1.5;
        assert!(opts.validate().is_err());
        opts.island_target_probability = 0.5;
        opts.max_attempts = 0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn config_errors_map_to_configuration() {
        let e: GenerationError = ConfigError::invalid("goal", "bad").into();
        assert!(matches!(e, GenerationError::Configuration { ref path, .. } if path == "goal"));
    }

    #[test]
    fn triple_door_excludes_other_platform_layouts() {
        for other in [
            r#""shortcut_bisecting_platform": true"#,
            r#""forced_choice_multi_retrieval_target": true"#,
            r#""shortcut_lava_room": true"#,
        ] {
            let doc = format!(r#"{{"shortcut_triple_door_choice": true, {other}}}"#);
            let err = ScenarioConfig::from_json_str(&doc).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { ref path, .. } if path == "shortcut_triple_door_choice"),
                "{other}: {err}"
            );
        }
        let ok = ScenarioConfig::from_json_str(
            r#"{"shortcut_triple_door_choice": {"start_drop_step": 3, "add_lips": false},
                "shortcut_bisecting_platform": false}"#,
        )
        .unwrap();
        let td = ok.shortcut_triple_door_choice.as_ref().unwrap().enabled().unwrap();
        assert_eq!(td.add_lips, OneOf::Fixed(false));
        assert_eq!(td.add_freeze, OneOf::Fixed(true));
        assert!(ok.has_events());
    }

    #[test]
    fn triple_door_needs_a_wide_room() {
        let err = ScenarioConfig::from_json_str(
            r#"{"shortcut_triple_door_choice": true, "room_dimensions": {"x": 4}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref path, .. } if path == "room_dimensions.x"));
    }

    #[test]
    fn ramps_and_doors_parse_with_defaults() {
        let cfg = ScenarioConfig::from_json_str(
            r#"{"structural_ramps": [{"num": 2}],
                "structural_doors": [{"wall_scale_x": 3}],
                "structural_platforms": [{"attached_ramps": 1}],
                "wall_left_material": ["drywall_blue", "wood_light"],
                "restrict_open_doors": true}"#,
        );
        let cfg = match cfg {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(cfg.structural_ramps[0].angle, Randomizable::range(15.0, 45.0));
        assert_eq!(cfg.structural_platforms[0].attached_ramps, Randomizable::Fixed(1));
        assert!(cfg.restrict_open_doors);
        assert!(cfg.wall_left_material.is_some());
    }

    #[test]
    fn steep_ramps_and_thin_door_walls_are_invalid() {
        let err = ScenarioConfig::from_json_str(r#"{"structural_ramps": [{"angle": 90}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref path, .. } if path == "structural_ramps[0].angle"));
        let err = ScenarioConfig::from_json_str(r#"{"structural_doors": [{"wall_scale_x": 0.5}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref path, .. } if path == "structural_doors[0].wall_scale_x"));
    }
}
