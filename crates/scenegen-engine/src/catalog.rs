//! Object shape catalog.
//!
//! Every shape the planner can instantiate is listed here with its
//! unscaled dimensions, a placement category, and the materials it may
//! be rendered with. Tool shapes are not listed individually; their names
//! encode kind, width and length and are parsed by [`ToolShape`].

use scenegen_core::Vec3;
use scenegen_space::ToolKind;
use std::fmt;

/// Broad role of a shape during placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeCategory {
    /// Small object the performer can pick up.
    Pickupable,
    /// Openable object that can hold pickupables.
    Container,
    /// Large furniture the performer must walk around.
    Obstacle,
    /// Free-standing screen that blocks line of sight.
    Occluder,
    /// Decorative object that does not take part in the task.
    Context,
    /// Simulated agent.
    Agent,
}

/// Static description of a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeDef {
    /// Shape identifier as written in configurations.
    pub name: &'static str,
    /// Dimensions at scale 1.
    pub dimensions: Vec3,
    /// Placement role.
    pub category: ShapeCategory,
    /// Materials the shape may use.
    pub materials: &'static [&'static str],
}

const PLASTIC: &[&str] = &["plastic_red", "plastic_blue", "plastic_green", "plastic_yellow"];
const WOOD: &[&str] = &["wood_light", "wood_dark", "wood_painted_white"];
const METAL: &[&str] = &["metal_grey", "metal_brass"];
const FABRIC: &[&str] = &["fabric_orange", "fabric_grey", "fabric_blue"];
const AGENT_SKINS: &[&str] = &["agent_skin_a", "agent_skin_b", "agent_skin_c"];

/// Materials used for ceilings, floors and walls.
pub const ROOM_MATERIALS: &[&str] = &[
    "ceramic_white",
    "wood_light",
    "carpet_grey",
    "drywall_beige",
    "drywall_blue",
];

/// Materials doors are drawn from: every metal, plastic and wood.
pub const DOOR_MATERIALS: &[&str] = &[
    "metal_grey",
    "metal_brass",
    "plastic_red",
    "plastic_blue",
    "plastic_green",
    "plastic_yellow",
    "wood_light",
    "wood_dark",
    "wood_painted_white",
];

/// Material applied to every lava region.
pub const LAVA_MATERIAL: &str = "lava";

/// Material used by placers and moving occluder poles.
pub const MECHANISM_MATERIAL: &str = "metal_grey";

/// Material used by tools.
pub const TOOL_MATERIAL: &str = "tool_grey";

/// Every non-tool shape.
pub const SHAPES: &[ShapeDef] = &[
    ShapeDef {
        name: "soccer_ball",
        dimensions: Vec3::new(0.22, 0.22, 0.22),
        category: ShapeCategory::Pickupable,
        materials: &["soccer_ball_pattern"],
    },
    ShapeDef {
        name: "ball",
        dimensions: Vec3::new(0.25, 0.25, 0.25),
        category: ShapeCategory::Pickupable,
        materials: PLASTIC,
    },
    ShapeDef {
        name: "block_blank_wood_cube",
        dimensions: Vec3::new(0.1, 0.1, 0.1),
        category: ShapeCategory::Pickupable,
        materials: WOOD,
    },
    ShapeDef {
        name: "duck_on_wheels",
        dimensions: Vec3::new(0.21, 0.17, 0.06),
        category: ShapeCategory::Pickupable,
        materials: WOOD,
    },
    ShapeDef {
        name: "toy_racecar",
        dimensions: Vec3::new(0.07, 0.06, 0.14),
        category: ShapeCategory::Pickupable,
        materials: PLASTIC,
    },
    ShapeDef {
        name: "trophy",
        dimensions: Vec3::new(0.19, 0.3, 0.14),
        category: ShapeCategory::Pickupable,
        materials: METAL,
    },
    ShapeDef {
        name: "teddy_bear",
        dimensions: Vec3::new(0.3, 0.35, 0.2),
        category: ShapeCategory::Pickupable,
        materials: FABRIC,
    },
    ShapeDef {
        name: "chest_1",
        dimensions: Vec3::new(0.83, 0.42, 0.55),
        category: ShapeCategory::Container,
        materials: WOOD,
    },
    ShapeDef {
        name: "case_1",
        dimensions: Vec3::new(0.71, 0.19, 0.42),
        category: ShapeCategory::Container,
        materials: METAL,
    },
    ShapeDef {
        name: "bin_open_topped",
        dimensions: Vec3::new(0.9, 0.5, 0.9),
        category: ShapeCategory::Container,
        materials: PLASTIC,
    },
    ShapeDef {
        name: "chair_1",
        dimensions: Vec3::new(0.54, 0.94, 0.52),
        category: ShapeCategory::Obstacle,
        materials: WOOD,
    },
    ShapeDef {
        name: "table_1",
        dimensions: Vec3::new(1.2, 0.75, 0.8),
        category: ShapeCategory::Obstacle,
        materials: WOOD,
    },
    ShapeDef {
        name: "sofa_1",
        dimensions: Vec3::new(2.0, 0.85, 0.9),
        category: ShapeCategory::Obstacle,
        materials: FABRIC,
    },
    ShapeDef {
        name: "shelf_1",
        dimensions: Vec3::new(0.8, 1.8, 0.4),
        category: ShapeCategory::Obstacle,
        materials: WOOD,
    },
    ShapeDef {
        name: "occluder_screen",
        dimensions: Vec3::new(1.0, 1.0, 0.1),
        category: ShapeCategory::Occluder,
        materials: WOOD,
    },
    ShapeDef {
        name: "potted_plant",
        dimensions: Vec3::new(0.4, 0.8, 0.4),
        category: ShapeCategory::Context,
        materials: &["ceramic_white"],
    },
    ShapeDef {
        name: "floor_lamp",
        dimensions: Vec3::new(0.3, 1.5, 0.3),
        category: ShapeCategory::Context,
        materials: METAL,
    },
    ShapeDef {
        name: "agent_female_01",
        dimensions: Vec3::new(0.5, 1.6, 0.35),
        category: ShapeCategory::Agent,
        materials: AGENT_SKINS,
    },
    ShapeDef {
        name: "agent_male_02",
        dimensions: Vec3::new(0.55, 1.75, 0.35),
        category: ShapeCategory::Agent,
        materials: AGENT_SKINS,
    },
];

/// Look up a non-tool shape.
pub fn lookup(name: &str) -> Option<&'static ShapeDef> {
    SHAPES.iter().find(|s| s.name == name)
}

/// Shapes in `category`, minus any whose name is in `excluded`.
pub fn shapes_in(category: ShapeCategory, excluded: &[String]) -> Vec<&'static ShapeDef> {
    SHAPES
        .iter()
        .filter(|s| s.category == category && !excluded.iter().any(|e| e == s.name))
        .collect()
}

/// Whether `name` is a known shape or a well-formed tool name.
pub fn is_known_shape(name: &str) -> bool {
    lookup(name).is_some() || ToolShape::parse(name).is_some()
}

// ── Tools ──────────────────────────────────────────────────────────

/// Tool widths available for every kind and length.
pub const TOOL_WIDTHS: [f64; 3] = [0.5, 0.75, 1.0];

/// Shortest tool, in floor cells.
pub const TOOL_MIN_LENGTH: u32 = 1;

/// Longest tool, in floor cells.
pub const TOOL_MAX_LENGTH: u32 = 15;

/// Tool height.
pub const TOOL_HEIGHT: f64 = 0.3;

/// A tool shape: kind, width and length (cells).
///
/// Names take the form `tool_<kind>_<width>_x_<length>`, for example
/// `tool_hooked_0_75_x_6_00`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolShape {
    /// Silhouette family.
    pub kind: ToolKind,
    /// Width of the bar.
    pub width: f64,
    /// Length of the long axis in cells.
    pub length: u32,
}

impl ToolShape {
    /// Parse a tool name. Returns `None` for anything else.
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("tool_")?;
        let (kind_name, dims) = rest.split_once('_')?;
        let kind = ToolKind::ALL.into_iter().find(|k| k.name() == kind_name)?;
        let (w, l) = dims.split_once("_x_")?;
        let width: f64 = w.replacen('_', ".", 1).parse().ok()?;
        let length: f64 = l.replacen('_', ".", 1).parse().ok()?;
        if !TOOL_WIDTHS.iter().any(|tw| (tw - width).abs() < 1e-9) || length.fract() != 0.0 {
            return None;
        }
        let length = length as u32;
        if !(TOOL_MIN_LENGTH..=TOOL_MAX_LENGTH).contains(&length) {
            return None;
        }
        Some(Self {
            kind,
            width,
            length,
        })
    }

    /// Canonical shape name.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Bounding dimensions of the bar (without hooks or braces).
    pub fn dimensions(&self) -> Vec3 {
        Vec3::new(self.width, TOOL_HEIGHT, self.length as f64)
    }

    /// Every tool of `kind` with exactly `length` cells.
    pub fn with_length(kind: ToolKind, length: u32) -> Vec<ToolShape> {
        TOOL_WIDTHS
            .iter()
            .map(|&width| ToolShape {
                kind,
                width,
                length,
            })
            .collect()
    }
}

impl fmt::Display for ToolShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = format!("{:.2}", self.width).replace('.', "_");
        write!(f, "tool_{}_{}_x_{}_00", self.kind, w, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_round_trip() {
        let tool = ToolShape {
            kind: ToolKind::Hooked,
            width: 0.75,
            length: 6,
        };
        assert_eq!(tool.name(), "tool_hooked_0_75_x_6_00");
        assert_eq!(ToolShape::parse(&tool.name()), Some(tool));
    }

    #[test]
    fn malformed_tool_names_are_rejected() {
        assert!(ToolShape::parse("tool_rect_0_60_x_4_00").is_none());
        assert!(ToolShape::parse("tool_rect_0_50_x_16_00").is_none());
        assert!(ToolShape::parse("tool_spoon_0_50_x_4_00").is_none());
        assert!(ToolShape::parse("soccer_ball").is_none());
    }

    #[test]
    fn excluded_shapes_are_filtered() {
        let all = shapes_in(ShapeCategory::Pickupable, &[]);
        let fewer = shapes_in(ShapeCategory::Pickupable, &["ball".to_owned()]);
        assert_eq!(fewer.len(), all.len() - 1);
        assert!(fewer.iter().all(|s| s.name != "ball"));
    }

    #[test]
    fn known_shapes_include_tools() {
        assert!(is_known_shape("soccer_ball"));
        assert!(is_known_shape("tool_isosceles_1_00_x_9_00"));
        assert!(!is_known_shape("spaceship"));
    }

    #[test]
    fn door_materials_cover_metal_plastic_and_wood() {
        for m in METAL.iter().chain(PLASTIC).chain(WOOD) {
            assert!(DOOR_MATERIALS.contains(m), "{m}");
        }
        assert_eq!(DOOR_MATERIALS.len(), METAL.len() + PLASTIC.len() + WOOD.len());
    }
}
