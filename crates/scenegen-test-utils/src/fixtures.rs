//! Reusable scenario fixtures.
//!
//! Each fixture is a JSON scenario document exercising one part of the
//! generator:
//!
//! - [`empty_room`]: a fixed room and nothing else
//! - [`retrieval`]: one target among keyword and interactable clutter
//! - [`lava_target_tool`]: the lava-island tool puzzle
//! - [`lava_tool_stress`]: the tool puzzle in larger rooms with extra lava
//! - [`island_target`]: the tool puzzle with the target forced onto the island
//! - [`forced_choice`]: forced-choice multi-retrieval with placers
//! - [`placer_chain`]: placers and an occluder ordered by `activate_after`
//! - [`agents`]: walking agents plus the agent-with-target shortcut
//! - [`platforms`]: bisecting platform, lava room and start-on-platform
//! - [`ramps_and_doors`]: free-standing and attached ramps, a door wall
//!   and per-wall materials
//! - [`triple_door`]: the triple-door shortcut dropping in at step 8

use scenegen_engine::ScenarioConfig;
use serde_json::{json, Value};

/// Parse a fixture value; panics on malformed fixtures.
pub fn to_config(doc: Value) -> ScenarioConfig {
    ScenarioConfig::from_value(doc).unwrap_or_else(|e| panic!("fixture does not parse: {e}"))
}

pub fn empty_room() -> Value {
    json!({
        "room_dimensions": {"x": 10, "y": 3, "z": 10}
    })
}

pub fn retrieval() -> Value {
    json!({
        "room_dimensions": {"x": 12, "y": 3, "z": 12},
        "goal": {"category": "retrieval", "target": {"labels": "target"}},
        "check_valid_path": true,
        "keyword_objects": [
            {"keyword": "obstacles", "num": {"min": 1, "max": 3}},
            {"keyword": "occluders", "num": 1},
            {"keyword": "context", "num": 2}
        ],
        "specific_interactable_objects": [
            {"num": 2, "labels": "clutter"}
        ]
    })
}

pub fn lava_target_tool() -> Value {
    json!({
        "room_dimensions": {"x": 13, "y": 4, "z": 17},
        "shortcut_lava_target_tool": true
    })
}

/// Square rooms of 15 to 25 cells with extra lava pools around the
/// puzzle and every tool type in play.
pub fn lava_tool_stress() -> Value {
    json!({
        "room_dimensions": {
            "x": {"min": 15, "max": 25},
            "y": {"min": 3, "max": 5},
            "z": {"min": 15, "max": 25}
        },
        "room_shape": "square",
        "lava": [{"num": {"min": 4, "max": 6}, "size": {"min": 2, "max": 10}}],
        "shortcut_lava_target_tool": {"tool_type": ["rect", "hooked", "isosceles"]}
    })
}

pub fn island_target() -> Value {
    json!({
        "room_dimensions": {"x": 12, "y": 4, "z": 16},
        "shortcut_lava_target_tool": {
            "random_target_position": false,
            "island_size": 1,
            "tool_type": "rect"
        }
    })
}

pub fn forced_choice() -> Value {
    json!({
        "room_dimensions": {"x": 12, "y": 4, "z": 12},
        "forced_choice_multi_retrieval_target": {
            "left_count": {"min": 1, "max": 3},
            "right_count": {"min": 1, "max": 3},
            "placers": {"min": 1, "max": 2},
            "occluders": true
        }
    })
}

pub fn placer_chain() -> Value {
    json!({
        "room_dimensions": {"x": 12, "y": 4, "z": 12},
        "goal": {"category": "retrieval", "target": {}},
        "freeze_while_moving": ["first"],
        "placers": [
            {"labels": "first", "activation_step": 3, "placed_object_labels": "dropped"},
            {"labels": "second", "activate_after": "first"}
        ],
        "structural_moving_occluders": [
            {"labels": "screen", "activate_after": "second", "move_down_only": true}
        ]
    })
}

pub fn agents() -> Value {
    json!({
        "room_dimensions": {"x": 14, "y": 3, "z": 14},
        "shortcut_agent_with_target": {"movement": {"num_points": 2}},
        "specific_agents": [
            {"num": 2, "movement": {"step_begin": {"min": 1, "max": 5}, "num_points": 3}}
        ]
    })
}

pub fn platforms() -> Value {
    json!({
        "room_dimensions": {"x": 11, "y": 4, "z": 13},
        "shortcut_bisecting_platform": {"has_blocking_wall": true, "platform_height": 1.0},
        "structural_platforms": [{"labels": "start_structure"}],
        "shortcut_start_on_platform": true
    })
}

pub fn ramps_and_doors() -> Value {
    json!({
        "room_dimensions": {"x": 12, "y": 4, "z": 12},
        "wall_left_material": "drywall_blue",
        "structural_platforms": [{"num": 1, "attached_ramps": 1, "labels": "stage"}],
        "structural_ramps": [{"num": 2}],
        "structural_doors": [{"num": 1, "wall_scale_y": 3.0}]
    })
}

pub fn triple_door() -> Value {
    json!({
        "room_dimensions": {"x": 9, "y": 5, "z": 11},
        "goal": {"category": "retrieval", "target": {}},
        "shortcut_triple_door_choice": {"start_drop_step": 8}
    })
}

/// Every fixture, by name.
pub fn all() -> Vec<(&'static str, Value)> {
    vec![
        ("empty_room", empty_room()),
        ("retrieval", retrieval()),
        ("lava_target_tool", lava_target_tool()),
        ("island_target", island_target()),
        ("lava_tool_stress", lava_tool_stress()),
        ("forced_choice", forced_choice()),
        ("placer_chain", placer_chain()),
        ("agents", agents()),
        ("platforms", platforms()),
        ("ramps_and_doors", ramps_and_doors()),
        ("triple_door", triple_door()),
    ]
}
