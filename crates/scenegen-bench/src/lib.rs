//! Benchmark profiles for the scenegen scene generator.
//!
//! Provides pre-built [`ScenarioConfig`] profiles for benchmarking:
//!
//! - [`reference_profile`]: 12x12 room, retrieval goal with clutter
//! - [`stress_profile`]: 30x30 room with dozens of objects, agents and placers
//! - [`puzzle_profile`]: the lava-island tool puzzle
//! - [`seeds`]: a deterministic seed list for repeated runs

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use scenegen_engine::ScenarioConfig;
use scenegen_test_utils::fixtures;
use serde_json::json;

/// Retrieval in a small cluttered room.
pub fn reference_profile() -> ScenarioConfig {
    fixtures::to_config(fixtures::retrieval())
}

/// A large room with many declarations of every phase.
pub fn stress_profile() -> ScenarioConfig {
    fixtures::to_config(json!({
        "room_dimensions": {"x": 30, "y": 5, "z": 30},
        "goal": {"category": "multi retrieval", "target": {"num": 4, "labels": "target"}},
        "check_valid_path": true,
        "keyword_objects": [
            {"keyword": "obstacles", "num": 10},
            {"keyword": "containers", "num": 6},
            {"keyword": "occluders", "num": 4},
            {"keyword": "context", "num": 10}
        ],
        "specific_interactable_objects": [{"num": 12}],
        "specific_agents": [{"num": 3, "movement": {"num_points": 4}}],
        "structural_walls": [{"num": 4}],
        "placers": [
            {"num": 3, "labels": "droppers", "activation_step": {"min": 1, "max": 10}},
            {"activate_after": "droppers"}
        ],
        "lava": [{"num": 3, "size": 2}]
    }))
}

/// The lava-island tool puzzle.
pub fn puzzle_profile() -> ScenarioConfig {
    fixtures::to_config(fixtures::lava_target_tool())
}

/// `n` distinct seeds derived from `base`.
pub fn seeds(n: usize, base: u64) -> Vec<u64> {
    (0..n as u64)
        .map(|i| base.wrapping_mul(6364136223846793005).wrapping_add(i.wrapping_mul(1442695040888963407)))
        .collect()
}
