//! Test utilities for scenegen development.
//!
//! Provides ready-made scenario documents ([`fixtures`]) and assertion
//! helpers that check a generated [`Scene`] against the properties every
//! valid scene must have.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use scenegen_core::ObjectId;
use scenegen_engine::{validate, ObjectInstance, ObjectKind, Scene, ScenarioConfig, SceneGenerator};
use scenegen_space::{Cell, RegionKind, RoomGrid, SpatialIndex};

/// Parse a fixture document; panics on malformed fixtures.
pub fn config(json: &str) -> ScenarioConfig {
    ScenarioConfig::from_json_str(json)
        .unwrap_or_else(|e| panic!("fixture does not parse: {e}\n{json}"))
}

/// Generator with default options for a fixture document.
pub fn generator(json: &str) -> SceneGenerator {
    SceneGenerator::with_defaults(config(json))
        .unwrap_or_else(|e| panic!("fixture is rejected: {e}"))
}

/// Generator with default options for a [`fixtures`] document.
pub fn fixture_generator(doc: serde_json::Value) -> SceneGenerator {
    SceneGenerator::with_defaults(fixtures::to_config(doc))
        .unwrap_or_else(|e| panic!("fixture is rejected: {e}"))
}

/// Floor grid of a generated scene.
pub fn room_grid(scene: &Scene) -> RoomGrid {
    let d = scene.room.dimensions;
    RoomGrid::new(d.x as u32, d.y as u32, d.z as u32)
        .unwrap_or_else(|e| panic!("scene has an invalid room: {e}"))
}

/// Assert every global scene invariant holds.
pub fn assert_valid(scene: &Scene) {
    let grid = room_grid(scene);
    if let Err(e) = validate(scene, &grid) {
        panic!("scene (seed {}) violates an invariant: {e}", scene.seed);
    }
}

/// Look up an object, panicking if it is missing.
pub fn object(scene: &Scene, id: ObjectId) -> &ObjectInstance {
    scene
        .object(id)
        .unwrap_or_else(|| panic!("scene has no object {id}"))
}

/// Cells of every region of `kind`.
pub fn region_cells(scene: &Scene, kind: RegionKind) -> Vec<Cell> {
    scene
        .regions
        .iter()
        .filter(|r| r.region.kind == kind)
        .flat_map(|r| r.region.cells.iter().copied())
        .collect()
}

/// Floor cells an object covers where it comes to rest.
pub fn resting_cells(scene: &Scene, obj: &ObjectInstance) -> Vec<Cell> {
    obj.final_bounds().covered_cells(&room_grid(scene))
}

/// Whether an object's resting footprint touches any of `cells`.
pub fn rests_on_any(scene: &Scene, obj: &ObjectInstance, cells: &[Cell]) -> bool {
    resting_cells(scene, obj).iter().any(|c| cells.contains(c))
}

/// The single tool of a tool puzzle.
pub fn only_tool(scene: &Scene) -> &ObjectInstance {
    let tools: Vec<&ObjectInstance> = scene.objects_of(ObjectKind::Tool).collect();
    assert_eq!(tools.len(), 1, "expected exactly one tool");
    tools[0]
}

/// Spatial index holding a scene's regions, with the same region ids.
pub fn spatial_index(scene: &Scene) -> SpatialIndex {
    let mut index = SpatialIndex::new(room_grid(scene));
    for r in &scene.regions {
        let id = index
            .add_region(r.region.kind, r.region.cells.iter().copied())
            .unwrap_or_else(|e| panic!("scene region {} is rejected: {e}", r.id()));
        assert_eq!(id, r.id(), "scene regions are not in id order");
    }
    index
}
