//! Generate one scene and print it as JSON.
//!
//! Demonstrates:
//!   1. Loading a scenario document (from a file, or the built-in one)
//!   2. Building a SceneGenerator with custom options
//!   3. Generating with a report and inspecting the discarded attempts
//!
//! Run with:
//!   cargo run --example generate_scene -- [scenario.json] [seed]
//!
//! Set `RUST_LOG=scenegen_engine=debug` to follow the planner phases.

use scenegen_engine::{GenerationOptions, ScenarioConfig, SceneGenerator};
use tracing_subscriber::EnvFilter;

// ─── Built-in scenario ──────────────────────────────────────────

const DEFAULT_SCENARIO: &str = r#"{
    "room_dimensions": {"x": 12, "y": 3, "z": 14},
    "goal": {"category": "retrieval", "target": {"labels": "target"}},
    "check_valid_path": true,
    "keyword_objects": [
        {"keyword": "obstacles", "num": {"min": 1, "max": 2}},
        {"keyword": "containers", "num": 1}
    ],
    "specific_interactable_objects": [{"num": {"min": 2, "max": 4}}],
    "placers": [{"placed_object_labels": "dropped", "activation_step": {"min": 1, "max": 8}}],
    "freeze_while_moving": ["dropped"]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => ScenarioConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        _ => ScenarioConfig::from_json_str(DEFAULT_SCENARIO)?,
    };
    let seed: u64 = match args.next() {
        Some(s) => s.parse()?,
        None => 42,
    };

    // ─── Generate ───────────────────────────────────────────────

    let options = GenerationOptions {
        max_attempts: 50,
        ..GenerationOptions::default()
    };
    let generator = SceneGenerator::new(config, options)?;
    let (scene, report) = generator.generate_with_report(seed)?;

    for failure in &report.failures {
        tracing::info!(
            attempt = failure.attempt,
            kind = ?failure.kind,
            "discarded: {}",
            failure.message
        );
    }
    tracing::info!(
        attempts = report.attempts,
        objects = scene.objects.len(),
        events = scene.events.len(),
        micros = report.total_us,
        "done"
    );

    println!("{}", scene.to_json()?);
    Ok(())
}
