//! Integration test: forced-choice multi-retrieval.
//!
//! After every placer has acted, the two sides hold different numbers of
//! objects and the goal targets are exactly the objects of the larger
//! side.

use scenegen_engine::{EventKind, GoalCategory, ObjectKind, Scene};
use scenegen_test_utils::{assert_valid, fixture_generator, fixtures, object};

fn scenes() -> Vec<Scene> {
    let generator = fixture_generator(fixtures::forced_choice());
    (0..12u64)
        .map(|s| {
            generator
                .generate(s)
                .unwrap_or_else(|e| panic!("seed {s}: {e}"))
        })
        .collect()
}

#[test]
fn targets_are_the_larger_side() {
    for scene in scenes() {
        assert_valid(&scene);
        let goal = scene.goal.as_ref().unwrap();
        assert_eq!(goal.category, GoalCategory::MultiRetrieval);
        let sides = goal.forced_choice.as_ref().expect("forced-choice outcome");
        assert_ne!(sides.left.len(), sides.right.len(), "seed {}", scene.seed);

        let larger = if sides.left.len() > sides.right.len() {
            &sides.left
        } else {
            &sides.right
        };
        let mut targets = goal.targets.clone();
        targets.sort();
        let mut expected = larger.clone();
        expected.sort();
        assert_eq!(targets, expected);
        assert_eq!(goal.targets.len(), sides.left.len().max(sides.right.len()));
    }
}

#[test]
fn losing_side_objects_are_not_targets() {
    for scene in scenes() {
        let goal = scene.goal.as_ref().unwrap();
        let sides = goal.forced_choice.as_ref().unwrap();
        let smaller = if sides.left.len() < sides.right.len() {
            &sides.left
        } else {
            &sides.right
        };
        for id in smaller {
            assert_eq!(object(&scene, *id).kind, ObjectKind::Interactable);
        }
        for id in &goal.targets {
            assert_eq!(object(&scene, *id).kind, ObjectKind::Target);
        }
    }
}

#[test]
fn final_sides_exclude_picked_up_objects() {
    for scene in scenes() {
        let sides = scene.goal.as_ref().unwrap().forced_choice.as_ref().unwrap();
        let picked: Vec<_> = scene
            .events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Pickup { .. }))
            .filter_map(|e| e.subject)
            .collect();
        for id in sides.left.iter().chain(&sides.right) {
            assert!(!picked.contains(id), "picked-up object {id} still counted");
            assert!(object(&scene, *id).picked_up_by.is_none());
        }
    }
}
