//! Scene assembler: merge a plan and its timeline into one [`Scene`] and
//! run the final global checks.
//!
//! The planner enforces most of these properties while it places objects;
//! the assembler re-checks them on the finished document so nothing that
//! slipped through an explicit position or a moving mechanism escapes.

use crate::config::ScenarioConfig;
use crate::labels::LabelRegistry;
use crate::planner::{check_arity, goal_category, Plan};
use crate::scene::{
    ForcedChoiceOutcome, Goal, ObjectInstance, ObjectKind, RoomDescriptor, Scene, SceneRegion,
    FORMAT_VERSION,
};
use crate::schedule::{merge_windows, EventTrigger, Timeline};
use scenegen_core::{GenerationError, Invariant, EPSILON};
use scenegen_space::{Cell, ObjectBounds, RoomGrid, SpatialRegion};
use std::collections::BTreeMap;

/// Build the scene document for one successful attempt.
///
/// # Errors
///
/// [`GenerationError::InvariantViolation`] when a global check fails.
pub fn assemble(
    config: &ScenarioConfig,
    plan: Plan,
    timeline: Timeline,
    seed: u64,
    attempt: u32,
) -> Result<Scene, GenerationError> {
    check_labels(&plan.registry)?;

    let room = *plan.index.room();
    let goal = goal_category(config).map(|category| Goal {
        category,
        targets: plan.goal_targets.clone(),
        last_step: plan.room.last_step,
        action_freezes: merge_windows(
            timeline
                .freezes
                .iter()
                .chain(&plan.freezes)
                .copied()
                .collect(),
        ),
        forced_choice: plan.forced_choice.as_ref().map(|sides| {
            let (left, right) = sides.final_sides();
            ForcedChoiceOutcome { left, right }
        }),
    });
    let regions = plan
        .index
        .regions()
        .iter()
        .map(|r| SceneRegion {
            region: r.clone(),
            material: plan.region_materials.get(&r.id).cloned(),
        })
        .collect();

    let scene = Scene {
        format_version: FORMAT_VERSION.to_owned(),
        seed,
        attempt,
        room: RoomDescriptor {
            dimensions: room.dimensions(),
            shape: plan.room.shape,
        },
        materials: plan.room.materials,
        performer_start: plan.room.performer,
        objects: plan.objects,
        regions,
        goal,
        events: timeline.events,
        restrict_open_doors: plan.room.restrict_open_doors,
    };
    validate(&scene, &room)?;
    tracing::debug!(
        objects = scene.objects.len(),
        regions = scene.regions.len(),
        events = scene.events.len(),
        "scene assembled"
    );
    Ok(scene)
}

fn check_labels(registry: &LabelRegistry) -> Result<(), Invariant> {
    match registry.unresolved().into_iter().next() {
        Some(label) => Err(Invariant::UnresolvedLabel { label }),
        None => Ok(()),
    }
}

// ── Global checks ───────────────────────────────────────────────────

/// Check every global invariant of a finished scene.
///
/// # Errors
///
/// The first [`Invariant`] that does not hold.
pub fn validate(scene: &Scene, room: &RoomGrid) -> Result<(), Invariant> {
    check_regions(&scene.regions)?;
    check_objects(&scene.objects, &scene.regions, room)?;
    check_overlaps(&scene.objects)?;
    if let Some(goal) = &scene.goal {
        check_goal(goal)?;
    }
    check_event_order(scene)
}

fn check_regions(regions: &[SceneRegion]) -> Result<(), Invariant> {
    for (i, a) in regions.iter().enumerate() {
        for b in &regions[i + 1..] {
            if a.region.kind.conflicts_with(b.region.kind) && a.region.intersects(&b.region) {
                return Err(Invariant::RegionConflict {
                    a: a.id(),
                    b: b.id(),
                });
            }
        }
    }
    Ok(())
}

/// Whether the object stands on the floor in the given bounds.
fn on_floor(bounds: &ObjectBounds) -> bool {
    bounds.min_y <= EPSILON
}

fn hazard_under<'a>(
    bounds: &ObjectBounds,
    hazards: &BTreeMap<Cell, &'a SpatialRegion>,
    room: &RoomGrid,
) -> Option<&'a SpatialRegion> {
    bounds
        .covered_cells(room)
        .into_iter()
        .find_map(|c| hazards.get(&c).copied())
}

fn check_objects(
    objects: &[ObjectInstance],
    regions: &[SceneRegion],
    room: &RoomGrid,
) -> Result<(), Invariant> {
    let mut hazards: BTreeMap<Cell, &SpatialRegion> = BTreeMap::new();
    for r in regions.iter().filter(|r| r.region.kind.is_hazard()) {
        for &c in &r.region.cells {
            hazards.entry(c).or_insert(&r.region);
        }
    }

    for obj in objects {
        if obj.kind.is_mechanism() || obj.contained_in.is_some() {
            continue;
        }
        let start = obj.bounds();
        let rest = obj.final_bounds();
        let (lx, hx, lz, hz) = start.extents();
        let start_inside = lx >= -room.half_x() - EPSILON
            && hx <= room.half_x() + EPSILON
            && lz >= -room.half_z() - EPSILON
            && hz <= room.half_z() + EPSILON;
        if !start_inside || (obj.picked_up_by.is_none() && !rest.is_within_room(room)) {
            return Err(Invariant::ObjectOutOfBounds { object: obj.id });
        }

        let mut standing = Vec::with_capacity(2);
        if obj.held_by.is_none() {
            standing.push(start);
        }
        if obj.picked_up_by.is_none() && obj.final_position.is_some() {
            standing.push(rest);
        }
        for bounds in standing.iter().filter(|b| on_floor(b)) {
            if let Some(region) = hazard_under(bounds, &hazards, room) {
                return Err(Invariant::ObjectOverHazard {
                    object: obj.id,
                    region: region.id,
                });
            }
        }
    }
    Ok(())
}

/// Pairwise overlap of objects resting on the floor at step 0 that never
/// move. Platforms carry other objects and are skipped.
fn check_overlaps(objects: &[ObjectInstance]) -> Result<(), Invariant> {
    let fixed: Vec<(&ObjectInstance, ObjectBounds)> = objects
        .iter()
        .filter(|o| {
            o.is_free_standing()
                && o.held_by.is_none()
                && o.final_position.is_none()
                && o.kind != ObjectKind::Platform
        })
        .map(|o| (o, o.bounds()))
        .filter(|(_, b)| on_floor(b))
        .collect();
    for (i, (a, ab)) in fixed.iter().enumerate() {
        for (b, bb) in &fixed[i + 1..] {
            if ab.overlaps(bb) {
                return Err(Invariant::ObjectOverlap { a: a.id, b: b.id });
            }
        }
    }
    Ok(())
}

fn check_goal(goal: &Goal) -> Result<(), Invariant> {
    if let Some(sides) = &goal.forced_choice {
        if sides.left.len() == sides.right.len() {
            return Err(Invariant::ForcedChoiceTie {
                count: sides.left.len(),
            });
        }
        let larger = if sides.left.len() > sides.right.len() {
            &sides.left
        } else {
            &sides.right
        };
        let mut expected = larger.clone();
        expected.sort();
        let mut targets = goal.targets.clone();
        targets.sort();
        if targets != expected {
            return Err(Invariant::ForcedChoiceTargets {
                expected: larger.len(),
            });
        }
    }
    check_arity(goal.category, goal.targets.len())
}

fn check_event_order(scene: &Scene) -> Result<(), Invariant> {
    for event in &scene.events {
        if !matches!(event.trigger, EventTrigger::After { .. }) {
            continue;
        }
        for dep in &event.depends_on {
            let Some(d) = scene.events.iter().find(|e| e.id == *dep) else {
                continue;
            };
            if event.start <= d.end {
                return Err(Invariant::EventOrder {
                    event: event.id,
                    dependency: d.id,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GoalCategory, RoomShape};
    use crate::scene::{DeclarationKey, PerformerStart, RoomMaterials, WallMaterials};
    use crate::schedule::{EventKind, ScheduledEvent};
    use scenegen_core::{EventId, Label, ObjectId, RegionId, Step, Vec3};
    use scenegen_space::RegionKind;

    fn grid() -> RoomGrid {
        RoomGrid::new(10, 3, 10).unwrap()
    }

    fn empty_scene() -> Scene {
        Scene {
            format_version: FORMAT_VERSION.to_owned(),
            seed: 0,
            attempt: 0,
            room: RoomDescriptor {
                dimensions: Vec3::new(10.0, 3.0, 10.0),
                shape: RoomShape::Square,
            },
            materials: RoomMaterials {
                ceiling: "white".into(),
                floor: "wood".into(),
                wall: "white".into(),
                walls: WallMaterials::uniform("white"),
            },
            performer_start: PerformerStart {
                position: Vec3::ZERO,
                rotation_y: 0.0,
            },
            objects: Vec::new(),
            regions: Vec::new(),
            goal: None,
            events: Vec::new(),
            restrict_open_doors: false,
        }
    }

    fn ball(id: u32, x: f64, z: f64) -> ObjectInstance {
        ObjectInstance::new(
            ObjectId(id),
            ObjectKind::Interactable,
            "ball",
            DeclarationKey::new("specific_interactable_objects", 0),
        )
        .at(Vec3::new(x, 0.0, z), 0.0)
        .sized(Vec3::splat(0.5), Vec3::splat(0.5))
    }

    fn region(id: u32, kind: RegionKind, cells: &[(i32, i32)]) -> SceneRegion {
        SceneRegion {
            region: SpatialRegion {
                id: RegionId(id),
                kind,
                cells: cells.iter().map(|&(x, z)| Cell::new(x, z)).collect(),
            },
            material: None,
        }
    }

    #[test]
    fn empty_scene_is_valid() {
        assert_eq!(validate(&empty_scene(), &grid()), Ok(()));
    }

    #[test]
    fn object_past_the_wall_is_rejected() {
        let mut scene = empty_scene();
        scene.objects.push(ball(0, 4.9, 0.0));
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::ObjectOutOfBounds { object: ObjectId(0) })
        );
    }

    #[test]
    fn floor_object_on_lava_is_rejected() {
        let mut scene = empty_scene();
        scene.regions.push(region(0, RegionKind::Lava, &[(2, 2)]));
        scene.objects.push(ball(0, 2.0, 2.0));
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::ObjectOverHazard {
                object: ObjectId(0),
                region: RegionId(0)
            })
        );
    }

    #[test]
    fn raised_object_over_lava_is_allowed() {
        let mut scene = empty_scene();
        scene.regions.push(region(0, RegionKind::Lava, &[(2, 2)]));
        let mut b = ball(0, 2.0, 2.0);
        b.position.y = 1.0;
        scene.objects.push(b);
        assert_eq!(validate(&scene, &grid()), Ok(()));
    }

    #[test]
    fn held_object_is_checked_where_it_lands() {
        let mut scene = empty_scene();
        scene.regions.push(region(0, RegionKind::Hole, &[(-1, 0)]));
        let mut b = ball(1, 3.0, 3.0);
        b.position.y = 2.0;
        b.held_by = Some(ObjectId(0));
        b.final_position = Some(Vec3::new(-1.0, 0.0, 0.0));
        scene.objects.push(b);
        assert!(matches!(
            validate(&scene, &grid()),
            Err(Invariant::ObjectOverHazard { .. })
        ));
    }

    #[test]
    fn lava_and_island_may_not_share_cells() {
        let mut scene = empty_scene();
        scene.regions.push(region(0, RegionKind::Lava, &[(0, 0), (1, 0)]));
        scene.regions.push(region(1, RegionKind::Island, &[(1, 0)]));
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::RegionConflict {
                a: RegionId(0),
                b: RegionId(1)
            })
        );
    }

    #[test]
    fn overlapping_floor_objects_are_rejected() {
        let mut scene = empty_scene();
        scene.objects.push(ball(0, 0.0, 0.0));
        scene.objects.push(ball(1, 0.2, 0.0));
        scene.objects.push(ball(2, 2.0, 0.0));
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::ObjectOverlap {
                a: ObjectId(0),
                b: ObjectId(1)
            })
        );
    }

    #[test]
    fn forced_choice_tie_is_rejected() {
        let mut scene = empty_scene();
        scene.goal = Some(Goal {
            category: GoalCategory::MultiRetrieval,
            targets: vec![ObjectId(0), ObjectId(1)],
            last_step: None,
            action_freezes: Vec::new(),
            forced_choice: Some(ForcedChoiceOutcome {
                left: vec![ObjectId(0), ObjectId(1)],
                right: vec![ObjectId(2), ObjectId(3)],
            }),
        });
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::ForcedChoiceTie { count: 2 })
        );
    }

    #[test]
    fn forced_choice_targets_must_be_the_larger_side() {
        let mut scene = empty_scene();
        let goal = |targets: Vec<ObjectId>| Goal {
            category: GoalCategory::MultiRetrieval,
            targets,
            last_step: None,
            action_freezes: Vec::new(),
            forced_choice: Some(ForcedChoiceOutcome {
                left: vec![ObjectId(0)],
                right: vec![ObjectId(2), ObjectId(1)],
            }),
        };

        scene.goal = Some(goal(vec![ObjectId(0)]));
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::ForcedChoiceTargets { expected: 2 })
        );

        scene.goal = Some(goal(vec![ObjectId(1), ObjectId(2), ObjectId(0)]));
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::ForcedChoiceTargets { expected: 2 })
        );

        scene.goal = Some(goal(vec![ObjectId(1), ObjectId(2)]));
        assert_eq!(validate(&scene, &grid()), Ok(()));
    }

    #[test]
    fn retrieval_goal_with_two_targets_is_rejected() {
        let mut scene = empty_scene();
        scene.goal = Some(Goal {
            category: GoalCategory::Retrieval,
            targets: vec![ObjectId(0), ObjectId(1)],
            last_step: Some(500),
            action_freezes: Vec::new(),
            forced_choice: None,
        });
        assert!(matches!(
            validate(&scene, &grid()),
            Err(Invariant::GoalArity { found: 2, .. })
        ));
    }

    fn event(id: u32, start: u32, end: u32, depends_on: &[u32]) -> ScheduledEvent {
        ScheduledEvent {
            id: EventId(id),
            object: ObjectId(id),
            subject: None,
            kind: EventKind::Empty { travel_steps: 2 },
            trigger: if depends_on.is_empty() {
                EventTrigger::Step { step: Step(start) }
            } else {
                EventTrigger::After {
                    labels: vec![Label::from("first")],
                    fallback: Step(1),
                }
            },
            start: Step(start),
            end: Step(end),
            release_step: None,
            depends_on: depends_on.iter().map(|&d| EventId(d)).collect(),
        }
    }

    #[test]
    fn dependent_event_must_start_after_dependency_ends() {
        let mut scene = empty_scene();
        scene.events = vec![event(0, 1, 4, &[]), event(1, 5, 8, &[0])];
        assert_eq!(validate(&scene, &grid()), Ok(()));

        scene.events[1].start = Step(4);
        assert_eq!(
            validate(&scene, &grid()),
            Err(Invariant::EventOrder {
                event: EventId(1),
                dependency: EventId(0)
            })
        );
    }

    #[test]
    fn unsettled_label_is_reported() {
        let mut reg = LabelRegistry::new();
        reg.declare(&Label::from("ball"));
        assert_eq!(
            check_labels(&reg),
            Err(Invariant::UnresolvedLabel {
                label: Label::from("ball")
            })
        );
        reg.settle(&Label::from("ball"));
        assert_eq!(check_labels(&reg), Ok(()));
    }
}
