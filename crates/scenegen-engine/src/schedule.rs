//! Temporal event scheduler.
//!
//! Mechanisms (placers, moving occluders, walking agents) each contribute
//! one [`EventSpec`]. Triggers that name labels become edges from every
//! event of the labelled objects to the dependent event. The resulting
//! graph is ordered with Kahn's algorithm, ties broken by declaration
//! order, and each event is given a concrete `[start, end]` window such
//! that a dependent starts strictly after all of its dependencies end.

use crate::labels::{LabelRegistry, Resolution};
use scenegen_core::{EventId, GenerationError, Label, ObjectId, Step, Vec3};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Placer travel per step.
pub const PLACER_SPEED: f64 = 0.25;

/// Moving occluder travel per step when only descending.
pub const OCCLUDER_SPEED: f64 = 0.25;

/// Steps in one lift, rotate, rotate back and lower cycle.
pub const OCCLUDER_CYCLE_STEPS: u32 = 20;

/// Agent walking speed per step.
pub const AGENT_SPEED: f64 = 0.1;

/// Steps needed to cover `distance` at `speed`, at least one.
pub fn travel_steps(distance: f64, speed: f64) -> u32 {
    ((distance.max(0.0) / speed).ceil() as u32).max(1)
}

/// What a mechanism does when its event runs.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EventKind {
    /// Lower, release the held object, rise.
    Place {
        /// Steps to descend (the ascent takes as many).
        travel_steps: u32,
        /// Configured absolute release step.
        #[serde(skip_serializing_if = "Option::is_none")]
        deactivation_step: Option<Step>,
    },
    /// Lower, grab an object, rise with it.
    Pickup {
        /// Steps to descend.
        travel_steps: u32,
    },
    /// Lower and rise without holding anything.
    Empty {
        /// Steps to descend.
        travel_steps: u32,
    },
    /// A raised occluder descends to the floor.
    OccluderDescend {
        /// Steps to descend.
        travel_steps: u32,
    },
    /// A raised structure drops into place.
    StructureDrop {
        /// Steps to descend.
        travel_steps: u32,
    },
    /// An occluder lifts, turns, turns back and lowers.
    OccluderCycle {
        /// Steps between repeated cycles, when repeating.
        #[serde(skip_serializing_if = "Option::is_none")]
        repeat_interval: Option<u32>,
    },
    /// An agent walks through its waypoints.
    AgentWalk {
        /// Points visited in order.
        waypoints: Vec<Vec3>,
        /// Total walking distance.
        path_length: f64,
    },
}

impl EventKind {
    /// Steps from start to the end of the (first) movement.
    pub fn duration(&self) -> u32 {
        match self {
            Self::Place { travel_steps, .. }
            | Self::Pickup { travel_steps }
            | Self::Empty { travel_steps } => travel_steps * 2,
            Self::OccluderDescend { travel_steps } | Self::StructureDrop { travel_steps } => {
                *travel_steps
            }
            Self::OccluderCycle { .. } => OCCLUDER_CYCLE_STEPS,
            Self::AgentWalk { path_length, .. } => travel_steps(*path_length, AGENT_SPEED),
        }
    }
}

/// When an event starts.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventTrigger {
    /// At a fixed step.
    Step {
        /// Start step.
        step: Step,
    },
    /// After every event of the labelled objects ends. `fallback` is used
    /// when none of them has an event.
    After {
        /// Dependency labels.
        labels: Vec<Label>,
        /// Start step when no dependency moves.
        fallback: Step,
    },
    /// At step 1 unless a labelled event starts by step 1, in which case
    /// after all of them end.
    OnStartOrAfter {
        /// Dependency labels.
        labels: Vec<Label>,
    },
}

impl EventTrigger {
    fn labels(&self) -> &[Label] {
        match self {
            Self::Step { .. } => &[],
            Self::After { labels, .. } | Self::OnStartOrAfter { labels } => labels,
        }
    }
}

/// An unscheduled event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventSpec {
    /// Event id; ids are allocated in declaration order.
    pub id: EventId,
    /// Mechanism performing the event.
    pub object: ObjectId,
    /// Object placed or picked up, if any.
    pub subject: Option<ObjectId>,
    /// Action.
    pub kind: EventKind,
    /// Start condition.
    pub trigger: EventTrigger,
}

impl EventSpec {
    fn involves(&self, id: ObjectId) -> bool {
        self.object == id || self.subject == Some(id)
    }
}

/// An event with its resolved window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduledEvent {
    /// Event id.
    pub id: EventId,
    /// Mechanism performing the event.
    pub object: ObjectId,
    /// Object placed or picked up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<ObjectId>,
    /// Action.
    pub kind: EventKind,
    /// Start condition as declared.
    pub trigger: EventTrigger,
    /// First active step.
    pub start: Step,
    /// Last active step.
    pub end: Step,
    /// Step on which a placed object is released.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_step: Option<Step>,
    /// Events that must end before this one starts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<EventId>,
}

/// Inclusive range of steps during which the performer may not act.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FreezeWindow {
    /// First frozen step.
    pub start: Step,
    /// Last frozen step.
    pub end: Step,
}

/// Every event with its window, plus derived performer freezes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    /// Events ordered by start step, then id.
    pub events: Vec<ScheduledEvent>,
    /// Merged freeze windows in step order.
    pub freezes: Vec<FreezeWindow>,
}

impl Timeline {
    /// Look up an event.
    pub fn event(&self, id: EventId) -> Option<&ScheduledEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events performed by or involving `object`.
    pub fn events_of(&self, object: ObjectId) -> impl Iterator<Item = &ScheduledEvent> + '_ {
        self.events
            .iter()
            .filter(move |e| e.object == object || e.subject == Some(object))
    }

    /// Step by which every event has ended.
    pub fn final_step(&self) -> Step {
        self.events.iter().map(|e| e.end).max().unwrap_or(Step::ZERO)
    }
}

fn labelled_objects(
    registry: &LabelRegistry,
    labels: &[Label],
) -> Result<Vec<ObjectId>, GenerationError> {
    let mut out = Vec::new();
    for label in labels {
        match registry.resolve_group(label)? {
            Resolution::Ready(ids) => out.extend_from_slice(ids),
            Resolution::Empty => {}
            Resolution::Pending => {
                return Err(GenerationError::config(
                    format!("label `{label}`"),
                    "still unresolved when scheduling events",
                ))
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

/// Order `specs` and assign every event a window.
///
/// # Errors
///
/// [`GenerationError::CyclicEventDependency`] when triggers form a cycle;
/// [`GenerationError::Configuration`] when a trigger names an unknown
/// label.
pub fn schedule(
    specs: &[EventSpec],
    registry: &LabelRegistry,
    freeze_labels: &[Label],
) -> Result<Timeline, GenerationError> {
    let n = specs.len();
    let mut deps: Vec<Vec<usize>> = Vec::with_capacity(n);
    for spec in specs {
        let objects = labelled_objects(registry, spec.trigger.labels())?;
        let d: Vec<usize> = specs
            .iter()
            .enumerate()
            .filter(|(_, other)| objects.iter().any(|o| other.involves(*o)))
            .map(|(i, _)| i)
            .collect();
        deps.push(d);
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for (i, d) in deps.iter().enumerate() {
        in_degree[i] = d.len();
        for &j in d {
            dependents[j].push(i);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &k in &dependents[i] {
            in_degree[k] -= 1;
            if in_degree[k] == 0 {
                ready.push(Reverse(k));
            }
        }
    }
    if order.len() < n {
        return Err(GenerationError::CyclicEventDependency {
            cycle: find_cycle(specs, &deps, &in_degree),
        });
    }

    let mut windows: Vec<Option<(Step, Step)>> = vec![None; n];
    for &i in &order {
        let spec = &specs[i];
        let dep_windows: Vec<(Step, Step)> =
            deps[i].iter().filter_map(|&j| windows[j]).collect();
        let after_all = dep_windows.iter().map(|w| w.1).max().map(Step::next);
        let start = match &spec.trigger {
            EventTrigger::Step { step } => *step,
            EventTrigger::After { fallback, .. } => after_all.unwrap_or(*fallback),
            EventTrigger::OnStartOrAfter { .. } => {
                if dep_windows.iter().any(|w| w.0 <= Step(1)) {
                    after_all.unwrap_or(Step(1))
                } else {
                    Step(1)
                }
            }
        };
        let end = start.offset(spec.kind.duration().saturating_sub(1));
        windows[i] = Some((start, end));
    }

    let mut events: Vec<ScheduledEvent> = specs
        .iter()
        .enumerate()
        .filter_map(|(i, spec)| {
            let (start, end) = windows[i]?;
            let release_step = match &spec.kind {
                EventKind::Place {
                    travel_steps,
                    deactivation_step,
                } => Some(deactivation_step.unwrap_or(start.offset(*travel_steps))),
                _ => None,
            };
            Some(ScheduledEvent {
                id: spec.id,
                object: spec.object,
                subject: spec.subject,
                kind: spec.kind.clone(),
                trigger: spec.trigger.clone(),
                start,
                end,
                release_step,
                depends_on: deps[i].iter().map(|&j| specs[j].id).collect(),
            })
        })
        .collect();
    events.sort_by_key(|e| (e.start, e.id));

    let freezes = freeze_windows(&events, registry, freeze_labels)?;
    tracing::debug!(
        events = events.len(),
        freezes = freezes.len(),
        "events scheduled"
    );
    Ok(Timeline { events, freezes })
}

fn find_cycle(specs: &[EventSpec], deps: &[Vec<usize>], in_degree: &[usize]) -> Vec<String> {
    let describe = |i: usize| format!("{} ({})", specs[i].id, specs[i].object);
    let Some(mut cur) = (0..specs.len()).find(|&i| in_degree[i] > 0) else {
        return Vec::new();
    };
    let mut path: Vec<usize> = Vec::new();
    loop {
        if let Some(pos) = path.iter().position(|&p| p == cur) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|&p| describe(p)).collect();
            cycle.push(describe(cur));
            return cycle;
        }
        path.push(cur);
        match deps[cur].iter().copied().find(|&d| in_degree[d] > 0) {
            Some(next) => cur = next,
            None => return path.iter().map(|&p| describe(p)).collect(),
        }
    }
}

fn freeze_windows(
    events: &[ScheduledEvent],
    registry: &LabelRegistry,
    labels: &[Label],
) -> Result<Vec<FreezeWindow>, GenerationError> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }
    let objects = labelled_objects(registry, labels)?;
    let windows: Vec<FreezeWindow> = events
        .iter()
        .filter(|e| objects.iter().any(|o| e.object == *o || e.subject == Some(*o)))
        .map(|e| FreezeWindow {
            start: e.start,
            end: e.end,
        })
        .collect();
    Ok(merge_windows(windows))
}

/// Sort freeze windows and merge the ones that overlap or touch.
pub fn merge_windows(mut windows: Vec<FreezeWindow>) -> Vec<FreezeWindow> {
    windows.sort_by_key(|w| (w.start, w.end));
    let mut merged: Vec<FreezeWindow> = Vec::with_capacity(windows.len());
    for w in windows {
        match merged.last_mut() {
            Some(last) if w.start <= last.end.next() => {
                if w.end > last.end {
                    last.end = w.end;
                }
            }
            _ => merged.push(w),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(entries: &[(&str, &[u32])]) -> LabelRegistry {
        let mut reg = LabelRegistry::new();
        for (label, ids) in entries {
            let label = Label::from(*label);
            reg.declare(&label);
            for id in *ids {
                reg.register(&label, ObjectId(*id));
            }
            reg.settle(&label);
        }
        reg
    }

    fn placer(id: u32, object: u32, trigger: EventTrigger) -> EventSpec {
        EventSpec {
            id: EventId(id),
            object: ObjectId(object),
            subject: None,
            kind: EventKind::Empty { travel_steps: 5 },
            trigger,
        }
    }

    fn after(labels: &[&str]) -> EventTrigger {
        EventTrigger::After {
            labels: labels.iter().map(|l| Label::from(*l)).collect(),
            fallback: Step(1),
        }
    }

    #[test]
    fn chain_starts_after_dependencies() {
        let reg = registry(&[("a", &[10]), ("b", &[11])]);
        let specs = vec![
            placer(0, 10, EventTrigger::Step { step: Step(3) }),
            placer(1, 11, after(&["a"])),
            placer(2, 12, after(&["a", "b"])),
        ];
        let t = schedule(&specs, &reg, &[]).unwrap();
        let e0 = t.event(EventId(0)).unwrap();
        let e1 = t.event(EventId(1)).unwrap();
        let e2 = t.event(EventId(2)).unwrap();
        assert_eq!((e0.start, e0.end), (Step(3), Step(12)));
        assert_eq!(e1.start, Step(13));
        assert!(e2.start > e1.end);
        assert_eq!(e2.depends_on, vec![EventId(0), EventId(1)]);
    }

    #[test]
    fn labels_without_events_use_fallback() {
        let reg = registry(&[("still", &[5])]);
        let specs = vec![placer(
            0,
            10,
            EventTrigger::After {
                labels: vec![Label::from("still")],
                fallback: Step(7),
            },
        )];
        let t = schedule(&specs, &reg, &[]).unwrap();
        assert_eq!(t.events[0].start, Step(7));
    }

    #[test]
    fn on_start_or_after_waits_only_for_early_dependencies() {
        let reg = registry(&[("early", &[10]), ("late", &[11])]);
        let specs = vec![
            placer(0, 10, EventTrigger::Step { step: Step(1) }),
            placer(1, 11, EventTrigger::Step { step: Step(30) }),
            placer(
                2,
                12,
                EventTrigger::OnStartOrAfter {
                    labels: vec![Label::from("early")],
                },
            ),
            placer(
                3,
                13,
                EventTrigger::OnStartOrAfter {
                    labels: vec![Label::from("late")],
                },
            ),
        ];
        let t = schedule(&specs, &reg, &[]).unwrap();
        assert_eq!(t.event(EventId(2)).unwrap().start, Step(11));
        assert_eq!(t.event(EventId(3)).unwrap().start, Step(1));
    }

    #[test]
    fn cycle_is_reported() {
        let reg = registry(&[("a", &[10]), ("b", &[11])]);
        let specs = vec![placer(0, 10, after(&["b"])), placer(1, 11, after(&["a"]))];
        match schedule(&specs, &reg, &[]) {
            Err(GenerationError::CyclicEventDependency { cycle }) => {
                assert_eq!(cycle.len(), 3);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let reg = registry(&[("me", &[10])]);
        let specs = vec![placer(0, 10, after(&["me"]))];
        assert!(matches!(
            schedule(&specs, &reg, &[]),
            Err(GenerationError::CyclicEventDependency { .. })
        ));
    }

    #[test]
    fn freeze_windows_merge() {
        let reg = registry(&[("p", &[10, 11, 12])]);
        let specs = vec![
            placer(0, 10, EventTrigger::Step { step: Step(1) }),
            placer(1, 11, EventTrigger::Step { step: Step(5) }),
            placer(2, 12, EventTrigger::Step { step: Step(40) }),
        ];
        let t = schedule(&specs, &reg, &[Label::from("p")]).unwrap();
        assert_eq!(
            t.freezes,
            vec![
                FreezeWindow {
                    start: Step(1),
                    end: Step(14)
                },
                FreezeWindow {
                    start: Step(40),
                    end: Step(49)
                },
            ]
        );
    }

    #[test]
    fn place_release_defaults_to_bottom_of_descent() {
        let reg = registry(&[]);
        let specs = vec![EventSpec {
            id: EventId(0),
            object: ObjectId(1),
            subject: Some(ObjectId(2)),
            kind: EventKind::Place {
                travel_steps: 8,
                deactivation_step: None,
            },
            trigger: EventTrigger::Step { step: Step(2) },
        }];
        let t = schedule(&specs, &reg, &[]).unwrap();
        assert_eq!(t.events[0].release_step, Some(Step(10)));
        assert_eq!(t.final_step(), Step(17));
    }

    #[test]
    fn travel_steps_round_up() {
        assert_eq!(travel_steps(1.0, 0.25), 4);
        assert_eq!(travel_steps(1.01, 0.25), 5);
        assert_eq!(travel_steps(0.0, 0.25), 1);
    }

    #[test]
    fn planned_windows_merge_with_event_windows() {
        let w = |a, b| FreezeWindow {
            start: Step(a),
            end: Step(b),
        };
        assert_eq!(
            merge_windows(vec![w(20, 30), w(1, 24), w(40, 41), w(31, 35)]),
            vec![w(1, 35), w(40, 41)]
        );
        assert!(merge_windows(Vec::new()).is_empty());
    }

    #[test]
    fn structure_drops_last_their_travel() {
        let reg = registry(&[]);
        let specs = vec![EventSpec {
            id: EventId(0),
            object: ObjectId(3),
            subject: None,
            kind: EventKind::StructureDrop { travel_steps: 20 },
            trigger: EventTrigger::Step { step: Step(5) },
        }];
        let t = schedule(&specs, &reg, &[]).unwrap();
        assert_eq!((t.events[0].start, t.events[0].end), (Step(5), Step(24)));
        assert_eq!(t.events[0].release_step, None);
    }
}
