//! Object placement planner.
//!
//! The planner is a fixed sequence of phases:
//!
//! ```text
//! RoomInit → StructuralPlacement → KeywordObjectPlacement →
//! SpecificObjectPlacement → AgentPlacement → GoalBinding → Done
//! ```
//!
//! Each configuration entry becomes a [`Declaration`] owned by one phase.
//! Before any placement, every label a declaration attaches is declared in
//! the [`LabelRegistry`] and every label it refers to becomes a dependency
//! edge, so cycles fail fast. A declaration whose references are not yet
//! settled is deferred and retried after each phase.
//!
//! All per-attempt state lives in [`PhaseContext`]; a failed phase drops
//! it and nothing partial escapes.

mod agents;
mod goal;
mod keyword;
mod placement;
mod room;
mod shortcuts;
mod specific;
mod structural;

use crate::config::{
    AgentConfig, DoorConfig, FloorAreaConfig, GenerationOptions, InteractableObjectConfig,
    KeywordLocationConfig, KeywordObjectsConfig, MovingOccluderConfig, OccludingWallConfig,
    PathCheck, PlacerConfig, PlatformConfig, RampConfig, RoomShape, ScenarioConfig, ToolConfig,
    WallConfig,
};
use crate::labels::{LabelRegistry, Resolution};
use crate::sampler::Sampler;
use crate::scene::{DeclarationKey, ObjectInstance, PerformerStart, RoomMaterials};
use crate::schedule::{EventSpec, FreezeWindow};
use indexmap::IndexMap;
use scenegen_core::{GenerationError, Label, ObjectId, OneOf, RegionId, Vec3};
use scenegen_space::{RoomGrid, SpatialIndex};
use std::fmt;

pub(crate) use goal::check_arity;
pub(crate) use placement::Pose;
pub(crate) use shortcuts::goal_category;
pub use shortcuts::{
    AGENT_WITH_TARGET_LABEL, FORCED_CHOICE_PLACER_LABEL, START_STRUCTURE_LABEL, TRIPLE_DOOR_LABEL,
};
pub use structural::{DOOR_LABEL, RAMP_LABEL};

/// Half the performer's body width.
pub const PERFORMER_HALF_WIDTH: f64 = 0.27;

/// Performer eye-less body height used for the start reservation.
pub const PERFORMER_HEIGHT: f64 = 0.762;

/// Clearance kept between neighbouring objects.
pub const MIN_GAP: f64 = 0.1;

// ── Phases ──────────────────────────────────────────────────────────

/// Planner phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Room, materials and performer start.
    RoomInit,
    /// Shortcuts and structural objects.
    StructuralPlacement,
    /// `keyword_objects`.
    KeywordObjectPlacement,
    /// `specific_interactable_objects`.
    SpecificObjectPlacement,
    /// `specific_agents`.
    AgentPlacement,
    /// Goal targets.
    GoalBinding,
    /// Planning finished.
    Done,
}

impl Phase {
    /// Every phase in execution order.
    pub const ALL: [Phase; 7] = [
        Phase::RoomInit,
        Phase::StructuralPlacement,
        Phase::KeywordObjectPlacement,
        Phase::SpecificObjectPlacement,
        Phase::AgentPlacement,
        Phase::GoalBinding,
        Phase::Done,
    ];

    /// The phase after this one; `Done` is terminal.
    pub fn next(self) -> Phase {
        match self {
            Self::RoomInit => Self::StructuralPlacement,
            Self::StructuralPlacement => Self::KeywordObjectPlacement,
            Self::KeywordObjectPlacement => Self::SpecificObjectPlacement,
            Self::SpecificObjectPlacement => Self::AgentPlacement,
            Self::AgentPlacement => Self::GoalBinding,
            Self::GoalBinding | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RoomInit => "room_init",
            Self::StructuralPlacement => "structural_placement",
            Self::KeywordObjectPlacement => "keyword_object_placement",
            Self::SpecificObjectPlacement => "specific_object_placement",
            Self::AgentPlacement => "agent_placement",
            Self::GoalBinding => "goal_binding",
            Self::Done => "done",
        })
    }
}

// ── Shared decisions ────────────────────────────────────────────────

/// A value drawn once per declaration and reused by every instance.
#[derive(Clone, Debug, PartialEq)]
pub enum SharedValue {
    /// Shape name.
    Shape(String),
    /// Scale vector.
    Scale(Vec3),
    /// Material name.
    Material(String),
    /// Rotation in degrees.
    Rotation(f64),
    /// Flag.
    Flag(bool),
    /// Step number.
    Step(u32),
}

/// Decisions keyed by declaration and field. Entries are written once and
/// never replaced.
#[derive(Clone, Debug, Default)]
pub struct SharedDecisions {
    values: IndexMap<(DeclarationKey, &'static str), SharedValue>,
}

impl SharedDecisions {
    /// The stored decision, drawing it with `draw` on first use.
    pub fn get_or_draw(
        &mut self,
        key: &DeclarationKey,
        field: &'static str,
        draw: impl FnOnce() -> Result<SharedValue, GenerationError>,
    ) -> Result<SharedValue, GenerationError> {
        if let Some(v) = self.values.get(&(key.clone(), field)) {
            return Ok(v.clone());
        }
        let v = draw()?;
        self.values.insert((key.clone(), field), v.clone());
        Ok(v)
    }

    /// A stored decision.
    pub fn get(&self, key: &DeclarationKey, field: &'static str) -> Option<&SharedValue> {
        self.values.get(&(key.clone(), field))
    }

    /// Number of stored decisions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been decided yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ── Context ─────────────────────────────────────────────────────────

/// Room-level decisions made in [`Phase::RoomInit`].
#[derive(Clone, Debug)]
pub struct RoomState {
    /// Floor grid.
    pub grid: RoomGrid,
    /// Footprint shape.
    pub shape: RoomShape,
    /// Materials.
    pub materials: RoomMaterials,
    /// Performer start; shortcuts may move it during structural
    /// placement.
    pub performer: PerformerStart,
    /// Step limit.
    pub last_step: Option<u32>,
    /// The performer may open only one door.
    pub restrict_open_doors: bool,
}

/// Side assignment recorded by the forced-choice shortcut.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForcedChoiceSides {
    /// Objects left of the platform at step 0.
    pub left: Vec<ObjectId>,
    /// Objects right of the platform at step 0.
    pub right: Vec<ObjectId>,
    /// Objects placers add on the left.
    pub added_left: Vec<ObjectId>,
    /// Objects placers add on the right.
    pub added_right: Vec<ObjectId>,
    /// Objects placers remove.
    pub removed: Vec<ObjectId>,
}

impl ForcedChoiceSides {
    /// Final members of each side.
    pub fn final_sides(&self) -> (Vec<ObjectId>, Vec<ObjectId>) {
        let keep = |ids: &[ObjectId], added: &[ObjectId]| -> Vec<ObjectId> {
            ids.iter()
                .chain(added)
                .copied()
                .filter(|id| !self.removed.contains(id))
                .collect()
        };
        (
            keep(&self.left, &self.added_left),
            keep(&self.right, &self.added_right),
        )
    }
}

/// Everything one attempt has decided so far.
pub struct PhaseContext<'a> {
    /// The scenario.
    pub config: &'a ScenarioConfig,
    /// Engine options.
    pub options: &'a GenerationOptions,
    /// Attempt RNG.
    pub sampler: Sampler,
    /// Regions and object bounds.
    pub index: SpatialIndex,
    /// Label groups.
    pub registry: LabelRegistry,
    /// Room decisions.
    pub room: RoomState,
    /// Objects in creation order; `objects[i].id == ObjectId(i)`.
    pub objects: Vec<ObjectInstance>,
    /// Render material per region.
    pub region_materials: IndexMap<RegionId, String>,
    /// Unscheduled events.
    pub events: Vec<EventSpec>,
    /// `randomize_once` decisions.
    pub shared: SharedDecisions,
    /// Goal targets bound so far.
    pub goal_targets: Vec<ObjectId>,
    /// Reachability requirements per object.
    pub path_checks: Vec<(ObjectId, PathCheck)>,
    /// Forced-choice sides, when that shortcut ran.
    pub forced_choice: Option<ForcedChoiceSides>,
    /// Objects already claimed by a pickup placer.
    pub claimed: Vec<ObjectId>,
    /// Performer freezes decided while planning, independent of the
    /// event timeline.
    pub freezes: Vec<FreezeWindow>,
}

impl<'a> PhaseContext<'a> {
    /// Id the next committed object will get.
    pub fn next_id(&self) -> ObjectId {
        ObjectId(self.objects.len() as u32)
    }

    /// Look up a committed object.
    pub fn object(&self, id: ObjectId) -> Option<&ObjectInstance> {
        self.objects.get(id.0 as usize)
    }

    /// Mutable access to a committed object.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectInstance> {
        self.objects.get_mut(id.0 as usize)
    }

    /// Committed object; an unknown id is a configuration error.
    pub(crate) fn require(&self, id: ObjectId) -> Result<&ObjectInstance, GenerationError> {
        self.object(id)
            .ok_or_else(|| GenerationError::config("objects", format!("{id} does not exist")))
    }

    /// Record an object: attach labels, register them, reserve its space
    /// in the index.
    pub fn commit(&mut self, mut obj: ObjectInstance, labels: &[Label]) -> ObjectId {
        let id = self.next_id();
        obj.id = id;
        for label in labels {
            if !obj.labels.contains(label) {
                obj.labels.push(label.clone());
            }
            self.registry.register(label, id);
        }
        if obj.contained_in.is_none() && !obj.kind.is_mechanism() {
            if obj.held_by.is_none() {
                self.index.insert_object(id, obj.bounds());
            }
            if obj.final_position.is_some() && obj.picked_up_by.is_none() {
                self.index.insert_object(id, obj.final_bounds());
            }
        }
        tracing::trace!(%id, kind = ?obj.kind, shape = %obj.shape, "object committed");
        self.objects.push(obj);
        id
    }

    /// Resolve a label to one object.
    ///
    /// A settled label with no members is a recoverable failure: another
    /// seed may give the providing declaration a non-zero count.
    pub fn resolve_one(&mut self, label: &Label) -> Result<ObjectId, GenerationError> {
        match self.registry.resolve(label, self.sampler.rng())? {
            Resolution::Ready(id) => Ok(id),
            Resolution::Empty => Err(GenerationError::PlacementExhausted {
                what: format!("a reference to empty label `{label}`"),
                tries: 0,
            }),
            Resolution::Pending => Err(GenerationError::config(
                format!("label `{label}`"),
                "used before its providers ran",
            )),
        }
    }

    /// Every object under a label.
    pub fn resolve_all(&self, label: &Label) -> Result<Vec<ObjectId>, GenerationError> {
        match self.registry.resolve_group(label)? {
            Resolution::Ready(ids) => Ok(ids.to_vec()),
            Resolution::Empty => Ok(Vec::new()),
            Resolution::Pending => Err(GenerationError::config(
                format!("label `{label}`"),
                "used before its providers ran",
            )),
        }
    }

    /// Draw a value with `draw`. When `shared` is set, the first draw
    /// for `key`/`field` is stored and every later call returns it.
    pub(crate) fn decide<T: Clone>(
        &mut self,
        key: &DeclarationKey,
        field: &'static str,
        shared: bool,
        draw: impl FnOnce(&mut Sampler) -> Result<T, GenerationError>,
        into: fn(T) -> SharedValue,
        from: fn(&SharedValue) -> Option<T>,
    ) -> Result<T, GenerationError> {
        if !shared {
            return draw(&mut self.sampler);
        }
        if let Some(v) = self.shared.get(key, field).and_then(from) {
            return Ok(v);
        }
        let v = draw(&mut self.sampler)?;
        self.shared.get_or_draw(key, field, || Ok(into(v.clone())))?;
        Ok(v)
    }
}

// ── Declarations ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
enum Source<'a> {
    Wall(&'a WallConfig),
    Platform(&'a PlatformConfig),
    Ramp(&'a RampConfig),
    Door(&'a DoorConfig),
    Lava(&'a FloorAreaConfig),
    Hole(&'a FloorAreaConfig),
    Tool(&'a ToolConfig),
    OccludingWall(&'a OccludingWallConfig),
    MovingOccluder(&'a MovingOccluderConfig),
    Placer(&'a PlacerConfig),
    Keyword(&'a KeywordObjectsConfig),
    Interactable(&'a InteractableObjectConfig),
    Agent(&'a AgentConfig),
    GoalTarget(&'a InteractableObjectConfig),
}

/// One configuration entry scheduled into a phase.
#[derive(Clone, Debug)]
struct Declaration<'a> {
    key: DeclarationKey,
    phase: Phase,
    source: Source<'a>,
}

fn location_refs(loc: Option<&OneOf<KeywordLocationConfig>>) -> Vec<Label> {
    loc.map(|l| {
        l.options()
            .into_iter()
            .filter_map(|kl| kl.relative_object_label)
            .collect()
    })
    .unwrap_or_default()
}

fn with_label(labels: &[Label], automatic: &str) -> Vec<Label> {
    let mut out = labels.to_vec();
    if !out.iter().any(|l| l.as_str() == automatic) {
        out.push(Label::from(automatic));
    }
    out
}

fn pickup_mode(p: &PlacerConfig) -> (bool, bool) {
    let mut opts = p.pickup_object.options();
    if let Some(shared) = p.randomize_once.as_ref().and_then(|r| r.pickup_object.as_ref()) {
        opts = shared.options();
    }
    (opts.contains(&true), opts.contains(&false))
}

impl<'a> Declaration<'a> {
    /// Labels this declaration attaches to what it creates.
    fn provides(&self) -> Vec<Label> {
        match self.source {
            Source::Wall(c) => c.labels.clone(),
            Source::Platform(c) if c.attached_ramps.bounds().is_some_and(|(_, hi)| hi > 0) => {
                let mut out = c.labels.clone();
                out.push(Label::from(RAMP_LABEL));
                out
            }
            Source::Platform(c) => c.labels.clone(),
            Source::Ramp(c) => with_label(&c.labels, RAMP_LABEL),
            Source::Door(c) => with_label(&c.labels, DOOR_LABEL),
            Source::Lava(c) | Source::Hole(c) => c.labels.clone(),
            Source::Tool(c) => c.labels.clone(),
            Source::OccludingWall(c) => c.labels.clone(),
            Source::MovingOccluder(c) => c.labels.clone(),
            Source::Placer(c) => {
                let mut out = c.labels.clone();
                let (may_pick, may_place) = pickup_mode(c);
                if may_place && !may_pick {
                    out.extend(c.placed_object_labels.iter().cloned());
                }
                out
            }
            Source::Keyword(c) => c.labels.clone(),
            Source::Interactable(c) | Source::GoalTarget(c) => c.labels.clone(),
            Source::Agent(c) => c.labels.clone(),
        }
    }

    /// Labels that must be settled before this declaration can run.
    fn references(&self, registry: &LabelRegistry) -> Vec<Label> {
        match self.source {
            Source::OccludingWall(c) => c.target_label.iter().cloned().collect(),
            Source::Placer(c) => {
                let mut out: Vec<Label> = c
                    .placed_object_above
                    .iter()
                    .chain(c.end_height_relative_object_label.iter())
                    .cloned()
                    .collect();
                let (may_pick, _) = pickup_mode(c);
                if may_pick {
                    out.extend(
                        c.placed_object_labels
                            .iter()
                            .filter(|l| registry.is_declared(l.as_str()))
                            .cloned(),
                    );
                }
                out
            }
            Source::Keyword(c) => location_refs(c.keyword_location.as_ref()),
            Source::Interactable(c) | Source::GoalTarget(c) => {
                let mut out = location_refs(c.keyword_location.as_ref());
                out.extend(c.identical_to.iter().cloned());
                out.extend(c.identical_except_color.iter().cloned());
                out
            }
            Source::Wall(_)
            | Source::Platform(_)
            | Source::Ramp(_)
            | Source::Door(_)
            | Source::Lava(_)
            | Source::Hole(_)
            | Source::Tool(_)
            | Source::MovingOccluder(_)
            | Source::Agent(_) => Vec::new(),
        }
    }
}

fn declarations<'a>(config: &'a ScenarioConfig, shortcut_targets: bool) -> Vec<Declaration<'a>> {
    let mut out = Vec::new();
    let mut push = |key: DeclarationKey, phase: Phase, source: Source<'a>| {
        out.push(Declaration { key, phase, source })
    };
    macro_rules! each {
        ($list:expr, $name:literal, $phase:expr, $variant:ident) => {
            for (i, c) in $list.iter().enumerate() {
                push(DeclarationKey::new($name, i), $phase, Source::$variant(c));
            }
        };
    }
    use Phase::*;
    each!(config.structural_walls, "structural_walls", StructuralPlacement, Wall);
    each!(config.structural_platforms, "structural_platforms", StructuralPlacement, Platform);
    each!(config.structural_ramps, "structural_ramps", StructuralPlacement, Ramp);
    each!(config.structural_doors, "structural_doors", StructuralPlacement, Door);
    each!(config.lava, "lava", StructuralPlacement, Lava);
    each!(config.holes, "holes", StructuralPlacement, Hole);
    each!(config.tools, "tools", StructuralPlacement, Tool);
    each!(
        config.structural_occluding_walls,
        "structural_occluding_walls",
        StructuralPlacement,
        OccludingWall
    );
    each!(
        config.structural_moving_occluders,
        "structural_moving_occluders",
        StructuralPlacement,
        MovingOccluder
    );
    each!(config.placers, "placers", StructuralPlacement, Placer);
    each!(config.keyword_objects, "keyword_objects", KeywordObjectPlacement, Keyword);
    each!(
        config.specific_interactable_objects,
        "specific_interactable_objects",
        SpecificObjectPlacement,
        Interactable
    );
    each!(config.specific_agents, "specific_agents", AgentPlacement, Agent);
    if !shortcut_targets {
        if let Some(target) = config.goal.as_ref().and_then(|g| g.target.as_ref()) {
            push(DeclarationKey::shortcut("goal.target"), GoalBinding, Source::GoalTarget(target));
        }
    }
    out
}

fn execute(ctx: &mut PhaseContext<'_>, decl: &Declaration<'_>) -> Result<(), GenerationError> {
    tracing::trace!(key = %decl.key, phase = %decl.phase, "running declaration");
    match decl.source {
        Source::Wall(c) => structural::walls(ctx, &decl.key, c)?,
        Source::Platform(c) => structural::platforms(ctx, &decl.key, c)?,
        Source::Ramp(c) => structural::ramps(ctx, &decl.key, c)?,
        Source::Door(c) => structural::doors(ctx, &decl.key, c)?,
        Source::Lava(c) => structural::floor_areas(ctx, &decl.key, c, scenegen_space::RegionKind::Lava)?,
        Source::Hole(c) => structural::floor_areas(ctx, &decl.key, c, scenegen_space::RegionKind::Hole)?,
        Source::Tool(c) => structural::tools(ctx, &decl.key, c)?,
        Source::OccludingWall(c) => structural::occluding_walls(ctx, &decl.key, c)?,
        Source::MovingOccluder(c) => structural::moving_occluders(ctx, &decl.key, c)?,
        Source::Placer(c) => structural::placers(ctx, &decl.key, c)?,
        Source::Keyword(c) => keyword::keyword_objects(ctx, &decl.key, c)?,
        Source::Interactable(c) => {
            specific::interactables(ctx, &decl.key, c, None)?;
        }
        Source::Agent(c) => agents::agents(ctx, &decl.key, c)?,
        Source::GoalTarget(c) => goal::targets(ctx, &decl.key, c)?,
    }
    for label in decl.provides() {
        ctx.registry.settle(&label);
    }
    Ok(())
}

fn is_ready(ctx: &PhaseContext<'_>, decl: &Declaration<'_>) -> bool {
    decl.references(&ctx.registry)
        .iter()
        .all(|l| !ctx.registry.is_declared(l.as_str()) || ctx.registry.is_settled(l.as_str()))
}

fn drain_deferred(
    ctx: &mut PhaseContext<'_>,
    decls: &[Declaration<'_>],
    deferred: &mut Vec<usize>,
) -> Result<(), GenerationError> {
    loop {
        let Some(pos) = deferred.iter().position(|&i| is_ready(ctx, &decls[i])) else {
            return Ok(());
        };
        let i = deferred.remove(pos);
        tracing::trace!(key = %decls[i].key, "running deferred declaration");
        execute(ctx, &decls[i])?;
    }
}

// ── Planner ─────────────────────────────────────────────────────────

/// Output of a successful planning pass.
pub struct Plan {
    /// Room decisions.
    pub room: RoomState,
    /// Regions and object bounds.
    pub index: SpatialIndex,
    /// Settled label groups.
    pub registry: LabelRegistry,
    /// Every object.
    pub objects: Vec<ObjectInstance>,
    /// Render material per region.
    pub region_materials: IndexMap<RegionId, String>,
    /// Unscheduled events.
    pub events: Vec<EventSpec>,
    /// Goal targets.
    pub goal_targets: Vec<ObjectId>,
    /// Reachability requirements.
    pub path_checks: Vec<(ObjectId, PathCheck)>,
    /// Forced-choice sides.
    pub forced_choice: Option<ForcedChoiceSides>,
    /// Planned performer freezes.
    pub freezes: Vec<FreezeWindow>,
    /// Rejection-sampling candidates drawn.
    pub candidates_drawn: u64,
}

/// Run every phase for one attempt.
///
/// # Errors
///
/// Any [`GenerationError`]; the attempt's state is dropped.
pub fn plan(
    config: &ScenarioConfig,
    options: &GenerationOptions,
    seed: u64,
) -> Result<Plan, GenerationError> {
    let sampler = Sampler::new(seed, options.placement_tries);
    let mut ctx = room::init(config, options, sampler)?;
    tracing::debug!(phase = %Phase::RoomInit, room = ?ctx.room.grid.dimensions(), "phase complete");

    let shortcut_targets = shortcuts::produces_targets(config);
    let decls = declarations(config, shortcut_targets);
    for decl in &decls {
        for label in decl.provides() {
            ctx.registry.declare(&label);
        }
    }
    let shortcut_labels: Vec<Label> = if shortcut_targets {
        config
            .goal
            .as_ref()
            .and_then(|g| g.target.as_ref())
            .map(|t| t.labels.clone())
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    for label in &shortcut_labels {
        ctx.registry.declare(label);
    }
    for decl in &decls {
        let refs = decl.references(&ctx.registry);
        for provided in decl.provides() {
            for r in &refs {
                ctx.registry.add_dependency(&provided, r);
            }
        }
    }
    ctx.registry.check_acyclic()?;

    let mut deferred: Vec<usize> = Vec::new();
    let mut phase = Phase::StructuralPlacement;
    while phase != Phase::Done {
        if phase == Phase::StructuralPlacement {
            shortcuts::structural(&mut ctx)?;
            for label in &shortcut_labels {
                ctx.registry.settle(label);
            }
        }
        for (i, decl) in decls.iter().enumerate().filter(|(_, d)| d.phase == phase) {
            if is_ready(&ctx, decl) {
                execute(&mut ctx, decl)?;
            } else {
                tracing::trace!(key = %decl.key, "declaration deferred");
                deferred.push(i);
            }
        }
        drain_deferred(&mut ctx, &decls, &mut deferred)?;
        if phase == Phase::StructuralPlacement {
            shortcuts::after_structural(&mut ctx)?;
        }
        if phase == Phase::GoalBinding {
            goal::bind(&mut ctx)?;
        }
        tracing::debug!(%phase, objects = ctx.objects.len(), deferred = deferred.len(), "phase complete");
        phase = phase.next();
    }
    if let Some(&i) = deferred.first() {
        return Err(GenerationError::config(
            decls[i].key.to_string(),
            "references labels that never resolve",
        ));
    }

    Ok(Plan {
        candidates_drawn: ctx.sampler.candidates_drawn(),
        room: ctx.room,
        index: ctx.index,
        registry: ctx.registry,
        objects: ctx.objects,
        region_materials: ctx.region_materials,
        events: ctx.events,
        goal_targets: ctx.goal_targets,
        path_checks: ctx.path_checks,
        forced_choice: ctx.forced_choice,
        freezes: ctx.freezes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let mut p = Phase::RoomInit;
        let mut seen = vec![p];
        while p != Phase::Done {
            p = p.next();
            seen.push(p);
        }
        assert_eq!(seen, Phase::ALL);
        assert_eq!(Phase::Done.next(), Phase::Done);
    }

    #[test]
    fn shared_decisions_are_write_once() {
        let mut shared = SharedDecisions::default();
        let key = DeclarationKey::new("placers", 0);
        let first = shared
            .get_or_draw(&key, "pickup", || Ok(SharedValue::Flag(true)))
            .unwrap();
        let second = shared
            .get_or_draw(&key, "pickup", || Ok(SharedValue::Flag(false)))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn forced_choice_final_sides_apply_changes() {
        let sides = ForcedChoiceSides {
            left: vec![ObjectId(1), ObjectId(2)],
            right: vec![ObjectId(3)],
            added_left: vec![],
            added_right: vec![ObjectId(7)],
            removed: vec![ObjectId(2)],
        };
        let (l, r) = sides.final_sides();
        assert_eq!(l, vec![ObjectId(1)]);
        assert_eq!(r, vec![ObjectId(3), ObjectId(7)]);
    }

    #[test]
    fn declarations_follow_phase_order() {
        let cfg = ScenarioConfig::from_json_str(
            r#"{
                "specific_interactable_objects": [{"labels": "ball"}],
                "placers": [{"placed_object_above": "ball"}],
                "goal": {"category": "retrieval", "target": {}}
            }"#,
        )
        .unwrap();
        let decls = declarations(&cfg, false);
        let phases: Vec<Phase> = decls.iter().map(|d| d.phase).collect();
        assert_eq!(
            phases,
            vec![
                Phase::StructuralPlacement,
                Phase::SpecificObjectPlacement,
                Phase::GoalBinding
            ]
        );
        let reg = LabelRegistry::new();
        assert_eq!(decls[0].references(&reg), vec![Label::from("ball")]);
        assert_eq!(decls[1].provides(), vec![Label::from("ball")]);
    }
}
