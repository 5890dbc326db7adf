//! `SpecificObjectPlacement`: explicitly declared interactable objects,
//! and the placement routine shared with keyword objects and goal
//! targets.

use super::placement::{kind_for, Appearance, FloorRequest, Located, Look};
use super::PhaseContext;
use crate::catalog::{self, ShapeCategory};
use crate::config::{InteractableObjectConfig, KeywordLocationConfig, PathCheck};
use crate::scene::{DeclarationKey, ObjectKind};
use scenegen_core::{GenerationError, Label, MinMax, ObjectId, OneOf, Randomizable, VectorRandomizable};

/// Where one object should go.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Placement<'c> {
    pub location: Option<&'c KeywordLocationConfig>,
    pub position: Option<&'c VectorRandomizable>,
    pub rotation: Option<&'c Randomizable<f64>>,
    pub distance_from_performer: Option<&'c MinMax<f64>>,
}

impl PhaseContext<'_> {
    /// Position `appearance` per `placement` and commit it.
    pub(crate) fn place(
        &mut self,
        key: &DeclarationKey,
        what: &str,
        appearance: &Appearance,
        kind: ObjectKind,
        placement: Placement<'_>,
        labels: &[Label],
    ) -> Result<ObjectId, GenerationError> {
        let req = FloorRequest {
            what,
            dimensions: appearance.dimensions,
            position: placement.position,
            rotation: placement.rotation,
            distance_from_performer: placement.distance_from_performer,
        };
        let located = match placement.location {
            Some(loc) => self.located_pose(&req, loc)?,
            None => Located::from(self.floor_pose(&req)?),
        };
        let mut obj = appearance
            .instance(kind, key)
            .at(located.pose.position, located.pose.rotation_y);
        obj.contained_in = located.contained_in;
        obj.associated_with = located.associated_with;
        Ok(self.commit(obj, labels))
    }
}

/// Copy the look of an existing object, optionally with a different
/// material.
fn copied_look(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    label: &Label,
    recolour: bool,
) -> Result<Appearance, GenerationError> {
    let id = ctx.resolve_one(label)?;
    let source = ctx.require(id)?;
    let def = catalog::lookup(&source.shape);
    let mut look = Appearance {
        shape: source.shape.clone(),
        category: def.map_or(ShapeCategory::Pickupable, |d| d.category),
        scale: source.scale,
        dimensions: source.dimensions,
        material: source.material.clone(),
    };
    if recolour {
        let others: Vec<&str> = def
            .map_or(&[][..], |d| d.materials)
            .iter()
            .copied()
            .filter(|m| Some(*m) != look.material.as_deref())
            .collect();
        let material = ctx
            .sampler
            .pick(&others)
            .ok_or_else(|| GenerationError::PlacementExhausted {
                what: format!("{key}: recoloured `{}` (no other material)", look.shape),
                tries: 1,
            })?;
        look.material = Some((*material).to_owned());
    }
    Ok(look)
}

/// Create every instance of an interactable declaration. `kind` overrides
/// the role implied by the shape category.
pub(super) fn interactables(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &InteractableObjectConfig,
    kind: Option<ObjectKind>,
) -> Result<Vec<ObjectId>, GenerationError> {
    let n = ctx.sampler.sample(&c.num)?;
    let shared = c.randomize_once.as_ref();
    let path_check = c.check_valid_path.or_else(|| {
        (kind == Some(ObjectKind::Target)).then_some(ctx.config.check_valid_path)
    });
    let mut out = Vec::with_capacity(n as usize);
    for i in 0..n {
        let appearance = match (&c.identical_to, &c.identical_except_color) {
            (Some(label), _) => copied_look(ctx, key, label, false)?,
            (None, Some(label)) => copied_look(ctx, key, label, true)?,
            (None, None) => ctx.appearance(
                key,
                Look {
                    shape: c.shape.as_ref(),
                    scale: c.scale.as_ref(),
                    material: c.material.as_ref(),
                    shared,
                },
                ShapeCategory::Pickupable,
            )?,
        };
        let rotation = ctx.rotation(key, c.rotation_y.as_ref(), shared)?;
        let location = match &c.keyword_location {
            Some(options) => Some(ctx.sampler.choose(options)?),
            None => None,
        };
        let fixed_rotation = Randomizable::Fixed(rotation);
        let what = format!("{key} object {i}");
        let id = ctx.place(
            key,
            &what,
            &appearance,
            kind.unwrap_or_else(|| kind_for(appearance.category)),
            Placement {
                location: location.as_ref(),
                position: c.position.as_ref(),
                rotation: Some(&fixed_rotation),
                distance_from_performer: c.distance_from_performer.as_ref(),
            },
            &c.labels,
        )?;
        if let Some(mode) = path_check.filter(|m| *m != PathCheck::Off) {
            ctx.path_checks.push((id, mode));
        }
        out.push(id);
    }
    Ok(out)
}

/// Shapes an object must not share with the goal target.
pub(super) fn target_shapes(ctx: &PhaseContext<'_>) -> Vec<String> {
    let Some(goal) = ctx.config.goal.as_ref() else {
        return Vec::new();
    };
    let mut out: Vec<String> = goal
        .target
        .as_ref()
        .and_then(|t| t.shape.as_ref())
        .map(OneOf::options)
        .unwrap_or_default();
    for label in &goal.target_labels {
        if let Ok(ids) = ctx.resolve_all(label) {
            out.extend(ids.iter().filter_map(|id| ctx.object(*id)).map(|o| o.shape.clone()));
        }
    }
    out.extend(ctx.goal_targets.iter().filter_map(|id| ctx.object(*id)).map(|o| o.shape.clone()));
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::super::room;
    use super::*;
    use crate::config::{GenerationOptions, ScenarioConfig};
    use crate::sampler::Sampler;

    fn context(cfg: &ScenarioConfig, opts: &GenerationOptions, seed: u64) -> PhaseContext<'static> {
        let cfg: &'static ScenarioConfig = Box::leak(Box::new(cfg.clone()));
        let opts: &'static GenerationOptions = Box::leak(Box::new(opts.clone()));
        room::init(cfg, opts, Sampler::new(seed, 50)).unwrap()
    }

    fn big_room() -> ScenarioConfig {
        ScenarioConfig::from_json_str(r#"{"room_dimensions": {"x": 12, "y": 4, "z": 12}}"#).unwrap()
    }

    #[test]
    fn identical_objects_share_their_look() {
        let cfg = big_room();
        let mut ctx = context(&cfg, &GenerationOptions::default(), 4);
        let key = DeclarationKey::new("specific_interactable_objects", 0);
        let first = InteractableObjectConfig {
            shape: Some(OneOf::Fixed("soccer_ball".into())),
            labels: vec![Label::new("ball")],
            ..InteractableObjectConfig::default()
        };
        let a = interactables(&mut ctx, &key, &first, None).unwrap();
        ctx.registry.settle(&Label::new("ball"));
        let copy = InteractableObjectConfig {
            identical_to: Some(Label::new("ball")),
            ..InteractableObjectConfig::default()
        };
        let key2 = DeclarationKey::new("specific_interactable_objects", 1);
        let b = interactables(&mut ctx, &key2, &copy, None).unwrap();
        let (a, b) = (ctx.object(a[0]).unwrap(), ctx.object(b[0]).unwrap());
        assert_eq!(a.shape, b.shape);
        assert_eq!(a.material, b.material);
        assert_eq!(a.dimensions, b.dimensions);
    }

    fn recolour(seed: u64, shape: &str) -> (PhaseContext<'static>, Result<Vec<ObjectId>, GenerationError>) {
        let cfg = big_room();
        let mut ctx = context(&cfg, &GenerationOptions::default(), seed);
        let key = DeclarationKey::new("specific_interactable_objects", 0);
        let first = InteractableObjectConfig {
            shape: Some(OneOf::Fixed(shape.into())),
            labels: vec![Label::new("ball")],
            ..InteractableObjectConfig::default()
        };
        interactables(&mut ctx, &key, &first, None).unwrap();
        ctx.registry.settle(&Label::new("ball"));
        let copy = InteractableObjectConfig {
            identical_except_color: Some(Label::new("ball")),
            ..InteractableObjectConfig::default()
        };
        let key2 = DeclarationKey::new("specific_interactable_objects", 1);
        let result = interactables(&mut ctx, &key2, &copy, None);
        (ctx, result)
    }

    #[test]
    fn recoloured_copies_change_material() {
        let (ctx, result) = recolour(9, "ball");
        let ids = result.unwrap();
        let b = ctx.object(ids[0]).unwrap();
        assert_eq!(b.shape, "ball");
        assert!(b.material.is_some());
        assert_ne!(b.material, ctx.object(ObjectId(0)).unwrap().material);
    }

    #[test]
    fn single_material_recolour_is_retryable() {
        let (_, result) = recolour(9, "soccer_ball");
        let err = result.unwrap_err();
        assert!(matches!(err, GenerationError::PlacementExhausted { .. }), "{err:?}");
        assert!(err.is_recoverable());
    }

    #[test]
    fn targets_inherit_the_scene_path_check() {
        let cfg = ScenarioConfig::from_json_str(
            r#"{"room_dimensions": {"x": 12, "y": 4, "z": 12}, "check_valid_path": true}"#,
        )
        .unwrap();
        let mut ctx = context(&cfg, &GenerationOptions::default(), 2);
        let key = DeclarationKey::shortcut("goal.target");
        let ids = interactables(&mut ctx, &key, &InteractableObjectConfig::default(), Some(ObjectKind::Target)).unwrap();
        assert_eq!(ctx.object(ids[0]).unwrap().kind, ObjectKind::Target);
        assert_eq!(ctx.path_checks.len(), 1);
    }

    #[test]
    fn shared_shape_is_drawn_once() {
        let cfg = big_room();
        let mut ctx = context(&cfg, &GenerationOptions::default(), 13);
        let key = DeclarationKey::new("specific_interactable_objects", 0);
        let c: InteractableObjectConfig = serde_json::from_str(
            r#"{"num": 5, "randomize_once": {"shape": ["soccer_ball", "duck_on_wheels", "toy_racecar"]}}"#,
        )
        .unwrap();
        let ids = interactables(&mut ctx, &key, &c, None).unwrap();
        let first = &ctx.object(ids[0]).unwrap().shape;
        assert!(ids.iter().all(|id| &ctx.object(*id).unwrap().shape == first));
    }
}
