//! `KeywordObjectPlacement`: containers, obstacles, occluders, confusors
//! and context objects.

use super::placement::{kind_for, Look};
use super::specific::{target_shapes, Placement};
use super::PhaseContext;
use crate::catalog::{self, ShapeCategory};
use crate::config::{KeywordKind, KeywordObjectsConfig};
use crate::scene::DeclarationKey;
use scenegen_core::{GenerationError, OneOf};

fn category(kind: KeywordKind) -> ShapeCategory {
    match kind {
        KeywordKind::Containers => ShapeCategory::Container,
        KeywordKind::Obstacles => ShapeCategory::Obstacle,
        KeywordKind::Occluders => ShapeCategory::Occluder,
        KeywordKind::Confusors => ShapeCategory::Pickupable,
        KeywordKind::Context => ShapeCategory::Context,
    }
}

/// Pickupable shapes that differ from every possible goal target shape.
fn confusor_shapes(ctx: &PhaseContext<'_>, key: &DeclarationKey) -> Result<OneOf<String>, GenerationError> {
    let mut excluded = ctx.config.excluded_shapes.clone();
    excluded.extend(target_shapes(ctx));
    let names: Vec<String> = catalog::shapes_in(ShapeCategory::Pickupable, &excluded)
        .into_iter()
        .map(|d| d.name.to_owned())
        .collect();
    if names.is_empty() {
        return Err(GenerationError::config(
            key.to_string(),
            "no pickupable shape differs from the goal target",
        ));
    }
    Ok(OneOf::List(names))
}

pub(super) fn keyword_objects(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &KeywordObjectsConfig,
) -> Result<(), GenerationError> {
    let n = ctx.sampler.sample(&c.num)?;
    let confusors = match c.keyword {
        KeywordKind::Confusors => Some(confusor_shapes(ctx, key)?),
        _ => None,
    };
    for i in 0..n {
        let look = Look {
            shape: confusors.as_ref(),
            ..Look::default()
        };
        let appearance = ctx.appearance(key, look, category(c.keyword))?;
        let location = match &c.keyword_location {
            Some(options) => Some(ctx.sampler.choose(options)?),
            None => None,
        };
        let what = format!("{key} {:?} {i}", c.keyword);
        ctx.place(
            key,
            &what,
            &appearance,
            kind_for(appearance.category),
            Placement {
                location: location.as_ref(),
                ..Placement::default()
            },
            &c.labels,
        )?;
    }
    tracing::trace!(%key, keyword = ?c.keyword, n, "keyword objects placed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::room;
    use super::*;
    use crate::config::{GenerationOptions, ScenarioConfig};
    use crate::sampler::Sampler;
    use crate::scene::ObjectKind;

    fn run(json: &str, keyword: &str, seed: u64) -> Vec<(ObjectKind, String)> {
        let cfg: &'static ScenarioConfig =
            Box::leak(Box::new(ScenarioConfig::from_json_str(json).unwrap()));
        let opts: &'static GenerationOptions = Box::leak(Box::default());
        let mut ctx = room::init(cfg, opts, Sampler::new(seed, 50)).unwrap();
        let c: KeywordObjectsConfig =
            serde_json::from_str(&format!(r#"{{"keyword": "{keyword}", "num": 3}}"#)).unwrap();
        keyword_objects(&mut ctx, &DeclarationKey::new("keyword_objects", 0), &c).unwrap();
        ctx.objects.iter().map(|o| (o.kind, o.shape.clone())).collect()
    }

    #[test]
    fn containers_are_containers() {
        let objs = run(r#"{"room_dimensions": {"x": 14, "y": 4, "z": 14}}"#, "containers", 3);
        assert_eq!(objs.len(), 3);
        assert!(objs.iter().all(|(k, _)| *k == ObjectKind::Container));
    }

    #[test]
    fn confusors_avoid_the_target_shape() {
        let json = r#"{"room_dimensions": {"x": 14, "y": 4, "z": 14},
                       "goal": {"category": "retrieval", "target": {"shape": "soccer_ball"}}}"#;
        for seed in 0..10 {
            for (kind, shape) in run(json, "confusors", seed) {
                assert_eq!(kind, ObjectKind::Interactable);
                assert_ne!(shape, "soccer_ball");
            }
        }
    }
}
