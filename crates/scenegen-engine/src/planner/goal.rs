//! `GoalBinding`: create or bind goal targets and check goal arity.

use super::specific::interactables;
use super::{goal_category, PhaseContext};
use crate::config::{GoalCategory, InteractableObjectConfig, PathCheck};
use crate::scene::{DeclarationKey, ObjectKind};
use scenegen_core::{GenerationError, Invariant, ObjectId};

/// Create the targets described by `goal.target`.
pub(super) fn targets(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &InteractableObjectConfig,
) -> Result<(), GenerationError> {
    let ids = interactables(ctx, key, c, Some(ObjectKind::Target))?;
    ctx.goal_targets.extend(ids);
    Ok(())
}

/// Check the number of targets against the goal category.
pub(crate) fn check_arity(category: GoalCategory, found: usize) -> Result<(), Invariant> {
    let ok = match category {
        GoalCategory::Retrieval => found == 1,
        GoalCategory::MultiRetrieval => found >= 1,
    };
    if ok {
        return Ok(());
    }
    Err(Invariant::GoalArity {
        category: category.name().to_owned(),
        expected: match category {
            GoalCategory::Retrieval => "exactly 1".to_owned(),
            GoalCategory::MultiRetrieval => "at least 1".to_owned(),
        },
        found,
    })
}

/// Bind labelled targets, apply the forced-choice rule and check arity.
pub(super) fn bind(ctx: &mut PhaseContext<'_>) -> Result<(), GenerationError> {
    let config = ctx.config;
    let Some(category) = goal_category(config) else {
        return Ok(());
    };
    let target_labels = config.goal.as_ref().map_or(&[][..], |g| g.target_labels.as_slice());

    let mut bound: Vec<ObjectId> = Vec::new();
    for label in target_labels {
        bound.extend(ctx.resolve_all(label)?);
    }
    for id in &bound {
        if let Some(obj) = ctx.object_mut(*id) {
            if obj.kind == ObjectKind::Interactable {
                obj.kind = ObjectKind::Target;
            }
        }
        let mode = config.check_valid_path;
        if mode != PathCheck::Off && !ctx.path_checks.iter().any(|(t, _)| t == id) {
            ctx.path_checks.push((*id, mode));
        }
    }
    ctx.goal_targets.extend(bound);

    if let Some(sides) = &ctx.forced_choice {
        let (left, right) = sides.final_sides();
        if left.len() == right.len() {
            return Err(Invariant::ForcedChoiceTie { count: left.len() }.into());
        }
        let (winners, losers) = if left.len() > right.len() {
            (left, right)
        } else {
            (right, left)
        };
        for id in &losers {
            if let Some(obj) = ctx.object_mut(*id) {
                obj.kind = ObjectKind::Interactable;
            }
        }
        for id in &winners {
            if let Some(obj) = ctx.object_mut(*id) {
                obj.kind = ObjectKind::Target;
            }
        }
        ctx.goal_targets = winners;
    }

    let mut seen = Vec::with_capacity(ctx.goal_targets.len());
    ctx.goal_targets.retain(|id| {
        let fresh = !seen.contains(id);
        seen.push(*id);
        fresh
    });
    check_arity(category, ctx.goal_targets.len())?;
    tracing::debug!(category = category.name(), targets = ctx.goal_targets.len(), "goal bound");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_needs_exactly_one_target() {
        assert!(check_arity(GoalCategory::Retrieval, 1).is_ok());
        assert!(matches!(
            check_arity(GoalCategory::Retrieval, 2),
            Err(Invariant::GoalArity { found: 2, .. })
        ));
        assert!(check_arity(GoalCategory::Retrieval, 0).is_err());
    }

    #[test]
    fn multi_retrieval_needs_at_least_one() {
        assert!(check_arity(GoalCategory::MultiRetrieval, 4).is_ok());
        assert!(check_arity(GoalCategory::MultiRetrieval, 0).is_err());
    }
}
