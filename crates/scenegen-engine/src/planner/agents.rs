//! `AgentPlacement`: simulated agents and their walking routes.

use super::placement::{FloorRequest, Look};
use super::specific::Placement;
use super::PhaseContext;
use crate::catalog::ShapeCategory;
use crate::config::{AgentConfig, AgentMovementConfig, Trigger};
use crate::scene::{DeclarationKey, ObjectKind};
use crate::schedule::EventKind;
use scenegen_core::{GenerationError, Label, ObjectId, OneOf, Randomizable, Vec3, VectorRandomizable};

/// What one agent looks like and where it goes.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AgentRequest<'c> {
    pub shape: Option<&'c OneOf<String>>,
    pub position: Option<&'c VectorRandomizable>,
    pub rotation: Option<&'c Randomizable<f64>>,
    pub movement: Option<&'c AgentMovementConfig>,
}

/// Place one agent and queue its walk.
pub(crate) fn place_agent(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    what: &str,
    req: AgentRequest<'_>,
    labels: &[Label],
) -> Result<ObjectId, GenerationError> {
    let appearance = ctx.appearance(
        key,
        Look {
            shape: req.shape,
            ..Look::default()
        },
        ShapeCategory::Agent,
    )?;
    let Some(movement) = req.movement else {
        return ctx.place(
            key,
            what,
            &appearance,
            ObjectKind::Agent,
            Placement {
                position: req.position,
                rotation: req.rotation,
                ..Placement::default()
            },
            labels,
        );
    };

    let start = ctx.floor_pose(&FloorRequest {
        what,
        dimensions: appearance.dimensions,
        position: req.position,
        rotation: req.rotation,
        distance_from_performer: None,
    })?;
    let points = ctx.sampler.sample(&movement.num_points)?.max(1);
    let mut waypoints = Vec::with_capacity(points as usize);
    for p in 0..points {
        let waypoint = ctx.floor_pose(&FloorRequest {
            what: &format!("{what} waypoint {p}"),
            dimensions: appearance.dimensions,
            position: None,
            rotation: Some(&Randomizable::Fixed(start.rotation_y)),
            distance_from_performer: None,
        })?;
        waypoints.push(waypoint.position);
    }
    let path_length = route_length(start.position, &waypoints);

    let mut obj = appearance
        .instance(ObjectKind::Agent, key)
        .at(start.position, start.rotation_y);
    obj.final_position = waypoints.last().copied();
    let id = ctx.commit(obj, labels);

    let trigger = ctx.trigger(
        Trigger {
            activation_step: Some(&movement.step_begin),
            activate_after: &movement.activate_after,
            activate_on_start_or_after: &[],
        },
        None,
        &movement.step_begin,
    )?;
    ctx.push_event(
        id,
        None,
        EventKind::AgentWalk {
            waypoints,
            path_length,
        },
        trigger,
    );
    Ok(id)
}

/// Total distance walked from `start` through `waypoints`.
fn route_length(start: Vec3, waypoints: &[Vec3]) -> f64 {
    waypoints
        .iter()
        .scan(start, |from, to| {
            let d = from.distance_xz(*to);
            *from = *to;
            Some(d)
        })
        .sum()
}

pub(super) fn agents(
    ctx: &mut PhaseContext<'_>,
    key: &DeclarationKey,
    c: &AgentConfig,
) -> Result<(), GenerationError> {
    let n = ctx.sampler.sample(&c.num)?;
    for i in 0..n {
        let what = format!("{key} agent {i}");
        place_agent(
            ctx,
            key,
            &what,
            AgentRequest {
                shape: c.shape.as_ref(),
                position: c.position.as_ref(),
                rotation: c.rotation_y.as_ref(),
                movement: c.movement.as_ref(),
            },
            &c.labels,
        )?;
    }
    Ok(())
}
