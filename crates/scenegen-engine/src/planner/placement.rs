//! Placement helpers shared by every phase: appearance resolution, free
//! floor sampling, and the keyword locations.

use super::{PhaseContext, SharedValue, MIN_GAP, PERFORMER_HALF_WIDTH};
use crate::catalog::{self, ShapeCategory};
use crate::config::{KeywordLocation, KeywordLocationConfig, SharedObjectConfig};
use crate::sampler::Sampler;
use crate::scene::{DeclarationKey, ObjectInstance, ObjectKind};
use scenegen_core::{
    GenerationError, MinMax, ObjectId, OneOf, PartialVec3, Randomizable, ScaleConfig, Vec3,
    VectorRandomizable,
};
use scenegen_space::ObjectBounds;

/// Half-angle of the cone used by the `front` and `back` locations.
const VIEW_CONE_DEGREES: f64 = 30.0;

/// Largest fraction of a container's interior an object may fill.
const CONTAINER_FILL: f64 = 0.9;

/// Floor position and facing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Pose {
    pub position: Vec3,
    pub rotation_y: f64,
}

/// Resolved look of an object before it is positioned.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Appearance {
    pub shape: String,
    pub category: ShapeCategory,
    pub scale: Vec3,
    pub dimensions: Vec3,
    pub material: Option<String>,
}

impl Appearance {
    /// Unpositioned instance of this appearance.
    pub fn instance(&self, kind: ObjectKind, key: &DeclarationKey) -> ObjectInstance {
        let obj = ObjectInstance::new(ObjectId(0), kind, self.shape.clone(), key.clone())
            .sized(self.scale, self.dimensions);
        match &self.material {
            Some(m) => obj.with_material(m.clone()),
            None => obj,
        }
    }

    /// Largest horizontal half-extent.
    pub fn radius(&self) -> f64 {
        self.dimensions.x.max(self.dimensions.z) / 2.0
    }
}

/// Default role for a shape category.
pub(crate) fn kind_for(category: ShapeCategory) -> ObjectKind {
    match category {
        ShapeCategory::Pickupable => ObjectKind::Interactable,
        ShapeCategory::Container => ObjectKind::Container,
        ShapeCategory::Obstacle => ObjectKind::Obstacle,
        ShapeCategory::Occluder => ObjectKind::Occluder,
        ShapeCategory::Context => ObjectKind::Context,
        ShapeCategory::Agent => ObjectKind::Agent,
    }
}

/// What to look like, before sampling.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Look<'c> {
    pub shape: Option<&'c OneOf<String>>,
    pub scale: Option<&'c ScaleConfig>,
    pub material: Option<&'c OneOf<String>>,
    pub shared: Option<&'c SharedObjectConfig>,
}

/// Where to stand, before sampling.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FloorRequest<'c> {
    pub what: &'c str,
    pub dimensions: Vec3,
    pub position: Option<&'c VectorRandomizable>,
    pub rotation: Option<&'c Randomizable<f64>>,
    pub distance_from_performer: Option<&'c MinMax<f64>>,
}

/// Pose plus the relations a keyword location establishes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Located {
    pub pose: Pose,
    pub contained_in: Option<ObjectId>,
    pub associated_with: Option<ObjectId>,
}

impl From<Pose> for Located {
    fn from(pose: Pose) -> Self {
        Self {
            pose,
            contained_in: None,
            associated_with: None,
        }
    }
}

fn draw_shape(
    sampler: &mut Sampler,
    options: &OneOf<String>,
    excluded: &[String],
) -> Result<String, GenerationError> {
    sampler.retry("a shape that is not excluded", |s| {
        s.choose(options).ok().filter(|n| !excluded.contains(n))
    })
}

fn within_distance(start: Vec3, p: Vec3, limit: Option<&MinMax<f64>>) -> bool {
    limit.is_none_or(|d| {
        let dist = start.distance_xz(p);
        dist >= d.min && dist <= d.max
    })
}

impl PhaseContext<'_> {
    /// Resolve shape, scale and material. `fallback` is the category drawn
    /// from when no shape is configured.
    pub(crate) fn appearance(
        &mut self,
        key: &DeclarationKey,
        look: Look<'_>,
        fallback: ShapeCategory,
    ) -> Result<Appearance, GenerationError> {
        let config = self.config;
        let excluded = &config.excluded_shapes;

        let shared_shape = look.shared.and_then(|s| s.shape.as_ref());
        let configured = shared_shape.or(look.shape);
        let shape = match configured {
            Some(options) => self.decide(
                key,
                "shape",
                shared_shape.is_some(),
                |s| draw_shape(s, options, excluded),
                SharedValue::Shape,
                |v| match v {
                    SharedValue::Shape(s) => Some(s.clone()),
                    _ => None,
                },
            )?,
            None => {
                let candidates = catalog::shapes_in(fallback, excluded);
                self.sampler
                    .pick(&candidates)
                    .map(|d| d.name.to_owned())
                    .ok_or_else(|| {
                        GenerationError::config(
                            key.to_string(),
                            format!("every {fallback:?} shape is excluded"),
                        )
                    })?
            }
        };
        let def = catalog::lookup(&shape).ok_or_else(|| {
            GenerationError::config(key.to_string(), format!("unknown shape `{shape}`"))
        })?;

        let shared_scale = look.shared.and_then(|s| s.scale.as_ref());
        let scale = match shared_scale.or(look.scale) {
            Some(cfg) => self.decide(
                key,
                "scale",
                shared_scale.is_some(),
                |s| Ok(cfg.sample(s.rng())?),
                SharedValue::Scale,
                |v| match v {
                    SharedValue::Scale(s) => Some(*s),
                    _ => None,
                },
            )?,
            None => Vec3::splat(1.0),
        };

        let shared_material = look.shared.and_then(|s| s.material.as_ref());
        let material = match shared_material.or(look.material) {
            Some(options) => Some(self.decide(
                key,
                "material",
                shared_material.is_some(),
                |s| s.choose(options),
                SharedValue::Material,
                |v| match v {
                    SharedValue::Material(m) => Some(m.clone()),
                    _ => None,
                },
            )?),
            None => self.sampler.pick(def.materials).map(|m| (*m).to_owned()),
        };

        Ok(Appearance {
            shape,
            category: def.category,
            scale,
            dimensions: def.dimensions.scale_by(scale),
            material,
        })
    }

    /// Rotation from configuration, a shared decision, or
    /// [`VALID_ROTATIONS`](crate::sampler::VALID_ROTATIONS).
    pub(crate) fn rotation(
        &mut self,
        key: &DeclarationKey,
        rotation: Option<&Randomizable<f64>>,
        shared: Option<&SharedObjectConfig>,
    ) -> Result<f64, GenerationError> {
        let shared_rot = shared.and_then(|s| s.rotation_y.as_ref());
        match shared_rot.or(rotation) {
            Some(r) => self.decide(
                key,
                "rotation_y",
                shared_rot.is_some(),
                |s| s.sample(r),
                SharedValue::Rotation,
                |v| match v {
                    SharedValue::Rotation(r) => Some(*r),
                    _ => None,
                },
            ),
            None => Ok(self.sampler.rotation()),
        }
    }

    /// Rejection-sample a free floor pose.
    pub(crate) fn floor_pose(&mut self, req: &FloorRequest<'_>) -> Result<Pose, GenerationError> {
        let index = &self.index;
        let room = *index.room();
        let start = self.room.performer.position;
        self.sampler.retry(req.what, |s| {
            let fixed = match req.position {
                Some(p) => p.sample(s.rng()).ok()?,
                None => PartialVec3::default(),
            };
            let rotation_y = match req.rotation {
                Some(r) => s.sample(r).ok()?,
                None => s.rotation(),
            };
            let (lx, hx, lz, hz) = ObjectBounds::new(Vec3::ZERO, req.dimensions, rotation_y).extents();
            let x = match fixed.x {
                Some(x) => x,
                None => s.uniform(-room.half_x() - lx, room.half_x() - hx),
            };
            let z = match fixed.z {
                Some(z) => z,
                None => s.uniform(-room.half_z() - lz, room.half_z() - hz),
            };
            let position = Vec3::new(x, fixed.y.unwrap_or(0.0), z);
            if !within_distance(start, position, req.distance_from_performer) {
                return None;
            }
            let bounds = ObjectBounds::new(position, req.dimensions, rotation_y);
            index.collision(&bounds, &[]).is_none().then_some(Pose {
                position,
                rotation_y,
            })
        })
    }

    /// Rejection-sample a pose satisfying a keyword location.
    pub(crate) fn located_pose(
        &mut self,
        req: &FloorRequest<'_>,
        location: &KeywordLocationConfig,
    ) -> Result<Located, GenerationError> {
        let relative = match &location.relative_object_label {
            Some(label) if location.keyword.needs_relative_object() => {
                let id = self.resolve_one(label)?;
                Some(self.require(id)?.clone())
            }
            _ => None,
        };
        if location.keyword.needs_relative_object() && relative.is_none() {
            return Err(GenerationError::config(
                req.what,
                format!("{:?} location needs relative_object_label", location.keyword),
            ));
        }
        let gap = match &location.distance {
            Some(d) => Some(self.sampler.sample(d)?),
            None => None,
        };

        let index = &self.index;
        let room = *index.room();
        let performer = self.room.performer;
        let dims = req.dimensions;
        let radius = dims.x.max(dims.z) / 2.0;
        let free = |pose: &Pose, ignore: &[ObjectId]| {
            within_distance(performer.position, pose.position, req.distance_from_performer)
                && index
                    .collision(&ObjectBounds::new(pose.position, dims, pose.rotation_y), ignore)
                    .is_none()
        };
        let what = req.what;

        match location.keyword {
            KeywordLocation::Random => self.floor_pose(req).map(Located::from),
            KeywordLocation::Front | KeywordLocation::Back => {
                let flip = if location.keyword == KeywordLocation::Back { 180.0 } else { 0.0 };
                let far = room.diagonal() / 2.0;
                self.sampler.retry(what, |s| {
                    let angle = performer.rotation_y
                        + flip
                        + s.uniform(-VIEW_CONE_DEGREES, VIEW_CONE_DEGREES);
                    let near = PERFORMER_HALF_WIDTH + MIN_GAP + radius;
                    let d = gap.map_or_else(|| s.uniform(near, far), |g| near + g);
                    let (sin, cos) = angle.to_radians().sin_cos();
                    let pose = Pose {
                        position: Vec3::new(
                            performer.position.x + sin * d,
                            0.0,
                            performer.position.z + cos * d,
                        ),
                        rotation_y: pick_rotation(s, req.rotation)?,
                    };
                    free(&pose, &[]).then_some(pose.into())
                })
            }
            KeywordLocation::AdjacentPerformer => self.sampler.retry(what, |s| {
                let d = PERFORMER_HALF_WIDTH + MIN_GAP + radius + gap.unwrap_or_else(|| s.uniform(0.0, 0.5));
                let (sin, cos) = s.uniform(0.0, 360.0).to_radians().sin_cos();
                let pose = Pose {
                    position: Vec3::new(
                        performer.position.x + sin * d,
                        0.0,
                        performer.position.z + cos * d,
                    ),
                    rotation_y: pick_rotation(s, req.rotation)?,
                };
                free(&pose, &[]).then_some(pose.into())
            }),
            KeywordLocation::Between => {
                let Some(r) = relative else {
                    return Err(missing_relative(what));
                };
                self.sampler.retry(what, |s| {
                    let t = s.uniform(0.2, 0.8);
                    let p = performer.position;
                    let q = r.position;
                    let pose = Pose {
                        position: Vec3::new(p.x + (q.x - p.x) * t, 0.0, p.z + (q.z - p.z) * t),
                        rotation_y: pick_rotation(s, req.rotation)?,
                    };
                    free(&pose, &[]).then_some(pose.into())
                })
            }
            KeywordLocation::Behind => {
                let Some(r) = relative else {
                    return Err(missing_relative(what));
                };
                let dx = r.position.x - performer.position.x;
                let dz = r.position.z - performer.position.z;
                let len = (dx * dx + dz * dz).sqrt().max(f64::EPSILON);
                let r_radius = r.dimensions.x.max(r.dimensions.z) / 2.0;
                self.sampler.retry(what, |s| {
                    let d = r_radius + radius + MIN_GAP + gap.unwrap_or_else(|| s.uniform(0.0, 0.5));
                    let pose = Pose {
                        position: Vec3::new(
                            r.position.x + dx / len * d,
                            0.0,
                            r.position.z + dz / len * d,
                        ),
                        rotation_y: pick_rotation(s, req.rotation)?,
                    };
                    free(&pose, &[]).then_some(pose.into())
                })
            }
            KeywordLocation::Adjacent | KeywordLocation::AssociatedWithAgent => {
                let Some(r) = relative else {
                    return Err(missing_relative(what));
                };
                if location.keyword == KeywordLocation::AssociatedWithAgent
                    && r.kind != ObjectKind::Agent
                {
                    return Err(GenerationError::config(
                        what,
                        format!("associated_with_agent target {} is not an agent", r.id),
                    ));
                }
                let r_radius = r.dimensions.x.max(r.dimensions.z) / 2.0;
                let associated = (location.keyword == KeywordLocation::AssociatedWithAgent)
                    .then_some(r.id);
                self.sampler.retry(what, |s| {
                    let d = r_radius + radius + MIN_GAP + gap.unwrap_or(0.0);
                    let candidates = index.adjacent_offsets(Vec3::new(r.position.x, 0.0, r.position.z), &[d]);
                    let position = *s.pick(&candidates)?;
                    let pose = Pose {
                        position,
                        rotation_y: pick_rotation(s, req.rotation)?,
                    };
                    free(&pose, &[]).then_some(Located {
                        pose,
                        contained_in: None,
                        associated_with: associated,
                    })
                })
            }
            KeywordLocation::In => {
                let Some(r) = relative else {
                    return Err(missing_relative(what));
                };
                if r.kind != ObjectKind::Container {
                    return Err(GenerationError::config(
                        what,
                        format!("`in` target {} is not a container", r.id),
                    ));
                }
                let limit = r.dimensions * CONTAINER_FILL;
                if dims.x > limit.x || dims.y > limit.y || dims.z > limit.z {
                    return Err(GenerationError::PlacementExhausted {
                        what: format!("{what} inside {}", r.id),
                        tries: 0,
                    });
                }
                Ok(Located {
                    pose: Pose {
                        position: Vec3::new(r.position.x, r.position.y, r.position.z),
                        rotation_y: r.rotation_y,
                    },
                    contained_in: Some(r.id),
                    associated_with: None,
                })
            }
            KeywordLocation::OnTop => {
                let Some(r) = relative else {
                    return Err(missing_relative(what));
                };
                let top = r.position.y + r.dimensions.y;
                let slack_x = ((r.dimensions.x - dims.x) / 2.0).max(0.0);
                let slack_z = ((r.dimensions.z - dims.z) / 2.0).max(0.0);
                self.sampler.retry(what, |s| {
                    let local = Vec3::new(s.uniform(-slack_x, slack_x), 0.0, s.uniform(-slack_z, slack_z))
                        .rotate_y(r.rotation_y);
                    let pose = Pose {
                        position: Vec3::new(r.position.x + local.x, top, r.position.z + local.z),
                        rotation_y: r.rotation_y,
                    };
                    free(&pose, &[]).then_some(pose.into())
                })
            }
            KeywordLocation::OppositeX | KeywordLocation::OppositeZ => {
                let Some(r) = relative else {
                    return Err(missing_relative(what));
                };
                let mirror = |p: Vec3| match location.keyword {
                    KeywordLocation::OppositeX => Vec3::new(-p.x, 0.0, p.z),
                    _ => Vec3::new(p.x, 0.0, -p.z),
                };
                let mut first = true;
                self.sampler.retry(what, |s| {
                    let mut position = mirror(r.position);
                    if !first {
                        position.x += s.uniform(-0.5, 0.5);
                        position.z += s.uniform(-0.5, 0.5);
                    }
                    first = false;
                    let pose = Pose {
                        position,
                        rotation_y: pick_rotation(s, req.rotation)?,
                    };
                    free(&pose, &[]).then_some(pose.into())
                })
            }
        }
    }
}

fn pick_rotation(s: &mut Sampler, rotation: Option<&Randomizable<f64>>) -> Option<f64> {
    match rotation {
        Some(r) => s.sample(r).ok(),
        None => Some(s.rotation()),
    }
}

fn missing_relative(what: &str) -> GenerationError {
    GenerationError::config(what, "relative object missing")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_roles() {
        assert_eq!(kind_for(ShapeCategory::Pickupable), ObjectKind::Interactable);
        assert_eq!(kind_for(ShapeCategory::Agent), ObjectKind::Agent);
        assert!(kind_for(ShapeCategory::Obstacle).blocks_navigation());
    }

    #[test]
    fn distance_limit_is_inclusive() {
        let limit = MinMax { min: 1.0, max: 2.0 };
        let start = Vec3::ZERO;
        assert!(within_distance(start, Vec3::new(1.0, 0.0, 0.0), Some(&limit)));
        assert!(within_distance(start, Vec3::new(0.0, 0.0, 2.0), Some(&limit)));
        assert!(!within_distance(start, Vec3::new(0.5, 0.0, 0.0), Some(&limit)));
        assert!(within_distance(start, Vec3::new(50.0, 0.0, 0.0), None));
    }

    #[test]
    fn excluded_shapes_are_never_drawn() {
        let mut s = Sampler::new(4, 50);
        let options = OneOf::List(vec!["ball".to_owned(), "trophy".to_owned()]);
        let excluded = vec!["ball".to_owned()];
        for _ in 0..20 {
            assert_eq!(draw_shape(&mut s, &options, &excluded).unwrap(), "trophy");
        }
    }
}
