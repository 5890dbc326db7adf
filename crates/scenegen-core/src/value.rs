//! Randomizable configuration values.
//!
//! Scenario configurations describe most properties as either a fixed
//! value, an inclusive `{min, max}` range, a list of alternatives, or a
//! weighted choice. These types deserialize every accepted shape and
//! draw concrete values from a caller-supplied RNG.
//!
//! Numeric values use [`Randomizable`]; discrete values (shape names,
//! materials, flags) use [`OneOf`].

use crate::vector::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from sampling or validating a randomizable value.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValueError {
    /// A `{min, max}` range with `min > max`.
    #[error("range minimum {min} exceeds maximum {max}")]
    InvertedRange {
        /// Rendered minimum.
        min: String,
        /// Rendered maximum.
        max: String,
    },
    /// A list or weighted choice with no options.
    #[error("choice list is empty")]
    EmptyChoice,
    /// Weighted choice whose weights are malformed.
    #[error("invalid weights: {reason}")]
    InvalidWeights {
        /// What is wrong with the weights.
        reason: String,
    },
}

/// Numeric types that can be drawn uniformly from an inclusive range.
pub trait Numeric: Copy + PartialOrd + fmt::Display {
    /// Draw uniformly from `[lo, hi]`. Callers guarantee `lo <= hi`.
    fn between<R: Rng + ?Sized>(lo: Self, hi: Self, rng: &mut R) -> Self;
}

impl Numeric for u32 {
    fn between<R: Rng + ?Sized>(lo: Self, hi: Self, rng: &mut R) -> Self {
        rng.random_range(lo..=hi)
    }
}

impl Numeric for i32 {
    fn between<R: Rng + ?Sized>(lo: Self, hi: Self, rng: &mut R) -> Self {
        rng.random_range(lo..=hi)
    }
}

impl Numeric for f64 {
    fn between<R: Rng + ?Sized>(lo: Self, hi: Self, rng: &mut R) -> Self {
        if lo == hi {
            lo
        } else {
            rng.random_range(lo..=hi)
        }
    }
}

/// Inclusive `{min, max}` range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinMax<T> {
    /// Lower bound (inclusive).
    pub min: T,
    /// Upper bound (inclusive).
    pub max: T,
}

impl<T: Numeric> MinMax<T> {
    fn validate(&self) -> Result<(), ValueError> {
        if self.min > self.max {
            return Err(ValueError::InvertedRange {
                min: self.min.to_string(),
                max: self.max.to_string(),
            });
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<T, ValueError> {
        self.validate()?;
        Ok(T::between(self.min, self.max, rng))
    }
}

/// One element of a numeric list: either a value or a range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericChoice<T> {
    /// A single value.
    Fixed(T),
    /// A range drawn uniformly.
    Range(MinMax<T>),
}

impl<T: Numeric> NumericChoice<T> {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<T, ValueError> {
        match self {
            Self::Fixed(v) => Ok(*v),
            Self::Range(r) => r.sample(rng),
        }
    }

    fn bounds(&self) -> (T, T) {
        match self {
            Self::Fixed(v) => (*v, *v),
            Self::Range(r) => (r.min, r.max),
        }
    }
}

/// A numeric property: fixed, ranged, or a list of alternatives.
///
/// List elements are equally likely; repeating an element weights it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Randomizable<T> {
    /// Always this value.
    Fixed(T),
    /// Uniform over an inclusive range.
    Range(MinMax<T>),
    /// One element chosen uniformly, then sampled.
    List(Vec<NumericChoice<T>>),
}

impl<T: Numeric> Randomizable<T> {
    /// Shorthand for an inclusive range.
    pub fn range(min: T, max: T) -> Self {
        Self::Range(MinMax { min, max })
    }

    /// Draw a concrete value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<T, ValueError> {
        match self {
            Self::Fixed(v) => Ok(*v),
            Self::Range(r) => r.sample(rng),
            Self::List(items) => {
                if items.is_empty() {
                    return Err(ValueError::EmptyChoice);
                }
                let idx = rng.random_range(0..items.len());
                items[idx].sample(rng)
            }
        }
    }

    /// Check ranges are ordered and lists are non-empty.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            Self::Fixed(_) => Ok(()),
            Self::Range(r) => r.validate(),
            Self::List(items) => {
                if items.is_empty() {
                    return Err(ValueError::EmptyChoice);
                }
                for item in items {
                    if let NumericChoice::Range(r) = item {
                        r.validate()?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Smallest and largest value this property can produce.
    pub fn bounds(&self) -> Option<(T, T)> {
        match self {
            Self::Fixed(v) => Some((*v, *v)),
            Self::Range(r) => Some((r.min, r.max)),
            Self::List(items) => items.iter().map(NumericChoice::bounds).fold(None, |acc, (lo, hi)| {
                Some(match acc {
                    None => (lo, hi),
                    Some((alo, ahi)) => (
                        if lo < alo { lo } else { alo },
                        if hi > ahi { hi } else { ahi },
                    ),
                })
            }),
        }
    }
}

impl<T> From<T> for Randomizable<T> {
    fn from(v: T) -> Self {
        Self::Fixed(v)
    }
}

/// Weighted discrete choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Weighted<T> {
    /// Alternatives.
    pub options: Vec<T>,
    /// Relative weight of each alternative.
    pub weights: Vec<f64>,
}

/// A discrete property: fixed, a uniform list, or a weighted choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOf<T> {
    /// Always this value.
    Fixed(T),
    /// One element chosen uniformly. Duplicates weight.
    List(Vec<T>),
    /// One element chosen by relative weight.
    Weighted(Weighted<T>),
}

impl<T: Clone> OneOf<T> {
    /// Draw a concrete value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<T, ValueError> {
        self.validate()?;
        match self {
            Self::Fixed(v) => Ok(v.clone()),
            Self::List(items) => Ok(items[rng.random_range(0..items.len())].clone()),
            Self::Weighted(w) => {
                let total: f64 = w.weights.iter().sum();
                let mut roll = rng.random::<f64>() * total;
                for (option, weight) in w.options.iter().zip(&w.weights) {
                    if roll < *weight {
                        return Ok(option.clone());
                    }
                    roll -= weight;
                }
                // Floating-point residue lands on the last option.
                w.options.last().cloned().ok_or(ValueError::EmptyChoice)
            }
        }
    }

    /// Check lists are non-empty and weights are well-formed.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            Self::Fixed(_) => Ok(()),
            Self::List(items) if items.is_empty() => Err(ValueError::EmptyChoice),
            Self::List(_) => Ok(()),
            Self::Weighted(w) => {
                if w.options.is_empty() {
                    return Err(ValueError::EmptyChoice);
                }
                if w.options.len() != w.weights.len() {
                    return Err(ValueError::InvalidWeights {
                        reason: format!(
                            "{} options but {} weights",
                            w.options.len(),
                            w.weights.len()
                        ),
                    });
                }
                if w.weights.iter().any(|x| !x.is_finite() || *x < 0.0) {
                    return Err(ValueError::InvalidWeights {
                        reason: "weights must be finite and non-negative".into(),
                    });
                }
                if w.weights.iter().sum::<f64>() <= 0.0 {
                    return Err(ValueError::InvalidWeights {
                        reason: "weights sum to zero".into(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Every value this property can produce, in declaration order.
    pub fn options(&self) -> Vec<T> {
        match self {
            Self::Fixed(v) => vec![v.clone()],
            Self::List(items) => items.clone(),
            Self::Weighted(w) => w.options.clone(),
        }
    }
}

impl<T> From<T> for OneOf<T> {
    fn from(v: T) -> Self {
        Self::Fixed(v)
    }
}

/// A vector whose components are independently randomizable.
///
/// Components left unset are filled by the caller, usually with a
/// position sampled from free floor space.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorRandomizable {
    /// Lateral component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Randomizable<f64>>,
    /// Vertical component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Randomizable<f64>>,
    /// Depth component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Randomizable<f64>>,
}

impl VectorRandomizable {
    /// Fully specified fixed vector.
    pub fn fixed(v: Vec3) -> Self {
        Self {
            x: Some(v.x.into()),
            y: Some(v.y.into()),
            z: Some(v.z.into()),
        }
    }

    /// Draw each configured component.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PartialVec3, ValueError> {
        let pick = |c: &Option<Randomizable<f64>>, rng: &mut R| -> Result<Option<f64>, ValueError> {
            c.as_ref().map(|r| r.sample(rng)).transpose()
        };
        Ok(PartialVec3 {
            x: pick(&self.x, rng)?,
            y: pick(&self.y, rng)?,
            z: pick(&self.z, rng)?,
        })
    }

    /// Validate every configured component.
    pub fn validate(&self) -> Result<(), ValueError> {
        for c in [&self.x, &self.y, &self.z].into_iter().flatten() {
            c.validate()?;
        }
        Ok(())
    }
}

/// A sampled vector with possibly-missing components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PartialVec3 {
    /// Lateral component, if configured.
    pub x: Option<f64>,
    /// Vertical component, if configured.
    pub y: Option<f64>,
    /// Depth component, if configured.
    pub z: Option<f64>,
}

impl PartialVec3 {
    /// Whether both floor components were configured.
    pub fn has_floor_position(&self) -> bool {
        self.x.is_some() && self.z.is_some()
    }

    /// Fill unset components from `fallback`.
    pub fn fill(self, fallback: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(fallback.x),
            self.y.unwrap_or(fallback.y),
            self.z.unwrap_or(fallback.z),
        )
    }
}

/// Object scale: a uniform factor or a per-axis vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleConfig {
    /// Same factor on every axis.
    Uniform(Randomizable<f64>),
    /// Independent factor per axis; unset axes default to 1.
    Vector(VectorRandomizable),
}

impl ScaleConfig {
    /// Draw a concrete scale vector.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec3, ValueError> {
        match self {
            Self::Uniform(r) => Ok(Vec3::splat(r.sample(rng)?)),
            Self::Vector(v) => Ok(v.sample(rng)?.fill(Vec3::splat(1.0))),
        }
    }

    /// Validate the underlying values.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            Self::Uniform(r) => r.validate(),
            Self::Vector(v) => v.validate(),
        }
    }
}
