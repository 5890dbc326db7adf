//! Constraint sampler: the per-attempt RNG plus bounded rejection
//! sampling.
//!
//! Every random decision of an attempt flows through one [`Sampler`], so
//! an attempt seed fully determines the scene it produces.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scenegen_core::{GenerationError, Numeric, OneOf, Randomizable};

/// Rotations used when a declaration leaves rotation unset, in degrees.
pub const VALID_ROTATIONS: [f64; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];

/// Seeded RNG with a per-placement retry budget.
#[derive(Clone, Debug)]
pub struct Sampler {
    rng: ChaCha8Rng,
    tries: u32,
    drawn: u64,
}

impl Sampler {
    /// Sampler seeded from `seed` allowing `tries` candidates per
    /// placement.
    pub fn new(seed: u64, tries: u32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tries: tries.max(1),
            drawn: 0,
        }
    }

    /// Candidates allowed per [`retry`](Self::retry).
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Total candidates drawn through [`retry`](Self::retry) so far.
    pub fn candidates_drawn(&self) -> u64 {
        self.drawn
    }

    /// The underlying RNG.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Draw a numeric property.
    pub fn sample<T: Numeric>(&mut self, value: &Randomizable<T>) -> Result<T, GenerationError> {
        Ok(value.sample(&mut self.rng)?)
    }

    /// Draw an optional numeric property, falling back to `default`.
    pub fn sample_or<T: Numeric>(
        &mut self,
        value: Option<&Randomizable<T>>,
        default: &Randomizable<T>,
    ) -> Result<T, GenerationError> {
        self.sample(value.unwrap_or(default))
    }

    /// Draw a discrete property.
    pub fn choose<T: Clone>(&mut self, value: &OneOf<T>) -> Result<T, GenerationError> {
        Ok(value.sample(&mut self.rng)?)
    }

    /// Uniformly pick one element of a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Uniform float in `[lo, hi]`; `lo` when the range is empty.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            lo
        } else {
            self.rng.random_range(lo..=hi)
        }
    }

    /// Uniform integer in `[lo, hi]`; `lo` when the range is empty.
    pub fn int(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            lo
        } else {
            self.rng.random_range(lo..=hi)
        }
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    /// A rotation from [`VALID_ROTATIONS`].
    pub fn rotation(&mut self) -> f64 {
        VALID_ROTATIONS[self.rng.random_range(0..VALID_ROTATIONS.len())]
    }

    /// Rejection sampling: call `candidate` until it yields a value or
    /// the budget runs out.
    ///
    /// # Errors
    ///
    /// [`GenerationError::PlacementExhausted`] naming `what` when every
    /// candidate is rejected.
    pub fn retry<T>(
        &mut self,
        what: &str,
        mut candidate: impl FnMut(&mut Self) -> Option<T>,
    ) -> Result<T, GenerationError> {
        for attempt in 0..self.tries {
            self.drawn += 1;
            if let Some(v) = candidate(self) {
                return Ok(v);
            }
            tracing::trace!(what, attempt, "candidate rejected");
        }
        Err(GenerationError::PlacementExhausted {
            what: what.to_owned(),
            tries: self.tries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_draws() {
        let mut a = Sampler::new(7, 10);
        let mut b = Sampler::new(7, 10);
        let r = Randomizable::range(0.0, 100.0);
        for _ in 0..20 {
            assert_eq!(a.sample(&r).unwrap(), b.sample(&r).unwrap());
        }
    }

    #[test]
    fn retry_returns_first_accepted_candidate() {
        let mut s = Sampler::new(1, 50);
        let mut calls = 0;
        let v = s
            .retry("thing", |_| {
                calls += 1;
                (calls == 3).then_some(calls)
            })
            .unwrap();
        assert_eq!(v, 3);
        assert_eq!(s.candidates_drawn(), 3);
    }

    #[test]
    fn retry_is_bounded() {
        let mut s = Sampler::new(1, 5);
        let err = s.retry("lava pool", |_| None::<()>).unwrap_err();
        assert_eq!(
            err,
            GenerationError::PlacementExhausted {
                what: "lava pool".into(),
                tries: 5
            }
        );
        assert_eq!(s.candidates_drawn(), 5);
    }

    #[test]
    fn zero_budget_still_draws_once() {
        let mut s = Sampler::new(1, 0);
        assert_eq!(s.tries(), 1);
        assert_eq!(s.retry("x", |_| Some(1)).unwrap(), 1);
    }

    #[test]
    fn rotations_are_valid() {
        let mut s = Sampler::new(3, 1);
        for _ in 0..50 {
            assert!(VALID_ROTATIONS.contains(&s.rotation()));
        }
    }
}
