//! Three-component vectors and floating-point tolerance helpers.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Tolerance used by every geometric comparison in the workspace.
pub const EPSILON: f64 = 1e-4;

/// `a <= b` within [`EPSILON`].
pub fn approx_le(a: f64, b: f64) -> bool {
    a <= b + EPSILON
}

/// `|a - b| <= EPSILON`.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// A point or extent in scene space. `y` is up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// Lateral axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// Depth axis.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Construct from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Uniform vector with every component set to `v`.
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Component-wise product.
    pub fn scale_by(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Distance measured on the floor plane, ignoring `y`.
    pub fn distance_xz(self, other: Vec3) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Whether every component matches `other` within [`EPSILON`].
    pub fn approx_eq(self, other: Vec3) -> bool {
        approx_eq(self.x, other.x) && approx_eq(self.y, other.y) && approx_eq(self.z, other.z)
    }

    /// Rotate the `x`/`z` components about the vertical axis by
    /// `degrees`, clockwise when viewed from above.
    pub fn rotate_y(self, degrees: f64) -> Vec3 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Vec3::new(
            self.x * cos + self.z * sin,
            self.y,
            -self.x * sin + self.z * cos,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_quarter_turn_swaps_axes() {
        let v = Vec3::new(1.0, 2.0, 0.0).rotate_y(90.0);
        assert!(v.approx_eq(Vec3::new(0.0, 2.0, -1.0)));
    }

    #[test]
    fn floor_distance_ignores_height() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(3.0, 0.0, 4.0);
        assert!(approx_eq(a.distance_xz(b), 5.0));
    }

    #[test]
    fn approx_le_tolerates_epsilon() {
        assert!(approx_le(1.00005, 1.0));
        assert!(!approx_le(1.001, 1.0));
    }
}
