// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Small math layer on top of `glam`
//!
//! All simulation math is double precision. `glam` supplies the vector and
//! matrix types; this module adds the rigid transform and the handful of 2D
//! helpers the collision pipeline leans on (scalar cross products, segment
//! projections, line intersection).

pub use glam::{DMat2, DVec2};

/// Tolerance used for "is this effectively zero" checks on lengths and dot products
pub const EPSILON: f64 = 1e-10;

/// Rigid 2D transform: translation followed by a rotation about the origin
///
/// # Examples
///
/// ```
/// use physics2d::math::{DVec2, Transform};
///
/// let tf = Transform::new(DVec2::new(1.0, 0.0), std::f64::consts::FRAC_PI_2);
/// let world = tf.apply(DVec2::new(1.0, 0.0));
/// assert!((world - DVec2::new(1.0, 1.0)).length() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World-space translation
    pub position: DVec2,
    /// Rotation angle in radians (counter-clockwise)
    pub rotation: f64,
}

impl Transform {
    /// Create a transform from a position and an angle
    pub fn new(position: DVec2, rotation: f64) -> Self {
        Transform { position, rotation }
    }

    /// Identity transform
    pub fn identity() -> Self {
        Transform::new(DVec2::ZERO, 0.0)
    }

    /// Pure translation
    pub fn from_position(position: DVec2) -> Self {
        Transform::new(position, 0.0)
    }

    /// Rotate a local vector into world orientation (no translation)
    #[inline]
    pub fn rotate(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(self.rotation).rotate(v)
    }

    /// Rotate a world vector into local orientation (no translation)
    #[inline]
    pub fn inverse_rotate(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(-self.rotation).rotate(v)
    }

    /// Map a local point to world space
    #[inline]
    pub fn apply(&self, local: DVec2) -> DVec2 {
        self.position + self.rotate(local)
    }

    /// Map a world point to local space
    #[inline]
    pub fn inverse_apply(&self, world: DVec2) -> DVec2 {
        self.inverse_rotate(world - self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`
#[inline]
pub fn cross(a: DVec2, b: DVec2) -> f64 {
    a.perp_dot(b)
}

/// Cross product of a scalar (angular velocity) with a vector: `w × r`
#[inline]
pub fn cross_scalar(w: f64, r: DVec2) -> DVec2 {
    DVec2::new(-w * r.y, w * r.x)
}

/// Vector triple product `(a × b) × c`, which in 2D equals `b (a·c) - a (b·c)`
///
/// With `a = ab`, `b = ao`, `c = ab` this yields the perpendicular of `ab`
/// pointing toward `ao`.
#[inline]
pub fn triple_product(a: DVec2, b: DVec2, c: DVec2) -> DVec2 {
    b * a.dot(c) - a * b.dot(c)
}

/// Reciprocal that maps zero (or denormal-small) denominators to zero
#[inline]
pub fn recip_or_zero(value: f64) -> f64 {
    if value.abs() > EPSILON {
        1.0 / value
    } else {
        0.0
    }
}

/// Whether two points coincide within `EPSILON`
#[inline]
pub fn fuzzy_eq(a: DVec2, b: DVec2) -> bool {
    (a - b).length_squared() < EPSILON * EPSILON
}

/// Closest point to `p` on segment `[a, b]`, plus the clamped parameter `t`
pub fn closest_point_on_segment(a: DVec2, b: DVec2, p: DVec2) -> (DVec2, f64) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Intersection of the infinite lines through `(p1, p2)` and `(q1, q2)`
///
/// Returns `None` for parallel lines.
pub fn line_intersection(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> Option<DVec2> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = cross(r, s);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = cross(q1 - p1, s) / denom;
    Some(p1 + r * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_transform_round_trip() {
        let tf = Transform::new(DVec2::new(3.0, -2.0), 0.7);
        let local = DVec2::new(0.25, 1.5);
        let back = tf.inverse_apply(tf.apply(local));
        assert_abs_diff_eq!(back.x, local.x, epsilon = 1e-12);
        assert_abs_diff_eq!(back.y, local.y, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let tf = Transform::new(DVec2::ZERO, FRAC_PI_2);
        let v = tf.rotate(DVec2::X);
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_triple_product_points_toward_origin() {
        let a = DVec2::new(-1.0, 1.0);
        let b = DVec2::new(1.0, 1.0);
        let ab = b - a;
        let dir = triple_product(ab, -a, ab);
        assert!(dir.y < 0.0);
        assert_abs_diff_eq!(dir.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_recip_or_zero() {
        assert_eq!(recip_or_zero(0.0), 0.0);
        assert_eq!(recip_or_zero(4.0), 0.25);
    }

    #[test]
    fn test_closest_point_on_segment_clamps() {
        let (p, t) = closest_point_on_segment(DVec2::ZERO, DVec2::X, DVec2::new(2.0, 1.0));
        assert_eq!(p, DVec2::X);
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_line_intersection() {
        let hit = line_intersection(
            DVec2::new(-1.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.5, -1.0),
            DVec2::new(0.5, 1.0),
        )
        .unwrap();
        assert_abs_diff_eq!(hit.x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(hit.y, 0.0, epsilon = 1e-12);

        assert!(line_intersection(DVec2::ZERO, DVec2::X, DVec2::Y, DVec2::new(1.0, 1.0)).is_none());
    }
}
