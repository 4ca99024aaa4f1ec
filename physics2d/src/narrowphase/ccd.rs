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
//! Motion queries: linear sweep test and ray cast

use super::{distance, gjk, ShapePrimitive};
use crate::config::NarrowphaseConfig;
use crate::geometry::{Aabb, Shape};
use crate::math::{DVec2, Transform, EPSILON};

/// Samples taken along the motion before bisecting, so thin shapes are not skipped
const SWEEP_SAMPLES: usize = 16;
const BISECTION_STEPS: usize = 24;

/// Radius of the disc standing in for the ray's tip
const RAY_PROBE_RADIUS: f64 = 1e-9;
/// Gap at which the ray counts as having reached the shape
const RAY_HIT_TOLERANCE: f64 = 1e-7;
const RAY_ITERATIONS: usize = 64;

fn swept_aabb(prim: &ShapePrimitive<'_>, motion: DVec2) -> Aabb {
    let start = prim.aabb();
    let end = prim.translated(motion).aabb();
    Aabb::combine(&start, &end)
}

/// Earliest fraction of the motion at which the two shapes touch
///
/// Both shapes translate linearly by their motion over `t` in `[0, 1]`;
/// rotation is not swept. Returns `None` if they never overlap. The answer is
/// the smallest sampled-then-bisected `t` at which GJK reports overlap.
///
/// # Examples
///
/// ```
/// use physics2d::config::NarrowphaseConfig;
/// use physics2d::geometry::Shape;
/// use physics2d::math::{DVec2, Transform};
/// use physics2d::narrowphase::{sweep_test, ShapePrimitive};
///
/// let ball = Shape::circle(0.5);
/// let wall = Shape::rectangle(1.0, 10.0);
/// let a = ShapePrimitive::new(&ball, Transform::identity());
/// let b = ShapePrimitive::new(&wall, Transform::from_position(DVec2::new(5.0, 0.0)));
/// let t = sweep_test(&a, DVec2::new(10.0, 0.0), &b, DVec2::ZERO, &NarrowphaseConfig::default()).unwrap();
/// assert!((t - 0.4).abs() < 1e-4);
/// ```
pub fn sweep_test(
    a: &ShapePrimitive<'_>,
    motion_a: DVec2,
    b: &ShapePrimitive<'_>,
    motion_b: DVec2,
    config: &NarrowphaseConfig,
) -> Option<f64> {
    if !swept_aabb(a, motion_a).collide(&swept_aabb(b, motion_b)) {
        return None;
    }

    let overlaps_at = |t: f64| {
        let pa = a.translated(motion_a * t);
        let pb = b.translated(motion_b * t);
        gjk(&pa, &pb, config).1
    };

    if overlaps_at(0.0) {
        return Some(0.0);
    }

    let mut lo = 0.0;
    let mut hi = None;
    for i in 1..=SWEEP_SAMPLES {
        let t = i as f64 / SWEEP_SAMPLES as f64;
        if overlaps_at(t) {
            hi = Some(t);
            break;
        }
        lo = t;
    }
    let mut hi = hi?;

    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if overlaps_at(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Some(hi)
}

/// Distance along a ray to the first point of a shape
///
/// Conservative advancement: from the current tip, the closest point on the
/// shape defines a plane the whole shape lies behind, so the tip can jump
/// straight to that plane without passing through the shape. Returns
/// `Some(0.0)` when `origin` starts inside and `None` when the ray turns away
/// from the shape or the hit lies beyond `max_distance`.
pub fn ray_cast(
    target: &ShapePrimitive<'_>,
    origin: DVec2,
    direction: DVec2,
    max_distance: f64,
    config: &NarrowphaseConfig,
) -> Option<f64> {
    let dir = direction.normalize_or_zero();
    let probe = Shape::circle(RAY_PROBE_RADIUS);
    let mut travelled = 0.0;

    for _ in 0..RAY_ITERATIONS {
        let tip = ShapePrimitive::new(&probe, Transform::from_position(origin + dir * travelled));
        let result = distance(&tip, target, config);
        if result.overlap || result.distance <= RAY_HIT_TOLERANCE {
            return Some(travelled);
        }
        let toward = (result.point_b - result.point_a) / result.distance;
        let approach = dir.dot(toward);
        if approach <= EPSILON {
            return None;
        }
        travelled += result.distance / approach;
        if travelled > max_distance {
            return None;
        }
    }
    tracing::trace!(travelled, "ray cast ran out of iterations");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use crate::math::Transform;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_head_on_circles() {
        let ball = Shape::circle(1.0);
        let a = ShapePrimitive::new(&ball, Transform::identity());
        let b = ShapePrimitive::new(&ball, Transform::from_position(DVec2::new(10.0, 0.0)));
        let t = sweep_test(&a, DVec2::new(4.0, 0.0), &b, DVec2::new(-4.0, 0.0), &NarrowphaseConfig::default())
            .unwrap();
        // Gap of 8 closed at 8 units per unit time
        assert_abs_diff_eq!(t, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_thin_wall_is_not_tunneled() {
        let bullet = Shape::circle(0.05);
        let wall = Shape::rectangle(0.1, 4.0);
        let a = ShapePrimitive::new(&bullet, Transform::from_position(DVec2::new(-5.0, 0.0)));
        let b = ShapePrimitive::new(&wall, Transform::identity());
        let t = sweep_test(&a, DVec2::new(10.0, 0.0), &b, DVec2::ZERO, &NarrowphaseConfig::default())
            .unwrap();
        assert_abs_diff_eq!(t, 0.49, epsilon = 1e-4);
    }

    #[test]
    fn test_miss() {
        let ball = Shape::circle(0.5);
        let a = ShapePrimitive::new(&ball, Transform::identity());
        let b = ShapePrimitive::new(&ball, Transform::from_position(DVec2::new(5.0, 3.0)));
        assert!(sweep_test(&a, DVec2::new(10.0, 0.0), &b, DVec2::ZERO, &NarrowphaseConfig::default()).is_none());
    }

    #[test]
    fn test_ray_hits_circle() {
        let ball = Shape::circle(1.0);
        let target = ShapePrimitive::new(&ball, Transform::identity());
        let config = NarrowphaseConfig::default();
        let hit = ray_cast(&target, DVec2::new(-10.0, 0.0), DVec2::X, 20.0, &config).unwrap();
        assert_abs_diff_eq!(hit, 9.0, epsilon = 1e-6);
        assert!(ray_cast(&target, DVec2::new(-10.0, 0.0), DVec2::X, 8.0, &config).is_none());
        assert!(ray_cast(&target, DVec2::new(-10.0, 0.0), -DVec2::X, 20.0, &config).is_none());
        assert_eq!(ray_cast(&target, DVec2::new(0.5, 0.0), DVec2::X, 20.0, &config), Some(0.0));
    }

    #[test]
    fn test_ray_hits_rotated_box_and_segment() {
        let square = Shape::rectangle(2.0, 2.0);
        let diamond = ShapePrimitive::new(&square, Transform::new(DVec2::ZERO, std::f64::consts::FRAC_PI_4));
        let config = NarrowphaseConfig::default();
        let hit = ray_cast(&diamond, DVec2::new(0.0, 5.0), -DVec2::Y, 10.0, &config).unwrap();
        assert_abs_diff_eq!(hit, 5.0 - 2f64.sqrt(), epsilon = 1e-6);

        let floor = Shape::edge(DVec2::new(-3.0, 0.0), DVec2::new(3.0, 0.0));
        let floor = ShapePrimitive::new(&floor, Transform::identity());
        let hit = ray_cast(&floor, DVec2::new(1.0, 4.0), DVec2::new(0.0, -1.0), 10.0, &config).unwrap();
        assert_abs_diff_eq!(hit, 4.0, epsilon = 1e-6);
        assert!(ray_cast(&floor, DVec2::new(4.0, 4.0), DVec2::new(0.0, -1.0), 10.0, &config).is_none());
    }

    #[test]
    fn test_already_overlapping() {
        let ball = Shape::circle(1.0);
        let a = ShapePrimitive::new(&ball, Transform::identity());
        let b = ShapePrimitive::new(&ball, Transform::from_position(DVec2::new(1.0, 0.0)));
        assert_eq!(
            sweep_test(&a, DVec2::X, &b, DVec2::ZERO, &NarrowphaseConfig::default()),
            Some(0.0)
        );
    }
}
