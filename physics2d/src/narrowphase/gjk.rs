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
//! Gilbert-Johnson-Keerthi queries
//!
//! Two entry points share the Minkowski machinery:
//!
//! - [`gjk`] answers "do these shapes overlap?" and, when they do, hands a
//!   triangle around the origin to EPA
//! - [`distance`] walks the closest feature of the simplex toward the origin
//!   and reports the closest points of two separated shapes

use super::simplex::Simplex;
use super::{minkowski_support, ShapePrimitive};
use crate::config::NarrowphaseConfig;
use crate::math::{closest_point_on_segment, fuzzy_eq, DVec2, EPSILON};
use tracing::trace;

/// Attempts at re-seeding along a skewed direction
const SEED_RETRIES: usize = 4;
/// Rotation applied per re-seed attempt (radians)
const SEED_SKEW: f64 = 0.7;

/// Closest points between two shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceResult {
    /// Distance between the closest points (zero when overlapping)
    pub distance: f64,
    /// Closest point on A
    pub point_a: DVec2,
    /// Closest point on B
    pub point_b: DVec2,
    /// Whether the origin was reached (the shapes touch or overlap)
    pub overlap: bool,
}

/// Overlap test
///
/// Returns the final simplex and whether the shapes overlap. When they do,
/// the simplex is a triangle containing the origin (or, for touching
/// degenerate shapes, a segment through it). Running out of iterations is
/// reported as "no overlap".
///
/// # Examples
///
/// ```
/// use physics2d::config::NarrowphaseConfig;
/// use physics2d::geometry::Shape;
/// use physics2d::math::{DVec2, Transform};
/// use physics2d::narrowphase::{gjk, ShapePrimitive};
///
/// let square = Shape::rectangle(1.0, 1.0);
/// let a = ShapePrimitive::new(&square, Transform::identity());
/// let b = ShapePrimitive::new(&square, Transform::from_position(DVec2::new(0.5, 0.0)));
/// let (simplex, overlap) = gjk(&a, &b, &NarrowphaseConfig::default());
/// assert!(overlap);
/// assert!(simplex.contains_origin());
/// ```
pub fn gjk(a: &ShapePrimitive<'_>, b: &ShapePrimitive<'_>, config: &NarrowphaseConfig) -> (Simplex, bool) {
    let mut simplex = Simplex::new();
    let mut direction = b.center() - a.center();
    if direction.length_squared() < EPSILON {
        direction = DVec2::X;
    }

    let mut seeded = false;
    for attempt in 0..=SEED_RETRIES {
        let first = minkowski_support(a, b, direction);
        if first.point.dot(direction) < 0.0 {
            simplex.push(first);
            return (simplex, false);
        }
        let second = minkowski_support(a, b, -direction);
        if second.point.dot(-direction) < 0.0 {
            simplex.push(second);
            return (simplex, false);
        }
        if !fuzzy_eq(first.point, second.point) {
            simplex.push(first);
            simplex.push(second);
            seeded = true;
            break;
        }
        trace!(attempt, "gjk seed degenerated, skewing direction");
        direction = DVec2::from_angle(SEED_SKEW * (attempt + 1) as f64).rotate(direction);
    }

    if !seeded {
        // Both shapes answered with the same point along every direction tried
        let v = minkowski_support(a, b, direction);
        simplex.push(v);
        return (simplex, v.point.length() <= config.tolerance);
    }

    let mut last_distance = f64::INFINITY;
    for _ in 0..config.gjk_iterations {
        let p0 = simplex.vertices()[0].point;
        let p1 = simplex.vertices()[1].point;
        let edge = p1 - p0;
        let (closest, _) = closest_point_on_segment(p0, p1, DVec2::ZERO);
        let on_edge = closest.length() <= config.tolerance;

        let candidates = if on_edge {
            let perp = edge.perp();
            [perp, -perp]
        } else {
            [-closest, -closest]
        };

        let mut next = None;
        for d in candidates {
            let w = minkowski_support(a, b, d);
            if simplex.has_point(w.point) {
                continue;
            }
            if w.point.dot(d) < 0.0 {
                return (simplex, false);
            }
            next = Some(w);
            break;
        }

        let Some(w) = next else {
            // No new support point: the origin lies on the hull boundary iff it lies on the edge
            return (simplex, on_edge);
        };

        simplex.push(w);
        if simplex.classify() {
            return (simplex, true);
        }
        if on_edge {
            // Origin on the old edge lies on the triangle's boundary
            simplex.mark_origin_inside();
            return (simplex, true);
        }

        let dist = simplex.reduce_to_closest_edge();
        if dist > config.tolerance && dist >= last_distance - config.tolerance {
            trace!(dist, "gjk stalled without reaching the origin");
            return (simplex, false);
        }
        last_distance = dist;
    }

    (simplex, false)
}

/// Closest points between two shapes
///
/// Standard closest-feature GJK: each iteration reduces the simplex to the
/// feature nearest the origin, then expands from that feature. The closest
/// points are recovered by barycentric combination of the support points
/// that produced the surviving vertices.
pub fn distance(a: &ShapePrimitive<'_>, b: &ShapePrimitive<'_>, config: &NarrowphaseConfig) -> DistanceResult {
    let mut simplex = Simplex::new();
    let mut direction = b.center() - a.center();
    if direction.length_squared() < EPSILON {
        direction = DVec2::X;
    }
    simplex.push(minkowski_support(a, b, direction));

    let mut best = f64::INFINITY;
    for _ in 0..config.gjk_iterations {
        let (p, weights) = simplex.solve_closest();
        let dist = p.length();
        let (point_a, point_b) = simplex.witness_points(&weights);

        if dist <= config.tolerance {
            return DistanceResult {
                distance: 0.0,
                point_a,
                point_b,
                overlap: true,
            };
        }

        let w = minkowski_support(a, b, -p);
        let gap = dist * dist - p.dot(w.point);
        if simplex.has_point(w.point) || gap <= config.tolerance * dist * dist || dist >= best {
            return DistanceResult {
                distance: dist,
                point_a,
                point_b,
                overlap: false,
            };
        }
        best = dist;
        simplex.push(w);
    }

    let (p, weights) = simplex.solve_closest();
    let (point_a, point_b) = simplex.witness_points(&weights);
    let dist = p.length();
    DistanceResult {
        distance: dist,
        point_a,
        point_b,
        overlap: dist <= config.tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use crate::math::Transform;
    use approx::assert_abs_diff_eq;

    fn config() -> NarrowphaseConfig {
        NarrowphaseConfig::default()
    }

    #[test]
    fn test_separated_circles() {
        let a = Shape::circle(1.0);
        let b = Shape::circle(2.0);
        let pa = ShapePrimitive::new(&a, Transform::identity());
        let pb = ShapePrimitive::new(&b, Transform::from_position(DVec2::new(3.0, 4.0)));

        let (_, overlap) = gjk(&pa, &pb, &config());
        assert!(!overlap);

        let result = distance(&pa, &pb, &config());
        assert!(!result.overlap);
        assert_abs_diff_eq!(result.distance, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.point_a.length(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(
            result.point_b.distance(DVec2::new(3.0, 4.0)),
            2.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_overlapping_circles() {
        let a = Shape::circle(1.0);
        let pa = ShapePrimitive::new(&a, Transform::identity());
        let pb = ShapePrimitive::new(&a, Transform::from_position(DVec2::new(1.5, 0.2)));
        let (simplex, overlap) = gjk(&pa, &pb, &config());
        assert!(overlap);
        assert_eq!(simplex.len(), 3);
        assert!(distance(&pa, &pb, &config()).overlap);
    }

    #[test]
    fn test_concentric_shapes_overlap() {
        let a = Shape::rectangle(2.0, 1.0);
        let b = Shape::circle(0.25);
        let pa = ShapePrimitive::new(&a, Transform::identity());
        let pb = ShapePrimitive::new(&b, Transform::identity());
        assert!(gjk(&pa, &pb, &config()).1);
    }

    #[test]
    fn test_separated_boxes_distance() {
        let a = Shape::rectangle(1.0, 1.0);
        let pa = ShapePrimitive::new(&a, Transform::identity());
        let pb = ShapePrimitive::new(&a, Transform::from_position(DVec2::new(3.0, 0.25)));
        assert!(!gjk(&pa, &pb, &config()).1);
        let result = distance(&pa, &pb, &config());
        assert_abs_diff_eq!(result.distance, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.point_a.x, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(result.point_b.x, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_rotated_box_against_edge() {
        let a = Shape::rectangle(1.0, 1.0);
        let ground = Shape::edge(DVec2::new(-5.0, 0.0), DVec2::new(5.0, 0.0));
        let box_tf = Transform::new(DVec2::new(0.0, 0.6), std::f64::consts::FRAC_PI_4);
        let pa = ShapePrimitive::new(&a, box_tf);
        let pb = ShapePrimitive::new(&ground, Transform::identity());
        // Half diagonal is ~0.707, so the corner dips below the line
        assert!(gjk(&pa, &pb, &config()).1);

        let lifted = pa.translated(DVec2::new(0.0, 0.5));
        assert!(!gjk(&lifted, &pb, &config()).1);
        let result = distance(&lifted, &pb, &config());
        assert_abs_diff_eq!(result.distance, 1.1 - 0.5f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_capsule_and_ellipse() {
        let capsule = Shape::capsule(3.0, 1.0);
        let ellipse = Shape::ellipse(2.0, 1.0);
        let pa = ShapePrimitive::new(&capsule, Transform::identity());
        let near = ShapePrimitive::new(&ellipse, Transform::from_position(DVec2::new(0.0, 0.9)));
        let far = ShapePrimitive::new(&ellipse, Transform::from_position(DVec2::new(0.0, 1.5)));
        assert!(gjk(&pa, &near, &config()).1);
        assert!(!gjk(&pa, &far, &config()).1);
        let result = distance(&pa, &far, &config());
        assert_abs_diff_eq!(result.distance, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_circle_pairs_overlap_at_every_angle() {
        // Seeds taken along the center line put the origin exactly on the first edge
        let circle = Shape::circle(1.0);
        let pa = ShapePrimitive::new(&circle, Transform::identity());
        for degrees in 0..360 {
            let dir = DVec2::from_angle((degrees as f64).to_radians());
            for depth in [0.001, 0.01, 0.1, 0.3] {
                let pb = ShapePrimitive::new(&circle, Transform::from_position(dir * (2.0 - depth)));
                let (simplex, overlap) = gjk(&pa, &pb, &config());
                assert!(overlap, "missed overlap at {degrees} degrees, depth {depth}");
                assert!(simplex.contains_origin());
            }
            let apart = ShapePrimitive::new(&circle, Transform::from_position(dir * 2.01));
            assert!(!gjk(&pa, &apart, &config()).1, "false overlap at {degrees} degrees");
        }
    }

    #[test]
    fn test_curved_shapes_overlap_at_every_angle() {
        let ball = Shape::circle(0.5);
        let bodies = [Shape::circle(1.0), Shape::capsule(3.0, 1.0), Shape::ellipse(2.0, 1.0)];
        for body in &bodies {
            let pa = ShapePrimitive::new(body, Transform::new(DVec2::new(0.3, -0.2), 0.4));
            for degrees in 0..360 {
                let normal = DVec2::from_angle((degrees as f64).to_radians());
                let (surface, _) = pa.support(normal);
                for depth in [0.01, 0.1, 0.3] {
                    let pb = ShapePrimitive::new(&ball, Transform::from_position(surface + normal * (0.5 - depth)));
                    assert!(
                        gjk(&pa, &pb, &config()).1,
                        "missed {:?} overlap at {degrees} degrees, depth {depth}",
                        body.kind()
                    );
                }
                let pb = ShapePrimitive::new(&ball, Transform::from_position(surface + normal * 0.52));
                assert!(!gjk(&pa, &pb, &config()).1);
            }
        }
    }
}
