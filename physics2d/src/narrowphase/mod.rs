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
//! Exact collision queries between two posed shapes
//!
//! The pipeline for one candidate pair is:
//!
//! 1. [`gjk`] decides overlap and leaves a simplex around the origin
//! 2. [`epa`] (or [`epa_priority`]) expands that simplex into a penetration
//!    normal and depth
//! 3. [`generate_contacts`] clips the touching features into at most two
//!    contact points tagged with feature ids
//!
//! Separated pairs go through [`distance`] instead, which reports the
//! closest points. [`detect`] runs steps 1 and 2 (or the distance query) in
//! one call, and [`sweep_test`] and [`ray_cast`] answer motion queries. All
//! normals point from shape A toward shape B.

mod ccd;
mod clip;
mod epa;
mod gjk;
mod simplex;

pub use ccd::{ray_cast, sweep_test};
pub use clip::{generate_contacts, ContactFeature, ContactPair, ContactPoint, FeatureId};
pub use epa::{epa, epa_priority, Penetration};
pub use gjk::{distance, gjk, DistanceResult};
pub use simplex::{Simplex, SimplexVertex};

use crate::config::{EpaMethod, NarrowphaseConfig};
use crate::geometry::{Aabb, Shape};
use crate::math::{DVec2, Transform};

/// A shape placed in the world
#[derive(Debug, Clone, Copy)]
pub struct ShapePrimitive<'a> {
    /// Local geometry
    pub shape: &'a Shape,
    /// Pose
    pub transform: Transform,
}

impl<'a> ShapePrimitive<'a> {
    /// Pair a shape with a pose
    pub fn new(shape: &'a Shape, transform: Transform) -> Self {
        ShapePrimitive { shape, transform }
    }

    /// World-space geometric center
    pub fn center(&self) -> DVec2 {
        self.transform.apply(self.shape.local_center())
    }

    /// World-space support point and feature index
    #[inline]
    pub fn support(&self, direction: DVec2) -> (DVec2, usize) {
        let s = self.shape.support(&self.transform, direction);
        (s.point, s.index)
    }

    /// World-space bounding box
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(&self.transform)
    }

    /// Same shape moved by `offset`
    pub fn translated(&self, offset: DVec2) -> Self {
        ShapePrimitive {
            shape: self.shape,
            transform: Transform::new(self.transform.position + offset, self.transform.rotation),
        }
    }
}

/// Support of the Minkowski difference `A - B` along `direction`
pub(crate) fn minkowski_support(
    a: &ShapePrimitive<'_>,
    b: &ShapePrimitive<'_>,
    direction: DVec2,
) -> SimplexVertex {
    let (support_a, index_a) = a.support(direction);
    let (support_b, index_b) = b.support(-direction);
    SimplexVertex {
        point: support_a - support_b,
        support_a,
        support_b,
        index_a,
        index_b,
    }
}

/// Combined GJK/EPA answer for one shape pair
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionInfo {
    /// Final GJK simplex
    pub simplex: Simplex,
    /// Whether the shapes overlap
    pub overlap: bool,
    /// Unit normal from A toward B (zero for a degenerate touch)
    pub normal: DVec2,
    /// Penetration depth (zero when separated)
    pub depth: f64,
    /// Closest points `(on A, on B)` when separated
    pub closest: Option<(DVec2, DVec2)>,
}

impl CollisionInfo {
    /// Distance between the closest points, or zero when overlapping
    pub fn separation(&self) -> f64 {
        self.closest.map_or(0.0, |(pa, pb)| pa.distance(pb))
    }

    /// Whether the overlap carries a usable contact normal
    pub fn has_contact(&self) -> bool {
        self.overlap && self.normal != DVec2::ZERO
    }
}

/// Run GJK and then EPA or the distance query
pub fn detect(a: &ShapePrimitive<'_>, b: &ShapePrimitive<'_>, config: &NarrowphaseConfig) -> CollisionInfo {
    let (simplex, overlap) = gjk(a, b, config);
    if overlap {
        let penetration = match config.epa_method {
            EpaMethod::Linear => epa(&simplex, a, b, config),
            EpaMethod::PriorityQueue => epa_priority(&simplex, a, b, config),
        };
        CollisionInfo {
            simplex,
            overlap: true,
            normal: penetration.normal,
            depth: penetration.depth,
            closest: None,
        }
    } else {
        let result = distance(a, b, config);
        CollisionInfo {
            simplex,
            overlap: false,
            normal: (result.point_b - result.point_a).normalize_or_zero(),
            depth: 0.0,
            closest: Some((result.point_a, result.point_b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_detect_separated_circles() {
        let a = Shape::circle(1.0);
        let b = Shape::circle(0.5);
        let pa = ShapePrimitive::new(&a, Transform::identity());
        let pb = ShapePrimitive::new(&b, Transform::from_position(DVec2::new(4.0, 0.0)));
        let info = detect(&pa, &pb, &NarrowphaseConfig::default());
        assert!(!info.overlap);
        assert!(!info.has_contact());
        assert_abs_diff_eq!(info.separation(), 2.5, epsilon = 1e-6);
        assert_abs_diff_eq!(info.normal.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_detect_overlapping_boxes() {
        let a = Shape::rectangle(1.0, 1.0);
        let pa = ShapePrimitive::new(&a, Transform::identity());
        let pb = ShapePrimitive::new(&a, Transform::from_position(DVec2::new(0.0, 0.75)));
        let info = detect(&pa, &pb, &NarrowphaseConfig::default());
        assert!(info.has_contact());
        assert_abs_diff_eq!(info.depth, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(info.normal.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_translated_primitive() {
        let a = Shape::circle(1.0);
        let p = ShapePrimitive::new(&a, Transform::identity()).translated(DVec2::new(2.0, 0.0));
        assert_eq!(p.center(), DVec2::new(2.0, 0.0));
    }
}
