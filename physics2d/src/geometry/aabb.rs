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
//! Axis-aligned bounding boxes
//!
//! Boxes are stored as a center plus width/height, which is the form the
//! broadphase structures compare and combine most often. Corner accessors are
//! derived on demand.

use crate::math::{DVec2, EPSILON};

/// Axis-aligned bounding box described by its center and extents
///
/// # Examples
///
/// ```
/// use physics2d::geometry::Aabb;
/// use physics2d::math::DVec2;
///
/// let a = Aabb::new(DVec2::ZERO, 2.0, 2.0);
/// let b = Aabb::new(DVec2::new(1.5, 0.0), 2.0, 2.0);
/// assert!(a.collide(&b));
/// assert_eq!(Aabb::combine(&a, &b).width, 3.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Center of the box
    pub position: DVec2,
    /// Extent along x (never negative)
    pub width: f64,
    /// Extent along y (never negative)
    pub height: f64,
}

impl Aabb {
    /// Create a box from its center and extents
    ///
    /// # Panics
    ///
    /// Panics if either extent is negative or NaN.
    pub fn new(position: DVec2, width: f64, height: f64) -> Self {
        assert!(
            width >= 0.0 && height >= 0.0,
            "AABB extents must be non-negative"
        );
        Aabb {
            position,
            width,
            height,
        }
    }

    /// Create a box from two opposite corners
    pub fn from_min_max(min: DVec2, max: DVec2) -> Self {
        let lo = min.min(max);
        let hi = min.max(max);
        Aabb {
            position: (lo + hi) * 0.5,
            width: hi.x - lo.x,
            height: hi.y - lo.y,
        }
    }

    /// Smallest box containing every point in `points`
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec2>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (lo, hi) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Aabb::from_min_max(lo, hi))
    }

    /// Half extents `(width / 2, height / 2)`
    #[inline]
    pub fn half_extents(&self) -> DVec2 {
        DVec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Lower corner
    #[inline]
    pub fn min(&self) -> DVec2 {
        self.position - self.half_extents()
    }

    /// Upper corner
    #[inline]
    pub fn max(&self) -> DVec2 {
        self.position + self.half_extents()
    }

    /// Corner with minimum x and maximum y
    pub fn top_left(&self) -> DVec2 {
        DVec2::new(self.min().x, self.max().y)
    }

    /// Corner with maximum x and maximum y
    pub fn top_right(&self) -> DVec2 {
        self.max()
    }

    /// Corner with minimum x and minimum y
    pub fn bottom_left(&self) -> DVec2 {
        self.min()
    }

    /// Corner with maximum x and minimum y
    pub fn bottom_right(&self) -> DVec2 {
        DVec2::new(self.max().x, self.min().y)
    }

    /// Perimeter of the box, the 2D stand-in for surface area in SAH costs
    #[inline]
    pub fn surface_area(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    /// Whether the two boxes overlap (touching counts as overlapping)
    #[inline]
    pub fn collide(&self, other: &Aabb) -> bool {
        let a_min = self.min();
        let a_max = self.max();
        let b_min = other.min();
        let b_max = other.max();
        a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
    }

    /// Whether `point` lies inside or on the boundary of the box
    #[inline]
    pub fn contains_point(&self, point: DVec2) -> bool {
        let min = self.min();
        let max = self.max();
        (point.x >= min.x && point.x <= max.x) && (point.y >= min.y && point.y <= max.y)
    }

    /// Whether `self` lies entirely inside `other`
    pub fn is_subset(&self, other: &Aabb) -> bool {
        let a_min = self.min();
        let a_max = self.max();
        let b_min = other.min();
        let b_max = other.max();
        a_min.x >= b_min.x && a_min.y >= b_min.y && a_max.x <= b_max.x && a_max.y <= b_max.y
    }

    /// Union of two boxes
    pub fn combine(a: &Aabb, b: &Aabb) -> Aabb {
        Aabb::from_min_max(a.min().min(b.min()), a.max().max(b.max()))
    }

    /// Grow the box by `margin` on every side
    pub fn expand(&self, margin: f64) -> Aabb {
        Aabb {
            position: self.position,
            width: (self.width + 2.0 * margin).max(0.0),
            height: (self.height + 2.0 * margin).max(0.0),
        }
    }

    /// Slab-test a ray against the box
    ///
    /// Returns the entry and exit distances along the normalized `direction`.
    /// The entry distance is clamped to zero when `origin` starts inside. Rays
    /// whose entry lies beyond `max_distance` or whose exit lies behind the
    /// origin miss.
    pub fn raycast(&self, origin: DVec2, direction: DVec2, max_distance: f64) -> Option<(f64, f64)> {
        let dir = direction.normalize_or_zero();
        if dir == DVec2::ZERO {
            return if self.contains_point(origin) {
                Some((0.0, 0.0))
            } else {
                None
            };
        }

        let min = self.min();
        let max = self.max();
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;

        for (o, d, lo, hi) in [(origin.x, dir.x, min.x, max.x), (origin.y, dir.y, min.y, max.y)] {
            if d.abs() < EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let t1 = (lo - o) * inv;
            let t2 = (hi - o) * inv;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        if t_enter > t_exit || t_exit < 0.0 {
            return None;
        }
        let t_enter = t_enter.max(0.0);
        if t_enter > max_distance {
            return None;
        }
        Some((t_enter, t_exit))
    }
}
