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
//! Minkowski-difference simplex shared by GJK and EPA

use crate::math::{closest_point_on_segment, cross, fuzzy_eq, DVec2, EPSILON};

/// Relative rounding allowance for an origin lying on a triangle edge
const BOUNDARY_SLACK: f64 = 1e-9;

/// One vertex of the Minkowski difference `A - B`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimplexVertex {
    /// `support_a - support_b`
    pub point: DVec2,
    /// Support point on shape A
    pub support_a: DVec2,
    /// Support point on shape B
    pub support_b: DVec2,
    /// Feature index reported by shape A
    pub index_a: usize,
    /// Feature index reported by shape B
    pub index_b: usize,
}

/// Up to three Minkowski vertices
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Simplex {
    vertices: [SimplexVertex; 3],
    count: usize,
    contains_origin: bool,
}

impl Simplex {
    /// Empty simplex
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices (0 to 3)
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the simplex has no vertices
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Live vertices
    pub fn vertices(&self) -> &[SimplexVertex] {
        &self.vertices[..self.count]
    }

    /// Whether the last classification found the origin inside
    pub fn contains_origin(&self) -> bool {
        self.contains_origin
    }

    /// Append a vertex
    ///
    /// # Panics
    ///
    /// Panics when the simplex already holds three vertices.
    pub fn push(&mut self, vertex: SimplexVertex) {
        assert!(self.count < 3, "Simplex holds at most three vertices");
        self.vertices[self.count] = vertex;
        self.count += 1;
        self.contains_origin = false;
    }

    /// Whether `point` coincides with an existing vertex
    pub fn has_point(&self, point: DVec2) -> bool {
        self.vertices().iter().any(|v| fuzzy_eq(v.point, point))
    }

    /// Keep only the listed vertices, in the given order
    pub(crate) fn retain(&mut self, keep: &[usize]) {
        let old = self.vertices;
        for (slot, &i) in keep.iter().enumerate() {
            self.vertices[slot] = old[i];
        }
        self.count = keep.len();
        self.contains_origin = false;
    }

    /// Barycentric sign test; sets and returns the containment flag
    ///
    /// Only a non-degenerate triangle can contain the origin. Points on the
    /// boundary count as inside.
    pub fn classify(&mut self) -> bool {
        self.contains_origin = if self.count == 3 {
            let [a, b, c] = [
                self.vertices[0].point,
                self.vertices[1].point,
                self.vertices[2].point,
            ];
            let area = cross(b - a, c - a);
            if area.abs() <= EPSILON {
                false
            } else {
                let slack = -area.abs() * BOUNDARY_SLACK;
                let w0 = cross(b - a, -a) * area.signum();
                let w1 = cross(c - b, -b) * area.signum();
                let w2 = cross(a - c, -c) * area.signum();
                w0 >= slack && w1 >= slack && w2 >= slack
            }
        } else {
            false
        };
        self.contains_origin
    }

    /// Record that the origin lies inside or on the boundary of the simplex
    pub(crate) fn mark_origin_inside(&mut self) {
        self.contains_origin = true;
    }

    /// Reduce a triangle to the edge closest to the origin, stored as vertices 0 and 1
    ///
    /// Returns the distance from the origin to that edge.
    pub(crate) fn reduce_to_closest_edge(&mut self) -> f64 {
        debug_assert_eq!(self.count, 3);
        let mut best = (0, 1);
        let mut best_dist = f64::INFINITY;
        for (i, j) in [(0, 1), (1, 2), (2, 0)] {
            let (p, _) =
                closest_point_on_segment(self.vertices[i].point, self.vertices[j].point, DVec2::ZERO);
            let dist = p.length();
            if dist < best_dist {
                best_dist = dist;
                best = (i, j);
            }
        }
        self.retain(&[best.0, best.1]);
        best_dist
    }

    /// Point of the simplex closest to the origin, reducing to the supporting feature
    ///
    /// Returns the closest point and the barycentric weights of the remaining
    /// vertices (unused weights are zero).
    pub(crate) fn solve_closest(&mut self) -> (DVec2, [f64; 3]) {
        match self.count {
            1 => (self.vertices[0].point, [1.0, 0.0, 0.0]),
            2 => {
                let a = self.vertices[0].point;
                let b = self.vertices[1].point;
                let (p, t) = closest_point_on_segment(a, b, DVec2::ZERO);
                if t <= 0.0 {
                    self.retain(&[0]);
                    (a, [1.0, 0.0, 0.0])
                } else if t >= 1.0 {
                    self.retain(&[1]);
                    (b, [1.0, 0.0, 0.0])
                } else {
                    (p, [1.0 - t, t, 0.0])
                }
            }
            3 => {
                if self.classify() {
                    let [a, b, c] = [
                        self.vertices[0].point,
                        self.vertices[1].point,
                        self.vertices[2].point,
                    ];
                    let area = cross(b - a, c - a);
                    let u = cross(b, c) / area;
                    let v = cross(c, a) / area;
                    return (DVec2::ZERO, [u, v, 1.0 - u - v]);
                }
                self.reduce_to_closest_edge();
                self.solve_closest()
            }
            _ => (DVec2::ZERO, [0.0; 3]),
        }
    }

    /// Combine originating support points with barycentric `weights`
    pub(crate) fn witness_points(&self, weights: &[f64; 3]) -> (DVec2, DVec2) {
        self.vertices()
            .iter()
            .zip(weights)
            .fold((DVec2::ZERO, DVec2::ZERO), |(pa, pb), (v, &w)| {
                (pa + v.support_a * w, pb + v.support_b * w)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vertex(x: f64, y: f64) -> SimplexVertex {
        SimplexVertex {
            point: DVec2::new(x, y),
            support_a: DVec2::new(x, y),
            ..Default::default()
        }
    }

    #[test]
    fn test_triangle_contains_origin() {
        let mut s = Simplex::new();
        s.push(vertex(-1.0, -1.0));
        s.push(vertex(1.0, -1.0));
        s.push(vertex(0.0, 1.0));
        assert!(s.classify());
        assert!(s.contains_origin());
    }

    #[test]
    fn test_clockwise_triangle_contains_origin() {
        let mut s = Simplex::new();
        s.push(vertex(0.0, 1.0));
        s.push(vertex(1.0, -1.0));
        s.push(vertex(-1.0, -1.0));
        assert!(s.classify());
    }

    #[test]
    fn test_origin_on_edge_counts_as_inside() {
        // Rounding leaves the origin a hair outside the first edge
        let mut s = Simplex::new();
        s.push(vertex(0.001, 1e-20));
        s.push(vertex(-3.999, -1e-18));
        s.push(vertex(-2.0, 2.0));
        assert!(s.classify());

        let mut outside = Simplex::new();
        outside.push(vertex(0.001, 0.01));
        outside.push(vertex(-3.999, 0.01));
        outside.push(vertex(-2.0, 2.0));
        assert!(!outside.classify());
    }

    #[test]
    fn test_degenerate_triangle_never_contains() {
        let mut s = Simplex::new();
        s.push(vertex(-1.0, 0.0));
        s.push(vertex(0.0, 0.0));
        s.push(vertex(1.0, 0.0));
        assert!(!s.classify());
    }

    #[test]
    fn test_reduce_to_closest_edge() {
        let mut s = Simplex::new();
        s.push(vertex(1.0, 3.0));
        s.push(vertex(-1.0, 1.0));
        s.push(vertex(1.0, 1.0));
        let d = s.reduce_to_closest_edge();
        assert_abs_diff_eq!(d, 1.0, epsilon = 1e-12);
        assert_eq!(s.len(), 2);
        let pts: Vec<DVec2> = s.vertices().iter().map(|v| v.point).collect();
        assert_eq!(pts, vec![DVec2::new(-1.0, 1.0), DVec2::new(1.0, 1.0)]);
    }

    #[test]
    fn test_solve_closest_on_segment() {
        let mut s = Simplex::new();
        s.push(vertex(-1.0, 2.0));
        s.push(vertex(1.0, 2.0));
        let (p, w) = s.solve_closest();
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-12);
        let (pa, _) = s.witness_points(&w);
        assert_abs_diff_eq!(pa.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_closest_vertex_region() {
        let mut s = Simplex::new();
        s.push(vertex(2.0, 0.0));
        s.push(vertex(3.0, 1.0));
        let (p, _) = s.solve_closest();
        assert_eq!(p, DVec2::new(2.0, 0.0));
        assert_eq!(s.len(), 1);
    }

    #[test]
    #[should_panic(expected = "at most three")]
    fn test_push_overflow() {
        let mut s = Simplex::new();
        for _ in 0..4 {
            s.push(vertex(0.0, 0.0));
        }
    }
}
