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
//! Expanding polytope penetration query
//!
//! The polytope is a counter-clockwise polygon of Minkowski vertices around
//! the origin. Each pass takes the edge closest to the origin, asks for the
//! support point along its outward normal and splices it in, until the
//! support point no longer lies beyond the edge.

use super::simplex::{Simplex, SimplexVertex};
use super::{minkowski_support, ShapePrimitive};
use crate::config::NarrowphaseConfig;
use crate::math::{cross, fuzzy_eq, DVec2};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

/// Penetration normal and depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Unit normal from A toward B; zero when the depth is negligible
    pub normal: DVec2,
    /// How far B must move along `normal` to separate
    pub depth: f64,
}

impl Penetration {
    fn touching() -> Self {
        Penetration {
            normal: DVec2::ZERO,
            depth: 0.0,
        }
    }

    fn finish(normal: DVec2, depth: f64, tolerance: f64) -> Self {
        if depth <= tolerance {
            trace!(depth, "epa converged to a touching contact");
            Penetration::touching()
        } else {
            Penetration { normal, depth }
        }
    }
}

/// Outward normal and origin distance of the CCW edge `a -> b`
#[inline]
fn edge_normal(a: DVec2, b: DVec2) -> Option<(DVec2, f64)> {
    let e = b - a;
    let normal = DVec2::new(e.y, -e.x).normalize_or_zero();
    if normal == DVec2::ZERO {
        None
    } else {
        Some((normal, normal.dot(a)))
    }
}

/// Turn a GJK simplex into a counter-clockwise triangle
///
/// Two-vertex simplices (origin on a segment) are completed with support
/// points perpendicular to the segment.
fn initial_polytope(
    simplex: &Simplex,
    a: &ShapePrimitive<'_>,
    b: &ShapePrimitive<'_>,
) -> Option<Vec<SimplexVertex>> {
    let mut polytope: Vec<SimplexVertex> = simplex.vertices().to_vec();
    if polytope.len() == 2 {
        let perp = (polytope[1].point - polytope[0].point).perp();
        for d in [perp, -perp] {
            let w = minkowski_support(a, b, d);
            if !polytope.iter().any(|v| fuzzy_eq(v.point, w.point)) {
                polytope.push(w);
                break;
            }
        }
    }
    if polytope.len() != 3 {
        return None;
    }

    let area = cross(
        polytope[1].point - polytope[0].point,
        polytope[2].point - polytope[0].point,
    );
    if area.abs() <= f64::EPSILON {
        return None;
    }
    if area < 0.0 {
        polytope.swap(1, 2);
    }
    Some(polytope)
}

/// Linear-scan EPA
///
/// Every iteration rescans all polytope edges for the one closest to the
/// origin. Exhausting the iteration budget returns the best edge found so far.
pub fn epa(
    simplex: &Simplex,
    a: &ShapePrimitive<'_>,
    b: &ShapePrimitive<'_>,
    config: &NarrowphaseConfig,
) -> Penetration {
    let Some(mut polytope) = initial_polytope(simplex, a, b) else {
        trace!("epa received a degenerate simplex");
        return Penetration::touching();
    };

    let mut best = (DVec2::ZERO, 0.0);
    for _ in 0..config.epa_iterations {
        let n = polytope.len();
        let mut closest: Option<(usize, DVec2, f64)> = None;
        for i in 0..n {
            let j = (i + 1) % n;
            if let Some((normal, dist)) = edge_normal(polytope[i].point, polytope[j].point) {
                if closest.map_or(true, |(_, _, d)| dist < d) {
                    closest = Some((i, normal, dist));
                }
            }
        }
        let Some((index, normal, dist)) = closest else {
            return Penetration::touching();
        };
        best = (normal, dist);

        let w = minkowski_support(a, b, normal);
        let duplicate = polytope.iter().any(|v| fuzzy_eq(v.point, w.point));
        if duplicate || w.point.dot(normal) - dist <= config.tolerance {
            return Penetration::finish(normal, dist, config.tolerance);
        }
        polytope.insert(index + 1, w);
    }

    trace!(depth = best.1, "epa ran out of iterations");
    Penetration::finish(best.0, best.1, config.tolerance)
}

/// Candidate edge in the priority-queue variant
#[derive(Debug, Clone, Copy)]
struct EdgeCandidate {
    distance: f64,
    normal: DVec2,
    start: usize,
    end: usize,
}

impl PartialEq for EdgeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EdgeCandidate {}

impl PartialOrd for EdgeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCandidate {
    // Reversed so the max-heap pops the nearest edge; ties pop the lower start index
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then(other.start.cmp(&self.start))
    }
}

/// EPA with candidate edges kept in a binary heap
///
/// Vertices are never removed, only linked in through `next`; an edge popped
/// from the heap is stale when its start vertex no longer links to its end.
/// Termination follows [`epa`].
pub fn epa_priority(
    simplex: &Simplex,
    a: &ShapePrimitive<'_>,
    b: &ShapePrimitive<'_>,
    config: &NarrowphaseConfig,
) -> Penetration {
    let Some(initial) = initial_polytope(simplex, a, b) else {
        trace!("epa received a degenerate simplex");
        return Penetration::touching();
    };

    fn push_edge(heap: &mut BinaryHeap<EdgeCandidate>, vertices: &[SimplexVertex], start: usize, end: usize) {
        if let Some((normal, distance)) = edge_normal(vertices[start].point, vertices[end].point) {
            heap.push(EdgeCandidate {
                distance,
                normal,
                start,
                end,
            });
        }
    }

    let mut vertices = initial;
    let mut next: Vec<usize> = vec![1, 2, 0];
    let mut heap = BinaryHeap::new();
    for i in 0..3 {
        push_edge(&mut heap, &vertices, i, next[i]);
    }

    let mut best = (DVec2::ZERO, 0.0);
    let mut iterations = 0;
    while let Some(edge) = heap.pop() {
        if next[edge.start] != edge.end {
            continue;
        }
        best = (edge.normal, edge.distance);
        if iterations == config.epa_iterations {
            trace!(depth = edge.distance, "epa ran out of iterations");
            break;
        }
        iterations += 1;

        let w = minkowski_support(a, b, edge.normal);
        let duplicate = vertices.iter().any(|v| fuzzy_eq(v.point, w.point));
        if duplicate || w.point.dot(edge.normal) - edge.distance <= config.tolerance {
            return Penetration::finish(edge.normal, edge.distance, config.tolerance);
        }

        let k = vertices.len();
        vertices.push(w);
        next.push(edge.end);
        next[edge.start] = k;
        push_edge(&mut heap, &vertices, edge.start, k);
        push_edge(&mut heap, &vertices, k, edge.end);
    }

    Penetration::finish(best.0, best.1, config.tolerance)
}
