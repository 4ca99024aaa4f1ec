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
//! Convex shapes and their support queries
//!
//! Shapes live in body-local coordinates and are positioned by a
//! [`Transform`]. The narrowphase only needs two things from a shape: the
//! farthest point along a direction (with the index of the feature that
//! produced it) and a world-space bounding box. Dispatch is a plain `match`
//! over the closed [`Shape`] enum.

use crate::geometry::Aabb;
use crate::math::{DVec2, Transform, EPSILON};

/// Discriminant of a [`Shape`], handy for pair dispatch tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Convex polygon
    Polygon,
    /// Line segment
    Edge,
    /// Stadium (segment swept by a disc)
    Capsule,
    /// Disc
    Circle,
    /// Axis-aligned (in local space) ellipse
    Ellipse,
}

/// Farthest point of a shape along a direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportPoint {
    /// World-space point
    pub point: DVec2,
    /// Index of the vertex (or segment endpoint) that produced the point
    pub index: usize,
}

/// Convex polygon with counter-clockwise vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<DVec2>,
}

impl Polygon {
    /// Create a polygon from its vertices
    ///
    /// Clockwise input is reversed so the stored winding is always
    /// counter-clockwise.
    ///
    /// # Panics
    ///
    /// Panics if fewer than three vertices are given or the polygon has no area.
    /// Debug builds also panic on concave input.
    pub fn new(vertices: Vec<DVec2>) -> Self {
        assert!(vertices.len() >= 3, "Polygon needs at least three vertices");
        let mut vertices = vertices;
        let area = signed_area(&vertices);
        assert!(area.abs() > EPSILON, "Polygon must have non-zero area");
        if area < 0.0 {
            vertices.reverse();
        }
        debug_assert!(is_convex(&vertices), "Polygon must be convex");
        Polygon { vertices }
    }

    /// Axis-aligned rectangle centered on the local origin
    pub fn rectangle(width: f64, height: f64) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Polygon::new(vec![
            DVec2::new(-hw, -hh),
            DVec2::new(hw, -hh),
            DVec2::new(hw, hh),
            DVec2::new(-hw, hh),
        ])
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`
    pub fn regular(sides: usize, radius: f64) -> Self {
        let step = std::f64::consts::TAU / sides as f64;
        Polygon::new(
            (0..sides)
                .map(|i| DVec2::from_angle(step * i as f64) * radius)
                .collect(),
        )
    }

    /// Local-space vertices in counter-clockwise order
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Vertex `i`, wrapping around
    pub fn vertex(&self, i: usize) -> DVec2 {
        self.vertices[i % self.vertices.len()]
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Polygons always have at least three vertices
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Area centroid in local space
    pub fn centroid(&self) -> DVec2 {
        let n = self.vertices.len();
        let mut area = 0.0;
        let mut c = DVec2::ZERO;
        for i in 0..n {
            let p = self.vertices[i];
            let q = self.vertices[(i + 1) % n];
            let a = p.perp_dot(q);
            area += a;
            c += (p + q) * a;
        }
        c / (3.0 * area)
    }
}

fn signed_area(vertices: &[DVec2]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

/// Whether a counter-clockwise loop never turns right (collinear runs allowed)
fn is_convex(vertices: &[DVec2]) -> bool {
    let n = vertices.len();
    (0..n).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        (b - a).perp_dot(c - b) >= -EPSILON
    })
}

/// Line segment between two local points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// First endpoint
    pub start: DVec2,
    /// Second endpoint
    pub end: DVec2,
}

impl Edge {
    /// Create a segment
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Edge { start, end }
    }
}

/// Stadium shape: a segment along its long axis swept by a disc
///
/// The long axis is local x when `width >= height`, otherwise local y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    /// Total extent along local x
    pub width: f64,
    /// Total extent along local y
    pub height: f64,
}

impl Capsule {
    /// Create a capsule from its bounding extents
    ///
    /// # Panics
    ///
    /// Panics if either extent is not positive.
    pub fn new(width: f64, height: f64) -> Self {
        assert!(width > 0.0 && height > 0.0, "Capsule extents must be positive");
        Capsule { width, height }
    }

    /// Radius of the rounded caps
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) * 0.5
    }

    /// Unit direction of the inner segment in local space
    pub fn axis(&self) -> DVec2 {
        if self.width >= self.height {
            DVec2::X
        } else {
            DVec2::Y
        }
    }

    /// Half length of the inner segment
    pub fn half_segment(&self) -> f64 {
        self.width.max(self.height) * 0.5 - self.radius()
    }

    /// Endpoints of the inner segment in local space
    pub fn segment(&self) -> (DVec2, DVec2) {
        let h = self.axis() * self.half_segment();
        (-h, h)
    }
}

/// Disc centered on the local origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Radius
    pub radius: f64,
}

impl Circle {
    /// Create a disc
    pub fn new(radius: f64) -> Self {
        assert!(radius > 0.0, "Circle radius must be positive");
        Circle { radius }
    }
}

/// Ellipse centered on the local origin with semi-axes along local x and y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    /// Semi-axis along local x
    pub a: f64,
    /// Semi-axis along local y
    pub b: f64,
}

impl Ellipse {
    /// Create an ellipse from its full width and height
    pub fn new(width: f64, height: f64) -> Self {
        assert!(width > 0.0 && height > 0.0, "Ellipse extents must be positive");
        Ellipse {
            a: width * 0.5,
            b: height * 0.5,
        }
    }
}

/// Closed set of convex shapes understood by the collision pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Convex polygon
    Polygon(Polygon),
    /// Line segment
    Edge(Edge),
    /// Stadium
    Capsule(Capsule),
    /// Disc
    Circle(Circle),
    /// Ellipse
    Ellipse(Ellipse),
}

impl Shape {
    /// Rectangle centered on the origin
    pub fn rectangle(width: f64, height: f64) -> Self {
        Shape::Polygon(Polygon::rectangle(width, height))
    }

    /// Disc of the given radius
    pub fn circle(radius: f64) -> Self {
        Shape::Circle(Circle::new(radius))
    }

    /// Segment between two local points
    pub fn edge(start: DVec2, end: DVec2) -> Self {
        Shape::Edge(Edge::new(start, end))
    }

    /// Capsule with the given bounding extents
    pub fn capsule(width: f64, height: f64) -> Self {
        Shape::Capsule(Capsule::new(width, height))
    }

    /// Ellipse with the given bounding extents
    pub fn ellipse(width: f64, height: f64) -> Self {
        Shape::Ellipse(Ellipse::new(width, height))
    }

    /// The variant tag
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Edge(_) => ShapeKind::Edge,
            Shape::Capsule(_) => ShapeKind::Capsule,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
        }
    }

    /// Whether the boundary is smooth everywhere (one support point per direction)
    pub fn is_curved(&self) -> bool {
        matches!(self, Shape::Circle(_) | Shape::Ellipse(_))
    }

    /// Geometric center in local space
    pub fn local_center(&self) -> DVec2 {
        match self {
            Shape::Polygon(p) => p.centroid(),
            Shape::Edge(e) => (e.start + e.end) * 0.5,
            _ => DVec2::ZERO,
        }
    }

    /// Farthest world-space point along `direction` and the feature index that produced it
    ///
    /// A zero direction is replaced by local +x so the query always answers.
    pub fn support(&self, transform: &Transform, direction: DVec2) -> SupportPoint {
        let mut local_dir = transform.inverse_rotate(direction);
        if local_dir.length_squared() < EPSILON * EPSILON {
            local_dir = DVec2::X;
        }

        let (local, index) = match self {
            Shape::Polygon(polygon) => {
                let mut best = 0;
                let mut best_dot = f64::NEG_INFINITY;
                for (i, v) in polygon.vertices().iter().enumerate() {
                    let d = v.dot(local_dir);
                    if d > best_dot {
                        best_dot = d;
                        best = i;
                    }
                }
                (polygon.vertex(best), best)
            }
            Shape::Edge(edge) => {
                if edge.start.dot(local_dir) >= edge.end.dot(local_dir) {
                    (edge.start, 0)
                } else {
                    (edge.end, 1)
                }
            }
            Shape::Capsule(capsule) => {
                let (start, end) = capsule.segment();
                let dir = local_dir.normalize();
                if end.dot(dir) >= start.dot(dir) {
                    (end + dir * capsule.radius(), 1)
                } else {
                    (start + dir * capsule.radius(), 0)
                }
            }
            Shape::Circle(circle) => (local_dir.normalize() * circle.radius, 0),
            Shape::Ellipse(ellipse) => {
                let a2 = ellipse.a * ellipse.a;
                let b2 = ellipse.b * ellipse.b;
                let denom = (a2 * local_dir.x * local_dir.x + b2 * local_dir.y * local_dir.y).sqrt();
                (
                    DVec2::new(a2 * local_dir.x, b2 * local_dir.y) / denom,
                    0,
                )
            }
        };

        SupportPoint {
            point: transform.apply(local),
            index,
        }
    }

    /// Tight world-space bounding box under `transform`
    pub fn aabb(&self, transform: &Transform) -> Aabb {
        match self {
            Shape::Polygon(polygon) => {
                Aabb::from_points(polygon.vertices().iter().map(|v| transform.apply(*v)))
                    .unwrap_or_else(|| Aabb::new(transform.position, 0.0, 0.0))
            }
            Shape::Edge(edge) => {
                Aabb::from_min_max(transform.apply(edge.start), transform.apply(edge.end))
            }
            Shape::Capsule(capsule) => {
                let (start, end) = capsule.segment();
                Aabb::from_min_max(transform.apply(start), transform.apply(end))
                    .expand(capsule.radius())
            }
            Shape::Circle(circle) => {
                Aabb::new(transform.position, circle.radius * 2.0, circle.radius * 2.0)
            }
            Shape::Ellipse(ellipse) => {
                let (sin, cos) = transform.rotation.sin_cos();
                let hx = (ellipse.a * ellipse.a * cos * cos + ellipse.b * ellipse.b * sin * sin).sqrt();
                let hy = (ellipse.a * ellipse.a * sin * sin + ellipse.b * ellipse.b * cos * cos).sqrt();
                Aabb::new(transform.position, hx * 2.0, hy * 2.0)
            }
        }
    }
}
