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
//! Contact point generation by edge clipping
//!
//! Given a penetration normal, each shape offers the feature most aligned
//! with it: an edge for polygons, segments and the flat sides of capsules,
//! a single point for curved boundaries and capsule caps. Two edges are
//! clipped against each other; anything involving a point yields one
//! contact.

use super::{CollisionInfo, ShapePrimitive};
use crate::config::NarrowphaseConfig;
use crate::geometry::Shape;
use crate::math::{line_intersection, DVec2};
use std::fmt;

/// How far a capsule support point may sit past the inner segment and still count as the flat side
const FLAT_SIDE_TOLERANCE: f64 = 1e-3;

/// Vertex or edge of one shape taking part in a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactFeature {
    /// A vertex, by index
    Vertex(u32),
    /// An edge, by index of its first vertex
    Edge(u32),
}

impl ContactFeature {
    const EDGE_TAG: u32 = 1 << 31;

    /// Tag bit in the high position, index below
    pub fn pack(self) -> u32 {
        match self {
            ContactFeature::Vertex(i) => i & !Self::EDGE_TAG,
            ContactFeature::Edge(i) => (i & !Self::EDGE_TAG) | Self::EDGE_TAG,
        }
    }

    /// Inverse of [`ContactFeature::pack`]
    pub fn unpack(bits: u32) -> Self {
        if bits & Self::EDGE_TAG != 0 {
            ContactFeature::Edge(bits & !Self::EDGE_TAG)
        } else {
            ContactFeature::Vertex(bits)
        }
    }
}

/// Pair of features, one per shape, packed into 64 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FeatureId(pub u64);

impl FeatureId {
    /// Pack A's feature into the high half and B's into the low half
    pub fn new(a: ContactFeature, b: ContactFeature) -> Self {
        FeatureId(((a.pack() as u64) << 32) | b.pack() as u64)
    }

    /// Feature on shape A
    pub fn feature_a(self) -> ContactFeature {
        ContactFeature::unpack((self.0 >> 32) as u32)
    }

    /// Feature on shape B
    pub fn feature_b(self) -> ContactFeature {
        ContactFeature::unpack(self.0 as u32)
    }

    /// Same features with the shape roles exchanged
    pub fn swapped(self) -> Self {
        FeatureId::new(self.feature_b(), self.feature_a())
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.feature_a(), self.feature_b())
    }
}

/// One contact point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactPoint {
    /// World point on A
    pub point_a: DVec2,
    /// World point on B
    pub point_b: DVec2,
    /// Penetration at this point (positive when overlapping)
    pub depth: f64,
    /// Features that produced the point
    pub id: FeatureId,
}

/// Up to two contact points sharing one normal
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactPair {
    /// Unit normal from A toward B
    pub normal: DVec2,
    points: [ContactPoint; 2],
    count: usize,
}

impl ContactPair {
    /// Empty set of contacts along `normal`
    pub fn new(normal: DVec2) -> Self {
        ContactPair {
            normal,
            ..Default::default()
        }
    }

    /// Append a point; a third point is ignored
    pub fn push(&mut self, point: ContactPoint) {
        if self.count < 2 {
            self.points[self.count] = point;
            self.count += 1;
        }
    }

    /// Live points
    pub fn points(&self) -> &[ContactPoint] {
        &self.points[..self.count]
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether there are no points
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Edge offered for clipping, in world space
#[derive(Debug, Clone, Copy)]
struct ClipEdge {
    v1: DVec2,
    v2: DVec2,
    i1: u32,
    i2: u32,
    index: u32,
}

impl ClipEdge {
    fn direction(&self) -> DVec2 {
        (self.v2 - self.v1).normalize_or_zero()
    }
}

/// Feature of one shape facing a direction
#[derive(Debug, Clone, Copy)]
enum Facing {
    Edge(ClipEdge),
    Point(DVec2, u32),
}

fn facing_feature(prim: &ShapePrimitive<'_>, direction: DVec2) -> Facing {
    let tf = &prim.transform;
    match prim.shape {
        Shape::Polygon(polygon) => {
            let local_dir = tf.inverse_rotate(direction);
            let n = polygon.len();
            let mut best = 0;
            let mut best_dot = f64::NEG_INFINITY;
            for (i, v) in polygon.vertices().iter().enumerate() {
                let d = v.dot(local_dir);
                if d > best_dot {
                    best_dot = d;
                    best = i;
                }
            }
            let prev = (best + n - 1) % n;
            let next = (best + 1) % n;
            let v = polygon.vertex(best);
            let to_next = (polygon.vertex(next) - v).normalize_or_zero();
            let from_prev = (v - polygon.vertex(prev)).normalize_or_zero();

            // The edge more perpendicular to the direction faces it
            let (start, end) = if from_prev.dot(local_dir).abs() <= to_next.dot(local_dir).abs() {
                (prev, best)
            } else {
                (best, next)
            };
            Facing::Edge(ClipEdge {
                v1: tf.apply(polygon.vertex(start)),
                v2: tf.apply(polygon.vertex(end)),
                i1: start as u32,
                i2: end as u32,
                index: start as u32,
            })
        }
        Shape::Edge(edge) => Facing::Edge(ClipEdge {
            v1: tf.apply(edge.start),
            v2: tf.apply(edge.end),
            i1: 0,
            i2: 1,
            index: 0,
        }),
        Shape::Capsule(capsule) => {
            let support = prim.shape.support(tf, direction);
            let local = tf.inverse_apply(support.point);
            let axis = capsule.axis();
            if local.dot(axis).abs() <= capsule.half_segment() + FLAT_SIDE_TOLERANCE {
                let (s1, s2) = capsule.segment();
                let mut side = axis.perp();
                let mut side_index = 0;
                if side.dot(tf.inverse_rotate(direction)) < 0.0 {
                    side = -side;
                    side_index = 1;
                }
                let offset = side * capsule.radius();
                Facing::Edge(ClipEdge {
                    v1: tf.apply(s1 + offset),
                    v2: tf.apply(s2 + offset),
                    i1: 2 * side_index,
                    i2: 2 * side_index + 1,
                    index: side_index,
                })
            } else {
                Facing::Point(support.point, support.index as u32)
            }
        }
        Shape::Circle(_) | Shape::Ellipse(_) => {
            let support = prim.shape.support(tf, direction);
            Facing::Point(support.point, support.index as u32)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    point: DVec2,
    feature: ContactFeature,
    reference: Option<u32>,
}

/// Keep the part of segment `(a, b)` where `normal · p >= offset`
///
/// `plane_point` is a point on the clipping line used for the intersection.
fn clip_segment(
    a: ClipVertex,
    b: ClipVertex,
    normal: DVec2,
    offset: f64,
    plane_point: DVec2,
    reference_vertex: u32,
    incident_edge: u32,
) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(2);
    let da = normal.dot(a.point) - offset;
    let db = normal.dot(b.point) - offset;
    if da >= 0.0 {
        out.push(a);
    }
    if db >= 0.0 {
        out.push(b);
    }
    if da * db < 0.0 {
        let point = line_intersection(a.point, b.point, plane_point, plane_point + normal.perp())
            .unwrap_or_else(|| a.point + (b.point - a.point) * (da / (da - db)));
        out.push(ClipVertex {
            point,
            feature: ContactFeature::Edge(incident_edge),
            reference: Some(reference_vertex),
        });
    }
    out
}

/// Single point taken from the deepest support of whichever side offers one
fn single_point(info: &CollisionInfo, a: &ShapePrimitive<'_>, b: &ShapePrimitive<'_>, prefer_a: bool) -> ContactPair {
    let n = info.normal;
    let mut pair = ContactPair::new(n);
    if prefer_a {
        let (pa, ia) = a.support(n);
        pair.push(ContactPoint {
            point_a: pa,
            point_b: pa - n * info.depth,
            depth: info.depth,
            id: FeatureId::new(ContactFeature::Vertex(ia as u32), ContactFeature::Vertex(0)),
        });
    } else {
        let (pb, ib) = b.support(-n);
        pair.push(ContactPoint {
            point_a: pb + n * info.depth,
            point_b: pb,
            depth: info.depth,
            id: FeatureId::new(ContactFeature::Vertex(0), ContactFeature::Vertex(ib as u32)),
        });
    }
    pair
}

/// Contact points for an overlapping pair
///
/// Returns an empty set when `info` carries no usable normal. Otherwise at
/// most two points, each tagged with the features that produced it so the
/// solver can recognize the same point next step.
pub fn generate_contacts(
    info: &CollisionInfo,
    a: &ShapePrimitive<'_>,
    b: &ShapePrimitive<'_>,
    config: &NarrowphaseConfig,
) -> ContactPair {
    if !info.has_contact() {
        return ContactPair::new(info.normal);
    }
    let n = info.normal;

    let (edge_a, edge_b) = match (facing_feature(a, n), facing_feature(b, -n)) {
        (Facing::Point(..), _) => return single_point(info, a, b, true),
        (_, Facing::Point(..)) => return single_point(info, a, b, false),
        (Facing::Edge(ea), Facing::Edge(eb)) => (ea, eb),
    };

    // Reference edge is the one more perpendicular to the normal; ties go to A
    let flip = edge_b.direction().dot(n).abs() < edge_a.direction().dot(n).abs();
    let (reference, incident, ref_normal) = if flip {
        (edge_b, edge_a, -n)
    } else {
        (edge_a, edge_b, n)
    };

    let ref_dir = reference.direction();
    let start = ClipVertex {
        point: incident.v1,
        feature: ContactFeature::Vertex(incident.i1),
        reference: None,
    };
    let end = ClipVertex {
        point: incident.v2,
        feature: ContactFeature::Vertex(incident.i2),
        reference: None,
    };

    let mut clipped = clip_segment(
        start,
        end,
        ref_dir,
        ref_dir.dot(reference.v1),
        reference.v1,
        reference.i1,
        incident.index,
    );
    if clipped.len() == 2 {
        clipped = clip_segment(
            clipped[0],
            clipped[1],
            -ref_dir,
            -ref_dir.dot(reference.v2),
            reference.v2,
            reference.i2,
            incident.index,
        );
    }

    // Face normal of the reference edge, oriented toward the incident shape
    let mut face_normal = ref_dir.perp();
    if face_normal.dot(ref_normal) < 0.0 {
        face_normal = -face_normal;
    }
    let face_offset = face_normal.dot(reference.v1);

    let mut pair = ContactPair::new(n);
    if clipped.len() == 2 {
        for vertex in &clipped {
            let separation = face_normal.dot(vertex.point) - face_offset;
            if separation > config.clip_tolerance {
                continue;
            }
            let on_reference = vertex.point - face_normal * separation;
            let reference_feature = match vertex.reference {
                Some(i) => ContactFeature::Vertex(i),
                None => ContactFeature::Edge(reference.index),
            };
            let (point_a, point_b, id) = if flip {
                (
                    vertex.point,
                    on_reference,
                    FeatureId::new(vertex.feature, reference_feature),
                )
            } else {
                (
                    on_reference,
                    vertex.point,
                    FeatureId::new(reference_feature, vertex.feature),
                )
            };
            pair.push(ContactPoint {
                point_a,
                point_b,
                depth: -separation,
                id,
            });
        }
    }

    if pair.is_empty() {
        tracing::trace!("clipping produced no points, using the deepest support");
        return single_point(info, a, b, true);
    }
    pair
}
