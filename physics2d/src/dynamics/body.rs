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
//! Rigid bodies and the set that owns them

use super::BodyState;
use crate::broadphase::ALL_LAYERS;
use crate::geometry::{Aabb, Shape};
use crate::math::{cross, DVec2, Transform};
use crate::object::ObjectId;
use std::collections::HashMap;

/// Body mass in kilograms
///
/// Zero or near-zero mass marks an immovable body, whose inverse mass is
/// zero so contact impulses never move it.
///
/// # Examples
///
/// ```
/// use physics2d::dynamics::Mass;
///
/// let mass = Mass::new(10.5);
/// assert!(!mass.is_immovable());
/// assert_eq!(Mass::immovable().inverse(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mass {
    value: f64,
}

impl Mass {
    /// Threshold below which mass is considered effectively zero (immovable)
    pub const IMMOVABLE_THRESHOLD: f64 = 1e-10;

    /// Create a new mass
    ///
    /// # Panics
    ///
    /// Panics if the mass is negative, NaN or infinite. For fallible
    /// construction, use `try_new`.
    pub fn new(value: f64) -> Self {
        assert!(value >= 0.0 && value.is_finite(), "Mass must be non-negative and finite");
        Mass { value }
    }

    /// Returns `None` if the value is negative or not finite
    pub fn try_new(value: f64) -> Option<Self> {
        if value >= 0.0 && value.is_finite() {
            Some(Mass { value })
        } else {
            None
        }
    }

    /// Infinite mass
    pub fn immovable() -> Self {
        Mass { value: 0.0 }
    }

    /// Mass value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether this is an immovable body (zero or near-zero mass)
    pub fn is_immovable(&self) -> bool {
        self.value < Self::IMMOVABLE_THRESHOLD
    }

    /// Inverse mass, zero for immovable bodies
    pub fn inverse(&self) -> f64 {
        if self.is_immovable() {
            0.0
        } else {
            1.0 / self.value
        }
    }
}

impl Default for Mass {
    fn default() -> Self {
        Mass::new(1.0)
    }
}

/// Moment of inertia per unit mass about the local origin
pub fn unit_inertia(shape: &Shape) -> f64 {
    match shape {
        Shape::Polygon(polygon) => {
            let mut area = 0.0;
            let mut second_moment = 0.0;
            let n = polygon.len();
            for i in 0..n {
                let e1 = polygon.vertex(i);
                let e2 = polygon.vertex(i + 1);
                let d = cross(e1, e2);
                area += 0.5 * d;
                second_moment += d * (e1.dot(e1) + e1.dot(e2) + e2.dot(e2)) / 12.0;
            }
            if area > 0.0 {
                second_moment / area
            } else {
                0.0
            }
        }
        Shape::Edge(edge) => {
            let mid = 0.5 * (edge.start + edge.end);
            edge.start.distance_squared(edge.end) / 12.0 + mid.length_squared()
        }
        Shape::Capsule(capsule) => {
            // Rectangle between the caps plus a full disc made of the two caps
            let r = capsule.radius();
            let len = 2.0 * capsule.half_segment();
            let rect_area = len * 2.0 * r;
            let disc_area = std::f64::consts::PI * r * r;
            let rect = rect_area * (len * len + 4.0 * r * r) / 12.0;
            let disc = disc_area * (0.5 * r * r + 0.25 * len * len);
            (rect + disc) / (rect_area + disc_area)
        }
        Shape::Circle(circle) => 0.5 * circle.radius * circle.radius,
        Shape::Ellipse(ellipse) => 0.25 * (ellipse.a * ellipse.a + ellipse.b * ellipse.b),
    }
}

/// A rigid body
///
/// The body origin is its center of mass and the shape is expressed around
/// it. Forces accumulate until the end of the next step.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// World position of the center of mass
    pub position: DVec2,
    /// Rotation in radians
    pub rotation: f64,
    /// Linear velocity
    pub velocity: DVec2,
    /// Angular velocity in radians per second
    pub angular_velocity: f64,
    /// Bounciness in `[0, 1]`
    pub restitution: f64,
    /// Coulomb friction coefficient
    pub friction: f64,
    /// Collision layer bits
    pub mask: u32,
    force: DVec2,
    torque: f64,
    mass: Mass,
    inverse_inertia: f64,
    shape: Shape,
}

impl Body {
    /// Movable body of the given mass
    pub fn new(shape: Shape, mass: Mass) -> Self {
        let inverse_inertia = Self::inverse_inertia_of(&shape, mass);
        Body {
            position: DVec2::ZERO,
            rotation: 0.0,
            velocity: DVec2::ZERO,
            angular_velocity: 0.0,
            restitution: 0.0,
            friction: 0.5,
            mask: ALL_LAYERS,
            force: DVec2::ZERO,
            torque: 0.0,
            mass,
            inverse_inertia,
            shape,
        }
    }

    /// Immovable body
    pub fn fixed(shape: Shape) -> Self {
        Self::new(shape, Mass::immovable())
    }

    fn inverse_inertia_of(shape: &Shape, mass: Mass) -> f64 {
        if mass.is_immovable() {
            return 0.0;
        }
        let inertia = mass.value() * unit_inertia(shape);
        if inertia > Mass::IMMOVABLE_THRESHOLD {
            1.0 / inertia
        } else {
            0.0
        }
    }

    /// Set the position
    pub fn with_position(mut self, position: DVec2) -> Self {
        self.position = position;
        self
    }

    /// Set the rotation
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the linear velocity
    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Set the restitution
    ///
    /// # Panics
    ///
    /// Panics if `restitution` is outside `[0, 1]`.
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        assert!((0.0..=1.0).contains(&restitution), "Restitution must be within [0, 1]");
        self.restitution = restitution;
        self
    }

    /// Set the friction coefficient
    ///
    /// # Panics
    ///
    /// Panics if `friction` is negative or not finite.
    pub fn with_friction(mut self, friction: f64) -> Self {
        assert!(friction >= 0.0 && friction.is_finite(), "Friction must be non-negative and finite");
        self.friction = friction;
        self
    }

    /// Set the collision layer bits
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Collision shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Mass
    pub fn mass(&self) -> Mass {
        self.mass
    }

    /// Change the mass, rescaling the inertia to match
    pub fn set_mass(&mut self, mass: Mass) {
        self.mass = mass;
        self.inverse_inertia = Self::inverse_inertia_of(&self.shape, mass);
    }

    /// Inverse mass
    pub fn inverse_mass(&self) -> f64 {
        self.mass.inverse()
    }

    /// Inverse moment of inertia
    pub fn inverse_inertia(&self) -> f64 {
        self.inverse_inertia
    }

    /// Whether contacts can move this body
    pub fn is_immovable(&self) -> bool {
        self.mass.is_immovable()
    }

    /// Pose
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    /// World bounding box of the shape
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(&self.transform())
    }

    /// Accumulated force
    pub fn force(&self) -> DVec2 {
        self.force
    }

    /// Accumulated torque
    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// Apply a force through the center of mass
    pub fn apply_force(&mut self, force: DVec2) {
        self.force += force;
    }

    /// Apply a force at a world point
    pub fn apply_force_at(&mut self, force: DVec2, point: DVec2) {
        self.force += force;
        self.torque += cross(point - self.position, force);
    }

    /// Apply a torque
    pub fn apply_torque(&mut self, torque: f64) {
        self.torque += torque;
    }

    /// Change velocity immediately by an impulse at a world point
    pub fn apply_impulse(&mut self, impulse: DVec2, point: DVec2) {
        self.velocity += impulse * self.inverse_mass();
        self.angular_velocity += self.inverse_inertia * cross(point - self.position, impulse);
    }

    /// Reset accumulated force and torque
    pub fn clear_forces(&mut self) {
        self.force = DVec2::ZERO;
        self.torque = 0.0;
    }

    /// Snapshot handed to the integrator and the contact solver
    pub fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            rotation: self.rotation,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            inverse_mass: self.inverse_mass(),
            inverse_inertia: self.inverse_inertia,
        }
    }

    /// Copy pose and velocity back from a solved state
    pub(crate) fn apply_state(&mut self, state: &BodyState) {
        self.position = state.position;
        self.rotation = state.rotation;
        self.velocity = state.velocity;
        self.angular_velocity = state.angular_velocity;
    }

    /// Linear plus rotational kinetic energy
    pub fn kinetic_energy(&self) -> f64 {
        if self.is_immovable() {
            return 0.0;
        }
        let linear = 0.5 * self.mass.value() * self.velocity.length_squared();
        let angular = if self.inverse_inertia > 0.0 {
            0.5 * self.angular_velocity * self.angular_velocity / self.inverse_inertia
        } else {
            0.0
        };
        linear + angular
    }
}

/// Dense storage of bodies addressed by [`ObjectId`]
///
/// Removal swaps the last body into the hole, so dense indices are only
/// stable between structural changes.
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    bodies: Vec<Body>,
    ids: Vec<ObjectId>,
    lookup: HashMap<ObjectId, usize>,
    next_id: u32,
}

impl BodySet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a body under a fresh id
    pub fn insert(&mut self, body: Body) -> ObjectId {
        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        self.lookup.insert(id, self.bodies.len());
        self.bodies.push(body);
        self.ids.push(id);
        id
    }

    /// Take a body out
    pub fn remove(&mut self, id: ObjectId) -> Option<Body> {
        let index = self.lookup.remove(&id)?;
        let body = self.bodies.swap_remove(index);
        self.ids.swap_remove(index);
        if let Some(moved) = self.ids.get(index) {
            self.lookup.insert(*moved, index);
        }
        Some(body)
    }

    /// Body by id
    pub fn get(&self, id: ObjectId) -> Option<&Body> {
        self.lookup.get(&id).map(|&i| &self.bodies[i])
    }

    /// Body by id, mutably
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Body> {
        self.lookup.get(&id).map(|&i| &mut self.bodies[i])
    }

    /// Dense index of an id
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.lookup.get(&id).copied()
    }

    /// Whether the id is live
    pub fn contains(&self, id: ObjectId) -> bool {
        self.lookup.contains_key(&id)
    }

    /// Bodies with their ids, in dense order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Body)> {
        self.ids.iter().copied().zip(self.bodies.iter())
    }

    /// Bodies with their ids, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut Body)> {
        self.ids.iter().copied().zip(self.bodies.iter_mut())
    }

    /// Ids in dense order
    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub(crate) fn as_slice(&self) -> &[Body] {
        &self.bodies
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
