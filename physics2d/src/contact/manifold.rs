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
//! Persistent contact manifold for one object pair

use crate::math::{DMat2, DVec2, Transform};
use crate::narrowphase::{ContactPair, FeatureId};
use crate::object::ObjectPair;

/// One contact point and the solver state it carries between steps
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SingleContact {
    /// Contact point on A in A's local frame
    pub local_anchor_a: DVec2,
    /// Contact point on B in B's local frame
    pub local_anchor_b: DVec2,
    /// World offset from A's center to the contact, refreshed in prepare
    pub r_a: DVec2,
    /// World offset from B's center to the contact, refreshed in prepare
    pub r_b: DVec2,
    /// Penetration reported by the narrowphase
    pub depth: f64,
    /// Features that produced this point
    pub id: FeatureId,
    /// Accumulated normal impulse
    pub normal_impulse: f64,
    /// Accumulated friction impulse
    pub tangent_impulse: f64,
    /// Inverse effective mass along the normal
    pub normal_mass: f64,
    /// Inverse effective mass along the tangent
    pub tangent_mass: f64,
    /// Restitution target for the normal velocity
    pub velocity_bias: f64,
}

impl SingleContact {
    fn from_point(point: &crate::narrowphase::ContactPoint, tf_a: &Transform, tf_b: &Transform) -> Self {
        SingleContact {
            local_anchor_a: tf_a.inverse_apply(point.point_a),
            local_anchor_b: tf_b.inverse_apply(point.point_b),
            depth: point.depth,
            id: point.id,
            ..Default::default()
        }
    }
}

/// Contact state of one touching pair
///
/// Body A is always `pair.a()`, the smaller id, and the normal points from A
/// toward B. A manifold holds at most two points; with two points and the
/// block solver enabled, `k` couples them and `normal_mass_matrix` is its
/// inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactManifold {
    /// Bodies involved
    pub pair: ObjectPair,
    /// Unit normal from A toward B
    pub normal: DVec2,
    /// Unit tangent, the normal rotated a quarter turn clockwise
    pub tangent: DVec2,
    /// Deepest penetration among the points
    pub penetration: f64,
    /// Mixed friction coefficient
    pub friction: f64,
    /// Mixed restitution coefficient
    pub restitution: f64,
    /// Two-point coupling matrix
    pub k: DMat2,
    /// Inverse of `k`
    pub normal_mass_matrix: DMat2,
    /// Whether the two points are solved together this step
    pub block: bool,
    contacts: [SingleContact; 2],
    count: usize,
    pub(crate) index_a: usize,
    pub(crate) index_b: usize,
    pub(crate) touched: bool,
}

/// Geometric mean, so a frictionless surface stays frictionless
pub fn mix_friction(a: f64, b: f64) -> f64 {
    (a * b).sqrt()
}

/// The bouncier surface wins
pub fn mix_restitution(a: f64, b: f64) -> f64 {
    a.max(b)
}

impl ContactManifold {
    /// Empty manifold for `pair`
    pub fn new(pair: ObjectPair, friction: f64, restitution: f64) -> Self {
        ContactManifold {
            pair,
            normal: DVec2::ZERO,
            tangent: DVec2::ZERO,
            penetration: 0.0,
            friction,
            restitution,
            k: DMat2::ZERO,
            normal_mass_matrix: DMat2::ZERO,
            block: false,
            contacts: [SingleContact::default(); 2],
            count: 0,
            index_a: 0,
            index_b: 0,
            touched: true,
        }
    }

    /// Live contact points
    pub fn contacts(&self) -> &[SingleContact] {
        &self.contacts[..self.count]
    }

    /// Live contact points, mutably
    pub fn contacts_mut(&mut self) -> &mut [SingleContact] {
        &mut self.contacts[..self.count]
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the manifold has no points
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Replace the points with a fresh narrowphase result
    ///
    /// Each new point inherits the accumulated impulses of the old point with
    /// the same feature id or, failing that, of the old point whose local
    /// anchor on A lies within `match_distance`. Unmatched points start at
    /// zero. Returns how many points were matched.
    pub fn update(
        &mut self,
        contacts: &ContactPair,
        tf_a: &Transform,
        tf_b: &Transform,
        match_distance: f64,
    ) -> usize {
        let old = self.contacts;
        let old_count = self.count;
        let mut claimed = [false; 2];
        let mut matched = 0;

        self.normal = contacts.normal;
        self.tangent = DVec2::new(contacts.normal.y, -contacts.normal.x);
        self.count = 0;
        self.penetration = 0.0;
        self.block = false;

        for point in contacts.points() {
            let mut fresh = SingleContact::from_point(point, tf_a, tf_b);

            let by_id = (0..old_count).find(|&j| !claimed[j] && old[j].id == fresh.id);
            let by_anchor = || {
                (0..old_count).find(|&j| {
                    !claimed[j] && old[j].local_anchor_a.distance(fresh.local_anchor_a) <= match_distance
                })
            };
            if let Some(j) = by_id.or_else(by_anchor) {
                claimed[j] = true;
                fresh.normal_impulse = old[j].normal_impulse;
                fresh.tangent_impulse = old[j].tangent_impulse;
                matched += 1;
            }

            self.penetration = self.penetration.max(fresh.depth);
            self.contacts[self.count] = fresh;
            self.count += 1;
        }
        self.touched = true;
        matched
    }

    /// Zero every accumulated impulse
    pub fn reset_impulses(&mut self) {
        for c in self.contacts_mut() {
            c.normal_impulse = 0.0;
            c.tangent_impulse = 0.0;
        }
    }

    /// Sum of normal impulses applied to B
    pub fn total_normal_impulse(&self) -> f64 {
        self.contacts().iter().map(|c| c.normal_impulse).sum()
    }
}
