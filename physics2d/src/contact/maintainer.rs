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
//! Store of live manifolds keyed by object pair
//!
//! A step opens with [`ContactMaintainer::begin_step`], reports every pair
//! that still touches through [`ContactMaintainer::refresh`], and closes with
//! [`ContactMaintainer::end_step`], which drops the manifolds nobody
//! refreshed. Iteration order is the sorted pair order, so solving is
//! reproducible run to run.

use super::manifold::ContactManifold;
use crate::math::Transform;
use crate::narrowphase::ContactPair;
use crate::object::{ObjectId, ObjectPair};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::trace;

/// Result of refreshing one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// A manifold was created for the pair
    Created,
    /// An existing manifold was updated; the count is how many points kept their impulses
    Updated(usize),
}

/// Owner of every live contact manifold
#[derive(Debug, Clone, Default)]
pub struct ContactMaintainer {
    manifolds: BTreeMap<ObjectPair, ContactManifold>,
    match_distance: f64,
}

impl ContactMaintainer {
    /// Empty store; points within `match_distance` of an old anchor inherit its impulses
    pub fn new(match_distance: f64) -> Self {
        ContactMaintainer {
            manifolds: BTreeMap::new(),
            match_distance,
        }
    }

    /// Mark every manifold as stale
    pub fn begin_step(&mut self) {
        for m in self.manifolds.values_mut() {
            m.touched = false;
        }
    }

    /// Record the current contacts of a touching pair
    ///
    /// `tf_a` must belong to `pair.a()`. Material coefficients only apply when
    /// the manifold is created.
    pub fn refresh(
        &mut self,
        pair: ObjectPair,
        contacts: &ContactPair,
        tf_a: &Transform,
        tf_b: &Transform,
        friction: f64,
        restitution: f64,
    ) -> Refresh {
        let match_distance = self.match_distance;
        match self.manifolds.entry(pair) {
            Entry::Occupied(mut slot) => {
                let matched = slot.get_mut().update(contacts, tf_a, tf_b, match_distance);
                Refresh::Updated(matched)
            }
            Entry::Vacant(slot) => {
                let m = slot.insert(ContactManifold::new(pair, friction, restitution));
                m.update(contacts, tf_a, tf_b, match_distance);
                Refresh::Created
            }
        }
    }

    /// Drop manifolds that were not refreshed since [`Self::begin_step`]
    ///
    /// Returns the pairs that stopped touching.
    pub fn end_step(&mut self) -> Vec<ObjectPair> {
        let stale: Vec<ObjectPair> = self
            .manifolds
            .iter()
            .filter(|(_, m)| !m.touched || m.is_empty())
            .map(|(pair, _)| *pair)
            .collect();
        for pair in &stale {
            self.manifolds.remove(pair);
        }
        if !stale.is_empty() {
            trace!(dropped = stale.len(), "contact pairs separated");
        }
        stale
    }

    /// Drop every manifold involving `id`, returning the affected pairs
    pub fn remove_object(&mut self, id: ObjectId) -> Vec<ObjectPair> {
        let gone: Vec<ObjectPair> = self.manifolds.keys().filter(|p| p.contains(id)).copied().collect();
        for pair in &gone {
            self.manifolds.remove(pair);
        }
        gone
    }

    /// Manifold of a pair
    pub fn get(&self, pair: &ObjectPair) -> Option<&ContactManifold> {
        self.manifolds.get(pair)
    }

    /// Manifold of a pair, mutably
    pub fn get_mut(&mut self, pair: &ObjectPair) -> Option<&mut ContactManifold> {
        self.manifolds.get_mut(pair)
    }

    /// Manifolds in pair order
    pub fn iter(&self) -> impl Iterator<Item = &ContactManifold> {
        self.manifolds.values()
    }

    /// Manifolds in pair order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ContactManifold> {
        self.manifolds.values_mut()
    }

    /// Number of live manifolds
    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    /// Whether no pair is touching
    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.manifolds.clear();
    }
}
