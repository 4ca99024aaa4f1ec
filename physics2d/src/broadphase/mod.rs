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
//! Broadphase collision culling
//!
//! A broadphase keeps a live set of [`ObjectBinding`]s and answers three
//! questions cheaply: which pairs of bindings have overlapping boxes, which
//! bindings touch a region, and which bindings a ray passes through.
//!
//! Two interchangeable structures implement [`Broadphase`]:
//!
//! - [`Dbvt`]: a height-balanced tree of fattened boxes
//! - [`UniformGrid`]: a sparse hash of fixed-size cells
//!
//! Both follow the same contract:
//! - pairs are canonical `(min, max)` and the list is sorted ascending
//! - overlap is inclusive (touching boxes overlap)
//! - a pair is only reported when the two collision masks share a bit
//! - ray hits are ordered by entry distance, ties by id

mod dbvt;
mod grid;

pub use dbvt::{Dbvt, TreeInvariantError, NULL_NODE};
pub use grid::UniformGrid;

use crate::config::BroadphaseConfig;
use crate::geometry::Aabb;
use crate::math::DVec2;
use crate::object::{ObjectId, ObjectPair};

/// Mask that collides with everything
pub const ALL_LAYERS: u32 = u32::MAX;

/// One object as the broadphase sees it
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectBinding<P> {
    /// Stable external id
    pub id: ObjectId,
    /// Collision layer bits; pairs with disjoint masks are never reported
    pub mask: u32,
    /// Tight bounding box
    pub aabb: Aabb,
    /// Caller data carried alongside the box
    pub payload: P,
}

impl<P> ObjectBinding<P> {
    /// Create a binding
    pub fn new(id: ObjectId, mask: u32, aabb: Aabb, payload: P) -> Self {
        ObjectBinding {
            id,
            mask,
            aabb,
            payload,
        }
    }

    /// Whether two bindings may be reported as a pair
    #[inline]
    pub fn interacts_with(&self, other: &ObjectBinding<P>) -> bool {
        self.mask & other.mask != 0 && self.aabb.collide(&other.aabb)
    }
}

/// Common interface of the spatial structures
pub trait Broadphase<P> {
    /// Insert a binding
    ///
    /// # Panics
    ///
    /// Panics if a binding with the same id is already present.
    fn add_object(&mut self, binding: ObjectBinding<P>);

    /// Remove a binding, returning it; unknown ids are ignored
    fn remove_object(&mut self, id: ObjectId) -> Option<ObjectBinding<P>>;

    /// Replace the box of a binding; unknown ids are ignored
    fn update_object(&mut self, id: ObjectId, aabb: Aabb);

    /// All overlapping pairs, canonical and sorted
    fn query_overlaps(&self) -> Vec<ObjectPair>;

    /// Ids whose boxes touch `region`, sorted
    fn query_aabb(&self, region: &Aabb) -> Vec<ObjectId>;

    /// Ids whose boxes the ray enters within `max_distance`, nearest first
    fn query_ray(&self, origin: DVec2, direction: DVec2, max_distance: f64) -> Vec<ObjectId>;

    /// Restore query performance after many incremental edits
    fn rebuild(&mut self);

    /// Number of bindings
    fn len(&self) -> usize;

    /// Whether there are no bindings
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` is present
    fn contains(&self, id: ObjectId) -> bool;

    /// The stored binding for `id`
    fn binding(&self, id: ObjectId) -> Option<&ObjectBinding<P>>;

    /// Remove every binding
    fn clear(&mut self);
}

/// Build the broadphase selected by `config`
pub fn from_config<P: 'static>(config: &BroadphaseConfig) -> Box<dyn Broadphase<P>> {
    match *config {
        BroadphaseConfig::Dbvt { margin } => Box::new(Dbvt::new(margin)),
        BroadphaseConfig::Grid {
            cell_width,
            cell_height,
        } => Box::new(UniformGrid::new(cell_width, cell_height)),
    }
}

/// Sort `(distance, id)` ray hits and strip the distances
pub(crate) fn order_ray_hits(mut hits: Vec<(f64, ObjectId)>) -> Vec<ObjectId> {
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    hits.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_filter() {
        let a = ObjectBinding::new(ObjectId::new(0), 0b01, Aabb::new(DVec2::ZERO, 1.0, 1.0), ());
        let b = ObjectBinding::new(ObjectId::new(1), 0b10, Aabb::new(DVec2::ZERO, 1.0, 1.0), ());
        let c = ObjectBinding::new(ObjectId::new(2), 0b11, Aabb::new(DVec2::ZERO, 1.0, 1.0), ());
        assert!(!a.interacts_with(&b));
        assert!(a.interacts_with(&c));
        assert!(b.interacts_with(&c));
    }

    #[test]
    fn test_from_config_selects_structure() {
        for config in [BroadphaseConfig::default(), BroadphaseConfig::grid(1.0)] {
            let mut bp = from_config::<()>(&config);
            bp.add_object(ObjectBinding::new(
                ObjectId::new(3),
                ALL_LAYERS,
                Aabb::new(DVec2::ZERO, 1.0, 1.0),
                (),
            ));
            assert!(bp.contains(ObjectId::new(3)));
            assert_eq!(bp.len(), 1);
        }
    }

    #[test]
    fn test_ray_hit_order() {
        let ids = order_ray_hits(vec![
            (2.0, ObjectId::new(1)),
            (1.0, ObjectId::new(5)),
            (1.0, ObjectId::new(4)),
        ]);
        assert_eq!(ids, vec![ObjectId::new(4), ObjectId::new(5), ObjectId::new(1)]);
    }
}
