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
//! Dynamic bounding volume tree
//!
//! Nodes live in an arena and link to each other by index, with
//! [`NULL_NODE`] standing in for a missing link. Leaves store a fattened copy
//! of their binding's box so small motions do not touch the tree at all.
//!
//! Insertion walks down choosing the child whose box grows least (perimeter
//! cost, ties broken by centroid distance) and then walks back up applying
//! single rotations wherever the child heights differ by more than one.

use super::{order_ray_hits, Broadphase, ObjectBinding};
use crate::geometry::Aabb;
use crate::math::{DVec2, EPSILON};
use crate::object::{ObjectId, ObjectPair};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Sentinel index for a missing parent or child link
pub const NULL_NODE: usize = usize::MAX;

const SAH_BUCKETS: usize = 12;
const BOUNDS_TOLERANCE: f64 = 1e-9;

/// Structural problem found by [`Dbvt::check_invariants`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeInvariantError {
    /// A child does not point back at its parent
    #[error("node {node} has a broken parent link")]
    BrokenParentLink {
        /// Offending node
        node: usize,
    },

    /// An internal node is missing one of its children
    #[error("internal node {node} is missing a child")]
    MissingChild {
        /// Offending node
        node: usize,
    },

    /// Height is not one more than the taller child
    #[error("node {node} has height {found}, expected {expected}")]
    WrongHeight {
        /// Offending node
        node: usize,
        /// Height implied by the children
        expected: usize,
        /// Height stored on the node
        found: usize,
    },

    /// Box is not the union of the children's boxes
    #[error("node {node} box is not the union of its children")]
    WrongBounds {
        /// Offending node
        node: usize,
    },

    /// Leaf and binding slot disagree, or the fat box does not hold the binding
    #[error("leaf node {node} does not match its binding")]
    BadLeaf {
        /// Offending node
        node: usize,
    },

    /// Number of leaves reachable from the root differs from the binding count
    #[error("tree holds {found} leaves but {expected} bindings are registered")]
    LeafCount {
        /// Registered bindings
        expected: usize,
        /// Leaves reachable from the root
        found: usize,
    },
}

#[derive(Debug, Clone)]
struct Node {
    aabb: Aabb,
    parent: usize,
    left: usize,
    right: usize,
    height: usize,
    slot: usize,
}

impl Node {
    fn leaf(aabb: Aabb, slot: usize) -> Self {
        Node {
            aabb,
            parent: NULL_NODE,
            left: NULL_NODE,
            right: NULL_NODE,
            height: 0,
            slot,
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left == NULL_NODE
    }
}

#[derive(Debug, Clone)]
struct Leaf<P> {
    binding: ObjectBinding<P>,
    node: usize,
}

/// Dynamic bounding volume tree broadphase
///
/// # Examples
///
/// ```
/// use physics2d::broadphase::{Broadphase, Dbvt, ObjectBinding, ALL_LAYERS};
/// use physics2d::geometry::Aabb;
/// use physics2d::math::DVec2;
/// use physics2d::object::ObjectId;
///
/// let mut tree = Dbvt::new(0.1);
/// tree.add_object(ObjectBinding::new(ObjectId::new(0), ALL_LAYERS, Aabb::new(DVec2::ZERO, 1.0, 1.0), ()));
/// tree.add_object(ObjectBinding::new(ObjectId::new(1), ALL_LAYERS, Aabb::new(DVec2::new(0.5, 0.0), 1.0, 1.0), ()));
/// assert_eq!(tree.query_overlaps().len(), 1);
/// assert!(tree.check_invariants().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Dbvt<P> {
    nodes: Vec<Node>,
    free_nodes: Vec<usize>,
    leaves: Vec<Option<Leaf<P>>>,
    free_leaves: Vec<usize>,
    lookup: HashMap<ObjectId, usize>,
    root: usize,
    margin: f64,
    only_insert: bool,
}

impl<P> Dbvt<P> {
    /// Create an empty tree whose leaves are grown by `margin`
    pub fn new(margin: f64) -> Self {
        assert!(
            margin >= 0.0 && margin.is_finite(),
            "DBVT margin must be non-negative and finite"
        );
        Dbvt {
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            leaves: Vec::new(),
            free_leaves: Vec::new(),
            lookup: HashMap::new(),
            root: NULL_NODE,
            margin,
            only_insert: false,
        }
    }

    /// Leaf fattening margin
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Make [`Broadphase::update_object`] remove and reinsert instead of refitting
    pub fn set_only_insert(&mut self, only_insert: bool) {
        self.only_insert = only_insert;
    }

    /// Whether updates currently reinsert
    pub fn only_insert(&self) -> bool {
        self.only_insert
    }

    /// Height of the root (zero for a single leaf or an empty tree)
    pub fn height(&self) -> usize {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root].height
        }
    }

    /// Fattened box stored on the leaf of `id`
    pub fn fat_aabb(&self, id: ObjectId) -> Option<Aabb> {
        let slot = *self.lookup.get(&id)?;
        let leaf = self.leaves[slot].as_ref()?;
        Some(self.nodes[leaf.node].aabb)
    }

    /// Largest child height difference over all internal nodes
    pub fn max_balance(&self) -> usize {
        self.live_nodes()
            .into_iter()
            .filter(|&n| !self.nodes[n].is_leaf())
            .map(|n| {
                let node = &self.nodes[n];
                self.nodes[node.left].height.abs_diff(self.nodes[node.right].height)
            })
            .max()
            .unwrap_or(0)
    }

    fn allocate_node(&mut self, node: Node) -> usize {
        if let Some(index) = self.free_nodes.pop() {
            self.nodes[index] = node;
            index
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn free_node(&mut self, index: usize) {
        let node = &mut self.nodes[index];
        node.parent = NULL_NODE;
        node.left = NULL_NODE;
        node.right = NULL_NODE;
        node.slot = NULL_NODE;
        node.height = 0;
        self.free_nodes.push(index);
    }

    fn live_nodes(&self) -> Vec<usize> {
        let mut out = Vec::new();
        if self.root == NULL_NODE {
            return out;
        }
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            out.push(index);
            let node = &self.nodes[index];
            if !node.is_leaf() {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        out
    }

    /// Cost of pushing a leaf with box `leaf_aabb` down into `child`
    fn descend_cost(&self, child: usize, leaf_aabb: &Aabb, inheritance: f64) -> f64 {
        let node = &self.nodes[child];
        let combined = Aabb::combine(leaf_aabb, &node.aabb).surface_area();
        if node.is_leaf() {
            combined + inheritance
        } else {
            combined - node.aabb.surface_area() + inheritance
        }
    }

    fn insert_leaf(&mut self, leaf: usize) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf].parent = NULL_NODE;
            return;
        }

        let leaf_aabb = self.nodes[leaf].aabb;
        let mut index = self.root;
        while !self.nodes[index].is_leaf() {
            let node = &self.nodes[index];
            let (left, right) = (node.left, node.right);
            let area = node.aabb.surface_area();
            let combined = Aabb::combine(&node.aabb, &leaf_aabb).surface_area();

            // Cost of making a new parent here versus pushing further down
            let cost = 2.0 * combined;
            let inheritance = 2.0 * (combined - area);
            let cost_left = self.descend_cost(left, &leaf_aabb, inheritance);
            let cost_right = self.descend_cost(right, &leaf_aabb, inheritance);

            if cost < cost_left && cost < cost_right {
                break;
            }

            index = if (cost_left - cost_right).abs() <= EPSILON {
                let to_left = self.nodes[left].aabb.position.distance_squared(leaf_aabb.position);
                let to_right = self.nodes[right].aabb.position.distance_squared(leaf_aabb.position);
                if to_left <= to_right {
                    left
                } else {
                    right
                }
            } else if cost_left < cost_right {
                left
            } else {
                right
            };
        }

        let sibling = index;
        let old_parent = self.nodes[sibling].parent;
        let new_parent = self.allocate_node(Node {
            aabb: Aabb::combine(&leaf_aabb, &self.nodes[sibling].aabb),
            parent: old_parent,
            left: sibling,
            right: leaf,
            height: self.nodes[sibling].height + 1,
            slot: NULL_NODE,
        });

        if old_parent == NULL_NODE {
            self.root = new_parent;
        } else if self.nodes[old_parent].left == sibling {
            self.nodes[old_parent].left = new_parent;
        } else {
            self.nodes[old_parent].right = new_parent;
        }
        self.nodes[sibling].parent = new_parent;
        self.nodes[leaf].parent = new_parent;

        self.fix_upwards(new_parent);
    }

    fn remove_leaf(&mut self, leaf: usize) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf].parent;
        let grand_parent = self.nodes[parent].parent;
        let sibling = if self.nodes[parent].left == leaf {
            self.nodes[parent].right
        } else {
            self.nodes[parent].left
        };

        if grand_parent == NULL_NODE {
            self.root = sibling;
            self.nodes[sibling].parent = NULL_NODE;
            self.free_node(parent);
        } else {
            if self.nodes[grand_parent].left == parent {
                self.nodes[grand_parent].left = sibling;
            } else {
                self.nodes[grand_parent].right = sibling;
            }
            self.nodes[sibling].parent = grand_parent;
            self.free_node(parent);
            self.fix_upwards(grand_parent);
        }
        self.nodes[leaf].parent = NULL_NODE;
    }

    /// Rebalance and refit every ancestor starting at `index`
    fn fix_upwards(&mut self, mut index: usize) {
        while index != NULL_NODE {
            index = self.balance(index);
            self.refit(index);
            index = self.nodes[index].parent;
        }
    }

    fn refit(&mut self, index: usize) {
        let (left, right) = (self.nodes[index].left, self.nodes[index].right);
        let height = 1 + self.nodes[left].height.max(self.nodes[right].height);
        let aabb = Aabb::combine(&self.nodes[left].aabb, &self.nodes[right].aabb);
        let node = &mut self.nodes[index];
        node.height = height;
        node.aabb = aabb;
    }

    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if parent == NULL_NODE {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    /// Single rotation at `a` when its subtrees differ in height by more than one
    ///
    /// Returns the index now occupying `a`'s position.
    fn balance(&mut self, a: usize) -> usize {
        if self.nodes[a].is_leaf() || self.nodes[a].height < 2 {
            return a;
        }

        let b = self.nodes[a].left;
        let c = self.nodes[a].right;
        let balance = self.nodes[c].height as isize - self.nodes[b].height as isize;

        if balance > 1 {
            // Promote c
            let f = self.nodes[c].left;
            let g = self.nodes[c].right;
            let a_parent = self.nodes[a].parent;

            self.nodes[c].left = a;
            self.nodes[c].parent = a_parent;
            self.nodes[a].parent = c;
            self.replace_child(a_parent, a, c);

            let (keep, give) = if self.nodes[f].height > self.nodes[g].height {
                (f, g)
            } else {
                (g, f)
            };
            self.nodes[c].right = keep;
            self.nodes[a].right = give;
            self.nodes[give].parent = a;
            self.refit(a);
            self.refit(c);
            return c;
        }

        if balance < -1 {
            // Promote b
            let d = self.nodes[b].left;
            let e = self.nodes[b].right;
            let a_parent = self.nodes[a].parent;

            self.nodes[b].left = a;
            self.nodes[b].parent = a_parent;
            self.nodes[a].parent = b;
            self.replace_child(a_parent, a, b);

            let (keep, give) = if self.nodes[d].height > self.nodes[e].height {
                (d, e)
            } else {
                (e, d)
            };
            self.nodes[b].right = keep;
            self.nodes[a].left = give;
            self.nodes[give].parent = a;
            self.refit(a);
            self.refit(b);
            return b;
        }

        a
    }

    fn binding_of(&self, node: usize) -> Option<&ObjectBinding<P>> {
        self.leaves
            .get(self.nodes[node].slot)
            .and_then(|leaf| leaf.as_ref())
            .map(|leaf| &leaf.binding)
    }

    /// Rebuild the whole tree top-down with a bucketed surface-area heuristic
    pub fn rebuild_tree(&mut self) {
        let live = self.live_nodes();
        let mut leaves = Vec::with_capacity(self.lookup.len());
        for index in live {
            if self.nodes[index].is_leaf() {
                self.nodes[index].parent = NULL_NODE;
                leaves.push(index);
            } else {
                self.free_node(index);
            }
        }

        self.root = if leaves.is_empty() {
            NULL_NODE
        } else {
            self.build_range(&mut leaves)
        };
        if self.root != NULL_NODE {
            self.nodes[self.root].parent = NULL_NODE;
        }
        debug!(leaves = self.lookup.len(), height = self.height(), "dbvt rebuilt");
    }

    fn build_range(&mut self, items: &mut [usize]) -> usize {
        if items.len() == 1 {
            return items[0];
        }

        let centroids = items.iter().map(|&n| self.nodes[n].aabb.position);
        let (lo, hi) = centroids.fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(lo, hi), c| (lo.min(c), hi.max(c)),
        );
        let extent = hi - lo;
        let axis = if extent.x >= extent.y { 0 } else { 1 };
        let axis_min = lo[axis];
        let axis_extent = extent[axis];

        let mid = if axis_extent <= EPSILON {
            items.len() / 2
        } else {
            let bucket_of = |center: DVec2| {
                let t = (center[axis] - axis_min) / axis_extent;
                ((t * SAH_BUCKETS as f64) as usize).min(SAH_BUCKETS - 1)
            };

            let mut counts = [0usize; SAH_BUCKETS];
            let mut bounds: [Option<Aabb>; SAH_BUCKETS] = [None; SAH_BUCKETS];
            for &n in items.iter() {
                let aabb = self.nodes[n].aabb;
                let b = bucket_of(aabb.position);
                counts[b] += 1;
                bounds[b] = Some(match bounds[b] {
                    Some(existing) => Aabb::combine(&existing, &aabb),
                    None => aabb,
                });
            }

            let mut best_split = 0;
            let mut best_cost = f64::INFINITY;
            for split in 1..SAH_BUCKETS {
                let side = |range: std::ops::Range<usize>| {
                    let count: usize = counts[range.clone()].iter().sum();
                    let area = bounds[range]
                        .iter()
                        .flatten()
                        .copied()
                        .reduce(|a, b| Aabb::combine(&a, &b))
                        .map_or(0.0, |aabb| aabb.surface_area());
                    (count, area)
                };
                let (left_count, left_area) = side(0..split);
                let (right_count, right_area) = side(split..SAH_BUCKETS);
                if left_count == 0 || right_count == 0 {
                    continue;
                }
                let cost = left_count as f64 * left_area + right_count as f64 * right_area;
                if cost < best_cost {
                    best_cost = cost;
                    best_split = split;
                }
            }

            if best_split == 0 {
                items.len() / 2
            } else {
                items.sort_by_key(|&n| bucket_of(self.nodes[n].aabb.position));
                items.partition_point(|&n| bucket_of(self.nodes[n].aabb.position) < best_split)
            }
        };

        let (left_items, right_items) = items.split_at_mut(mid);
        let left = self.build_range(left_items);
        let right = self.build_range(right_items);
        let parent = self.allocate_node(Node {
            aabb: Aabb::combine(&self.nodes[left].aabb, &self.nodes[right].aabb),
            parent: NULL_NODE,
            left,
            right,
            height: 1 + self.nodes[left].height.max(self.nodes[right].height),
            slot: NULL_NODE,
        });
        self.nodes[left].parent = parent;
        self.nodes[right].parent = parent;
        parent
    }

    /// Verify links, heights, bounds and leaf bookkeeping of the whole tree
    pub fn check_invariants(&self) -> Result<(), TreeInvariantError> {
        if self.root == NULL_NODE {
            return if self.lookup.is_empty() {
                Ok(())
            } else {
                Err(TreeInvariantError::LeafCount {
                    expected: self.lookup.len(),
                    found: 0,
                })
            };
        }
        if self.nodes[self.root].parent != NULL_NODE {
            return Err(TreeInvariantError::BrokenParentLink { node: self.root });
        }

        let mut leaf_count = 0;
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];

            if node.is_leaf() {
                if node.right != NULL_NODE || node.height != 0 {
                    return Err(TreeInvariantError::MissingChild { node: index });
                }
                let leaf = self
                    .leaves
                    .get(node.slot)
                    .and_then(|leaf| leaf.as_ref())
                    .ok_or(TreeInvariantError::BadLeaf { node: index })?;
                if leaf.node != index
                    || self.lookup.get(&leaf.binding.id) != Some(&node.slot)
                    || !leaf.binding.aabb.is_subset(&node.aabb)
                {
                    return Err(TreeInvariantError::BadLeaf { node: index });
                }
                leaf_count += 1;
                continue;
            }

            if node.right == NULL_NODE {
                return Err(TreeInvariantError::MissingChild { node: index });
            }
            let left = &self.nodes[node.left];
            let right = &self.nodes[node.right];
            if left.parent != index {
                return Err(TreeInvariantError::BrokenParentLink { node: node.left });
            }
            if right.parent != index {
                return Err(TreeInvariantError::BrokenParentLink { node: node.right });
            }

            let expected = 1 + left.height.max(right.height);
            if node.height != expected {
                return Err(TreeInvariantError::WrongHeight {
                    node: index,
                    expected,
                    found: node.height,
                });
            }

            let union = Aabb::combine(&left.aabb, &right.aabb);
            if (union.min() - node.aabb.min()).abs().max_element() > BOUNDS_TOLERANCE
                || (union.max() - node.aabb.max()).abs().max_element() > BOUNDS_TOLERANCE
            {
                return Err(TreeInvariantError::WrongBounds { node: index });
            }

            stack.push(node.left);
            stack.push(node.right);
        }

        if leaf_count != self.lookup.len() {
            return Err(TreeInvariantError::LeafCount {
                expected: self.lookup.len(),
                found: leaf_count,
            });
        }
        Ok(())
    }
}

impl<P> Broadphase<P> for Dbvt<P> {
    fn add_object(&mut self, binding: ObjectBinding<P>) {
        assert!(
            !self.lookup.contains_key(&binding.id),
            "{} is already in the broadphase",
            binding.id
        );

        let fat = binding.aabb.expand(self.margin);
        let id = binding.id;
        let slot = match self.free_leaves.pop() {
            Some(slot) => slot,
            None => {
                self.leaves.push(None);
                self.leaves.len() - 1
            }
        };
        let node = self.allocate_node(Node::leaf(fat, slot));
        self.leaves[slot] = Some(Leaf { binding, node });
        self.lookup.insert(id, slot);
        self.insert_leaf(node);
    }

    fn remove_object(&mut self, id: ObjectId) -> Option<ObjectBinding<P>> {
        let slot = self.lookup.remove(&id)?;
        let leaf = self.leaves[slot].take()?;
        self.free_leaves.push(slot);
        self.remove_leaf(leaf.node);
        self.free_node(leaf.node);
        Some(leaf.binding)
    }

    fn update_object(&mut self, id: ObjectId, aabb: Aabb) {
        let Some(&slot) = self.lookup.get(&id) else {
            return;
        };
        let Some(leaf) = self.leaves[slot].as_mut() else {
            return;
        };
        leaf.binding.aabb = aabb;
        let node = leaf.node;

        if self.only_insert {
            self.remove_leaf(node);
            self.nodes[node].aabb = aabb.expand(self.margin);
            self.insert_leaf(node);
            return;
        }

        if aabb.is_subset(&self.nodes[node].aabb) {
            return;
        }

        self.nodes[node].aabb = aabb.expand(self.margin);
        let mut index = self.nodes[node].parent;
        while index != NULL_NODE {
            self.refit(index);
            index = self.nodes[index].parent;
        }
    }

    fn query_overlaps(&self) -> Vec<ObjectPair> {
        let mut pairs = Vec::new();
        if self.root == NULL_NODE || self.nodes[self.root].is_leaf() {
            return pairs;
        }

        let root = &self.nodes[self.root];
        let mut stack = vec![(root.left, root.right, true)];
        while let Some((a, b, self_test)) = stack.pop() {
            let node_a = &self.nodes[a];
            let node_b = &self.nodes[b];

            // Pairs living entirely inside one subtree are tested exactly once, here
            if self_test {
                if !node_a.is_leaf() {
                    stack.push((node_a.left, node_a.right, true));
                }
                if !node_b.is_leaf() {
                    stack.push((node_b.left, node_b.right, true));
                }
            }

            if !node_a.aabb.collide(&node_b.aabb) {
                continue;
            }

            match (node_a.is_leaf(), node_b.is_leaf()) {
                (true, true) => {
                    if let (Some(x), Some(y)) = (self.binding_of(a), self.binding_of(b)) {
                        if x.interacts_with(y) {
                            pairs.push(ObjectPair::new(x.id, y.id));
                        }
                    }
                }
                (true, false) => {
                    stack.push((a, node_b.left, false));
                    stack.push((a, node_b.right, false));
                }
                (false, true) => {
                    stack.push((node_a.left, b, false));
                    stack.push((node_a.right, b, false));
                }
                (false, false) => {
                    if node_a.height >= node_b.height {
                        stack.push((node_a.left, b, false));
                        stack.push((node_a.right, b, false));
                    } else {
                        stack.push((a, node_b.left, false));
                        stack.push((a, node_b.right, false));
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn query_aabb(&self, region: &Aabb) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        if self.root == NULL_NODE {
            return ids;
        }
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.aabb.collide(region) {
                continue;
            }
            if node.is_leaf() {
                if let Some(binding) = self.binding_of(index) {
                    if binding.aabb.collide(region) {
                        ids.push(binding.id);
                    }
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        ids.sort_unstable();
        ids
    }

    fn query_ray(&self, origin: DVec2, direction: DVec2, max_distance: f64) -> Vec<ObjectId> {
        let mut hits = Vec::new();
        if self.root == NULL_NODE {
            return Vec::new();
        }
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.aabb.raycast(origin, direction, max_distance).is_none() {
                continue;
            }
            if node.is_leaf() {
                if let Some(binding) = self.binding_of(index) {
                    if let Some((enter, _)) = binding.aabb.raycast(origin, direction, max_distance) {
                        hits.push((enter, binding.id));
                    }
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        order_ray_hits(hits)
    }

    fn rebuild(&mut self) {
        self.rebuild_tree();
    }

    fn len(&self) -> usize {
        self.lookup.len()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.lookup.contains_key(&id)
    }

    fn binding(&self, id: ObjectId) -> Option<&ObjectBinding<P>> {
        let slot = *self.lookup.get(&id)?;
        self.leaves[slot].as_ref().map(|leaf| &leaf.binding)
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free_nodes.clear();
        self.leaves.clear();
        self.free_leaves.clear();
        self.lookup.clear();
        self.root = NULL_NODE;
    }
}
