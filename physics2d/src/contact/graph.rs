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
//! Incremental edge coloring of the contact graph
//!
//! Vertices are object ids and edges are touching pairs. Every edge gets the
//! smallest color not already used by another edge at either endpoint, so the
//! edges of one color share no body and can be solved concurrently. Immovable
//! bodies are marked repeat-exempt: any number of same-colored edges may meet
//! at them, since the solver never writes their state.
//!
//! A union-find over the non-exempt ids tracks connected groups (islands).
//! Insertions union eagerly; removals cannot be undone in a union-find, so
//! they mark the structure dirty and the next island query rebuilds it.

use crate::object::{ObjectId, ObjectPair};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Edge-colored graph of touching pairs
#[derive(Debug, Clone, Default)]
pub struct ObjectGraph {
    incident: HashMap<ObjectId, Vec<ObjectPair>>,
    edge_colors: HashMap<ObjectPair, usize>,
    colors: Vec<Vec<ObjectPair>>,
    exempt: HashSet<ObjectId>,
    parent: HashMap<ObjectId, ObjectId>,
    rank: HashMap<ObjectId, u32>,
    islands_dirty: bool,
}

impl ObjectGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `id` to meet several edges of the same color
    ///
    /// Applies to edges inserted afterwards.
    pub fn set_repeat_exempt(&mut self, id: ObjectId, exempt: bool) {
        let changed = if exempt {
            self.exempt.insert(id)
        } else {
            self.exempt.remove(&id)
        };
        if changed {
            self.islands_dirty = true;
        }
    }

    /// Whether `id` is repeat-exempt
    pub fn is_repeat_exempt(&self, id: ObjectId) -> bool {
        self.exempt.contains(&id)
    }

    fn endpoints(pair: ObjectPair) -> [ObjectId; 2] {
        [pair.a(), pair.b()]
    }

    fn smallest_free_color(&self, pair: ObjectPair) -> usize {
        let mut low: u64 = 0;
        let mut high = Vec::new();
        for id in Self::endpoints(pair) {
            if self.exempt.contains(&id) {
                continue;
            }
            for edge in self.incident.get(&id).into_iter().flatten() {
                if let Some(&c) = self.edge_colors.get(edge) {
                    if c < 64 {
                        low |= 1 << c;
                    } else {
                        high.push(c);
                    }
                }
            }
        }
        if low != u64::MAX {
            return (!low).trailing_zeros() as usize;
        }

        high.sort_unstable();
        let mut color = 64;
        for c in high {
            if c == color {
                color += 1;
            } else if c > color {
                break;
            }
        }
        color
    }

    /// Insert an edge and return its color
    ///
    /// Inserting an edge that is already present returns its current color.
    pub fn add_edge(&mut self, pair: ObjectPair) -> usize {
        if let Some(&c) = self.edge_colors.get(&pair) {
            return c;
        }
        let color = self.smallest_free_color(pair);
        if self.colors.len() <= color {
            self.colors.resize_with(color + 1, Vec::new);
        }
        self.colors[color].push(pair);
        self.edge_colors.insert(pair, color);
        for id in Self::endpoints(pair) {
            self.incident.entry(id).or_default().push(pair);
        }

        if !self.islands_dirty && !self.exempt.contains(&pair.a()) && !self.exempt.contains(&pair.b()) {
            self.union(pair.a(), pair.b());
        }
        color
    }

    /// Remove an edge, returning the color it held
    pub fn remove_edge(&mut self, pair: ObjectPair) -> Option<usize> {
        let color = self.edge_colors.remove(&pair)?;
        let class = &mut self.colors[color];
        if let Some(pos) = class.iter().position(|p| *p == pair) {
            class.swap_remove(pos);
        }
        while self.colors.last().is_some_and(|c| c.is_empty()) {
            self.colors.pop();
        }
        for id in Self::endpoints(pair) {
            if let Some(edges) = self.incident.get_mut(&id) {
                edges.retain(|p| *p != pair);
                if edges.is_empty() {
                    self.incident.remove(&id);
                }
            }
        }
        self.islands_dirty = true;
        Some(color)
    }

    /// Remove every edge touching `id`, returning them
    pub fn remove_object(&mut self, id: ObjectId) -> Vec<ObjectPair> {
        let edges = self.incident.get(&id).cloned().unwrap_or_default();
        for pair in &edges {
            self.remove_edge(*pair);
        }
        self.exempt.remove(&id);
        edges
    }

    /// Color of an edge
    pub fn color_of(&self, pair: &ObjectPair) -> Option<usize> {
        self.edge_colors.get(pair).copied()
    }

    /// Number of colors in use (highest color plus one)
    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    /// Edges holding color `color`
    pub fn edges_with_color(&self, color: usize) -> &[ObjectPair] {
        self.colors.get(color).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edge_colors.len()
    }

    /// Whether the edge is present
    pub fn contains_edge(&self, pair: &ObjectPair) -> bool {
        self.edge_colors.contains_key(pair)
    }

    /// Check that no two edges meeting at a non-exempt id share a color
    pub fn is_proper_coloring(&self) -> bool {
        for (id, edges) in &self.incident {
            if self.exempt.contains(id) {
                continue;
            }
            let mut seen = HashSet::new();
            for edge in edges {
                match self.edge_colors.get(edge) {
                    Some(&c) if seen.insert(c) => {}
                    _ => return false,
                }
            }
        }
        self.colors
            .iter()
            .enumerate()
            .all(|(c, edges)| edges.iter().all(|e| self.edge_colors.get(e) == Some(&c)))
    }

    fn find(&mut self, id: ObjectId) -> ObjectId {
        let mut root = id;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        let mut node = id;
        while node != root {
            let next = self.parent.get(&node).copied().unwrap_or(root);
            self.parent.insert(node, root);
            node = next;
        }
        root
    }

    fn union(&mut self, x: ObjectId, y: ObjectId) {
        self.parent.entry(x).or_insert(x);
        self.parent.entry(y).or_insert(y);
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        let rank_x = self.rank.get(&rx).copied().unwrap_or(0);
        let rank_y = self.rank.get(&ry).copied().unwrap_or(0);
        if rank_x < rank_y {
            self.parent.insert(rx, ry);
        } else if rank_x > rank_y {
            self.parent.insert(ry, rx);
        } else {
            self.parent.insert(ry, rx);
            self.rank.insert(rx, rank_x + 1);
        }
    }

    fn rebuild_islands(&mut self) {
        self.parent.clear();
        self.rank.clear();
        let edges: Vec<ObjectPair> = self.edge_colors.keys().copied().collect();
        for pair in edges {
            if !self.exempt.contains(&pair.a()) && !self.exempt.contains(&pair.b()) {
                self.union(pair.a(), pair.b());
            }
        }
        for id in self.incident.keys() {
            if !self.exempt.contains(id) {
                self.parent.entry(*id).or_insert(*id);
            }
        }
        self.islands_dirty = false;
        trace!(ids = self.parent.len(), "rebuilt contact islands");
    }

    /// Whether two ids are connected through non-exempt bodies
    pub fn same_island(&mut self, x: ObjectId, y: ObjectId) -> bool {
        if self.islands_dirty {
            self.rebuild_islands();
        }
        if !self.parent.contains_key(&x) || !self.parent.contains_key(&y) {
            return x == y;
        }
        self.find(x) == self.find(y)
    }

    /// Connected groups of non-exempt ids, each sorted, ordered by smallest id
    pub fn islands(&mut self) -> Vec<Vec<ObjectId>> {
        if self.islands_dirty {
            self.rebuild_islands();
        }
        let mut ids: Vec<ObjectId> = self
            .incident
            .keys()
            .filter(|id| !self.exempt.contains(id))
            .copied()
            .collect();
        for id in &ids {
            self.parent.entry(*id).or_insert(*id);
        }
        ids.sort_unstable();

        let mut groups: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
        for id in ids {
            let root = self.find(id);
            groups.entry(root).or_default().push(id);
        }
        let mut islands: Vec<Vec<ObjectId>> = groups.into_values().collect();
        islands.sort_unstable_by_key(|island| island[0]);
        islands
    }

    /// Drop all edges and exemptions
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pair(x: u32, y: u32) -> ObjectPair {
        ObjectPair::new(ObjectId::new(x), ObjectId::new(y))
    }

    #[test]
    fn test_chain_alternates_colors() {
        let mut graph = ObjectGraph::new();
        assert_eq!(graph.add_edge(pair(0, 1)), 0);
        assert_eq!(graph.add_edge(pair(1, 2)), 1);
        assert_eq!(graph.add_edge(pair(2, 3)), 0);
        assert_eq!(graph.add_edge(pair(1, 2)), 1);
        assert_eq!(graph.color_count(), 2);
        assert_eq!(graph.edges_with_color(0).len(), 2);
        assert!(graph.is_proper_coloring());
    }

    #[test]
    fn test_removed_color_is_reused() {
        let mut graph = ObjectGraph::new();
        graph.add_edge(pair(0, 1));
        graph.add_edge(pair(0, 2));
        graph.add_edge(pair(0, 3));
        assert_eq!(graph.remove_edge(pair(0, 2)), Some(1));
        assert_eq!(graph.remove_edge(pair(0, 2)), None);
        assert_eq!(graph.add_edge(pair(0, 4)), 1);
        assert!(graph.is_proper_coloring());
    }

    #[test]
    fn test_exempt_hub_shares_one_color() {
        let mut graph = ObjectGraph::new();
        let ground = ObjectId::new(100);
        graph.set_repeat_exempt(ground, true);
        for i in 0..10 {
            assert_eq!(graph.add_edge(ObjectPair::new(ground, ObjectId::new(i))), 0);
        }
        assert_eq!(graph.color_count(), 1);
        assert!(graph.is_proper_coloring());
        // The ground does not connect the boxes into one island
        assert_eq!(graph.islands().len(), 10);
    }

    #[test]
    fn test_islands_split_after_removal() {
        let mut graph = ObjectGraph::new();
        graph.add_edge(pair(0, 1));
        graph.add_edge(pair(1, 2));
        graph.add_edge(pair(5, 6));
        assert!(graph.same_island(ObjectId::new(0), ObjectId::new(2)));
        assert_eq!(graph.islands().len(), 2);

        graph.remove_edge(pair(1, 2));
        assert!(!graph.same_island(ObjectId::new(0), ObjectId::new(2)));
        let islands = graph.islands();
        assert_eq!(
            islands,
            vec![
                vec![ObjectId::new(0), ObjectId::new(1)],
                vec![ObjectId::new(5), ObjectId::new(6)],
            ]
        );
    }

    #[test]
    fn test_remove_object() {
        let mut graph = ObjectGraph::new();
        graph.add_edge(pair(0, 1));
        graph.add_edge(pair(0, 2));
        graph.add_edge(pair(1, 2));
        let removed = graph.remove_object(ObjectId::new(0));
        assert_eq!(removed.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_edge(&pair(1, 2)));
        assert!(graph.is_proper_coloring());
    }

    #[test]
    fn test_random_churn_stays_proper() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut graph = ObjectGraph::new();
        for hub in 0..3 {
            graph.set_repeat_exempt(ObjectId::new(hub), true);
        }
        let mut live = Vec::new();
        for _ in 0..2000 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let x = rng.gen_range(0..40);
                let y = rng.gen_range(0..40);
                if x != y {
                    let p = pair(x, y);
                    graph.add_edge(p);
                    if !live.contains(&p) {
                        live.push(p);
                    }
                }
            } else {
                let p = live.swap_remove(rng.gen_range(0..live.len()));
                assert!(graph.remove_edge(p).is_some());
            }
            assert!(graph.is_proper_coloring());
        }
        assert_eq!(graph.edge_count(), live.len());
    }

    #[test]
    fn test_many_colors_past_bitmask() {
        let mut graph = ObjectGraph::new();
        let hub = ObjectId::new(0);
        for i in 1..=70 {
            assert_eq!(graph.add_edge(ObjectPair::new(hub, ObjectId::new(i))), (i - 1) as usize);
        }
        graph.remove_edge(ObjectPair::new(hub, ObjectId::new(66)));
        assert_eq!(graph.add_edge(ObjectPair::new(hub, ObjectId::new(71))), 65);
        assert!(graph.is_proper_coloring());
    }
}
