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
//! Sparse uniform grid
//!
//! Space is cut into `cell_width x cell_height` cells addressed by
//! `(row, col)`. Only occupied cells are stored. Each entry remembers the
//! sorted list of cells its box covers, so an update only touches the cells
//! that were entered or left.
//!
//! Boxes covering more than [`MAX_CELLS_PER_OBJECT`] cells, or with
//! non-finite bounds, are kept on a separate list that every query scans.

use super::{order_ray_hits, Broadphase, ObjectBinding};
use crate::geometry::Aabb;
use crate::math::DVec2;
use crate::object::{ObjectId, ObjectPair};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

type Cell = (i64, i64);

/// Largest cell span stored in the grid; bigger boxes go on the oversized list
pub const MAX_CELLS_PER_OBJECT: usize = 1024;

/// Longest ray walked cell by cell before falling back to a full scan
const MAX_RAY_CELLS: f64 = 65536.0;

#[derive(Debug, Clone)]
struct GridEntry<P> {
    binding: ObjectBinding<P>,
    cells: Vec<Cell>,
}

/// Uniform grid broadphase
#[derive(Debug, Clone)]
pub struct UniformGrid<P> {
    cell_width: f64,
    cell_height: f64,
    cells: HashMap<Cell, Vec<ObjectId>>,
    entries: HashMap<ObjectId, GridEntry<P>>,
    oversized: BTreeSet<ObjectId>,
}

impl<P> UniformGrid<P> {
    /// Create an empty grid
    ///
    /// # Panics
    ///
    /// Panics unless both cell extents are positive and finite.
    pub fn new(cell_width: f64, cell_height: f64) -> Self {
        assert!(
            cell_width > 0.0 && cell_width.is_finite() && cell_height > 0.0 && cell_height.is_finite(),
            "Grid cell size must be positive and finite"
        );
        UniformGrid {
            cell_width,
            cell_height,
            cells: HashMap::new(),
            entries: HashMap::new(),
            oversized: BTreeSet::new(),
        }
    }

    /// Cell extents `(width, height)`
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Objects too large (or unbounded) to be stored cell by cell
    pub fn oversized(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.oversized.iter().copied()
    }

    /// Cells covered by `id`'s box, in row-major order; empty for oversized objects
    pub fn cells_of(&self, id: ObjectId) -> Option<&[Cell]> {
        self.entries.get(&id).map(|entry| entry.cells.as_slice())
    }

    #[inline]
    fn cell_of(&self, point: DVec2) -> Cell {
        (
            (point.y / self.cell_height).floor() as i64,
            (point.x / self.cell_width).floor() as i64,
        )
    }

    /// Closed range of cells spanned by `aabb`, sorted
    ///
    /// `None` when the box is not finite or spans more than
    /// [`MAX_CELLS_PER_OBJECT`] cells.
    fn cell_range(&self, aabb: &Aabb) -> Option<Vec<Cell>> {
        let (min, max) = (aabb.min(), aabb.max());
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }
        let rows = (max.y / self.cell_height).floor() - (min.y / self.cell_height).floor() + 1.0;
        let cols = (max.x / self.cell_width).floor() - (min.x / self.cell_width).floor() + 1.0;
        if rows * cols > MAX_CELLS_PER_OBJECT as f64 {
            return None;
        }

        let (row_lo, col_lo) = self.cell_of(min);
        let (row_hi, col_hi) = self.cell_of(max);
        let mut cells = Vec::with_capacity((rows * cols) as usize);
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                cells.push((row, col));
            }
        }
        Some(cells)
    }

    /// Place `id` on the oversized list
    fn track_oversized(&mut self, id: ObjectId, aabb: &Aabb) {
        if self.oversized.insert(id) {
            debug!(%id, min = ?aabb.min(), max = ?aabb.max(), "box too large for grid cells, tracking separately");
        }
    }

    /// Ids whose boxes pass `keep`, found by walking every entry
    fn scan_entries(&self, mut keep: impl FnMut(&ObjectBinding<P>) -> bool) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .entries
            .values()
            .filter(|entry| keep(&entry.binding))
            .map(|entry| entry.binding.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn insert_into(&mut self, cell: Cell, id: ObjectId) {
        self.cells.entry(cell).or_default().push(id);
    }

    fn remove_from(&mut self, cell: Cell, id: ObjectId) {
        if let Some(bucket) = self.cells.get_mut(&cell) {
            if let Some(pos) = bucket.iter().position(|&other| other == id) {
                bucket.swap_remove(pos);
            }
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Cells visited by a ray, stepping one cell boundary at a time
    ///
    /// `None` when the walk would be unbounded or longer than `MAX_RAY_CELLS`.
    fn ray_cells(&self, origin: DVec2, dir: DVec2, max_distance: f64) -> Option<Vec<Cell>> {
        let reach = origin + dir * max_distance;
        if !(origin.is_finite() && reach.is_finite()) {
            return None;
        }
        let span = ((reach.x - origin.x) / self.cell_width).abs() + ((reach.y - origin.y) / self.cell_height).abs();
        if span > MAX_RAY_CELLS {
            return None;
        }

        let start = self.cell_of(origin);
        let end = self.cell_of(reach);
        let (mut row, mut col) = start;
        let mut visited = vec![start];

        let axis = |o: f64, d: f64, index: i64, size: f64| -> (i64, f64, f64) {
            if d > 0.0 {
                (1, ((index + 1) as f64 * size - o) / d, size / d)
            } else if d < 0.0 {
                (-1, (index as f64 * size - o) / d, -size / d)
            } else {
                (0, f64::INFINITY, f64::INFINITY)
            }
        };
        let (step_col, mut t_max_x, delta_x) = axis(origin.x, dir.x, col, self.cell_width);
        let (step_row, mut t_max_y, delta_y) = axis(origin.y, dir.y, row, self.cell_height);

        let steps = (end.0 - start.0).abs() + (end.1 - start.1).abs();
        for _ in 0..steps {
            if t_max_x < t_max_y {
                if t_max_x > max_distance {
                    break;
                }
                col += step_col;
                t_max_x += delta_x;
            } else {
                if t_max_y > max_distance {
                    break;
                }
                row += step_row;
                t_max_y += delta_y;
            }
            visited.push((row, col));
            if (row, col) == end {
                break;
            }
        }
        Some(visited)
    }
}

impl<P> Broadphase<P> for UniformGrid<P> {
    fn add_object(&mut self, binding: ObjectBinding<P>) {
        assert!(
            !self.entries.contains_key(&binding.id),
            "{} is already in the broadphase",
            binding.id
        );
        let id = binding.id;
        let cells = match self.cell_range(&binding.aabb) {
            Some(cells) => cells,
            None => {
                self.track_oversized(id, &binding.aabb);
                Vec::new()
            }
        };
        for &cell in &cells {
            self.insert_into(cell, id);
        }
        self.entries.insert(id, GridEntry { binding, cells });
    }

    fn remove_object(&mut self, id: ObjectId) -> Option<ObjectBinding<P>> {
        let entry = self.entries.remove(&id)?;
        self.oversized.remove(&id);
        for &cell in &entry.cells {
            self.remove_from(cell, id);
        }
        Some(entry.binding)
    }

    fn update_object(&mut self, id: ObjectId, aabb: Aabb) {
        if !self.entries.contains_key(&id) {
            return;
        }
        let new_cells = match self.cell_range(&aabb) {
            Some(cells) => {
                self.oversized.remove(&id);
                cells
            }
            None => {
                self.track_oversized(id, &aabb);
                Vec::new()
            }
        };
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        entry.binding.aabb = aabb;
        let old_cells = std::mem::replace(&mut entry.cells, new_cells.clone());

        // Both lists are sorted: walk them together and touch only the difference
        let (mut i, mut j) = (0, 0);
        while i < old_cells.len() || j < new_cells.len() {
            match (old_cells.get(i), new_cells.get(j)) {
                (Some(&old), Some(&new)) if old == new => {
                    i += 1;
                    j += 1;
                }
                (Some(&old), Some(&new)) if old < new => {
                    self.remove_from(old, id);
                    i += 1;
                }
                (Some(&old), None) => {
                    self.remove_from(old, id);
                    i += 1;
                }
                (_, Some(&new)) => {
                    self.insert_into(new, id);
                    j += 1;
                }
                (None, None) => break,
            }
        }
    }

    fn query_overlaps(&self) -> Vec<ObjectPair> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for bucket in self.cells.values().filter(|bucket| bucket.len() >= 2) {
            for (i, &a) in bucket.iter().enumerate() {
                for &b in &bucket[i + 1..] {
                    let pair = ObjectPair::new(a, b);
                    if !seen.insert(pair) {
                        continue;
                    }
                    if let (Some(x), Some(y)) = (self.entries.get(&a), self.entries.get(&b)) {
                        if x.binding.interacts_with(&y.binding) {
                            pairs.push(pair);
                        }
                    }
                }
            }
        }
        for big in self.oversized.iter().filter_map(|id| self.entries.get(id)) {
            for other in self.entries.values() {
                if other.binding.id == big.binding.id {
                    continue;
                }
                let pair = ObjectPair::new(big.binding.id, other.binding.id);
                if big.binding.interacts_with(&other.binding) && seen.insert(pair) {
                    pairs.push(pair);
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    fn query_aabb(&self, region: &Aabb) -> Vec<ObjectId> {
        let Some(region_cells) = self.cell_range(region) else {
            return self.scan_entries(|binding| binding.aabb.collide(region));
        };
        let mut ids: BTreeSet<ObjectId> = self
            .oversized
            .iter()
            .filter(|id| self.entries.get(*id).is_some_and(|entry| entry.binding.aabb.collide(region)))
            .copied()
            .collect();
        for cell in region_cells {
            if let Some(bucket) = self.cells.get(&cell) {
                for id in bucket {
                    if let Some(entry) = self.entries.get(id) {
                        if entry.binding.aabb.collide(region) {
                            ids.insert(*id);
                        }
                    }
                }
            }
        }
        ids.into_iter().collect()
    }

    fn query_ray(&self, origin: DVec2, direction: DVec2, max_distance: f64) -> Vec<ObjectId> {
        let dir = direction.normalize_or_zero();
        let cells = if dir == DVec2::ZERO {
            Some(vec![self.cell_of(origin)])
        } else {
            self.ray_cells(origin, dir, max_distance)
        };
        let candidates: Vec<ObjectId> = match cells {
            Some(cells) => {
                let mut tested = HashSet::new();
                let walked = cells
                    .iter()
                    .filter_map(|cell| self.cells.get(cell))
                    .flatten()
                    .copied()
                    .filter(|&id| tested.insert(id))
                    .collect::<Vec<_>>();
                self.oversized.iter().copied().chain(walked).collect()
            }
            None => self.entries.keys().copied().collect(),
        };

        let mut hits = Vec::new();
        for id in candidates {
            let Some(entry) = self.entries.get(&id) else {
                continue;
            };
            if let Some((enter, exit)) = entry.binding.aabb.raycast(origin, dir, max_distance) {
                // Both hit points must be real points on the segment
                if enter <= exit && enter <= max_distance {
                    hits.push((enter, id));
                }
            }
        }
        order_ray_hits(hits)
    }

    fn rebuild(&mut self) {}

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    fn binding(&self, id: ObjectId) -> Option<&ObjectBinding<P>> {
        self.entries.get(&id).map(|entry| &entry.binding)
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.oversized.clear();
    }
}
