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
//! Broadphase comparison
//!
//! Scatters moving objects, runs the DBVT and the uniform grid side by side
//! and checks that they report the same pairs while timing both.

use physics2d::broadphase::{Broadphase, Dbvt, ObjectBinding, UniformGrid};
use physics2d::geometry::Aabb;
use physics2d::math::DVec2;
use physics2d::object::{ObjectId, ObjectPair};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

const OBJECTS: usize = 2000;
const FRAMES: usize = 100;

fn timed_pairs(bp: &dyn Broadphase<()>, elapsed: &mut Duration) -> Vec<ObjectPair> {
    let start = Instant::now();
    let mut pairs = bp.query_overlaps();
    *elapsed += start.elapsed();
    pairs.sort_unstable();
    pairs
}

fn main() {
    println!("physics2d - Broadphase Comparison");
    println!("=================================\n");

    let mut rng = StdRng::seed_from_u64(7);
    let extent = 100.0;
    let mut objects: Vec<(ObjectBinding<()>, DVec2)> = (0..OBJECTS)
        .map(|i| {
            let center = DVec2::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
            let size = rng.gen_range(0.5..3.0);
            let velocity = DVec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            let mask = if i % 5 == 0 { 0b10 } else { 0b11 };
            (ObjectBinding::new(ObjectId::new(i as u32), mask, Aabb::new(center, size, size), ()), velocity)
        })
        .collect();

    let mut tree = Dbvt::new(0.5);
    let mut grid = UniformGrid::new(4.0, 4.0);
    for (binding, _) in &objects {
        tree.add_object(binding.clone());
        grid.add_object(binding.clone());
    }

    let mut tree_time = Duration::ZERO;
    let mut grid_time = Duration::ZERO;
    let mut total_pairs = 0;
    for frame in 0..FRAMES {
        for (binding, velocity) in objects.iter_mut() {
            let mut center = binding.aabb.position + *velocity * 0.1;
            if center.x.abs() > extent {
                velocity.x = -velocity.x;
                center.x = center.x.clamp(-extent, extent);
            }
            if center.y.abs() > extent {
                velocity.y = -velocity.y;
                center.y = center.y.clamp(-extent, extent);
            }
            binding.aabb = Aabb::new(center, binding.aabb.width, binding.aabb.height);

            let start = Instant::now();
            tree.update_object(binding.id, binding.aabb);
            tree_time += start.elapsed();
            let start = Instant::now();
            grid.update_object(binding.id, binding.aabb);
            grid_time += start.elapsed();
        }

        let from_tree = timed_pairs(&tree, &mut tree_time);
        let from_grid = timed_pairs(&grid, &mut grid_time);
        if from_tree != from_grid {
            eprintln!("frame {frame}: tree reported {} pairs, grid {}", from_tree.len(), from_grid.len());
            return;
        }
        total_pairs += from_tree.len();
    }

    println!("Objects: {OBJECTS}, frames: {FRAMES}");
    println!("Average pairs per frame: {}", total_pairs / FRAMES);
    println!("DBVT (height {}): {:?}", tree.height(), tree_time);
    println!("Grid ({} cells): {:?}", grid.occupied_cells(), grid_time);
}
