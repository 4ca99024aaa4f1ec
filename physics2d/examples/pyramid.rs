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
//! Box pyramid demo
//!
//! Drops a pyramid of boxes on a static floor and prints how the contact
//! graph and the resting error evolve. Pass `--colored` to solve color
//! classes on a worker pool.

use physics2d::config::{SolveMode, WorldConfig};
use physics2d::dynamics::{Body, Mass, PhysicsWorld};
use physics2d::geometry::Shape;
use physics2d::math::DVec2;

const ROWS: usize = 12;
const DT: f64 = 1.0 / 60.0;

fn main() {
    let colored = std::env::args().any(|arg| arg == "--colored");
    let mut config = WorldConfig::default();
    if colored {
        config = config.with_solve_mode(SolveMode::Colored).with_worker_threads(4);
    }

    println!("physics2d - Box Pyramid");
    println!("=======================\n");
    println!("Rows: {ROWS}, solve mode: {:?}", config.solve_mode);

    let mut world = match PhysicsWorld::new(config) {
        Ok(world) => world,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };

    world.add_body(Body::fixed(Shape::rectangle(60.0, 1.0)).with_friction(0.6));
    let mut boxes = Vec::new();
    for row in 0..ROWS {
        let count = ROWS - row;
        for i in 0..count {
            let x = (i as f64 - (count - 1) as f64 * 0.5) * 1.05;
            let body = Body::new(Shape::rectangle(1.0, 1.0), Mass::new(1.0))
                .with_position(DVec2::new(x, 1.0 + row as f64))
                .with_friction(0.6);
            boxes.push((world.add_body(body), 1.0 + row as f64));
        }
    }
    println!("Bodies: {}\n", world.bodies().len());

    println!("{:>6} {:>10} {:>8} {:>7} {:>12}", "step", "manifolds", "points", "colors", "max drop");
    for step in 1..=600 {
        let stats = world.step(DT);
        if step % 60 == 0 {
            let max_drop = boxes
                .iter()
                .filter_map(|&(id, rest)| world.body(id).map(|b| rest - b.position.y))
                .fold(0.0_f64, f64::max);
            println!(
                "{:>6} {:>10} {:>8} {:>7} {:>12.5}",
                step, stats.manifolds, stats.contact_points, stats.colors, max_drop
            );
        }
    }

    let islands = world.islands();
    println!("\nIslands: {}", islands.len());
    println!("Largest island: {} bodies", islands.iter().map(Vec::len).max().unwrap_or(0));
}
