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
//! Whole-world behavior: resting contact, materials and solver equivalence

use physics2d::config::{BroadphaseConfig, IntegrationPath, SolveMode, WorldConfig};
use physics2d::dynamics::{Body, Mass, PhysicsWorld};
use physics2d::geometry::Shape;
use physics2d::math::DVec2;
use physics2d::object::ObjectId;

const DT: f64 = 1.0 / 60.0;

fn ground() -> Body {
    Body::fixed(Shape::rectangle(40.0, 1.0))
}

fn unit_box(x: f64, y: f64) -> Body {
    Body::new(Shape::rectangle(1.0, 1.0), Mass::new(1.0)).with_position(DVec2::new(x, y))
}

/// Ground plus a small pyramid; returns the box ids
fn pyramid(world: &mut PhysicsWorld, rows: usize) -> Vec<ObjectId> {
    world.add_body(ground());
    let mut ids = Vec::new();
    for row in 0..rows {
        let count = rows - row;
        for i in 0..count {
            let x = (i as f64 - (count - 1) as f64 * 0.5) * 1.05;
            let y = 1.0 + row as f64 * 1.0;
            ids.push(world.add_body(unit_box(x, y)));
        }
    }
    ids
}

fn snapshot(world: &PhysicsWorld) -> Vec<(DVec2, f64, DVec2, f64)> {
    world
        .bodies()
        .iter()
        .map(|(_, b)| (b.position, b.rotation, b.velocity, b.angular_velocity))
        .collect()
}

#[test]
fn test_box_settles_on_ground_with_either_broadphase() {
    for broadphase in [BroadphaseConfig::default(), BroadphaseConfig::grid(2.0)] {
        let mut world = PhysicsWorld::new(WorldConfig::default().with_broadphase(broadphase)).unwrap();
        // Box first so the ground is the second body of the pair
        let id = world.add_body(unit_box(0.0, 1.5));
        world.add_body(ground());

        for _ in 0..240 {
            world.step(DT);
        }
        let body = world.body(id).unwrap();
        let slop = world.config().solver.slop;
        assert!(body.position.y > 1.0 - 2.0 * slop - 0.01, "sank to {}", body.position.y);
        assert!(body.position.y < 1.0 + 0.01);
        assert!(body.position.x.abs() < 1e-3, "drifted to {}", body.position.x);
        assert!(body.velocity.length() < 0.02);
    }
}

#[test]
fn test_warm_started_impulse_supports_weight() {
    let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
    let floor = world.add_body(ground());
    let id = world.add_body(unit_box(0.0, 1.0));
    for _ in 0..120 {
        world.step(DT);
    }
    let impulse = world.contact(floor, id).unwrap().total_normal_impulse();
    assert!((impulse - 9.81 * DT).abs() < 0.02, "impulse {impulse}");
}

#[test]
fn test_friction_stops_sliding_box() {
    let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
    world.add_body(ground().with_friction(0.5));
    let id = world.add_body(unit_box(0.0, 0.999).with_friction(0.5).with_velocity(DVec2::new(2.0, 0.0)));
    for _ in 0..60 {
        world.step(DT);
    }
    let body = world.body(id).unwrap();
    assert!(body.velocity.x.abs() < 1e-3);
    // v²/(2μg) with a little slack for the first contact step
    assert!(body.position.x > 0.3 && body.position.x < 0.5, "slid to {}", body.position.x);
}

#[test]
fn test_elastic_ball_bounces() {
    let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
    world.add_body(ground().with_restitution(1.0));
    let ball = world.add_body(
        Body::new(Shape::circle(0.5), Mass::new(1.0))
            .with_restitution(1.0)
            .with_position(DVec2::new(0.0, 3.0)),
    );

    let mut impact_speed: f64 = 0.0;
    let mut rebound_speed: f64 = 0.0;
    for _ in 0..90 {
        world.step(DT);
        let vy = world.body(ball).unwrap().velocity.y;
        if vy < 0.0 && rebound_speed == 0.0 {
            impact_speed = impact_speed.max(-vy);
        } else if vy > 0.0 {
            rebound_speed = rebound_speed.max(vy);
        }
    }
    assert!(impact_speed > 6.0);
    assert!(rebound_speed > 0.9 * impact_speed, "{rebound_speed} vs {impact_speed}");
}

#[test]
fn test_small_stack_stays_upright() {
    let mut world = PhysicsWorld::new(WorldConfig::default().with_velocity_iterations(10)).unwrap();
    world.add_body(ground());
    let ids: Vec<ObjectId> = (0..3).map(|i| world.add_body(unit_box(0.0, 1.0 + i as f64))).collect();
    for _ in 0..300 {
        world.step(DT);
    }
    for (level, id) in ids.iter().enumerate() {
        let body = world.body(*id).unwrap();
        assert!((body.position.y - (1.0 + level as f64)).abs() < 0.1);
        assert!(body.position.x.abs() < 0.01);
        assert!(body.rotation.abs() < 0.01);
    }
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_colored_matches_single_threaded_colored() {
    let base = WorldConfig::default().with_solve_mode(SolveMode::Colored);
    let mut serial = PhysicsWorld::new(base.clone()).unwrap();
    let mut parallel = PhysicsWorld::new(base.with_worker_threads(4)).unwrap();
    pyramid(&mut serial, 5);
    pyramid(&mut parallel, 5);

    for _ in 0..60 {
        let a = serial.step(DT);
        let b = parallel.step(DT);
        assert_eq!(a, b);
        assert_eq!(snapshot(&serial), snapshot(&parallel));
    }
    assert!(serial.graph().color_count() > 1);
    assert!(serial.graph().is_proper_coloring());
}

#[test]
fn test_simd_path_matches_scalar_path() {
    let mut scalar = PhysicsWorld::new(WorldConfig::default()).unwrap();
    let mut simd = PhysicsWorld::new(WorldConfig::default().with_integration(IntegrationPath::Simd)).unwrap();
    pyramid(&mut scalar, 4);
    pyramid(&mut simd, 4);
    for _ in 0..30 {
        scalar.step(DT);
        simd.step(DT);
    }
    assert_eq!(snapshot(&scalar), snapshot(&simd));
}

#[test]
fn test_pyramid_islands_and_removal() {
    let mut world = PhysicsWorld::new(WorldConfig::default().with_solve_mode(SolveMode::Colored)).unwrap();
    let ids = pyramid(&mut world, 3);
    for _ in 0..10 {
        world.step(DT);
    }
    // Boxes in the bottom row do not touch each other, but the rows above tie them together
    assert_eq!(world.islands().len(), 1);

    let top = *ids.last().unwrap();
    world.remove_body(top);
    for _ in 0..5 {
        world.step(DT);
    }
    assert!(world.graph().is_proper_coloring());
    assert!(world.contacts().iter().all(|m| !m.pair.contains(top)));
}

#[test]
fn test_periodic_rebuild_keeps_results() {
    let mut plain = PhysicsWorld::new(WorldConfig::default()).unwrap();
    let mut rebuilt = PhysicsWorld::new(WorldConfig::default().with_rebuild_interval(7)).unwrap();
    pyramid(&mut plain, 3);
    pyramid(&mut rebuilt, 3);
    for _ in 0..30 {
        let a = plain.step(DT);
        let b = rebuilt.step(DT);
        assert_eq!(a.manifolds, b.manifolds);
    }
    assert_eq!(snapshot(&plain), snapshot(&rebuilt));
}

#[test]
fn test_overlapping_balls_make_contact_from_any_side() {
    for degrees in 0..360 {
        let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
        let base = world.add_body(Body::fixed(Shape::circle(1.0)));
        let offset = DVec2::from_angle((degrees as f64).to_radians()) * 1.8;
        let ball = world.add_body(Body::new(Shape::circle(1.0), Mass::new(1.0)).with_position(offset));

        world.step(DT);
        let manifold = world.contact(base, ball);
        assert!(manifold.is_some(), "no contact at {degrees} degrees");
    }
}

#[test]
fn test_box_rests_on_ground_wider_than_grid_span() {
    let config = WorldConfig::default().with_broadphase(BroadphaseConfig::grid(0.5));
    let mut world = PhysicsWorld::new(config).unwrap();
    // 20000 cells wide, so the grid keeps it off the cell map
    world.add_body(Body::fixed(Shape::rectangle(10_000.0, 1.0)));
    let id = world.add_body(unit_box(3.0, 1.5));

    for _ in 0..240 {
        world.step(DT);
    }
    let body = world.body(id).unwrap();
    assert!(body.position.y > 0.9, "fell through to {}", body.position.y);
    assert!(body.position.y < 1.01);
}
