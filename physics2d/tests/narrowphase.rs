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
//! Narrowphase behavior on hand-checked configurations

use approx::assert_abs_diff_eq;
use physics2d::config::{EpaMethod, NarrowphaseConfig};
use physics2d::geometry::Shape;
use physics2d::math::{DVec2, Transform};
use physics2d::narrowphase::{detect, distance, epa, epa_priority, generate_contacts, gjk, sweep_test, ShapePrimitive};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn at(shape: &Shape, x: f64, y: f64) -> ShapePrimitive<'_> {
    ShapePrimitive::new(shape, Transform::from_position(DVec2::new(x, y)))
}

#[test]
fn test_separated_circles_report_gap() {
    let config = NarrowphaseConfig::default();
    let small = Shape::circle(1.0);
    let large = Shape::circle(2.0);
    let a = at(&small, 0.0, 0.0);
    let b = at(&large, 5.0, 0.0);

    assert!(!gjk(&a, &b, &config).1);
    let result = distance(&a, &b, &config);
    assert!(!result.overlap);
    assert_abs_diff_eq!(result.distance, 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result.point_a.x, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result.point_b.x, 3.0, epsilon = 1e-6);
}

#[test]
fn test_half_overlapping_squares() {
    let config = NarrowphaseConfig::default();
    let square = Shape::rectangle(1.0, 1.0);
    let a = at(&square, 0.0, 0.0);
    let b = at(&square, 0.5, 0.0);

    let (simplex, overlap) = gjk(&a, &b, &config);
    assert!(overlap);
    let p = epa(&simplex, &a, &b, &config);
    assert_abs_diff_eq!(p.depth, 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(p.normal.x.abs(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(p.normal.y, 0.0, epsilon = 1e-6);
}

#[test]
fn test_shallow_box_overlap_clips_two_points() {
    let config = NarrowphaseConfig::default();
    let square = Shape::rectangle(1.0, 1.0);
    let a = at(&square, 0.0, 0.0);
    let b = at(&square, 0.9, 0.0);

    let info = detect(&a, &b, &config);
    assert!(info.overlap);
    assert_abs_diff_eq!(info.depth, 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(info.normal.x, 1.0, epsilon = 1e-6);

    let contacts = generate_contacts(&info, &a, &b, &config);
    assert_eq!(contacts.len(), 2);
    for point in contacts.points() {
        assert!((-0.5..=0.5).contains(&point.point_a.y));
        assert!((-0.5..=0.5).contains(&point.point_b.y));
        assert_abs_diff_eq!(point.depth, 0.1, epsilon = 1e-6);
    }
    assert_ne!(contacts.points()[0].id, contacts.points()[1].id);
}

#[test]
fn test_epa_variants_agree() {
    let shapes = [
        Shape::rectangle(2.0, 1.0),
        Shape::circle(0.75),
        Shape::capsule(0.8, 2.0),
        Shape::ellipse(2.0, 1.0),
        Shape::Polygon(physics2d::geometry::Polygon::regular(6, 1.0)),
    ];
    let linear = NarrowphaseConfig::default().with_epa_method(EpaMethod::Linear);
    let heap = NarrowphaseConfig::default().with_epa_method(EpaMethod::PriorityQueue);

    for (i, sa) in shapes.iter().enumerate() {
        for sb in &shapes[i..] {
            let a = ShapePrimitive::new(sa, Transform::new(DVec2::ZERO, 0.3));
            let b = ShapePrimitive::new(sb, Transform::new(DVec2::new(0.4, 0.3), -0.2));
            let (simplex, overlap) = gjk(&a, &b, &linear);
            assert!(overlap);
            let p = epa(&simplex, &a, &b, &linear);
            let q = epa_priority(&simplex, &a, &b, &heap);
            assert_abs_diff_eq!(p.depth, q.depth, epsilon = 1e-4);
            assert!(p.normal.dot(q.normal) > 0.99);
        }
    }
}

#[test]
fn test_normal_points_from_first_to_second() {
    let config = NarrowphaseConfig::default();
    let ball = Shape::circle(1.0);
    let floor = Shape::rectangle(10.0, 1.0);
    let a = at(&floor, 0.0, 0.0);
    let b = at(&ball, 0.0, 1.4);

    let info = detect(&a, &b, &config);
    assert!(info.has_contact());
    assert_abs_diff_eq!(info.normal.y, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(info.depth, 0.1, epsilon = 1e-6);
    let contacts = generate_contacts(&info, &a, &b, &config);
    assert_eq!(contacts.len(), 1);
    assert_abs_diff_eq!(contacts.points()[0].point_b.y, 0.4, epsilon = 1e-6);

    let flipped = detect(&b, &a, &config);
    assert_abs_diff_eq!(flipped.normal.y, -1.0, epsilon = 1e-6);
}

#[test]
fn test_sweep_catches_tunneling() {
    let config = NarrowphaseConfig::default();
    let bullet = Shape::circle(0.1);
    let wall = Shape::rectangle(0.2, 4.0);
    let a = at(&bullet, -5.0, 0.0);
    let b = at(&wall, 0.0, 0.0);

    // Both end poses are clear of the wall
    assert!(!gjk(&a.translated(DVec2::new(10.0, 0.0)), &b, &config).1);
    let t = sweep_test(&a, DVec2::new(10.0, 0.0), &b, DVec2::ZERO, &config).unwrap();
    assert_abs_diff_eq!(t, 0.48, epsilon = 1e-3);

    assert!(sweep_test(&a, DVec2::new(0.0, 10.0), &b, DVec2::ZERO, &config).is_none());
}

#[test]
fn test_random_circle_pairs_match_exact_answer() {
    let config = NarrowphaseConfig::default();
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..2000 {
        let (r1, r2): (f64, f64) = (rng.gen_range(0.2..2.0), rng.gen_range(0.2..2.0));
        let reach = r1 + r2;
        let d = rng.gen_range(0.05..1.5 * reach);
        if (d - reach).abs() < 1e-6 {
            continue;
        }
        let dir = DVec2::from_angle(rng.gen_range(0.0..std::f64::consts::TAU));
        let origin = DVec2::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
        let (ca, cb) = (Shape::circle(r1), Shape::circle(r2));
        let a = at(&ca, origin.x, origin.y);
        let b = at(&cb, origin.x + dir.x * d, origin.y + dir.y * d);

        let overlap = gjk(&a, &b, &config).1;
        assert_eq!(overlap, d < reach, "r1={r1} r2={r2} d={d} dir={dir}");

        let info = detect(&a, &b, &config);
        if d < reach {
            assert_abs_diff_eq!(info.depth, reach - d, epsilon = 1e-3);
            if reach - d > 1e-3 {
                assert!(info.normal.dot(dir) > 0.999, "normal {} for dir {dir}", info.normal);
            }
        } else {
            assert_abs_diff_eq!(distance(&a, &b, &config).distance, d - reach, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_curved_shapes_agree_with_distance_around_the_clock() {
    let config = NarrowphaseConfig::default();
    let ball = Shape::circle(0.4);
    let bodies = [Shape::capsule(2.0, 0.8), Shape::ellipse(3.0, 1.2), Shape::circle(0.9)];
    for body in &bodies {
        let a = ShapePrimitive::new(body, Transform::new(DVec2::new(-0.5, 0.25), 0.6));
        for degrees in (0..360).step_by(3) {
            let normal = DVec2::from_angle((degrees as f64).to_radians());
            let (surface, _) = a.support(normal);
            // A ball centered on the outward normal is exactly `depth` into the body
            for offset in [-0.25, -0.05, 0.05, 0.25] {
                let center = surface + normal * (0.4 + offset);
                let b = at(&ball, center.x, center.y);
                let overlap = gjk(&a, &b, &config).1;
                let result = distance(&a, &b, &config);
                assert_eq!(overlap, offset < 0.0, "{:?} at {degrees} degrees", body.kind());
                assert_eq!(overlap, result.overlap);
                if overlap {
                    let info = detect(&a, &b, &config);
                    assert_abs_diff_eq!(info.depth, -offset, epsilon = 1e-3);
                    assert!(info.normal.dot(normal) > 0.99);
                } else {
                    assert_abs_diff_eq!(result.distance, offset, epsilon = 1e-5);
                }
            }
        }
    }
}
