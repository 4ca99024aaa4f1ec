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
//! Benchmarks for the per-pair collision pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use physics2d::config::{EpaMethod, NarrowphaseConfig};
use physics2d::geometry::{Polygon, Shape};
use physics2d::math::{DVec2, Transform};
use physics2d::narrowphase::{detect, distance, epa, epa_priority, generate_contacts, gjk, ShapePrimitive};

fn bench_gjk(c: &mut Criterion) {
    let config = NarrowphaseConfig::default();
    let hexagon = Shape::Polygon(Polygon::regular(6, 1.0));
    let ball = Shape::circle(0.8);
    let a = ShapePrimitive::new(&hexagon, Transform::new(DVec2::ZERO, 0.3));
    let near = ShapePrimitive::new(&ball, Transform::from_position(DVec2::new(1.5, 0.2)));
    let far = ShapePrimitive::new(&ball, Transform::from_position(DVec2::new(4.0, 0.2)));

    let mut group = c.benchmark_group("gjk");
    group.bench_function("overlap", |b| b.iter(|| gjk(black_box(&a), black_box(&near), &config)));
    group.bench_function("distance", |b| b.iter(|| distance(black_box(&a), black_box(&far), &config)));
    group.finish();
}

fn bench_epa(c: &mut Criterion) {
    let config = NarrowphaseConfig::default();
    let octagon = Shape::Polygon(Polygon::regular(8, 1.0));
    let ellipse = Shape::ellipse(2.0, 1.2);
    let a = ShapePrimitive::new(&octagon, Transform::identity());
    let b = ShapePrimitive::new(&ellipse, Transform::new(DVec2::new(0.9, 0.4), 0.5));
    let (simplex, _) = gjk(&a, &b, &config);

    let mut group = c.benchmark_group("epa");
    group.bench_function("linear", |bench| bench.iter(|| epa(black_box(&simplex), &a, &b, &config)));
    group.bench_function("priority_queue", |bench| {
        bench.iter(|| epa_priority(black_box(&simplex), &a, &b, &config))
    });
    group.finish();
}

fn bench_contacts(c: &mut Criterion) {
    let square = Shape::rectangle(1.0, 1.0);
    let a = ShapePrimitive::new(&square, Transform::identity());
    let b = ShapePrimitive::new(&square, Transform::new(DVec2::new(0.9, 0.1), 0.05));

    let mut group = c.benchmark_group("detect_and_clip");
    for method in [EpaMethod::Linear, EpaMethod::PriorityQueue] {
        let config = NarrowphaseConfig::default().with_epa_method(method);
        group.bench_function(format!("{method:?}"), |bench| {
            bench.iter(|| {
                let info = detect(black_box(&a), black_box(&b), &config);
                generate_contacts(&info, &a, &b, &config)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_gjk, bench_epa, bench_contacts);
criterion_main!(benches);
