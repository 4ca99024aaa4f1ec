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
//! # physics2d
//!
//! Collision detection and contact solving for 2D rigid bodies.
//!
//! ## Features
//!
//! - **Broadphase**: dynamic AABB tree or uniform grid behind one trait
//! - **Narrowphase**: GJK, EPA, contact clipping and a linear sweep test
//! - **Contacts**: persistent manifolds with warm starting and a greedy
//!   edge coloring of the contact graph
//! - **Solver**: sequential impulses with an optional two-point block
//!   solver; color classes run on a Rayon pool with the `parallel` feature
//! - **Integration**: scalar or SIMD column updates, the latter with the
//!   `simd` feature
//!
//! ## Example
//!
//! ```rust
//! use physics2d::config::WorldConfig;
//! use physics2d::dynamics::{Body, Mass, PhysicsWorld};
//! use physics2d::geometry::Shape;
//! use physics2d::math::DVec2;
//!
//! let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
//! world.add_body(Body::fixed(Shape::rectangle(20.0, 1.0)));
//! let crate_box = world.add_body(
//!     Body::new(Shape::rectangle(1.0, 1.0), Mass::new(2.0)).with_position(DVec2::new(0.0, 3.0)),
//! );
//!
//! for _ in 0..120 {
//!     world.step(1.0 / 60.0);
//! }
//! assert!(world.body(crate_box).unwrap().position.y < 3.0);
//! ```

#![warn(missing_docs)]

/// Vector types and small geometric helpers
pub mod math;

/// Object ids and unordered id pairs
pub mod object;

/// Shapes and bounding boxes
pub mod geometry;

/// World and component configuration
pub mod config;

/// Candidate pair search
pub mod broadphase;

/// Exact shape queries
pub mod narrowphase;

/// Persistent contacts and the contact graph
pub mod contact;

/// Bodies, the contact solver and the world
pub mod dynamics;

/// Velocity and position integration
pub mod integration;

/// SIMD vectorization support
#[cfg(feature = "simd")]
pub mod simd;

pub use config::WorldConfig;
pub use dynamics::{Body, Mass, PhysicsWorld};
pub use object::{ObjectId, ObjectPair};
