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
//! Contact persistence and batching
//!
//! - [`ContactManifold`] keeps the solver state of one touching pair across
//!   steps so impulses can be warm started
//! - [`ContactMaintainer`] owns all manifolds and retires separated pairs
//! - [`ObjectGraph`] colors touching pairs into batches that share no
//!   movable body

mod graph;
mod maintainer;
mod manifold;

pub use graph::ObjectGraph;
pub use maintainer::{ContactMaintainer, Refresh};
pub use manifold::{mix_friction, mix_restitution, ContactManifold, SingleContact};
