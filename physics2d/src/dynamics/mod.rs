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
//! Rigid bodies, the contact solver and the world that steps them

mod body;
mod solver;
mod world;

pub use body::{unit_inertia, Body, BodySet, Mass};
pub use solver::{prepare, solve_position, solve_velocity, warm_start, Batch, BodyState, ContactSolver};
pub use world::{PhysicsWorld, RayHit, StepStats};
