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
//! Sequential-impulse contact solver
//!
//! Per manifold the solver works in three stages:
//!
//! 1. [`prepare`] computes lever arms, effective masses, the restitution
//!    target and, for two-point manifolds, the 2x2 block matrix
//! 2. [`warm_start`] reapplies last step's accumulated impulses
//! 3. [`solve_velocity`] runs friction and then the normal constraint, and
//!    [`solve_position`] pushes remaining penetration out after integration
//!
//! [`ContactSolver`] drives these kernels over batches of manifolds. Batches
//! built from one color of the contact graph share no movable body, so their
//! manifolds may be solved on a worker pool against a snapshot of body state
//! with the results scattered back afterwards.

use crate::config::SolverConfig;
use crate::contact::ContactManifold;
use crate::math::{cross, cross_scalar, recip_or_zero, DMat2, DVec2, Transform};
use tracing::{trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Solver view of one body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    /// Center of mass
    pub position: DVec2,
    /// Rotation in radians
    pub rotation: f64,
    /// Linear velocity
    pub velocity: DVec2,
    /// Angular velocity
    pub angular_velocity: f64,
    /// Inverse mass
    pub inverse_mass: f64,
    /// Inverse moment of inertia
    pub inverse_inertia: f64,
}

impl BodyState {
    /// Pose
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    /// Whether impulses can change this body
    pub fn is_movable(&self) -> bool {
        self.inverse_mass > 0.0 || self.inverse_inertia > 0.0
    }

    fn velocity_at(&self, r: DVec2) -> DVec2 {
        self.velocity + cross_scalar(self.angular_velocity, r)
    }

    fn apply_velocity_impulse(&mut self, impulse: DVec2, r: DVec2) {
        self.velocity += impulse * self.inverse_mass;
        self.angular_velocity += self.inverse_inertia * cross(r, impulse);
    }

    fn apply_position_impulse(&mut self, impulse: DVec2, r: DVec2) {
        self.position += impulse * self.inverse_mass;
        self.rotation += self.inverse_inertia * cross(r, impulse);
    }
}

fn effective_mass(a: &BodyState, b: &BodyState, r_a: DVec2, r_b: DVec2, axis: DVec2) -> f64 {
    let rn_a = cross(r_a, axis);
    let rn_b = cross(r_b, axis);
    a.inverse_mass + b.inverse_mass + a.inverse_inertia * rn_a * rn_a + b.inverse_inertia * rn_b * rn_b
}

/// Compute the per-step constants of a manifold
///
/// Uses the current body poses and velocities, so it runs after velocity
/// integration and before [`warm_start`]. Without warm starting the
/// accumulated impulses are cleared here.
pub fn prepare(manifold: &mut ContactManifold, a: &BodyState, b: &BodyState, config: &SolverConfig) {
    if !config.warm_start {
        manifold.reset_impulses();
    }
    let normal = manifold.normal;
    let tangent = manifold.tangent;
    let restitution = manifold.restitution;
    let tf_a = a.transform();
    let tf_b = b.transform();

    for c in manifold.contacts_mut() {
        let point = 0.5 * (tf_a.apply(c.local_anchor_a) + tf_b.apply(c.local_anchor_b));
        c.r_a = point - a.position;
        c.r_b = point - b.position;
        c.normal_mass = recip_or_zero(effective_mass(a, b, c.r_a, c.r_b, normal));
        c.tangent_mass = recip_or_zero(effective_mass(a, b, c.r_a, c.r_b, tangent));

        let approach = normal.dot(b.velocity_at(c.r_b) - a.velocity_at(c.r_a));
        c.velocity_bias = if approach < -config.restitution_threshold {
            -restitution * approach
        } else {
            0.0
        };
    }

    manifold.block = false;
    if config.block_solver && manifold.len() == 2 {
        let (c1, c2) = (manifold.contacts()[0], manifold.contacts()[1]);
        let rn1_a = cross(c1.r_a, normal);
        let rn1_b = cross(c1.r_b, normal);
        let rn2_a = cross(c2.r_a, normal);
        let rn2_b = cross(c2.r_b, normal);
        let m = a.inverse_mass + b.inverse_mass;
        let k11 = m + a.inverse_inertia * rn1_a * rn1_a + b.inverse_inertia * rn1_b * rn1_b;
        let k22 = m + a.inverse_inertia * rn2_a * rn2_a + b.inverse_inertia * rn2_b * rn2_b;
        let k12 = m + a.inverse_inertia * rn1_a * rn2_a + b.inverse_inertia * rn1_b * rn2_b;
        let det = k11 * k22 - k12 * k12;

        if k11 * k11 < config.max_condition_number * det {
            manifold.k = DMat2::from_cols(DVec2::new(k11, k12), DVec2::new(k12, k22));
            manifold.normal_mass_matrix = manifold.k.inverse();
            manifold.block = true;
        } else {
            trace!(pair = %manifold.pair, "block matrix ill-conditioned, solving points one by one");
        }
    }
}

/// Reapply the accumulated impulses
pub fn warm_start(manifold: &ContactManifold, a: &mut BodyState, b: &mut BodyState) {
    for c in manifold.contacts() {
        let p = manifold.normal * c.normal_impulse + manifold.tangent * c.tangent_impulse;
        a.apply_velocity_impulse(-p, c.r_a);
        b.apply_velocity_impulse(p, c.r_b);
    }
}

/// One velocity iteration: friction first, then the normal constraint
pub fn solve_velocity(manifold: &mut ContactManifold, a: &mut BodyState, b: &mut BodyState) {
    let normal = manifold.normal;
    let tangent = manifold.tangent;
    let friction = manifold.friction;

    for c in manifold.contacts_mut() {
        let dv = b.velocity_at(c.r_b) - a.velocity_at(c.r_a);
        let lambda = -c.tangent_mass * dv.dot(tangent);
        let bound = friction * c.normal_impulse;
        let accumulated = (c.tangent_impulse + lambda).clamp(-bound, bound);
        let p = tangent * (accumulated - c.tangent_impulse);
        c.tangent_impulse = accumulated;
        a.apply_velocity_impulse(-p, c.r_a);
        b.apply_velocity_impulse(p, c.r_b);
    }

    if manifold.block {
        solve_block(manifold, a, b);
        return;
    }

    for c in manifold.contacts_mut() {
        let dv = b.velocity_at(c.r_b) - a.velocity_at(c.r_a);
        let lambda = -c.normal_mass * (dv.dot(normal) - c.velocity_bias);
        let accumulated = (c.normal_impulse + lambda).max(0.0);
        let p = normal * (accumulated - c.normal_impulse);
        c.normal_impulse = accumulated;
        a.apply_velocity_impulse(-p, c.r_a);
        b.apply_velocity_impulse(p, c.r_b);
    }
}

/// Two-point normal solve as a linear complementarity problem
///
/// Finds `x >= 0` with `vn = K x + b >= 0` and `x · vn = 0` by trying the
/// four active sets in turn: both points pushing, only the first, only the
/// second, neither. If none is consistent the impulses are left unchanged.
fn solve_block(manifold: &mut ContactManifold, a: &mut BodyState, b: &mut BodyState) {
    let normal = manifold.normal;
    let k = manifold.k;
    let inv_k = manifold.normal_mass_matrix;
    let [c1, c2] = match manifold.contacts() {
        [c1, c2] => [*c1, *c2],
        _ => return,
    };

    let old = DVec2::new(c1.normal_impulse, c2.normal_impulse);
    let vn1 = normal.dot(b.velocity_at(c1.r_b) - a.velocity_at(c1.r_a));
    let vn2 = normal.dot(b.velocity_at(c2.r_b) - a.velocity_at(c2.r_a));
    let rhs = DVec2::new(vn1 - c1.velocity_bias, vn2 - c2.velocity_bias) - k * old;

    let both = -(inv_k * rhs);
    let first = DVec2::new(-c1.normal_mass * rhs.x, 0.0);
    let second = DVec2::new(0.0, -c2.normal_mass * rhs.y);

    let x = if both.x >= 0.0 && both.y >= 0.0 {
        both
    } else if first.x >= 0.0 && k.x_axis.y * first.x + rhs.y >= 0.0 {
        first
    } else if second.y >= 0.0 && k.y_axis.x * second.y + rhs.x >= 0.0 {
        second
    } else if rhs.x >= 0.0 && rhs.y >= 0.0 {
        DVec2::ZERO
    } else {
        trace!(pair = %manifold.pair, "block solve found no consistent active set");
        return;
    };

    let d = x - old;
    let p1 = normal * d.x;
    let p2 = normal * d.y;
    a.apply_velocity_impulse(-p1, c1.r_a);
    a.apply_velocity_impulse(-p2, c2.r_a);
    b.apply_velocity_impulse(p1, c1.r_b);
    b.apply_velocity_impulse(p2, c2.r_b);

    let contacts = manifold.contacts_mut();
    contacts[0].normal_impulse = x.x;
    contacts[1].normal_impulse = x.y;
}

/// One position iteration; returns the smallest separation seen
///
/// Separation is measured along the manifold normal between the current
/// world anchors. The correction removes `baumgarte` of the error past the
/// slop, capped at `max_correction`, and changes poses only.
pub fn solve_position(manifold: &ContactManifold, a: &mut BodyState, b: &mut BodyState, config: &SolverConfig) -> f64 {
    let normal = manifold.normal;
    let mut min_separation = f64::INFINITY;

    for c in manifold.contacts() {
        let point_a = a.transform().apply(c.local_anchor_a);
        let point_b = b.transform().apply(c.local_anchor_b);
        let separation = (point_b - point_a).dot(normal);
        min_separation = min_separation.min(separation);

        let point = 0.5 * (point_a + point_b);
        let r_a = point - a.position;
        let r_b = point - b.position;
        let error = (config.baumgarte * (separation + config.slop)).clamp(-config.max_correction, 0.0);
        let impulse = -error * recip_or_zero(effective_mass(a, b, r_a, r_b, normal));

        let p = normal * impulse;
        a.apply_position_impulse(-p, r_a);
        b.apply_position_impulse(p, r_b);
    }
    min_separation
}

/// Borrow two distinct entries of a slice mutably
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert_ne!(i, j, "A contact cannot join a body to itself");
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// Manifolds solved together
///
/// An `independent` batch promises that no movable body appears in two of
/// its manifolds.
#[derive(Debug, Default)]
pub struct Batch<'m> {
    /// Manifolds in solve order
    pub manifolds: Vec<&'m mut ContactManifold>,
    /// Whether the manifolds share no movable body
    pub independent: bool,
}

impl<'m> Batch<'m> {
    /// Batch solved strictly in order
    pub fn sequential(manifolds: Vec<&'m mut ContactManifold>) -> Self {
        Batch {
            manifolds,
            independent: false,
        }
    }

    /// Batch whose manifolds share no movable body
    pub fn independent(manifolds: Vec<&'m mut ContactManifold>) -> Self {
        Batch {
            manifolds,
            independent: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Velocity,
    Position,
}

impl Phase {
    fn run(self, manifold: &mut ContactManifold, a: &mut BodyState, b: &mut BodyState, config: &SolverConfig) -> f64 {
        match self {
            Phase::Velocity => {
                solve_velocity(manifold, a, b);
                f64::INFINITY
            }
            Phase::Position => solve_position(manifold, a, b, config),
        }
    }
}

/// Batch driver owning the solver settings and the optional worker pool
#[derive(Debug)]
pub struct ContactSolver {
    config: SolverConfig,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl ContactSolver {
    /// Create a solver; `worker_threads > 0` requests a pool for independent batches
    pub fn new(config: SolverConfig, worker_threads: usize) -> Self {
        #[cfg(feature = "parallel")]
        {
            let pool = if worker_threads > 0 {
                match rayon::ThreadPoolBuilder::new().num_threads(worker_threads).build() {
                    Ok(pool) => Some(pool),
                    Err(err) => {
                        warn!(%err, worker_threads, "could not build solver pool, solving on the calling thread");
                        None
                    }
                }
            } else {
                None
            };
            ContactSolver { config, pool }
        }

        #[cfg(not(feature = "parallel"))]
        {
            if worker_threads > 0 {
                warn!(worker_threads, "built without the parallel feature, solving on the calling thread");
            }
            ContactSolver { config }
        }
    }

    /// Solver settings
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Whether independent batches run on worker threads
    pub fn is_parallel(&self) -> bool {
        #[cfg(feature = "parallel")]
        {
            self.pool.is_some()
        }
        #[cfg(not(feature = "parallel"))]
        {
            false
        }
    }

    /// Prepare and warm start every manifold
    pub fn initialize(&self, batches: &mut [Batch<'_>], states: &mut [BodyState]) {
        for batch in batches.iter_mut() {
            for m in batch.manifolds.iter_mut() {
                let (ia, ib) = (m.index_a, m.index_b);
                prepare(m, &states[ia], &states[ib], &self.config);
                if self.config.warm_start {
                    let (a, b) = pair_mut(states, ia, ib);
                    warm_start(m, a, b);
                }
            }
        }
    }

    /// Velocity iterations over all batches
    pub fn solve_velocities(&self, batches: &mut [Batch<'_>], states: &mut [BodyState], iterations: usize) {
        for _ in 0..iterations {
            for batch in batches.iter_mut() {
                self.run_batch(batch, states, Phase::Velocity);
            }
        }
    }

    /// Position iterations over all batches; returns the smallest separation of the last pass
    pub fn solve_positions(&self, batches: &mut [Batch<'_>], states: &mut [BodyState], iterations: usize) -> f64 {
        let mut min_separation = f64::INFINITY;
        for _ in 0..iterations {
            min_separation = f64::INFINITY;
            for batch in batches.iter_mut() {
                min_separation = min_separation.min(self.run_batch(batch, states, Phase::Position));
            }
        }
        min_separation
    }

    fn run_batch(&self, batch: &mut Batch<'_>, states: &mut [BodyState], phase: Phase) -> f64 {
        #[cfg(feature = "parallel")]
        if batch.independent {
            if let Some(pool) = &self.pool {
                return self.run_parallel(pool, batch, states, phase);
            }
        }

        let mut min_separation = f64::INFINITY;
        for m in batch.manifolds.iter_mut() {
            let (a, b) = pair_mut(states, m.index_a, m.index_b);
            min_separation = min_separation.min(phase.run(m, a, b, &self.config));
        }
        min_separation
    }

    #[cfg(feature = "parallel")]
    fn run_parallel(
        &self,
        pool: &rayon::ThreadPool,
        batch: &mut Batch<'_>,
        states: &mut [BodyState],
        phase: Phase,
    ) -> f64 {
        let config = &self.config;
        let snapshot: &[BodyState] = states;
        let results: Vec<(usize, BodyState, usize, BodyState, f64)> = pool.install(|| {
            batch
                .manifolds
                .par_iter_mut()
                .map(|m| {
                    let (ia, ib) = (m.index_a, m.index_b);
                    let mut a = snapshot[ia];
                    let mut b = snapshot[ib];
                    let separation = phase.run(m, &mut a, &mut b, config);
                    (ia, a, ib, b, separation)
                })
                .collect()
        });

        let mut min_separation = f64::INFINITY;
        for (ia, a, ib, b, separation) in results {
            if a.is_movable() {
                states[ia] = a;
            }
            if b.is_movable() {
                states[ib] = b;
            }
            min_separation = min_separation.min(separation);
        }
        min_separation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;
    use crate::narrowphase::{ContactFeature, ContactPair, ContactPoint, FeatureId};
    use crate::object::{ObjectId, ObjectPair};
    use approx::assert_abs_diff_eq;

    fn ground() -> BodyState {
        BodyState::default()
    }

    fn unit_box(y: f64, vy: f64) -> BodyState {
        BodyState {
            position: DVec2::new(0.0, y),
            velocity: DVec2::new(0.0, vy),
            inverse_mass: 1.0,
            inverse_inertia: 6.0,
            ..Default::default()
        }
    }

    /// Box of width 1 resting on a ground top at y = 0, penetrating by `depth`
    fn resting_manifold(depth: f64, box_y: f64, points: usize) -> ContactManifold {
        let mut pair = ContactPair::new(DVec2::Y);
        for (i, x) in [-0.5, 0.5].into_iter().take(points).enumerate() {
            pair.push(ContactPoint {
                point_a: DVec2::new(x, 0.0),
                point_b: DVec2::new(x, -depth),
                depth,
                id: FeatureId::new(ContactFeature::Edge(2), ContactFeature::Vertex(i as u32)),
            });
        }
        let mut m = ContactManifold::new(ObjectPair::new(ObjectId::new(0), ObjectId::new(1)), 0.5, 0.0);
        m.update(
            &pair,
            &Transform::identity(),
            &Transform::from_position(DVec2::new(0.0, box_y)),
            0.05,
        );
        m.index_a = 0;
        m.index_b = 1;
        m
    }

    #[test]
    fn test_falling_box_is_stopped() {
        for block in [false, true] {
            let config = SolverConfig::default().with_block_solver(block);
            let mut m = resting_manifold(0.0, 0.5, 2);
            let mut a = ground();
            let mut b = unit_box(0.5, -0.5);
            prepare(&mut m, &a, &b, &config);
            assert_eq!(m.block, block);
            for _ in 0..50 {
                solve_velocity(&mut m, &mut a, &mut b);
            }
            assert_abs_diff_eq!(b.velocity.y, 0.0, epsilon = 1e-7);
            assert_abs_diff_eq!(b.angular_velocity, 0.0, epsilon = 1e-7);
            assert_abs_diff_eq!(m.total_normal_impulse(), 0.5, epsilon = 1e-7);
            assert_eq!(a, ground());
        }
    }

    #[test]
    fn test_converged_contact_adds_no_impulse() {
        let config = SolverConfig::default();
        let mut m = resting_manifold(0.0, 0.5, 2);
        let mut a = ground();
        let mut b = unit_box(0.5, 0.0);
        prepare(&mut m, &a, &b, &config);
        solve_velocity(&mut m, &mut a, &mut b);
        let before: Vec<(f64, f64)> = m.contacts().iter().map(|c| (c.normal_impulse, c.tangent_impulse)).collect();
        solve_velocity(&mut m, &mut a, &mut b);
        let after: Vec<(f64, f64)> = m.contacts().iter().map(|c| (c.normal_impulse, c.tangent_impulse)).collect();
        assert_eq!(before, after);
        assert_eq!(after, vec![(0.0, 0.0), (0.0, 0.0)]);
        assert_eq!(b.velocity, DVec2::ZERO);

        // A box that was falling settles to an impulse of 0.5, then stays put
        for block in [false, true] {
            let config = SolverConfig::default().with_block_solver(block);
            let mut m = resting_manifold(0.0, 0.5, 2);
            let mut a = ground();
            let mut b = unit_box(0.5, -0.5);
            prepare(&mut m, &a, &b, &config);
            for _ in 0..200 {
                solve_velocity(&mut m, &mut a, &mut b);
            }
            assert_abs_diff_eq!(m.total_normal_impulse(), 0.5, epsilon = 1e-9);

            let settled: Vec<(f64, f64)> = m.contacts().iter().map(|c| (c.normal_impulse, c.tangent_impulse)).collect();
            let velocity = (b.velocity, b.angular_velocity);
            solve_velocity(&mut m, &mut a, &mut b);
            for (c, (normal, tangent)) in m.contacts().iter().zip(settled) {
                assert_abs_diff_eq!(c.normal_impulse, normal, epsilon = 1e-9);
                assert_abs_diff_eq!(c.tangent_impulse, tangent, epsilon = 1e-9);
            }
            assert_abs_diff_eq!(b.velocity.y, velocity.0.y, epsilon = 1e-9);
            assert_abs_diff_eq!(b.angular_velocity, velocity.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_separating_contact_is_not_pulled() {
        let mut m = resting_manifold(0.0, 0.5, 1);
        let mut a = ground();
        let mut b = unit_box(0.5, 2.0);
        prepare(&mut m, &a, &b, &SolverConfig::default());
        solve_velocity(&mut m, &mut a, &mut b);
        assert_eq!(b.velocity.y, 2.0);
        assert_eq!(m.contacts()[0].normal_impulse, 0.0);
    }

    #[test]
    fn test_friction_is_bounded() {
        let mut m = resting_manifold(0.0, 0.5, 1);
        m.contacts_mut()[0].normal_impulse = 1.0;
        let mut a = ground();
        let mut b = unit_box(0.5, 0.0);
        b.velocity.x = 10.0;
        b.inverse_inertia = 0.0;
        let config = SolverConfig::default().with_warm_start(true);
        prepare(&mut m, &a, &b, &config);
        solve_velocity(&mut m, &mut a, &mut b);
        // Friction 0.5 times the normal impulse of 1
        assert_abs_diff_eq!(m.contacts()[0].tangent_impulse, -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b.velocity.x, 9.5, epsilon = 1e-12);
    }

    #[test]
    fn test_restitution_bias() {
        let config = SolverConfig::default();
        let mut m = resting_manifold(0.0, 0.5, 1);
        m.restitution = 0.5;
        let mut a = ground();
        let mut b = unit_box(0.5, -4.0);
        b.inverse_inertia = 0.0;
        prepare(&mut m, &a, &b, &config);
        assert_abs_diff_eq!(m.contacts()[0].velocity_bias, 2.0);
        for _ in 0..4 {
            solve_velocity(&mut m, &mut a, &mut b);
        }
        assert_abs_diff_eq!(b.velocity.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_position_correction_respects_slop_and_cap() {
        let config = SolverConfig::default();
        let mut a = ground();

        let shallow = resting_manifold(0.004, 0.496, 1);
        let mut b = unit_box(0.496, 0.0);
        let separation = solve_position(&shallow, &mut a, &mut b, &config);
        assert_abs_diff_eq!(separation, -0.004, epsilon = 1e-12);
        assert_eq!(b.position.y, 0.496);

        let deep = resting_manifold(2.0, -1.5, 1);
        let mut b = unit_box(-1.5, 0.0);
        b.inverse_inertia = 0.0;
        solve_position(&deep, &mut a, &mut b, &config);
        assert_abs_diff_eq!(b.position.y, -1.5 + config.max_correction, epsilon = 1e-12);
        assert_eq!(a, ground());
    }

    #[test]
    fn test_immovable_pair_gets_zero_correction() {
        let m = resting_manifold(0.5, 0.0, 1);
        let mut a = ground();
        let mut b = ground();
        solve_position(&m, &mut a, &mut b, &SolverConfig::default());
        assert_eq!(b, ground());
    }

    #[test]
    fn test_ill_conditioned_block_falls_back() {
        let mut pair = ContactPair::new(DVec2::Y);
        for i in 0..2 {
            pair.push(ContactPoint {
                point_a: DVec2::new(1e-9 * i as f64, 0.0),
                point_b: DVec2::new(1e-9 * i as f64, 0.0),
                depth: 0.0,
                id: FeatureId::new(ContactFeature::Edge(0), ContactFeature::Vertex(i)),
            });
        }
        let mut m = ContactManifold::new(ObjectPair::new(ObjectId::new(0), ObjectId::new(1)), 0.5, 0.0);
        m.update(&pair, &Transform::identity(), &Transform::from_position(DVec2::new(0.0, 0.5)), 0.05);
        prepare(&mut m, &ground(), &unit_box(0.5, 0.0), &SolverConfig::default());
        assert!(!m.block);
    }

    #[test]
    fn test_pair_mut() {
        let mut values = [1, 2, 3];
        let (x, y) = pair_mut(&mut values, 2, 0);
        std::mem::swap(x, y);
        assert_eq!(values, [3, 2, 1]);
    }
}
