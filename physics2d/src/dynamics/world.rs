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
//! The simulation world and its step loop
//!
//! One call to [`PhysicsWorld::step`] runs, in order:
//!
//! 1. broadphase refresh and overlap query
//! 2. narrowphase on every candidate pair, feeding the contact store and
//!    the coloring graph
//! 3. velocity integration
//! 4. contact preparation, warm starting and velocity iterations
//! 5. position integration and position iterations
//! 6. write-back into the bodies

use super::body::{Body, BodySet};
use super::solver::{Batch, BodyState, ContactSolver};
use crate::broadphase::{self, Broadphase, ObjectBinding};
use crate::config::{ConfigError, SolveMode, WorldConfig};
use crate::contact::{mix_friction, mix_restitution, ContactMaintainer, ContactManifold, ObjectGraph, Refresh};
use crate::geometry::Aabb;
use crate::integration::{integrate_positions, integrate_velocities, Acceleration, Damping};
use crate::math::DVec2;
use crate::narrowphase::{detect, generate_contacts, ray_cast, ShapePrimitive};
use crate::object::{ObjectId, ObjectPair};
use tracing::{debug, trace, warn};

/// One body hit by [`PhysicsWorld::raycast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Body that was hit
    pub id: ObjectId,
    /// Distance from the ray origin to the first point of the body
    pub distance: f64,
}

/// Counters reported by one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepStats {
    /// Pairs reported by the broadphase
    pub candidate_pairs: usize,
    /// Pairs that went through the narrowphase
    pub tested_pairs: usize,
    /// Live manifolds after the step
    pub manifolds: usize,
    /// Contact points across all manifolds
    pub contact_points: usize,
    /// Color classes in the contact graph
    pub colors: usize,
    /// Smallest separation seen by the last position iteration, infinite without contacts
    pub min_separation: f64,
}

impl Default for StepStats {
    fn default() -> Self {
        StepStats {
            candidate_pairs: 0,
            tested_pairs: 0,
            manifolds: 0,
            contact_points: 0,
            colors: 0,
            min_separation: f64::INFINITY,
        }
    }
}

/// Rigid bodies plus everything needed to advance them
///
/// # Examples
///
/// ```
/// use physics2d::config::WorldConfig;
/// use physics2d::dynamics::{Body, Mass, PhysicsWorld};
/// use physics2d::geometry::Shape;
/// use physics2d::math::DVec2;
///
/// let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
/// let ball = world.add_body(
///     Body::new(Shape::circle(0.5), Mass::new(1.0)).with_position(DVec2::new(0.0, 10.0)),
/// );
/// world.step(1.0 / 60.0);
/// assert!(world.body(ball).unwrap().velocity.y < 0.0);
/// ```
pub struct PhysicsWorld {
    config: WorldConfig,
    bodies: BodySet,
    broadphase: Box<dyn Broadphase<()>>,
    contacts: ContactMaintainer,
    graph: ObjectGraph,
    solver: ContactSolver,
    steps: u64,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.bodies.len())
            .field("manifolds", &self.contacts.len())
            .field("colors", &self.graph.color_count())
            .field("steps", &self.steps)
            .finish()
    }
}

impl PhysicsWorld {
    /// Empty world
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found in `config`.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let broadphase = broadphase::from_config(&config.broadphase);
        let contacts = ContactMaintainer::new(config.solver.anchor_match_distance);
        let solver = ContactSolver::new(config.solver, config.worker_threads);
        debug!(
            broadphase = ?config.broadphase,
            solve_mode = ?config.solve_mode,
            parallel = solver.is_parallel(),
            "created physics world"
        );
        Ok(PhysicsWorld {
            config,
            bodies: BodySet::new(),
            broadphase,
            contacts,
            graph: ObjectGraph::new(),
            solver,
            steps: 0,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Insert a body and return its id
    pub fn add_body(&mut self, body: Body) -> ObjectId {
        let binding = (body.mask, body.aabb(), body.is_immovable());
        let id = self.bodies.insert(body);
        let (mask, aabb, immovable) = binding;
        self.broadphase.add_object(ObjectBinding::new(id, mask, aabb, ()));
        self.graph.set_repeat_exempt(id, immovable);
        id
    }

    /// Remove a body together with its contacts
    pub fn remove_body(&mut self, id: ObjectId) -> Option<Body> {
        let body = self.bodies.remove(id)?;
        self.broadphase.remove_object(id);
        self.contacts.remove_object(id);
        self.graph.remove_object(id);
        Some(body)
    }

    /// Body by id
    pub fn body(&self, id: ObjectId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Body by id, mutably
    ///
    /// Pose, mask and mass changes are picked up by the next step.
    pub fn body_mut(&mut self, id: ObjectId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    /// All bodies
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// Live contact manifolds
    pub fn contacts(&self) -> &ContactMaintainer {
        &self.contacts
    }

    /// Manifold between two bodies, in either order
    pub fn contact(&self, x: ObjectId, y: ObjectId) -> Option<&ContactManifold> {
        self.contacts.get(&ObjectPair::new(x, y))
    }

    /// Colored contact graph
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// Groups of movable bodies linked through contacts
    pub fn islands(&mut self) -> Vec<Vec<ObjectId>> {
        self.graph.islands()
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Bodies whose bounds overlap `region`
    ///
    /// Bounds are those of the last step or insertion. Ids come back sorted.
    pub fn query_aabb(&self, region: &Aabb) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .broadphase
            .query_aabb(region)
            .into_iter()
            .filter(|&id| self.bodies.get(id).is_some_and(|b| b.aabb().collide(region)))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Every body along a ray, nearest first
    ///
    /// Ties in distance are ordered by id. A body containing `origin` is hit
    /// at distance zero.
    pub fn raycast(&self, origin: DVec2, direction: DVec2, max_distance: f64) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .broadphase
            .query_ray(origin, direction, max_distance)
            .into_iter()
            .filter_map(|id| {
                let body = self.bodies.get(id)?;
                let target = ShapePrimitive::new(body.shape(), body.transform());
                ray_cast(&target, origin, direction, max_distance, &self.config.narrowphase)
                    .map(|distance| RayHit { id, distance })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        hits
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive and finite.
    pub fn step(&mut self, dt: f64) -> StepStats {
        assert!(dt > 0.0 && dt.is_finite(), "Timestep must be positive and finite");
        let mut stats = StepStats::default();

        self.sync_broadphase();
        let candidates = self.broadphase.query_overlaps();
        stats.candidate_pairs = candidates.len();
        stats.tested_pairs = self.collide(&candidates);

        let mut states: Vec<BodyState> = self.bodies.as_slice().iter().map(Body::state).collect();
        let accelerations: Vec<Acceleration> = self
            .bodies
            .as_slice()
            .iter()
            .map(|b| self.acceleration_of(b))
            .collect();
        let damping = Damping {
            linear: self.config.linear_damping,
            angular: self.config.angular_damping,
        };
        integrate_velocities(&mut states, &accelerations, damping, dt, self.config.integration);

        resolve_body_indices(&mut self.contacts, &self.bodies);
        let mut batches = build_batches(&mut self.contacts, &self.graph, self.config.solve_mode);
        self.solver.initialize(&mut batches, &mut states);
        self.solver
            .solve_velocities(&mut batches, &mut states, self.config.velocity_iterations);
        integrate_positions(&mut states, dt, self.config.integration);
        stats.min_separation = self
            .solver
            .solve_positions(&mut batches, &mut states, self.config.position_iterations);
        drop(batches);

        for (body, state) in self.bodies.as_mut_slice().iter_mut().zip(&states) {
            body.apply_state(state);
            body.clear_forces();
        }

        self.steps += 1;
        stats.manifolds = self.contacts.len();
        stats.contact_points = self.contacts.iter().map(ContactManifold::len).sum();
        stats.colors = self.graph.color_count();
        debug!(
            step = self.steps,
            bodies = self.bodies.len(),
            candidates = stats.candidate_pairs,
            manifolds = stats.manifolds,
            colors = stats.colors,
            min_separation = stats.min_separation,
            "step complete"
        );
        stats
    }

    fn acceleration_of(&self, body: &Body) -> Acceleration {
        if body.is_immovable() {
            return Acceleration::default();
        }
        Acceleration {
            linear: self.config.gravity + body.force() * body.inverse_mass(),
            angular: body.torque() * body.inverse_inertia(),
        }
    }

    /// Push current bounds, masks and mobility into the broadphase and graph
    fn sync_broadphase(&mut self) {
        for (id, body) in self.bodies.iter() {
            let aabb = body.aabb();
            match self.broadphase.binding(id).map(|b| b.mask) {
                Some(mask) if mask == body.mask => self.broadphase.update_object(id, aabb),
                _ => {
                    self.broadphase.remove_object(id);
                    self.broadphase.add_object(ObjectBinding::new(id, body.mask, aabb, ()));
                }
            }

            let immovable = body.is_immovable();
            if self.graph.is_repeat_exempt(id) != immovable {
                let edges = self.graph.remove_object(id);
                self.graph.set_repeat_exempt(id, immovable);
                for pair in edges {
                    self.graph.add_edge(pair);
                }
                trace!(%id, immovable, "body mobility changed, recolored its contacts");
            }
        }

        let interval = self.config.rebuild_interval as u64;
        if interval > 0 && self.steps > 0 && self.steps % interval == 0 {
            self.broadphase.rebuild();
        }
    }

    /// Narrowphase over the candidates; returns how many pairs were tested
    fn collide(&mut self, candidates: &[ObjectPair]) -> usize {
        let mut tested = 0;
        self.contacts.begin_step();
        for &pair in candidates {
            let (Some(a), Some(b)) = (self.bodies.get(pair.a()), self.bodies.get(pair.b())) else {
                continue;
            };
            if a.is_immovable() && b.is_immovable() {
                continue;
            }
            tested += 1;

            let (tf_a, tf_b) = (a.transform(), b.transform());
            let prim_a = ShapePrimitive::new(a.shape(), tf_a);
            let prim_b = ShapePrimitive::new(b.shape(), tf_b);
            let info = detect(&prim_a, &prim_b, &self.config.narrowphase);
            if !info.has_contact() {
                continue;
            }
            let points = generate_contacts(&info, &prim_a, &prim_b, &self.config.narrowphase);
            if points.is_empty() {
                continue;
            }

            let friction = mix_friction(a.friction, b.friction);
            let restitution = mix_restitution(a.restitution, b.restitution);
            if self.contacts.refresh(pair, &points, &tf_a, &tf_b, friction, restitution) == Refresh::Created {
                self.graph.add_edge(pair);
            }
        }

        for pair in self.contacts.end_step() {
            self.graph.remove_edge(pair);
        }
        tested
    }
}

/// Group manifolds for the solver
///
/// Colored mode yields one independent batch per color class, then a
/// sequential batch for anything the graph has not colored.
/// Marks a manifold whose bodies could not be found in the body set
const UNRESOLVED: usize = usize::MAX;

/// Point every manifold at its bodies' slots in the state arrays
///
/// Returns how many manifolds reference a body that is gone; those are
/// marked [`UNRESOLVED`] and left out of the solver batches.
fn resolve_body_indices(contacts: &mut ContactMaintainer, bodies: &BodySet) -> usize {
    let mut missing = 0;
    for m in contacts.iter_mut() {
        let (Some(a), Some(b)) = (bodies.index_of(m.pair.a()), bodies.index_of(m.pair.b())) else {
            debug_assert!(false, "{} references a removed body", m.pair);
            warn!(pair = %m.pair, "contact references a removed body, skipping it");
            m.index_a = UNRESOLVED;
            m.index_b = UNRESOLVED;
            missing += 1;
            continue;
        };
        m.index_a = a;
        m.index_b = b;
    }
    missing
}

fn build_batches<'m>(contacts: &'m mut ContactMaintainer, graph: &ObjectGraph, mode: SolveMode) -> Vec<Batch<'m>> {
    let resolved = contacts.iter_mut().filter(|m| m.index_a != UNRESOLVED && m.index_b != UNRESOLVED);
    match mode {
        SolveMode::Sequential => vec![Batch::sequential(resolved.collect())],
        SolveMode::Colored => {
            let mut by_color: Vec<Vec<&mut ContactManifold>> = (0..graph.color_count()).map(|_| Vec::new()).collect();
            let mut uncolored = Vec::new();
            for m in resolved {
                match graph.color_of(&m.pair) {
                    Some(c) => by_color[c].push(m),
                    None => uncolored.push(m),
                }
            }
            let mut batches: Vec<Batch<'m>> = by_color.into_iter().map(Batch::independent).collect();
            if !uncolored.is_empty() {
                batches.push(Batch::sequential(uncolored));
            }
            batches
        }
    }
}
