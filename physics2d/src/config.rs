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
//! Simulation configuration
//!
//! Every tunable of the pipeline lives in one of four plain structs. All of
//! them have sensible defaults, chainable `with_*` setters and a `validate`
//! method; [`WorldConfig::validate`] checks the whole tree and is run by
//! [`crate::dynamics::PhysicsWorld::new`].

use crate::math::DVec2;
use thiserror::Error;

/// Rejected configuration value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero or negative
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Offending field
        field: &'static str,
        /// Value supplied
        value: f64,
    },

    /// A value that must be zero or larger was negative
    #[error("{field} must be non-negative, got {value}")]
    Negative {
        /// Offending field
        field: &'static str,
        /// Value supplied
        value: f64,
    },

    /// A value was NaN or infinite
    #[error("{field} must be finite")]
    NotFinite {
        /// Offending field
        field: &'static str,
    },

    /// A value fell outside its closed range
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        /// Offending field
        field: &'static str,
        /// Value supplied
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// An iteration count was zero
    #[error("{field} must be at least 1")]
    ZeroIterations {
        /// Offending field
        field: &'static str,
    },
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn check_iterations(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroIterations { field })
    } else {
        Ok(())
    }
}

/// Which spatial structure backs the broadphase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BroadphaseConfig {
    /// Dynamic bounding volume tree with fattened leaves
    Dbvt {
        /// Distance leaf boxes are grown by so small motions skip tree updates
        margin: f64,
    },
    /// Uniform grid of fixed-size cells
    Grid {
        /// Cell extent along x
        cell_width: f64,
        /// Cell extent along y
        cell_height: f64,
    },
}

impl Default for BroadphaseConfig {
    fn default() -> Self {
        BroadphaseConfig::Dbvt { margin: 0.1 }
    }
}

impl BroadphaseConfig {
    /// Grid with square cells
    pub fn grid(cell_size: f64) -> Self {
        BroadphaseConfig::Grid {
            cell_width: cell_size,
            cell_height: cell_size,
        }
    }

    /// Check the variant's parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            BroadphaseConfig::Dbvt { margin } => check_non_negative("dbvt margin", margin),
            BroadphaseConfig::Grid {
                cell_width,
                cell_height,
            } => {
                check_positive("grid cell_width", cell_width)?;
                check_positive("grid cell_height", cell_height)
            }
        }
    }
}

/// Strategy used to expand the polytope during penetration queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpaMethod {
    /// Rescan every polytope edge each iteration
    #[default]
    Linear,
    /// Keep candidate edges in a binary heap with lazy invalidation
    PriorityQueue,
}

/// Limits and tolerances for GJK, EPA and contact clipping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrowphaseConfig {
    /// Maximum GJK refinement iterations
    pub gjk_iterations: usize,
    /// Maximum EPA expansion iterations
    pub epa_iterations: usize,
    /// Convergence tolerance for support-point progress
    pub tolerance: f64,
    /// Clipped points separated by more than this are discarded
    pub clip_tolerance: f64,
    /// EPA variant
    pub epa_method: EpaMethod,
}

impl Default for NarrowphaseConfig {
    fn default() -> Self {
        NarrowphaseConfig {
            gjk_iterations: 30,
            epa_iterations: 64,
            tolerance: 1e-9,
            clip_tolerance: 1e-3,
            epa_method: EpaMethod::Linear,
        }
    }
}

impl NarrowphaseConfig {
    /// Set the GJK iteration limit
    pub fn with_gjk_iterations(mut self, iterations: usize) -> Self {
        self.gjk_iterations = iterations;
        self
    }

    /// Set the EPA iteration limit
    pub fn with_epa_iterations(mut self, iterations: usize) -> Self {
        self.epa_iterations = iterations;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Choose the EPA variant
    pub fn with_epa_method(mut self, method: EpaMethod) -> Self {
        self.epa_method = method;
        self
    }

    /// Check limits and tolerances
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_iterations("gjk_iterations", self.gjk_iterations)?;
        check_iterations("epa_iterations", self.epa_iterations)?;
        check_positive("tolerance", self.tolerance)?;
        check_non_negative("clip_tolerance", self.clip_tolerance)
    }
}

/// Contact solver tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Solve two-point manifolds with the 2x2 block solver
    pub block_solver: bool,
    /// Apply last step's accumulated impulses before iterating
    pub warm_start: bool,
    /// Fraction of positional error removed per position iteration
    pub baumgarte: f64,
    /// Penetration allowed without correction
    pub slop: f64,
    /// Largest positional correction applied in one iteration
    pub max_correction: f64,
    /// Approach speed below which restitution is ignored
    pub restitution_threshold: f64,
    /// Anchor distance under which an unmatched point inherits impulses
    pub anchor_match_distance: f64,
    /// Largest condition number of the block matrix still solved as a block
    pub max_condition_number: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            block_solver: true,
            warm_start: true,
            baumgarte: 0.2,
            slop: 0.005,
            max_correction: 0.2,
            restitution_threshold: 1.0,
            anchor_match_distance: 0.05,
            max_condition_number: 1000.0,
        }
    }
}

impl SolverConfig {
    /// Toggle the block solver
    pub fn with_block_solver(mut self, enabled: bool) -> Self {
        self.block_solver = enabled;
        self
    }

    /// Toggle warm starting
    pub fn with_warm_start(mut self, enabled: bool) -> Self {
        self.warm_start = enabled;
        self
    }

    /// Set the Baumgarte factor
    pub fn with_baumgarte(mut self, factor: f64) -> Self {
        self.baumgarte = factor;
        self
    }

    /// Set the penetration slop
    pub fn with_slop(mut self, slop: f64) -> Self {
        self.slop = slop;
        self
    }

    /// Set the per-iteration correction bound
    pub fn with_max_correction(mut self, max_correction: f64) -> Self {
        self.max_correction = max_correction;
        self
    }

    /// Set the restitution velocity threshold
    pub fn with_restitution_threshold(mut self, threshold: f64) -> Self {
        self.restitution_threshold = threshold;
        self
    }

    /// Check tunables
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("baumgarte", self.baumgarte, 0.0, 1.0)?;
        check_non_negative("slop", self.slop)?;
        check_positive("max_correction", self.max_correction)?;
        check_non_negative("restitution_threshold", self.restitution_threshold)?;
        check_non_negative("anchor_match_distance", self.anchor_match_distance)?;
        check_positive("max_condition_number", self.max_condition_number)
    }
}

/// How body velocities and positions are advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationPath {
    /// Straight per-body loop
    #[default]
    Scalar,
    /// Gather into columns and run the SIMD backend (scalar without the `simd` feature)
    Simd,
}

/// Order in which contacts are visited by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMode {
    /// One pass over all manifolds
    #[default]
    Sequential,
    /// Color class by color class; classes run in parallel with the `parallel` feature
    Colored,
}

/// Top-level configuration for [`crate::dynamics::PhysicsWorld`]
///
/// # Examples
///
/// ```
/// use physics2d::config::{BroadphaseConfig, SolveMode, WorldConfig};
/// use physics2d::math::DVec2;
///
/// let config = WorldConfig::default()
///     .with_gravity(DVec2::new(0.0, -10.0))
///     .with_velocity_iterations(10)
///     .with_broadphase(BroadphaseConfig::grid(2.0))
///     .with_solve_mode(SolveMode::Colored);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Constant acceleration applied to every movable body
    pub gravity: DVec2,
    /// Velocity solver iterations per step
    pub velocity_iterations: usize,
    /// Position correction iterations per step (zero disables)
    pub position_iterations: usize,
    /// Linear velocity damping per second
    pub linear_damping: f64,
    /// Angular velocity damping per second
    pub angular_damping: f64,
    /// Integration backend
    pub integration: IntegrationPath,
    /// Contact visiting order
    pub solve_mode: SolveMode,
    /// Worker threads for colored solving (zero solves on the calling thread)
    pub worker_threads: usize,
    /// Rebuild the DBVT every this many steps (zero never rebuilds)
    pub rebuild_interval: usize,
    /// Broadphase structure
    pub broadphase: BroadphaseConfig,
    /// Narrowphase limits
    pub narrowphase: NarrowphaseConfig,
    /// Solver tunables
    pub solver: SolverConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            gravity: DVec2::new(0.0, -9.81),
            velocity_iterations: 8,
            position_iterations: 3,
            linear_damping: 0.0,
            angular_damping: 0.0,
            integration: IntegrationPath::Scalar,
            solve_mode: SolveMode::Sequential,
            worker_threads: 0,
            rebuild_interval: 0,
            broadphase: BroadphaseConfig::default(),
            narrowphase: NarrowphaseConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Set gravity
    pub fn with_gravity(mut self, gravity: DVec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set velocity iterations
    pub fn with_velocity_iterations(mut self, iterations: usize) -> Self {
        self.velocity_iterations = iterations;
        self
    }

    /// Set position iterations
    pub fn with_position_iterations(mut self, iterations: usize) -> Self {
        self.position_iterations = iterations;
        self
    }

    /// Set linear and angular damping
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Choose the integration path
    pub fn with_integration(mut self, path: IntegrationPath) -> Self {
        self.integration = path;
        self
    }

    /// Choose the solve mode
    pub fn with_solve_mode(mut self, mode: SolveMode) -> Self {
        self.solve_mode = mode;
        self
    }

    /// Set the worker thread count for colored solving
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Set the DBVT rebuild interval
    pub fn with_rebuild_interval(mut self, steps: usize) -> Self {
        self.rebuild_interval = steps;
        self
    }

    /// Choose the broadphase
    pub fn with_broadphase(mut self, broadphase: BroadphaseConfig) -> Self {
        self.broadphase = broadphase;
        self
    }

    /// Replace the narrowphase settings
    pub fn with_narrowphase(mut self, narrowphase: NarrowphaseConfig) -> Self {
        self.narrowphase = narrowphase;
        self
    }

    /// Replace the solver settings
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Check the whole configuration tree
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite("gravity.x", self.gravity.x)?;
        check_finite("gravity.y", self.gravity.y)?;
        check_iterations("velocity_iterations", self.velocity_iterations)?;
        check_non_negative("linear_damping", self.linear_damping)?;
        check_non_negative("angular_damping", self.angular_damping)?;
        self.broadphase.validate()?;
        self.narrowphase.validate()?;
        self.solver.validate()
    }
}
