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
//! Column-wise integration helpers

#[cfg(feature = "simd")]
use crate::simd::step_columns;

#[cfg(not(feature = "simd"))]
fn step_columns(values: &mut [f64], rates: &[f64], dt: f64) {
    for (v, r) in values.iter_mut().zip(rates) {
        *v += r * dt;
    }
}

/// Velocity columns: `v' = v + a * dt`, `w' = w + alpha * dt`
pub fn simd_update_velocities(
    vx: &mut [f64],
    vy: &mut [f64],
    w: &mut [f64],
    ax: &[f64],
    ay: &[f64],
    alpha: &[f64],
    dt: f64,
) {
    step_columns(vx, ax, dt);
    step_columns(vy, ay, dt);
    step_columns(w, alpha, dt);
}

/// Pose columns: `p' = p + v * dt`, `theta' = theta + w * dt`
pub fn simd_update_positions(
    px: &mut [f64],
    py: &mut [f64],
    angle: &mut [f64],
    vx: &[f64],
    vy: &[f64],
    w: &[f64],
    dt: f64,
) {
    step_columns(px, vx, dt);
    step_columns(py, vy, dt);
    step_columns(angle, w, dt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_velocities() {
        let mut vx = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut vy = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let mut w = vec![0.0; 5];
        let ax = vec![0.5, 1.0, 1.5, 2.0, 2.5];
        let ay = vec![-9.81; 5];
        let alpha = vec![1.0; 5];

        simd_update_velocities(&mut vx, &mut vy, &mut w, &ax, &ay, &alpha, 0.1);

        assert!((vx[0] - 1.05).abs() < 1e-12);
        assert!((vx[4] - 5.25).abs() < 1e-12);
        assert!((vy[1] - (1.0 - 0.981)).abs() < 1e-12);
        assert!(w.iter().all(|x| (x - 0.1).abs() < 1e-12));
    }

    #[test]
    fn test_update_positions_non_aligned() {
        let mut px = vec![0.0, 1.0, 2.0];
        let mut py = vec![0.0; 3];
        let mut angle = vec![0.0; 3];
        let vx = vec![10.0, 20.0, 30.0];
        let vy = vec![1.0, 2.0, 3.0];
        let w = vec![0.5; 3];

        simd_update_positions(&mut px, &mut py, &mut angle, &vx, &vy, &w, 0.1);

        assert!((px[2] - 5.0).abs() < 1e-12);
        assert!((py[1] - 0.2).abs() < 1e-12);
        assert!((angle[0] - 0.05).abs() < 1e-12);
    }
}
