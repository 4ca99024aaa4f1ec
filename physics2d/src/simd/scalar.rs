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
//! Scalar reference kernels, also used for buffer tails

use super::SimdBackend;

/// One element at a time; always available
pub struct ScalarBackend;

impl ScalarBackend {
    #[inline]
    pub(crate) fn step(values: &mut [f64], rates: &[f64], dt: f64) {
        for (v, r) in values.iter_mut().zip(rates) {
            *v += r * dt;
        }
    }
}

impl SimdBackend for ScalarBackend {
    fn name(&self) -> &str {
        "Scalar"
    }

    fn width(&self) -> usize {
        1
    }

    fn is_supported(&self) -> bool {
        true
    }

    unsafe fn step_columns(&self, values: &mut [f64], rates: &[f64], dt: f64) {
        Self::step(values, rates, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_step() {
        let mut velocities = vec![1.0, 2.0, 3.0, 4.0];
        let accelerations = vec![0.5, 1.0, 1.5, 2.0];
        unsafe {
            ScalarBackend.step_columns(&mut velocities, &accelerations, 0.1);
        }
        assert!((velocities[0] - 1.05).abs() < 1e-12);
        assert!((velocities[3] - 4.2).abs() < 1e-12);
    }
}
