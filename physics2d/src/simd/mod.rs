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
//! Vectorized kernels for body integration
//!
//! The integrator gathers body velocities and positions into column buffers
//! and hands them to a backend chosen once at runtime:
//!
//! - **AVX2**: 4 × f64 per instruction on x86_64 CPUs that report it
//! - **Scalar**: everywhere else, and for the tail of every buffer
//!
//! Every backend evaluates `x + y * dt` as a separate multiply and add, so a
//! vectorized step matches the scalar step bit for bit.

mod dispatch;
mod scalar;

#[cfg(target_arch = "x86_64")]
mod avx2;

pub use dispatch::{detect_cpu_features, CpuFeatures};
pub use scalar::ScalarBackend;

#[cfg(target_arch = "x86_64")]
pub use avx2::Avx2Backend;

use std::sync::OnceLock;

/// f64 lanes in a 256-bit register
pub const AVX2_WIDTH: usize = 4;

/// Column kernels for one instruction set
pub trait SimdBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// f64 values per operation
    fn width(&self) -> usize;

    /// Whether the current CPU can run this backend
    fn is_supported(&self) -> bool;

    /// `values[i] += rates[i] * dt` over the full chunks of `width()`
    ///
    /// Used for both `v' = v + a·dt` and `p' = p + v·dt`. Elements past the
    /// last full chunk are left untouched.
    ///
    /// # Safety
    ///
    /// The CPU must support the backend's instructions (see
    /// [`SimdBackend::is_supported`]) and both slices must have equal length.
    unsafe fn step_columns(&self, values: &mut [f64], rates: &[f64], dt: f64);
}

static BACKEND: OnceLock<Box<dyn SimdBackend>> = OnceLock::new();

/// Best backend for this CPU, selected on first use
pub fn select_backend() -> &'static dyn SimdBackend {
    BACKEND
        .get_or_init(|| -> Box<dyn SimdBackend> {
            #[cfg(target_arch = "x86_64")]
            if detect_cpu_features().has_avx2 {
                tracing::debug!("integration uses the AVX2 backend");
                return Box::new(Avx2Backend);
            }
            tracing::debug!("integration uses the scalar backend");
            Box::new(ScalarBackend)
        })
        .as_ref()
}

/// `values[i] += rates[i] * dt` for every element
///
/// Full chunks go through the selected backend, the tail through scalar code.
pub fn step_columns(values: &mut [f64], rates: &[f64], dt: f64) {
    assert_eq!(values.len(), rates.len(), "Column lengths must match");
    let backend = select_backend();
    let simd_count = (values.len() / backend.width()) * backend.width();
    if simd_count > 0 && backend.is_supported() {
        // SAFETY: support was checked and the slices have equal length
        unsafe {
            backend.step_columns(&mut values[..simd_count], &rates[..simd_count], dt);
        }
    } else {
        ScalarBackend::step(&mut values[..simd_count], &rates[..simd_count], dt);
    }
    ScalarBackend::step(&mut values[simd_count..], &rates[simd_count..], dt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_selection() {
        let backend = select_backend();
        assert!(backend.is_supported());
        #[cfg(target_arch = "x86_64")]
        {
            if detect_cpu_features().has_avx2 {
                assert_eq!(backend.name(), "AVX2");
                assert_eq!(backend.width(), AVX2_WIDTH);
            } else {
                assert_eq!(backend.name(), "Scalar");
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        assert_eq!(backend.name(), "Scalar");
    }

    #[test]
    fn test_columns_match_scalar_bitwise() {
        let rates: Vec<f64> = (0..11).map(|i| 0.1 * i as f64 - 0.37).collect();
        let mut vectorized: Vec<f64> = (0..11).map(|i| 1.0 / (i as f64 + 3.0)).collect();
        let mut reference = vectorized.clone();
        let dt = 1.0 / 60.0;

        step_columns(&mut vectorized, &rates, dt);
        for (v, r) in reference.iter_mut().zip(&rates) {
            *v += r * dt;
        }
        for (x, y) in vectorized.iter().zip(&reference) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}
