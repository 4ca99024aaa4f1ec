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
//! AVX2 kernels for x86_64 (4 × f64 per instruction)

use super::{SimdBackend, AVX2_WIDTH};
use std::arch::x86_64::*;

/// 256-bit AVX2 backend
pub struct Avx2Backend;

impl Avx2Backend {
    #[target_feature(enable = "avx2")]
    unsafe fn step_avx2(values: &mut [f64], rates: &[f64], dt: f64) {
        let dt_vec = _mm256_set1_pd(dt);
        for (v_chunk, r_chunk) in values
            .chunks_exact_mut(AVX2_WIDTH)
            .zip(rates.chunks_exact(AVX2_WIDTH))
        {
            let v = _mm256_loadu_pd(v_chunk.as_ptr());
            let r = _mm256_loadu_pd(r_chunk.as_ptr());
            // Separate multiply and add keep results identical to scalar code
            let stepped = _mm256_add_pd(v, _mm256_mul_pd(r, dt_vec));
            _mm256_storeu_pd(v_chunk.as_mut_ptr(), stepped);
        }
    }
}

impl SimdBackend for Avx2Backend {
    fn name(&self) -> &str {
        "AVX2"
    }

    fn width(&self) -> usize {
        AVX2_WIDTH
    }

    fn is_supported(&self) -> bool {
        is_x86_feature_detected!("avx2")
    }

    unsafe fn step_columns(&self, values: &mut [f64], rates: &[f64], dt: f64) {
        Self::step_avx2(values, rates, dt);
    }
}
