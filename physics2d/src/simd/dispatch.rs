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
//! CPU feature detection

use std::sync::OnceLock;

/// SIMD-relevant CPU feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    /// SSE2, part of the x86_64 baseline
    pub has_sse2: bool,
    /// AVX
    pub has_avx: bool,
    /// AVX2
    pub has_avx2: bool,
    /// Fused multiply-add (detected but never used, to keep results reproducible)
    pub has_fma: bool,
}

static CPU_FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

/// Query the CPU once and cache the answer
///
/// Non-x86_64 targets report no features.
pub fn detect_cpu_features() -> CpuFeatures {
    *CPU_FEATURES.get_or_init(detect_cpu_features_impl)
}

#[cfg(target_arch = "x86_64")]
fn detect_cpu_features_impl() -> CpuFeatures {
    use raw_cpuid::CpuId;

    let cpuid = CpuId::new();
    let mut features = CpuFeatures::default();
    if let Some(info) = cpuid.get_feature_info() {
        features.has_sse2 = info.has_sse2();
        features.has_avx = info.has_avx();
        features.has_fma = info.has_fma();
    }
    if let Some(extended) = cpuid.get_extended_feature_info() {
        features.has_avx2 = extended.has_avx2();
    }
    tracing::trace!(?features, "detected cpu features");
    features
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_cpu_features_impl() -> CpuFeatures {
    CpuFeatures::default()
}
