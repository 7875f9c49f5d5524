//! Vectorised kernel family
//!
//! SIMD specialises the single-qubit hot path: a fused composite of one
//! target qubit is a 2×2 matrix applied to amplitude pairs, which maps
//! directly onto 128/256-bit complex lanes. Wider composites gather
//! non-contiguous amplitudes and fall back to the scalar family.

use crate::scalar::apply_serial;
use crate::threaded::{apply_threaded, PARALLEL_MIN_AMPLITUDES};
use dqsim_core::GateMatrix;
use num_complex::Complex64;
use rayon::prelude::*;

/// Vector-serial entry point for the dispatch table
pub(crate) fn apply_vector_serial<const DIM: usize>(
    state: &mut [Complex64],
    m: &GateMatrix,
    ctrlmask: usize,
    positions: &[usize],
) {
    if DIM == 2 {
        apply_single_vector(state, m, ctrlmask, positions[0]);
    } else {
        apply_serial::<DIM>(state, m, ctrlmask, positions);
    }
}

/// Vector-threaded entry point for the dispatch table
///
/// For one target qubit each block of 2·stride amplitudes is
/// self-contained, so blocks parallelise as plain chunks with the SIMD
/// inner loop; wider composites use the scalar threaded family.
pub(crate) fn apply_vector_threaded<const DIM: usize>(
    state: &mut [Complex64],
    m: &GateMatrix,
    ctrlmask: usize,
    positions: &[usize],
) {
    if DIM != 2 {
        return apply_threaded::<DIM>(state, m, ctrlmask, positions);
    }
    let position = positions[0];
    let block = 2 << position;
    if ctrlmask != 0 || state.len() < PARALLEL_MIN_AMPLITUDES || block > state.len() {
        return apply_single_vector(state, m, ctrlmask, position);
    }
    state
        .par_chunks_mut(block)
        .for_each(|chunk| apply_single_vector(chunk, m, 0, position));
}

/// Single-qubit application with the widest available SIMD path
fn apply_single_vector(state: &mut [Complex64], m: &GateMatrix, ctrlmask: usize, position: usize) {
    #[cfg(target_arch = "x86_64")]
    {
        if ctrlmask == 0 && position > 0 && is_x86_feature_detected!("avx2") {
            unsafe { avx2::apply(state, m, position) };
            return;
        }
        if is_x86_feature_detected!("sse2") {
            unsafe { sse2::apply(state, m, ctrlmask, position) };
            return;
        }
    }
    apply_serial::<2>(state, m, ctrlmask, &[position]);
}

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use dqsim_core::GateMatrix;
    use num_complex::Complex64;
    use std::arch::x86_64::*;

    /// One matrix element as ([re, im], [im, re]) lanes
    #[inline]
    unsafe fn element(c: Complex64) -> (__m128d, __m128d) {
        (_mm_set_pd(c.im, c.re), _mm_set_pd(c.re, c.im))
    }

    /// Complex product w·a given the two lane layouts of w
    #[inline]
    unsafe fn cmul(w: __m128d, w_swap: __m128d, a: __m128d) -> __m128d {
        let a_re = _mm_shuffle_pd::<0b00>(a, a);
        let a_im = _mm_shuffle_pd::<0b11>(a, a);
        let sign = _mm_set_pd(0.0, -0.0);
        _mm_add_pd(_mm_mul_pd(w, a_re), _mm_xor_pd(_mm_mul_pd(w_swap, a_im), sign))
    }

    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn apply(
        state: &mut [Complex64],
        m: &GateMatrix,
        ctrlmask: usize,
        position: usize,
    ) {
        let delta = 1usize << position;
        let (m00, m00s) = element(m.get(0, 0));
        let (m01, m01s) = element(m.get(0, 1));
        let (m10, m10s) = element(m.get(1, 0));
        let (m11, m11s) = element(m.get(1, 1));
        let ptr = state.as_mut_ptr() as *mut f64;

        let mut i = 0;
        while i < state.len() {
            for j in 0..delta {
                let idx = i + j;
                if idx & ctrlmask != ctrlmask {
                    continue;
                }
                let p0 = ptr.add(2 * idx);
                let p1 = ptr.add(2 * (idx + delta));
                let a0 = _mm_loadu_pd(p0);
                let a1 = _mm_loadu_pd(p1);
                let r0 = _mm_add_pd(cmul(m00, m00s, a0), cmul(m01, m01s, a1));
                let r1 = _mm_add_pd(cmul(m10, m10s, a0), cmul(m11, m11s, a1));
                _mm_storeu_pd(p0, r0);
                _mm_storeu_pd(p1, r1);
            }
            i += 2 * delta;
        }
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use dqsim_core::GateMatrix;
    use num_complex::Complex64;
    use std::arch::x86_64::*;

    /// One matrix element broadcast over two complex lanes
    #[inline]
    unsafe fn element(c: Complex64) -> (__m256d, __m256d) {
        (
            _mm256_setr_pd(c.re, c.im, c.re, c.im),
            _mm256_setr_pd(c.im, c.re, c.im, c.re),
        )
    }

    /// Complex product w·z on two lanes at once
    #[inline]
    unsafe fn cmul(w: __m256d, w_swap: __m256d, z: __m256d) -> __m256d {
        let z_re = _mm256_permute_pd::<0b0000>(z);
        let z_im = _mm256_permute_pd::<0b1111>(z);
        let sign = _mm256_setr_pd(-0.0, 0.0, -0.0, 0.0);
        _mm256_add_pd(
            _mm256_mul_pd(w, z_re),
            _mm256_xor_pd(_mm256_mul_pd(w_swap, z_im), sign),
        )
    }

    /// Control-free single-qubit pass, two amplitude pairs per iteration
    ///
    /// Requires `position > 0` so the low and high runs are contiguous
    /// and of even length.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn apply(state: &mut [Complex64], m: &GateMatrix, position: usize) {
        let delta = 1usize << position;
        let (m00, m00s) = element(m.get(0, 0));
        let (m01, m01s) = element(m.get(0, 1));
        let (m10, m10s) = element(m.get(1, 0));
        let (m11, m11s) = element(m.get(1, 1));
        let ptr = state.as_mut_ptr() as *mut f64;

        let mut i = 0;
        while i < state.len() {
            let mut j = 0;
            while j < delta {
                let p0 = ptr.add(2 * (i + j));
                let p1 = ptr.add(2 * (i + j + delta));
                let lo = _mm256_loadu_pd(p0);
                let hi = _mm256_loadu_pd(p1);
                let r_lo = _mm256_add_pd(cmul(m00, m00s, lo), cmul(m01, m01s, hi));
                let r_hi = _mm256_add_pd(cmul(m10, m10s, lo), cmul(m11, m11s, hi));
                _mm256_storeu_pd(p0, r_lo);
                _mm256_storeu_pd(p1, r_hi);
                j += 2;
            }
            i += 2 * delta;
        }
    }
}
