//! Rayon-parallel kernel family
//!
//! The outer coset loop is statically partitioned across the rayon pool.
//! Each coset owns a disjoint set of amplitude indices, so workers never
//! overlap; the shared raw pointer only exists to express that to the
//! borrow checker.

use crate::coset::{apply_coset_raw, ascending, coset_base, local_offsets};
use crate::scalar::apply_serial;
use dqsim_core::GateMatrix;
use num_complex::Complex64;
use rayon::prelude::*;

/// States smaller than this stay on one thread; the fork/join overhead
/// dominates below it.
pub(crate) const PARALLEL_MIN_AMPLITUDES: usize = 1 << 12;

struct StatePtr(*mut Complex64);

// Safety: workers write disjoint cosets only (see module docs).
unsafe impl Send for StatePtr {}
unsafe impl Sync for StatePtr {}

impl StatePtr {
    fn get(&self) -> *mut Complex64 {
        self.0
    }
}

/// Apply a dense matrix with the outer loop parallelised over cosets
pub(crate) fn apply_threaded<const DIM: usize>(
    state: &mut [Complex64],
    m: &GateMatrix,
    ctrlmask: usize,
    positions: &[usize],
) {
    if state.len() < PARALLEL_MIN_AMPLITUDES {
        return apply_serial::<DIM>(state, m, ctrlmask, positions);
    }
    debug_assert_eq!(m.dim(), DIM);

    let offsets = local_offsets::<DIM>(positions);
    let asc = ascending(positions);
    let cosets = state.len() >> positions.len();
    let ptr = StatePtr(state.as_mut_ptr());

    (0..cosets).into_par_iter().for_each(|t| {
        let base = coset_base(t, &asc);
        if base & ctrlmask == ctrlmask {
            // Safety: coset `t` maps to indices no other `t` produces
            unsafe { apply_coset_raw::<DIM>(ptr.get(), base, &offsets, m) };
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use dqsim_core::matrices::HADAMARD;

    #[test]
    fn test_threaded_matches_serial() {
        // deterministic pseudo-random state above the parallel threshold
        let n = 13;
        let mut seed = 0x2545f491u64;
        let mut state: Vec<Complex64> = (0..1usize << n)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let re = ((seed >> 33) as f64) / (1u64 << 31) as f64 - 1.0;
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let im = ((seed >> 33) as f64) / (1u64 << 31) as f64 - 1.0;
                Complex64::new(re, im)
            })
            .collect();
        let mut reference = state.clone();

        let h = GateMatrix::from_2x2(&HADAMARD);
        apply_serial::<2>(&mut reference, &h, 1 << 3, &[7]);
        apply_threaded::<2>(&mut state, &h, 1 << 3, &[7]);

        for (a, b) in state.iter().zip(reference.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }
}
