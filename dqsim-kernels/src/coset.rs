//! Coset enumeration shared by the kernel families
//!
//! For k target bit positions, the index space splits into cosets of
//! size 2^k: a base index with every target bit clear, plus one offset
//! per local basis state. Kernels iterate bases, gather the 2^k
//! amplitudes, multiply by the matrix, and scatter back.

use dqsim_core::GateMatrix;
use num_complex::Complex64;
use smallvec::SmallVec;

/// Offset of each local basis state from a coset base
///
/// `positions` is high-to-low: local bit (k-1-j) lives at `positions[j]`.
#[inline]
pub(crate) fn local_offsets<const DIM: usize>(positions: &[usize]) -> [usize; DIM] {
    let k = positions.len();
    debug_assert_eq!(1 << k, DIM);
    let mut offsets = [0usize; DIM];
    for (b, offset) in offsets.iter_mut().enumerate() {
        let mut o = 0;
        for (j, &p) in positions.iter().enumerate() {
            if (b >> (k - 1 - j)) & 1 == 1 {
                o |= 1 << p;
            }
        }
        *offset = o;
    }
    offsets
}

/// Target positions sorted ascending, for base expansion
#[inline]
pub(crate) fn ascending(positions: &[usize]) -> SmallVec<[usize; 8]> {
    let mut sorted: SmallVec<[usize; 8]> = positions.iter().copied().collect();
    sorted.sort_unstable();
    sorted
}

/// Expand coset number `t` into a base index by inserting a zero bit at
/// each target position (ascending order)
#[inline]
pub(crate) fn coset_base(t: usize, ascending_positions: &[usize]) -> usize {
    let mut base = t;
    for &p in ascending_positions {
        base = ((base >> p) << (p + 1)) | (base & ((1 << p) - 1));
    }
    base
}

/// Gather, multiply, scatter one coset
#[inline]
pub(crate) fn apply_coset<const DIM: usize>(
    state: &mut [Complex64],
    base: usize,
    offsets: &[usize; DIM],
    m: &GateMatrix,
) {
    let mut v = [Complex64::new(0.0, 0.0); DIM];
    for (b, value) in v.iter_mut().enumerate() {
        *value = state[base + offsets[b]];
    }
    for r in 0..DIM {
        let row = m.row(r);
        let mut acc = Complex64::new(0.0, 0.0);
        for c in 0..DIM {
            acc += row[c] * v[c];
        }
        state[base + offsets[r]] = acc;
    }
}

/// Raw-pointer variant for the threaded family
///
/// # Safety
/// `ptr` must cover every index `base + offsets[b]`, and no other thread
/// may touch those indices while this runs. Disjoint cosets satisfy this.
#[inline]
pub(crate) unsafe fn apply_coset_raw<const DIM: usize>(
    ptr: *mut Complex64,
    base: usize,
    offsets: &[usize; DIM],
    m: &GateMatrix,
) {
    let mut v = [Complex64::new(0.0, 0.0); DIM];
    for (b, value) in v.iter_mut().enumerate() {
        *value = *ptr.add(base + offsets[b]);
    }
    for r in 0..DIM {
        let row = m.row(r);
        let mut acc = Complex64::new(0.0, 0.0);
        for c in 0..DIM {
            acc += row[c] * v[c];
        }
        *ptr.add(base + offsets[r]) = acc;
    }
}
