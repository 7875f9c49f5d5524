//! Kernel dispatch tables
//!
//! Selection happens once per flush, not per kernel call, so a flush
//! never mixes families mid-pass.

use crate::backend::{resolve_auto, Backend};
use crate::error::{KernelError, Result};
use crate::scalar::apply_serial;
use crate::simd::{apply_vector_serial, apply_vector_threaded};
use crate::threaded::apply_threaded;
use dqsim_core::GateMatrix;
use num_complex::Complex64;

/// Hard upper bound on fused target qubits; kernels are monomorphised
/// for each count up to this.
pub const MAX_TARGET_QUBITS: usize = 5;

/// A kernel applies `matrix` to `state` in place under `ctrlmask`,
/// with target bit positions given high-to-low.
pub type Kernel = fn(&mut [Complex64], &GateMatrix, usize, &[usize]);

const SCALAR_SERIAL: [Kernel; MAX_TARGET_QUBITS] = [
    apply_serial::<2>,
    apply_serial::<4>,
    apply_serial::<8>,
    apply_serial::<16>,
    apply_serial::<32>,
];

const SCALAR_THREADED: [Kernel; MAX_TARGET_QUBITS] = [
    apply_threaded::<2>,
    apply_threaded::<4>,
    apply_threaded::<8>,
    apply_threaded::<16>,
    apply_threaded::<32>,
];

const VECTOR_SERIAL: [Kernel; MAX_TARGET_QUBITS] = [
    apply_vector_serial::<2>,
    apply_vector_serial::<4>,
    apply_vector_serial::<8>,
    apply_vector_serial::<16>,
    apply_vector_serial::<32>,
];

const VECTOR_THREADED: [Kernel; MAX_TARGET_QUBITS] = [
    apply_vector_threaded::<2>,
    apply_vector_threaded::<4>,
    apply_vector_threaded::<8>,
    apply_vector_threaded::<16>,
    apply_vector_threaded::<32>,
];

/// Pick the kernel for `num_targets` fused qubits on `backend`
///
/// # Errors
/// [`KernelError::UnsupportedQubitCount`] outside 1..=[`MAX_TARGET_QUBITS`];
/// [`KernelError::BackendUnavailable`] for `Unknown` and the offload
/// targets this build does not ship.
pub fn select_kernel(backend: Backend, num_targets: usize) -> Result<Kernel> {
    if num_targets == 0 || num_targets > MAX_TARGET_QUBITS {
        return Err(KernelError::UnsupportedQubitCount {
            num_targets,
            max: MAX_TARGET_QUBITS,
        });
    }
    match backend {
        Backend::Auto => select_kernel(resolve_auto(), num_targets),
        Backend::ScalarSerial => Ok(SCALAR_SERIAL[num_targets - 1]),
        Backend::ScalarThreaded => Ok(SCALAR_THREADED[num_targets - 1]),
        Backend::VectorSerial => Ok(VECTOR_SERIAL[num_targets - 1]),
        Backend::VectorThreaded => Ok(VECTOR_THREADED[num_targets - 1]),
        Backend::Unknown | Backend::OffloadNvidia | Backend::OffloadIntel => {
            Err(KernelError::BackendUnavailable { backend })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dqsim_core::matrices::PAULI_X;

    #[test]
    fn test_all_families_resolve() {
        for backend in [
            Backend::Auto,
            Backend::ScalarSerial,
            Backend::ScalarThreaded,
            Backend::VectorSerial,
            Backend::VectorThreaded,
        ] {
            for k in 1..=MAX_TARGET_QUBITS {
                assert!(select_kernel(backend, k).is_ok(), "{backend} k={k}");
            }
        }
    }

    #[test]
    fn test_out_of_range_counts() {
        assert!(matches!(
            select_kernel(Backend::ScalarSerial, 0),
            Err(KernelError::UnsupportedQubitCount { .. })
        ));
        assert!(matches!(
            select_kernel(Backend::ScalarSerial, MAX_TARGET_QUBITS + 1),
            Err(KernelError::UnsupportedQubitCount { .. })
        ));
    }

    #[test]
    fn test_unavailable_backends() {
        for backend in [Backend::Unknown, Backend::OffloadNvidia, Backend::OffloadIntel] {
            assert!(matches!(
                select_kernel(backend, 1),
                Err(KernelError::BackendUnavailable { .. })
            ));
        }
    }

    #[test]
    fn test_selected_kernel_applies() {
        let kernel = select_kernel(Backend::ScalarSerial, 1).unwrap();
        let mut state = vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
        let x = GateMatrix::from_2x2(&PAULI_X);
        kernel(&mut state, &x, 0, &[0]);
        assert!((state[1].re - 1.0).abs() < 1e-12);
    }
}
