//! Scalar serial kernel family

use crate::coset::{apply_coset, ascending, coset_base, local_offsets};
use dqsim_core::GateMatrix;
use num_complex::Complex64;

/// Apply a dense matrix serially, one coset at a time
///
/// The control-free loop is split out so the common post-fusion case
/// with no surviving controls skips the mask test entirely.
pub(crate) fn apply_serial<const DIM: usize>(
    state: &mut [Complex64],
    m: &GateMatrix,
    ctrlmask: usize,
    positions: &[usize],
) {
    debug_assert_eq!(m.dim(), DIM);
    debug_assert_eq!(1 << positions.len(), DIM);

    let offsets = local_offsets::<DIM>(positions);
    let asc = ascending(positions);
    let cosets = state.len() >> positions.len();

    if ctrlmask == 0 {
        for t in 0..cosets {
            let base = coset_base(t, &asc);
            apply_coset::<DIM>(state, base, &offsets, m);
        }
    } else {
        for t in 0..cosets {
            let base = coset_base(t, &asc);
            if base & ctrlmask == ctrlmask {
                apply_coset::<DIM>(state, base, &offsets, m);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dqsim_core::matrices::{HADAMARD, PAULI_X};

    fn zero_state(num_qubits: usize) -> Vec<Complex64> {
        let mut state = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        state[0] = Complex64::new(1.0, 0.0);
        state
    }

    #[test]
    fn test_x_on_single_qubit() {
        let mut state = zero_state(1);
        let x = GateMatrix::from_2x2(&PAULI_X);
        apply_serial::<2>(&mut state, &x, 0, &[0]);
        assert_relative_eq!(state[0].re, 0.0);
        assert_relative_eq!(state[1].re, 1.0);
    }

    #[test]
    fn test_hadamard_then_hadamard_restores() {
        let mut state = zero_state(3);
        let h = GateMatrix::from_2x2(&HADAMARD);
        apply_serial::<2>(&mut state, &h, 0, &[1]);
        assert_relative_eq!(state[0].re, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(state[2].re, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        apply_serial::<2>(&mut state, &h, 0, &[1]);
        assert_relative_eq!(state[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(state[2].re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_controlled_x_respects_mask() {
        // 2 qubits, target position 1, control position 0
        let mut state = vec![
            Complex64::new(0.5, 0.0),
            Complex64::new(0.5, 0.0),
            Complex64::new(0.5, 0.0),
            Complex64::new(0.5, 0.0),
        ];
        let x = GateMatrix::from_2x2(&PAULI_X);
        apply_serial::<2>(&mut state, &x, 0b01, &[1]);
        // indices 1 and 3 swap, 0 and 2 untouched
        assert_relative_eq!(state[0].re, 0.5);
        assert_relative_eq!(state[1].re, 0.5);
        assert_relative_eq!(state[2].re, 0.5);
        assert_relative_eq!(state[3].re, 0.5);

        let mut state = zero_state(2);
        state[1] = state[0]; // move mass to |01⟩ (control set)
        state[0] = Complex64::new(0.0, 0.0);
        apply_serial::<2>(&mut state, &x, 0b01, &[1]);
        assert_relative_eq!(state[3].re, 1.0);
        assert_relative_eq!(state[1].re, 0.0);
    }

    #[test]
    fn test_two_qubit_swap_matrix() {
        // SWAP on positions (0, 1): matrix bit 1 = positions[0] = 1, bit 0 = positions[1] = 0
        let mut swap = GateMatrix::zeros(2);
        swap.set(0, 0, Complex64::new(1.0, 0.0));
        swap.set(1, 2, Complex64::new(1.0, 0.0));
        swap.set(2, 1, Complex64::new(1.0, 0.0));
        swap.set(3, 3, Complex64::new(1.0, 0.0));

        let mut state = zero_state(2);
        state.swap(0, 1); // |01⟩
        apply_serial::<4>(&mut state, &swap, 0, &[1, 0]);
        assert_relative_eq!(state[2].re, 1.0); // |10⟩
        assert_relative_eq!(state[1].re, 0.0);
    }
}
