//! Pauli-sum operators: expectation values, operator application, and
//! Hamiltonian time evolution
//!
//! Terms are applied through the regular gate path one factor at a
//! time, flushing after each term so no fusion happens across the sum.
//! Snapshot/restore passes run through the retained scratch buffers.

use crate::error::Result;
use crate::simulator::{Simulator, DEFAULT_TOLERANCE, PARALLEL_MIN_AMPLITUDES};
use dqsim_core::{ComplexPauliSum, PauliSum, PauliTerm, QubitId};
use num_complex::Complex64;
use rayon::prelude::*;

impl Simulator {
    /// ⟨ψ|H|ψ⟩ for a Hermitian operator given as a real-weighted Pauli sum
    ///
    /// Term factors use local indices into `ids`. Only the real part is
    /// returned; for Hermitian H the imaginary part vanishes in exact
    /// arithmetic and numeric drift is dropped.
    ///
    /// # Errors
    /// [`crate::SimulatorError::UnknownQubit`] for unmapped ids.
    pub fn get_expectation_value(&mut self, terms: &PauliSum, ids: &[QubitId]) -> Result<f64> {
        self.run()?;
        self.check_ids(ids)?;

        let len = self.state().len();
        let mut snapshot = self.take_primary(len);
        snapshot.copy_from_slice(self.state());

        let mut expectation = 0.0;
        for (term, coefficient) in terms {
            self.apply_term(term, ids, &[])?;

            let overlap = |(amp, snap): (&mut Complex64, &Complex64)| -> f64 {
                // Re(⟨snap|amp⟩), restoring the state as we go
                let contribution = snap.re * amp.re + snap.im * amp.im;
                *amp = *snap;
                contribution
            };
            let delta = if len >= PARALLEL_MIN_AMPLITUDES {
                self.state_mut()
                    .par_iter_mut()
                    .zip(snapshot.par_iter())
                    .map(overlap)
                    .sum::<f64>()
            } else {
                self.state_mut()
                    .iter_mut()
                    .zip(snapshot.iter())
                    .map(overlap)
                    .sum::<f64>()
            };
            expectation += coefficient * delta;
        }

        self.release_primary(snapshot);
        Ok(expectation)
    }

    /// Apply Σ c_j P_j to the wavefunction
    ///
    /// The result is generally not normalised; renormalising is up to
    /// the caller.
    ///
    /// # Errors
    /// [`crate::SimulatorError::UnknownQubit`] for unmapped ids.
    pub fn apply_qubit_operator(
        &mut self,
        terms: &ComplexPauliSum,
        ids: &[QubitId],
    ) -> Result<()> {
        self.run()?;
        self.check_ids(ids)?;

        let len = self.state().len();
        let mut accumulated = self.take_primary(len);
        let mut snapshot = self.take_secondary(len);
        snapshot.copy_from_slice(self.state());

        for (term, coefficient) in terms {
            self.apply_term(term, ids, &[])?;

            let coefficient = *coefficient;
            let accumulate =
                |((acc, amp), snap): ((&mut Complex64, &mut Complex64), &Complex64)| {
                    *acc += coefficient * *amp;
                    *amp = *snap;
                };
            if len >= PARALLEL_MIN_AMPLITUDES {
                accumulated
                    .par_iter_mut()
                    .zip(self.state_mut().par_iter_mut())
                    .zip(snapshot.par_iter())
                    .for_each(accumulate);
            } else {
                accumulated
                    .iter_mut()
                    .zip(self.state_mut().iter_mut())
                    .zip(snapshot.iter())
                    .for_each(accumulate);
            }
        }

        std::mem::swap(self.state_mut(), &mut accumulated);
        self.release_primary(accumulated);
        self.release_secondary(snapshot);
        Ok(())
    }

    /// Approximate W ← exp(−i·t·H)·W for H = Σ c_j P_j
    ///
    /// The evolution is split into s ≈ ⌈|t|·‖H‖₁⌉ sub-steps; within
    /// each, the Taylor series is summed term by term until the L2 norm
    /// of the increment over the control coset drops below tolerance.
    /// An identity term contributes only the scalar phase
    /// exp(−i·t·tr/s), applied to the control coset once per sub-step.
    ///
    /// # Errors
    /// [`crate::SimulatorError::UnknownQubit`] for unmapped ids.
    pub fn emulate_time_evolution(
        &mut self,
        terms: &PauliSum,
        time: f64,
        ids: &[QubitId],
        ctrls: &[QubitId],
    ) -> Result<()> {
        self.run()?;
        self.check_ids(ids)?;
        let ctrlmask = self.control_mask(ctrls)?;

        let i_unit = Complex64::new(0.0, 1.0);
        let mut trace = 0.0;
        let mut op_norm = 0.0;
        let mut non_identity: Vec<(&PauliTerm, f64)> = Vec::with_capacity(terms.len());
        for (term, coefficient) in terms {
            if term.is_identity() {
                trace += coefficient;
            } else {
                non_identity.push((term, *coefficient));
                op_norm += coefficient.abs();
            }
        }

        let steps = (time.abs() * op_norm + 1.0) as usize;
        let correction = (-i_unit * (time * trace / steps as f64)).exp();

        let len = self.state().len();
        let mut output = self.take_primary(len);
        output.copy_from_slice(self.state());

        for _ in 0..steps {
            let mut norm_change = 1.0;
            let mut order = 0usize;
            while norm_change > DEFAULT_TOLERANCE {
                let coeff = (-i_unit * time) / (steps * (order + 1)) as f64;
                let current = self.state().to_vec();
                let mut update = vec![Complex64::new(0.0, 0.0); len];

                for &(term, coefficient) in &non_identity {
                    self.apply_term(term, ids, &[])?;
                    for (upd, amp) in update.iter_mut().zip(self.state().iter()) {
                        *upd += *amp * coefficient;
                    }
                    self.state_mut().copy_from_slice(&current);
                }

                norm_change = 0.0;
                let state = self.state_mut();
                for (j, upd) in update.iter_mut().enumerate() {
                    *upd *= coeff;
                    state[j] = *upd;
                    if j & ctrlmask == ctrlmask {
                        output[j] += *upd;
                        norm_change += upd.norm_sqr();
                    }
                }
                norm_change = norm_change.sqrt();
                order += 1;
            }

            let state = self.state_mut();
            for (j, amp) in output.iter_mut().enumerate() {
                if j & ctrlmask == ctrlmask {
                    *amp *= correction;
                }
                state[j] = *amp;
            }
        }

        self.release_primary(output);
        Ok(())
    }

    /// Apply one Pauli term through the gate path
    ///
    /// Each factor becomes a controlled single-qubit gate; the trailing
    /// flush keeps term boundaries exact so sums never fuse together.
    pub(crate) fn apply_term(
        &mut self,
        term: &PauliTerm,
        ids: &[QubitId],
        ctrls: &[QubitId],
    ) -> Result<()> {
        for &(local_index, op) in term.iter() {
            let id = ids[local_index];
            self.apply_controlled_gate(op.matrix(), &[id], ctrls)?;
        }
        self.run()
    }
}
