//! Gate fusion buffer
//!
//! Incoming controlled gates are queued here instead of touching the
//! state vector one by one. The buffer tracks the distinct target
//! qubits the queue covers and, at flush time, flattens the queue into
//! a single dense composite acting on that target subspace.
//!
//! # Controls
//!
//! Controls shared by every queued gate stay implicit and survive as
//! controls of the flattened composite. A control that stops being
//! common — a later gate lacks it, or targets it — is made explicit:
//! the affected gate matrices grow one qubit (identity on the |0⟩
//! half, the original matrix on the |1⟩ half) and the control qubit
//! joins the target set.
//!
//! # Local ordering
//!
//! Matrices are little-endian with respect to their id list: bit j of a
//! row/column index belongs to `ids[j]`. The flattened composite is
//! little-endian with respect to the ascending target list returned by
//! [`Fusion::flatten`].

use ahash::AHashSet;
use dqsim_core::{GateMatrix, QubitId};
use num_complex::Complex64;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// One queued gate: matrix plus the ids owning its matrix bits
#[derive(Debug, Clone)]
struct FusionItem {
    matrix: GateMatrix,
    ids: SmallVec<[QubitId; 4]>,
}

impl FusionItem {
    /// Grow the matrix by one explicit control qubit
    ///
    /// The control becomes the new highest local bit: identity on its
    /// |0⟩ half, the previous matrix on its |1⟩ half.
    fn absorb_control(&mut self, ctrl: QubitId) {
        let dim = self.matrix.dim();
        let mut expanded = GateMatrix::identity(self.ids.len() + 1);
        for r in 0..dim {
            for c in 0..dim {
                expanded.set(dim + r, dim + c, self.matrix.get(r, c));
            }
        }
        self.matrix = expanded;
        self.ids.push(ctrl);
    }
}

/// Accumulates pending controlled gates into one composite
#[derive(Debug, Clone, Default)]
pub struct Fusion {
    items: Vec<FusionItem>,
    targets: BTreeSet<QubitId>,
    ctrls: AHashSet<QubitId>,
}

impl Fusion {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count of distinct target qubits the queue covers
    ///
    /// Controls made explicit by a later insert count as targets.
    pub fn num_qubits(&self) -> usize {
        self.targets.len()
    }

    /// Queue a controlled gate
    ///
    /// `matrix` is 2^k × 2^k for `ids.len() == k`, little-endian over
    /// `ids`. Controls must be disjoint from `ids`.
    pub fn insert(&mut self, matrix: GateMatrix, ids: &[QubitId], ctrls: &[QubitId]) {
        let mut item = FusionItem {
            matrix,
            ids: ids.iter().copied().collect(),
        };
        let item_ctrls: AHashSet<QubitId> = ctrls.iter().copied().collect();

        if self.items.is_empty() {
            self.ctrls = item_ctrls;
        } else if self.ctrls != item_ctrls || ids.iter().any(|id| self.ctrls.contains(id)) {
            // controls common to every queued gate may stay implicit,
            // except where the new gate targets one of them
            let mut common: AHashSet<QubitId> =
                self.ctrls.intersection(&item_ctrls).copied().collect();
            for id in ids {
                common.remove(id);
            }

            let mut demote_existing: Vec<QubitId> =
                self.ctrls.difference(&common).copied().collect();
            demote_existing.sort_unstable();
            for ctrl in demote_existing {
                for queued in &mut self.items {
                    queued.absorb_control(ctrl);
                }
                self.targets.insert(ctrl);
            }

            let mut demote_new: Vec<QubitId> = item_ctrls.difference(&common).copied().collect();
            demote_new.sort_unstable();
            for ctrl in demote_new {
                item.absorb_control(ctrl);
            }

            self.ctrls = common;
        }

        self.targets.extend(item.ids.iter().copied());
        self.items.push(item);
    }

    /// Flatten the queue into one composite
    ///
    /// Returns the dense matrix, the target ids ascending (bit i of the
    /// matrix belongs to the i-th target), and the surviving control ids.
    /// The composite reproduces the queued gates in insertion order.
    pub fn flatten(self) -> (GateMatrix, Vec<QubitId>, Vec<QubitId>) {
        let targets: Vec<QubitId> = self.targets.iter().copied().collect();
        let mut ctrls: Vec<QubitId> = self.ctrls.iter().copied().collect();
        ctrls.sort_unstable();

        let k = targets.len();
        let dim = 1usize << k;
        let mut composite = GateMatrix::identity(k);

        for item in &self.items {
            let local: SmallVec<[usize; 8]> = item
                .ids
                .iter()
                .map(|id| {
                    targets
                        .iter()
                        .position(|t| t == id)
                        .expect("queued gate targets a qubit outside the fusion target set")
                })
                .collect();

            let sub_dim = item.matrix.dim();
            let mut offsets: SmallVec<[usize; 32]> = SmallVec::new();
            for b in 0..sub_dim {
                let mut o = 0;
                for (j, &bit) in local.iter().enumerate() {
                    if (b >> j) & 1 == 1 {
                        o |= 1 << bit;
                    }
                }
                offsets.push(o);
            }
            let item_mask = offsets.iter().fold(0, |a, &o| a | o);
            let rest_mask = (dim - 1) & !item_mask;

            // left-multiply the embedded item: transform every column
            let mut v: SmallVec<[Complex64; 32]> = SmallVec::new();
            v.resize(sub_dim, Complex64::new(0.0, 0.0));
            for col in 0..dim {
                let mut rest = 0usize;
                loop {
                    for (b, value) in v.iter_mut().enumerate() {
                        *value = composite.get(rest + offsets[b], col);
                    }
                    for r in 0..sub_dim {
                        let mut acc = Complex64::new(0.0, 0.0);
                        for c in 0..sub_dim {
                            acc += item.matrix.get(r, c) * v[c];
                        }
                        composite.set(rest + offsets[r], col, acc);
                    }
                    rest = rest.wrapping_sub(rest_mask) & rest_mask;
                    if rest == 0 {
                        break;
                    }
                }
            }
        }

        (composite, targets, ctrls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dqsim_core::matrices::{HADAMARD, PAULI_X, PAULI_Z};
    use num_complex::Complex64;

    fn h() -> GateMatrix {
        GateMatrix::from_2x2(&HADAMARD)
    }

    fn x() -> GateMatrix {
        GateMatrix::from_2x2(&PAULI_X)
    }

    #[test]
    fn test_single_gate_flattens_to_itself() {
        let mut fusion = Fusion::new();
        fusion.insert(h(), &[QubitId::new(3)], &[]);
        assert_eq!(fusion.num_qubits(), 1);

        let (m, targets, ctrls) = fusion.flatten();
        assert_eq!(targets, vec![QubitId::new(3)]);
        assert!(ctrls.is_empty());
        assert_eq!(m, h());
    }

    #[test]
    fn test_insertion_order_is_right_to_left_product() {
        // H then Z on the same qubit: composite = Z * H
        let mut fusion = Fusion::new();
        fusion.insert(h(), &[QubitId::new(0)], &[]);
        fusion.insert(GateMatrix::from_2x2(&PAULI_Z), &[QubitId::new(0)], &[]);
        let (m, _, _) = fusion.flatten();

        let expected = GateMatrix::from_2x2(&PAULI_Z).matmul(&h()).unwrap();
        for r in 0..2 {
            for c in 0..2 {
                assert_relative_eq!(m.get(r, c).re, expected.get(r, c).re, epsilon = 1e-12);
                assert_relative_eq!(m.get(r, c).im, expected.get(r, c).im, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_common_controls_stay_implicit() {
        let ctrl = [QubitId::new(9)];
        let mut fusion = Fusion::new();
        fusion.insert(h(), &[QubitId::new(0)], &ctrl);
        fusion.insert(x(), &[QubitId::new(1)], &ctrl);

        assert_eq!(fusion.num_qubits(), 2);
        let (_, targets, ctrls) = fusion.flatten();
        assert_eq!(targets, vec![QubitId::new(0), QubitId::new(1)]);
        assert_eq!(ctrls, vec![QubitId::new(9)]);
    }

    #[test]
    fn test_divergent_control_becomes_target() {
        // H on q0 with no controls, then X on q1 controlled by q0:
        // the control is absorbed and the composite maps |00⟩ to a Bell pair
        let mut fusion = Fusion::new();
        fusion.insert(h(), &[QubitId::new(0)], &[]);
        fusion.insert(x(), &[QubitId::new(1)], &[QubitId::new(0)]);

        assert_eq!(fusion.num_qubits(), 2);
        let (m, targets, ctrls) = fusion.flatten();
        assert_eq!(targets, vec![QubitId::new(0), QubitId::new(1)]);
        assert!(ctrls.is_empty());

        let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(m.get(0, 0).re, inv_sqrt2, epsilon = 1e-12);
        assert_relative_eq!(m.get(1, 0).re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.get(2, 0).re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.get(3, 0).re, inv_sqrt2, epsilon = 1e-12);
    }

    #[test]
    fn test_targeting_a_common_control_demotes_it() {
        let mut fusion = Fusion::new();
        fusion.insert(x(), &[QubitId::new(1)], &[QubitId::new(0)]);
        fusion.insert(h(), &[QubitId::new(0)], &[]);

        // q0 was a control of the first gate but is now targeted
        assert_eq!(fusion.num_qubits(), 2);
        let (_, targets, ctrls) = fusion.flatten();
        assert_eq!(targets, vec![QubitId::new(0), QubitId::new(1)]);
        assert!(ctrls.is_empty());
    }

    #[test]
    fn test_flattened_composite_is_unitary() {
        let mut fusion = Fusion::new();
        fusion.insert(h(), &[QubitId::new(0)], &[]);
        fusion.insert(x(), &[QubitId::new(2)], &[QubitId::new(0)]);
        fusion.insert(h(), &[QubitId::new(1)], &[QubitId::new(2)]);
        let (m, targets, _) = fusion.flatten();
        assert_eq!(targets.len(), 3);
        assert!(m.is_unitary(1e-10));
    }
}
