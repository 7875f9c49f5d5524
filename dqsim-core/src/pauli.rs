//! Pauli operators and weighted Pauli sums
//!
//! A `PauliTerm` is a tensor product of X/Y/Z factors on chosen local
//! qubit indices; identity factors are simply absent. Weighted sums of
//! terms describe Hamiltonians (real coefficients) and general qubit
//! operators (complex coefficients).

use crate::error::{CoreError, Result};
use crate::matrices::{PAULI_X, PAULI_Y, PAULI_Z};
use crate::matrix::GateMatrix;
use num_complex::Complex64;
use smallvec::SmallVec;
use std::fmt;

/// Single-qubit Pauli operator (identity excluded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauliOp {
    X,
    Y,
    Z,
}

impl PauliOp {
    /// Parse from 'X', 'Y', or 'Z'
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'X' => Ok(PauliOp::X),
            'Y' => Ok(PauliOp::Y),
            'Z' => Ok(PauliOp::Z),
            other => Err(CoreError::InvalidPauliChar(other)),
        }
    }

    /// Character representation
    pub fn to_char(self) -> char {
        match self {
            PauliOp::X => 'X',
            PauliOp::Y => 'Y',
            PauliOp::Z => 'Z',
        }
    }

    /// The 2×2 matrix of this operator
    pub fn matrix(self) -> GateMatrix {
        match self {
            PauliOp::X => GateMatrix::from_2x2(&PAULI_X),
            PauliOp::Y => GateMatrix::from_2x2(&PAULI_Y),
            PauliOp::Z => GateMatrix::from_2x2(&PAULI_Z),
        }
    }
}

impl fmt::Display for PauliOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Tensor product of Pauli factors on local qubit indices
///
/// Local indices refer to positions in an id list supplied alongside the
/// term; an empty term is the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauliTerm {
    factors: SmallVec<[(usize, PauliOp); 4]>,
}

impl PauliTerm {
    /// The identity term
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (local index, operator) pairs
    pub fn from_ops(ops: impl IntoIterator<Item = (usize, PauliOp)>) -> Self {
        Self {
            factors: ops.into_iter().collect(),
        }
    }

    /// Build from (local index, op-char) pairs
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidPauliChar`] for characters outside X/Y/Z.
    pub fn from_pairs(pairs: &[(usize, char)]) -> Result<Self> {
        let factors = pairs
            .iter()
            .map(|&(idx, c)| PauliOp::from_char(c).map(|op| (idx, op)))
            .collect::<Result<_>>()?;
        Ok(Self { factors })
    }

    /// Append a factor
    pub fn push(&mut self, local_index: usize, op: PauliOp) {
        self.factors.push((local_index, op));
    }

    /// Iterate factors in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(usize, PauliOp)> {
        self.factors.iter()
    }

    /// True if the term carries no factors (identity)
    pub fn is_identity(&self) -> bool {
        self.factors.is_empty()
    }

    /// Number of factors
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// True if there are no factors
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

impl fmt::Display for PauliTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return write!(f, "I");
        }
        for (i, (idx, op)) in self.factors.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}{}", op, idx)?;
        }
        Ok(())
    }
}

/// Hermitian operator as a real-weighted sum of Pauli terms
pub type PauliSum = Vec<(PauliTerm, f64)>;

/// General qubit operator as a complex-weighted sum of Pauli terms
pub type ComplexPauliSum = Vec<(PauliTerm, Complex64)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_char_roundtrip() {
        for c in ['X', 'Y', 'Z'] {
            assert_eq!(PauliOp::from_char(c).unwrap().to_char(), c);
        }
        assert!(PauliOp::from_char('I').is_err());
        assert!(PauliOp::from_char('q').is_err());
    }

    #[test]
    fn test_from_pairs() {
        let term = PauliTerm::from_pairs(&[(0, 'Z'), (2, 'x')]).unwrap();
        assert_eq!(term.len(), 2);
        let ops: Vec<_> = term.iter().copied().collect();
        assert_eq!(ops, vec![(0, PauliOp::Z), (2, PauliOp::X)]);
    }

    #[test]
    fn test_identity_term() {
        assert!(PauliTerm::new().is_identity());
        assert_eq!(PauliTerm::new().to_string(), "I");
        assert_eq!(
            PauliTerm::from_pairs(&[(1, 'Y')]).unwrap().to_string(),
            "Y1"
        );
    }

    #[test]
    fn test_pauli_matrices_unitary() {
        for op in [PauliOp::X, PauliOp::Y, PauliOp::Z] {
            assert!(op.matrix().is_unitary(1e-12));
        }
    }
}
