//! Dense gate matrices
//!
//! A `GateMatrix` is a row-major 2^k × 2^k complex matrix acting on k
//! qubits. Bit j of a row/column index corresponds to the j-th qubit in
//! whatever id list accompanies the matrix (little-endian), so the gate,
//! fusion, and kernel layers all agree on local ordering.

use crate::error::{CoreError, Result};
use num_complex::Complex64;

/// Dense k-qubit unitary in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct GateMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl GateMatrix {
    /// Identity matrix on `num_qubits` qubits
    pub fn identity(num_qubits: usize) -> Self {
        let dim = 1 << num_qubits;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = Complex64::new(1.0, 0.0);
        }
        Self { dim, data }
    }

    /// All-zero matrix on `num_qubits` qubits
    pub fn zeros(num_qubits: usize) -> Self {
        let dim = 1 << num_qubits;
        Self {
            dim,
            data: vec![Complex64::new(0.0, 0.0); dim * dim],
        }
    }

    /// Build a matrix from row-major data
    ///
    /// # Errors
    /// Returns [`CoreError::MatrixShape`] if `data.len() != 4^num_qubits`.
    pub fn from_vec(num_qubits: usize, data: Vec<Complex64>) -> Result<Self> {
        let dim = 1 << num_qubits;
        if data.len() != dim * dim {
            return Err(CoreError::MatrixShape {
                num_qubits,
                expected: dim * dim,
                actual: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    /// Lift a constant 2×2 matrix into a single-qubit `GateMatrix`
    pub fn from_2x2(m: &[[Complex64; 2]; 2]) -> Self {
        Self {
            dim: 2,
            data: vec![m[0][0], m[0][1], m[1][0], m[1][1]],
        }
    }

    /// Number of qubits the matrix acts on
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.dim.trailing_zeros() as usize
    }

    /// Row/column dimension (2^k)
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Set element at (row, col)
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Complex64) {
        self.data[row * self.dim + col] = value;
    }

    /// Row slice
    #[inline]
    pub fn row(&self, row: usize) -> &[Complex64] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    /// Row-major backing data
    #[inline]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Self {
        let mut out = Self::zeros(self.num_qubits());
        for r in 0..self.dim {
            for c in 0..self.dim {
                out.set(c, r, self.get(r, c).conj());
            }
        }
        out
    }

    /// Matrix product `self * rhs`
    ///
    /// `rhs` is applied first when the product is used as an operator.
    ///
    /// # Errors
    /// Returns [`CoreError::DimensionMismatch`] if the dimensions differ.
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        if self.dim != rhs.dim {
            return Err(CoreError::DimensionMismatch {
                left: self.dim,
                right: rhs.dim,
            });
        }
        let mut out = Self::zeros(self.num_qubits());
        for r in 0..self.dim {
            for k in 0..self.dim {
                let a = self.get(r, k);
                if a.norm_sqr() == 0.0 {
                    continue;
                }
                for c in 0..self.dim {
                    let v = out.get(r, c) + a * rhs.get(k, c);
                    out.set(r, c, v);
                }
            }
        }
        Ok(out)
    }

    /// Check unitarity: `self† * self ≈ I` within `epsilon`
    pub fn is_unitary(&self, epsilon: f64) -> bool {
        let product = match self.adjoint().matmul(self) {
            Ok(p) => p,
            Err(_) => return false,
        };
        for r in 0..self.dim {
            for c in 0..self.dim {
                let expected = if r == c { 1.0 } else { 0.0 };
                if (product.get(r, c) - Complex64::new(expected, 0.0)).norm() > epsilon {
                    return false;
                }
            }
        }
        true
    }
}
