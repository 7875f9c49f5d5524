//! Error types shared by the core vocabulary

use thiserror::Error;

/// Errors raised while constructing core types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Matrix data length does not match the declared qubit count
    #[error("matrix for {num_qubits} qubit(s) needs {expected} entries, got {actual}")]
    MatrixShape {
        num_qubits: usize,
        expected: usize,
        actual: usize,
    },

    /// Matrix dimensions incompatible for multiplication
    #[error("matrix dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Character is not one of 'X', 'Y', 'Z'
    #[error("invalid Pauli operator '{0}'")]
    InvalidPauliChar(char),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
