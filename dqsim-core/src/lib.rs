//! Shared types for the dqsim dense state-vector simulator
//!
//! This crate holds the vocabulary that the kernel, fusion, and engine
//! crates exchange: qubit identifiers, dense gate matrices, Pauli
//! operators and weighted Pauli sums, and the core error type.

pub mod error;
pub mod matrices;
pub mod matrix;
pub mod pauli;
pub mod qubit;

pub use error::{CoreError, Result};
pub use matrix::GateMatrix;
pub use pauli::{ComplexPauliSum, PauliOp, PauliSum, PauliTerm};
pub use qubit::QubitId;
