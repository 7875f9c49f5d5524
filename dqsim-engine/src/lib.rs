//! Dense state-vector engine and frontend API
//!
//! The [`Simulator`] keeps a complex wavefunction over a dynamic set of
//! qubits and evolves it with controlled gates (batched through the
//! fusion buffer), projective measurement, collapse, amplitude and
//! probability queries, register arithmetic emulation, Pauli-sum
//! operators, and Hamiltonian time evolution.
//!
//! # Example
//!
//! ```
//! use dqsim_core::matrices::HADAMARD;
//! use dqsim_core::{GateMatrix, QubitId};
//! use dqsim_engine::Simulator;
//!
//! let mut sim = Simulator::new(7);
//! let (a, b) = (QubitId::new(0), QubitId::new(1));
//! sim.allocate_qubit(a).unwrap();
//! sim.allocate_qubit(b).unwrap();
//!
//! // Bell pair: H on a, then X on b controlled by a
//! sim.apply_controlled_gate(GateMatrix::from_2x2(&HADAMARD), &[a], &[]).unwrap();
//! sim.apply_controlled_gate(
//!     GateMatrix::from_2x2(&dqsim_core::matrices::PAULI_X),
//!     &[b],
//!     &[a],
//! ).unwrap();
//!
//! let outcomes = sim.measure_qubits(&[a, b]).unwrap();
//! assert_eq!(outcomes[0], outcomes[1]);
//! ```

mod emulation;
pub mod error;
mod operators;
mod simulator;

pub use error::{Result, SimulatorError};
pub use simulator::{Simulator, DEFAULT_TOLERANCE};
