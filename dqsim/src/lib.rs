//! Dense state-vector quantum circuit simulator
//!
//! Facade over the workspace crates: the engine and its frontend API,
//! the shared gate/Pauli vocabulary, the fusion buffer, and backend
//! selection.
//!
//! # Quick start
//!
//! ```
//! use dqsim::{Backend, GateMatrix, QubitId, Simulator};
//! use dqsim::matrices::HADAMARD;
//!
//! let mut sim = Simulator::new(1);
//! sim.select_backend(Backend::ScalarSerial).unwrap();
//!
//! let q = QubitId::new(0);
//! sim.allocate_qubit(q).unwrap();
//! sim.apply_controlled_gate(GateMatrix::from_2x2(&HADAMARD), &[q], &[]).unwrap();
//!
//! let outcome = sim.measure_qubits(&[q]).unwrap();
//! assert_eq!(outcome.len(), 1);
//! ```

pub use dqsim_core::matrices;
pub use dqsim_core::{
    ComplexPauliSum, CoreError, GateMatrix, PauliOp, PauliSum, PauliTerm, QubitId,
};
pub use dqsim_engine::{Result, Simulator, SimulatorError, DEFAULT_TOLERANCE};
pub use dqsim_fusion::Fusion;
pub use dqsim_kernels::{select_kernel, Backend, Kernel, KernelError, MAX_TARGET_QUBITS};
