//! Numeric kernels for the dqsim dense state-vector simulator
//!
//! A kernel applies a dense k-qubit matrix (k ∈ 1..=5) in place to a
//! state vector, restricted to the indices selected by a control mask.
//! Kernels are monomorphised over the 2^k local dimension so the
//! gather/scatter loops have compile-time bounds, and come in scalar,
//! rayon-threaded, and SIMD families chosen through [`Backend`].
//!
//! # Conventions
//!
//! Target bit positions are passed high-to-low: `positions[0]` is the
//! most significant bit of the matrix row/column index. The control mask
//! must not overlap the target positions; an operation touches exactly
//! the indices `i` with `(i & ctrlmask) == ctrlmask`.

pub mod backend;
pub mod dispatch;
pub mod error;

mod coset;
mod scalar;
mod simd;
mod threaded;

pub use backend::{resolve_auto, Backend};
pub use dispatch::{select_kernel, Kernel, MAX_TARGET_QUBITS};
pub use error::{KernelError, Result};
