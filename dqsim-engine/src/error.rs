//! Engine error taxonomy
//!
//! Every error surfaces at the operation boundary; there is no internal
//! recovery. Caller errors are raised before the state vector is
//! touched, so the engine is left unchanged — except
//! [`SimulatorError::InternalInconsistency`], which reports a corrupted
//! wavefunction and leaves subsequent behaviour undefined.

use dqsim_core::QubitId;
use dqsim_kernels::KernelError;
use thiserror::Error;

/// Errors raised by simulator operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    /// `allocate_qubit` with an id that is already mapped
    #[error("qubit {0} is already allocated; ids must be unique")]
    AllocationConflict(QubitId),

    /// An operation referenced an id missing from the qubit map
    #[error("unknown qubit {0}")]
    UnknownQubit(QubitId),

    /// `deallocate_qubit` on a qubit whose measurement outcome is not
    /// determined; deallocating it would collapse state behind the
    /// caller's back
    #[error("qubit {0} has not been measured or uncomputed; deallocation would collapse it")]
    NonClassicalDeallocation(QubitId),

    /// `set_wavefunction` with an ordering that does not match the
    /// allocated qubit set, or amplitudes of the wrong length
    #[error("invalid wavefunction ordering: {reason}")]
    InvalidOrdering { reason: String },

    /// `get_amplitude` with ids that are not a permutation of every
    /// allocated qubit
    #[error("amplitude queries must name every allocated qubit exactly once")]
    IncompleteAmplitudeQuery,

    /// `collapse_wavefunction` onto an outcome carrying ~zero probability
    #[error("cannot collapse onto an outcome of probability {probability:.3e}")]
    DegenerateCollapse { probability: f64 },

    /// `collapse_wavefunction` with mismatched ids/values lengths
    #[error("ids and values lengths differ: {ids} vs {values}")]
    ShapeMismatch { ids: usize, values: usize },

    /// No basis state carries measurable mass; the wavefunction is
    /// corrupted and further results are undefined
    #[error("state vector carries no measurable mass anywhere")]
    InternalInconsistency,

    /// Kernel selection failed for the requested backend or width
    #[error(transparent)]
    Backend(#[from] KernelError),
}

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;
