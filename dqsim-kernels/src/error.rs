//! Kernel and backend selection errors

use crate::backend::Backend;
use thiserror::Error;

/// Errors raised during kernel selection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// The requested backend cannot serve kernels on this build/host
    #[error("backend {backend} is not available on this host")]
    BackendUnavailable { backend: Backend },

    /// No kernel is specialised for this many target qubits
    #[error("no kernel for {num_targets} target qubit(s); supported range is 1..={max}")]
    UnsupportedQubitCount { num_targets: usize, max: usize },
}

/// Result type for kernel selection
pub type Result<T> = std::result::Result<T, KernelError>;
