//! Execution backend selection
//!
//! A backend names a kernel family (scalar or vectorised, serial or
//! thread-parallel). `Auto` resolves once per process to the most capable
//! family the host supports; offload targets exist in the enum for API
//! compatibility but no offload kernels ship in this build.

use std::fmt;
use std::sync::OnceLock;

/// Kernel family used to flush fused gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Not yet selected; selecting this is an error
    Unknown,
    /// Probe the host and pick the best available family
    Auto,
    /// Scalar arithmetic, single thread
    ScalarSerial,
    /// Scalar arithmetic, rayon-parallel outer loop
    ScalarThreaded,
    /// SIMD arithmetic, single thread
    VectorSerial,
    /// SIMD arithmetic, rayon-parallel outer loop
    VectorThreaded,
    /// NVIDIA GPU offload (not available in this build)
    OffloadNvidia,
    /// Intel accelerator offload (not available in this build)
    OffloadIntel,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Unknown => "unknown",
            Backend::Auto => "auto",
            Backend::ScalarSerial => "scalar-serial",
            Backend::ScalarThreaded => "scalar-threaded",
            Backend::VectorSerial => "vector-serial",
            Backend::VectorThreaded => "vector-threaded",
            Backend::OffloadNvidia => "offload-nvidia",
            Backend::OffloadIntel => "offload-intel",
        };
        write!(f, "{name}")
    }
}

impl Backend {
    /// True for the families kernels exist for on this build
    pub fn is_available(self) -> bool {
        matches!(
            self,
            Backend::Auto
                | Backend::ScalarSerial
                | Backend::ScalarThreaded
                | Backend::VectorSerial
                | Backend::VectorThreaded
        )
    }
}

/// Probe results, computed once per process
struct HostCapabilities {
    simd: bool,
    threads: usize,
}

fn capabilities() -> &'static HostCapabilities {
    static CAPS: OnceLock<HostCapabilities> = OnceLock::new();
    CAPS.get_or_init(|| HostCapabilities {
        simd: detect_simd(),
        threads: rayon::current_num_threads(),
    })
}

#[cfg(target_arch = "x86_64")]
fn detect_simd() -> bool {
    is_x86_feature_detected!("avx2") || is_x86_feature_detected!("sse2")
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_simd() -> bool {
    false
}

/// Resolve `Auto` to a concrete backend for this host
///
/// Vectorised families win over scalar when SIMD is detected; threaded
/// families win over serial when the rayon pool has more than one worker.
pub fn resolve_auto() -> Backend {
    let caps = capabilities();
    match (caps.simd, caps.threads > 1) {
        (true, true) => Backend::VectorThreaded,
        (true, false) => Backend::VectorSerial,
        (false, true) => Backend::ScalarThreaded,
        (false, false) => Backend::ScalarSerial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_to_concrete() {
        let resolved = resolve_auto();
        assert_ne!(resolved, Backend::Auto);
        assert_ne!(resolved, Backend::Unknown);
        assert!(resolved.is_available());
    }

    #[test]
    fn test_offload_unavailable() {
        assert!(!Backend::OffloadNvidia.is_available());
        assert!(!Backend::OffloadIntel.is_available());
        assert!(!Backend::Unknown.is_available());
    }
}
