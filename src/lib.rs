//! GPU Registry - per-device capability cache and handle lifecycle manager
//!
//! This crate is the single point of truth a multi-GPU process consults
//! before issuing device-specific kernel launches or BLAS calls. It discovers
//! the installed accelerators once, caches their immutable hardware limits,
//! and serializes access to each device's lazily-created numerical-library
//! handle through a scoped lease.
//!
//! Create one [`DeviceRegistry`] at startup and share it by reference:
//!
//! ```no_run
//! # #[cfg(feature = "cuda")]
//! # fn main() -> gpu_registry::Result<()> {
//! use gpu_registry::{CudaRuntime, DeviceRegistry};
//!
//! let registry = DeviceRegistry::new(CudaRuntime::new())?;
//! println!("warp size: {}", registry.warp_size()?);
//!
//! let handle = registry.acquire_handle()?;
//! // exclusive use of the device's cuBLAS context until `handle` drops
//! # drop(handle);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "cuda"))]
//! # fn main() {}
//! ```

#![warn(missing_docs)]

use std::fmt;

// Public modules
pub mod error;
pub mod metrics;
pub mod registry;
pub mod runtime;
pub mod types;

// Internal modules
mod utils;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-exports for public API
pub use error::{RegistryError, Result};
pub use metrics::{MetricsSnapshot, RegistryMetrics};
pub use registry::{DeviceRegistry, HandleLease};
pub use runtime::DeviceRuntime;
pub use types::{DeviceCapabilities, MemoryInfo};
pub use utils::{setup_logging, LogConfig};

#[cfg(feature = "cuda")]
pub use runtime::{CublasHandle, CudaRuntime};

/// Feature detection for supported backends
pub struct Features {
    /// Whether CUDA support is enabled
    pub cuda: bool,
    /// Number of detected CUDA devices
    pub cuda_devices: usize,
}

impl Features {
    /// Detect available features at runtime
    pub fn detect() -> Self {
        #[cfg(feature = "cuda")]
        let cuda_devices = CudaRuntime::new().device_count().unwrap_or(0);

        #[cfg(not(feature = "cuda"))]
        let cuda_devices = 0;

        Self {
            cuda: cfg!(feature = "cuda") && cuda_devices > 0,
            cuda_devices,
        }
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CUDA support: {}", if self.cuda { "yes" } else { "no" })?;
        if self.cuda {
            writeln!(f, "CUDA devices: {}", self.cuda_devices)?;
        }
        Ok(())
    }
}
