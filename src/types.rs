// Location: src/types.rs

//! Capability and memory facts reported per device.

use serde::{Deserialize, Serialize};

/// Immutable hardware limits for one device, queried once at registry
/// construction and cached for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Native execution-group width (threads per warp)
    pub warp_size: i32,

    /// Launch-configuration ceiling for the first block dimension
    pub max_block_dim: i32,

    /// Launch-configuration ceiling for the first grid dimension
    pub max_grid_dim: i32,

    /// Architecture major version
    pub compute_major: i32,

    /// Architecture minor version
    pub compute_minor: i32,
}

impl DeviceCapabilities {
    /// Compute capability as a `(major, minor)` pair.
    pub fn compute_capability(&self) -> (i32, i32) {
        (self.compute_major, self.compute_minor)
    }
}

/// Point-in-time memory figures for one device. Never cached: free memory
/// changes continuously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Free device memory in bytes
    pub free: usize,

    /// Total device memory in bytes
    pub total: usize,
}
