//! Runtime seam between the registry and the accelerator stack.
//!
//! The registry never talks to the driver directly. Enumeration, per-thread
//! device selection, capability and memory queries, and the numerical-library
//! handle factory all go through [`DeviceRuntime`].
//! Production code uses [`CudaRuntime`]; tests substitute a mock.

#[cfg(feature = "cuda")]
mod cuda;
#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "cuda")]
pub use cuda::{CublasHandle, CudaRuntime};

use std::sync::Arc;

use crate::error::Result;
use crate::types::{DeviceCapabilities, MemoryInfo};

/// Accelerator runtime operations the registry depends on.
///
/// "Current device" is per-thread state owned by the runtime itself; the
/// registry never shadows it. Implementations must tolerate concurrent calls
/// from multiple threads.
pub trait DeviceRuntime: Send + Sync {
    /// Opaque per-device numerical-library context.
    type Handle: Send;

    /// Number of installed devices.
    fn device_count(&self) -> Result<usize>;

    /// Ordinal of the device currently selected on the calling thread.
    fn current_device(&self) -> Result<usize>;

    /// Select `device` as current for the calling thread.
    fn set_current_device(&self, device: usize) -> Result<()>;

    /// Query the immutable hardware limits of `device`.
    fn device_capabilities(&self, device: usize) -> Result<DeviceCapabilities>;

    /// Free/total memory of the calling thread's current device.
    fn memory_info(&self) -> Result<MemoryInfo>;

    /// Create a library handle bound to `device`, already configured to
    /// report scalar results by value.
    fn create_handle(&self, device: usize) -> Result<Self::Handle>;

    /// Destroy a handle previously returned by [`create_handle`].
    ///
    /// [`create_handle`]: DeviceRuntime::create_handle
    fn destroy_handle(&self, device: usize, handle: Self::Handle) -> Result<()>;
}

// Lets callers keep their own reference to the runtime (tests inspect the
// mock after handing it to the registry).
impl<R: DeviceRuntime> DeviceRuntime for Arc<R> {
    type Handle = R::Handle;

    fn device_count(&self) -> Result<usize> {
        (**self).device_count()
    }

    fn current_device(&self) -> Result<usize> {
        (**self).current_device()
    }

    fn set_current_device(&self, device: usize) -> Result<()> {
        (**self).set_current_device(device)
    }

    fn device_capabilities(&self, device: usize) -> Result<DeviceCapabilities> {
        (**self).device_capabilities(device)
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        (**self).memory_info()
    }

    fn create_handle(&self, device: usize) -> Result<Self::Handle> {
        (**self).create_handle(device)
    }

    fn destroy_handle(&self, device: usize, handle: Self::Handle) -> Result<()> {
        (**self).destroy_handle(device, handle)
    }
}
