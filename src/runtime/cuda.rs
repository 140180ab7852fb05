//! CUDA-backed [`DeviceRuntime`] implementation.
//!
//! Device enumeration, selection, and queries go through the CUDA runtime
//! API (`cuda-runtime-sys`). The numerical-library handle is a cuBLAS
//! context; the small set of cuBLAS entry points we need is declared here
//! directly against libcublas.

use std::os::raw::c_int;
use std::ptr;

use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::runtime::DeviceRuntime;
use crate::types::{DeviceCapabilities, MemoryInfo};

// cuBLAS status code. 0 = CUBLAS_STATUS_SUCCESS.
type CublasStatus = c_int;

// Opaque cuBLAS context.
#[repr(C)]
struct CublasContext {
    _private: [u8; 0],
}

// Scalar results written to host memory rather than device pointers.
const CUBLAS_POINTER_MODE_HOST: c_int = 0;

#[link(name = "cublas")]
extern "C" {
    fn cublasCreate_v2(handle: *mut *mut CublasContext) -> CublasStatus;
    fn cublasDestroy_v2(handle: *mut CublasContext) -> CublasStatus;
    fn cublasSetPointerMode_v2(handle: *mut CublasContext, mode: c_int) -> CublasStatus;
}

/// Owned cuBLAS context pointer for one device.
///
/// Created and destroyed only by [`CudaRuntime`]; consumers pass the raw
/// pointer to cuBLAS calls via [`as_ptr`](CublasHandle::as_ptr).
pub struct CublasHandle {
    raw: *mut CublasContext,
}

// The registry serializes all use of a handle behind its slot lock, so the
// pointer may move between threads but is never used concurrently.
unsafe impl Send for CublasHandle {}

impl CublasHandle {
    /// Raw context pointer to hand to cuBLAS entry points.
    pub fn as_ptr(&self) -> *mut std::ffi::c_void {
        self.raw.cast()
    }
}

/// [`DeviceRuntime`] backed by the CUDA runtime API and cuBLAS.
#[derive(Debug, Default)]
pub struct CudaRuntime;

impl CudaRuntime {
    /// Create a CUDA runtime facade. Stateless; the driver owns all state.
    pub fn new() -> Self {
        Self
    }
}

impl DeviceRuntime for CudaRuntime {
    type Handle = CublasHandle;

    fn device_count(&self) -> Result<usize> {
        let mut count: c_int = 0;
        let status = unsafe { cuda_runtime_sys::cudaGetDeviceCount(&mut count) };
        if status != 0 {
            return Err(RegistryError::DeviceQuery {
                device: 0,
                op: "cudaGetDeviceCount",
                status: status as i32,
            });
        }
        Ok(count as usize)
    }

    fn current_device(&self) -> Result<usize> {
        let mut device: c_int = 0;
        let status = unsafe { cuda_runtime_sys::cudaGetDevice(&mut device) };
        if status != 0 {
            return Err(RegistryError::CurrentDevice {
                status: status as i32,
            });
        }
        Ok(device as usize)
    }

    fn set_current_device(&self, device: usize) -> Result<()> {
        let status = unsafe { cuda_runtime_sys::cudaSetDevice(device as c_int) };
        if status != 0 {
            return Err(RegistryError::DeviceQuery {
                device,
                op: "cudaSetDevice",
                status: status as i32,
            });
        }
        Ok(())
    }

    fn device_capabilities(&self, device: usize) -> Result<DeviceCapabilities> {
        let mut prop: cuda_runtime_sys::cudaDeviceProp = unsafe { std::mem::zeroed() };
        let status =
            unsafe { cuda_runtime_sys::cudaGetDeviceProperties(&mut prop, device as c_int) };
        if status != 0 {
            return Err(RegistryError::DeviceQuery {
                device,
                op: "cudaGetDeviceProperties",
                status: status as i32,
            });
        }
        Ok(DeviceCapabilities {
            warp_size: prop.warpSize,
            max_block_dim: prop.maxThreadsDim[0],
            max_grid_dim: prop.maxGridSize[0],
            compute_major: prop.major,
            compute_minor: prop.minor,
        })
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        let mut free: usize = 0;
        let mut total: usize = 0;
        let status = unsafe { cuda_runtime_sys::cudaMemGetInfo(&mut free, &mut total) };
        if status != 0 {
            let device = self.current_device()?;
            return Err(RegistryError::DeviceQuery {
                device,
                op: "cudaMemGetInfo",
                status: status as i32,
            });
        }
        Ok(MemoryInfo { free, total })
    }

    fn create_handle(&self, device: usize) -> Result<CublasHandle> {
        // cublasCreate binds the context to the thread's current device, so
        // select the target ordinal around creation and restore afterwards.
        let previous = self.current_device()?;
        self.set_current_device(device)?;

        let created = (|| {
            let mut raw: *mut CublasContext = ptr::null_mut();
            let status = unsafe { cublasCreate_v2(&mut raw) };
            if status != 0 {
                return Err(RegistryError::HandleCreation {
                    device,
                    status: status as i32,
                });
            }
            let handle = CublasHandle { raw };
            let status = unsafe { cublasSetPointerMode_v2(handle.raw, CUBLAS_POINTER_MODE_HOST) };
            if status != 0 {
                unsafe { cublasDestroy_v2(handle.raw) };
                return Err(RegistryError::HandleCreation {
                    device,
                    status: status as i32,
                });
            }
            Ok(handle)
        })();

        let restored = self.set_current_device(previous);
        let handle = created?;
        if let Err(err) = restored {
            unsafe { cublasDestroy_v2(handle.raw) };
            return Err(err);
        }
        debug!(device, "created cuBLAS handle");
        Ok(handle)
    }

    fn destroy_handle(&self, device: usize, handle: CublasHandle) -> Result<()> {
        let status = unsafe { cublasDestroy_v2(handle.raw) };
        if status != 0 {
            return Err(RegistryError::DeviceQuery {
                device,
                op: "cublasDestroy_v2",
                status: status as i32,
            });
        }
        debug!(device, "destroyed cuBLAS handle");
        Ok(())
    }
}
