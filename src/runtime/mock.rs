//! In-process fake of the accelerator runtime for tests.
//!
//! Tracks a per-thread "current device" the way the real driver does,
//! counts create/destroy calls per device, and lets tests inject failures
//! into individual query paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::error::{RegistryError, Result};
use crate::runtime::DeviceRuntime;
use crate::types::{DeviceCapabilities, MemoryInfo};

const MOCK_STATUS_INJECTED: i32 = 999;

#[derive(Debug)]
pub(crate) struct MockHandle {
    pub device: usize,
    pub id: usize,
}

#[derive(Debug)]
pub(crate) struct MockRuntime {
    capabilities: Vec<DeviceCapabilities>,
    memory: Vec<MemoryInfo>,
    current: Mutex<HashMap<ThreadId, usize>>,
    next_handle_id: AtomicUsize,
    create_calls: Vec<AtomicUsize>,
    destroy_calls: Vec<AtomicUsize>,
    set_device_calls: AtomicUsize,
    fail_capabilities_for: Mutex<Option<usize>>,
    fail_create_for: Mutex<Option<usize>>,
    fail_destroy_for: Mutex<Option<usize>>,
    fail_memory_info: AtomicBool,
    fail_current_device: AtomicBool,
    fail_set_device_after: Mutex<Option<usize>>,
}

impl MockRuntime {
    pub fn new(device_count: usize) -> Self {
        let capabilities = (0..device_count)
            .map(|d| DeviceCapabilities {
                warp_size: 32,
                max_block_dim: 1024,
                max_grid_dim: 65_535,
                compute_major: 7,
                compute_minor: d as i32,
            })
            .collect();
        let memory = (0..device_count)
            .map(|d| MemoryInfo {
                free: (d + 1) * 1024,
                total: (d + 1) * 4096,
            })
            .collect();
        Self {
            capabilities,
            memory,
            current: Mutex::new(HashMap::new()),
            next_handle_id: AtomicUsize::new(1),
            create_calls: (0..device_count).map(|_| AtomicUsize::new(0)).collect(),
            destroy_calls: (0..device_count).map(|_| AtomicUsize::new(0)).collect(),
            set_device_calls: AtomicUsize::new(0),
            fail_capabilities_for: Mutex::new(None),
            fail_create_for: Mutex::new(None),
            fail_destroy_for: Mutex::new(None),
            fail_memory_info: AtomicBool::new(false),
            fail_current_device: AtomicBool::new(false),
            fail_set_device_after: Mutex::new(None),
        }
    }

    pub fn with_capabilities(device: usize, caps: DeviceCapabilities) -> Self {
        let mut runtime = Self::new(device + 1);
        runtime.capabilities[device] = caps;
        runtime
    }

    pub fn fail_capabilities_for(&self, device: usize) {
        *self.fail_capabilities_for.lock() = Some(device);
    }

    pub fn clear_capability_failure(&self) {
        *self.fail_capabilities_for.lock() = None;
    }

    pub fn fail_create_for(&self, device: usize) {
        *self.fail_create_for.lock() = Some(device);
    }

    pub fn clear_create_failure(&self) {
        *self.fail_create_for.lock() = None;
    }

    pub fn fail_destroy_for(&self, device: usize) {
        *self.fail_destroy_for.lock() = Some(device);
    }

    pub fn fail_memory_info(&self, fail: bool) {
        self.fail_memory_info.store(fail, Ordering::SeqCst);
    }

    pub fn fail_current_device(&self, fail: bool) {
        self.fail_current_device.store(fail, Ordering::SeqCst);
    }

    /// Fail every `set_current_device` call after the first `calls`.
    pub fn fail_set_device_after(&self, calls: usize) {
        *self.fail_set_device_after.lock() = Some(calls);
    }

    pub fn create_calls(&self, device: usize) -> usize {
        self.create_calls[device].load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self, device: usize) -> usize {
        self.destroy_calls[device].load(Ordering::SeqCst)
    }

    fn check_device(&self, device: usize, op: &'static str) -> Result<()> {
        if device >= self.capabilities.len() {
            return Err(RegistryError::DeviceQuery {
                device,
                op,
                status: MOCK_STATUS_INJECTED,
            });
        }
        Ok(())
    }
}

impl DeviceRuntime for MockRuntime {
    type Handle = MockHandle;

    fn device_count(&self) -> Result<usize> {
        Ok(self.capabilities.len())
    }

    fn current_device(&self) -> Result<usize> {
        if self.fail_current_device.load(Ordering::SeqCst) {
            return Err(RegistryError::CurrentDevice {
                status: MOCK_STATUS_INJECTED,
            });
        }
        let current = self.current.lock();
        Ok(current.get(&thread::current().id()).copied().unwrap_or(0))
    }

    fn set_current_device(&self, device: usize) -> Result<()> {
        self.check_device(device, "set_current_device")?;
        let calls = self.set_device_calls.fetch_add(1, Ordering::SeqCst);
        if matches!(*self.fail_set_device_after.lock(), Some(limit) if calls >= limit) {
            return Err(RegistryError::DeviceQuery {
                device,
                op: "set_current_device",
                status: MOCK_STATUS_INJECTED,
            });
        }
        self.current.lock().insert(thread::current().id(), device);
        Ok(())
    }

    fn device_capabilities(&self, device: usize) -> Result<DeviceCapabilities> {
        self.check_device(device, "device_capabilities")?;
        if *self.fail_capabilities_for.lock() == Some(device) {
            return Err(RegistryError::DeviceQuery {
                device,
                op: "device_capabilities",
                status: MOCK_STATUS_INJECTED,
            });
        }
        Ok(self.capabilities[device])
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        let device = self.current_device()?;
        if self.fail_memory_info.load(Ordering::SeqCst) {
            return Err(RegistryError::DeviceQuery {
                device,
                op: "memory_info",
                status: MOCK_STATUS_INJECTED,
            });
        }
        Ok(self.memory[device])
    }

    fn create_handle(&self, device: usize) -> Result<MockHandle> {
        self.check_device(device, "create_handle")?;
        if *self.fail_create_for.lock() == Some(device) {
            return Err(RegistryError::HandleCreation {
                device,
                status: MOCK_STATUS_INJECTED,
            });
        }
        self.create_calls[device].fetch_add(1, Ordering::SeqCst);
        Ok(MockHandle {
            device,
            id: self.next_handle_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    fn destroy_handle(&self, device: usize, handle: MockHandle) -> Result<()> {
        assert_eq!(handle.device, device, "handle destroyed on wrong device");
        self.destroy_calls[device].fetch_add(1, Ordering::SeqCst);
        if *self.fail_destroy_for.lock() == Some(device) {
            return Err(RegistryError::DeviceQuery {
                device,
                op: "destroy_handle",
                status: MOCK_STATUS_INJECTED,
            });
        }
        Ok(())
    }
}
