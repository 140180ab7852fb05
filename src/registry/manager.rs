// Location: src/registry/manager.rs

use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};
use crate::metrics::RegistryMetrics;
use crate::registry::slot::{DeviceSlot, HandleLease};
use crate::runtime::DeviceRuntime;
use crate::types::{DeviceCapabilities, MemoryInfo};

/// Process-scoped table of accelerator devices.
///
/// Discovers the installed devices once at construction, caches their
/// immutable capability facts, and serializes access to each device's
/// lazily-created numerical-library handle. Create one registry at startup
/// and pass it by reference to every consumer; the device set is fixed for
/// the registry's lifetime (no hot-plug).
///
/// All methods are synchronous and safe to call from multiple threads. The
/// only blocking operation is handle acquisition.
#[derive(Debug)]
pub struct DeviceRegistry<R: DeviceRuntime> {
    runtime: R,
    slots: Box<[DeviceSlot<R::Handle>]>,
    metrics: RegistryMetrics,
}

impl<R: DeviceRuntime> DeviceRegistry<R> {
    /// Discover devices and cache their capability facts.
    ///
    /// Probing selects each device in turn and restores the caller's prior
    /// selection before returning, so construction is transparent to the
    /// calling thread. Any selection or query failure aborts the whole
    /// construction with no partial state; a later call starts clean.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NoDevices`] if zero devices are installed, or a
    /// query error from the runtime (including a failure to restore the
    /// prior selection, which is fatal to construction).
    pub fn new(runtime: R) -> Result<Self> {
        let count = runtime.device_count()?;
        if count == 0 {
            return Err(RegistryError::NoDevices);
        }

        let previous = runtime.current_device()?;
        let probed = Self::probe_devices(&runtime, count);
        let restored = runtime.set_current_device(previous);
        let capabilities = probed?;
        restored?;

        info!(devices = count, "device registry constructed");
        Ok(Self {
            runtime,
            slots: capabilities.into_iter().map(DeviceSlot::new).collect(),
            metrics: RegistryMetrics::new(count),
        })
    }

    fn probe_devices(runtime: &R, count: usize) -> Result<Vec<DeviceCapabilities>> {
        let mut capabilities = Vec::with_capacity(count);
        for device in 0..count {
            runtime.set_current_device(device)?;
            let caps = runtime.device_capabilities(device)?;
            debug!(
                device,
                warp_size = caps.warp_size,
                compute_major = caps.compute_major,
                compute_minor = caps.compute_minor,
                "probed device"
            );
            capabilities.push(caps);
        }
        Ok(capabilities)
    }

    /// Number of devices discovered at construction.
    pub fn device_count(&self) -> usize {
        self.slots.len()
    }

    /// Ordinal the runtime currently reports as selected on this thread.
    ///
    /// Selection is owned by the runtime; the registry never tracks it.
    pub fn current_device(&self) -> Result<usize> {
        self.runtime.current_device()
    }

    /// The underlying runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Activity counters for this registry.
    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }

    fn slot(&self, device: usize) -> Result<&DeviceSlot<R::Handle>> {
        self.slots.get(device).ok_or(RegistryError::UnknownDevice {
            device,
            count: self.slots.len(),
        })
    }

    fn current_slot(&self) -> Result<&DeviceSlot<R::Handle>> {
        self.slot(self.runtime.current_device()?)
    }

    /// Cached capability facts for the current device.
    pub fn capabilities(&self) -> Result<DeviceCapabilities> {
        Ok(*self.current_slot()?.capabilities())
    }

    /// Cached capability facts for an explicit device ordinal.
    pub fn capabilities_on(&self, device: usize) -> Result<DeviceCapabilities> {
        Ok(*self.slot(device)?.capabilities())
    }

    /// Warp size of the current device.
    pub fn warp_size(&self) -> Result<i32> {
        Ok(self.current_slot()?.capabilities().warp_size)
    }

    /// First-dimension block-size ceiling of the current device.
    pub fn max_block_dim(&self) -> Result<i32> {
        Ok(self.current_slot()?.capabilities().max_block_dim)
    }

    /// First-dimension grid-size ceiling of the current device.
    pub fn max_grid_dim(&self) -> Result<i32> {
        Ok(self.current_slot()?.capabilities().max_grid_dim)
    }

    /// Compute-capability major version of the current device.
    pub fn compute_major(&self) -> Result<i32> {
        Ok(self.current_slot()?.capabilities().compute_major)
    }

    /// Compute-capability minor version of the current device.
    pub fn compute_minor(&self) -> Result<i32> {
        Ok(self.current_slot()?.capabilities().compute_minor)
    }

    /// Acquire exclusive use of the current device's library handle.
    ///
    /// See [`acquire_handle_on`](DeviceRegistry::acquire_handle_on).
    pub fn acquire_handle(&self) -> Result<HandleLease<'_, R::Handle>> {
        self.acquire_handle_on(self.runtime.current_device()?)
    }

    /// Acquire exclusive use of `device`'s library handle.
    ///
    /// Blocks until the device's lock is available; the wait is unbounded.
    /// The handle is created on first acquisition and reused afterwards. If
    /// creation fails the slot stays empty, the lock is released, and the
    /// error carries the device ordinal and native status; a later
    /// acquisition retries creation.
    ///
    /// The returned lease holds the device lock until dropped. The lock is
    /// not reentrant: acquiring the same device again on a thread that still
    /// holds a lease for it deadlocks.
    pub fn acquire_handle_on(&self, device: usize) -> Result<HandleLease<'_, R::Handle>> {
        let slot = self.slot(device)?;
        let lease = slot.lock_or_init(|| {
            let handle = self.runtime.create_handle(device)?;
            self.metrics.record_handle_created(device);
            debug!(device, "library handle created");
            Ok(handle)
        })?;
        self.metrics.record_acquisition();
        Ok(lease)
    }

    /// Free and total memory of the current device. Never cached.
    pub fn memory_info(&self) -> Result<MemoryInfo> {
        self.runtime.memory_info()
    }

    /// Free and total memory of an explicit device.
    ///
    /// Selects `device`, queries, and restores the prior selection on every
    /// path, including a failed query.
    pub fn memory_info_on(&self, device: usize) -> Result<MemoryInfo> {
        self.slot(device)?;
        let previous = self.runtime.current_device()?;
        self.runtime.set_current_device(device)?;
        let info = self.runtime.memory_info();
        let restored = self.runtime.set_current_device(previous);
        let info = info?;
        restored?;
        Ok(info)
    }

    /// Free memory of the current device, in bytes.
    pub fn free_memory(&self) -> Result<usize> {
        Ok(self.memory_info()?.free)
    }

    /// Total memory of the current device, in bytes.
    pub fn total_memory(&self) -> Result<usize> {
        Ok(self.memory_info()?.total)
    }

    /// Free memory of an explicit device, in bytes.
    pub fn free_memory_on(&self, device: usize) -> Result<usize> {
        Ok(self.memory_info_on(device)?.free)
    }

    /// Total memory of an explicit device, in bytes.
    pub fn total_memory_on(&self, device: usize) -> Result<usize> {
        Ok(self.memory_info_on(device)?.total)
    }

    /// Destroy every handle that was created, exactly once each.
    ///
    /// Slots whose handle was never created are skipped. Idempotent, and
    /// also run on drop; a destroy failure is logged and does not stop
    /// teardown of the remaining slots.
    pub fn shutdown(&mut self) {
        for (device, slot) in self.slots.iter_mut().enumerate() {
            if let Some(handle) = slot.take_handle() {
                self.metrics.record_handle_destroyed();
                if let Err(err) = self.runtime.destroy_handle(device, handle) {
                    warn!(device, %err, "failed to destroy library handle");
                }
            }
        }
    }
}

impl<R: DeviceRuntime> Drop for DeviceRegistry<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
