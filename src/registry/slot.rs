// Location: src/registry/slot.rs

use std::fmt;
use std::ops::Deref;

use parking_lot::{Mutex, MutexGuard};

use crate::error::Result;
use crate::types::DeviceCapabilities;

/// Per-device row of the registry: cached capability facts plus the
/// lazily-created library handle behind this device's lock.
///
/// The handle goes `None -> Some` exactly once, under the lock, and back to
/// `None` only when the registry shuts down.
pub(crate) struct DeviceSlot<H> {
    capabilities: DeviceCapabilities,
    handle: Mutex<Option<H>>,
}

/// Exclusive-use window for one device's library handle.
///
/// Holding a lease means holding that device's lock: no other thread can
/// touch the handle until the lease drops. Release happens on every exit
/// path; there is no separate unlock call to forget.
pub struct HandleLease<'a, H> {
    guard: MutexGuard<'a, Option<H>>,
}

impl<H> fmt::Debug for DeviceSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSlot")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<H> DeviceSlot<H> {
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            handle: Mutex::new(None),
        }
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Block on this slot's lock, then run the double-checked lazy step:
    /// create the handle via `init` if it does not exist yet.
    ///
    /// If `init` fails the handle stays unset and the lock is released as
    /// the temporary guard unwinds, so a later call retries creation.
    pub fn lock_or_init<F>(&self, init: F) -> Result<HandleLease<'_, H>>
    where
        F: FnOnce() -> Result<H>,
    {
        let mut guard = self.handle.lock();
        if guard.is_none() {
            *guard = Some(init()?);
        }
        Ok(HandleLease { guard })
    }

    /// Remove the handle for teardown. Requires `&mut self`, so no lease can
    /// be outstanding; returns `None` if the handle was never created or was
    /// already taken.
    pub fn take_handle(&mut self) -> Option<H> {
        self.handle.get_mut().take()
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl<H> Deref for HandleLease<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        match self.guard.as_ref() {
            Some(handle) => handle,
            // lock_or_init fills the cell before a lease is handed out
            None => unreachable!("handle lease issued for an empty slot"),
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for HandleLease<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandleLease").field(&**self).finish()
    }
}
