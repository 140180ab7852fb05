// Location: src/metrics.rs

//! Registry activity counters.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free counters tracking registry activity.
///
/// Updated by the registry on the relevant code paths; reads never block and
/// never touch a device lock.
#[derive(Debug)]
pub struct RegistryMetrics {
    handles_created: Box<[AtomicUsize]>,
    handles_destroyed: AtomicUsize,
    acquisitions: AtomicUsize,
}

/// Point-in-time copy of the registry counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Library-handle creations per device ordinal
    pub handles_created: Vec<usize>,
    /// Total destroy calls issued at shutdown
    pub handles_destroyed: usize,
    /// Total successful handle acquisitions
    pub acquisitions: usize,
}

impl RegistryMetrics {
    pub(crate) fn new(device_count: usize) -> Self {
        let handles_created = (0..device_count)
            .map(|_| AtomicUsize::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            handles_created,
            handles_destroyed: AtomicUsize::new(0),
            acquisitions: AtomicUsize::new(0),
        }
    }

    pub(crate) fn record_handle_created(&self, device: usize) {
        self.handles_created[device].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handle_destroyed(&self) {
        self.handles_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            handles_created: self
                .handles_created
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            handles_destroyed: self.handles_destroyed.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
        }
    }
}
