// Location: src/error.rs

//! Typed failures surfaced by the registry.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors surfaced by the device registry.
///
/// Every failure carries enough context to identify the device and the
/// native call that failed; nothing is retried or swallowed internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Zero accelerator devices were discovered at construction.
    #[error("no accelerator devices present")]
    NoDevices,

    /// A device-selection, capability, or memory query failed.
    #[error("device {device}: {op} failed with status {status}")]
    DeviceQuery {
        /// Device ordinal the query targeted
        device: usize,
        /// Name of the failed native call
        op: &'static str,
        /// Native status code returned by the runtime
        status: i32,
    },

    /// The runtime could not report which device is currently selected.
    #[error("unable to query current device (status {status})")]
    CurrentDevice {
        /// Native status code returned by the runtime
        status: i32,
    },

    /// Numerical-library context creation failed. The slot's handle stays
    /// unset, so a later acquisition retries creation.
    #[error("unable to create library handle for device {device} (status {status})")]
    HandleCreation {
        /// Device ordinal the handle was requested for
        device: usize,
        /// Native status code returned by the library
        status: i32,
    },

    /// An explicit device ordinal was outside the discovered range.
    #[error("device ordinal {device} out of range (0..{count})")]
    UnknownDevice {
        /// The offending ordinal
        device: usize,
        /// Number of devices discovered at construction
        count: usize,
    },
}
