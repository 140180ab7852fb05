//! Per-device capability cache and handle lifecycle management.

mod manager;
mod slot;

pub use manager::DeviceRegistry;
pub use slot::HandleLease;
