//! Pin backend implementations.
//!
//! - [`simulation`] - In-memory lines for development and testing
//! - [`sysfs`] - Linux `/sys/class/gpio` lines for real hardware
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `PinDriver` and `PinBank` from `lk_common::pin`
//! 3. Provide a `create_bank` factory and register it below

pub mod simulation;
pub mod sysfs;

use crate::backend_registry::PinBackendRegistry;
use lk_common::consts::{SIMULATION_BACKEND, SYSFS_BACKEND};

/// Register all built-in backends.
pub fn register_builtin_backends(registry: &mut PinBackendRegistry) {
    registry.register(SIMULATION_BACKEND, simulation::create_bank);
    registry.register(SYSFS_BACKEND, sysfs::create_bank);
}
