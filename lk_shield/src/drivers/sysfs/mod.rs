//! Linux sysfs GPIO backend.
//!
//! Lines live under a class directory (normally `/sys/class/gpio`). A line
//! is exported on first use by writing its number to `<root>/export`; its
//! `direction` and `value` attributes are then plain text files.

mod pin;

pub use pin::{SysfsPin, SysfsPinBank};

use crate::error::ShieldError;
use lk_common::config::ShieldSection;
use lk_common::pin::{GpioPin, PinBank};
use std::sync::Arc;
use tracing::info;

/// Factory function to create a sysfs pin bank rooted at `config.gpio_root`.
pub fn create_bank(
    config: &ShieldSection,
    lines: &[GpioPin],
) -> Result<Arc<dyn PinBank>, ShieldError> {
    if !config.gpio_root.is_dir() {
        return Err(ShieldError::BackendUnavailable(format!(
            "GPIO class directory {} does not exist",
            config.gpio_root.display()
        )));
    }
    info!(
        "sysfs backend at {} ({} lines)",
        config.gpio_root.display(),
        lines.len()
    );
    Ok(Arc::new(SysfsPinBank::new(&config.gpio_root, lines)))
}
