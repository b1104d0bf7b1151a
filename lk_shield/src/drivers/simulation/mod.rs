//! Simulation backend.
//!
//! Software lines for development and testing without physical hardware.

mod pin;

pub use pin::{SimulatedPin, SimulatedPinBank};

use crate::error::ShieldError;
use lk_common::config::ShieldSection;
use lk_common::pin::{GpioPin, PinBank};
use std::sync::Arc;

/// Factory function to create a simulated pin bank.
pub fn create_bank(
    _config: &ShieldSection,
    lines: &[GpioPin],
) -> Result<Arc<dyn PinBank>, ShieldError> {
    Ok(Arc::new(SimulatedPinBank::new(lines.iter().copied())))
}
