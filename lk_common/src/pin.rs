//! Pin capability contract.
//!
//! This module defines:
//! - `GpioPin` / `AdcChannel` - physical line identifiers
//! - `Direction` / `Level` - line configuration and value
//! - `PinDriver` trait - interface over a single GPIO line
//! - `PinBank` trait - the set of lines a backend exposes
//! - `SpiBus` - descriptor of an SPI bus used by the on-board ADC
//! - `PinError` enum - error types for pin operations

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

// ─── Identifiers ────────────────────────────────────────────────────

/// A GPIO line in BCM numbering (`P17` on the Raspberry Pi header is `GpioPin(17)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpioPin(pub u8);

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// An input channel of the shield's SPI ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdcChannel(pub u8);

impl fmt::Display for AdcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

// ─── Direction / Level ──────────────────────────────────────────────

/// Line direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Line is read.
    #[default]
    In,
    /// Line is driven.
    Out,
}

impl Direction {
    /// Keyword used by the sysfs `direction` attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" | "high" | "low" => Ok(Self::Out),
            _ => Err(format!("unknown Direction: {s:?}")),
        }
    }
}

/// Logic level of a line. `Low` is 0, `High` is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    /// Logic 0.
    #[default]
    Low = 0,
    /// Logic 1.
    High = 1,
}

impl Level {
    /// Numeric value (0 or 1).
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Whether the level is `High`.
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bit())
    }
}

// ─── SPI ────────────────────────────────────────────────────────────

/// SPI bus descriptor. The bus is only handed to accessories; this crate
/// performs no transfers on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpiBus {
    /// Position of the bus in the shield's bus list.
    pub index: usize,
    /// Device node, e.g. `/dev/spidev0.0`.
    pub device: PathBuf,
}

impl SpiBus {
    /// Build the bus list from device paths, numbering them in order.
    pub fn from_devices<I, P>(devices: I) -> Vec<SpiBus>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        devices
            .into_iter()
            .enumerate()
            .map(|(index, device)| SpiBus {
                index,
                device: device.into(),
            })
            .collect()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Error types for pin operations.
#[derive(Debug, Error)]
pub enum PinError {
    /// Backend I/O failed.
    #[error("{op} on {pin} failed: {source}")]
    Io {
        /// Affected line
        pin: GpioPin,
        /// Operation name (e.g. "export", "set direction")
        op: &'static str,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Backend returned something that is not a valid value.
    #[error("invalid value {raw:?} read from {pin}")]
    InvalidValue {
        /// Affected line
        pin: GpioPin,
        /// Raw text as read
        raw: String,
    },

    /// Attempt to drive a line configured as input.
    #[error("{pin} is configured as {direction}, cannot write")]
    WrongDirection {
        /// Affected line
        pin: GpioPin,
        /// Current direction
        direction: Direction,
    },
}

// ─── Traits ─────────────────────────────────────────────────────────

/// A single physical I/O line.
///
/// Methods take `&self`; backends synchronize internally so a handle can be
/// shared between the accessory that owns the socket and diagnostic readers.
pub trait PinDriver: Send + Sync {
    /// Line this driver controls.
    fn pin(&self) -> GpioPin;

    /// Configure the line direction.
    fn set_direction(&self, direction: Direction) -> Result<(), PinError>;

    /// Current line direction.
    fn direction(&self) -> Result<Direction, PinError>;

    /// Drive the line. Fails with `PinError::WrongDirection` on inputs.
    fn set_value(&self, level: Level) -> Result<(), PinError>;

    /// Sample the line.
    fn value(&self) -> Result<Level, PinError>;
}

/// Shared handle to a line.
pub type PinRef = Arc<dyn PinDriver>;

/// The set of lines provided by one backend.
pub trait PinBank: Send + Sync {
    /// Backend identifier (e.g. "sysfs", "simulation").
    fn backend(&self) -> &'static str;

    /// Resolve a line. `None` when the backend does not provide it.
    fn pin(&self, id: GpioPin) -> Option<PinRef>;

    /// All lines the backend provides, sorted.
    fn pins(&self) -> Vec<GpioPin>;
}
