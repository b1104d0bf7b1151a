//! Prelude module for common re-exports.
//!
//! ```rust
//! use lk_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, ShieldConfig};

// ─── Pins ───────────────────────────────────────────────────────────
pub use crate::pin::{
    AdcChannel, Direction, GpioPin, Level, PinBank, PinDriver, PinError, PinRef, SpiBus,
};

// ─── Sockets & boards ───────────────────────────────────────────────
pub use crate::board::{AnySocket, Arch, Board, BoardKind, Rb2, Rb2Socket, RbSmall, SmallSocket};
pub use crate::socket::{Position, SocketCatalog, SocketKind, SocketSpec};
