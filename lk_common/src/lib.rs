//! LinkerKit Common Library
//!
//! Shared types for driving LinkerKit accessory shields on a Raspberry Pi.
//!
//! # Module Structure
//!
//! - [`pin`] - Pin capability contract (`PinDriver`, `PinBank`) and identifiers
//! - [`socket`] - Socket kinds, positions and the static socket catalog
//! - [`board`] - Board variants (LK-Base-RB2, LK-RB-Small) and the architecture check
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Shared constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use lk_common::prelude::*;
//!
//! let socket: Rb2Socket = "digital1718".parse().unwrap();
//! assert_eq!(socket.pins(), Some((GpioPin(17), GpioPin(18))));
//! ```

pub mod board;
pub mod config;
pub mod consts;
pub mod pin;
pub mod prelude;
pub mod socket;
