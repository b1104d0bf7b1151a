//! # LinkerKit Shield Library
//!
//! Socket registry and accessory lifecycle for LinkerKit Raspberry Pi
//! expansion shields.
//!
//! A [`Shield`] tracks which accessory occupies which socket, keeps every
//! socket exclusive, and notifies accessories as they are plugged in,
//! hot-swapped, evicted or unplugged. All registry work runs on one serial
//! queue per shield, so accessories never see concurrent notifications.
//!
//! # Module Structure
//!
//! - [`accessory`] - `Accessory` trait, `AccessoryHandle`, `AccessoryBase`
//! - [`registry`] - Socket occupancy state machine
//! - [`queue`] - Serial task queue owning the registry
//! - [`shield`] - Shield facade, `ShieldPort`, per-board default shields
//! - [`exit`] - Process-exit teardown hook
//! - [`backend_registry`] - Pin backend factory registration
//! - [`drivers`] - Pin backend implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       lk_shield (single crate)                   │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │  Accessory  │◄───│   Shield     │◄──►│  Backend Registry   │  │
//! │  │ (callbacks) │    │  (facade)    │    │                     │  │
//! │  └─────────────┘    └──────┬───────┘    └──────────┬──────────┘  │
//! │         ▲                  │ dispatch              │             │
//! │         │                  ▼                       ▼             │
//! │         │          ┌────────────────┐     ┌────────────────┐     │
//! │         └──────────│ SerialQueue    │     │  PinBank       │     │
//! │          notify    │  └─ Registry   │     │ (trait object) │     │
//! │                    └────────────────┘     └────────────────┘     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod accessory;
pub mod backend_registry;
pub mod drivers;
pub mod error;
pub mod exit;
pub mod queue;
pub mod registry;
pub mod shield;

// Re-export key types for convenience
pub use crate::accessory::{Accessory, AccessoryBase, AccessoryHandle, Plug};
pub use crate::backend_registry::{PinBackendRegistry, PinBankFactory};
pub use crate::error::ShieldError;
pub use crate::registry::{Registry, Snapshot};
pub use crate::shield::{AnalogInfo, Shield, ShieldBoard, ShieldId, ShieldPort};
