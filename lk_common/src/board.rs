//! Board variants.
//!
//! Each supported shield has an uninhabited marker type implementing
//! [`Board`], a socket enum and a static wiring table:
//!
//! - [`rb2`] - LK-Base-RB2 (primary)
//! - [`small`] - LK-RB-Small (alternate)
//!
//! [`Arch`] is the processor check gating shield construction.

pub mod rb2;
pub mod small;

pub use rb2::{Rb2, Rb2Socket};
pub use small::{RbSmall, SmallSocket};

use crate::socket::{SocketCatalog, SocketKind, SocketSpec};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

// ─── Board ──────────────────────────────────────────────────────────

/// A shield variant: its socket type and wiring table.
pub trait Board: Send + Sync + 'static {
    /// Socket enum of this board.
    type Socket: SocketSpec;

    /// Runtime discriminator.
    const KIND: BoardKind;

    /// Static wiring table.
    fn catalog() -> &'static SocketCatalog<Self::Socket>;

    /// Tag a socket with this board.
    fn tag(socket: Self::Socket) -> AnySocket;
}

/// Board discriminator, used in configuration and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    /// LK-Base-RB2.
    #[default]
    Rb2,
    /// LK-RB-Small.
    Small,
}

impl BoardKind {
    /// Product name.
    pub fn product_name(self) -> &'static str {
        match self {
            Self::Rb2 => Rb2::catalog().board(),
            Self::Small => RbSmall::catalog().board(),
        }
    }
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rb2 => write!(f, "rb2"),
            Self::Small => write!(f, "small"),
        }
    }
}

impl FromStr for BoardKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rb2" => Ok(Self::Rb2),
            "small" => Ok(Self::Small),
            _ => Err(format!("unknown board: {s:?}, expected \"rb2\" or \"small\"")),
        }
    }
}

// ─── AnySocket ──────────────────────────────────────────────────────

/// A socket tagged with its board, for board-independent code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "board", content = "socket", rename_all = "lowercase")]
pub enum AnySocket {
    /// LK-Base-RB2 socket.
    Rb2(Rb2Socket),
    /// LK-RB-Small socket.
    Small(SmallSocket),
}

impl AnySocket {
    /// Board the socket belongs to.
    pub fn board(self) -> BoardKind {
        match self {
            Self::Rb2(_) => BoardKind::Rb2,
            Self::Small(_) => BoardKind::Small,
        }
    }

    /// Stable socket name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rb2(s) => s.name(),
            Self::Small(s) => s.name(),
        }
    }

    /// Socket type.
    pub fn kind(self) -> SocketKind {
        match self {
            Self::Rb2(s) => s.kind(),
            Self::Small(s) => s.kind(),
        }
    }
}

impl fmt::Display for AnySocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Arch ───────────────────────────────────────────────────────────

/// Processor architecture, checked before a shield is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit ARM (Raspberry Pi 3/4 with a 64-bit OS).
    Aarch64,
    /// 32-bit ARM.
    Arm,
    /// x86-64.
    X86_64,
    /// Anything else.
    Other,
}

impl Arch {
    /// The only architecture shields can be driven from.
    pub const SUPPORTED: Arch = Arch::Aarch64;

    /// Architecture of the running process.
    pub const fn host() -> Self {
        if cfg!(target_arch = "aarch64") {
            Self::Aarch64
        } else if cfg!(target_arch = "arm") {
            Self::Arm
        } else if cfg!(target_arch = "x86_64") {
            Self::X86_64
        } else {
            Self::Other
        }
    }

    /// Whether a shield can be constructed on this architecture.
    pub const fn supports_shield(self) -> bool {
        matches!(self, Self::Aarch64)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aarch64 => write!(f, "aarch64"),
            Self::Arm => write!(f, "arm"),
            Self::X86_64 => write!(f, "x86_64"),
            Self::Other => write!(f, "unknown"),
        }
    }
}
