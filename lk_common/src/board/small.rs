//! LK-RB-Small shield.
//!
//! ```text
//!       I2C
//!          UART
//! Analog      GPIO
//! ┌─┐┌─┐┌─┐┌─┐┌─┐
//! │ ││ ││ ││ ││ │
//! └─┘└─┘└─┘└─┘└─┘
//!       G  P  I  O
//!       ┌─┐┌─┐┌─┐
//!       │ ││ ││ │
//!       └─┘└─┘└─┘
//! ```

use super::{AnySocket, Board, BoardKind};
use crate::socket::{Position, SocketCatalog, SocketEntry, SocketKind, SocketSpec};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// LK-RB-Small board marker.
#[derive(Debug)]
pub enum RbSmall {}

/// Sockets of the LK-RB-Small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmallSocket {
    // row 1
    Analog01,
    Analog23,
    Uart,
    I2c,
    Digital1718,
    // row 2
    Digital2722,
    Digital2324,
    Digital2504,
}

use SmallSocket as S;

static SMALL_SOCKETS: [SocketEntry<SmallSocket>; 8] = [
    SocketEntry::analog(S::Analog01, "analog01", Position::new(1, 1), (0, 1)),
    SocketEntry::analog(S::Analog23, "analog23", Position::new(1, 2), (2, 3)),
    SocketEntry::bus(S::Uart, "uart", SocketKind::Uart, Position::new(1, 3)),
    SocketEntry::bus(S::I2c, "i2c", SocketKind::I2c, Position::new(1, 4)),
    SocketEntry::digital(S::Digital1718, "digital1718", Position::new(1, 5), (17, 18)),
    SocketEntry::digital(S::Digital2722, "digital2722", Position::new(2, 1), (27, 22)),
    SocketEntry::digital(S::Digital2324, "digital2324", Position::new(2, 2), (23, 24)),
    SocketEntry::digital(S::Digital2504, "digital2504", Position::new(2, 3), (25, 4)),
];

static SMALL_CATALOG: SocketCatalog<SmallSocket> =
    SocketCatalog::new("LK-RB-Small", &SMALL_SOCKETS);

impl SocketSpec for SmallSocket {
    const ALL: &'static [Self] = &[
        S::Analog01,
        S::Analog23,
        S::Uart,
        S::I2c,
        S::Digital1718,
        S::Digital2722,
        S::Digital2324,
        S::Digital2504,
    ];

    fn entry(self) -> &'static SocketEntry<Self> {
        &SMALL_SOCKETS[self as usize]
    }
}

impl fmt::Display for SmallSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SmallSocket {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown LK-RB-Small socket: {s:?}"))
    }
}

impl Board for RbSmall {
    type Socket = SmallSocket;
    const KIND: BoardKind = BoardKind::Small;

    fn catalog() -> &'static SocketCatalog<SmallSocket> {
        &SMALL_CATALOG
    }

    fn tag(socket: SmallSocket) -> AnySocket {
        AnySocket::Small(socket)
    }
}
