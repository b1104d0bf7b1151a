//! LK-Base-RB2 shield.
//!
//! Sockets:
//! - UART
//! - I2C
//! - 12 digital sockets
//! -  4 analog sockets (SPI ADC on board)
//!
//! ```text
//!  Analog            UART  I2C
//! ┌─┐┌─┐┌─┐┌─┐      ┌─┐  ┌─┐
//! │ ││ ││ ││ │      │ │  │ │
//! └─┘└─┘└─┘└─┘      └─┘  └─┘
//!  Digital
//! ┌─┐┌─┐┌─┐┌─┐┌─┐┌─┐
//! │ ││ ││ ││ ││ ││ │
//! └─┘└─┘└─┘└─┘└─┘└─┘
//! ┌─┐┌─┐┌─┐┌─┐┌─┐┌─┐
//! │ ││ ││ ││ ││ ││ │
//! └─┘└─┘└─┘└─┘└─┘└─┘
//! ```
//!
//! Neighbouring digital sockets share a GPIO line where the header runs
//! short of free pins; only one of them can drive that line at a time.

use super::{AnySocket, Board, BoardKind};
use crate::socket::{Position, SocketCatalog, SocketEntry, SocketKind, SocketSpec};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// LK-Base-RB2 board marker.
#[derive(Debug)]
pub enum Rb2 {}

/// Sockets of the LK-Base-RB2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rb2Socket {
    // row 1
    Analog01,
    Analog23,
    Analog45,
    Analog67,
    Uart,
    I2c,
    // row 2
    Digital45,
    Digital56,
    Digital1213,
    Digital1316,
    Digital1617,
    Digital1718,
    // row 3
    Digital1920,
    Digital2021,
    Digital2122,
    Digital2223,
    Digital2324,
    Digital2627,
}

use Rb2Socket as S;

/// Wiring table, in `Rb2Socket` declaration order.
static RB2_SOCKETS: [SocketEntry<Rb2Socket>; 18] = [
    SocketEntry::analog(S::Analog01, "analog01", Position::new(1, 1), (0, 1)),
    SocketEntry::analog(S::Analog23, "analog23", Position::new(1, 2), (2, 3)),
    SocketEntry::analog(S::Analog45, "analog45", Position::new(1, 3), (4, 5)),
    SocketEntry::analog(S::Analog67, "analog67", Position::new(1, 4), (6, 7)),
    SocketEntry::bus(S::Uart, "uart", SocketKind::Uart, Position::new(1, 5)),
    SocketEntry::bus(S::I2c, "i2c", SocketKind::I2c, Position::new(1, 6)),
    SocketEntry::digital(S::Digital45, "digital45", Position::new(2, 1), (4, 5)),
    SocketEntry::digital(S::Digital56, "digital56", Position::new(2, 2), (5, 6)),
    SocketEntry::digital(S::Digital1213, "digital1213", Position::new(2, 3), (12, 13)),
    SocketEntry::digital(S::Digital1316, "digital1316", Position::new(2, 4), (13, 16)),
    SocketEntry::digital(S::Digital1617, "digital1617", Position::new(2, 5), (16, 17)),
    SocketEntry::digital(S::Digital1718, "digital1718", Position::new(2, 6), (17, 18)),
    SocketEntry::digital(S::Digital1920, "digital1920", Position::new(3, 1), (19, 20)),
    SocketEntry::digital(S::Digital2021, "digital2021", Position::new(3, 2), (20, 21)),
    SocketEntry::digital(S::Digital2122, "digital2122", Position::new(3, 3), (21, 22)),
    SocketEntry::digital(S::Digital2223, "digital2223", Position::new(3, 4), (22, 23)),
    SocketEntry::digital(S::Digital2324, "digital2324", Position::new(3, 5), (23, 24)),
    SocketEntry::digital(S::Digital2627, "digital2627", Position::new(3, 6), (26, 27)),
];

static RB2_CATALOG: SocketCatalog<Rb2Socket> = SocketCatalog::new("LK-Base-RB2", &RB2_SOCKETS);

impl SocketSpec for Rb2Socket {
    const ALL: &'static [Self] = &[
        S::Analog01,
        S::Analog23,
        S::Analog45,
        S::Analog67,
        S::Uart,
        S::I2c,
        S::Digital45,
        S::Digital56,
        S::Digital1213,
        S::Digital1316,
        S::Digital1617,
        S::Digital1718,
        S::Digital1920,
        S::Digital2021,
        S::Digital2122,
        S::Digital2223,
        S::Digital2324,
        S::Digital2627,
    ];

    fn entry(self) -> &'static SocketEntry<Self> {
        &RB2_SOCKETS[self as usize]
    }
}

impl fmt::Display for Rb2Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rb2Socket {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown LK-Base-RB2 socket: {s:?}"))
    }
}

impl Board for Rb2 {
    type Socket = Rb2Socket;
    const KIND: BoardKind = BoardKind::Rb2;

    fn catalog() -> &'static SocketCatalog<Rb2Socket> {
        &RB2_CATALOG
    }

    fn tag(socket: Rb2Socket) -> AnySocket {
        AnySocket::Rb2(socket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{AdcChannel, GpioPin};

    #[test]
    fn test_table_order_matches_enum() {
        for (idx, socket) in Rb2Socket::ALL.iter().enumerate() {
            assert_eq!(RB2_SOCKETS[idx].socket, *socket);
            assert_eq!(socket.entry().socket, *socket);
        }
    }

    #[test]
    fn test_positions_unique() {
        let mut seen = std::collections::HashSet::new();
        for socket in Rb2Socket::ALL {
            assert!(seen.insert(socket.position()), "duplicate position for {socket}");
        }
    }

    #[test]
    fn test_digital_pins() {
        assert_eq!(
            Rb2Socket::Digital1718.pins(),
            Some((GpioPin(17), GpioPin(18)))
        );
        assert_eq!(
            Rb2Socket::Digital2324.pins(),
            Some((GpioPin(23), GpioPin(24)))
        );
        assert!(Rb2Socket::Digital2122.is_digital());
        assert!(!Rb2Socket::Digital2122.is_analog());
    }

    #[test]
    fn test_analog_channels() {
        assert_eq!(
            Rb2Socket::Analog67.analog_channels(),
            Some((AdcChannel(6), AdcChannel(7)))
        );
        assert_eq!(Rb2Socket::Analog67.pins(), None);
        assert_eq!(Rb2Socket::Digital45.analog_channels(), None);
    }

    #[test]
    fn test_bus_sockets_have_no_lines() {
        for socket in [Rb2Socket::Uart, Rb2Socket::I2c] {
            assert_eq!(socket.pins(), None);
            assert_eq!(socket.analog_channels(), None);
            assert!(!socket.is_digital());
            assert!(!socket.is_analog());
        }
    }

    #[test]
    fn test_from_position() {
        assert_eq!(Rb2Socket::from_position(3, 5), Some(Rb2Socket::Digital2324));
        assert_eq!(Rb2Socket::from_position(1, 5), Some(Rb2Socket::Uart));
        assert_eq!(Rb2Socket::from_position(4, 1), None);
    }

    #[test]
    fn test_name_round_trip() {
        for socket in Rb2Socket::ALL {
            assert_eq!(socket.to_string().parse::<Rb2Socket>().unwrap(), *socket);
        }
        assert!("digital9999".parse::<Rb2Socket>().is_err());
    }
}
