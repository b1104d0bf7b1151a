//! Socket catalog types.
//!
//! A shield exposes a fixed set of named sockets. Each board variant
//! describes its sockets in a static table of [`SocketEntry`] rows; the
//! socket enums and [`SocketCatalog`] are thin lookups over that table.
//! Lookups for the wrong socket kind return `None`.

use crate::pin::{AdcChannel, GpioPin};
use core::fmt;
use core::hash::Hash;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

// ─── SocketKind ─────────────────────────────────────────────────────

/// Socket type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketKind {
    /// Two GPIO lines.
    Digital,
    /// Two channels of the on-board SPI ADC.
    Analog,
    /// Serial port.
    Uart,
    /// I2C bus.
    I2c,
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital => write!(f, "digital"),
            Self::Analog => write!(f, "analog"),
            Self::Uart => write!(f, "uart"),
            Self::I2c => write!(f, "i2c"),
        }
    }
}

// ─── Position ───────────────────────────────────────────────────────

/// Physical position of a socket on the board, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row, counted from the edge nearest the Pi header.
    pub row: u8,
    /// Column, counted from the left.
    pub column: u8,
}

impl Position {
    /// Build a position.
    pub const fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.row, self.column)
    }
}

// ─── SocketEntry ────────────────────────────────────────────────────

/// One row of a board's wiring table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketEntry<S: 'static> {
    /// Socket this row describes.
    pub socket: S,
    /// Stable socket name, part of the public wiring contract.
    pub name: &'static str,
    /// Socket type.
    pub kind: SocketKind,
    /// Board position.
    pub position: Position,
    /// GPIO pair. Only set for digital sockets.
    pub pins: Option<(GpioPin, GpioPin)>,
    /// ADC channel pair. Only set for analog sockets.
    pub channels: Option<(AdcChannel, AdcChannel)>,
}

impl<S> SocketEntry<S> {
    /// Digital socket row.
    pub const fn digital(socket: S, name: &'static str, position: Position, pins: (u8, u8)) -> Self {
        Self {
            socket,
            name,
            kind: SocketKind::Digital,
            position,
            pins: Some((GpioPin(pins.0), GpioPin(pins.1))),
            channels: None,
        }
    }

    /// Analog socket row.
    pub const fn analog(
        socket: S,
        name: &'static str,
        position: Position,
        channels: (u8, u8),
    ) -> Self {
        Self {
            socket,
            name,
            kind: SocketKind::Analog,
            position,
            pins: None,
            channels: Some((AdcChannel(channels.0), AdcChannel(channels.1))),
        }
    }

    /// Bus socket row (UART or I2C).
    pub const fn bus(socket: S, name: &'static str, kind: SocketKind, position: Position) -> Self {
        Self {
            socket,
            name,
            kind,
            position,
            pins: None,
            channels: None,
        }
    }
}

// ─── SocketSpec ─────────────────────────────────────────────────────

/// Behaviour shared by every board's socket enum.
///
/// All derived properties come from the board's static table, so
/// implementors only provide [`SocketSpec::ALL`] and [`SocketSpec::entry`].
pub trait SocketSpec:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + FromStr + Send + Sync + 'static
{
    /// Every socket of the board, in table order.
    const ALL: &'static [Self];

    /// Wiring table row for this socket.
    fn entry(self) -> &'static SocketEntry<Self>;

    /// Stable socket name.
    fn name(self) -> &'static str {
        self.entry().name
    }

    /// Socket type.
    fn kind(self) -> SocketKind {
        self.entry().kind
    }

    /// Whether the socket carries two GPIO lines.
    fn is_digital(self) -> bool {
        self.kind() == SocketKind::Digital
    }

    /// Whether the socket carries two ADC channels.
    fn is_analog(self) -> bool {
        self.kind() == SocketKind::Analog
    }

    /// Board position.
    fn position(self) -> Position {
        self.entry().position
    }

    /// GPIO pair, `None` unless digital.
    fn pins(self) -> Option<(GpioPin, GpioPin)> {
        self.entry().pins
    }

    /// ADC channel pair, `None` unless analog.
    fn analog_channels(self) -> Option<(AdcChannel, AdcChannel)> {
        self.entry().channels
    }

    /// Socket at a board position, `None` if no socket sits there.
    fn from_position(row: u8, column: u8) -> Option<Self> {
        let wanted = Position::new(row, column);
        Self::ALL.iter().copied().find(|s| s.position() == wanted)
    }

    /// Socket with the given stable name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

// ─── SocketCatalog ──────────────────────────────────────────────────

/// Immutable wiring table of one board variant.
#[derive(Debug)]
pub struct SocketCatalog<S: 'static> {
    board: &'static str,
    entries: &'static [SocketEntry<S>],
}

impl<S: SocketSpec> SocketCatalog<S> {
    /// Wrap a static wiring table.
    pub const fn new(board: &'static str, entries: &'static [SocketEntry<S>]) -> Self {
        Self { board, entries }
    }

    /// Board name, e.g. "LK-Base-RB2".
    pub fn board(&self) -> &'static str {
        self.board
    }

    /// All rows in table order.
    pub fn entries(&self) -> &'static [SocketEntry<S>] {
        self.entries
    }

    /// Row for a socket.
    pub fn entry(&self, socket: S) -> Option<&'static SocketEntry<S>> {
        self.entries.iter().find(|e| e.socket == socket)
    }

    /// GPIO pair of a digital socket.
    pub fn pins(&self, socket: S) -> Option<(GpioPin, GpioPin)> {
        self.entry(socket).and_then(|e| e.pins)
    }

    /// ADC channel pair of an analog socket.
    pub fn analog_channels(&self, socket: S) -> Option<(AdcChannel, AdcChannel)> {
        self.entry(socket).and_then(|e| e.channels)
    }

    /// Socket at a board position.
    pub fn socket_at(&self, row: u8, column: u8) -> Option<S> {
        let wanted = Position::new(row, column);
        self.entries
            .iter()
            .find(|e| e.position == wanted)
            .map(|e| e.socket)
    }

    /// All sockets in table order.
    pub fn sockets(&self) -> impl Iterator<Item = S> + '_ {
        self.entries.iter().map(|e| e.socket)
    }

    /// Digital sockets in table order.
    pub fn digital(&self) -> impl Iterator<Item = S> + '_ {
        self.entries
            .iter()
            .filter(|e| e.kind == SocketKind::Digital)
            .map(|e| e.socket)
    }

    /// Every GPIO line referenced by the table, sorted and deduplicated.
    pub fn gpio_lines(&self) -> Vec<GpioPin> {
        let mut lines: Vec<GpioPin> = self
            .entries
            .iter()
            .filter_map(|e| e.pins)
            .flat_map(|(a, b)| [a, b])
            .collect();
        lines.sort();
        lines.dedup();
        lines
    }
}
