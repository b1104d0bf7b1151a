//! Simulated GPIO lines.
//!
//! Each `SimulatedPin` tracks:
//! - direction and level
//! - the number of writes, so tests can assert a line was left untouched
//!
//! Inputs can be driven from the outside with [`SimulatedPin::drive_input`].

use lk_common::board::Board;
use lk_common::consts::SIMULATION_BACKEND;
use lk_common::pin::{Direction, GpioPin, Level, PinBank, PinDriver, PinError, PinRef};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
struct LineState {
    direction: Direction,
    level: Level,
    writes: u64,
}

/// A single simulated line. Starts as an input reading low.
#[derive(Debug)]
pub struct SimulatedPin {
    pin: GpioPin,
    state: Mutex<LineState>,
}

impl SimulatedPin {
    /// New line, input, low.
    pub fn new(pin: GpioPin) -> Self {
        Self {
            pin,
            state: Mutex::new(LineState::default()),
        }
    }

    /// Set the level seen by readers, as external hardware would.
    pub fn drive_input(&self, level: Level) {
        self.state.lock().level = level;
    }

    /// Current level without going through `PinDriver`.
    pub fn level(&self) -> Level {
        self.state.lock().level
    }

    /// Current direction without going through `PinDriver`.
    pub fn current_direction(&self) -> Direction {
        self.state.lock().direction
    }

    /// Number of successful `set_value` calls.
    pub fn write_count(&self) -> u64 {
        self.state.lock().writes
    }
}

impl PinDriver for SimulatedPin {
    fn pin(&self) -> GpioPin {
        self.pin
    }

    fn set_direction(&self, direction: Direction) -> Result<(), PinError> {
        trace!("{} direction={}", self.pin, direction);
        self.state.lock().direction = direction;
        Ok(())
    }

    fn direction(&self) -> Result<Direction, PinError> {
        Ok(self.state.lock().direction)
    }

    fn set_value(&self, level: Level) -> Result<(), PinError> {
        let mut state = self.state.lock();
        if state.direction != Direction::Out {
            return Err(PinError::WrongDirection {
                pin: self.pin,
                direction: state.direction,
            });
        }
        trace!("{} value={}", self.pin, level);
        state.level = level;
        state.writes += 1;
        Ok(())
    }

    fn value(&self) -> Result<Level, PinError> {
        Ok(self.state.lock().level)
    }
}

/// In-memory pin bank.
#[derive(Debug, Default)]
pub struct SimulatedPinBank {
    pins: BTreeMap<GpioPin, Arc<SimulatedPin>>,
}

impl SimulatedPinBank {
    /// Bank providing exactly `lines`.
    pub fn new(lines: impl IntoIterator<Item = GpioPin>) -> Self {
        let pins = lines
            .into_iter()
            .map(|pin| (pin, Arc::new(SimulatedPin::new(pin))))
            .collect();
        Self { pins }
    }

    /// Bank providing every line a board's digital sockets use.
    pub fn for_board<B: Board>() -> Self {
        Self::new(B::catalog().gpio_lines())
    }

    /// Concrete handle to a simulated line.
    pub fn sim_pin(&self, pin: GpioPin) -> Option<Arc<SimulatedPin>> {
        self.pins.get(&pin).cloned()
    }

    /// Levels of all lines.
    pub fn levels(&self) -> BTreeMap<GpioPin, Level> {
        self.pins.iter().map(|(id, p)| (*id, p.level())).collect()
    }
}

impl PinBank for SimulatedPinBank {
    fn backend(&self) -> &'static str {
        SIMULATION_BACKEND
    }

    fn pin(&self, id: GpioPin) -> Option<PinRef> {
        self.pins.get(&id).map(|p| Arc::clone(p) as PinRef)
    }

    fn pins(&self) -> Vec<GpioPin> {
        self.pins.keys().copied().collect()
    }
}
