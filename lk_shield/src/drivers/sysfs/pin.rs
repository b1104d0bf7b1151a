//! Sysfs line driver.

use lk_common::consts::SYSFS_BACKEND;
use lk_common::pin::{Direction, GpioPin, Level, PinBank, PinDriver, PinError, PinRef};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// One exported (or exportable) line.
#[derive(Debug)]
pub struct SysfsPin {
    pin: GpioPin,
    root: PathBuf,
    /// Serializes export and attribute access for this line.
    exported: Mutex<bool>,
}

impl SysfsPin {
    /// Line `pin` under the class directory `root`. Nothing is touched until first use.
    pub fn new(root: impl Into<PathBuf>, pin: GpioPin) -> Self {
        Self {
            pin,
            root: root.into(),
            exported: Mutex::new(false),
        }
    }

    /// `<root>/gpioN`.
    pub fn line_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin.0))
    }

    fn io_err(&self, op: &'static str) -> impl FnOnce(std::io::Error) -> PinError + '_ {
        move |source| PinError::Io {
            pin: self.pin,
            op,
            source,
        }
    }

    /// Run `f` on the line directory, exporting the line first if needed.
    fn with_line<R>(&self, f: impl FnOnce(&Path) -> Result<R, PinError>) -> Result<R, PinError> {
        let mut exported = self.exported.lock();
        let dir = self.line_dir();
        if !*exported {
            if !dir.exists() {
                debug!("exporting {}", self.pin);
                fs::write(self.root.join("export"), self.pin.0.to_string())
                    .map_err(self.io_err("export"))?;
            }
            *exported = true;
        }
        f(&dir)
    }

    fn read_attr(&self, dir: &Path, attr: &str, op: &'static str) -> Result<String, PinError> {
        let raw = fs::read_to_string(dir.join(attr)).map_err(self.io_err(op))?;
        Ok(raw.trim().to_string())
    }
}

impl PinDriver for SysfsPin {
    fn pin(&self) -> GpioPin {
        self.pin
    }

    fn set_direction(&self, direction: Direction) -> Result<(), PinError> {
        self.with_line(|dir| {
            trace!("{} direction={}", self.pin, direction);
            fs::write(dir.join("direction"), direction.as_str())
                .map_err(self.io_err("set direction"))
        })
    }

    fn direction(&self) -> Result<Direction, PinError> {
        self.with_line(|dir| {
            let raw = self.read_attr(dir, "direction", "get direction")?;
            raw.parse()
                .map_err(|_| PinError::InvalidValue { pin: self.pin, raw })
        })
    }

    fn set_value(&self, level: Level) -> Result<(), PinError> {
        self.with_line(|dir| {
            let raw = self.read_attr(dir, "direction", "get direction")?;
            let direction: Direction = raw
                .parse()
                .map_err(|_| PinError::InvalidValue { pin: self.pin, raw })?;
            if direction != Direction::Out {
                return Err(PinError::WrongDirection {
                    pin: self.pin,
                    direction,
                });
            }
            trace!("{} value={}", self.pin, level);
            fs::write(dir.join("value"), level.bit().to_string()).map_err(self.io_err("set value"))
        })
    }

    fn value(&self) -> Result<Level, PinError> {
        self.with_line(|dir| {
            let raw = self.read_attr(dir, "value", "get value")?;
            match raw.as_str() {
                "0" => Ok(Level::Low),
                "1" => Ok(Level::High),
                _ => Err(PinError::InvalidValue { pin: self.pin, raw }),
            }
        })
    }
}

/// Sysfs pin bank exposing a fixed set of lines.
#[derive(Debug)]
pub struct SysfsPinBank {
    root: PathBuf,
    pins: BTreeMap<GpioPin, Arc<SysfsPin>>,
}

impl SysfsPinBank {
    /// Bank over `lines` under the class directory `root`.
    pub fn new(root: impl Into<PathBuf>, lines: &[GpioPin]) -> Self {
        let root = root.into();
        let pins = lines
            .iter()
            .map(|&pin| (pin, Arc::new(SysfsPin::new(&root, pin))))
            .collect();
        Self { root, pins }
    }

    /// Class directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PinBank for SysfsPinBank {
    fn backend(&self) -> &'static str {
        SYSFS_BACKEND
    }

    fn pin(&self, id: GpioPin) -> Option<PinRef> {
        self.pins.get(&id).map(|p| Arc::clone(p) as PinRef)
    }

    fn pins(&self) -> Vec<GpioPin> {
        self.pins.keys().copied().collect()
    }
}
