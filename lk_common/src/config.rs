//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for shield tools, plus the [`ShieldConfig`] describing which board is
//! attached and how its pins are reached.
//!
//! # Usage
//!
//! ```rust,no_run
//! use lk_common::config::{ConfigError, ConfigLoader, ShieldConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ShieldConfig::load(Path::new("shield.toml"))?;
//!     config.validate()?;
//!     println!("Board: {}", config.shield.board);
//!     Ok(())
//! }
//! ```

use crate::board::BoardKind;
use crate::consts::{DEFAULT_GPIO_ROOT, DEFAULT_SPI_DEVICES, SHIELD_SERVICE_NAME, SYSFS_BACKEND};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Equivalent `tracing` level.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "lk-shield-kitchen"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: SHIELD_SERVICE_NAME.to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_backend() -> String {
    SYSFS_BACKEND.to_string()
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from(DEFAULT_GPIO_ROOT)
}

fn default_spi_buses() -> Vec<PathBuf> {
    DEFAULT_SPI_DEVICES.iter().map(PathBuf::from).collect()
}

/// Board and pin backend selection (`[shield]` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShieldSection {
    /// Attached board variant.
    #[serde(default)]
    pub board: BoardKind,

    /// Pin backend name ("sysfs" or "simulation").
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root of the sysfs GPIO class directory.
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,

    /// SPI device nodes handed to analog accessories, in bus order.
    #[serde(default = "default_spi_buses")]
    pub spi_buses: Vec<PathBuf>,
}

impl Default for ShieldSection {
    fn default() -> Self {
        Self {
            board: BoardKind::default(),
            backend: default_backend(),
            gpio_root: default_gpio_root(),
            spi_buses: default_spi_buses(),
        }
    }
}

/// Configuration of a shield process, loaded from `shield.toml`.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "info"
/// service_name = "lk-shield"
///
/// [shield]
/// board = "small"
/// backend = "simulation"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShieldConfig {
    /// Common fields.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Board and backend selection.
    #[serde(default)]
    pub shield: ShieldSection,
}

impl ShieldConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` is not empty
    /// 2. `shield.backend` is not empty
    /// 3. No `shield.spi_buses` entry is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.shield.backend.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shield.backend cannot be empty".to_string(),
            ));
        }

        if let Some(idx) = self
            .shield
            .spi_buses
            .iter()
            .position(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::ValidationError(format!(
                "shield.spi_buses[{idx}] is empty"
            )));
        }

        Ok(())
    }

    /// Load and validate in one step.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for any type implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
