//! Shield constants.

/// Canonical service name (used for logging and queue thread names).
pub const SHIELD_SERVICE_NAME: &str = "lk-shield";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/linkerkit/shield.toml";

/// Linux sysfs GPIO class directory
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// SPI device nodes of the Raspberry Pi 3/4 hardware SPI0 bus
pub const DEFAULT_SPI_DEVICES: [&str; 2] = ["/dev/spidev0.0", "/dev/spidev0.1"];

/// Pin backend driving real hardware
pub const SYSFS_BACKEND: &str = "sysfs";

/// In-memory pin backend
pub const SIMULATION_BACKEND: &str = "simulation";

/// Prefix of serial queue thread names; the shield id is appended
pub const QUEUE_LABEL_PREFIX: &str = "lk.shield.q";
