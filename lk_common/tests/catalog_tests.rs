//! Catalog consistency across both board variants, and shield configuration
//! files as deployed.

use lk_common::board::{Board, BoardKind, Rb2, Rb2Socket, RbSmall, SmallSocket};
use lk_common::config::{ConfigError, ConfigLoader, ShieldConfig};
use lk_common::pin::{AdcChannel, GpioPin};
use lk_common::socket::{SocketKind, SocketSpec};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

/// Properties every board's wiring table must satisfy.
fn check_catalog<B: Board>() {
    let catalog = B::catalog();
    let sockets: Vec<B::Socket> = catalog.sockets().collect();
    assert_eq!(sockets, B::Socket::ALL.to_vec(), "{}", catalog.board());

    let mut names = HashSet::new();
    let mut positions = HashSet::new();
    for socket in sockets {
        assert!(names.insert(socket.name()), "duplicate name {socket}");
        assert!(positions.insert(socket.position()), "duplicate position {socket}");

        // Display, FromStr and from_name agree.
        assert_eq!(socket.to_string(), socket.name());
        assert_eq!(B::Socket::from_name(socket.name()), Some(socket));

        let pos = socket.position();
        assert_eq!(B::Socket::from_position(pos.row, pos.column), Some(socket));
        assert_eq!(catalog.socket_at(pos.row, pos.column), Some(socket));

        // Exactly one of pins/channels for digital/analog, neither for buses.
        match socket.kind() {
            SocketKind::Digital => {
                assert!(socket.is_digital() && !socket.is_analog());
                assert!(socket.pins().is_some());
                assert!(socket.analog_channels().is_none());
            }
            SocketKind::Analog => {
                assert!(socket.is_analog() && !socket.is_digital());
                assert!(socket.pins().is_none());
                assert!(socket.analog_channels().is_some());
            }
            SocketKind::Uart | SocketKind::I2c => {
                assert!(socket.pins().is_none());
                assert!(socket.analog_channels().is_none());
            }
        }
        assert_eq!(catalog.pins(socket), socket.pins());
        assert_eq!(catalog.analog_channels(socket), socket.analog_channels());
    }

    assert_eq!(B::Socket::from_position(0, 0), None);
    assert_eq!(B::Socket::from_position(9, 1), None);
    assert_eq!(B::Socket::from_name("nope"), None);

    let lines = catalog.gpio_lines();
    assert!(lines.windows(2).all(|w| w[0] < w[1]));
    for socket in catalog.digital() {
        let (a, b) = socket.pins().unwrap();
        assert!(lines.contains(&a) && lines.contains(&b));
    }
}

#[test]
fn test_rb2_catalog_consistent() {
    check_catalog::<Rb2>();
    assert_eq!(Rb2::catalog().digital().count(), 12);
    assert_eq!(Rb2Socket::ALL.len(), 18);
}

#[test]
fn test_small_catalog_consistent() {
    check_catalog::<RbSmall>();
    assert_eq!(RbSmall::catalog().digital().count(), 4);
}

#[test]
fn test_rb2_analog_channels_cover_adc() {
    let channels: Vec<u8> = Rb2Socket::ALL
        .iter()
        .filter_map(|s| s.analog_channels())
        .flat_map(|(a, b)| [a.0, b.0])
        .collect();
    assert_eq!(channels, (0..8).collect::<Vec<_>>());
}

#[test]
fn test_shared_socket_names_wire_identically() {
    for name in ["digital1718", "digital2324", "analog01", "analog23", "uart", "i2c"] {
        let rb2 = Rb2Socket::from_name(name).unwrap();
        let small = SmallSocket::from_name(name).unwrap();
        assert_eq!(rb2.kind(), small.kind(), "{name}");
        assert_eq!(rb2.pins(), small.pins(), "{name}");
        assert_eq!(rb2.analog_channels(), small.analog_channels(), "{name}");
    }
}

#[test]
fn test_lookup_miss_is_empty() {
    assert_eq!(Rb2Socket::Uart.pins(), None);
    assert_eq!(SmallSocket::I2c.analog_channels(), None);
    assert_eq!(
        SmallSocket::Analog23.analog_channels(),
        Some((AdcChannel(2), AdcChannel(3)))
    );
    assert_eq!(
        SmallSocket::Digital2722.pins(),
        Some((GpioPin(27), GpioPin(22)))
    );
}

#[derive(Debug, Deserialize)]
struct Wiring {
    socket: Rb2Socket,
    spare: SmallSocket,
}

#[test]
fn test_socket_names_in_toml() {
    let wiring: Wiring = toml::from_str("socket = \"digital2021\"\nspare = \"digital2504\"\n").unwrap();
    assert_eq!(wiring.socket, Rb2Socket::Digital2021);
    assert_eq!(wiring.spare, SmallSocket::Digital2504);

    assert!(toml::from_str::<Wiring>("socket = \"Digital2021\"\nspare = \"uart\"\n").is_err());
}

#[test]
fn test_deployed_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shield.toml");
    fs::write(
        &path,
        r#"
[shared]
log_level = "debug"
service_name = "lk-shield-bench"

[shield]
board = "small"
backend = "simulation"
spi_buses = ["/dev/spidev0.0"]
"#,
    )
    .unwrap();

    let config = ShieldConfig::load_validated(&path).unwrap();
    assert_eq!(config.shield.board, BoardKind::Small);
    assert_eq!(config.shield.backend, "simulation");
    assert_eq!(config.shield.spi_buses.len(), 1);
    assert_eq!(config.shield.gpio_root.to_str(), Some("/sys/class/gpio"));
}

#[test]
fn test_config_rejects_empty_spi_entry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shield.toml");
    fs::write(&path, "[shield]\nspi_buses = [\"\"]\n").unwrap();

    assert!(ShieldConfig::load(&path).is_ok());
    assert!(matches!(
        ShieldConfig::load_validated(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_config_unknown_board() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shield.toml");
    fs::write(&path, "[shield]\nboard = \"rb3\"\n").unwrap();
    assert!(matches!(
        ShieldConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}
