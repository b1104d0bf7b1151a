//! # LinkerKit Shield Binary
//!
//! Inspect a shield's socket catalog and verify that a shield can be brought
//! up with the configured pin backend.
//!
//! # Usage
//!
//! ```bash
//! # Print the socket layout of the configured board
//! lk_shield sockets
//!
//! # Same, for the small board, as JSON
//! lk_shield --board small sockets --json
//!
//! # Bring up the shield with the simulation backend and report
//! lk_shield --simulate check -v
//!
//! # Explicit configuration file
//! lk_shield --config /etc/linkerkit/shield.toml check
//! ```

use clap::{Parser, Subcommand};
use lk_common::board::{Arch, Board, BoardKind, Rb2, RbSmall};
use lk_common::config::{ConfigError, ConfigLoader, ShieldConfig};
use lk_common::consts::{DEFAULT_CONFIG_PATH, SIMULATION_BACKEND};
use lk_common::pin::{AdcChannel, GpioPin};
use lk_common::socket::{Position, SocketKind, SocketSpec};
use lk_shield::{PinBackendRegistry, Shield, ShieldBoard, ShieldError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// LinkerKit shield - socket registry and accessory lifecycle
#[derive(Parser, Debug)]
#[command(name = "lk_shield")]
#[command(version)]
#[command(about = "Socket registry and accessory lifecycle for LinkerKit shields")]
#[command(long_about = None)]
struct Args {
    /// Path to shield configuration (shield.toml).
    /// Defaults to /etc/linkerkit/shield.toml when present.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Board variant, overriding the configuration
    #[arg(short, long)]
    board: Option<BoardKind>,

    /// Force the simulation pin backend
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board's socket catalog
    Sockets {
        /// Emit the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bring up the shield, report its wiring and tear it down
    Check,
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            if let Some(ShieldError::UnsupportedArch(arch)) = e.downcast_ref::<ShieldError>() {
                eprintln!(
                    "LinkerKit shields require an {} processor; this host is {}",
                    Arch::SUPPORTED,
                    arch
                );
            } else {
                error!("lk_shield failed: {}", e);
            }
            std::process::exit(1);
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging is not up yet; report configuration errors directly.
    let mut config = load_config(args.config.as_deref()).inspect_err(|e| eprintln!("{e}"))?;
    if let Some(board) = args.board {
        config.shield.board = board;
    }
    if args.simulate {
        config.shield.backend = SIMULATION_BACKEND.to_string();
    }

    setup_tracing(&args, &config);

    match args.command {
        Command::Sockets { json } => match config.shield.board {
            BoardKind::Rb2 => print_sockets::<Rb2>(json)?,
            BoardKind::Small => print_sockets::<RbSmall>(json)?,
        },
        Command::Check => {
            ctrlc::set_handler(|| {
                info!("Received shutdown signal");
                lk_shield::exit::run_exit_hooks();
                std::process::exit(130);
            })?;

            info!(
                "{} v{} checking {}",
                config.shared.service_name,
                env!("CARGO_PKG_VERSION"),
                config.shield.board.product_name()
            );
            match config.shield.board {
                BoardKind::Rb2 => check::<Rb2>(&config)?,
                BoardKind::Small => check::<RbSmall>(&config)?,
            }
        }
    }
    Ok(())
}

/// Load the explicit configuration, or the default one when present.
fn load_config(path: Option<&Path>) -> Result<ShieldConfig, ConfigError> {
    match path {
        Some(path) => ShieldConfig::load_validated(path),
        None => match ShieldConfig::load_validated(Path::new(DEFAULT_CONFIG_PATH)) {
            Err(ConfigError::FileNotFound) => Ok(ShieldConfig::default()),
            other => other,
        },
    }
}

/// One catalog row.
#[derive(Debug, Serialize)]
struct SocketRow {
    name: &'static str,
    kind: SocketKind,
    position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pins: Option<(GpioPin, GpioPin)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<(AdcChannel, AdcChannel)>,
}

fn socket_rows<B: Board>() -> Vec<SocketRow> {
    B::catalog()
        .sockets()
        .map(|socket| SocketRow {
            name: socket.name(),
            kind: socket.kind(),
            position: socket.position(),
            pins: socket.pins(),
            channels: socket.analog_channels(),
        })
        .collect()
}

fn print_sockets<B: Board>(json: bool) -> Result<(), serde_json::Error> {
    let rows = socket_rows::<B>();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", B::catalog().board());
    for row in rows {
        let wiring = match (row.pins, row.channels) {
            (Some((a, b)), _) => format!("{a} {b}"),
            (_, Some((a, b))) => format!("{a} {b}"),
            _ => String::new(),
        };
        println!(
            "  {:<12} {:<8} {:<6} {}",
            row.name,
            row.kind.to_string(),
            row.position.to_string(),
            wiring
        );
    }
    Ok(())
}

fn check<B: ShieldBoard>(config: &ShieldConfig) -> Result<(), ShieldError> {
    let backends = PinBackendRegistry::builtin();
    info!("Available pin backends: {:?}", backends.list_backends());

    let shield = Shield::<B>::from_config(&config.shield, &backends)?;
    let port = shield.port();

    println!("{} {}", shield.catalog().board(), shield.id());
    println!("  backend    {}", port.pin_bank().backend());
    println!("  gpio lines {}", port.pin_bank().pins().len());
    for bus in port.spi_buses() {
        println!("  spi{}       {}", bus.index, bus.device.display());
    }
    println!("  occupied   {}", shield.accessories().len());

    let torn_down = shield.teardown_on_exit();
    info!("Check complete ({} accessories torn down)", torn_down);
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configuration.
fn setup_tracing(args: &Args, config: &ShieldConfig) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.shared.log_level.as_tracing()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
