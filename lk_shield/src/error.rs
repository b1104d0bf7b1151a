//! Shield error types.

use lk_common::board::{Arch, BoardKind};
use lk_common::config::ConfigError;
use lk_common::pin::PinError;
use thiserror::Error;

/// Errors raised while constructing a shield or its pin backend.
///
/// Registry operations themselves never fail; see [`crate::registry`].
#[derive(Debug, Error)]
pub enum ShieldError {
    /// The running processor cannot drive a shield.
    #[error("unsupported architecture {0}: shields require {supported}", supported = Arch::SUPPORTED)]
    UnsupportedArch(Arch),

    /// The serial queue worker thread could not be started.
    #[error("failed to start serial queue: {0}")]
    QueueSpawn(#[from] std::io::Error),

    /// No pin backend registered under the requested name.
    #[error("pin backend not found: {0}")]
    BackendNotFound(String),

    /// Backend exists but cannot run on this host.
    #[error("pin backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Configuration names a different board than the one requested.
    #[error("configuration is for board '{configured}', expected '{expected}'")]
    BoardMismatch {
        /// Board type of the shield being built
        expected: BoardKind,
        /// Board named in the configuration
        configured: BoardKind,
    },

    /// Pin backend failure.
    #[error(transparent)]
    Pin(#[from] PinError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
