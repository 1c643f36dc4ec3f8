//! Errors surfaced by the [`Engine`](crate::Engine) facade.

use halberd_core::{FenError, MoveParseError};

/// Errors returned by engine configuration and position setup.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The FEN given to `set_position` was rejected.
    #[error("invalid position: {0}")]
    Fen(#[from] FenError),

    /// A move given to `make_moves` could not be played.
    #[error("invalid move: {0}")]
    Move(#[from] MoveParseError),

    /// `set_option` was called with a name the engine does not know.
    #[error("unknown option: {name}")]
    UnknownOption {
        /// The option name as received.
        name: String,
    },

    /// The option exists but the value could not be parsed.
    #[error("invalid value for option {name}: {value}")]
    InvalidOptionValue {
        /// The option name.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// A search thread could not be started.
    #[error("failed to spawn search thread: {0}")]
    Spawn(#[from] std::io::Error),
}
