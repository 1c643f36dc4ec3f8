//! UCI protocol errors.

use halberd_engine::EngineError;

/// Errors that can occur during UCI protocol handling.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// A `go` parameter was given without its value.
    #[error("missing value for go parameter {param}")]
    MissingGoValue {
        /// The parameter name.
        param: String,
    },

    /// A `go` parameter value is not a non-negative integer.
    #[error("invalid value for go parameter {param}: {value}")]
    InvalidGoValue {
        /// The parameter name.
        param: String,
        /// The rejected value.
        value: String,
    },

    /// `setoption` without a `name`.
    #[error("malformed setoption command: missing name")]
    MalformedSetOption,

    #[error("invalid perft depth: {value}")]
    InvalidPerftDepth { value: String },

    /// The engine refused the request.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Reading commands or writing replies failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
