//! UCI protocol handling for halberd.

pub mod command;
pub mod error;
pub mod session;

pub use command::{Command, GoParams, parse_command};
pub use error::UciError;
pub use session::{SharedOutput, UciLoop};
