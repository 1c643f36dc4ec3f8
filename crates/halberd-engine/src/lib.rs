//! Search, evaluation and thread management for halberd.

pub mod engine;
pub mod error;
pub mod eval;
pub mod search;
pub mod threads;
pub mod time;

pub use engine::{Engine, EngineOptions};
pub use error::EngineError;
pub use eval::evaluate;
pub use search::{IterationReport, MATE, MAX_PLY, SearchResult, mate_in_moves};
pub use threads::{Completion, Reporter};
pub use time::{Clock, SearchLimits, TimeManager};
