//! The engine facade: one session's position, table, and search threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use halberd_core::{Move, Position, STARTING_FEN};

use crate::error::EngineError;
use crate::eval;
use crate::search::tt::{MAX_HASH_MB, TranspositionTable};
use crate::search::{MAX_PLY, SearchResult};
use crate::threads::{Completion, Reporter, ThreadManager};
use crate::time::{SearchLimits, TimeManager};

/// Size and parallelism of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Transposition table size in megabytes.
    pub hash_mb: usize,
    /// Number of search threads.
    pub threads: usize,
}

impl EngineOptions {
    pub const MIN_HASH_MB: usize = 1;
    pub const MAX_HASH_MB: usize = MAX_HASH_MB;
    pub const MIN_THREADS: usize = 1;
    pub const MAX_THREADS: usize = 256;

    /// Set the table size, clamped to the supported range.
    pub fn with_hash_mb(self, mb: usize) -> EngineOptions {
        EngineOptions { hash_mb: mb.clamp(Self::MIN_HASH_MB, Self::MAX_HASH_MB), ..self }
    }

    /// Set the thread count, clamped to the supported range.
    pub fn with_threads(self, threads: usize) -> EngineOptions {
        EngineOptions { threads: threads.clamp(Self::MIN_THREADS, Self::MAX_THREADS), ..self }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions { hash_mb: 16, threads: 1 }
    }
}

/// A chess engine session.
///
/// Searches run on the engine's own threads: [`start_search`](Self::start_search)
/// returns at once and the result is collected with [`wait`](Self::wait) or
/// delivered to a completion callback.
pub struct Engine {
    position: Position,
    options: EngineOptions,
    tt: Arc<TranspositionTable>,
    threads: ThreadManager,
    stop: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Result<Engine, EngineError> {
        let options = EngineOptions::default()
            .with_hash_mb(options.hash_mb)
            .with_threads(options.threads);
        info!(hash_mb = options.hash_mb, threads = options.threads, "engine created");
        Ok(Engine {
            position: Position::startpos(),
            options,
            tt: Arc::new(TranspositionTable::new(options.hash_mb)),
            threads: ThreadManager::new(options.threads)?,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Set up the position from FEN.
    ///
    /// On error the position is left empty and the error returned.
    pub fn set_position(&mut self, fen: &str) -> Result<(), EngineError> {
        self.finish_search();
        self.position.set_from_fen(fen)?;
        Ok(())
    }

    /// Play moves given in long algebraic notation.
    ///
    /// Stops at the first move that does not parse or is illegal; the moves
    /// before it stay played.
    pub fn make_moves(&mut self, moves: &[&str]) -> Result<(), EngineError> {
        self.finish_search();
        for text in moves {
            if let Err(err) = self.position.play_uci(text) {
                warn!(mv = %text, error = %err, "rejected move");
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Start searching the current position and return immediately.
    ///
    /// A search still running is stopped and collected first. `reporter`
    /// hears about every completed iteration; `on_complete` receives the
    /// result on the search thread.
    pub fn start_search(&mut self, limits: SearchLimits, reporter: Option<Reporter>, on_complete: Option<Completion>) {
        self.finish_search();
        let mut time = TimeManager::new(Arc::clone(&self.stop));
        time.set_limits(&limits, self.position.side_to_move());
        let depth = limits.depth.unwrap_or(MAX_PLY as u32 - 1);
        debug!(?limits, soft = ?time.soft_limit(), hard = ?time.hard_limit(), "starting search");
        self.threads
            .start(&self.position, Arc::clone(&self.tt), Arc::new(time), depth, reporter, on_complete);
    }

    /// Search with `limits` and block until done.
    pub fn search(&mut self, limits: SearchLimits) -> Option<SearchResult> {
        self.start_search(limits, None, None);
        self.wait()
    }

    /// Ask the running search to stop. Returns at once.
    pub fn stop_search(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Block until the running search ends and return its result.
    pub fn wait(&mut self) -> Option<SearchResult> {
        self.threads.wait()
    }

    /// Number of search threads in the running pool.
    pub fn search_threads(&self) -> usize {
        self.threads.len()
    }

    pub fn is_searching(&self) -> bool {
        self.threads.is_searching()
    }

    fn finish_search(&mut self) {
        if self.threads.is_searching() {
            self.stop_search();
            self.threads.wait();
        }
    }

    /// Static evaluation of the current position, side to move's view.
    pub fn evaluate(&self) -> i32 {
        eval::evaluate(&self.position)
    }

    pub fn perft(&mut self, depth: u32) -> u64 {
        self.finish_search();
        halberd_core::perft(&mut self.position, depth)
    }

    pub fn divide(&mut self, depth: u32) -> Vec<(Move, u64)> {
        self.finish_search();
        halberd_core::divide(&mut self.position, depth)
    }

    /// Change an option by its protocol name (case-insensitive).
    ///
    /// `Hash` reallocates the table, `Threads` rebuilds the pool and
    /// `Clear Hash` empties the table. Numeric values are clamped.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        self.finish_search();
        let invalid = || EngineError::InvalidOptionValue { name: name.to_string(), value: value.to_string() };
        match name.trim().to_ascii_lowercase().as_str() {
            "hash" => {
                let mb: usize = value.trim().parse().map_err(|_| invalid())?;
                self.options = self.options.with_hash_mb(mb);
                match Arc::get_mut(&mut self.tt) {
                    Some(tt) => tt.resize(self.options.hash_mb),
                    None => self.tt = Arc::new(TranspositionTable::new(self.options.hash_mb)),
                }
                debug!(hash_mb = self.options.hash_mb, "table resized");
            }
            "threads" => {
                let threads: usize = value.trim().parse().map_err(|_| invalid())?;
                let options = self.options.with_threads(threads);
                if options.threads != self.threads.len() {
                    self.threads = ThreadManager::new(options.threads)?;
                }
                self.options = options;
                debug!(threads = self.options.threads, "thread pool rebuilt");
            }
            "clear hash" => {
                self.tt.clear();
                debug!("table cleared");
            }
            _ => {
                warn!(%name, "unknown option");
                return Err(EngineError::UnknownOption { name: name.to_string() });
            }
        }
        Ok(())
    }

    /// Forget everything from the previous game and return to the start
    /// position.
    pub fn new_game(&mut self) {
        self.finish_search();
        self.tt.clear();
        self.threads.clear_history();
        if let Err(err) = self.position.set_from_fen(STARTING_FEN) {
            warn!(error = %err, "start position rejected");
        }
        debug!("new game");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_search();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("position", &self.position)
            .field("options", &self.options)
            .field("tt", &self.tt)
            .field("threads", &self.threads)
            .finish()
    }
}
