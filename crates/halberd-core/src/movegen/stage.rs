//! Compile-time selection of which move classes a generator pass emits.

/// Marker trait for the generation stage.
pub(crate) trait Stage {
    /// Captures, en passant and every promotion.
    const NOISY: bool;
    /// Everything else, castling included.
    const QUIET: bool;
}

pub(crate) struct Noisy;
impl Stage for Noisy {
    const NOISY: bool = true;
    const QUIET: bool = false;
}

pub(crate) struct Quiet;
impl Stage for Quiet {
    const NOISY: bool = false;
    const QUIET: bool = true;
}

pub(crate) struct All;
impl Stage for All {
    const NOISY: bool = true;
    const QUIET: bool = true;
}
