//! Static evaluation.
//!
//! A tapered blend of the material and piece-square scores the position keeps
//! up to date incrementally, so evaluating a node costs a few additions.

use halberd_core::Position;
use halberd_core::psqt::MAX_PHASE;

/// Bonus for having the move.
pub const TEMPO: i32 = 10;

/// Evaluate `pos` in centipawns from the side to move's point of view.
pub fn evaluate(pos: &Position) -> i32 {
    let us = pos.side_to_move();
    let score = pos.psqt(us) - pos.psqt(!us);
    score.taper(pos.phase(), MAX_PHASE) + TEMPO
}
