//! Perft (performance test) for move generation correctness verification.

use crate::chess_move::Move;
use crate::movegen::generate_all;
use crate::position::Position;

/// Count the leaf nodes of the legal move tree to `depth`.
///
/// Depth 0 returns 1. Pseudo-legal moves are filtered by playing them, so
/// make/undo is exercised at every node.
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for &mv in generate_all(pos).iter() {
        if pos.make_move(mv) {
            nodes += if depth == 1 { 1 } else { perft(pos, depth - 1) };
        }
        pos.undo_move(mv);
    }
    nodes
}

/// Per-move breakdown of [`perft`], sorted by move text.
pub fn divide(pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
    let mut results = Vec::new();
    for &mv in generate_all(pos).iter() {
        if pos.make_move(mv) {
            results.push((mv, perft(pos, depth.saturating_sub(1))));
        }
        pos.undo_move(mv);
    }
    results.sort_by_key(|(mv, _)| mv.to_string());
    results
}
