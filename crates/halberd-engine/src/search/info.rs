//! Per-worker search state.

use halberd_core::{Move, Piece};

use super::MAX_PLY;
use super::heuristics::{ContinuationKey, Heuristics};

/// Triangular principal variation table.
pub struct PvTable {
    moves: [[Move; MAX_PLY + 1]; MAX_PLY + 1],
    len: [usize; MAX_PLY + 1],
}

impl PvTable {
    pub fn new() -> PvTable {
        PvTable {
            moves: [[Move::NULL; MAX_PLY + 1]; MAX_PLY + 1],
            len: [0; MAX_PLY + 1],
        }
    }

    /// Empty the line at `ply`. Called on entering every node.
    pub fn clear_ply(&mut self, ply: usize) {
        if ply <= MAX_PLY {
            self.len[ply] = 0;
        }
    }

    /// Make `mv` followed by the child's line the line at `ply`.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply > MAX_PLY {
            return;
        }
        self.moves[ply][0] = mv;
        if ply == MAX_PLY {
            self.len[ply] = 1;
            return;
        }
        let copy_len = self.len[ply + 1].min(MAX_PLY);
        let (top, bottom) = self.moves.split_at_mut(ply + 1);
        top[ply][1..1 + copy_len].copy_from_slice(&bottom[0][..copy_len]);
        self.len[ply] = 1 + copy_len;
    }

    /// The principal variation from the root.
    pub fn root(&self) -> &[Move] {
        &self.moves[0][..self.len[0]]
    }
}

impl Default for PvTable {
    fn default() -> Self {
        Self::new()
    }
}

/// What the search knows about one ply of the current line.
#[derive(Debug, Clone, Copy)]
pub struct StackEntry {
    /// Move played from this ply; null for a null move or before any move.
    pub mv: Move,
    /// Piece that made `mv`.
    pub piece: Option<Piece>,
    pub eval: i32,
    pub in_check: bool,
}

impl StackEntry {
    pub const EMPTY: StackEntry = StackEntry {
        mv: Move::NULL,
        piece: None,
        eval: 0,
        in_check: false,
    };

    /// The entry as a continuation history key, if a real move was played.
    pub fn continuation_key(&self) -> Option<ContinuationKey> {
        match self.piece {
            Some(piece) if !self.mv.is_null() => Some(ContinuationKey { piece, to: self.mv.to() }),
            _ => None,
        }
    }
}

/// Everything one search thread owns. Never shared.
pub struct SearchInfo {
    pub pv: PvTable,
    pub heuristics: Heuristics,
    pub stack: [StackEntry; MAX_PLY + 1],
    /// Nodes visited in the current search.
    pub nodes: u64,
    /// Deepest ply reached in the current iteration.
    pub seldepth: usize,
    /// Score of the last completed iteration.
    pub score: i32,
}

impl SearchInfo {
    pub fn new() -> SearchInfo {
        SearchInfo {
            pv: PvTable::new(),
            heuristics: Heuristics::default(),
            stack: [StackEntry::EMPTY; MAX_PLY + 1],
            nodes: 0,
            seldepth: 0,
            score: 0,
        }
    }

    /// Reset per-search state. History, countermoves and continuation history
    /// carry over to the next search.
    pub fn reset_for_search(&mut self) {
        self.pv = PvTable::new();
        self.heuristics.killers.clear();
        self.stack = [StackEntry::EMPTY; MAX_PLY + 1];
        self.nodes = 0;
        self.seldepth = 0;
        self.score = 0;
    }

    /// Forget all learned ordering, as at the start of a new game.
    pub fn clear_history(&mut self) {
        self.heuristics.clear();
    }

    /// Entry for the move played `back` plies before `ply`, if any.
    #[inline]
    pub fn before(&self, ply: usize, back: usize) -> Option<&StackEntry> {
        ply.checked_sub(back).map(|i| &self.stack[i])
    }

    /// Continuation keys for the moves one and two plies before `ply`.
    pub fn context(&self, ply: usize) -> [Option<ContinuationKey>; 2] {
        [
            self.before(ply, 1).and_then(StackEntry::continuation_key),
            self.before(ply, 2).and_then(StackEntry::continuation_key),
        ]
    }
}

impl Default for SearchInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halberd_core::{Color, MoveFlag, PieceKind, Square};

    fn mv(from: Square, to: Square) -> Move {
        Move::new(from, to, MoveFlag::Quiet)
    }

    #[test]
    fn pv_update_copies_child_line() {
        let mut pv = PvTable::new();
        let (a, b, c) = (mv(Square::E2, Square::E3), mv(Square::E7, Square::E6), mv(Square::D2, Square::D3));
        pv.clear_ply(2);
        pv.update(2, c);
        pv.update(1, b);
        pv.update(0, a);
        assert_eq!(pv.root(), &[a, b, c]);

        pv.clear_ply(1);
        pv.update(0, a);
        assert_eq!(pv.root(), &[a]);
    }

    #[test]
    fn pv_update_at_max_ply_does_not_panic() {
        let mut pv = PvTable::new();
        pv.update(MAX_PLY, mv(Square::A2, Square::A3));
        pv.update(MAX_PLY + 1, mv(Square::A2, Square::A3));
    }

    #[test]
    fn reset_keeps_history_but_not_killers() {
        let mut info = SearchInfo::new();
        let quiet = mv(Square::G1, Square::F3);
        info.heuristics.killers.store(1, quiet);
        info.heuristics.history.update(Color::White, quiet, 100);
        info.nodes = 99;

        info.reset_for_search();
        assert_eq!(info.nodes, 0);
        assert!(info.heuristics.killers.get(1)[0].is_null());
        assert_eq!(info.heuristics.history.score(Color::White, quiet), 100);

        info.clear_history();
        assert_eq!(info.heuristics.history.score(Color::White, quiet), 0);
    }

    #[test]
    fn context_skips_null_moves_and_root() {
        let mut info = SearchInfo::new();
        let knight = Piece::new(PieceKind::Knight, Color::White);
        info.stack[0] = StackEntry { mv: mv(Square::G1, Square::F3), piece: Some(knight), ..StackEntry::EMPTY };
        info.stack[1] = StackEntry::EMPTY;

        assert_eq!(info.context(0), [None, None]);
        assert_eq!(info.context(1), [Some(ContinuationKey { piece: knight, to: Square::F3 }), None]);
        assert_eq!(info.context(2), [None, Some(ContinuationKey { piece: knight, to: Square::F3 })]);
    }
}
