//! Staged move picker.
//!
//! Moves come out in the order most likely to cause an early cutoff: the hash
//! move, captures and promotions by MVV-LVA, the two killers, then the rest of
//! the quiets by history. Each stage is only generated once the previous one
//! is exhausted, so a cutoff on the hash move costs no generation at all.

use halberd_core::movegen::MAX_MOVES;
use halberd_core::psqt::material_value;
use halberd_core::{Move, MoveList, PieceKind, Position, generate_noisy, generate_quiet};

use super::heuristics::{ContinuationKey, Heuristics};

/// Offset placing every noisy move above zero regardless of the exchange.
const NOISY_BASE: i32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    HashMove,
    GenerateNoisy,
    Noisy,
    Killer1,
    Killer2,
    GenerateQuiet,
    Quiet,
    Done,
}

/// Ordering score of a capture or promotion.
fn noisy_score(pos: &Position, mv: Move) -> i32 {
    let captured = if mv.is_en_passant() {
        material_value(PieceKind::Pawn)
    } else {
        pos.piece_on(mv.to()).map_or(0, |p| material_value(p.kind()))
    };
    match mv.promotion_kind() {
        Some(kind) => NOISY_BASE + material_value(kind) + captured,
        None => {
            let mover = pos.piece_on(mv.from()).map_or(0, |p| material_value(p.kind()));
            NOISY_BASE + captured - mover
        }
    }
}

/// Yields the pseudo-legal moves of one node, best first.
pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    killers: [Move; 2],
    counter: Move,
    context: [Option<ContinuationKey>; 2],
    moves: MoveList,
    scores: [i32; MAX_MOVES],
    cursor: usize,
    skip_quiets: bool,
}

impl MovePicker {
    /// Picker for the main search.
    ///
    /// `tt_move` and the killers may come from other positions; they are
    /// only yielded if pseudo-legal here. `counter` and `context` feed the
    /// quiet ordering.
    pub fn new(
        pos: &Position,
        tt_move: Move,
        killers: [Move; 2],
        counter: Move,
        context: [Option<ContinuationKey>; 2],
    ) -> MovePicker {
        let tt_move = if pos.is_pseudo_legal(tt_move) { tt_move } else { Move::NULL };
        MovePicker {
            stage: Stage::HashMove,
            tt_move,
            killers,
            counter,
            context,
            moves: MoveList::new(),
            scores: [0; MAX_MOVES],
            cursor: 0,
            skip_quiets: false,
        }
    }

    /// Picker for quiescence: the hash move if it is noisy, then captures
    /// and promotions.
    pub fn new_qsearch(pos: &Position, tt_move: Move) -> MovePicker {
        let tt_move = if tt_move.is_noisy() { tt_move } else { Move::NULL };
        let mut picker = MovePicker::new(pos, tt_move, [Move::NULL; 2], Move::NULL, [None; 2]);
        picker.skip_quiets = true;
        picker
    }

    /// Stop yielding quiet moves. Noisy moves still to come are unaffected.
    pub fn skip_quiets(&mut self) {
        self.skip_quiets = true;
    }

    /// The next move to search, or `None` when the node is exhausted.
    pub fn next(&mut self, pos: &Position, heuristics: &Heuristics) -> Option<Move> {
        loop {
            match self.stage {
                Stage::HashMove => {
                    self.stage = Stage::GenerateNoisy;
                    if !self.tt_move.is_null() {
                        return Some(self.tt_move);
                    }
                }
                Stage::GenerateNoisy => {
                    self.moves.clear();
                    generate_noisy(pos, &mut self.moves);
                    for (i, &mv) in self.moves.iter().enumerate() {
                        self.scores[i] = noisy_score(pos, mv);
                    }
                    self.cursor = 0;
                    self.stage = Stage::Noisy;
                }
                Stage::Noisy => match self.select_best() {
                    Some(mv) if mv == self.tt_move => {}
                    Some(mv) => return Some(mv),
                    None => self.stage = Stage::Killer1,
                },
                Stage::Killer1 => {
                    self.stage = Stage::Killer2;
                    let killer = self.killers[0];
                    if self.is_fresh_killer(pos, killer) {
                        return Some(killer);
                    }
                }
                Stage::Killer2 => {
                    self.stage = Stage::GenerateQuiet;
                    let killer = self.killers[1];
                    if killer != self.killers[0] && self.is_fresh_killer(pos, killer) {
                        return Some(killer);
                    }
                }
                Stage::GenerateQuiet => {
                    if self.skip_quiets {
                        self.stage = Stage::Done;
                        continue;
                    }
                    self.moves.clear();
                    generate_quiet(pos, &mut self.moves);
                    let us = pos.side_to_move();
                    for (i, &mv) in self.moves.iter().enumerate() {
                        self.scores[i] = pos.piece_on(mv.from()).map_or(0, |piece| {
                            heuristics.quiet_score(us, mv, piece, self.counter, &self.context)
                        });
                    }
                    self.cursor = 0;
                    self.stage = Stage::Quiet;
                }
                Stage::Quiet => {
                    if self.skip_quiets {
                        self.stage = Stage::Done;
                        continue;
                    }
                    match self.select_best() {
                        Some(mv) if mv == self.tt_move || self.killers.contains(&mv) => {}
                        Some(mv) => return Some(mv),
                        None => self.stage = Stage::Done,
                    }
                }
                Stage::Done => return None,
            }
        }
    }

    fn is_fresh_killer(&self, pos: &Position, killer: Move) -> bool {
        !self.skip_quiets
            && !killer.is_null()
            && killer != self.tt_move
            && killer.is_quiet()
            && pos.is_pseudo_legal(killer)
    }

    /// Selection sort step: swap the best remaining move to the cursor.
    fn select_best(&mut self) -> Option<Move> {
        let len = self.moves.len();
        if self.cursor >= len {
            return None;
        }
        let mut best = self.cursor;
        for i in self.cursor + 1..len {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.as_mut_slice().swap(self.cursor, best);
        self.scores.swap(self.cursor, best);
        let mv = self.moves[self.cursor];
        self.cursor += 1;
        Some(mv)
    }
}
