//! NegaScout with quiescence search.

use std::sync::OnceLock;

use halberd_core::{Move, MoveList, PieceKind};

use super::picker::MovePicker;
use super::see::{see_ge, see_value};
use super::tt::Bound;
use super::{INF, Interrupted, MATE, MATE_BOUND, MAX_PLY, Search};
use crate::eval::evaluate;

const RFP_DEPTH: i32 = 8;
const RFP_MARGIN: i32 = 80;

const NMP_DEPTH: i32 = 3;

const IIR_DEPTH: i32 = 4;

const FUTILITY_DEPTH: i32 = 8;
const FUTILITY_BASE: i32 = 100;
const FUTILITY_MARGIN: i32 = 100;

const SEE_QUIET_MARGIN: i32 = 50;
const SEE_NOISY_MARGIN: i32 = 20;

const LMR_MIN_DEPTH: i32 = 3;
const LMR_MIN_MOVES: usize = 3;

const DELTA_MARGIN: i32 = 200;

/// Late move reductions in plies, indexed by `[depth][move number]`.
static LMR_TABLE: OnceLock<[[i32; 64]; 64]> = OnceLock::new();

fn lmr_reduction(depth: i32, move_number: usize) -> i32 {
    let table = LMR_TABLE.get_or_init(|| {
        let mut table = [[0; 64]; 64];
        for (d, row) in table.iter_mut().enumerate().skip(1) {
            for (m, r) in row.iter_mut().enumerate().skip(1) {
                *r = (0.75 + (d as f64).ln() * (m as f64).ln() / 2.25) as i32;
            }
        }
        table
    });
    table[(depth.max(0) as usize).min(63)][move_number.min(63)]
}

#[inline]
fn mated_in(ply: usize) -> i32 {
    -MATE + ply as i32
}

#[inline]
fn mate_in(ply: usize) -> i32 {
    MATE - ply as i32
}

impl Search<'_> {
    pub(super) fn negascout(&mut self, mut alpha: i32, mut beta: i32, mut depth: i32, ply: usize) -> Result<i32, Interrupted> {
        if depth <= 0 {
            return self.quiescence(alpha, beta, ply);
        }
        self.info.pv.clear_ply(ply);
        self.poll()?;
        self.info.seldepth = self.info.seldepth.max(ply);

        let root = ply == 0;
        let pv_node = beta - alpha > 1;

        if !root {
            if self.pos.is_draw(ply) {
                return Ok(0);
            }
            if ply >= MAX_PLY {
                return Ok(evaluate(&self.pos));
            }
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(mate_in(ply + 1));
            if alpha >= beta {
                return Ok(alpha);
            }
        }

        let hash = self.pos.hash();
        let in_check = self.pos.in_check();
        let tt_entry = self.tt.probe(hash, ply);
        let tt_move = tt_entry.map_or(Move::NULL, |e| e.mv);
        if let Some(entry) = tt_entry {
            if !pv_node && entry.depth >= depth && entry.cuts(alpha, beta) {
                return Ok(entry.score);
            }
        }

        let eval = tt_entry.map_or_else(|| evaluate(&self.pos), |e| e.eval);
        self.info.stack[ply].eval = eval;
        self.info.stack[ply].in_check = in_check;
        let improving = !in_check
            && ply >= 2
            && !self.info.stack[ply - 2].in_check
            && eval > self.info.stack[ply - 2].eval;

        let us = self.pos.side_to_move();
        let previous = self.info.before(ply, 1).map_or(Move::NULL, |e| e.mv);

        if !pv_node && !in_check {
            if depth <= RFP_DEPTH && eval - RFP_MARGIN * (depth - improving as i32) >= beta {
                return Ok((eval + beta) / 2);
            }

            let after_null = !root && previous.is_null();
            if depth >= NMP_DEPTH && eval >= beta && !after_null && self.pos.has_non_pawn_material(us) {
                let r = 3 + depth / 3;
                self.info.stack[ply].mv = Move::NULL;
                self.info.stack[ply].piece = None;
                self.pos.make_null_move();
                let result = self.negascout(-beta, -beta + 1, depth - r, ply + 1);
                self.pos.undo_null_move();
                let score = -result?;
                if score >= beta {
                    return Ok(if score > MATE_BOUND { beta } else { score });
                }
            }
        }

        if depth >= IIR_DEPTH && tt_move.is_null() {
            depth -= 1;
        }

        let context = self.info.context(ply);
        let counter = self.info.heuristics.counters.get(previous);
        let killers = self.info.heuristics.killers.get(ply);
        let mut picker = MovePicker::new(&self.pos, tt_move, killers, counter, context);

        let original_alpha = alpha;
        let mut best_score = -INF;
        let mut best_move = Move::NULL;
        let mut legal = 0;
        let mut quiets_tried = MoveList::new();

        while let Some(mv) = picker.next(&self.pos, &self.info.heuristics) {
            let quiet = mv.is_quiet();

            if !root && best_score > -MATE_BOUND {
                if quiet && !in_check {
                    let lmp_limit = 3 + depth * depth / (2 - improving as i32);
                    let futile =
                        depth <= FUTILITY_DEPTH && eval + FUTILITY_BASE + FUTILITY_MARGIN * depth <= alpha;
                    if quiets_tried.len() as i32 > lmp_limit || futile {
                        picker.skip_quiets();
                        continue;
                    }
                }
                if !pv_node {
                    let threshold = if quiet {
                        -SEE_QUIET_MARGIN * depth
                    } else {
                        -SEE_NOISY_MARGIN * depth * depth
                    };
                    if !see_ge(&self.pos, mv, threshold) {
                        continue;
                    }
                }
            }

            let piece = self.pos.piece_on(mv.from());
            if !self.pos.make_move(mv) {
                self.pos.undo_move(mv);
                continue;
            }
            legal += 1;
            self.info.stack[ply].mv = mv;
            self.info.stack[ply].piece = piece;

            let new_depth = depth - 1;
            let reduced = if quiet && legal >= LMR_MIN_MOVES && depth >= LMR_MIN_DEPTH {
                let gives_check = self.pos.in_check();
                let r = lmr_reduction(depth, legal)
                    - pv_node as i32
                    - in_check as i32
                    - gives_check as i32
                    - improving as i32;
                (new_depth - r).clamp(1, new_depth)
            } else {
                new_depth
            };

            let result = self.search_move(alpha, beta, new_depth, reduced, ply, legal == 1);
            self.pos.undo_move(mv);
            let score = result?;

            if quiet {
                quiets_tried.push(mv);
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = mv;
                    alpha = score;
                    if pv_node {
                        self.info.pv.update(ply, mv);
                    }
                    if score >= beta {
                        if quiet {
                            self.info.heuristics.update_quiets(
                                &self.pos,
                                ply,
                                depth,
                                mv,
                                quiets_tried.as_slice(),
                                previous,
                                &context,
                            );
                        }
                        break;
                    }
                }
            }
        }

        if legal == 0 {
            return Ok(if in_check { mated_in(ply) } else { 0 });
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt.store(hash, depth, ply, best_move, best_score, eval, bound);
        Ok(best_score)
    }

    /// Search one child: the first move with the full window, later moves
    /// with a (possibly reduced) null window and re-searches as needed.
    fn search_move(
        &mut self,
        alpha: i32,
        beta: i32,
        new_depth: i32,
        reduced: i32,
        ply: usize,
        first: bool,
    ) -> Result<i32, Interrupted> {
        if first {
            return Ok(-self.negascout(-beta, -alpha, new_depth, ply + 1)?);
        }
        let mut score = -self.negascout(-alpha - 1, -alpha, reduced, ply + 1)?;
        if score > alpha && reduced < new_depth {
            score = -self.negascout(-alpha - 1, -alpha, new_depth, ply + 1)?;
        }
        if score > alpha && beta - alpha > 1 {
            score = -self.negascout(-beta, -alpha, new_depth, ply + 1)?;
        }
        Ok(score)
    }

    fn quiescence(&mut self, mut alpha: i32, beta: i32, ply: usize) -> Result<i32, Interrupted> {
        self.info.pv.clear_ply(ply);
        self.poll()?;
        self.info.seldepth = self.info.seldepth.max(ply);

        if self.pos.is_draw(ply) {
            return Ok(0);
        }
        if ply >= MAX_PLY {
            return Ok(evaluate(&self.pos));
        }

        let pv_node = beta - alpha > 1;
        let hash = self.pos.hash();
        let tt_entry = self.tt.probe(hash, ply);
        if let Some(entry) = tt_entry {
            if !pv_node && entry.cuts(alpha, beta) {
                return Ok(entry.score);
            }
        }

        let stand_pat = tt_entry.map_or_else(|| evaluate(&self.pos), |e| e.eval);
        if stand_pat >= beta {
            return Ok(stand_pat);
        }
        alpha = alpha.max(stand_pat);

        let mut best_score = stand_pat;
        let mut best_move = Move::NULL;
        let mut picker = MovePicker::new_qsearch(&self.pos, tt_entry.map_or(Move::NULL, |e| e.mv));

        while let Some(mv) = picker.next(&self.pos, &self.info.heuristics) {
            if !mv.is_promotion() {
                let captured = if mv.is_en_passant() {
                    see_value(PieceKind::Pawn)
                } else {
                    self.pos.piece_on(mv.to()).map_or(0, |p| see_value(p.kind()))
                };
                if stand_pat + captured + DELTA_MARGIN < alpha {
                    continue;
                }
            }
            if !see_ge(&self.pos, mv, 0) {
                continue;
            }

            let piece = self.pos.piece_on(mv.from());
            if !self.pos.make_move(mv) {
                self.pos.undo_move(mv);
                continue;
            }
            self.info.stack[ply].mv = mv;
            self.info.stack[ply].piece = piece;
            let result = self.quiescence(-beta, -alpha, ply + 1);
            self.pos.undo_move(mv);
            let score = -result?;

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = mv;
                    alpha = score;
                    if score >= beta {
                        break;
                    }
                }
            }
        }

        let bound = if best_score >= beta { Bound::Lower } else { Bound::Upper };
        self.tt.store(hash, 0, ply, best_move, best_score, stand_pat, bound);
        Ok(best_score)
    }
}
