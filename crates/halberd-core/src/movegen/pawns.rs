//! Pawn move generation.

use crate::attacks::pawn_attacks;
use crate::bitboard::Bitboard;
use crate::chess_move::{Move, MoveFlag};
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;

use super::MoveList;
use super::stage::Stage;

/// Queen first so the picker meets the strongest promotion early.
const PROMOTIONS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Knight, PieceKind::Rook, PieceKind::Bishop];

fn push_promotions(from: Square, to: Square, capture: bool, list: &mut MoveList) {
    for kind in PROMOTIONS {
        list.push(Move::new(from, to, MoveFlag::promotion(kind, capture)));
    }
}

pub(super) fn gen_pawns<S: Stage>(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let them = !us;
    let pawns = pos.colored(us, PieceKind::Pawn);
    let empty = !pos.occupied();
    let enemies = pos.side(them);

    let (promo_rank, double_rank) = match us {
        Color::White => (Bitboard::RANK_8, Bitboard::RANK_4),
        Color::Black => (Bitboard::RANK_1, Bitboard::RANK_5),
    };
    let advance = |bb: Bitboard| match us {
        Color::White => bb.north(),
        Color::Black => bb.south(),
    };

    let single = advance(pawns) & empty;

    if S::NOISY {
        for to in single & promo_rank {
            push_promotions(to.backward(us), to, false, list);
        }

        for from in pawns {
            for to in pawn_attacks(us, from) & enemies {
                if promo_rank.contains(to) {
                    push_promotions(from, to, true, list);
                } else {
                    list.push(Move::new(from, to, MoveFlag::Capture));
                }
            }
        }

        if let Some(ep) = pos.en_passant() {
            // The double-pushed pawn has to be there to be taken.
            if pos.colored(them, PieceKind::Pawn).contains(ep.backward(us)) {
                for from in pawn_attacks(them, ep) & pawns {
                    list.push(Move::new(from, ep, MoveFlag::EnPassant));
                }
            }
        }
    }

    if S::QUIET {
        for to in single & !promo_rank {
            list.push(Move::new(to.backward(us), to, MoveFlag::Quiet));
        }
        for to in advance(single) & empty & double_rank {
            list.push(Move::new(to.backward(us).backward(us), to, MoveFlag::DoublePush));
        }
    }
}
