//! Attack lookups for every piece kind.

mod magic;
mod magic_data;
mod tables;

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::square::Square;

use self::magic::{bishop_lookup, rook_lookup};
use self::tables::{BETWEEN, KING_ATTACKS, KNIGHT_ATTACKS, PAWN_ATTACKS};

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index()]
}

/// Squares a pawn of `color` on `sq` captures on.
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index()]
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_lookup(sq.index(), occupied)
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_lookup(sq.index(), occupied)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// Attack set of a sliding `kind` from `sq` under `occupied`.
///
/// Blockers of either colour stop the ray and are included in the result;
/// callers mask out their own pieces. Non-sliding kinds yield an empty set.
#[inline]
pub fn sliding_attacks(kind: PieceKind, sq: Square, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Bishop => bishop_attacks(sq, occupied),
        PieceKind::Rook => rook_attacks(sq, occupied),
        PieceKind::Queen => queen_attacks(sq, occupied),
        _ => Bitboard::EMPTY,
    }
}

/// Attack set of a non-pawn `kind` from `sq` under `occupied`.
#[inline]
pub fn piece_attacks(kind: PieceKind, sq: Square, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Knight => knight_attacks(sq),
        PieceKind::King => king_attacks(sq),
        _ => sliding_attacks(kind, sq, occupied),
    }
}

/// Squares strictly between two aligned squares; empty when not aligned.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard {
    BETWEEN[a.index()][b.index()]
}
