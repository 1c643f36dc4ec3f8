//! Castling rights as the set of rook origin squares still eligible to castle.

use std::fmt;

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::square::Square;

/// Which wing to castle toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl CastleSide {
    pub const ALL: [CastleSide; 2] = [CastleSide::KingSide, CastleSide::QueenSide];

    /// Home square of the castling rook.
    pub const fn rook_origin(self, color: Color) -> Square {
        let file = match self {
            CastleSide::KingSide => 7,
            CastleSide::QueenSide => 0,
        };
        Square::new(color.back_rank(), file)
    }

    /// Where the king lands.
    pub const fn king_target(self, color: Color) -> Square {
        let file = match self {
            CastleSide::KingSide => 6,
            CastleSide::QueenSide => 2,
        };
        Square::new(color.back_rank(), file)
    }

    /// Where the rook lands.
    pub const fn rook_target(self, color: Color) -> Square {
        let file = match self {
            CastleSide::KingSide => 5,
            CastleSide::QueenSide => 3,
        };
        Square::new(color.back_rank(), file)
    }
}

/// Set of rook origin squares that still carry a castling right.
///
/// Only the four corner squares are ever members.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastleRights(Bitboard);

const CORNERS: [Square; 4] = [Square::H1, Square::A1, Square::H8, Square::A8];

impl CastleRights {
    pub const NONE: CastleRights = CastleRights(Bitboard::EMPTY);

    /// Every corner eligible.
    pub const ALL: CastleRights = CastleRights(Bitboard::new(
        1u64 << 0 | 1u64 << 7 | 1u64 << 56 | 1u64 << 63,
    ));

    /// The eligible rook squares.
    #[inline]
    pub const fn squares(self) -> Bitboard {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.0.contains(side.rook_origin(color))
    }

    /// Grant the right whose rook starts on `rook`.
    #[inline]
    pub const fn with(self, rook: Square) -> CastleRights {
        CastleRights(self.0.with(rook))
    }

    /// Drop any right whose rook square is in `squares`.
    #[inline]
    pub fn without(self, squares: Bitboard) -> CastleRights {
        CastleRights(self.0 & !squares)
    }

    /// Drop both rights of `color`.
    #[inline]
    pub fn without_color(self, color: Color) -> CastleRights {
        CastleRights(self.0 & !back_rank(color))
    }

    /// Dense 4-bit key: bit 0 = h1, 1 = a1, 2 = h8, 3 = a8.
    #[inline]
    pub fn key_index(self) -> usize {
        CORNERS
            .iter()
            .enumerate()
            .filter(|(_, sq)| self.0.contains(**sq))
            .fold(0, |acc, (bit, _)| acc | 1 << bit)
    }
}

fn back_rank(color: Color) -> Bitboard {
    match color {
        Color::White => Bitboard::RANK_1,
        Color::Black => Bitboard::RANK_8,
    }
}

/// FEN castling field, `-` when empty.
impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (color, side, c) in [
            (Color::White, CastleSide::KingSide, 'K'),
            (Color::White, CastleSide::QueenSide, 'Q'),
            (Color::Black, CastleSide::KingSide, 'k'),
            (Color::Black, CastleSide::QueenSide, 'q'),
        ] {
            if self.has(color, side) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastleRights({self})")
    }
}
