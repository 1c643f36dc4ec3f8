//! Material and piece-square values maintained incrementally by [`Position`](crate::Position).
//!
//! Tables are written from White's point of view with rank 8 on the first row,
//! so they read like a board diagram. White squares are looked up through
//! [`Square::flip_rank`]; Black squares index the table directly.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::color::Color;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Middlegame / endgame score pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Score {
    pub mg: i32,
    pub eg: i32,
}

impl Score {
    pub const ZERO: Score = Score { mg: 0, eg: 0 };

    #[inline]
    pub const fn new(mg: i32, eg: i32) -> Score {
        Score { mg, eg }
    }

    /// Blend by phase, where `max_phase` is pure middlegame and 0 pure endgame.
    #[inline]
    pub fn taper(self, phase: i32, max_phase: i32) -> i32 {
        let phase = phase.clamp(0, max_phase);
        (self.mg * phase + self.eg * (max_phase - phase)) / max_phase
    }
}

impl Add for Score {
    type Output = Score;
    #[inline]
    fn add(self, rhs: Score) -> Score {
        Score::new(self.mg + rhs.mg, self.eg + rhs.eg)
    }
}

impl AddAssign for Score {
    #[inline]
    fn add_assign(&mut self, rhs: Score) {
        self.mg += rhs.mg;
        self.eg += rhs.eg;
    }
}

impl Sub for Score {
    type Output = Score;
    #[inline]
    fn sub(self, rhs: Score) -> Score {
        Score::new(self.mg - rhs.mg, self.eg - rhs.eg)
    }
}

impl SubAssign for Score {
    #[inline]
    fn sub_assign(&mut self, rhs: Score) {
        self.mg -= rhs.mg;
        self.eg -= rhs.eg;
    }
}

impl Neg for Score {
    type Output = Score;
    #[inline]
    fn neg(self) -> Score {
        Score::new(-self.mg, -self.eg)
    }
}

/// Phase of the initial position.
pub const MAX_PHASE: i32 = 24;

const MATERIAL: [Score; PieceKind::COUNT] = [
    Score::new(82, 94),
    Score::new(337, 281),
    Score::new(365, 297),
    Score::new(477, 512),
    Score::new(1025, 936),
    Score::new(0, 0),
];

#[rustfmt::skip]
const PAWN_MG: [i8; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     60,  70,  50,  60,  55,  70,  40,  20,
      0,   5,  20,  25,  55,  50,  20,  -5,
    -10,   5,   5,  20,  22,  10,  15, -15,
    -20,  -2,  -5,  12,  16,   5,   8, -20,
    -20,  -4,  -4, -10,   2,   2,  30, -10,
    -30,  -1, -20, -20, -15,  20,  35, -20,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PAWN_EG: [i8; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
    120, 115, 105,  90,  95,  90, 110, 125,
     80,  85,  70,  55,  50,  45,  70,  75,
     30,  22,  12,   5,   0,   4,  15,  16,
     12,   8,  -3,  -7,  -7,  -8,   3,  -2,
      4,   7,  -6,   1,   0,  -5,  -1,  -8,
     12,   8,   8,  10,  12,   0,   2,  -7,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT: [i8; 64] = [
    -90, -50, -30, -30, -30, -30, -50, -90,
    -50, -25,   5,  10,  10,   5, -25, -50,
    -30,  10,  25,  30,  30,  25,  10, -30,
    -25,   5,  20,  30,  30,  20,   5, -25,
    -25,   0,  15,  20,  20,  15,   0, -25,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -45, -25,  -5,   0,   0,  -5, -25, -45,
    -80, -30, -35, -30, -30, -35, -30, -80,
];

#[rustfmt::skip]
const BISHOP: [i8; 64] = [
    -25, -10, -20, -20, -20, -20, -10, -25,
    -15,   5,   0,   0,   0,   0,   5, -15,
    -10,  10,  15,  15,  15,  15,  10, -10,
     -5,   5,  10,  20,  20,  10,   5,  -5,
     -5,  10,  10,  20,  20,  10,  10,  -5,
     -5,  10,  10,  10,  10,  10,  10,  -5,
     -5,  15,   5,   5,   5,   5,  15,  -5,
    -25, -10, -15, -10, -10, -15, -10, -25,
];

#[rustfmt::skip]
const ROOK: [i8; 64] = [
     20,  20,  20,  25,  25,  20,  20,  20,
     25,  30,  35,  35,  35,  35,  30,  25,
      0,   5,   5,  10,  10,   5,   5,   0,
    -10,  -5,   0,   5,   5,   0,  -5, -10,
    -15, -10,  -5,   0,   0,  -5, -10, -15,
    -20, -10,  -5,  -5,  -5,  -5, -10, -20,
    -25, -15, -10,  -5,  -5, -10, -15, -25,
    -10,  -5,   5,  10,  10,   5,  -5, -10,
];

#[rustfmt::skip]
const QUEEN: [i8; 64] = [
    -20, -10,  -5,   0,   0,  -5, -10, -20,
    -10,  -5,   5,   5,   5,   5,  -5, -10,
     -5,   5,  10,  10,  10,  10,   5,  -5,
     -5,   0,   5,  10,  10,   5,   0,  -5,
     -5,   0,   5,  10,  10,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -15,  -5,   5,   0,   0,  -5,  -5, -15,
    -20, -15, -10,  -5,  -5, -10, -15, -20,
];

#[rustfmt::skip]
const KING_MG: [i8; 64] = [
    -60, -70, -70, -90, -90, -70, -70, -60,
    -60, -70, -70, -90, -90, -70, -70, -60,
    -60, -70, -70, -90, -90, -70, -70, -60,
    -50, -60, -60, -80, -80, -60, -60, -50,
    -40, -50, -50, -60, -60, -50, -50, -40,
    -20, -30, -30, -40, -40, -30, -30, -20,
     10,  10, -10, -30, -30, -15,  10,  15,
     15,  35,  10, -20,   0, -10,  35,  20,
];

#[rustfmt::skip]
const KING_EG: [i8; 64] = [
    -70, -45, -35, -25, -25, -35, -45, -70,
    -35, -10,   0,  10,  10,   0, -10, -35,
    -25,   5,  20,  30,  30,  20,   5, -25,
    -25,   5,  30,  40,  40,  30,   5, -25,
    -25,   0,  25,  35,  35,  25,   0, -25,
    -30, -10,  10,  20,  20,  10, -10, -30,
    -40, -20,  -5,   0,   0,  -5, -20, -40,
    -65, -45, -30, -25, -25, -30, -45, -65,
];

const fn table_pair(kind: PieceKind) -> (&'static [i8; 64], &'static [i8; 64]) {
    match kind {
        PieceKind::Pawn => (&PAWN_MG, &PAWN_EG),
        PieceKind::Knight => (&KNIGHT, &KNIGHT),
        PieceKind::Bishop => (&BISHOP, &BISHOP),
        PieceKind::Rook => (&ROOK, &ROOK),
        PieceKind::Queen => (&QUEEN, &QUEEN),
        PieceKind::King => (&KING_MG, &KING_EG),
    }
}

/// Material plus placement bonus for `piece` standing on `sq`, from its owner's side.
#[inline]
pub fn psqt_value(piece: Piece, sq: Square) -> Score {
    let idx = match piece.color() {
        Color::White => sq.flip_rank().index(),
        Color::Black => sq.index(),
    };
    let (mg, eg) = table_pair(piece.kind());
    MATERIAL[piece.kind().index()] + Score::new(mg[idx] as i32, eg[idx] as i32)
}

/// Middlegame material value of a piece kind, used by the move orderer.
#[inline]
pub const fn material_value(kind: PieceKind) -> i32 {
    MATERIAL[kind.index()].mg
}
