//! Moves packed into 16 bits with a 4-bit flag.

use std::fmt;

use crate::piece_kind::PieceKind;
use crate::square::Square;

const FROM_MASK: u16 = 0x003F;
const TO_SHIFT: u16 = 6;
const TO_MASK: u16 = 0x0FC0;
const FLAG_SHIFT: u16 = 12;

const CAPTURE_BIT: u8 = 0b0100;
const PROMOTION_BIT: u8 = 0b1000;

/// Move flag stored in the top four bits.
///
/// Bit 2 marks captures and bit 3 marks promotions; the low two bits of a
/// promotion pick the piece (knight, bishop, rook, queen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveFlag {
    Quiet = 0,
    DoublePush = 1,
    KingCastle = 2,
    QueenCastle = 3,
    Capture = 4,
    EnPassant = 5,
    KnightPromo = 8,
    BishopPromo = 9,
    RookPromo = 10,
    QueenPromo = 11,
    KnightPromoCapture = 12,
    BishopPromoCapture = 13,
    RookPromoCapture = 14,
    QueenPromoCapture = 15,
}

impl MoveFlag {
    const fn from_bits(bits: u8) -> MoveFlag {
        match bits & 0xF {
            0 => MoveFlag::Quiet,
            1 => MoveFlag::DoublePush,
            2 => MoveFlag::KingCastle,
            3 => MoveFlag::QueenCastle,
            4 => MoveFlag::Capture,
            5 => MoveFlag::EnPassant,
            8 => MoveFlag::KnightPromo,
            9 => MoveFlag::BishopPromo,
            10 => MoveFlag::RookPromo,
            11 => MoveFlag::QueenPromo,
            12 => MoveFlag::KnightPromoCapture,
            13 => MoveFlag::BishopPromoCapture,
            14 => MoveFlag::RookPromoCapture,
            // 6 and 7 are never constructed
            _ => MoveFlag::QueenPromoCapture,
        }
    }

    /// Promotion flag for `kind`, with or without a capture.
    ///
    /// `kind` must be a knight, bishop, rook or queen.
    pub const fn promotion(kind: PieceKind, capture: bool) -> MoveFlag {
        let piece = match kind {
            PieceKind::Knight => 0,
            PieceKind::Bishop => 1,
            PieceKind::Rook => 2,
            _ => 3,
        };
        let capture = if capture { CAPTURE_BIT } else { 0 };
        MoveFlag::from_bits(PROMOTION_BIT | capture | piece)
    }
}

/// A move: bits 0-5 origin, bits 6-11 destination, bits 12-15 [`MoveFlag`].
///
/// The all-zero value is [`Move::NULL`], which no generator ever produces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Move {
        Move(from.index() as u16 | (to.index() as u16) << TO_SHIFT | (flag as u16) << FLAG_SHIFT)
    }

    /// Rebuild from the packed value (as stored in the transposition table).
    #[inline]
    pub const fn from_raw(raw: u16) -> Move {
        Move(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_unchecked((self.0 & FROM_MASK) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_unchecked(((self.0 & TO_MASK) >> TO_SHIFT) as u8)
    }

    #[inline]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::from_bits((self.0 >> FLAG_SHIFT) as u8)
    }

    #[inline]
    const fn flag_bits(self) -> u8 {
        (self.0 >> FLAG_SHIFT) as u8
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Captures, including en passant and promotion-captures.
    #[inline]
    pub const fn is_capture(self) -> bool {
        self.flag_bits() & CAPTURE_BIT != 0
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.flag_bits() & PROMOTION_BIT != 0
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        self.flag_bits() == MoveFlag::EnPassant as u8
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.flag(), MoveFlag::KingCastle | MoveFlag::QueenCastle)
    }

    /// Anything generated in the noisy stage: captures and promotions.
    #[inline]
    pub const fn is_noisy(self) -> bool {
        self.is_capture() || self.is_promotion()
    }

    #[inline]
    pub const fn is_quiet(self) -> bool {
        !self.is_noisy()
    }

    /// The piece a promotion produces.
    #[inline]
    pub const fn promotion_kind(self) -> Option<PieceKind> {
        if !self.is_promotion() {
            return None;
        }
        Some(match self.flag_bits() & 0b11 {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    /// Long algebraic notation, `0000` for the null move.
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("0000");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion_kind() {
            write!(f, "{}", kind.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, {:?})", self.flag())
    }
}
