//! Uncoloured piece kinds.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const COUNT: usize = 6;

    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Contribution to the game phase; pawns and kings count zero.
    #[inline]
    pub const fn phase_weight(self) -> i32 {
        match self {
            PieceKind::Knight | PieceKind::Bishop => 1,
            PieceKind::Rook => 2,
            PieceKind::Queen => 4,
            PieceKind::Pawn | PieceKind::King => 0,
        }
    }

    /// Lowercase FEN letter.
    #[inline]
    pub const fn fen_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Case-insensitive inverse of [`PieceKind::fen_char`].
    pub fn from_fen_char(c: char) -> Option<PieceKind> {
        Some(match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        })
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::PieceKind;

    #[test]
    fn fen_char_roundtrip() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_fen_char(kind.fen_char()), Some(kind));
            assert_eq!(
                PieceKind::from_fen_char(kind.fen_char().to_ascii_uppercase()),
                Some(kind)
            );
        }
        assert_eq!(PieceKind::from_fen_char('x'), None);
    }

    #[test]
    fn starting_phase_is_24() {
        let per_side: i32 = [
            (PieceKind::Knight, 2),
            (PieceKind::Bishop, 2),
            (PieceKind::Rook, 2),
            (PieceKind::Queen, 1),
        ]
        .iter()
        .map(|(k, n)| k.phase_weight() * n)
        .sum();
        assert_eq!(per_side * 2, 24);
    }
}
