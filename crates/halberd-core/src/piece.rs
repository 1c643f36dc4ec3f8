//! Coloured pieces packed into a byte.

use std::fmt;

use crate::color::Color;
use crate::piece_kind::PieceKind;

/// A coloured piece: bits 0-2 hold the [`PieceKind`], bit 3 the [`Color`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece(u8);

impl Piece {
    pub const COUNT: usize = 12;

    #[inline]
    pub const fn new(kind: PieceKind, color: Color) -> Piece {
        Piece((color as u8) << 3 | kind as u8)
    }

    /// Uppercase letters are White, lowercase Black.
    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_fen_char(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Piece::new(kind, color))
    }

    #[inline]
    pub const fn kind(self) -> PieceKind {
        match self.0 & 7 {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            _ => PieceKind::King,
        }
    }

    #[inline]
    pub const fn color(self) -> Color {
        if self.0 & 8 == 0 { Color::White } else { Color::Black }
    }

    /// Dense index 0..12, White pieces first.
    #[inline]
    pub const fn index(self) -> usize {
        self.color().index() * PieceKind::COUNT + self.kind().index()
    }

    pub fn fen_char(self) -> char {
        let c = self.kind().fen_char();
        match self.color() {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece({})", self.fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack() {
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let p = Piece::new(kind, color);
                assert_eq!(p.kind(), kind);
                assert_eq!(p.color(), color);
            }
        }
    }

    #[test]
    fn indices_are_dense_and_unique() {
        let mut seen = [false; Piece::COUNT];
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let idx = Piece::new(kind, color).index();
                assert!(!seen[idx]);
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn fen_letters() {
        assert_eq!(Piece::from_fen_char('N'), Some(Piece::new(PieceKind::Knight, Color::White)));
        assert_eq!(Piece::from_fen_char('q'), Some(Piece::new(PieceKind::Queen, Color::Black)));
        assert_eq!(Piece::new(PieceKind::King, Color::Black).to_string(), "k");
        assert_eq!(Piece::from_fen_char('1'), None);
    }
}
