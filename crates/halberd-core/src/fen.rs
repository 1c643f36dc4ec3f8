//! FEN parsing and serialization for [`Position`].

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::castling::{CastleRights, CastleSide};
use crate::color::Color;
use crate::error::FenError;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;

/// FEN of the standard initial position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// Parse a FEN string. The halfmove and fullmove fields may be omitted.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        fen.parse()
    }

    /// Replace this position with the one described by `fen`.
    ///
    /// On error the position is reset to the empty board and the error is
    /// returned; the previous contents are not kept.
    pub fn set_from_fen(&mut self, fen: &str) -> Result<(), FenError> {
        match fen.parse() {
            Ok(pos) => {
                *self = pos;
                Ok(())
            }
            Err(err) => {
                warn!(%fen, error = %err, "rejected FEN, position cleared");
                *self = Position::default();
                Err(err)
            }
        }
    }
}

fn parse_placement(pos: &mut Position, field: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }
    for (i, text) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0usize;
        for c in text.chars() {
            if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                file += skip as usize;
                continue;
            }
            let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPieceChar { character: c })?;
            if file >= 8 {
                return Err(FenError::BadRankLength { rank: rank as usize + 1, length: file + 1 });
            }
            pos.place(piece, Square::new(rank, file as u8));
            file += 1;
        }
        if file != 8 {
            return Err(FenError::BadRankLength { rank: rank as usize + 1, length: file });
        }
    }
    Ok(())
}

/// Grant each listed right whose king and rook still stand on their home squares.
fn parse_castling(pos: &Position, field: &str) -> Result<CastleRights, FenError> {
    let bad = || FenError::InvalidCastling { found: field.to_string() };
    if field == "-" {
        return Ok(CastleRights::NONE);
    }
    let mut rights = CastleRights::NONE;
    for c in field.chars() {
        let (color, side) = match c {
            'K' => (Color::White, CastleSide::KingSide),
            'Q' => (Color::White, CastleSide::QueenSide),
            'k' => (Color::Black, CastleSide::KingSide),
            'q' => (Color::Black, CastleSide::QueenSide),
            _ => return Err(bad()),
        };
        let rook = side.rook_origin(color);
        let king_home = Square::new(color.back_rank(), 4);
        let rook_present = pos.colored(color, PieceKind::Rook).contains(rook);
        let king_present = pos.colored(color, PieceKind::King).contains(king_home);
        if rook_present && king_present {
            rights = rights.with(rook);
        }
    }
    Ok(rights)
}

fn parse_counter(field: Option<&str>, name: &'static str, default: u16) -> Result<u16, FenError> {
    match field {
        None => Ok(default),
        Some(text) => text
            .parse()
            .map_err(|_| FenError::InvalidMoveCounter { field: name, found: text.to_string() }),
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }

        let mut pos = Position::default();
        parse_placement(&mut pos, fields[0])?;

        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidColor { found: other.to_string() }),
        };
        if side == Color::Black {
            pos.flip_side();
        }

        let rights = parse_castling(&pos, fields[2])?;
        pos.set_castling(rights);

        let ep = match fields[3] {
            "-" => None,
            text => {
                let expected_rank = if side == Color::White { 5 } else { 2 };
                let sq = Square::from_algebraic(text)
                    .filter(|sq| sq.rank() == expected_rank)
                    .ok_or_else(|| FenError::InvalidEnPassant { found: text.to_string() })?;
                Some(sq)
            }
        };
        pos.set_en_passant(ep);

        pos.halfmove_clock = parse_counter(fields.get(4).copied(), "halfmove clock", 0)?;
        pos.fullmove_number = parse_counter(fields.get(5).copied(), "fullmove number", 1)?.max(1);

        pos.validate()?;
        Ok(pos)
    }
}

/// Formats the position as FEN.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_on(Square::new(rank, file)) {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        write!(f, "{piece}")?;
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                f.write_str("/")?;
            }
        }
        write!(f, " {} {} ", self.side_to_move, self.castling)?;
        match self.en_passant {
            Some(sq) => write!(f, "{sq}")?,
            None => f.write_str("-")?,
        }
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}
