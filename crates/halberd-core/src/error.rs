//! Error types for FEN parsing, position validation and move text parsing.

/// Errors produced while parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// Fewer than 4 or more than 6 whitespace-separated fields.
    #[error("expected 4 to 6 FEN fields, found {found}")]
    WrongFieldCount { found: usize },

    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount { found: usize },

    /// A rank describes more or fewer than 8 squares.
    #[error("rank {rank} describes {length} squares, expected 8")]
    BadRankLength { rank: usize, length: usize },

    #[error("invalid piece character: '{character}'")]
    InvalidPieceChar { character: char },

    #[error("invalid active color: \"{found}\"")]
    InvalidColor { found: String },

    /// A castling letter is unknown or names a corner without a rook.
    #[error("invalid castling field: \"{found}\"")]
    InvalidCastling { found: String },

    #[error("invalid en passant square: \"{found}\"")]
    InvalidEnPassant { found: String },

    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter { field: &'static str, found: String },

    #[error("invalid position: {source}")]
    InvalidPosition {
        #[from]
        source: PositionError,
    },
}

/// Structural problems in an otherwise well-formed position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("expected 1 king for {color}, found {count}")]
    InvalidKingCount { color: &'static str, count: u32 },

    #[error("pawns found on back rank")]
    PawnsOnBackRank,

    /// The side that just moved is still in check.
    #[error("side not to move is in check")]
    OpponentInCheck,
}

/// Errors produced when turning move text into a [`Move`](crate::Move).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveParseError {
    #[error("malformed move text: \"{text}\"")]
    Malformed { text: String },

    /// Well-formed, but no pseudo-legal move matches.
    #[error("no such move in this position: \"{text}\"")]
    NoSuchMove { text: String },

    /// Matches a pseudo-legal move that leaves the king in check.
    #[error("illegal move: \"{text}\"")]
    Illegal { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_error_display() {
        let err = FenError::WrongFieldCount { found: 2 };
        assert_eq!(err.to_string(), "expected 4 to 6 FEN fields, found 2");
    }

    #[test]
    fn position_error_converts() {
        let err: FenError = PositionError::PawnsOnBackRank.into();
        assert!(matches!(err, FenError::InvalidPosition { .. }));
        assert_eq!(err.to_string(), "invalid position: pawns found on back rank");
    }

    #[test]
    fn move_error_display() {
        let err = MoveParseError::Illegal { text: "e1g1".into() };
        assert_eq!(err.to_string(), "illegal move: \"e1g1\"");
    }
}
