//! The mutable position: mailbox and bitboards kept in lockstep, plus the
//! incremental hash, phase and piece-square totals.

use std::fmt;

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::castling::CastleRights;
use crate::color::Color;
use crate::error::PositionError;
use crate::fen::STARTING_FEN;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::psqt::{Score, psqt_value};
use crate::square::Square;
use crate::zobrist::{self, KEYS};

/// Plies of history reserved up front.
pub const MAX_HISTORY: usize = 1024;

/// State that a move cannot recompute on undo, saved before every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) side_to_move: Color,
    pub(crate) en_passant: Option<Square>,
    pub(crate) castling: CastleRights,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
    pub(crate) hash: u64,
    pub(crate) phase: i32,
    /// Piece that moved; `None` for null moves and rejected input.
    pub(crate) moved: Option<Piece>,
    pub(crate) captured: Option<Piece>,
}

/// A chess position.
///
/// All placement changes go through [`Position::place`] and
/// [`Position::remove`], which update the mailbox, both bitboard views, the
/// Zobrist hash, the phase and the piece-square totals together.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    squares: [Option<Piece>; Square::COUNT],
    pieces: [Bitboard; PieceKind::COUNT],
    colors: [Bitboard; Color::COUNT],
    pub(crate) side_to_move: Color,
    pub(crate) en_passant: Option<Square>,
    pub(crate) castling: CastleRights,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
    pub(crate) hash: u64,
    phase: i32,
    psqt: [Score; Color::COUNT],
    pub(crate) history: Vec<Snapshot>,
}

impl Default for Position {
    /// The empty board, White to move.
    fn default() -> Self {
        Position {
            squares: [None; Square::COUNT],
            pieces: [Bitboard::EMPTY; PieceKind::COUNT],
            colors: [Bitboard::EMPTY; Color::COUNT],
            side_to_move: Color::White,
            en_passant: None,
            castling: CastleRights::NONE,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            phase: 0,
            psqt: [Score::ZERO; Color::COUNT],
            history: Vec::with_capacity(MAX_HISTORY),
        }
    }
}

impl Position {
    /// The standard initial position.
    pub fn startpos() -> Position {
        STARTING_FEN.parse().unwrap_or_default()
    }

    // --- Queries ---

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Pieces of `kind`, both colours.
    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// All pieces of `color`.
    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    #[inline]
    pub fn colored(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()] & self.colors[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Sum of non-pawn phase weights on the board (24 at the start).
    #[inline]
    pub fn phase(&self) -> i32 {
        self.phase
    }

    /// Material plus piece-square total for `color`.
    #[inline]
    pub fn psqt(&self, color: Color) -> Score {
        self.psqt[color.index()]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.colored(color, PieceKind::King).lsb()
    }

    /// `true` if `color` has a knight, bishop, rook or queen.
    #[inline]
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let kings_and_pawns = self.pieces(PieceKind::King) | self.pieces(PieceKind::Pawn);
        (self.side(color) & !kings_and_pawns).is_nonempty()
    }

    // --- Attacks ---

    /// Pieces of either colour attacking `sq` when the board holds `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let rooks = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        let bishops = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);
        (pawn_attacks(Color::White, sq) & self.colored(Color::Black, PieceKind::Pawn))
            | (pawn_attacks(Color::Black, sq) & self.colored(Color::White, PieceKind::Pawn))
            | (knight_attacks(sq) & self.pieces(PieceKind::Knight))
            | (king_attacks(sq) & self.pieces(PieceKind::King))
            | (rook_attacks(sq, occupied) & rooks)
            | (bishop_attacks(sq, occupied) & bishops)
    }

    /// `true` if any piece of `by` attacks `sq`.
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        let them = self.side(by);
        let occupied = self.occupied();
        let rooks = (self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen)) & them;
        let bishops = (self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen)) & them;
        (pawn_attacks(!by, sq) & self.colored(by, PieceKind::Pawn)).is_nonempty()
            || (knight_attacks(sq) & self.colored(by, PieceKind::Knight)).is_nonempty()
            || (king_attacks(sq) & self.colored(by, PieceKind::King)).is_nonempty()
            || (rook_attacks(sq, occupied) & rooks).is_nonempty()
            || (bishop_attacks(sq, occupied) & bishops).is_nonempty()
    }

    /// `true` if the side to move is in check.
    #[inline]
    pub fn in_check(&self) -> bool {
        self.king_square(self.side_to_move)
            .is_some_and(|k| self.is_attacked(k, !self.side_to_move))
    }

    // --- Placement primitives ---

    /// Put `piece` on the empty square `sq`.
    #[inline]
    pub(crate) fn place(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.squares[sq.index()].is_none(), "place on occupied {sq}");
        let bb = sq.bitboard();
        self.squares[sq.index()] = Some(piece);
        self.pieces[piece.kind().index()] |= bb;
        self.colors[piece.color().index()] |= bb;
        self.hash ^= KEYS.piece(piece, sq);
        self.phase += piece.kind().phase_weight();
        self.psqt[piece.color().index()] += psqt_value(piece, sq);
    }

    /// Lift whatever stands on `sq`.
    #[inline]
    pub(crate) fn remove(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.squares[sq.index()].take()?;
        let bb = !sq.bitboard();
        self.pieces[piece.kind().index()] &= bb;
        self.colors[piece.color().index()] &= bb;
        self.hash ^= KEYS.piece(piece, sq);
        self.phase -= piece.kind().phase_weight();
        self.psqt[piece.color().index()] -= psqt_value(piece, sq);
        Some(piece)
    }

    #[inline]
    pub(crate) fn relocate(&mut self, from: Square, to: Square) {
        if let Some(piece) = self.remove(from) {
            self.place(piece, to);
        }
    }

    /// Replace the castling rights, keeping the hash in step.
    #[inline]
    pub(crate) fn set_castling(&mut self, rights: CastleRights) {
        self.hash ^= KEYS.castle_rights(self.castling) ^ KEYS.castle_rights(rights);
        self.castling = rights;
    }

    /// Replace the en passant square, keeping the hash in step.
    #[inline]
    pub(crate) fn set_en_passant(&mut self, sq: Option<Square>) {
        if let Some(old) = self.en_passant {
            self.hash ^= KEYS.ep_file(old);
        }
        if let Some(new) = sq {
            self.hash ^= KEYS.ep_file(new);
        }
        self.en_passant = sq;
    }

    #[inline]
    pub(crate) fn flip_side(&mut self) {
        self.side_to_move = !self.side_to_move;
        self.hash ^= KEYS.black_to_move;
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            side_to_move: self.side_to_move,
            en_passant: self.en_passant,
            castling: self.castling,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
            phase: self.phase,
            moved: None,
            captured: None,
        }
    }

    pub(crate) fn restore(&mut self, snap: &Snapshot) {
        self.side_to_move = snap.side_to_move;
        self.en_passant = snap.en_passant;
        self.castling = snap.castling;
        self.halfmove_clock = snap.halfmove_clock;
        self.fullmove_number = snap.fullmove_number;
        self.hash = snap.hash;
        self.phase = snap.phase;
    }

    // --- Validation ---

    /// Structural checks applied to parsed positions.
    pub(crate) fn validate(&self) -> Result<(), PositionError> {
        for (color, name) in [(Color::White, "white"), (Color::Black, "black")] {
            let count = self.colored(color, PieceKind::King).count();
            if count != 1 {
                return Err(PositionError::InvalidKingCount { color: name, count });
            }
        }
        if (self.pieces(PieceKind::Pawn) & (Bitboard::RANK_1 | Bitboard::RANK_8)).is_nonempty() {
            return Err(PositionError::PawnsOnBackRank);
        }
        let them = !self.side_to_move;
        if self.king_square(them).is_some_and(|k| self.is_attacked(k, self.side_to_move)) {
            return Err(PositionError::OpponentInCheck);
        }
        Ok(())
    }

    /// Recompute every incrementally maintained quantity and compare.
    ///
    /// Panics on mismatch; called after every make/undo in debug builds.
    pub fn assert_consistent(&self) {
        assert!((self.colors[0] & self.colors[1]).is_empty(), "colour boards overlap");
        let mut phase = 0;
        let mut psqt = [Score::ZERO; Color::COUNT];
        for sq in Square::all() {
            match self.squares[sq.index()] {
                Some(piece) => {
                    for kind in PieceKind::ALL {
                        assert_eq!(self.pieces(kind).contains(sq), kind == piece.kind(), "{kind} board at {sq}");
                    }
                    for color in Color::ALL {
                        assert_eq!(self.side(color).contains(sq), color == piece.color(), "{color} board at {sq}");
                    }
                    phase += piece.kind().phase_weight();
                    psqt[piece.color().index()] += psqt_value(piece, sq);
                }
                None => assert!(!self.occupied().contains(sq), "bitboards set on empty {sq}"),
            }
        }
        assert_eq!(self.hash, zobrist::hash_from_scratch(self), "incremental hash drifted");
        assert_eq!(self.phase, phase, "incremental phase drifted");
        assert_eq!(self.psqt, psqt, "incremental psqt drifted");
    }

    /// Multi-line board diagram followed by the FEN and hash.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for rank in (0..8u8).rev() {
            out.push_str(&format!("{}  ", rank + 1));
            for file in 0..8u8 {
                let c = self.piece_on(Square::new(rank, file)).map_or('.', Piece::fen_char);
                out.push(c);
                out.push(if file < 7 { ' ' } else { '\n' });
            }
        }
        out.push_str("   a b c d e f g h\n\n");
        out.push_str(&format!("fen:  {self}\nhash: {:016x}", self.hash));
        out
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{self}\")")
    }
}
