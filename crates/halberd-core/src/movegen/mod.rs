//! Pseudo-legal move generation.
//!
//! Generated moves obey piece movement but may leave the king in check;
//! [`Position::make_move`] reports legality. Generation is split into a noisy
//! stage (captures and promotions) and a quiet stage so the search can try
//! captures before paying for the rest.

mod pawns;
mod pieces;
mod stage;

use crate::attacks::{pawn_attacks, piece_attacks};
use crate::chess_move::{Move, MoveFlag};
use crate::error::MoveParseError;
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;

use self::pawns::gen_pawns;
use self::pieces::{gen_castling, gen_pieces};
use self::stage::{All, Noisy, Quiet, Stage};

/// Upper bound on pseudo-legal moves in any reachable position.
pub const MAX_MOVES: usize = 256;

/// Stack-allocated buffer for generated moves.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList { moves: [Move::NULL; MAX_MOVES], len: 0 }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;
    #[inline]
    fn index(&self, index: usize) -> &Move {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|mv| mv.to_string())).finish()
    }
}

fn generate<S: Stage>(pos: &Position, list: &mut MoveList) {
    gen_pawns::<S>(pos, list);
    gen_pieces::<S>(pos, list);
    if S::QUIET {
        gen_castling(pos, list);
    }
}

/// Append captures, en passant captures and all promotions.
pub fn generate_noisy(pos: &Position, list: &mut MoveList) {
    generate::<Noisy>(pos, list);
}

/// Append everything [`generate_noisy`] leaves out, castling included.
pub fn generate_quiet(pos: &Position, list: &mut MoveList) {
    generate::<Quiet>(pos, list);
}

/// Every pseudo-legal move.
pub fn generate_all(pos: &Position) -> MoveList {
    let mut list = MoveList::new();
    generate::<All>(pos, &mut list);
    list
}

/// Every legal move, found by playing each pseudo-legal move.
pub fn legal_moves(pos: &mut Position) -> MoveList {
    let mut legal = MoveList::new();
    for &mv in generate_all(pos).iter() {
        if pos.make_move(mv) {
            legal.push(mv);
        }
        pos.undo_move(mv);
    }
    legal
}

impl Position {
    /// `true` if `mv` is a move the generator could produce here.
    ///
    /// Used to vet moves that come from outside the current node, such as
    /// hash moves and killers, before they are played.
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        let (from, to, flag) = (mv.from(), mv.to(), mv.flag());
        if mv.is_null() || Move::new(from, to, flag) != mv {
            return false;
        }
        let us = self.side_to_move();
        let Some(piece) = self.piece_on(from).filter(|p| p.color() == us) else {
            return false;
        };
        let target = self.piece_on(to);
        if target.is_some_and(|p| p.color() == us) {
            return false;
        }
        let enemy_on_target = target.is_some_and(|p| p.color() != us && p.kind() != PieceKind::King);
        let is_pawn = piece.kind() == PieceKind::Pawn;
        let last_rank = to.relative_rank(us) == 7;

        match flag {
            MoveFlag::KingCastle | MoveFlag::QueenCastle => {
                if piece.kind() != PieceKind::King {
                    return false;
                }
                let mut castles = MoveList::new();
                gen_castling(self, &mut castles);
                castles.contains(mv)
            }
            MoveFlag::EnPassant => {
                is_pawn
                    && self.en_passant() == Some(to)
                    && pawn_attacks(us, from).contains(to)
                    && self.colored(!us, PieceKind::Pawn).contains(to.backward(us))
            }
            MoveFlag::DoublePush => {
                is_pawn
                    && from.relative_rank(us) == 1
                    && to == from.forward(us).forward(us)
                    && self.piece_on(from.forward(us)).is_none()
                    && target.is_none()
            }
            MoveFlag::Quiet => {
                target.is_none()
                    && if is_pawn {
                        !last_rank && to == from.forward(us)
                    } else {
                        piece_attacks(piece.kind(), from, self.occupied()).contains(to)
                    }
            }
            MoveFlag::Capture => {
                enemy_on_target
                    && if is_pawn {
                        !last_rank && pawn_attacks(us, from).contains(to)
                    } else {
                        piece_attacks(piece.kind(), from, self.occupied()).contains(to)
                    }
            }
            _ if mv.is_capture() => is_pawn && last_rank && enemy_on_target && pawn_attacks(us, from).contains(to),
            _ => is_pawn && last_rank && target.is_none() && to == from.forward(us),
        }
    }
}

impl Position {
    /// Resolve long algebraic notation (`e2e4`, `e7e8q`) against the
    /// pseudo-legal moves of this position. Legality is not checked.
    pub fn parse_uci_move(&self, text: &str) -> Result<Move, MoveParseError> {
        let malformed = || MoveParseError::Malformed { text: text.to_string() };
        if !(4..=5).contains(&text.len()) {
            return Err(malformed());
        }
        let from = text.get(0..2).and_then(Square::from_algebraic).ok_or_else(malformed)?;
        let to = text.get(2..4).and_then(Square::from_algebraic).ok_or_else(malformed)?;
        let promotion = match text.get(4..).ok_or_else(malformed)? {
            "" => None,
            "n" | "N" => Some(PieceKind::Knight),
            "b" | "B" => Some(PieceKind::Bishop),
            "r" | "R" => Some(PieceKind::Rook),
            "q" | "Q" => Some(PieceKind::Queen),
            _ => return Err(malformed()),
        };
        generate_all(self)
            .iter()
            .copied()
            .find(|mv| mv.from() == from && mv.to() == to && mv.promotion_kind() == promotion)
            .ok_or_else(|| MoveParseError::NoSuchMove { text: text.to_string() })
    }
}
