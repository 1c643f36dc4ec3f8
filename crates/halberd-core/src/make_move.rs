//! Make/unmake on a single mutable position.
//!
//! `make_move` applies any pseudo-legal move and reports whether it was legal;
//! the caller undoes it either way. Everything that cannot be recomputed is
//! kept on the position's history stack.

use tracing::trace;

use crate::castling::CastleSide;
use crate::chess_move::{Move, MoveFlag};
use crate::color::Color;
use crate::error::MoveParseError;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;

fn castle_side(flag: MoveFlag) -> CastleSide {
    if flag == MoveFlag::KingCastle { CastleSide::KingSide } else { CastleSide::QueenSide }
}

impl Position {
    /// Apply a pseudo-legal move.
    ///
    /// Returns `false` if the move leaves the mover's king attacked, or if a
    /// castling king starts on or passes over an attacked square. The move is
    /// applied regardless and must be taken back with [`Position::undo_move`].
    pub fn make_move(&mut self, mv: Move) -> bool {
        let us = self.side_to_move;
        let them = !us;
        let (from, to) = (mv.from(), mv.to());

        self.history.push(self.snapshot());
        let Some(moving) = self.piece_on(from).filter(|p| p.color() == us) else {
            return false;
        };

        let mut transit_safe = true;
        if mv.is_castle() {
            let passed = Square::new(from.rank(), (from.file() + to.file()) / 2);
            transit_safe = !self.is_attacked(from, them) && !self.is_attacked(passed, them);
        }

        self.set_en_passant(None);
        self.halfmove_clock += 1;

        let captured = match mv.flag() {
            MoveFlag::KingCastle | MoveFlag::QueenCastle => {
                let side = castle_side(mv.flag());
                self.relocate(from, to);
                self.relocate(side.rook_origin(us), side.rook_target(us));
                None
            }
            MoveFlag::EnPassant => {
                let captured = self.remove(to.backward(us));
                self.relocate(from, to);
                captured
            }
            flag => {
                let captured = self.remove(to);
                self.remove(from);
                let landing = mv.promotion_kind().map_or(moving, |kind| Piece::new(kind, us));
                self.place(landing, to);
                if flag == MoveFlag::DoublePush {
                    self.set_en_passant(Some(from.forward(us)));
                }
                captured
            }
        };

        if moving.kind() == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        }

        let mut rights = self.castling.without(from.bitboard() | to.bitboard());
        if moving.kind() == PieceKind::King {
            rights = rights.without_color(us);
        }
        if rights != self.castling {
            self.set_castling(rights);
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.flip_side();

        if let Some(last) = self.history.last_mut() {
            last.moved = Some(moving);
            last.captured = captured;
        }

        #[cfg(debug_assertions)]
        self.assert_consistent();

        transit_safe && !self.king_square(us).is_some_and(|k| self.is_attacked(k, them))
    }

    /// Take back `mv`, which must be the move most recently made.
    pub fn undo_move(&mut self, mv: Move) {
        let Some(snap) = self.history.pop() else {
            return;
        };
        if let Some(moved) = snap.moved {
            let us = moved.color();
            let (from, to) = (mv.from(), mv.to());
            match mv.flag() {
                MoveFlag::KingCastle | MoveFlag::QueenCastle => {
                    let side = castle_side(mv.flag());
                    self.relocate(to, from);
                    self.relocate(side.rook_target(us), side.rook_origin(us));
                }
                MoveFlag::EnPassant => {
                    self.relocate(to, from);
                    if let Some(pawn) = snap.captured {
                        self.place(pawn, to.backward(us));
                    }
                }
                _ => {
                    self.remove(to);
                    self.place(moved, from);
                    if let Some(victim) = snap.captured {
                        self.place(victim, to);
                    }
                }
            }
        }
        self.restore(&snap);

        #[cfg(debug_assertions)]
        self.assert_consistent();
    }

    /// Pass the turn. Repetition scans stop at a null move.
    pub fn make_null_move(&mut self) {
        self.history.push(self.snapshot());
        self.set_en_passant(None);
        self.halfmove_clock = 0;
        self.flip_side();
    }

    pub fn undo_null_move(&mut self) {
        if let Some(snap) = self.history.pop() {
            self.restore(&snap);
        }
    }

    /// Parse a move in long algebraic notation and play it.
    ///
    /// The position is unchanged on error.
    pub fn play_uci(&mut self, text: &str) -> Result<Move, MoveParseError> {
        let mv = self.parse_uci_move(text)?;
        if !self.make_move(mv) {
            self.undo_move(mv);
            return Err(MoveParseError::Illegal { text: text.to_string() });
        }
        trace!(%mv, "played");
        Ok(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::generate_all;

    fn play(pos: &mut Position, moves: &[&str]) {
        for text in moves {
            pos.play_uci(text).unwrap();
            pos.assert_consistent();
        }
    }

    #[test]
    fn make_then_undo_restores_everything() {
        let fens = [
            crate::fen::STARTING_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        ];
        for fen in fens {
            let mut pos: Position = fen.parse().unwrap();
            let before = pos.clone();
            for &mv in generate_all(&pos).as_slice() {
                pos.make_move(mv);
                pos.assert_consistent();
                pos.undo_move(mv);
                assert_eq!(pos, before, "{mv:?} in {fen}");
            }
        }
    }

    #[test]
    fn double_push_sets_en_passant() {
        let mut pos = Position::startpos();
        play(&mut pos, &["e2e4"]);
        assert_eq!(pos.en_passant(), Some(Square::E3));
        assert_eq!(pos.side_to_move(), Color::Black);
        play(&mut pos, &["g8f6"]);
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.fullmove_number(), 2);
        assert_eq!(pos.halfmove_clock(), 1);
    }

    #[test]
    fn en_passant_capture_removes_the_pawn() {
        let mut pos = Position::startpos();
        play(&mut pos, &["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"]);
        assert_eq!(pos.piece_on(Square::D5), None);
        assert_eq!(pos.piece_on(Square::D6), Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert_eq!(pos.colored(Color::Black, PieceKind::Pawn).count(), 7);
        assert_eq!(pos.halfmove_clock(), 0);
    }

    #[test]
    fn castling_moves_rook_and_clears_rights() {
        let mut pos: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        play(&mut pos, &["e1g1"]);
        assert_eq!(pos.piece_on(Square::F1), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert_eq!(pos.piece_on(Square::H1), None);
        assert_eq!(pos.castling().to_string(), "kq");
        play(&mut pos, &["e8c8"]);
        assert_eq!(pos.piece_on(Square::D8), Some(Piece::new(PieceKind::Rook, Color::Black)));
        assert_eq!(pos.castling().to_string(), "-");
    }

    #[test]
    fn capturing_a_rook_removes_its_right() {
        let mut pos: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        play(&mut pos, &["a1a8"]);
        assert_eq!(pos.castling().to_string(), "Kk");
    }

    #[test]
    fn castling_through_attack_is_rejected() {
        // The a6 bishop covers f1.
        let mut pos: Position = "4k3/8/b7/8/8/8/8/R3K2R w KQ - 0 1".parse().unwrap();
        assert_eq!(pos.play_uci("e1g1"), Err(MoveParseError::Illegal { text: "e1g1".into() }));
        assert_eq!(pos.to_string(), "4k3/8/b7/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(pos.play_uci("e1c1").is_ok());
    }

    #[test]
    fn promotion_and_undo() {
        let mut pos: Position = "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let before = pos.clone();
        let mv = pos.play_uci("a7b8q").unwrap();
        assert_eq!(pos.piece_on(Square::B8), Some(Piece::new(PieceKind::Queen, Color::White)));
        assert_eq!(pos.phase(), 4);
        pos.undo_move(mv);
        assert_eq!(pos, before);
    }

    #[test]
    fn null_move_round_trip() {
        let mut pos: Position = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1".parse().unwrap();
        let before = pos.clone();
        pos.make_null_move();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.en_passant(), None);
        pos.assert_consistent();
        pos.undo_null_move();
        assert_eq!(pos, before);
    }

    #[test]
    fn bad_move_text_leaves_position_alone() {
        let mut pos = Position::startpos();
        assert!(matches!(pos.play_uci("e2"), Err(MoveParseError::Malformed { .. })));
        assert!(matches!(pos.play_uci("e2e5"), Err(MoveParseError::NoSuchMove { .. })));
        assert_eq!(pos, Position::startpos());
    }
}
