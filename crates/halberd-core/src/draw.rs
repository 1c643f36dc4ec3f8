//! Draw detection: fifty-move rule, repetition and dead material.

use crate::bitboard::Bitboard;
use crate::piece_kind::PieceKind;
use crate::position::Position;

impl Position {
    /// `true` if the current position occurred before.
    ///
    /// A single earlier occurrence inside the search (fewer than `ply` plies
    /// back) counts; positions from the game record need two, making a
    /// threefold repetition. The scan stops at the last irreversible move.
    pub fn is_repetition(&self, ply: usize) -> bool {
        let len = self.history.len();
        let reach = (self.halfmove_clock as usize).min(len);
        let mut seen = 0;
        for distance in (4..=reach).step_by(2) {
            if self.history[len - distance].hash != self.hash {
                continue;
            }
            if distance <= ply {
                return true;
            }
            seen += 1;
            if seen >= 2 {
                return true;
            }
        }
        false
    }

    /// `true` when neither side can possibly mate: bare kings, a single minor
    /// piece, or bishops that all stand on one square colour.
    pub fn has_insufficient_material(&self) -> bool {
        let heavy = self.pieces(PieceKind::Pawn) | self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        if heavy.is_nonempty() {
            return false;
        }
        let knights = self.pieces(PieceKind::Knight);
        let bishops = self.pieces(PieceKind::Bishop);
        if (knights | bishops).count() <= 1 {
            return true;
        }
        knights.is_empty()
            && ((bishops & Bitboard::LIGHT_SQUARES).is_empty() || (bishops & !Bitboard::LIGHT_SQUARES).is_empty())
    }

    /// Fifty-move rule, dead material or repetition (see [`Position::is_repetition`]).
    pub fn is_draw(&self, ply: usize) -> bool {
        self.halfmove_clock >= 100 || self.has_insufficient_material() || self.is_repetition(ply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHUFFLE: [&str; 4] = ["g1f3", "g8f6", "f3g1", "f6g8"];

    #[test]
    fn threefold_needs_two_earlier_occurrences() {
        let mut pos = Position::startpos();
        for mv in SHUFFLE {
            pos.play_uci(mv).unwrap();
        }
        assert!(!pos.is_repetition(0));
        assert!(pos.is_repetition(4));
        for mv in SHUFFLE {
            pos.play_uci(mv).unwrap();
        }
        assert!(pos.is_repetition(0));
        assert!(pos.is_draw(0));
    }

    #[test]
    fn pawn_move_cuts_the_scan() {
        let mut pos = Position::startpos();
        for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "e2e3", "e7e6"] {
            pos.play_uci(mv).unwrap();
        }
        for mv in SHUFFLE {
            pos.play_uci(mv).unwrap();
        }
        assert!(pos.is_repetition(4));
        assert!(!pos.is_repetition(0));
    }

    #[test]
    fn fifty_move_rule() {
        let pos: Position = "4k3/8/8/8/8/8/4R3/4K3 w - - 100 80".parse().unwrap();
        assert!(pos.is_draw(0));
        let pos: Position = "4k3/8/8/8/8/8/4R3/4K3 w - - 99 80".parse().unwrap();
        assert!(!pos.is_draw(0));
    }

    #[test]
    fn dead_material() {
        let dead = [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KN2 w - - 0 1",
            "4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1",
        ];
        for fen in dead {
            let pos: Position = fen.parse().unwrap();
            assert!(pos.has_insufficient_material(), "{fen}");
        }
        let alive = [
            "4k3/8/8/8/8/8/8/3NKN2 w - - 0 1",
            "4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1",
            "4k3/8/8/8/8/8/P7/4K3 w - - 0 1",
        ];
        for fen in alive {
            let pos: Position = fen.parse().unwrap();
            assert!(!pos.has_insufficient_material(), "{fen}");
        }
    }
}
