//! Static Exchange Evaluation (SEE).
//!
//! Decides whether the capture sequence started by a move on its target square
//! nets at least a given amount, assuming both sides always recapture with
//! their least valuable attacker and may stop whenever continuing loses.

use halberd_core::attacks::{bishop_attacks, rook_attacks};
use halberd_core::{Bitboard, Move, PieceKind, Position};

/// Exchange values indexed by `PieceKind::index()`. The king never gets
/// captured, so its value only matters as a final recapturer.
const SEE_VALUE: [i32; 6] = [100, 300, 300, 500, 900, 0];

/// Exchange value of a piece kind.
#[inline]
pub fn see_value(kind: PieceKind) -> i32 {
    SEE_VALUE[kind.index()]
}

/// Least valuable piece in `attackers`.
fn least_valuable_attacker(pos: &Position, attackers: Bitboard) -> Option<(PieceKind, Bitboard)> {
    PieceKind::ALL.into_iter().find_map(|kind| {
        let candidates = attackers & pos.pieces(kind);
        candidates.lsb().map(|sq| (kind, sq.bitboard()))
    })
}

/// `true` if playing `mv` wins at least `threshold` centipawns of material
/// once the exchange on its target square has played out.
///
/// Castling, promotions and en passant are not simulated; they pass any
/// threshold that is not positive.
pub fn see_ge(pos: &Position, mv: Move, threshold: i32) -> bool {
    if mv.is_castle() || mv.is_promotion() || mv.is_en_passant() {
        return threshold <= 0;
    }
    let (from, to) = (mv.from(), mv.to());
    let Some(mover) = pos.piece_on(from) else {
        return threshold <= 0;
    };

    let mut swap = pos.piece_on(to).map_or(0, |p| see_value(p.kind())) - threshold;
    if swap < 0 {
        return false;
    }
    swap = see_value(mover.kind()) - swap;
    if swap <= 0 {
        return true;
    }

    let diagonal = pos.pieces(PieceKind::Bishop) | pos.pieces(PieceKind::Queen);
    let straight = pos.pieces(PieceKind::Rook) | pos.pieces(PieceKind::Queen);
    let mut occupied = pos.occupied().without(from).with(to);
    let mut attackers = pos.attackers_to(to, occupied);
    let mut stm = mover.color();
    // 1 while the side that made the first capture is ahead.
    let mut res = 1;

    loop {
        stm = !stm;
        attackers &= occupied;
        let ours = attackers & pos.side(stm);
        let Some((kind, bb)) = least_valuable_attacker(pos, ours) else {
            break;
        };
        res ^= 1;

        if kind == PieceKind::King {
            // Capturing with the king into a defended square is illegal.
            return if (attackers & pos.side(!stm)).is_nonempty() { res == 0 } else { res == 1 };
        }

        swap = see_value(kind) - swap;
        if swap < res {
            break;
        }

        occupied = occupied & !bb;
        if matches!(kind, PieceKind::Pawn | PieceKind::Bishop | PieceKind::Queen) {
            attackers |= bishop_attacks(to, occupied) & diagonal;
        }
        if matches!(kind, PieceKind::Rook | PieceKind::Queen) {
            attackers |= rook_attacks(to, occupied) & straight;
        }
    }
    res == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn see_move(fen: &str, text: &str) -> (Position, Move) {
        let pos: Position = fen.parse().unwrap();
        let mv = pos.parse_uci_move(text).unwrap();
        (pos, mv)
    }

    #[test]
    fn pawn_takes_defended_knight() {
        let (pos, mv) = see_move("4k3/8/4p3/3n4/2P5/8/8/4K3 w - - 0 1", "c4d5");
        assert!(see_ge(&pos, mv, 0));
        assert!(see_ge(&pos, mv, 200));
        assert!(!see_ge(&pos, mv, 201));
    }

    #[test]
    fn knight_takes_defended_pawn() {
        let (pos, mv) = see_move("4k3/8/4p3/3p4/8/2N5/8/4K3 w - - 0 1", "c3d5");
        assert!(!see_ge(&pos, mv, 0));
        assert!(see_ge(&pos, mv, -200));
        assert!(!see_ge(&pos, mv, -199));
    }

    #[test]
    fn undefended_piece_is_free() {
        let (pos, mv) = see_move("4k3/8/8/3r4/8/8/8/3RK3 w - - 0 1", "d1d5");
        assert!(see_ge(&pos, mv, 500));
        assert!(!see_ge(&pos, mv, 501));
    }

    #[test]
    fn xray_attacker_joins_the_exchange() {
        // The d1 rook recaptures through d2 once the first rook has left.
        let (pos, mv) = see_move("4k3/8/4p3/3p4/8/8/3R4/3RK3 w - - 0 1", "d2d5");
        // RxP, PxR, RxP: 100 - 500 + 100.
        assert!(!see_ge(&pos, mv, 0));
        assert!(see_ge(&pos, mv, -300));
        assert!(!see_ge(&pos, mv, -299));
    }

    #[test]
    fn king_cannot_recapture_into_defended_square() {
        let (pos, mv) = see_move("8/8/8/8/8/2k5/3p4/3QK3 w - - 0 1", "d1d2");
        // The black king is the only defender, and the e1 king guards d2.
        assert!(see_ge(&pos, mv, 100));
    }

    #[test]
    fn quiet_move_to_attacked_square_loses_the_piece() {
        let (pos, mv) = see_move("4k3/8/8/2p5/8/3N4/8/4K3 w - - 0 1", "d3b4");
        assert!(!see_ge(&pos, mv, 0));
        assert!(see_ge(&pos, mv, -300));
    }

    #[test]
    fn special_moves_only_pass_non_positive_thresholds() {
        let (pos, mv) = see_move("4k3/P7/8/8/8/8/8/4K3 w - - 0 1", "a7a8q");
        assert!(see_ge(&pos, mv, 0));
        assert!(!see_ge(&pos, mv, 1));
    }
}
