//! Knight, slider and king moves, plus castling.

use crate::attacks::{between, piece_attacks};
use crate::castling::CastleSide;
use crate::chess_move::{Move, MoveFlag};
use crate::piece_kind::PieceKind;
use crate::position::Position;

use super::MoveList;
use super::stage::Stage;

const MOVERS: [PieceKind; 5] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

pub(super) fn gen_pieces<S: Stage>(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let occupied = pos.occupied();
    let enemies = pos.side(!us);

    for kind in MOVERS {
        for from in pos.colored(us, kind) {
            let targets = piece_attacks(kind, from, occupied);
            if S::NOISY {
                for to in targets & enemies {
                    list.push(Move::new(from, to, MoveFlag::Capture));
                }
            }
            if S::QUIET {
                for to in targets & !occupied {
                    list.push(Move::new(from, to, MoveFlag::Quiet));
                }
            }
        }
    }
}

/// Castling with an empty path and the king not in check. Whether the
/// king crosses an attacked square is left to `make_move`.
pub(super) fn gen_castling(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let Some(king) = pos.king_square(us) else {
        return;
    };
    if pos.castling().is_empty() || pos.in_check() {
        return;
    }
    for side in CastleSide::ALL {
        if !pos.castling().has(us, side) {
            continue;
        }
        if (between(king, side.rook_origin(us)) & pos.occupied()).is_nonempty() {
            continue;
        }
        let flag = match side {
            CastleSide::KingSide => MoveFlag::KingCastle,
            CastleSide::QueenSide => MoveFlag::QueenCastle,
        };
        list.push(Move::new(king, side.king_target(us), flag));
    }
}
