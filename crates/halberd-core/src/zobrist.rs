//! Zobrist keys, generated at compile time from a fixed seed.

use crate::castling::CastleRights;
use crate::color::Color;
use crate::piece::Piece;
use crate::position::Position;
use crate::square::Square;

pub(crate) struct ZobristKeys {
    /// Indexed by `[Piece::index()][Square::index()]`.
    pub(crate) piece_square: [[u64; 64]; Piece::COUNT],
    /// XORed in when Black is to move.
    pub(crate) black_to_move: u64,
    /// Indexed by [`CastleRights::key_index`].
    pub(crate) castling: [u64; 16],
    /// Indexed by en passant file.
    pub(crate) en_passant: [u64; 8],
}

/// SplitMix64 step: returns the output and the advanced state.
const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31), state)
}

impl ZobristKeys {
    const fn generate(seed: u64) -> ZobristKeys {
        let mut state = seed;
        let mut piece_square = [[0u64; 64]; Piece::COUNT];
        let mut p = 0;
        while p < Piece::COUNT {
            let mut sq = 0;
            while sq < 64 {
                let (key, next) = splitmix64(state);
                piece_square[p][sq] = key;
                state = next;
                sq += 1;
            }
            p += 1;
        }

        let (black_to_move, next) = splitmix64(state);
        state = next;

        // The empty set hashes to zero so that positions without castling
        // rights need no castling term at all.
        let mut castling = [0u64; 16];
        let mut i = 1;
        while i < 16 {
            let (key, next) = splitmix64(state);
            castling[i] = key;
            state = next;
            i += 1;
        }

        let mut en_passant = [0u64; 8];
        let mut f = 0;
        while f < 8 {
            let (key, next) = splitmix64(state);
            en_passant[f] = key;
            state = next;
            f += 1;
        }

        ZobristKeys { piece_square, black_to_move, castling, en_passant }
    }

    #[inline]
    pub(crate) fn piece(&self, piece: Piece, sq: Square) -> u64 {
        self.piece_square[piece.index()][sq.index()]
    }

    #[inline]
    pub(crate) fn castle_rights(&self, rights: CastleRights) -> u64 {
        self.castling[rights.key_index()]
    }

    #[inline]
    pub(crate) fn ep_file(&self, sq: Square) -> u64 {
        self.en_passant[sq.file() as usize]
    }
}

pub(crate) static KEYS: ZobristKeys = ZobristKeys::generate(0x6861_6c62_6572_6421);

/// Hash `pos` from its placement, side, castling rights and en passant square.
pub fn hash_from_scratch(pos: &Position) -> u64 {
    let mut hash = 0;
    for sq in pos.occupied() {
        if let Some(piece) = pos.piece_on(sq) {
            hash ^= KEYS.piece(piece, sq);
        }
    }
    if pos.side_to_move() == Color::Black {
        hash ^= KEYS.black_to_move;
    }
    hash ^= KEYS.castle_rights(pos.castling());
    if let Some(ep) = pos.en_passant() {
        hash ^= KEYS.ep_file(ep);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct() {
        let mut all: Vec<u64> = KEYS.piece_square.iter().flatten().copied().collect();
        all.push(KEYS.black_to_move);
        all.extend_from_slice(&KEYS.castling[1..]);
        all.extend_from_slice(&KEYS.en_passant);
        let n = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), n);
        assert!(all.iter().all(|&k| k != 0));
    }

    #[test]
    fn side_to_move_changes_hash() {
        let white: Position = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let black: Position = "4k3/8/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        assert_eq!(white.hash() ^ black.hash(), KEYS.black_to_move);
    }

    #[test]
    fn parsed_hash_matches_scratch() {
        let pos = Position::startpos();
        assert_eq!(pos.hash(), hash_from_scratch(&pos));
    }
}
