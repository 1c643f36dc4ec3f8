//! Leaper attack tables and the between-squares table, built at compile time.

use crate::bitboard::Bitboard;

const KNIGHT_STEPS: [(i8, i8); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_STEPS: [(i8, i8); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

/// Union of single steps from `sq`, dropping any that leave the board.
const fn step_set(sq: usize, steps: &[(i8, i8)]) -> u64 {
    let rank = (sq / 8) as i8;
    let file = (sq % 8) as i8;
    let mut bits = 0u64;
    let mut i = 0;
    while i < steps.len() {
        let r = rank + steps[i].0;
        let f = file + steps[i].1;
        if r >= 0 && r < 8 && f >= 0 && f < 8 {
            bits |= 1u64 << (r * 8 + f) as u32;
        }
        i += 1;
    }
    bits
}

const fn leaper_table(steps: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        table[sq] = Bitboard::new(step_set(sq, steps));
        sq += 1;
    }
    table
}

const fn pawn_table() -> [[Bitboard; 64]; 2] {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    let mut sq = 0;
    while sq < 64 {
        table[0][sq] = Bitboard::new(step_set(sq, &[(1, -1), (1, 1)]));
        table[1][sq] = Bitboard::new(step_set(sq, &[(-1, -1), (-1, 1)]));
        sq += 1;
    }
    table
}

const fn between_table() -> [[Bitboard; 64]; 64] {
    let mut table = [[Bitboard::EMPTY; 64]; 64];
    let mut a = 0;
    while a < 64 {
        let (ar, af) = ((a / 8) as i8, (a % 8) as i8);
        let mut b = 0;
        while b < 64 {
            let (br, bf) = ((b / 8) as i8, (b % 8) as i8);
            let (dr, df) = (br - ar, bf - af);
            let aligned = a != b && (dr == 0 || df == 0 || dr == df || dr == -df);
            if aligned {
                let (sr, sf) = (dr.signum(), df.signum());
                let (mut r, mut f) = (ar + sr, af + sf);
                let mut bits = 0u64;
                while r != br || f != bf {
                    bits |= 1u64 << (r * 8 + f) as u32;
                    r += sr;
                    f += sf;
                }
                table[a][b] = Bitboard::new(bits);
            }
            b += 1;
        }
        a += 1;
    }
    table
}

pub(crate) static KNIGHT_ATTACKS: [Bitboard; 64] = leaper_table(&KNIGHT_STEPS);
pub(crate) static KING_ATTACKS: [Bitboard; 64] = leaper_table(&KING_STEPS);
/// Indexed by `[Color::index()][Square::index()]`.
pub(crate) static PAWN_ATTACKS: [[Bitboard; 64]; 2] = pawn_table();
pub(crate) static BETWEEN: [[Bitboard; 64]; 64] = between_table();
