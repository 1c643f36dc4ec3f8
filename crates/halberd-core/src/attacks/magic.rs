//! Magic-indexed sliding attack tables.
//!
//! Every subset of a square's relevant-occupancy mask is hashed by
//! `((occ & mask) * magic) >> shift` into a dense per-square slice of one
//! shared table. Tables are built once on first use.

use std::sync::OnceLock;

use tracing::debug;

use crate::bitboard::Bitboard;

use super::magic_data::{BISHOP_MAGICS, ROOK_MAGICS};

type Rays = [(i8, i8); 4];

const ROOK_DIRS: Rays = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: Rays = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[inline]
fn on_board(r: i8, f: i8) -> bool {
    (0..8).contains(&r) && (0..8).contains(&f)
}

/// Cast rays from `sq`, stopping at (and including) the first occupied square.
fn ray_attacks(sq: usize, occupied: u64, dirs: &Rays) -> u64 {
    let (rank, file) = ((sq / 8) as i8, (sq % 8) as i8);
    let mut attacks = 0u64;
    for &(dr, df) in dirs {
        let (mut r, mut f) = (rank + dr, file + df);
        while on_board(r, f) {
            let bit = 1u64 << (r * 8 + f) as u32;
            attacks |= bit;
            if occupied & bit != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

/// Brute-force rook attacks; the reference the magic table is built from.
#[cfg(test)]
pub(crate) fn rook_attacks_slow(sq: usize, occupied: u64) -> u64 {
    ray_attacks(sq, occupied, &ROOK_DIRS)
}

#[cfg(test)]
pub(crate) fn bishop_attacks_slow(sq: usize, occupied: u64) -> u64 {
    ray_attacks(sq, occupied, &BISHOP_DIRS)
}

/// Squares whose occupancy can change the attack set: the empty-board rays
/// without the final square of each ray.
fn relevant_mask(sq: usize, dirs: &Rays) -> u64 {
    let (rank, file) = ((sq / 8) as i8, (sq % 8) as i8);
    let mut mask = 0u64;
    for &(dr, df) in dirs {
        let (mut r, mut f) = (rank + dr, file + df);
        while on_board(r + dr, f + df) {
            mask |= 1u64 << (r * 8 + f) as u32;
            r += dr;
            f += df;
        }
    }
    mask
}

/// Every subset of `mask` via the carry-rippler trick, starting with the empty set.
pub(crate) fn subsets(mask: u64) -> impl Iterator<Item = u64> {
    let mut next = Some(0u64);
    std::iter::from_fn(move || {
        let current = next?;
        let following = current.wrapping_sub(mask) & mask;
        next = (following != 0).then_some(following);
        Some(current)
    })
}

#[derive(Debug, Clone, Copy)]
struct Magic {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline(always)]
    fn slot(&self, occupied: u64) -> usize {
        ((occupied & self.mask).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

struct SliderTable {
    magics: [Magic; 64],
    attacks: Vec<Bitboard>,
}

impl SliderTable {
    #[inline(always)]
    fn lookup(&self, sq: usize, occupied: Bitboard) -> Bitboard {
        let m = &self.magics[sq];
        self.attacks[m.offset + m.slot(occupied.inner())]
    }
}

/// Fill one square's slots; `false` on a destructive collision.
fn try_fill(m: &Magic, slots: &mut [Bitboard], filled: &mut [bool], reference: &impl Fn(u64) -> u64) -> bool {
    filled.fill(false);
    for subset in subsets(m.mask) {
        let idx = m.slot(subset);
        let attacks = Bitboard::new(reference(subset));
        if filled[idx] && slots[idx] != attacks {
            return false;
        }
        slots[idx] = attacks;
        filled[idx] = true;
    }
    true
}

/// Search sparse random multipliers until one fills the slots cleanly.
fn find_magic(m: &mut Magic, slots: &mut [Bitboard], filled: &mut [bool], reference: &impl Fn(u64) -> u64, seed: u64) {
    let mut state = seed | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    loop {
        m.magic = next() & next() & next();
        if (m.mask.wrapping_mul(m.magic) >> 56).count_ones() < 6 {
            continue;
        }
        if try_fill(m, slots, filled, reference) {
            return;
        }
    }
}

fn build(stored: &[u64; 64], dirs: &Rays, name: &'static str) -> SliderTable {
    let mut magics = [Magic { mask: 0, magic: 0, shift: 0, offset: 0 }; 64];
    let mut offset = 0;
    for (sq, m) in magics.iter_mut().enumerate() {
        let mask = relevant_mask(sq, dirs);
        let bits = mask.count_ones();
        *m = Magic { mask, magic: stored[sq], shift: 64 - bits, offset };
        offset += 1usize << bits;
    }

    let mut attacks = vec![Bitboard::EMPTY; offset];
    let mut filled = vec![false; 1 << 12];
    for (sq, m) in magics.iter_mut().enumerate() {
        let size = 1usize << (64 - m.shift);
        let slots = &mut attacks[m.offset..m.offset + size];
        let reference = |occ: u64| ray_attacks(sq, occ, dirs);
        if !try_fill(m, slots, &mut filled[..size], &reference) {
            debug!(square = sq, table = name, "stored magic collides, searching a replacement");
            find_magic(m, slots, &mut filled[..size], &reference, m.mask ^ (sq as u64) << 32);
        }
    }
    SliderTable { magics, attacks }
}

static ROOK_TABLE: OnceLock<SliderTable> = OnceLock::new();
static BISHOP_TABLE: OnceLock<SliderTable> = OnceLock::new();

#[inline]
pub(crate) fn rook_lookup(sq: usize, occupied: Bitboard) -> Bitboard {
    ROOK_TABLE
        .get_or_init(|| build(&ROOK_MAGICS, &ROOK_DIRS, "rook"))
        .lookup(sq, occupied)
}

#[inline]
pub(crate) fn bishop_lookup(sq: usize, occupied: Bitboard) -> Bitboard {
    BISHOP_TABLE
        .get_or_init(|| build(&BISHOP_MAGICS, &BISHOP_DIRS, "bishop"))
        .lookup(sq, occupied)
}

/// Relevant-occupancy masks, exposed for exhaustive testing.
#[cfg(test)]
pub(crate) fn rook_mask(sq: usize) -> u64 {
    relevant_mask(sq, &ROOK_DIRS)
}

#[cfg(test)]
pub(crate) fn bishop_mask(sq: usize) -> u64 {
    relevant_mask(sq, &BISHOP_DIRS)
}
