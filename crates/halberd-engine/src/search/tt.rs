//! Lockless transposition table shared by all search threads.
//!
//! Two `AtomicU64` words per entry (16 bytes).
//!
//! ## Bit layout
//!
//! ```text
//! data (AtomicU64):
//!   bits 63-58: unused
//!   bits 57-56: bound   (2 bits)
//!   bits 55-48: depth   (8 bits)
//!   bits 47-32: eval    (i16 as u16)
//!   bits 31-16: score   (i16 as u16, mate scores relative to the node)
//!   bits 15-0:  move    (16 bits)
//!
//! key (AtomicU64):
//!   full Zobrist hash XOR data
//! ```
//!
//! ## Torn-write detection
//!
//! On probe the hash is recovered as `key ^ data`. A slot half-written by
//! another thread recovers a different hash and reads as a miss, the same as
//! an index collision. All accesses use `Relaxed` ordering.

use std::sync::atomic::{AtomicU64, Ordering};

use halberd_core::Move;

use super::{MATE_BOUND, MAX_PLY};

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<TranspositionTable>();
    }
    let _ = check;
};

/// Largest table the `Hash` option accepts, in megabytes.
pub const MAX_HASH_MB: usize = 65_536;

/// Bound type stored in a TT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// Empty slot.
    None = 0,
    /// The score is exact.
    Exact = 1,
    /// The search failed high; the score is a lower bound.
    Lower = 2,
    /// The search failed low; the score is an upper bound.
    Upper = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Bound {
        match bits & 0x03 {
            1 => Bound::Exact,
            2 => Bound::Lower,
            3 => Bound::Upper,
            _ => Bound::None,
        }
    }
}

/// A verified table hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    /// Best or refutation move, possibly null.
    pub mv: Move,
    /// Score relative to the probing node's ply.
    pub score: i32,
    /// Static evaluation of the position.
    pub eval: i32,
    /// Remaining depth the score was searched to.
    pub depth: i32,
    pub bound: Bound,
}

impl TtEntry {
    /// `true` if the stored bound settles a window of `[alpha, beta]`.
    #[inline]
    pub fn cuts(&self, alpha: i32, beta: i32) -> bool {
        match self.bound {
            Bound::Exact => true,
            Bound::Lower => self.score >= beta,
            Bound::Upper => self.score <= alpha,
            Bound::None => false,
        }
    }
}

/// Convert a search score to its stored form.
///
/// Mate scores count plies from the root; stored they count plies from the
/// node, so a hit found along another path still reports the right distance.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score + ply as i32
    } else if score < -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`].
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score - ply as i32
    } else if score < -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

/// Two 64-bit atomic words forming one slot.
struct AtomicEntry {
    key: AtomicU64,
    data: AtomicU64,
}

impl AtomicEntry {
    const fn new() -> AtomicEntry {
        AtomicEntry {
            key: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }

    fn pack(mv: Move, score: i32, eval: i32, depth: u8, bound: Bound) -> u64 {
        let score = score as i16 as u16 as u64;
        let eval = eval as i16 as u16 as u64;
        (mv.raw() as u64) | (score << 16) | (eval << 32) | ((depth as u64) << 48) | ((bound as u64) << 56)
    }

    fn move_of(data: u64) -> Move {
        Move::from_raw((data & 0xFFFF) as u16)
    }

    /// Data word for `hash`, or `None` on a miss or a torn slot.
    fn load(&self, hash: u64) -> Option<u64> {
        let key = self.key.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        (key ^ data == hash).then_some(data)
    }

    fn store(&self, hash: u64, data: u64) {
        self.key.store(hash ^ data, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
    }

    fn clear(&self) {
        self.key.store(0, Ordering::Relaxed);
        self.data.store(0, Ordering::Relaxed);
    }
}

/// Lockless transposition table with XOR integrity checking.
///
/// Every method except [`resize`](Self::resize) takes `&self`, so the table
/// can sit behind an `Arc` shared by all workers.
pub struct TranspositionTable {
    entries: Box<[AtomicEntry]>,
    /// `entries.len() - 1`; the length is a power of two.
    mask: u64,
}

impl TranspositionTable {
    /// Allocate a table of at most `mb` megabytes.
    ///
    /// The entry count is rounded down to a power of two.
    pub fn new(mb: usize) -> TranspositionTable {
        let entries = Self::entry_count(mb);
        TranspositionTable {
            entries: (0..entries).map(|_| AtomicEntry::new()).collect(),
            mask: (entries - 1) as u64,
        }
    }

    fn entry_count(mb: usize) -> usize {
        let bytes = mb.clamp(1, MAX_HASH_MB) * 1024 * 1024;
        let fits = bytes / std::mem::size_of::<AtomicEntry>();
        // Largest power of two not above `fits`.
        1 << (usize::BITS - 1 - fits.leading_zeros())
    }

    /// Reallocate to `mb` megabytes. All entries are lost.
    pub fn resize(&mut self, mb: usize) {
        *self = TranspositionTable::new(mb);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty every slot.
    pub fn clear(&self) {
        for entry in self.entries.iter() {
            entry.clear();
        }
    }

    #[inline]
    fn slot(&self, hash: u64) -> &AtomicEntry {
        &self.entries[(hash & self.mask) as usize]
    }

    /// Look up `hash` as seen from a node `ply` plies below the root.
    ///
    /// Returns `None` on a miss, a collision, or a torn write.
    pub fn probe(&self, hash: u64, ply: usize) -> Option<TtEntry> {
        let data = self.slot(hash).load(hash)?;
        let bound = Bound::from_bits(data >> 56);
        if bound == Bound::None {
            return None;
        }
        Some(TtEntry {
            mv: AtomicEntry::move_of(data),
            score: score_from_tt((data >> 16) as u16 as i16 as i32, ply),
            eval: (data >> 32) as u16 as i16 as i32,
            depth: ((data >> 48) & 0xFF) as i32,
            bound,
        })
    }

    /// Record a search result.
    ///
    /// The slot is always overwritten. If `mv` is null and the slot already
    /// holds this position, its move is kept.
    #[allow(clippy::too_many_arguments)]
    pub fn store(&self, hash: u64, depth: i32, ply: usize, mv: Move, score: i32, eval: i32, bound: Bound) {
        let slot = self.slot(hash);
        let mv = if mv.is_null() {
            slot.load(hash).map_or(Move::NULL, AtomicEntry::move_of)
        } else {
            mv
        };
        let depth = depth.clamp(0, MAX_PLY as i32) as u8;
        let data = AtomicEntry::pack(mv, score_to_tt(score, ply), eval, depth, bound);
        slot.store(hash, data);
    }

    /// Occupancy in permille, sampled from the first thousand slots.
    pub fn hashfull(&self) -> u32 {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample]
            .iter()
            .filter(|e| Bound::from_bits(e.data.load(Ordering::Relaxed) >> 56) != Bound::None)
            .count();
        (used * 1000 / sample) as u32
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("entries", &self.entries.len())
            .field("hashfull", &self.hashfull())
            .finish()
    }
}
