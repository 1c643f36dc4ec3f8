//! Quiet move ordering tables: killers, butterfly history, countermoves and
//! continuation history.
//!
//! All tables belong to one worker. Killers are reset every search; the rest
//! persist until a new game.

use halberd_core::{Color, Move, Piece, Position, Square};

use super::MAX_PLY;

/// Magnitude every history entry stays within.
pub const HISTORY_MAX: i32 = 16_384;

/// History bonus (or malus) for a cutoff at `depth`.
#[inline]
pub fn history_bonus(depth: i32) -> i32 {
    (depth * depth).min(HISTORY_MAX)
}

/// Move an entry towards `±HISTORY_MAX` by `bonus`, slowing as it nears
/// the bound.
#[inline]
fn apply_gravity(entry: &mut i32, bonus: i32) {
    let bonus = bonus.clamp(-HISTORY_MAX, HISTORY_MAX);
    *entry += bonus - *entry * bonus.abs() / HISTORY_MAX;
}

/// Two killer moves per ply: quiet moves that caused beta cutoffs.
pub struct KillerTable {
    slots: [[Move; 2]; MAX_PLY + 1],
}

impl KillerTable {
    pub fn new() -> KillerTable {
        KillerTable { slots: [[Move::NULL; 2]; MAX_PLY + 1] }
    }

    /// Record `mv` as the newest killer at `ply`, shifting the old first
    /// killer to the second slot unless it is the same move.
    pub fn store(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.slots.get_mut(ply) else {
            return;
        };
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }

    pub fn get(&self, ply: usize) -> [Move; 2] {
        self.slots.get(ply).copied().unwrap_or([Move::NULL; 2])
    }

    pub fn clear(&mut self) {
        self.slots = [[Move::NULL; 2]; MAX_PLY + 1];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Butterfly history indexed by `[colour][from][to]`.
pub struct HistoryTable {
    table: [[[i32; Square::COUNT]; Square::COUNT]; Color::COUNT],
}

impl HistoryTable {
    pub fn new() -> HistoryTable {
        HistoryTable { table: [[[0; Square::COUNT]; Square::COUNT]; Color::COUNT] }
    }

    #[inline]
    pub fn score(&self, color: Color, mv: Move) -> i32 {
        self.table[color.index()][mv.from().index()][mv.to().index()]
    }

    /// Add `bonus` (negative to penalise) with gravity.
    pub fn update(&mut self, color: Color, mv: Move, bonus: i32) {
        apply_gravity(&mut self.table[color.index()][mv.from().index()][mv.to().index()], bonus);
    }

    pub fn clear(&mut self) {
        self.table = [[[0; Square::COUNT]; Square::COUNT]; Color::COUNT];
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The quiet reply that last refuted each `(from, to)` move.
pub struct CounterMoveTable {
    table: [[Move; Square::COUNT]; Square::COUNT],
}

impl CounterMoveTable {
    pub fn new() -> CounterMoveTable {
        CounterMoveTable { table: [[Move::NULL; Square::COUNT]; Square::COUNT] }
    }

    /// Counter to `previous`, null if none is known.
    #[inline]
    pub fn get(&self, previous: Move) -> Move {
        if previous.is_null() {
            return Move::NULL;
        }
        self.table[previous.from().index()][previous.to().index()]
    }

    pub fn set(&mut self, previous: Move, reply: Move) {
        if !previous.is_null() {
            self.table[previous.from().index()][previous.to().index()] = reply;
        }
    }

    pub fn clear(&mut self) {
        self.table = [[Move::NULL; Square::COUNT]; Square::COUNT];
    }
}

impl Default for CounterMoveTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A move as seen by continuation history: the piece that moved and where
/// it landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationKey {
    pub piece: Piece,
    pub to: Square,
}

impl ContinuationKey {
    #[inline]
    fn index(self) -> usize {
        self.piece.index() * Square::COUNT + self.to.index()
    }
}

const CONT_SIDE: usize = Piece::COUNT * Square::COUNT;

/// History of a move given the move played one or two plies earlier, indexed
/// by `[previous piece][previous to][piece][to]`.
///
/// Both distances share the table.
pub struct ContinuationHistory {
    table: Box<[i32]>,
}

impl ContinuationHistory {
    pub fn new() -> ContinuationHistory {
        ContinuationHistory { table: vec![0; CONT_SIDE * CONT_SIDE].into_boxed_slice() }
    }

    #[inline]
    pub fn score(&self, previous: ContinuationKey, current: ContinuationKey) -> i32 {
        self.table[previous.index() * CONT_SIDE + current.index()]
    }

    pub fn update(&mut self, previous: ContinuationKey, current: ContinuationKey, bonus: i32) {
        apply_gravity(&mut self.table[previous.index() * CONT_SIDE + current.index()], bonus);
    }

    pub fn clear(&mut self) {
        self.table.fill(0);
    }
}

impl Default for ContinuationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Score added to a quiet move that answers the previous move's countermove.
pub const COUNTER_MOVE_BONUS: i32 = 4_096;

/// Every quiet ordering table a worker owns.
#[derive(Default)]
pub struct Heuristics {
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub counters: CounterMoveTable,
    pub continuation: ContinuationHistory,
}

impl Heuristics {
    /// Ordering score of the quiet move `mv` by `piece`.
    ///
    /// `counter` is the countermove to the previous move and `context` the
    /// moves one and two plies back, where known.
    pub fn quiet_score(
        &self,
        color: Color,
        mv: Move,
        piece: Piece,
        counter: Move,
        context: &[Option<ContinuationKey>; 2],
    ) -> i32 {
        let current = ContinuationKey { piece, to: mv.to() };
        let mut score = self.history.score(color, mv);
        if mv == counter {
            score += COUNTER_MOVE_BONUS;
        }
        for previous in context.iter().flatten() {
            score += self.continuation.score(*previous, current);
        }
        score
    }

    /// Reward `best` after it caused a cutoff in `pos` and penalise the
    /// quiets tried before it. `tried` may include `best`.
    #[allow(clippy::too_many_arguments)]
    pub fn update_quiets(
        &mut self,
        pos: &Position,
        ply: usize,
        depth: i32,
        best: Move,
        tried: &[Move],
        previous: Move,
        context: &[Option<ContinuationKey>; 2],
    ) {
        let bonus = history_bonus(depth);

        self.killers.store(ply, best);
        self.counters.set(previous, best);

        self.update_quiet(pos, best, bonus, context);
        for &mv in tried.iter().filter(|&&mv| mv != best) {
            self.update_quiet(pos, mv, -bonus, context);
        }
    }

    fn update_quiet(&mut self, pos: &Position, mv: Move, delta: i32, context: &[Option<ContinuationKey>; 2]) {
        self.history.update(pos.side_to_move(), mv, delta);
        let Some(piece) = pos.piece_on(mv.from()) else {
            return;
        };
        let current = ContinuationKey { piece, to: mv.to() };
        for prev in context.iter().flatten() {
            self.continuation.update(*prev, current, delta);
        }
    }

    /// Forget everything learned, as at the start of a new game.
    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
        self.counters.clear();
        self.continuation.clear();
    }
}
