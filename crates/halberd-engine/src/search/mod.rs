//! Iterative deepening NegaScout search.

pub mod heuristics;
pub mod info;
mod negascout;
pub mod picker;
pub mod see;
pub mod tt;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use halberd_core::{Move, Position, legal_moves};

use crate::time::TimeManager;
use info::SearchInfo;
use tt::TranspositionTable;

/// Score of delivering mate on the board.
pub const MATE: i32 = 32_000;
/// Bound outside every reachable score.
pub const INF: i32 = 32_001;
/// Deepest ply the search descends to.
pub const MAX_PLY: usize = 128;
/// Scores beyond this magnitude are mates.
pub const MATE_BOUND: i32 = MATE - MAX_PLY as i32;

/// First depth searched with a narrowed window.
const ASPIRATION_DEPTH: i32 = 5;
const ASPIRATION_DELTA: i32 = 25;
/// Window half-width past which the search falls back to a full window.
const ASPIRATION_MAX: i32 = 1_000;

/// `true` if `score` announces a forced mate for either side.
#[inline]
pub fn is_mate(score: i32) -> bool {
    score.abs() > MATE_BOUND
}

/// Full moves until mate, negative when being mated. `None` for
/// ordinary scores.
pub fn mate_in_moves(score: i32) -> Option<i32> {
    if !is_mate(score) {
        return None;
    }
    let plies = MATE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

/// The search ran out of time or was told to stop. Unwinds the recursion
/// with `?`; the result of the last completed iteration stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move of the deepest completed iteration. Null only when the
    /// root has no legal move.
    pub best_move: Move,
    pub pv: Vec<Move>,
    /// Score from the side to move's point of view.
    pub score: i32,
    /// Deepest completed iteration.
    pub depth: u32,
    pub nodes: u64,
}

impl SearchResult {
    fn empty() -> SearchResult {
        SearchResult {
            best_move: Move::NULL,
            pv: Vec::new(),
            score: 0,
            depth: 0,
            nodes: 0,
        }
    }
}

/// Progress after each completed iteration of the primary worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationReport {
    pub depth: u32,
    pub seldepth: u32,
    pub score: i32,
    /// Nodes searched by all workers so far.
    pub nodes: u64,
    pub elapsed: Duration,
    /// Table occupancy in permille.
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

/// One worker's search over its own copy of the position.
pub struct Search<'a> {
    pos: Position,
    info: &'a mut SearchInfo,
    tt: &'a TranspositionTable,
    time: &'a TimeManager,
    /// Published node counts of every worker, indexed by worker id.
    counters: &'a [AtomicU64],
    id: usize,
}

impl<'a> Search<'a> {
    /// A single, stand-alone search.
    pub fn new(pos: Position, info: &'a mut SearchInfo, tt: &'a TranspositionTable, time: &'a TimeManager) -> Search<'a> {
        Search {
            pos,
            info,
            tt,
            time,
            counters: &[],
            id: 0,
        }
    }

    /// Run as worker `id` of a pool, publishing nodes to `counters[id]`.
    /// Worker 0 is the primary.
    pub fn with_worker(mut self, id: usize, counters: &'a [AtomicU64]) -> Search<'a> {
        self.id = id;
        self.counters = counters;
        self
    }

    fn is_primary(&self) -> bool {
        self.id == 0
    }

    /// Count a node and poll the budget every 1024 nodes. The node limit
    /// applies to the whole pool.
    #[inline]
    fn poll(&mut self) -> Result<(), Interrupted> {
        self.info.nodes += 1;
        if self.info.nodes % 1024 == 0 {
            self.publish_nodes();
            if self.time.check(self.total_nodes()) {
                return Err(Interrupted);
            }
        }
        Ok(())
    }

    fn publish_nodes(&self) {
        if let Some(counter) = self.counters.get(self.id) {
            counter.store(self.info.nodes, Ordering::Relaxed);
        }
    }

    fn total_nodes(&self) -> u64 {
        let others: u64 = self
            .counters
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.id)
            .map(|(_, c)| c.load(Ordering::Relaxed))
            .sum();
        others + self.info.nodes
    }

    /// Iteratively deepen up to `max_depth`, calling `report` after each
    /// completed iteration of the primary worker.
    ///
    /// Helpers start one or two plies deep so the pool does not search the
    /// same depth in lockstep.
    pub fn run(&mut self, max_depth: u32, report: &mut dyn FnMut(&IterationReport)) -> SearchResult {
        self.info.reset_for_search();
        let max_depth = max_depth.clamp(1, MAX_PLY as u32 - 1);
        let start_depth = (1 + (self.id % 2) as u32).min(max_depth);
        if let Some(result) = self.drawn_root(report) {
            return result;
        }
        let mut result = SearchResult::empty();

        for depth in start_depth..=max_depth {
            if depth > start_depth && self.time.soft_exceeded() {
                break;
            }
            self.info.seldepth = 0;
            let Ok(score) = self.aspiration(depth as i32, self.info.score) else {
                break;
            };
            self.info.score = score;
            let pv = self.info.pv.root().to_vec();
            result = SearchResult {
                best_move: pv.first().copied().unwrap_or(Move::NULL),
                pv,
                score,
                depth,
                nodes: self.info.nodes,
            };
            debug!(worker = self.id, depth, score, nodes = self.info.nodes, "iteration complete");

            if self.is_primary() {
                report(&IterationReport {
                    depth,
                    seldepth: self.info.seldepth as u32,
                    score,
                    nodes: self.total_nodes(),
                    elapsed: self.time.elapsed(),
                    hashfull: self.tt.hashfull(),
                    pv: result.pv.clone(),
                });
            }
        }

        self.publish_nodes();
        if result.best_move.is_null() {
            // Stopped before the first iteration finished.
            if let Some(&mv) = legal_moves(&mut self.pos).iter().next() {
                result.best_move = mv;
                result.pv = vec![mv];
            }
        }
        result.nodes = self.info.nodes;
        result
    }

    /// A root already drawn by the fifty-move rule, threefold repetition or
    /// dead material scores 0 without searching. Any legal move is returned;
    /// a mated root is left to the search.
    fn drawn_root(&mut self, report: &mut dyn FnMut(&IterationReport)) -> Option<SearchResult> {
        if !self.pos.is_draw(0) {
            return None;
        }
        let mv = legal_moves(&mut self.pos).iter().next().copied()?;
        self.info.nodes += 1;
        self.publish_nodes();
        debug!(worker = self.id, "root position is drawn");
        let result = SearchResult {
            best_move: mv,
            pv: vec![mv],
            score: 0,
            depth: 1,
            nodes: self.info.nodes,
        };
        if self.is_primary() {
            report(&IterationReport {
                depth: 1,
                seldepth: 0,
                score: 0,
                nodes: self.total_nodes(),
                elapsed: self.time.elapsed(),
                hashfull: self.tt.hashfull(),
                pv: result.pv.clone(),
            });
        }
        Some(result)
    }

    /// Search the root with a window around `previous`, widening on failure.
    fn aspiration(&mut self, depth: i32, previous: i32) -> Result<i32, Interrupted> {
        let mut delta = ASPIRATION_DELTA;
        let (mut alpha, mut beta) = if depth >= ASPIRATION_DEPTH {
            ((previous - delta).max(-INF), (previous + delta).min(INF))
        } else {
            (-INF, INF)
        };

        loop {
            let score = self.negascout(alpha, beta, depth, 0)?;
            if score <= alpha && alpha > -INF {
                alpha = (score - delta).max(-INF);
            } else if score >= beta && beta < INF {
                beta = (score + delta).min(INF);
            } else {
                return Ok(score);
            }
            delta *= 2;
            if delta > ASPIRATION_MAX {
                alpha = -INF;
                beta = INF;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::time::SearchLimits;
    use halberd_core::Color;

    fn search_depth(pos: &Position, depth: u32) -> SearchResult {
        let tt = TranspositionTable::new(1);
        let time = TimeManager::new(Arc::new(AtomicBool::new(false)));
        let mut info = SearchInfo::new();
        Search::new(pos.clone(), &mut info, &tt, &time).run(depth, &mut |_| {})
    }

    #[test]
    fn depth_1_returns_legal_move() {
        let mut pos = Position::startpos();
        let result = search_depth(&pos, 1);
        assert!(legal_moves(&mut pos).contains(result.best_move));
        assert_eq!(result.depth, 1);
        assert_eq!(result.pv.first(), Some(&result.best_move));
    }

    #[test]
    fn finds_mate_in_one() {
        let pos: Position = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4".parse().unwrap();
        let result = search_depth(&pos, 4);
        assert_eq!(result.best_move.to_uci(), "h5f7");
        assert_eq!(result.score, MATE - 1);
        assert_eq!(mate_in_moves(result.score), Some(1));
    }

    #[test]
    fn stalemate_scores_zero_without_a_move() {
        let pos: Position = "k7/2K5/1Q6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let result = search_depth(&pos, 3);
        assert_eq!(result.score, 0);
        assert!(result.best_move.is_null());
    }

    #[test]
    fn checkmated_root_scores_mate() {
        let pos: Position = "7k/6Q1/5K2/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let result = search_depth(&pos, 3);
        assert_eq!(result.score, -MATE);
        assert!(result.best_move.is_null());
        assert_eq!(mate_in_moves(result.score), Some(0));
    }

    #[test]
    fn reports_every_completed_depth() {
        let tt = TranspositionTable::new(1);
        let time = TimeManager::new(Arc::new(AtomicBool::new(false)));
        let mut info = SearchInfo::new();
        let mut depths = Vec::new();
        let result = Search::new(Position::startpos(), &mut info, &tt, &time).run(4, &mut |report| {
            assert!(!report.pv.is_empty());
            assert!(report.pv.iter().all(|mv| !mv.is_null()));
            depths.push(report.depth);
        });
        assert_eq!(depths, vec![1, 2, 3, 4]);
        assert!(result.pv.len() >= 2);
    }

    #[test]
    fn pv_is_a_legal_line() {
        let pos: Position = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1".parse().unwrap();
        let result = search_depth(&pos, 5);
        let mut line = pos.clone();
        for mv in &result.pv {
            line.play_uci(&mv.to_uci()).unwrap();
        }
    }

    #[test]
    fn single_thread_search_is_deterministic() {
        let pos: Position = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3".parse().unwrap();
        let first = search_depth(&pos, 6);
        let second = search_depth(&pos, 6);
        assert_eq!(first, second);
    }

    #[test]
    fn stopped_search_still_returns_a_move() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut time = TimeManager::new(Arc::clone(&flag));
        time.set_limits(&SearchLimits::infinite(), Color::White);
        time.stop();
        let tt = TranspositionTable::new(1);
        let mut info = SearchInfo::new();
        let mut pos = Position::startpos();
        let result = Search::new(pos.clone(), &mut info, &tt, &time).run(64, &mut |_| {});
        assert!(legal_moves(&mut pos).contains(result.best_move));
        assert!(result.depth <= 1);
    }

    #[test]
    fn node_budget_ends_the_search() {
        let time = {
            let mut time = TimeManager::new(Arc::new(AtomicBool::new(false)));
            time.set_limits(&SearchLimits::nodes(5_000), Color::White);
            time
        };
        let tt = TranspositionTable::new(1);
        let mut info = SearchInfo::new();
        let result = Search::new(Position::startpos(), &mut info, &tt, &time).run(64, &mut |_| {});
        assert!(result.nodes <= 5_120);
        assert!(!result.best_move.is_null());
    }

    #[test]
    fn fifty_move_root_is_a_draw() {
        let mut pos: Position = "4k3/8/8/8/8/8/r7/R3K3 w - - 100 80".parse().unwrap();
        let tt = TranspositionTable::new(1);
        let time = TimeManager::new(Arc::new(AtomicBool::new(false)));
        let mut info = SearchInfo::new();
        let mut reports = Vec::new();
        let result = Search::new(pos.clone(), &mut info, &tt, &time).run(6, &mut |report| reports.push(report.clone()));
        assert_eq!(result.score, 0);
        assert!(legal_moves(&mut pos).contains(result.best_move));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].score, 0);
        assert_eq!(reports[0].pv, vec![result.best_move]);
    }

    #[test]
    fn threefold_root_is_a_draw() {
        let mut pos = Position::startpos();
        for mv in ["g1f3", "g8f6", "f3g1", "f6g8"].iter().cycle().take(8) {
            pos.play_uci(mv).unwrap();
        }
        assert!(pos.is_draw(0));
        let result = search_depth(&pos, 5);
        assert_eq!(result.score, 0);
        assert!(legal_moves(&mut pos).contains(result.best_move));
    }

    #[test]
    fn mated_root_at_fifty_moves_is_still_mate() {
        let pos: Position = "7k/6Q1/5K2/8/8/8/8/8 b - - 100 90".parse().unwrap();
        let result = search_depth(&pos, 3);
        assert_eq!(result.score, -MATE);
        assert!(result.best_move.is_null());
    }

    #[test]
    fn node_budget_counts_every_worker() {
        let counters: Vec<AtomicU64> = (0..2).map(|_| AtomicU64::new(0)).collect();
        counters[1].store(4_096, Ordering::Relaxed);
        let time = {
            let mut time = TimeManager::new(Arc::new(AtomicBool::new(false)));
            time.set_limits(&SearchLimits::nodes(5_000), Color::White);
            time
        };
        let tt = TranspositionTable::new(1);
        let mut info = SearchInfo::new();
        let result = Search::new(Position::startpos(), &mut info, &tt, &time)
            .with_worker(0, &counters)
            .run(64, &mut |_| {});
        // The other worker's published nodes leave room for about 900 more.
        assert!(result.nodes <= 1_024, "{} nodes", result.nodes);
        assert!(time.stopped());
    }

    #[test]
    fn mate_scores_convert_to_moves() {
        assert_eq!(mate_in_moves(MATE - 1), Some(1));
        assert_eq!(mate_in_moves(MATE - 3), Some(2));
        assert_eq!(mate_in_moves(-(MATE - 2)), Some(-1));
        assert_eq!(mate_in_moves(250), None);
    }
}
