//! Search limits and the clock that enforces them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use halberd_core::Color;

/// Time kept back from every move for communication lag.
pub const MOVE_OVERHEAD: Duration = Duration::from_millis(50);

/// Moves assumed to remain when the clock gives no `movestogo`.
pub const DEFAULT_MOVES_TO_GO: u32 = 25;

/// Hard limit as a multiple of the soft limit.
const HARD_RATIO: u32 = 3;

/// Remaining time and increments for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
}

impl Clock {
    /// Remaining time and increment of `side`, if its time is known.
    pub fn for_side(&self, side: Color) -> Option<(Duration, Duration)> {
        let (time, inc) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        time.map(|t| (t, inc.unwrap_or(Duration::ZERO)))
    }
}

/// What bounds one search. No field set means search until stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime: Option<Duration>,
    pub clock: Option<Clock>,
}

impl SearchLimits {
    pub fn depth(depth: u32) -> SearchLimits {
        SearchLimits { depth: Some(depth), ..SearchLimits::default() }
    }

    pub fn nodes(nodes: u64) -> SearchLimits {
        SearchLimits { nodes: Some(nodes), ..SearchLimits::default() }
    }

    pub fn movetime(movetime: Duration) -> SearchLimits {
        SearchLimits { movetime: Some(movetime), ..SearchLimits::default() }
    }

    pub fn infinite() -> SearchLimits {
        SearchLimits::default()
    }
}

/// Soft and hard limits for a move, given the side's clock.
///
/// The overhead reserve is removed first; the soft limit is an even share
/// of what is left plus three quarters of the increment, the hard limit
/// three times that. Neither exceeds the usable time.
pub fn compute_limits(remaining: Duration, increment: Duration, moves_to_go: Option<u32>) -> (Duration, Duration) {
    let one_ms = Duration::from_millis(1);
    let usable = remaining.saturating_sub(MOVE_OVERHEAD).max(one_ms);
    let mtg = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);

    let soft = (usable / mtg + increment * 3 / 4).min(usable);
    let hard = (soft * HARD_RATIO).min(usable);
    (soft.max(one_ms), hard.max(one_ms))
}

/// Clock and budget for one search, shared by every worker.
///
/// The stop flag is raised by `stop()`, by the primary worker when it
/// finishes, and by [`check`](Self::check) once the hard limit or node
/// budget runs out.
#[derive(Debug)]
pub struct TimeManager {
    start: Instant,
    soft: Option<Duration>,
    hard: Option<Duration>,
    nodes: Option<u64>,
    stop: Arc<AtomicBool>,
}

impl TimeManager {
    /// An unlimited manager around `stop`. The flag is lowered.
    pub fn new(stop: Arc<AtomicBool>) -> TimeManager {
        stop.store(false, Ordering::Relaxed);
        TimeManager {
            start: Instant::now(),
            soft: None,
            hard: None,
            nodes: None,
            stop,
        }
    }

    /// Restart the clock and derive the limits for `side` to move.
    ///
    /// A fixed move time wins over the clock.
    pub fn set_limits(&mut self, limits: &SearchLimits, side: Color) {
        self.start = Instant::now();
        self.nodes = limits.nodes;
        (self.soft, self.hard) = if let Some(movetime) = limits.movetime {
            (Some(movetime), Some(movetime))
        } else if let Some((remaining, inc)) = limits.clock.and_then(|c| c.for_side(side)) {
            let movestogo = limits.clock.and_then(|c| c.movestogo);
            let (soft, hard) = compute_limits(remaining, inc, movestogo);
            (Some(soft), Some(hard))
        } else {
            (None, None)
        };
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn soft_limit(&self) -> Option<Duration> {
        self.soft
    }

    pub fn hard_limit(&self) -> Option<Duration> {
        self.hard
    }

    /// Raise the stop flag.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// `true` if the search must abort now. Called every 1024 nodes.
    ///
    /// Exceeding the hard limit or the node budget raises the stop flag so
    /// the other workers see it too.
    pub fn check(&self, nodes: u64) -> bool {
        if self.stopped() {
            return true;
        }
        let out_of_time = self.hard.is_some_and(|hard| self.elapsed() >= hard);
        let out_of_nodes = self.nodes.is_some_and(|limit| nodes >= limit);
        if out_of_time || out_of_nodes {
            self.stop();
            return true;
        }
        false
    }

    /// `true` if no new iteration should start.
    pub fn soft_exceeded(&self) -> bool {
        self.stopped() || self.soft.is_some_and(|soft| self.elapsed() >= soft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TimeManager {
        TimeManager::new(Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn limits_subtract_overhead() {
        let (soft, hard) = compute_limits(Duration::from_millis(2_550), Duration::ZERO, None);
        assert_eq!(soft, Duration::from_millis(100));
        assert_eq!(hard, Duration::from_millis(300));
    }

    #[test]
    fn increment_adds_three_quarters() {
        let (soft, _) = compute_limits(Duration::from_millis(25_050), Duration::from_millis(1_000), None);
        assert_eq!(soft, Duration::from_millis(1_750));
    }

    #[test]
    fn movestogo_one_may_use_everything() {
        let (soft, hard) = compute_limits(Duration::from_millis(1_050), Duration::ZERO, Some(1));
        assert_eq!(soft, Duration::from_millis(1_000));
        assert_eq!(hard, Duration::from_millis(1_000));
    }

    #[test]
    fn nearly_flagged_still_gets_a_millisecond() {
        let (soft, hard) = compute_limits(Duration::from_millis(20), Duration::ZERO, None);
        assert_eq!(soft, Duration::from_millis(1));
        assert_eq!(hard, Duration::from_millis(1));
    }

    #[test]
    fn movetime_sets_both_limits() {
        let mut tm = manager();
        tm.set_limits(&SearchLimits::movetime(Duration::from_millis(500)), Color::White);
        assert_eq!(tm.soft_limit(), Some(Duration::from_millis(500)));
        assert_eq!(tm.hard_limit(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn clock_uses_side_to_move() {
        let clock = Clock {
            wtime: Some(Duration::from_millis(100_050)),
            btime: Some(Duration::from_millis(2_550)),
            ..Clock::default()
        };
        let limits = SearchLimits { clock: Some(clock), ..SearchLimits::default() };
        let mut tm = manager();
        tm.set_limits(&limits, Color::Black);
        assert_eq!(tm.soft_limit(), Some(Duration::from_millis(100)));
        tm.set_limits(&limits, Color::White);
        assert_eq!(tm.soft_limit(), Some(Duration::from_millis(4_000)));
    }

    #[test]
    fn infinite_never_stops_by_itself() {
        let mut tm = manager();
        tm.set_limits(&SearchLimits::infinite(), Color::White);
        assert!(!tm.check(u64::MAX));
        assert!(!tm.soft_exceeded());
        tm.stop();
        assert!(tm.check(0));
        assert!(tm.soft_exceeded());
    }

    #[test]
    fn node_budget_raises_the_stop_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut tm = TimeManager::new(Arc::clone(&flag));
        assert!(!tm.stopped());
        tm.set_limits(&SearchLimits::nodes(1_000), Color::White);
        assert!(!tm.check(999));
        assert!(tm.check(1_000));
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn expired_hard_limit_stops() {
        let mut tm = manager();
        tm.set_limits(&SearchLimits::movetime(Duration::ZERO), Color::White);
        assert!(tm.check(0));
        assert!(tm.soft_exceeded());
    }
}
