//! Integration tests for the `Engine` facade: positions, options, draws and
//! callbacks.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use halberd_core::{MoveParseError, Position};
use halberd_engine::{Engine, EngineError, EngineOptions, IterationReport, MATE, SearchLimits, SearchResult};

fn engine() -> Engine {
    Engine::new(EngineOptions::default()).unwrap()
}

// ── Positions ─────────────────────────────────────────────────────────────────

#[test]
fn starts_from_the_initial_position() {
    let engine = engine();
    assert_eq!(engine.position(), &Position::startpos());
}

#[test]
fn moves_are_played_in_order() {
    let mut engine = engine();
    engine.make_moves(&["e2e4", "e7e5", "g1f3"]).unwrap();
    let expected = Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2").unwrap();
    assert_eq!(engine.position().to_string(), expected.to_string());
}

#[test]
fn bad_move_stops_the_sequence() {
    let mut engine = engine();
    let err = engine.make_moves(&["e2e4", "e7e4", "g1f3"]).unwrap_err();
    assert!(matches!(err, EngineError::Move(MoveParseError::NoSuchMove { .. })));
    let mut expected = Position::startpos();
    expected.play_uci("e2e4").unwrap();
    assert_eq!(engine.position(), &expected);
}

#[test]
fn rejected_fen_empties_the_position() {
    let mut engine = engine();
    let err = engine.set_position("not a fen").unwrap_err();
    assert!(matches!(err, EngineError::Fen(_)));
    assert_eq!(engine.position(), &Position::default());
}

#[test]
fn new_game_restores_the_start_position() {
    let mut engine = engine();
    engine.set_position("8/8/8/3k4/8/3K4/4P3/8 w - - 0 1").unwrap();
    engine.search(SearchLimits::depth(4)).unwrap();
    engine.new_game();
    assert_eq!(engine.position(), &Position::startpos());
}

#[test]
fn perft_and_divide_agree() {
    let mut engine = engine();
    assert_eq!(engine.perft(3), 8_902);
    let divided = engine.divide(2);
    assert_eq!(divided.len(), 20);
    assert_eq!(divided.iter().map(|(_, n)| n).sum::<u64>(), 400);
    assert_eq!(engine.position(), &Position::startpos());
}

#[test]
fn evaluation_is_from_the_mover_side() {
    let mut engine = engine();
    engine.set_position("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
    assert!(engine.evaluate() > 800);
    engine.set_position("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
    assert!(engine.evaluate() < -800);
}

// ── Options ───────────────────────────────────────────────────────────────────

#[test]
fn options_are_clamped() {
    let options = EngineOptions::default().with_hash_mb(0).with_threads(10_000);
    assert_eq!(options.hash_mb, EngineOptions::MIN_HASH_MB);
    assert_eq!(options.threads, EngineOptions::MAX_THREADS);
}

#[test]
fn set_option_by_name() {
    let mut engine = engine();
    engine.set_option("Hash", "32").unwrap();
    assert_eq!(engine.options().hash_mb, 32);
    engine.set_option("threads", "3").unwrap();
    assert_eq!(engine.options().threads, 3);
    assert_eq!(engine.search_threads(), 3);
    engine.set_option("Clear Hash", "").unwrap();
    engine.set_option("HASH", "0").unwrap();
    assert_eq!(engine.options().hash_mb, 1);

    let result = engine.search(SearchLimits::depth(3)).unwrap();
    assert!(!result.best_move.is_null());
}

#[test]
fn set_option_errors() {
    let mut engine = engine();
    assert!(matches!(engine.set_option("Ponder", "true"), Err(EngineError::UnknownOption { .. })));
    assert!(matches!(
        engine.set_option("Hash", "lots"),
        Err(EngineError::InvalidOptionValue { .. })
    ));
    assert!(matches!(
        engine.set_option("Threads", "-2"),
        Err(EngineError::InvalidOptionValue { .. })
    ));
    assert_eq!(engine.options(), EngineOptions::default());
    assert_eq!(engine.search_threads(), engine.options().threads);
}

#[test]
fn thread_option_tracks_the_pool() {
    let mut engine = engine();
    for threads in ["4", "1", "0", "2"] {
        engine.set_option("Threads", threads).unwrap();
        assert_eq!(engine.search_threads(), engine.options().threads);
    }
    assert_eq!(engine.options().threads, 2);
}

// ── Search outcomes ───────────────────────────────────────────────────────────

#[test]
fn back_rank_mate() {
    let mut engine = engine();
    engine.set_position("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let result = engine.search(SearchLimits::depth(3)).unwrap();
    assert_eq!(result.best_move.to_string(), "a1a8");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn fifty_move_rule_scores_zero() {
    let mut engine = engine();
    engine.set_position("8/8/8/3k4/8/8/8/R3K3 w - - 99 80").unwrap();
    let result = engine.search(SearchLimits::depth(4)).unwrap();
    assert_eq!(result.score, 0);
}

#[test]
fn root_at_fifty_move_limit_scores_zero() {
    let mut engine = engine();
    engine.set_position("4k3/8/8/8/8/8/r7/R3K3 w - - 100 80").unwrap();
    let result = engine.search(SearchLimits::depth(4)).unwrap();
    assert_eq!(result.score, 0);
    assert!(!result.best_move.is_null());
}

#[test]
fn threefold_repetition_at_root_scores_zero() {
    let mut engine = engine();
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
    engine.make_moves(&shuffle).unwrap();
    engine.make_moves(&shuffle).unwrap();
    let result = engine.search(SearchLimits::depth(4)).unwrap();
    assert_eq!(result.score, 0);
    assert!(!result.best_move.is_null());
}

#[test]
fn dead_material_scores_zero() {
    let mut engine = engine();
    engine.set_position("8/8/8/3k4/8/8/8/1N2K3 w - - 0 1").unwrap();
    let result = engine.search(SearchLimits::depth(5)).unwrap();
    assert_eq!(result.score, 0);
}

#[test]
fn no_legal_moves_gives_a_null_move() {
    let mut engine = engine();
    engine.set_position("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let result = engine.search(SearchLimits::depth(3)).unwrap();
    assert!(result.best_move.is_null());
    assert_eq!(result.score, 0);
}

// ── Callbacks ─────────────────────────────────────────────────────────────────

#[test]
fn reporter_hears_every_iteration() {
    let mut engine = engine();
    let reports: Arc<Mutex<Vec<IterationReport>>> = Arc::default();
    let sink = Arc::clone(&reports);
    engine.start_search(
        SearchLimits::depth(4),
        Some(Box::new(move |report: &IterationReport| sink.lock().unwrap().push(report.clone()))),
        None,
    );
    let result = engine.wait().unwrap();

    let reports = reports.lock().unwrap();
    let depths: Vec<u32> = reports.iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![1, 2, 3, 4]);
    assert_eq!(reports.last().map(|r| r.pv.clone()), Some(result.pv));
    assert!(reports.windows(2).all(|w| w[0].nodes <= w[1].nodes));
}

#[test]
fn completion_receives_the_result() {
    let mut engine = engine();
    let (tx, rx) = mpsc::channel::<SearchResult>();
    engine.start_search(
        SearchLimits::depth(3),
        None,
        Some(Box::new(move |result: &SearchResult| {
            let _ = tx.send(result.clone());
        })),
    );
    let delivered = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    let result = engine.wait().unwrap();
    assert_eq!(delivered.best_move, result.best_move);
    assert_eq!(delivered.depth, 3);
}

#[test]
fn new_search_replaces_a_running_one() {
    let mut engine = engine();
    engine.start_search(SearchLimits::infinite(), None, None);
    std::thread::sleep(Duration::from_millis(20));
    let result = engine.search(SearchLimits::depth(2)).unwrap();
    assert_eq!(result.depth, 2);
}
