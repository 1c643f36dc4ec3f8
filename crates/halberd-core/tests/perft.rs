//! Perft suite over the standard reference positions.

use halberd_core::{Position, perft};

fn position(fen: &str) -> Position {
    fen.parse().unwrap()
}

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_4_MIRRORED: &str = "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

// --- Position 1: starting position ---

#[test]
fn startpos_depth_4() {
    assert_eq!(perft(&mut Position::startpos(), 4), 197_281);
}

#[test]
fn startpos_depth_5() {
    assert_eq!(perft(&mut Position::startpos(), 5), 4_865_609);
}

#[test]
#[ignore] // slow
fn startpos_depth_6() {
    assert_eq!(perft(&mut Position::startpos(), 6), 119_060_324);
}

// --- Position 2: Kiwipete ---

#[test]
fn kiwipete_shallow() {
    let mut pos = position(KIWIPETE);
    assert_eq!(perft(&mut pos, 1), 48);
    assert_eq!(perft(&mut pos, 2), 2_039);
    assert_eq!(perft(&mut pos, 3), 97_862);
}

#[test]
#[ignore] // slow
fn kiwipete_depth_4() {
    assert_eq!(perft(&mut position(KIWIPETE), 4), 4_085_603);
}

// --- Position 3: en passant and rank pins ---

#[test]
fn position3() {
    let mut pos = position(POSITION_3);
    assert_eq!(perft(&mut pos, 1), 14);
    assert_eq!(perft(&mut pos, 2), 191);
    assert_eq!(perft(&mut pos, 3), 2_812);
    assert_eq!(perft(&mut pos, 4), 43_238);
    assert_eq!(perft(&mut pos, 5), 674_624);
}

// --- Position 4 and its colour mirror ---

#[test]
fn position4() {
    for fen in [POSITION_4, POSITION_4_MIRRORED] {
        let mut pos = position(fen);
        assert_eq!(perft(&mut pos, 1), 6, "{fen}");
        assert_eq!(perft(&mut pos, 2), 264, "{fen}");
        assert_eq!(perft(&mut pos, 3), 9_467, "{fen}");
    }
}

#[test]
#[ignore] // slow
fn position4_depth_4() {
    assert_eq!(perft(&mut position(POSITION_4), 4), 422_333);
}

// --- Position 5 ---

#[test]
fn position5() {
    let mut pos = position(POSITION_5);
    assert_eq!(perft(&mut pos, 1), 44);
    assert_eq!(perft(&mut pos, 2), 1_486);
    assert_eq!(perft(&mut pos, 3), 62_379);
}

#[test]
#[ignore] // slow
fn position5_depth_4() {
    assert_eq!(perft(&mut position(POSITION_5), 4), 2_103_487);
}

#[test]
fn perft_leaves_position_untouched() {
    let mut pos = position(KIWIPETE);
    let before = pos.clone();
    perft(&mut pos, 3);
    assert_eq!(pos, before);
}
