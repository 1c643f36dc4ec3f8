//! The UCI read-eval-print loop.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use halberd_core::STARTING_FEN;
use halberd_engine::{Engine, EngineOptions, IterationReport, SearchLimits, SearchResult, mate_in_moves};

use crate::command::{Command, GoParams, parse_command};
use crate::error::UciError;

/// Output shared between the loop and the search threads.
pub type SharedOutput<W> = Arc<Mutex<W>>;

/// Drives an [`Engine`] from UCI commands.
///
/// Commands are read on the caller's thread. Searches run on the engine's
/// threads, which write `info` and `bestmove` lines themselves, so `stop`
/// and `isready` are answered while a search is running.
pub struct UciLoop<W: Write + Send + 'static> {
    engine: Engine,
    out: SharedOutput<W>,
    /// The running search has no limit and only ends on `stop`.
    unbounded: bool,
}

impl<W: Write + Send + 'static> UciLoop<W> {
    pub fn new(engine: Engine, out: SharedOutput<W>) -> UciLoop<W> {
        UciLoop { engine, out, unbounded: false }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Process lines from `input` until `quit` or end of input.
    ///
    /// At end of input a bounded search is allowed to finish and an
    /// unbounded one is stopped; either way its `bestmove` is written before
    /// returning.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<(), UciError> {
        let mut quit = false;
        for line in input.lines() {
            if !self.handle_line(&line?)? {
                quit = true;
                break;
            }
        }
        if !quit {
            if self.unbounded {
                self.engine.stop_search();
            }
            self.engine.wait();
        }
        info!("halberd shutting down");
        Ok(())
    }

    /// Handle one line of input. Returns `false` once `quit` was seen.
    ///
    /// Malformed commands and rejected positions or options are logged and
    /// skipped; only failures to write output are returned.
    pub fn handle_line(&mut self, line: &str) -> Result<bool, UciError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(true);
        }
        debug!(cmd = %line, "received UCI command");
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(err) => {
                warn!(error = %err, cmd = %line, "UCI parse error");
                return Ok(true);
            }
        };

        match command {
            Command::Uci => self.handle_uci()?,
            Command::IsReady => send(&self.out, "readyok")?,
            Command::UciNewGame => {
                self.finish_search();
                self.engine.new_game();
            }
            Command::Position { fen, moves } => self.handle_position(fen.as_deref(), &moves),
            Command::Go(params) => self.handle_go(&params),
            Command::SetOption { name, value } => {
                self.finish_search();
                if let Err(err) = self.engine.set_option(&name, &value) {
                    warn!(error = %err, "setoption rejected");
                }
            }
            Command::Stop => self.finish_search(),
            Command::Quit => {
                self.finish_search();
                return Ok(false);
            }
            Command::Perft(depth) => self.handle_perft(depth)?,
            Command::Eval => {
                let score = self.engine.evaluate();
                send(&self.out, &format!("info string eval {score} cp"))?;
            }
            Command::Display => send(&self.out, &self.engine.position().pretty())?,
            Command::Unknown(cmd) => debug!(%cmd, "ignoring unknown command"),
        }
        Ok(true)
    }

    fn handle_uci(&self) -> io::Result<()> {
        let options = EngineOptions::default();
        send(&self.out, "id name halberd")?;
        send(&self.out, "id author the halberd developers")?;
        send(
            &self.out,
            &format!(
                "option name Hash type spin default {} min {} max {}",
                options.hash_mb,
                EngineOptions::MIN_HASH_MB,
                EngineOptions::MAX_HASH_MB
            ),
        )?;
        send(
            &self.out,
            &format!(
                "option name Threads type spin default {} min {} max {}",
                options.threads,
                EngineOptions::MIN_THREADS,
                EngineOptions::MAX_THREADS
            ),
        )?;
        send(&self.out, "option name Clear Hash type button")?;
        send(&self.out, "uciok")
    }

    fn handle_position(&mut self, fen: Option<&str>, moves: &[String]) {
        self.finish_search();
        if let Err(err) = self.engine.set_position(fen.unwrap_or(STARTING_FEN)) {
            warn!(error = %err, "position rejected");
            return;
        }
        let moves: Vec<&str> = moves.iter().map(String::as_str).collect();
        if let Err(err) = self.engine.make_moves(&moves) {
            warn!(error = %err, "move list rejected");
        }
    }

    fn handle_go(&mut self, params: &GoParams) {
        let limits = params.limits();
        self.unbounded = limits == SearchLimits::infinite();
        let reporter_out = Arc::clone(&self.out);
        let bestmove_out = Arc::clone(&self.out);
        self.engine.start_search(
            limits,
            Some(Box::new(move |report: &IterationReport| {
                if let Err(err) = send(&reporter_out, &info_line(report)) {
                    warn!(error = %err, "failed to write search info");
                }
            })),
            Some(Box::new(move |result: &SearchResult| {
                if let Err(err) = send(&bestmove_out, &bestmove_line(result)) {
                    warn!(error = %err, "failed to write bestmove");
                }
            })),
        );
    }

    fn handle_perft(&mut self, depth: u32) -> io::Result<()> {
        let divided = self.engine.divide(depth);
        let mut total = 0;
        for (mv, nodes) in &divided {
            send(&self.out, &format!("{mv}: {nodes}"))?;
            total += nodes;
        }
        send(&self.out, "")?;
        send(&self.out, &format!("Nodes searched: {total}"))
    }

    /// Stop any running search and wait for its `bestmove`.
    fn finish_search(&mut self) {
        if self.engine.is_searching() {
            self.engine.stop_search();
            self.engine.wait();
        }
    }
}

fn send<W: Write>(out: &Mutex<W>, line: &str) -> io::Result<()> {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(out, "{line}")?;
    out.flush()
}

/// `cp <n>` or, for mate scores, `mate <moves>` (negative when being mated).
fn score_text(score: i32) -> String {
    match mate_in_moves(score) {
        Some(moves) => format!("mate {moves}"),
        None => format!("cp {score}"),
    }
}

fn info_line(report: &IterationReport) -> String {
    let millis = report.elapsed.as_millis();
    let nps = u128::from(report.nodes) * 1000 / millis.max(1);
    let pv: Vec<String> = report.pv.iter().map(|mv| mv.to_uci()).collect();
    format!(
        "info depth {} seldepth {} score {} nodes {} nps {} time {} hashfull {} pv {}",
        report.depth,
        report.seldepth,
        score_text(report.score),
        report.nodes,
        nps,
        millis,
        report.hashfull,
        pv.join(" ")
    )
}

fn bestmove_line(result: &SearchResult) -> String {
    format!("bestmove {}", result.best_move.to_uci())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use halberd_core::Move;
    use halberd_engine::MATE;

    use super::*;

    #[test]
    fn scores_render_as_centipawns_or_mate() {
        assert_eq!(score_text(35), "cp 35");
        assert_eq!(score_text(-120), "cp -120");
        assert_eq!(score_text(MATE - 1), "mate 1");
        assert_eq!(score_text(MATE - 4), "mate 2");
        assert_eq!(score_text(-MATE + 2), "mate -1");
    }

    #[test]
    fn info_line_fields() {
        let report = IterationReport {
            depth: 7,
            seldepth: 11,
            score: 23,
            nodes: 50_000,
            elapsed: Duration::from_millis(100),
            hashfull: 12,
            pv: vec![],
        };
        assert_eq!(
            info_line(&report),
            "info depth 7 seldepth 11 score cp 23 nodes 50000 nps 500000 time 100 hashfull 12 pv "
        );
    }

    #[test]
    fn null_best_move_is_zeros() {
        let result = SearchResult {
            best_move: Move::NULL,
            pv: vec![],
            score: 0,
            depth: 1,
            nodes: 1,
        };
        assert_eq!(bestmove_line(&result), "bestmove 0000");
    }

    fn run_script(script: &str) -> String {
        let out: SharedOutput<Vec<u8>> = Arc::default();
        let engine = Engine::new(EngineOptions::default()).unwrap();
        let mut uci = UciLoop::new(engine, Arc::clone(&out));
        uci.run(script.as_bytes()).unwrap();
        let bytes = out.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn handshake() {
        let output = run_script("uci\nisready\n");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.first(), Some(&"id name halberd"));
        assert!(lines.contains(&"option name Hash type spin default 16 min 1 max 65536"));
        assert!(lines.contains(&"option name Threads type spin default 1 min 1 max 256"));
        assert_eq!(&lines[lines.len() - 2..], ["uciok", "readyok"]);
    }

    #[test]
    fn search_reports_then_answers() {
        let output = run_script("position startpos moves e2e4 e7e5\ngo depth 3\n");
        let lines: Vec<&str> = output.lines().collect();
        let infos = lines.iter().filter(|l| l.starts_with("info depth")).count();
        assert_eq!(infos, 3, "{output}");
        let last = lines.last().unwrap();
        assert!(last.starts_with("bestmove "), "{output}");
        assert_eq!(lines.iter().filter(|l| l.starts_with("bestmove")).count(), 1);
    }

    #[test]
    fn quit_stops_the_search() {
        let output = run_script("go infinite\nquit\nisready\n");
        assert!(output.lines().any(|l| l.starts_with("bestmove")), "{output}");
        assert!(!output.contains("readyok"));
    }

    #[test]
    fn mate_is_announced() {
        let output = run_script(
            "position fen r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4\ngo depth 2\n",
        );
        assert!(output.contains("score mate 1"), "{output}");
        assert!(output.lines().any(|l| l == "bestmove h5f7"), "{output}");
    }

    #[test]
    fn stop_ends_infinite_search() {
        let output = run_script("go infinite\nisready\nstop\nisready\n");
        let lines: Vec<&str> = output.lines().collect();
        let best = lines.iter().position(|l| l.starts_with("bestmove")).unwrap();
        assert_eq!(lines.last(), Some(&"readyok"));
        assert!(best < lines.len() - 1);
        assert_eq!(lines.iter().filter(|l| **l == "readyok").count(), 2);
    }

    #[test]
    fn bad_input_is_skipped() {
        let output = run_script(
            "position fen nonsense\ngo wtime\nsetoption name Bogus value 1\nposition startpos moves e2e5\nfoo\nisready\n",
        );
        assert_eq!(output, "readyok\n");
    }

    #[test]
    fn position_then_moves_reach_the_engine() {
        let out: SharedOutput<Vec<u8>> = Arc::default();
        let engine = Engine::new(EngineOptions::default()).unwrap();
        let mut uci = UciLoop::new(engine, out);
        assert!(uci.handle_line("position startpos moves e2e4 e7e5 g1f3").unwrap());
        assert_eq!(
            uci.engine().position().to_string(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        assert!(uci.handle_line("setoption name Hash value 8").unwrap());
        assert_eq!(uci.engine().options().hash_mb, 8);
        assert!(!uci.handle_line("quit").unwrap());
    }

    #[test]
    fn perft_prints_divide() {
        let output = run_script("perft 2\n");
        assert!(output.contains("a2a3: 20\n"));
        assert!(output.ends_with("\nNodes searched: 400\n"));
        assert_eq!(output.lines().count(), 22);
    }

    #[test]
    fn eval_prints_score() {
        let output = run_script("position fen 4k3/8/8/8/8/8/8/3QK3 w - - 0 1\neval\n");
        assert!(output.starts_with("info string eval "));
    }
}
