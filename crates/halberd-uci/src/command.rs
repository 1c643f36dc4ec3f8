//! UCI command parsing.

use std::time::Duration;

use halberd_engine::{Clock, SearchLimits};

use crate::error::UciError;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` searches until `stop`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<u32>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Search until `stop`, ignoring every other limit.
    pub infinite: bool,
}

impl GoParams {
    /// The engine limits these parameters describe.
    pub fn limits(&self) -> SearchLimits {
        if self.infinite {
            return SearchLimits::infinite();
        }
        let clock = (self.wtime.is_some() || self.btime.is_some()).then_some(Clock {
            wtime: self.wtime,
            btime: self.btime,
            winc: self.winc,
            binc: self.binc,
            movestogo: self.movestogo,
        });
        SearchLimits {
            depth: self.depth,
            nodes: self.nodes,
            movetime: self.movetime,
            clock,
        }
    }
}

/// A parsed UCI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- a FEN (`None` for `startpos`) and moves to play from it.
    Position { fen: Option<String>, moves: Vec<String> },
    /// `go` -- start searching with given parameters.
    Go(GoParams),
    /// `setoption name <name> [value <value>]`.
    SetOption { name: String, value: String },
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// `perft <depth>` -- count leaf nodes per root move.
    Perft(u32),
    /// `eval` -- print the static evaluation.
    Eval,
    /// `d` -- print the board.
    Display,
    /// Unrecognized command, ignored as the protocol requires.
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&first, rest)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match first {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "eval" => Ok(Command::Eval),
        "d" => Ok(Command::Display),
        "position" => parse_position(rest),
        "go" => parse_go(rest),
        "setoption" => parse_setoption(rest),
        "perft" => parse_perft(rest),
        _ => Ok(Command::Unknown(first.to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
///
/// The FEN is every token up to `moves`; validating it is left to the engine.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let moves_at = tokens.iter().position(|&t| t == "moves").unwrap_or(tokens.len());
    let (setup, moves) = tokens.split_at(moves_at);
    let moves = moves.iter().skip(1).map(|m| m.to_string()).collect();

    let fen = match setup {
        ["startpos"] => None,
        ["fen", fen @ ..] if !fen.is_empty() => Some(fen.join(" ")),
        _ => return Err(UciError::MalformedPosition),
    };
    Ok(Command::Position { fen, moves })
}

/// Parse the `go` command arguments.
///
/// Supports: wtime, btime, winc, binc, movestogo, depth, movetime,
/// nodes, infinite. Unknown tokens are silently skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1);
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movestogo" => params.movestogo = Some(parse_int(value, "movestogo")?),
            "depth" => params.depth = Some(parse_int(value, "depth")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "nodes" => params.nodes = Some(parse_int(value, "nodes")?),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            _ => {
                // Unknown token -- skip per UCI convention
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(Command::Go(params))
}

/// Parse `setoption name <words> [value <words>]`. Names may contain spaces.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let ["name", rest @ ..] = tokens else {
        return Err(UciError::MalformedSetOption);
    };
    let value_at = rest.iter().position(|&t| t == "value").unwrap_or(rest.len());
    let (name, value) = rest.split_at(value_at);
    if name.is_empty() {
        return Err(UciError::MalformedSetOption);
    }
    Ok(Command::SetOption {
        name: name.join(" "),
        value: value.iter().skip(1).copied().collect::<Vec<_>>().join(" "),
    })
}

fn parse_perft(tokens: &[&str]) -> Result<Command, UciError> {
    let value = tokens.first().copied().unwrap_or_default();
    value
        .parse()
        .map(Command::Perft)
        .map_err(|_| UciError::InvalidPerftDepth { value: value.to_string() })
}

/// Parse a millisecond value from a token.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    parse_int(token, param).map(Duration::from_millis)
}

/// Parse an integer value from a token.
fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn go(line: &str) -> GoParams {
        match parse_command(line).unwrap() {
            Command::Go(params) => params,
            other => panic!("expected Go, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("uci").unwrap(), Command::Uci);
        assert_eq!(parse_command("isready").unwrap(), Command::IsReady);
        assert_eq!(parse_command("ucinewgame").unwrap(), Command::UciNewGame);
        assert_eq!(parse_command("stop").unwrap(), Command::Stop);
        assert_eq!(parse_command("  quit  ").unwrap(), Command::Quit);
        assert_eq!(parse_command("eval").unwrap(), Command::Eval);
        assert_eq!(parse_command("d").unwrap(), Command::Display);
    }

    #[test]
    fn parse_position_startpos() {
        let cmd = parse_command("position startpos").unwrap();
        assert_eq!(cmd, Command::Position { fen: None, moves: vec![] });
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        assert_eq!(
            cmd,
            Command::Position {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            }
        );
    }

    #[test]
    fn parse_position_fen() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let cmd = parse_command(&format!("position fen {fen} moves e7e5")).unwrap();
        assert_eq!(
            cmd,
            Command::Position {
                fen: Some(fen.to_string()),
                moves: vec!["e7e5".to_string()],
            }
        );
    }

    #[test]
    fn parse_position_short_fen_is_passed_through() {
        let cmd = parse_command("position fen 4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert!(matches!(cmd, Command::Position { fen: Some(f), .. } if f == "4k3/8/8/8/8/8/8/4K3 w - -"));
    }

    #[test]
    fn parse_position_missing_keyword() {
        assert!(matches!(parse_command("position"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position fen"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position moves e2e4"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position startpos extra"), Err(UciError::MalformedPosition)));
    }

    #[test]
    fn parse_go_bare_defaults() {
        let params = go("go");
        assert_eq!(params, GoParams::default());
        assert_eq!(params.limits(), SearchLimits::infinite());
    }

    #[test]
    fn parse_go_depth() {
        assert_eq!(go("go depth 6").depth, Some(6));
        assert_eq!(go("go depth 6").limits(), SearchLimits::depth(6));
    }

    #[test]
    fn parse_go_clock() {
        let params = go("go wtime 300000 btime 200000 winc 2000 binc 1000 movestogo 20");
        assert_eq!(params.wtime, Some(Duration::from_millis(300_000)));
        assert_eq!(params.btime, Some(Duration::from_millis(200_000)));
        assert_eq!(params.winc, Some(Duration::from_millis(2000)));
        assert_eq!(params.binc, Some(Duration::from_millis(1000)));
        assert_eq!(params.movestogo, Some(20));

        let clock = params.limits().clock.unwrap();
        assert_eq!(clock.wtime, Some(Duration::from_millis(300_000)));
        assert_eq!(clock.movestogo, Some(20));
    }

    #[test]
    fn parse_go_movetime_and_nodes() {
        let params = go("go movetime 5000 nodes 1000000");
        assert_eq!(params.movetime, Some(Duration::from_millis(5000)));
        assert_eq!(params.nodes, Some(1_000_000));
        let limits = params.limits();
        assert_eq!(limits.movetime, Some(Duration::from_millis(5000)));
        assert_eq!(limits.nodes, Some(1_000_000));
        assert!(limits.clock.is_none());
    }

    #[test]
    fn infinite_overrides_other_limits() {
        let params = go("go infinite depth 3 wtime 1000");
        assert!(params.infinite);
        assert_eq!(params.limits(), SearchLimits::infinite());
    }

    #[test]
    fn parse_go_skips_unknown_tokens() {
        assert_eq!(go("go ponder depth 4").depth, Some(4));
    }

    #[test]
    fn parse_go_missing_wtime_value() {
        assert!(matches!(parse_command("go wtime"), Err(UciError::MissingGoValue { .. })));
    }

    #[test]
    fn parse_go_invalid_depth_value() {
        assert!(matches!(parse_command("go depth abc"), Err(UciError::InvalidGoValue { .. })));
        assert!(matches!(parse_command("go wtime -5"), Err(UciError::InvalidGoValue { .. })));
    }

    #[test]
    fn parse_setoption() {
        assert_eq!(
            parse_command("setoption name Hash value 64").unwrap(),
            Command::SetOption { name: "Hash".to_string(), value: "64".to_string() }
        );
        assert_eq!(
            parse_command("setoption name Clear Hash").unwrap(),
            Command::SetOption { name: "Clear Hash".to_string(), value: String::new() }
        );
        assert!(matches!(parse_command("setoption Hash 64"), Err(UciError::MalformedSetOption)));
        assert!(matches!(parse_command("setoption name value 3"), Err(UciError::MalformedSetOption)));
    }

    #[test]
    fn parse_perft() {
        assert_eq!(parse_command("perft 4").unwrap(), Command::Perft(4));
        assert!(matches!(parse_command("perft"), Err(UciError::InvalidPerftDepth { .. })));
        assert!(matches!(parse_command("perft x"), Err(UciError::InvalidPerftDepth { .. })));
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(parse_command("foobar 1 2").unwrap(), Command::Unknown("foobar".to_string()));
        assert_eq!(parse_command("").unwrap(), Command::Unknown(String::new()));
    }
}
