//! UCI lines sent to and read from engines.

use std::time::Duration;

use shakmaty::uci::UciMove;

use super::{EngineError, MoveReply};

/// `position startpos [moves ...]`
pub fn position_command(moves: &[UciMove]) -> String {
    let mut cmd = String::from("position startpos");
    if !moves.is_empty() {
        cmd.push_str(" moves");
        for m in moves {
            cmd.push(' ');
            cmd.push_str(&m.to_string());
        }
    }
    cmd
}

/// `go movetime <ms>`, never asking for less than one millisecond.
pub fn go_command(budget: Duration) -> String {
    format!("go movetime {}", budget.as_millis().max(1))
}

/// `setoption name <name> value <value>`
pub fn setoption_command(name: &str, value: &str) -> String {
    format!("setoption name {name} value {value}")
}

/// Reads a `bestmove` line.
///
/// Returns `Ok(None)` for any other line (`info`, `id`, ...), which callers skip.
/// `bestmove (none)` and `bestmove 0000` mean the engine has no move to play.
pub fn parse_bestmove(line: &str) -> Result<Option<MoveReply>, EngineError> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return Ok(None);
    }
    match tokens.next() {
        None | Some("(none)") | Some("0000") | Some("none") => Ok(Some(MoveReply::NoMove)),
        Some(token) => token
            .parse::<UciMove>()
            .map(|m| Some(MoveReply::Move(m)))
            .map_err(|_| EngineError::Protocol(format!("invalid move in '{line}'"))),
    }
}

/// Name of an option advertised by an `option name <name> type ...` line.
///
/// Names may contain spaces.
pub fn parse_option_name(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "option" || tokens.next()? != "name" {
        return None;
    }
    let name = tokens.take_while(|t| *t != "type").collect::<Vec<_>>();
    if name.is_empty() {
        None
    } else {
        Some(name.join(" "))
    }
}
