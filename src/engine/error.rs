use std::time::Duration;

use thiserror::Error;

/// Ways talking to an engine can fail.
///
/// The game runner branches on the variant: a launch error is not a game outcome, a
/// configuration error aborts the game with an unknown result, and the others forfeit the game
/// for the engine that caused them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The executable could not be started, or did not complete the `uci` handshake.
    #[error("launch error: {0}")]
    Launch(String),
    /// The engine rejected its options, or never became ready after receiving them.
    #[error("configuration error: {0}")]
    Config(String),
    /// The process exited while it was expected to answer.
    #[error("engine terminated: {0}")]
    Terminated(String),
    /// No `bestmove` arrived in time, even after `stop`.
    #[error("no move after {0:?}")]
    Timeout(Duration),
    /// The engine answered something that is not a move.
    #[error("protocol error: {0}")]
    Protocol(String),
}
