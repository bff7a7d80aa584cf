//! Handles on the engines playing the games.
//!
//! The game runner only talks to engines through the [`EngineHandle`] trait, and obtains them
//! from an [`EngineFactory`]. The default implementation, [`ProcessEngineFactory`], launches
//! each participant as a child process speaking UCI on its standard input and output.

use std::time::Duration;

use shakmaty::uci::UciMove;

use crate::participant::{OptionValue, Participant};

mod error;
mod process;
pub mod protocol;

pub use error::EngineError;
pub use process::{EngineProcess, ProcessEngineFactory};

/// Answer to a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveReply {
    /// The engine plays this move.
    Move(UciMove),
    /// The engine has no move to play (resignation).
    NoMove,
}

/// One running engine, owned by a single game.
pub trait EngineHandle {
    /// Name of the participant this engine plays for.
    fn name(&self) -> &str;

    /// Send options before the game starts, and wait until the engine is ready.
    ///
    /// # Error
    /// [`EngineError::Config`] when an option is rejected or the engine does not get ready.
    fn configure(&mut self, options: &[(String, OptionValue)]) -> Result<(), EngineError>;

    /// Ask for a move in the position reached from the start position by `moves`.
    ///
    /// # Error
    /// [`EngineError::Terminated`] if the process is gone, [`EngineError::Timeout`] if it stays
    /// silent, [`EngineError::Protocol`] if it answers garbage.
    fn request_move(&mut self, moves: &[UciMove], budget: Duration)
        -> Result<MoveReply, EngineError>;

    /// Stop the engine. Must be safe to call several times, and must not leave anything
    /// running behind.
    fn shutdown(&mut self);
}

/// Creates the engines of each game.
///
/// Shared by every worker of the scheduler, hence `Sync`.
pub trait EngineFactory: Sync {
    /// Handle type produced.
    type Handle: EngineHandle;

    /// Start an engine for `participant`.
    ///
    /// # Error
    /// [`EngineError::Launch`] if the engine cannot be started.
    fn launch(&self, participant: &Participant) -> Result<Self::Handle, EngineError>;
}
