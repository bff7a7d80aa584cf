use std::{fmt::Display, sync::Arc};

use shakmaty::Color;

use crate::{game_runner::GameResult, participant::Participant, results::Score};

/// Whose point of view a finished game is tallied from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scoring {
    /// Only the player of `side` is tracked, and the game goes to the report row `key`
    /// (usually the name of the other player, or the label of a configuration).
    Tracked {
        /// Color played by the tracked participant.
        side: Color,
        /// Report row the game is counted in.
        key: String,
    },
    /// Both players are tracked, each under their own name.
    BothSides,
}

/// One scheduled game between two participants.
#[derive(Debug, Clone)]
pub struct GameTask {
    /// Unique within a schedule.
    pub id: usize,
    /// Round number written in the PGN headers.
    pub round: u32,
    /// Plays first.
    pub white: Arc<Participant>,
    /// Plays second.
    pub black: Arc<Participant>,
    /// How the result is tallied.
    pub scoring: Scoring,
}

impl GameTask {
    /// Report rows touched by this task, each with the score earned in it.
    ///
    /// Always the same rows whatever the result, so each row is updated by exactly the games
    /// that reference it.
    pub fn score_entries(&self, result: GameResult) -> Vec<(String, Score)> {
        match &self.scoring {
            Scoring::Tracked { side, key } => vec![(key.clone(), result.score_for(*side))],
            Scoring::BothSides => vec![
                (self.white.name.clone(), result.score_for(Color::White)),
                (self.black.name.clone(), result.score_for(Color::Black)),
            ],
        }
    }
}

impl PartialEq for GameTask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for GameTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} [{} VS {}]", self.id, self.white.name, self.black.name)
    }
}
