//! Plays one game between two engines, from launch to shutdown.
//!
//! A game goes `Setup -> InProgress -> Completed | Aborted`:
//! - Setup launches and configures both engines. A launch failure is returned as an error, a
//!   configuration failure aborts the game with an unknown result (`*`).
//! - InProgress asks the side to move for a move until the rules end the game, the full move
//!   limit is reached, or an engine fails to answer (forfeit).
//!
//! Whatever happens, both engines are shut down before returning.

use std::collections::HashMap;
use std::fmt::Display;
use std::ops::{Deref, DerefMut};

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, EnPassantMode, Position};
use tracing::{debug, info, instrument, warn};

use crate::constraints::Constraints;
use crate::engine::{EngineError, EngineFactory, EngineHandle, MoveReply};
use crate::game_task::GameTask;
use crate::pgn;
use crate::results::Score;

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    /// `1-0`
    WhiteWin,
    /// `0-1`
    BlackWin,
    /// `1/2-1/2`
    Draw,
    /// `*`, the game was aborted before a result could be known.
    Unknown,
}

impl GameResult {
    /// Win for `color`.
    pub fn win_for(color: Color) -> GameResult {
        match color {
            Color::White => GameResult::WhiteWin,
            Color::Black => GameResult::BlackWin,
        }
    }

    /// PGN result token.
    pub fn token(self) -> &'static str {
        match self {
            GameResult::WhiteWin => "1-0",
            GameResult::BlackWin => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Unknown => "*",
        }
    }

    /// Score of the player of `side`. An unknown result scores nothing.
    pub fn score_for(self, side: Color) -> Score {
        match (self, side) {
            (GameResult::WhiteWin, Color::White) | (GameResult::BlackWin, Color::Black) => {
                Score::Win
            }
            (GameResult::Draw, _) => Score::Draw,
            _ => Score::Loss,
        }
    }
}

impl Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Why a game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The side to move is mated.
    Checkmate,
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Neither side can mate.
    InsufficientMaterial,
    /// Same position for the third time.
    ThreefoldRepetition,
    /// Fifty moves without capture nor pawn move.
    FiftyMoveRule,
    /// Full move limit reached, adjudicated as a draw.
    MoveLimit,
    /// The engine of `side` had no move to play.
    Resignation {
        /// Side that resigned.
        side: Color,
    },
    /// The engine of `side` crashed, timed out or sent an illegal move.
    Forfeit {
        /// Side that lost.
        side: Color,
        /// Lost on time rather than by breaking the protocol.
        timed_out: bool,
        /// What went wrong.
        reason: String,
    },
    /// An engine refused its configuration, the game was not played.
    ConfigurationFailed {
        /// What went wrong.
        reason: String,
    },
}

impl Termination {
    /// Value of the PGN `Termination` tag.
    pub fn pgn_tag(&self) -> &'static str {
        match self {
            Termination::Checkmate
            | Termination::Stalemate
            | Termination::InsufficientMaterial
            | Termination::ThreefoldRepetition
            | Termination::FiftyMoveRule
            | Termination::Resignation { .. } => "normal",
            Termination::MoveLimit => "adjudication",
            Termination::Forfeit {
                timed_out: true, ..
            } => "time forfeit",
            Termination::Forfeit { .. } => "rules infraction",
            Termination::ConfigurationFailed { .. } => "abandoned",
        }
    }
}

impl Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Checkmate => write!(f, "checkmate"),
            Termination::Stalemate => write!(f, "stalemate"),
            Termination::InsufficientMaterial => write!(f, "insufficient material"),
            Termination::ThreefoldRepetition => write!(f, "threefold repetition"),
            Termination::FiftyMoveRule => write!(f, "fifty-move rule"),
            Termination::MoveLimit => write!(f, "move limit"),
            Termination::Resignation { side } => write!(f, "{side:?} resigns"),
            Termination::Forfeit { side, reason, .. } => {
                write!(f, "{side:?} forfeits ({reason})")
            }
            Termination::ConfigurationFailed { reason } => {
                write!(f, "configuration failed ({reason})")
            }
        }
    }
}

/// A finished game. Never modified once returned by [`GameRunner::play`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// PGN `Event`.
    pub event: String,
    /// PGN `Date`, `YYYY.MM.DD`.
    pub date: String,
    /// PGN `Round`.
    pub round: u32,
    /// Name of the white participant.
    pub white: String,
    /// Name of the black participant.
    pub black: String,
    /// Moves in SAN, white first.
    pub moves: Vec<String>,
    /// Final result.
    pub result: GameResult,
    /// Why the game ended.
    pub termination: Termination,
}

/// Shuts the engine down when dropped, including when unwinding.
struct Seat<H: EngineHandle>(H);

impl<H: EngineHandle> Deref for Seat<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.0
    }
}

impl<H: EngineHandle> DerefMut for Seat<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.0
    }
}

impl<H: EngineHandle> Drop for Seat<H> {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

/// Plays single games with engines obtained from a factory.
pub struct GameRunner<'a, F: EngineFactory> {
    factory: &'a F,
    constraints: Constraints,
    event: String,
}

impl<'a, F: EngineFactory> GameRunner<'a, F> {
    /// Runner whose games are labelled `event` in the PGN headers.
    pub fn new(factory: &'a F, constraints: Constraints, event: impl Into<String>) -> Self {
        Self {
            factory,
            constraints,
            event: event.into(),
        }
    }

    /// Play the game described by `task` to the end.
    ///
    /// Engine failures during the game are game outcomes, not errors.
    ///
    /// # Errors
    /// [`EngineError::Launch`] if one of the engines cannot be started.
    #[instrument(skip_all, fields(task = %task))]
    pub fn play(&self, task: &GameTask) -> Result<GameRecord, EngineError> {
        let mut record = GameRecord {
            event: self.event.clone(),
            date: pgn::today(),
            round: task.round,
            white: task.white.name.clone(),
            black: task.black.name.clone(),
            moves: vec![],
            result: GameResult::Unknown,
            termination: Termination::MoveLimit,
        };

        // Setup. If black fails to launch, white is shut down by its seat.
        let mut white = Seat(self.factory.launch(&task.white)?);
        let mut black = Seat(self.factory.launch(&task.black)?);

        let configured = white
            .configure(&task.white.options)
            .and_then(|_| black.configure(&task.black.options));
        if let Err(e) = configured {
            warn!("game aborted: {e}");
            white.shutdown();
            black.shutdown();
            record.termination = Termination::ConfigurationFailed {
                reason: e.to_string(),
            };
            return Ok(record);
        }

        // InProgress
        let (result, termination) = self.play_moves(&mut white, &mut black, &mut record.moves);

        // Completed
        white.shutdown();
        black.shutdown();
        info!(
            "{} - {}: {result} ({termination}) after {} plies",
            record.white,
            record.black,
            record.moves.len()
        );
        record.result = result;
        record.termination = termination;
        Ok(record)
    }

    fn play_moves(
        &self,
        white: &mut F::Handle,
        black: &mut F::Handle,
        san_moves: &mut Vec<String>,
    ) -> (GameResult, Termination) {
        let mut pos = Chess::default();
        let mut uci_moves: Vec<UciMove> = vec![];
        let mut seen_positions: HashMap<String, u32> = HashMap::new();
        seen_positions.insert(repetition_key(&pos), 1);

        loop {
            if let Some(end) = rules_termination(&pos, &seen_positions) {
                return end;
            }
            if pos.fullmoves().get() > self.constraints.max_fullmoves {
                return (GameResult::Draw, Termination::MoveLimit);
            }

            let side = pos.turn();
            let engine = match side {
                Color::White => &mut *white,
                Color::Black => &mut *black,
            };
            let reply = engine.request_move(&uci_moves, self.constraints.move_time);
            let uci = match reply {
                Ok(MoveReply::Move(uci)) => uci,
                Ok(MoveReply::NoMove) => {
                    return (GameResult::win_for(!side), Termination::Resignation { side })
                }
                Err(e) => {
                    debug!("{} failed to move: {e}", engine.name());
                    return (GameResult::win_for(!side), forfeit(side, &e));
                }
            };
            let Ok(m) = uci.to_move(&pos) else {
                return (
                    GameResult::win_for(!side),
                    Termination::Forfeit {
                        side,
                        timed_out: false,
                        reason: format!("illegal move {uci}"),
                    },
                );
            };

            let san = SanPlus::from_move_and_play_unchecked(&mut pos, m);
            san_moves.push(san.to_string());
            uci_moves.push(uci);

            *seen_positions.entry(repetition_key(&pos)).or_insert(0) += 1;
        }
    }
}

fn forfeit(side: Color, error: &EngineError) -> Termination {
    Termination::Forfeit {
        side,
        timed_out: matches!(error, EngineError::Timeout(_)),
        reason: error.to_string(),
    }
}

/// Game end decided by the rules, before the side to move plays.
///
/// Draws the side to move could claim end the game: `seen` counts every position reached so
/// far, by [`repetition_key`].
fn rules_termination(
    pos: &Chess,
    seen: &HashMap<String, u32>,
) -> Option<(GameResult, Termination)> {
    if pos.is_checkmate() {
        Some((GameResult::win_for(!pos.turn()), Termination::Checkmate))
    } else if pos.is_stalemate() {
        Some((GameResult::Draw, Termination::Stalemate))
    } else if pos.is_insufficient_material() {
        Some((GameResult::Draw, Termination::InsufficientMaterial))
    } else if can_claim_fifty_moves(pos) {
        Some((GameResult::Draw, Termination::FiftyMoveRule))
    } else if can_claim_threefold(pos, seen) {
        Some((GameResult::Draw, Termination::ThreefoldRepetition))
    } else {
        None
    }
}

/// 100 plies without capture nor pawn move, or 99 and a quiet move to play.
fn can_claim_fifty_moves(pos: &Chess) -> bool {
    match pos.halfmoves() {
        n if n >= 100 => true,
        99 => pos.legal_moves().iter().any(|m| !m.is_zeroing()),
        _ => false,
    }
}

/// The position was reached three times, or a move leads to one already reached twice.
fn can_claim_threefold(pos: &Chess, seen: &HashMap<String, u32>) -> bool {
    let times = |p: &Chess| seen.get(&repetition_key(p)).copied().unwrap_or(0);
    if times(pos) >= 3 {
        return true;
    }
    // a capture or pawn move never leads back to a previous position
    pos.legal_moves()
        .into_iter()
        .filter(|m| !m.is_zeroing())
        .any(|m| {
            let mut after = pos.clone();
            after.play_unchecked(m);
            times(&after) >= 2
        })
}

/// Board, side to move, castling rights and en passant square: the FEN without its clocks.
fn repetition_key(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal)
        .to_string()
        .split(' ')
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}
