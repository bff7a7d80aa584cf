//! In-memory engines following a fixed behavior, and helpers shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shakmaty::uci::UciMove;
use shakmaty::Color;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uci_tournament::engine::{EngineError, EngineFactory, EngineHandle, MoveReply};
use uci_tournament::game_task::{GameTask, Scoring};
use uci_tournament::participant::{OptionValue, Participant};
use uci_tournament::tournament_strategy::{ReportStyle, TournamentStrategy};

/// How a scripted engine answers.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Moves a knight back and forth (g1f3 f3g1 with white, g8f6 f6g8 with black).
    Shuffle,
    /// Plays these moves in order, then resigns.
    Script(Vec<&'static str>),
    /// Never answers in time.
    Silent,
    /// Dies as soon as it is asked for a move.
    Crash,
    /// Rejects any option.
    RejectOptions,
    /// Cannot be launched.
    NoLaunch,
    /// Can be launched once (the startup check), never again.
    LaunchOnce,
    /// Panics when asked for a move.
    Panic,
}

/// Creates scripted engines by participant name. Unknown names shuffle.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    behaviors: HashMap<String, Behavior>,
    launches: Mutex<HashMap<String, usize>>,
    pub launched: Arc<AtomicUsize>,
    pub shut_down: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(name.to_string(), behavior);
        self
    }

    /// Every launched engine was shut down exactly once.
    pub fn all_released(&self) -> bool {
        self.launched.load(Ordering::SeqCst) == self.shut_down.load(Ordering::SeqCst)
    }
}

impl EngineFactory for ScriptedFactory {
    type Handle = ScriptedEngine;

    fn launch(&self, participant: &Participant) -> Result<ScriptedEngine, EngineError> {
        let behavior = self
            .behaviors
            .get(&participant.name)
            .cloned()
            .unwrap_or(Behavior::Shuffle);

        let previous_launches = {
            let mut launches = self.launches.lock().unwrap();
            let count = launches.entry(participant.name.clone()).or_insert(0);
            *count += 1;
            *count - 1
        };
        match behavior {
            Behavior::NoLaunch => {
                return Err(EngineError::Launch(format!("{} not found", participant.name)))
            }
            Behavior::LaunchOnce if previous_launches > 0 => {
                return Err(EngineError::Launch(format!("{} is gone", participant.name)))
            }
            _ => {}
        }

        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedEngine {
            name: participant.name.clone(),
            behavior,
            shut_down: self.shut_down.clone(),
            is_shut_down: false,
        })
    }
}

#[derive(Debug)]
pub struct ScriptedEngine {
    name: String,
    behavior: Behavior,
    shut_down: Arc<AtomicUsize>,
    is_shut_down: bool,
}

impl EngineHandle for ScriptedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, options: &[(String, OptionValue)]) -> Result<(), EngineError> {
        match (&self.behavior, options.first()) {
            (Behavior::RejectOptions, Some((name, _))) => Err(EngineError::Config(format!(
                "{} has no option '{name}'",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    fn request_move(
        &mut self,
        moves: &[UciMove],
        budget: Duration,
    ) -> Result<MoveReply, EngineError> {
        let ply = moves.len();
        let own_moves = ply / 2;
        let reply = match &self.behavior {
            Behavior::Shuffle => {
                let shuffle = if ply % 2 == 0 {
                    ["g1f3", "f3g1"]
                } else {
                    ["g8f6", "f6g8"]
                };
                Some(shuffle[own_moves % 2])
            }
            Behavior::Script(script) => script.get(own_moves).copied(),
            Behavior::Silent => return Err(EngineError::Timeout(budget * 2)),
            Behavior::Crash => {
                return Err(EngineError::Terminated(format!("{} crashed", self.name)))
            }
            Behavior::Panic => panic!("{} panicked", self.name),
            Behavior::RejectOptions | Behavior::NoLaunch | Behavior::LaunchOnce => {
                Some(["g1f3", "g8f6", "f3g1", "f6g8"][ply % 4])
            }
        };
        Ok(match reply {
            Some(m) => MoveReply::Move(m.parse().unwrap()),
            None => MoveReply::NoMove,
        })
    }

    fn shutdown(&mut self) {
        if !self.is_shut_down {
            self.is_shut_down = true;
            self.shut_down.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A participant whose executable exists, so that startup checks pass.
pub fn participant(name: &str) -> Participant {
    Participant::new(name, concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))
}

/// Log to the test output, for debugging.
pub fn init_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .without_time()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Number of games in a PGN log.
pub fn count_entries(pgn: &str) -> usize {
    pgn.matches("[Event ").count()
}

/// Two participants, each one tracked under its own name in one game per color: 4 games.
pub struct MirroredPairings {
    first: Arc<Participant>,
    second: Arc<Participant>,
}

impl MirroredPairings {
    pub fn new(first: Participant, second: Participant) -> Self {
        Self {
            first: Arc::new(first),
            second: Arc::new(second),
        }
    }
}

impl TournamentStrategy for MirroredPairings {
    fn event(&self) -> String {
        "Mirrored pairings".to_string()
    }

    fn title(&self) -> String {
        "RESULTS".to_string()
    }

    fn participants(&self) -> Vec<Arc<Participant>> {
        vec![self.first.clone(), self.second.clone()]
    }

    fn rows(&self) -> Vec<String> {
        vec![self.first.name.clone(), self.second.name.clone()]
    }

    fn schedule(&self) -> Vec<GameTask> {
        let mut tasks = vec![];
        for (tracked, other) in [(&self.first, &self.second), (&self.second, &self.first)] {
            for side in [Color::White, Color::Black] {
                let (white, black) = match side {
                    Color::White => (tracked, other),
                    Color::Black => (other, tracked),
                };
                tasks.push(GameTask {
                    id: tasks.len(),
                    round: tasks.len() as u32 + 1,
                    white: white.clone(),
                    black: black.clone(),
                    scoring: Scoring::Tracked {
                        side,
                        key: tracked.name.clone(),
                    },
                });
            }
        }
        tasks
    }

    fn report_style(&self) -> ReportStyle {
        ReportStyle::Table {
            first_column: "Player".to_string(),
            with_rating: false,
        }
    }
}
