//! Tournament plans: who plays whom, with which color, and how results are tallied.
//!
//! This module defines the [`TournamentStrategy`] trait and the built-in plans used by the
//! tournament driver:
//!
//! - [`Gauntlet`]: one challenger against a ladder of opponents, one report row per opponent.
//! - [`HeadToHead`]: two configurations of an engine against each other, reported as a duel
//!   with a rating estimate.
//! - [`RoundRobin`]: every participant plays every other one, with standings.
//!
//! # Implementing a Custom Plan
//! The driver calls `schedule` once and plays every returned task. Every row key used by a
//! task's [`Scoring`] should be listed by `rows`, which fixes the order of the final table.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use shakmaty::Color;

use crate::game_task::{GameTask, Scoring};
use crate::participant::Participant;

/// How the final report is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStyle {
    /// One line per row, plus a total. `first_column` names the rows.
    Table {
        /// Header of the row names column.
        first_column: String,
        /// Also print the rating estimate of the total.
        with_rating: bool,
    },
    /// Wins of each side, score and rating estimate.
    Duel {
        /// Tracked participant.
        tracked: String,
        /// Its opponent.
        other: String,
    },
}

/// A trait defining the games of a tournament, and how their results are presented.
pub trait TournamentStrategy {
    /// PGN `Event` of every game.
    fn event(&self) -> String;

    /// Title of the final report.
    fn title(&self) -> String;

    /// Every distinct participant, in a stable order.
    fn participants(&self) -> Vec<Arc<Participant>>;

    /// Files that must exist before anything starts, with a description used in error messages.
    ///
    /// Defaults to the executables of the participants.
    fn required_files(&self) -> Vec<(String, PathBuf)> {
        self.participants()
            .iter()
            .map(|p| (format!("engine {}", p.name), p.path_to_exe.clone()))
            .collect()
    }

    /// Report rows, in display order.
    fn rows(&self) -> Vec<String>;

    /// Every game to play. Task ids are unique.
    fn schedule(&self) -> Vec<GameTask>;

    /// How the final report is printed.
    fn report_style(&self) -> ReportStyle;

    /// Print a progress line every this many finished games.
    fn progress_interval(&self) -> usize {
        10
    }
}

/// Distinct participants, first appearance order.
fn distinct(participants: impl IntoIterator<Item = Arc<Participant>>) -> Vec<Arc<Participant>> {
    let mut seen = HashSet::new();
    participants
        .into_iter()
        .filter(|p| seen.insert(p.name.clone()))
        .collect()
}

/// A challenger against every opponent of a list.
///
/// Against each opponent, the challenger plays the first half of the games with white and the
/// second half with black. Results are tallied from the challenger's point of view, under the
/// opponent's name.
#[derive(Debug, Clone)]
pub struct Gauntlet {
    challenger: Arc<Participant>,
    opponents: Vec<Arc<Participant>>,
    games_per_opponent: u32,
    event: String,
}

impl Gauntlet {
    /// `games_per_opponent` games against each opponent.
    pub fn new(
        challenger: Participant,
        opponents: Vec<Participant>,
        games_per_opponent: u32,
    ) -> Self {
        let event = format!("{} gauntlet", challenger.name);
        Self {
            challenger: Arc::new(challenger),
            opponents: opponents.into_iter().map(Arc::new).collect(),
            games_per_opponent,
            event,
        }
    }

    /// Sets the PGN `Event` tag.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }
}

impl TournamentStrategy for Gauntlet {
    fn event(&self) -> String {
        self.event.clone()
    }

    fn title(&self) -> String {
        format!("{} RESULTS", self.challenger.name)
    }

    fn participants(&self) -> Vec<Arc<Participant>> {
        distinct(std::iter::once(self.challenger.clone()).chain(self.opponents.iter().cloned()))
    }

    fn required_files(&self) -> Vec<(String, PathBuf)> {
        // every opponent may be the same executable
        let mut seen = HashSet::new();
        self.participants()
            .iter()
            .filter(|p| seen.insert(p.path_to_exe.clone()))
            .map(|p| (format!("engine {}", p.name), p.path_to_exe.clone()))
            .collect()
    }

    fn rows(&self) -> Vec<String> {
        self.opponents.iter().map(|o| o.name.clone()).collect()
    }

    fn schedule(&self) -> Vec<GameTask> {
        let half = self.games_per_opponent / 2;
        let mut tasks = vec![];
        for opponent in &self.opponents {
            for game in 0..self.games_per_opponent {
                let (white, black, side) = if game < half {
                    (&self.challenger, opponent, Color::White)
                } else {
                    (opponent, &self.challenger, Color::Black)
                };
                tasks.push(GameTask {
                    id: tasks.len(),
                    round: game + 1,
                    white: white.clone(),
                    black: black.clone(),
                    scoring: Scoring::Tracked {
                        side,
                        key: opponent.name.clone(),
                    },
                });
            }
        }
        tasks
    }

    fn report_style(&self) -> ReportStyle {
        ReportStyle::Table {
            first_column: "Opponent".to_string(),
            with_rating: true,
        }
    }

    fn progress_interval(&self) -> usize {
        4
    }
}

/// Two participants (usually one engine with and without some setting) playing each other.
///
/// The first half of the games has the variant playing white. Results are tallied from the
/// variant's point of view.
#[derive(Debug, Clone)]
pub struct HeadToHead {
    variant: Arc<Participant>,
    baseline: Arc<Participant>,
    games: u32,
    event: String,
    extra_files: Vec<(String, PathBuf)>,
}

impl HeadToHead {
    /// `games` games between `variant` and `baseline`.
    pub fn new(variant: Participant, baseline: Participant, games: u32) -> Self {
        let event = format!("{} vs {} H2H", variant.name, baseline.name);
        Self {
            variant: Arc::new(variant),
            baseline: Arc::new(baseline),
            games,
            event,
            extra_files: vec![],
        }
    }

    /// Sets the PGN `Event` tag.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Also require `path` to exist (an opening book given as argument, for instance).
    pub fn with_required_file(mut self, description: impl Into<String>, path: PathBuf) -> Self {
        self.extra_files.push((description.into(), path));
        self
    }
}

impl TournamentStrategy for HeadToHead {
    fn event(&self) -> String {
        self.event.clone()
    }

    fn title(&self) -> String {
        format!("RESULTS: {} vs {}", self.variant.name, self.baseline.name)
    }

    fn participants(&self) -> Vec<Arc<Participant>> {
        distinct([self.variant.clone(), self.baseline.clone()])
    }

    fn required_files(&self) -> Vec<(String, PathBuf)> {
        let mut files = vec![(
            format!("engine {}", self.variant.name),
            self.variant.path_to_exe.clone(),
        )];
        if self.baseline.path_to_exe != self.variant.path_to_exe {
            files.push((
                format!("engine {}", self.baseline.name),
                self.baseline.path_to_exe.clone(),
            ));
        }
        files.extend(self.extra_files.iter().cloned());
        files
    }

    fn rows(&self) -> Vec<String> {
        vec![self.variant.name.clone()]
    }

    fn schedule(&self) -> Vec<GameTask> {
        let half = self.games / 2;
        (0..self.games)
            .map(|game| {
                let (white, black, side) = if game < half {
                    (&self.variant, &self.baseline, Color::White)
                } else {
                    (&self.baseline, &self.variant, Color::Black)
                };
                GameTask {
                    id: game as usize,
                    round: game + 1,
                    white: white.clone(),
                    black: black.clone(),
                    scoring: Scoring::Tracked {
                        side,
                        key: self.variant.name.clone(),
                    },
                }
            })
            .collect()
    }

    fn report_style(&self) -> ReportStyle {
        ReportStyle::Duel {
            tracked: self.variant.name.clone(),
            other: self.baseline.name.clone(),
        }
    }
}

/// Every participant plays every other one, `games_per_color` games with each color.
///
/// Both players of each game are tallied, under their own name.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    participants: Vec<Arc<Participant>>,
    games_per_color: u32,
    event: String,
}

impl RoundRobin {
    /// Creates a new round robin between `participants`.
    pub fn new(participants: Vec<Participant>, games_per_color: u32) -> Self {
        Self {
            participants: participants.into_iter().map(Arc::new).collect(),
            games_per_color,
            event: "Round robin".to_string(),
        }
    }

    /// Sets the PGN `Event` tag.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }
}

impl TournamentStrategy for RoundRobin {
    fn event(&self) -> String {
        self.event.clone()
    }

    fn title(&self) -> String {
        "STANDINGS".to_string()
    }

    fn participants(&self) -> Vec<Arc<Participant>> {
        distinct(self.participants.iter().cloned())
    }

    fn rows(&self) -> Vec<String> {
        self.participants().iter().map(|p| p.name.clone()).collect()
    }

    fn schedule(&self) -> Vec<GameTask> {
        let players = self.participants();
        let mut tasks = vec![];
        for (i, a) in players.iter().enumerate() {
            for b in &players[i + 1..] {
                for game in 0..self.games_per_color * 2 {
                    let (white, black) = if game % 2 == 0 { (a, b) } else { (b, a) };
                    tasks.push(GameTask {
                        id: tasks.len(),
                        round: game + 1,
                        white: white.clone(),
                        black: black.clone(),
                        scoring: Scoring::BothSides,
                    });
                }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn stockfish(elo: u32) -> Participant {
        Participant::new(format!("SF-{elo}"), "/usr/bin/stockfish")
            .with_option("UCI_LimitStrength", true)
            .with_option("UCI_Elo", elo)
    }

    #[test]
    fn gauntlet_splits_colors_per_opponent() {
        let gauntlet = Gauntlet::new(
            Participant::new("Challenger", "./uci"),
            vec![stockfish(1320), stockfish(1420)],
            4,
        );
        let tasks = gauntlet.schedule();
        assert_eq!(tasks.len(), 8);

        let ids = tasks.iter().map(|t| t.id).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 8);

        for t in &tasks[..2] {
            assert_eq!(t.white.name, "Challenger");
            assert_eq!(
                t.scoring,
                Scoring::Tracked {
                    side: Color::White,
                    key: "SF-1320".into()
                }
            );
        }
        for t in &tasks[2..4] {
            assert_eq!(t.black.name, "Challenger");
            assert_eq!(t.white.name, "SF-1320");
        }
        assert_eq!(
            tasks.iter().map(|t| t.round).collect::<Vec<_>>(),
            [1, 2, 3, 4, 1, 2, 3, 4]
        );
        assert_eq!(gauntlet.rows(), ["SF-1320", "SF-1420"]);
    }

    #[test]
    fn gauntlet_requires_each_executable_once() {
        let gauntlet = Gauntlet::new(
            Participant::new("Challenger", "./uci"),
            vec![stockfish(1320), stockfish(1420)],
            2,
        );
        let files = gauntlet
            .required_files()
            .into_iter()
            .map(|(_, path)| path)
            .collect::<Vec<_>>();
        assert_eq!(
            files,
            [PathBuf::from("./uci"), PathBuf::from("/usr/bin/stockfish")]
        );
        assert_eq!(gauntlet.participants().len(), 3);
    }

    #[test]
    fn head_to_head_tracks_the_variant() {
        let h2h = HeadToHead::new(
            Participant::new("Book", "./uci_6000").with_args(["-book", "book.bin"]),
            Participant::new("NoBook", "./uci_6000"),
            6,
        )
        .with_required_file("book", PathBuf::from("book.bin"));

        let tasks = h2h.schedule();
        assert_eq!(tasks.len(), 6);
        assert!(tasks[..3].iter().all(|t| t.white.name == "Book"));
        assert!(tasks[3..].iter().all(|t| t.black.name == "Book"));
        assert!(tasks.iter().all(|t| matches!(
            &t.scoring,
            Scoring::Tracked { key, .. } if key == "Book"
        )));
        assert_eq!(h2h.required_files().len(), 2);
    }

    #[test]
    fn round_robin_pairs_everyone_with_both_colors() {
        let rr = RoundRobin::new(
            vec![
                Participant::new("A", "a"),
                Participant::new("B", "b"),
                Participant::new("C", "c"),
            ],
            1,
        );
        let tasks = rr.schedule();
        // 3 pairs, one game per color
        assert_eq!(tasks.len(), 6);
        for (x, y) in [("A", "B"), ("A", "C"), ("B", "C")] {
            assert!(tasks.iter().any(|t| t.white.name == x && t.black.name == y));
            assert!(tasks.iter().any(|t| t.white.name == y && t.black.name == x));
        }
        assert!(tasks.iter().all(|t| t.scoring == Scoring::BothSides));
    }

    #[test]
    fn duplicate_participants_are_listed_once() {
        let rr = RoundRobin::new(
            vec![Participant::new("A", "a"), Participant::new("A", "other")],
            1,
        );
        assert_eq!(rr.participants().len(), 1);
        assert!(rr.schedule().is_empty());
    }
}
