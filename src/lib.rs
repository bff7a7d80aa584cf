//! # UCI Tournament
//!
//! A Rust crate for running match series between chess engines speaking UCI, with concurrent
//! games, a shared PGN log and per-opponent statistics.
//!
//! It provides:
//! - Tournament execution ([`Tournament`](crate::tournament::Tournament))
//! - Tournament plans via the `TournamentStrategy` trait
//! - Built-in plans: `Gauntlet`, `HeadToHead` and `RoundRobin`
//! - Time, length and concurrency limits through [`constraints`]
//!
//! Each game is played by two engines, each running as a separate OS process driven over its
//! standard input and output. At most `W` games run at once, each on its own worker thread.
//! Move legality and game termination are decided by [`shakmaty`].
//!
//! # Documentation Overview
//!
//! - For the whole run (preconditions, startup check, log, report), see the [`tournament`]
//!   module.
//! - For driver behavior and game limits, see
//!   [`Configuration`](crate::configuration::Configuration) and [`constraints`].
//! - To understand tournament formats, see the
//!   [`TournamentStrategy`](crate::tournament_strategy::TournamentStrategy) trait and its
//!   implementations.
//! - To plug engines that are not child processes (for tests, for instance), implement the
//!   [`EngineFactory`](crate::engine::EngineFactory) and
//!   [`EngineHandle`](crate::engine::EngineHandle) traits.
//!
//! # Usage Example
//!
//! A challenger against three strength-limited levels of Stockfish:
//!
//! ```no_run
//! use std::time::Duration;
//! use uci_tournament::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let constraints = ConstraintsBuilder::new()
//!         .with_move_time(Duration::from_millis(100))
//!         .with_max_concurrent_games(12)
//!         .build()?;
//!
//!     let challenger = Participant::new("Challenger", "./build/uci");
//!     let opponents = [1320, 1420, 1520]
//!         .into_iter()
//!         .map(|elo| {
//!             Participant::new(format!("SF-{elo}"), "/usr/bin/stockfish")
//!                 .with_option("Threads", 1)
//!                 .with_option("UCI_LimitStrength", true)
//!                 .with_option("UCI_Elo", elo)
//!         })
//!         .collect();
//!
//!     let plan = Gauntlet::new(challenger, opponents, 20);
//!     let report = Tournament::new(Configuration::new(), constraints).run(&plan, "games.pgn")?;
//!
//!     for (opponent, stats) in &report.rows {
//!         println!("{opponent}: {:.1}/{}", stats.score, stats.games());
//!     }
//!     println!("performance: {}", report.rating());
//!     Ok(())
//! }
//! ```
//!
//! ## Engine Requirements
//!
//! - Answer `uci` with `uciok`, and `isready` with `readyok`
//! - Advertise every option it is configured with (`option name ...`)
//! - Answer `go movetime <ms>` with `bestmove <move>` in time, or `bestmove (none)` to resign
//! - Exit on `quit`
#![warn(missing_docs)]

pub use anyhow;
pub mod configuration;
pub mod constraints;
pub mod engine;
pub mod game_log;
pub mod game_runner;
pub mod game_task;
mod logger;
pub mod participant;
pub mod pgn;
pub mod results;
pub mod tournament;
pub mod tournament_scheduler;
pub mod tournament_strategy;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use uci_tournament::prelude::*;
/// ```
///
/// Includes:
/// - [`Configuration`](crate::configuration::Configuration)
/// - [`ConstraintsBuilder`](crate::constraints::ConstraintsBuilder)
/// - [`Participant`](crate::participant::Participant)
/// - [`Tournament`](crate::tournament::Tournament)
/// - all built-in [`Tournament strategies`](crate::tournament_strategy)
pub mod prelude {
    pub use crate::configuration::Configuration;
    pub use crate::constraints::ConstraintsBuilder;
    pub use crate::engine::{EngineFactory, EngineHandle};
    pub use crate::participant::{OptionValue, Participant};
    pub use crate::results::{RatingEstimate, TournamentReport};
    pub use crate::tournament::Tournament;
    pub use crate::tournament_strategy::*;
}
