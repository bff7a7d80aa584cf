//! Core driver logic for running engine tournaments.
//!
//! This module defines the [`Tournament`] type, which orchestrates a whole run:
//!
//! - Checking that every required file (engines, books, ...) exists
//! - Launching each participant once, so that a broken engine stops the run before any game
//! - Truncating the PGN log, then playing every game of a [`TournamentStrategy`] on a bounded
//!   pool of workers
//! - Tallying results as games finish, and returning the final [`TournamentReport`]
//!
//! # Behavior & Configuration
//!
//! Behavior is controlled by a [`Configuration`] object, and game limits by [`Constraints`].
//! When `config.graceful_cancel = true`, the first Ctrl-C stops the scheduling of new games
//! while running ones finish and get logged; a second one exits immediately.
//!
//! # Example
//!
//! ```no_run
//! use uci_tournament::prelude::*;
//!
//! let plan = HeadToHead::new(
//!     Participant::new("Book", "./uci").with_args(["-book", "book.bin"]),
//!     Participant::new("NoBook", "./uci"),
//!     200,
//! );
//! let constraints = ConstraintsBuilder::new()
//!     .with_max_concurrent_games(20)
//!     .build()
//!     .unwrap();
//! let report = Tournament::new(Configuration::from_env(), constraints)
//!     .run(&plan, "h2h.pgn")
//!     .unwrap();
//! println!("{}", report.rating());
//! ```

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use anyhow::{bail, Context};
use tracing::{error, info, instrument, trace, warn};

use crate::configuration::Configuration;
use crate::constraints::Constraints;
use crate::engine::{EngineFactory, EngineHandle, ProcessEngineFactory};
use crate::game_log::GameLogWriter;
use crate::game_runner::{GameRecord, GameResult, GameRunner};
use crate::game_task::GameTask;
use crate::logger::init_logger;
use crate::results::{ResultsAggregator, TournamentReport};
use crate::tournament_scheduler::{CancelFlag, GameSink, MatchScheduler};
use crate::tournament_strategy::{ReportStyle, TournamentStrategy};

/// The main type for running engine tournaments.
///
/// # Type Parameters
/// - `F`: how engines are started, UCI child processes by default
pub struct Tournament<F: EngineFactory = ProcessEngineFactory> {
    factory: F,
    config: Configuration,
    constraints: Constraints,
}

impl Tournament<ProcessEngineFactory> {
    /// Create a [`Tournament`] whose engines are UCI child processes.
    pub fn new(config: Configuration, constraints: Constraints) -> Self {
        let factory = ProcessEngineFactory::new(&constraints, config.debug_engine_stderr);
        Self::with_factory(factory, config, constraints)
    }
}

impl<F: EngineFactory> Tournament<F> {
    /// Create a [`Tournament`] whose engines come from `factory`.
    #[instrument(skip_all)]
    pub fn with_factory(factory: F, config: Configuration, constraints: Constraints) -> Self {
        if config.log {
            if let Err(e) = init_logger() {
                eprintln!("logging disabled: {e:#}");
            }
        }
        trace!(?config, ?constraints);

        Tournament {
            factory,
            config,
            constraints,
        }
    }

    /// Play every game of `strategy`, writing them to the PGN file `log_path`.
    ///
    /// Games dropped because of a scheduler-level error are logged and reported, but do not
    /// fail the run.
    ///
    /// # Errors
    /// Returns an error, before any game is played, if a required file is missing, if a
    /// participant cannot be launched, or if the log cannot be created.
    pub fn run<T: TournamentStrategy>(
        &self,
        strategy: &T,
        log_path: impl AsRef<Path>,
    ) -> anyhow::Result<TournamentReport> {
        // 1. preconditions
        Self::check_required_files(strategy)?;
        self.check_participants(strategy)?;

        // 2. fresh log
        let log = GameLogWriter::create(log_path.as_ref())?;

        // 3. rows in report order
        let results = ResultsAggregator::new();
        for row in strategy.rows() {
            results.register(&row);
        }

        let tasks = strategy.schedule();
        let workers = self.constraints.max_concurrent_games();
        if self.config.verbose {
            self.print_banner(strategy, tasks.len(), workers);
        }

        // 4. scheduler, cancellable with Ctrl-C
        let mut scheduler = MatchScheduler::new(workers);
        if self.config.graceful_cancel {
            if let Some(flag) = ctrl_c_flag() {
                scheduler = scheduler.with_cancel_flag(flag);
            }
        }

        // 5. play
        let sink = Recorder {
            results: &results,
            log: &log,
            progress: Mutex::new(0),
            total: tasks.len(),
            interval: self
                .config
                .progress_interval
                .unwrap_or_else(|| strategy.progress_interval())
                .max(1),
            style: strategy.report_style(),
            verbose: self.config.verbose,
        };
        let runner = GameRunner::new(&self.factory, self.constraints, strategy.event());
        let summary = scheduler.run(
            tasks,
            |task| runner.play(task).map_err(anyhow::Error::from),
            &sink,
        );

        // 6. report
        let report = results.final_report(strategy.title(), summary);
        info!(?summary, "tournament over");
        if self.config.verbose {
            println!(
                "\nPGN saved to: {} ({} games)",
                log.path().display(),
                report.logged()
            );
            println!();
            print!("{}", render(&report, &strategy.report_style()));
            println!("{}", report.counts());
        }
        Ok(report)
    }

    fn check_required_files<T: TournamentStrategy>(strategy: &T) -> anyhow::Result<()> {
        for (description, path) in strategy.required_files() {
            if !path.is_file() {
                bail!("Missing {description}: {}", path.display());
            }
        }
        Ok(())
    }

    /// Start and stop every participant once.
    #[instrument(skip_all)]
    fn check_participants<T: TournamentStrategy>(&self, strategy: &T) -> anyhow::Result<()> {
        for participant in strategy.participants() {
            let mut engine = self
                .factory
                .launch(&participant)
                .with_context(|| format!("could not start {}", participant.name))?;
            engine.shutdown();
            info!("{} is ready", participant.name);
        }
        Ok(())
    }

    fn print_banner<T: TournamentStrategy>(&self, strategy: &T, games: usize, workers: usize) {
        println!("{}: {games} games", strategy.event());
        let names = strategy
            .participants()
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>();
        println!("Participants: {}", names.join(", "));
        println!(
            "Time control: {}s/move, max {} concurrent",
            self.constraints.move_time().as_secs_f64(),
            workers.min(games.max(1))
        );
        println!();
    }
}

/// Flag raised by the first Ctrl-C, `None` if the handler could not be installed.
///
/// A process has a single Ctrl-C handler, so every run shares it: once raised, later runs of
/// the same process skip all their games.
fn ctrl_c_flag() -> Option<CancelFlag> {
    static FLAG: OnceLock<Option<CancelFlag>> = OnceLock::new();
    FLAG.get_or_init(|| {
        let flag = CancelFlag::new();
        let raised = flag.clone();
        let result = ctrlc::set_handler(move || {
            if raised.is_cancelled() {
                std::process::exit(130);
            }
            println!("\nInterrupted: finishing running games, press Ctrl-C again to quit now");
            raised.cancel();
        });
        match result {
            Ok(()) => Some(flag),
            Err(e) => {
                warn!("Ctrl-C handler not installed: {e}");
                None
            }
        }
    })
    .clone()
}

/// Final report, laid out as the plan asks.
pub fn render(report: &TournamentReport, style: &ReportStyle) -> String {
    match style {
        ReportStyle::Table {
            first_column,
            with_rating,
        } => {
            let mut out = report.table(first_column);
            if *with_rating {
                out.push_str(&format!("Performance: {} Elo\n", report.rating()));
            }
            out
        }
        ReportStyle::Duel { tracked, other } => report.duel(tracked, other),
    }
}

/// Records each game as it finishes: statistics, log, then progress line.
struct Recorder<'a> {
    results: &'a ResultsAggregator,
    log: &'a GameLogWriter,
    /// games done, also serializes console output
    progress: Mutex<usize>,
    total: usize,
    interval: usize,
    style: ReportStyle,
    verbose: bool,
}

impl Recorder<'_> {
    fn tick(&self, line: Option<String>) {
        let mut done = self.progress.lock().expect("poisoned");
        *done += 1;
        if !self.verbose {
            return;
        }
        if let Some(line) = line {
            println!("{line}");
        }
        if *done % self.interval == 0 || *done == self.total {
            println!("{}", self.progress_line(*done));
        }
    }

    fn progress_line(&self, done: usize) -> String {
        let prefix = format!("  [{done}/{}]", self.total);
        let label = match &self.style {
            ReportStyle::Duel { tracked, .. } => format!("{tracked} "),
            ReportStyle::Table {
                with_rating: true, ..
            } => String::new(),
            ReportStyle::Table { .. } => return format!("{prefix} games complete"),
        };
        let total = self.results.total();
        format!(
            "{prefix} {label}+{} ={} -{}  Score: {:.1}/{} ({:.1}%)",
            total.wins,
            total.draws,
            total.losses,
            total.score,
            total.games(),
            total.percentage()
        )
    }
}

impl GameSink for Recorder<'_> {
    fn game_finished(&self, task: &GameTask, record: GameRecord) {
        for (key, score) in task.score_entries(record.result) {
            self.results.record(&key, score);
        }
        if record.result == GameResult::Unknown {
            self.results.record_unfinished();
        }
        let line = self.log.append(&record).err().map(|e| {
            error!(task = task.id, "LogWriteError: {e:#}");
            self.results.record_unlogged();
            format!("  LOG ERROR game {task}: {e:#}")
        });
        self.tick(line);
    }

    fn task_failed(&self, task: &GameTask, error: &anyhow::Error) {
        self.tick(Some(format!("  ERROR game {task}: {error:#}")));
    }
}
