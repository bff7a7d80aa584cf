//! Challenger vs Stockfish at every `UCI_Elo` level from 1320 to 2420, by steps of 100.
//!
//! 20 games per level, half of them with each color. Games are saved to `tournament.pgn` as
//! they finish.
//!
//! Paths can be changed with `GAUNTLET_ENGINE` (challenger) and `GAUNTLET_OPPONENT`
//! (Stockfish). Game limits can be changed with the variables read by
//! `ConstraintsBuilder::from_env`.

use std::{env, path::PathBuf, process::ExitCode, time::Duration};

use uci_tournament::prelude::*;

const GAMES_PER_LEVEL: u32 = 20;
const MAX_WORKERS: usize = 12;
const MOVE_TIME: Duration = Duration::from_millis(100);
const PGN_PATH: &str = "tournament.pgn";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let engine = path_from_env("GAUNTLET_ENGINE", "chess/engine/build/uci");
    let stockfish = path_from_env("GAUNTLET_OPPONENT", "/usr/local/bin/stockfish");
    if !engine.is_file() {
        anyhow::bail!(
            "Engine not found: {}\nBuild: cd chess/engine && make uci",
            engine.display()
        );
    }

    let challenger = Participant::new("Challenger", engine);
    let opponents = (1320..=2420)
        .step_by(100)
        .map(|elo: u32| {
            Participant::new(format!("SF-{elo}"), &stockfish)
                .with_option("Threads", 1)
                .with_option("UCI_LimitStrength", true)
                .with_option("UCI_Elo", elo)
        })
        .collect();
    let plan = Gauntlet::new(challenger, opponents, GAMES_PER_LEVEL)
        .with_event("Challenger vs Stockfish");

    let constraints = ConstraintsBuilder::new()
        .with_move_time(MOVE_TIME)
        .with_max_concurrent_games(MAX_WORKERS)
        .overridden_by(ConstraintsBuilder::from_env())
        .build()?;

    Tournament::new(Configuration::from_env(), constraints).run(&plan, PGN_PATH)?;
    Ok(())
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    env::var_os(var).map_or_else(|| PathBuf::from(default), PathBuf::from)
}
