//! Head-to-head: the engine with its opening book against itself without it.
//!
//! 200 games, the first 100 with the book side playing white. Games are saved to
//! `h2h_book_vs_nobook.pgn` as they finish.
//!
//! Paths can be changed with `H2H_ENGINE` and `H2H_BOOK`. Game limits can be changed with the
//! variables read by `ConstraintsBuilder::from_env`.

use std::{env, path::PathBuf, process::ExitCode, time::Duration};

use uci_tournament::prelude::*;

const TOTAL_GAMES: u32 = 200;
// both sides are local engines
const MAX_WORKERS: usize = 20;
const MOVE_TIME: Duration = Duration::from_millis(100);
const PGN_PATH: &str = "h2h_book_vs_nobook.pgn";

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
    let engine = path_from_env("H2H_ENGINE", "build/uci_6000");
    let book = path_from_env("H2H_BOOK", "../books/book_large.bin");

    let with_book = Participant::new("Book", &engine)
        .with_args(["-book".to_string(), book.display().to_string()]);
    let without_book = Participant::new("NoBook", &engine);
    let plan = HeadToHead::new(with_book, without_book, TOTAL_GAMES)
        .with_event("Book vs No-Book H2H")
        .with_required_file("book", book);

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
