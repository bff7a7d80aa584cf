use std::sync::Arc;

use common::{participant, Behavior, ScriptedFactory};
use shakmaty::Color;
use uci_tournament::constraints::{Constraints, ConstraintsBuilder};
use uci_tournament::engine::EngineError;
use uci_tournament::game_runner::{GameResult, GameRunner, Termination};
use uci_tournament::game_task::{GameTask, Scoring};
use uci_tournament::participant::Participant;

mod common;

fn constraints() -> Constraints {
    ConstraintsBuilder::new()
        .with_max_concurrent_games(2)
        .build()
        .unwrap()
}

fn task(white: Participant, black: Participant) -> GameTask {
    GameTask {
        id: 0,
        round: 1,
        white: Arc::new(white),
        black: Arc::new(black),
        scoring: Scoring::BothSides,
    }
}

#[test]
fn fools_mate() {
    let factory = ScriptedFactory::new()
        .with("W", Behavior::Script(vec!["f2f3", "g2g4"]))
        .with("B", Behavior::Script(vec!["e7e5", "d8h4"]));
    let runner = GameRunner::new(&factory, constraints(), "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::BlackWin);
    assert_eq!(record.termination, Termination::Checkmate);
    assert_eq!(record.moves, ["f3", "e5", "g4", "Qh4#"]);
    assert_eq!((record.white.as_str(), record.black.as_str()), ("W", "B"));
    assert!(factory.all_released());
}

#[test]
fn shuffling_knights_draw_by_repetition() {
    let factory = ScriptedFactory::new();
    let runner = GameRunner::new(&factory, constraints(), "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::Draw);
    assert_eq!(record.termination, Termination::ThreefoldRepetition);
    // black could return to the start position a third time
    assert_eq!(record.moves.len(), 7);
    assert_eq!(record.moves[..4], ["Nf3", "Nf6", "Ng1", "Ng8"]);
}

#[test]
fn claimable_repetition_ends_the_game_before_the_other_side_plays_on() {
    let factory = ScriptedFactory::new()
        .with("W", Behavior::Script(vec!["g1f3", "f3g1", "g1f3", "f3g1"]))
        .with("B", Behavior::Script(vec!["g8f6", "f6g8", "g8f6", "e7e5"]));
    let runner = GameRunner::new(&factory, constraints(), "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::Draw);
    assert_eq!(record.termination, Termination::ThreefoldRepetition);
    assert_eq!(record.moves.len(), 7);
    assert!(factory.all_released());
}

#[test]
fn move_limit_is_a_draw() {
    let factory = ScriptedFactory::new();
    let limits = ConstraintsBuilder::new()
        .with_max_fullmoves(3)
        .with_max_concurrent_games(1)
        .build()
        .unwrap();
    let runner = GameRunner::new(&factory, limits, "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::Draw);
    assert_eq!(record.termination, Termination::MoveLimit);
    assert_eq!(record.moves.len(), 6);
}

#[test]
fn side_to_move_crashing_forfeits() {
    let factory = ScriptedFactory::new().with("B", Behavior::Crash);
    let runner = GameRunner::new(&factory, constraints(), "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::WhiteWin);
    assert!(matches!(
        record.termination,
        Termination::Forfeit {
            side: Color::Black,
            ..
        }
    ));
    assert_eq!(record.moves, ["Nf3"]);
    assert!(factory.all_released());
}

#[test]
fn silent_engine_loses_on_time() {
    let factory = ScriptedFactory::new().with("W", Behavior::Silent);
    let runner = GameRunner::new(&factory, constraints(), "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::BlackWin);
    assert_eq!(record.termination.pgn_tag(), "time forfeit");
    assert!(record.moves.is_empty());
}

#[test]
fn no_move_is_a_resignation() {
    let factory = ScriptedFactory::new().with("B", Behavior::Script(vec!["e7e5"]));
    let runner = GameRunner::new(&factory, constraints(), "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::WhiteWin);
    assert_eq!(
        record.termination,
        Termination::Resignation { side: Color::Black }
    );
    assert_eq!(record.moves.len(), 3);
}

#[test]
fn illegal_move_forfeits() {
    let factory = ScriptedFactory::new().with("W", Behavior::Script(vec!["e2e5"]));
    let runner = GameRunner::new(&factory, constraints(), "test");

    let record = runner.play(&task(participant("W"), participant("B"))).unwrap();
    assert_eq!(record.result, GameResult::BlackWin);
    match record.termination {
        Termination::Forfeit {
            side,
            timed_out,
            reason,
        } => {
            assert_eq!(side, Color::White);
            assert!(!timed_out);
            assert!(reason.contains("illegal move e2e5"), "{reason}");
        }
        other => panic!("unexpected termination {other:?}"),
    }
}

#[test]
fn rejected_option_aborts_without_result() {
    let factory = ScriptedFactory::new().with("B", Behavior::RejectOptions);
    let runner = GameRunner::new(&factory, constraints(), "test");
    let black = participant("B").with_option("UCI_Elo", 1320);

    let record = runner.play(&task(participant("W"), black)).unwrap();
    assert_eq!(record.result, GameResult::Unknown);
    assert!(matches!(
        record.termination,
        Termination::ConfigurationFailed { .. }
    ));
    assert!(record.moves.is_empty());
    assert!(factory.all_released());
}

#[test]
fn launch_failure_is_an_error_and_releases_the_other_engine() {
    let factory = ScriptedFactory::new().with("B", Behavior::NoLaunch);
    let runner = GameRunner::new(&factory, constraints(), "test");

    let error = runner
        .play(&task(participant("W"), participant("B")))
        .unwrap_err();
    assert!(matches!(error, EngineError::Launch(_)));
    assert_eq!(
        factory
            .launched
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
    assert!(factory.all_released());
}

#[test]
fn headers_come_from_the_task() {
    let factory = ScriptedFactory::new();
    let runner = GameRunner::new(&factory, constraints(), "Book vs No-Book H2H");
    let mut t = task(participant("Book"), participant("NoBook"));
    t.round = 42;

    let record = runner.play(&t).unwrap();
    assert_eq!(record.event, "Book vs No-Book H2H");
    assert_eq!(record.round, 42);
    assert_eq!(record.date.len(), 10);
}
