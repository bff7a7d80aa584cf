//! Bounded pool of workers playing the games of a tournament.
//!
//! [`MatchScheduler::run`] starts `min(W, tasks)` worker threads. Each one takes the next task
//! from a shared queue, plays it to the end, hands the result to a [`GameSink`], and starts
//! again until the queue is empty. At most `W` games are running at any time, and results
//! arrive in completion order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::anyhow;
use tracing::{debug, error, info, instrument};

use crate::game_runner::GameRecord;
use crate::game_task::GameTask;

/// Receives the outcome of every task, from the worker that ran it.
pub trait GameSink: Sync {
    /// `task` was played to the end.
    fn game_finished(&self, task: &GameTask, record: GameRecord);

    /// `task` could not be played: the game runner returned an error or panicked.
    fn task_failed(&self, task: &GameTask, error: &anyhow::Error);
}

/// Shared flag asking the scheduler to stop starting games.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Unraised flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Running games finish, the others are skipped.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag was raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to the submitted tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    /// Tasks given to the scheduler.
    pub submitted: usize,
    /// Tasks that produced a game record.
    pub completed: usize,
    /// Tasks that ended with an error, excluded from the statistics.
    pub failed: usize,
    /// Tasks never started because of a cancellation.
    pub skipped: usize,
}

/// Runs game tasks on a bounded number of worker threads.
#[derive(Debug, Clone)]
pub struct MatchScheduler {
    max_workers: usize,
    cancel: Option<CancelFlag>,
}

impl MatchScheduler {
    /// Scheduler running at most `max_workers` games at once (at least one).
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            cancel: None,
        }
    }

    /// Stop starting games once `flag` is raised.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Play every task with `play`, and report each outcome to `sink`.
    ///
    /// Blocks until every task has completed, failed or been skipped.
    #[instrument(skip_all, fields(tasks = tasks.len()))]
    pub fn run<P>(&self, tasks: Vec<GameTask>, play: P, sink: &dyn GameSink) -> ScheduleSummary
    where
        P: Fn(&GameTask) -> anyhow::Result<GameRecord> + Sync,
    {
        let submitted = tasks.len();
        let workers = self.max_workers.min(submitted);
        info!(workers, "scheduling {submitted} games");

        let (tx, rx) = crossbeam_channel::unbounded();
        for task in tasks {
            // receiver is alive, cannot fail
            let _ = tx.send(task);
        }
        drop(tx);

        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        thread::scope(|s| {
            for worker in 0..workers {
                let rx = rx.clone();
                let (play, completed, failed, skipped) = (&play, &completed, &failed, &skipped);
                s.spawn(move || {
                    for task in rx.iter() {
                        if self.is_cancelled() {
                            skipped.fetch_add(1, Ordering::SeqCst);
                            continue;
                        }
                        debug!(worker, "starting {task}");
                        match Self::play_guarded(play, &task) {
                            Ok(record) => {
                                sink.game_finished(&task, record);
                                completed.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(e) => {
                                error!(task = task.id, "game {task} dropped: {e:#}");
                                sink.task_failed(&task, &e);
                                failed.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                    }
                });
            }
        });

        let summary = ScheduleSummary {
            submitted,
            completed: completed.into_inner(),
            failed: failed.into_inner(),
            skipped: skipped.into_inner(),
        };
        info!(?summary, "scheduling done");
        summary
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// A panic while playing is turned into an error, so that one game cannot take its worker
    /// down.
    fn play_guarded<P>(play: &P, task: &GameTask) -> anyhow::Result<GameRecord>
    where
        P: Fn(&GameTask) -> anyhow::Result<GameRecord>,
    {
        panic::catch_unwind(AssertUnwindSafe(|| play(task))).unwrap_or_else(|payload| {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow!("game runner panicked: {msg}"))
        })
    }
}
