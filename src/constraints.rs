//! Time, length and concurrency limits applied to every game of a tournament.
//!
//! The main entry point is the [`ConstraintsBuilder`] struct, which uses a builder pattern
//! to configure:
//!
//! - **Timing**:
//!   * per-move time budget sent to the engines (`go movetime`)
//!   * margin after which a silent engine is asked to stop, then forfeited
//!   * handshake and readiness timeouts
//!   * grace period given to an engine to quit before it is killed
//! - **Game length**: maximum number of full moves before the game is adjudicated a draw
//! - **Concurrency**: maximum number of games played at the same time
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use uci_tournament::constraints::ConstraintsBuilder;
//!
//! let constraints = ConstraintsBuilder::new()
//!     .with_move_time(Duration::from_millis(100))
//!     .with_max_concurrent_games(12)
//!     .with_max_fullmoves(200)
//!     .build()
//!     .unwrap();
//! assert_eq!(constraints.max_concurrent_games(), 12);
//! ```
//!
//! Constraints can also be read from environment variables using
//! [`ConstraintsBuilder::from_env()`].

use std::{env, time::Duration};

use anyhow::bail;

/// A builder for the limits applied to games and engines.
///
/// Unset values fall back to: 100ms per move, 1s timeout margin, 10s handshake timeout,
/// 500ms shutdown grace, 200 full moves, and one game per physical CPU.
#[derive(Debug, Default, Clone)]
pub struct ConstraintsBuilder {
    move_time: Option<Duration>,
    timeout_margin: Option<Duration>,
    handshake_timeout: Option<Duration>,
    shutdown_grace: Option<Duration>,
    max_fullmoves: Option<u32>,
    max_concurrent_games: Option<usize>,
}

impl ConstraintsBuilder {
    /// Creates a new `ConstraintsBuilder` with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `ConstraintsBuilder` configured from environment variables.
    ///
    /// Read environment variables are:
    /// - `MOVE_TIME_MS` (u64): time budget per move in milliseconds
    /// - `TIMEOUT_MARGIN_MS` (u64): extra time before a silent engine is stopped, then forfeited
    /// - `HANDSHAKE_TIMEOUT_MS` (u64): time allowed for `uciok` and `readyok`
    /// - `SHUTDOWN_GRACE_MS` (u64): time allowed to quit before being killed
    /// - `MAX_FULLMOVES` (u32): full moves before a draw is adjudicated
    /// - `MAX_CONCURRENT_GAMES` (usize): games running at the same time
    #[must_use]
    pub fn from_env() -> Self {
        fn parse<T: std::str::FromStr>(var: &str) -> Option<T> {
            env::var(var).ok()?.parse().ok()
        }

        fn parse_millis(var: &str) -> Option<Duration> {
            parse::<u64>(var).map(Duration::from_millis)
        }

        ConstraintsBuilder {
            move_time: parse_millis("MOVE_TIME_MS"),
            timeout_margin: parse_millis("TIMEOUT_MARGIN_MS"),
            handshake_timeout: parse_millis("HANDSHAKE_TIMEOUT_MS"),
            shutdown_grace: parse_millis("SHUTDOWN_GRACE_MS"),
            max_fullmoves: parse("MAX_FULLMOVES"),
            max_concurrent_games: parse("MAX_CONCURRENT_GAMES"),
        }
    }

    /// Sets the thinking time given to an engine for each move.
    #[must_use]
    pub fn with_move_time(self, duration: Duration) -> Self {
        Self {
            move_time: Some(duration),
            ..self
        }
    }

    /// Sets how long past its move time an engine may stay silent.
    ///
    /// Once elapsed, the engine receives `stop`, and gets the same margin again before losing
    /// on time.
    #[must_use]
    pub fn with_timeout_margin(self, duration: Duration) -> Self {
        Self {
            timeout_margin: Some(duration),
            ..self
        }
    }

    /// Sets the time allowed to answer `uci` and `isready`.
    #[must_use]
    pub fn with_handshake_timeout(self, duration: Duration) -> Self {
        Self {
            handshake_timeout: Some(duration),
            ..self
        }
    }

    /// Sets the time allowed to exit after `quit` before the process is killed.
    #[must_use]
    pub fn with_shutdown_grace(self, duration: Duration) -> Self {
        Self {
            shutdown_grace: Some(duration),
            ..self
        }
    }

    /// Sets the number of full moves after which the game is a draw.
    #[must_use]
    pub fn with_max_fullmoves(self, max: u32) -> Self {
        Self {
            max_fullmoves: Some(max),
            ..self
        }
    }

    /// Sets the number of games (hence pairs of engine processes) running at the same time.
    #[must_use]
    pub fn with_max_concurrent_games(self, max: usize) -> Self {
        Self {
            max_concurrent_games: Some(max),
            ..self
        }
    }

    /// Values set in `other` take precedence over the ones in `self`.
    #[must_use]
    pub fn overridden_by(self, other: ConstraintsBuilder) -> Self {
        Self {
            move_time: other.move_time.or(self.move_time),
            timeout_margin: other.timeout_margin.or(self.timeout_margin),
            handshake_timeout: other.handshake_timeout.or(self.handshake_timeout),
            shutdown_grace: other.shutdown_grace.or(self.shutdown_grace),
            max_fullmoves: other.max_fullmoves.or(self.max_fullmoves),
            max_concurrent_games: other.max_concurrent_games.or(self.max_concurrent_games),
        }
    }

    /// Consumes the builder and returns the constructed `Constraints`.
    ///
    /// # Errors
    ///
    /// Returns an error when a limit makes playing impossible (zero move time, zero full
    /// moves, zero concurrent games).
    pub fn build(self) -> anyhow::Result<Constraints> {
        let move_time = self.move_time.unwrap_or(Duration::from_millis(100));
        if move_time.is_zero() {
            bail!("move time must be positive");
        }
        let max_fullmoves = self.max_fullmoves.unwrap_or(200);
        if max_fullmoves == 0 {
            bail!("games must allow at least one full move");
        }
        let max_concurrent_games = self
            .max_concurrent_games
            .unwrap_or_else(num_cpus::get_physical);
        if max_concurrent_games == 0 {
            bail!("at least one game must be allowed to run");
        }

        Ok(Constraints {
            move_time,
            timeout_margin: self.timeout_margin.unwrap_or(Duration::from_secs(1)),
            handshake_timeout: self.handshake_timeout.unwrap_or(Duration::from_secs(10)),
            shutdown_grace: self.shutdown_grace.unwrap_or(Duration::from_millis(500)),
            max_fullmoves,
            max_concurrent_games,
        })
    }
}

/// Obtained using `ConstraintsBuilder`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Constraints {
    pub(crate) move_time: Duration,
    pub(crate) timeout_margin: Duration,
    pub(crate) handshake_timeout: Duration,
    pub(crate) shutdown_grace: Duration,
    pub(crate) max_fullmoves: u32,
    pub(crate) max_concurrent_games: usize,
}

impl Constraints {
    /// create a ConstraintsBuilder
    pub fn builder() -> ConstraintsBuilder {
        ConstraintsBuilder::new()
    }

    /// Thinking time per move.
    pub fn move_time(&self) -> Duration {
        self.move_time
    }

    /// Full moves before a draw is adjudicated.
    pub fn max_fullmoves(&self) -> u32 {
        self.max_fullmoves
    }

    /// Games running at the same time.
    pub fn max_concurrent_games(&self) -> usize {
        self.max_concurrent_games
    }
}
