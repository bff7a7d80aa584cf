//! Config for the tournament driver behaviors
//!
//! This module provides configuration options for controlling the behavior of the driver.
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Flags are case-insensitive, set them to `"true"` to enable them.
//!
//! - `TOURNEY_VERBOSE`: print the banner, progress lines and final report (default: `true`)
//! - `TOURNEY_LOG`: enable logging to a file (default: `false`)
//! - `TOURNEY_GRACEFUL_CANCEL`: on Ctrl-C, stop starting games and let running ones finish
//!   (default: `true`)
//! - `TOURNEY_DEBUG_ENGINE_STDERR`: let engines write to stderr (default: `false`)
//! - `TOURNEY_PROGRESS_INTERVAL`: print progress every this many games (default: set by the
//!   tournament plan)

/// Configuration for driver behaviors.
#[derive(Debug, Clone, Copy)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) graceful_cancel: bool,
    pub(crate) debug_engine_stderr: bool,
    pub(crate) progress_interval: Option<usize>,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - The driver prints progress and results to stdout.
    /// - Logging to file is disabled.
    /// - Ctrl-C cancels the tournament gracefully.
    /// - Engine stderr output is discarded.
    /// - Progress cadence is the one of the tournament plan.
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
            graceful_cancel: true,
            debug_engine_stderr: false,
            progress_interval: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// The following environment variables are recognized:
    /// - `TOURNEY_VERBOSE`: if set to `"true"`, enables verbose output (default: `true`)
    /// - `TOURNEY_LOG`: if set to `"true"`, enables logging to file (default: `false`)
    /// - `TOURNEY_GRACEFUL_CANCEL`: if set to `"true"`, installs the Ctrl-C handler (default: `true`)
    /// - `TOURNEY_DEBUG_ENGINE_STDERR`: if set to `"true"`, shows engines stderr (default: `false`)
    /// - `TOURNEY_PROGRESS_INTERVAL`: a positive integer (default: unset)
    ///
    /// Any other value (including unset) will result in using the default value for each field.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        Self {
            verbose: get_env_flag("TOURNEY_VERBOSE", true),
            log: get_env_flag("TOURNEY_LOG", false),
            graceful_cancel: get_env_flag("TOURNEY_GRACEFUL_CANCEL", true),
            debug_engine_stderr: get_env_flag("TOURNEY_DEBUG_ENGINE_STDERR", false),
            progress_interval: std::env::var("TOURNEY_PROGRESS_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0),
        }
    }

    /// Enable or disable console output.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Enable or disable graceful cancellation on Ctrl-C.
    ///
    /// When disabled, Ctrl-C kills the program right away.
    pub fn with_graceful_cancel(mut self, value: bool) -> Self {
        self.graceful_cancel = value;
        self
    }

    /// Enable or disable engine stderr output (debug purposes only).
    pub fn with_debug_engine_stderr(mut self, value: bool) -> Self {
        self.debug_engine_stderr = value;
        self
    }

    /// Print a progress line every `games` finished games, instead of the plan's cadence.
    pub fn with_progress_interval(mut self, games: usize) -> Self {
        self.progress_interval = Some(games.max(1));
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
