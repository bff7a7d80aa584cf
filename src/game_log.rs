//! Append-only PGN log shared by every worker.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;

use crate::game_runner::GameRecord;
use crate::pgn;

/// Writes each finished game to the log file as one contiguous PGN entry.
#[derive(Debug)]
pub struct GameLogWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl GameLogWriter {
    /// Create `path`, truncating any previous log.
    ///
    /// # Errors
    /// If the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("could not create game log {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record`, followed by a blank line.
    ///
    /// The entry is serialized before taking the lock, then written in a single call, so entries
    /// from concurrent games never interleave.
    ///
    /// # Errors
    /// If the write fails. The log may then end with a partial entry.
    pub fn append(&self, record: &GameRecord) -> anyhow::Result<()> {
        let mut entry = pgn::to_pgn(record);
        entry.push('\n');

        let mut file = self.file.lock().expect("poisoned");
        file.write_all(entry.as_bytes())
            .and_then(|_| file.flush())
            .with_context(|| format!("could not write to {}", self.path.display()))
    }
}
