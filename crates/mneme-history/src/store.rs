// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file backed history store.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use mneme_core::{MnemeError, Turn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// On-disk shape of the ledger: `{"message_history": [...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    message_history: Vec<Turn>,
}

/// Durable ledger of completed turns.
///
/// Every mutation is a full read-modify-write of the file. Turn ids are
/// `len + 1` at append time, so an id freed by [`remove`](Self::remove) can
/// be handed out again.
///
/// The store assumes a single writer. Two processes appending concurrently
/// can lose turns: both read the same ledger and the later rename wins.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every persisted turn.
    ///
    /// A missing, unreadable, or malformed file reads as an empty history.
    pub fn load(&self) -> Vec<Turn> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "history file not readable, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_reader::<_, Ledger>(BufReader::new(file)) {
            Ok(ledger) => ledger.message_history,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history file is malformed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replace the whole ledger with `turns`.
    ///
    /// The document is written to a sibling temp file, synced, then renamed
    /// over the target, so readers see either the old or the new ledger.
    pub fn save(&self, turns: &[Turn]) -> Result<(), MnemeError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(storage)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(storage)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(
                &mut writer,
                &LedgerRef {
                    message_history: turns,
                },
            )
            .map_err(storage)?;
            writer.flush().map_err(storage)?;
        }
        tmp.as_file().sync_all().map_err(storage)?;
        tmp.persist(&self.path).map_err(|e| storage(e.error))?;

        debug!(path = %self.path.display(), turns = turns.len(), "history saved");
        Ok(())
    }

    /// Record a completed turn and return it with its assigned id.
    pub fn append(&self, prompt: &str, response: &str) -> Result<Turn, MnemeError> {
        let mut turns = self.load();
        let turn = Turn {
            id: turns.len() as u64 + 1,
            prompt: prompt.to_string(),
            response: response.to_string(),
        };
        turns.push(turn.clone());
        self.save(&turns)?;
        Ok(turn)
    }

    /// Drop every turn carrying `id`. Returns how many were removed.
    ///
    /// The ledger is rewritten even when nothing matched.
    pub fn remove(&self, id: u64) -> Result<usize, MnemeError> {
        let mut turns = self.load();
        let before = turns.len();
        turns.retain(|turn| turn.id != id);
        let removed = before - turns.len();
        self.save(&turns)?;
        Ok(removed)
    }

    /// Number of persisted turns.
    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize)]
struct LedgerRef<'a> {
    message_history: &'a [Turn],
}

fn storage<E>(e: E) -> MnemeError
where
    E: std::error::Error + Send + Sync + 'static,
{
    MnemeError::Storage {
        source: Box::new(e),
    }
}
