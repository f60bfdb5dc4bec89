//! Round Ledger
//!
//! Append-only log of round events: every round is logged when its
//! commitment is published, then once more when it settles or is cancelled.
//! The highest round id ever logged seeds the round counter on restart, so
//! ids (and nonces) are never handed out twice.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::proof::record::{CancelledRound, OpenedRound, RoundRecord};

/// Ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Round already recorded; records are never overwritten.
    #[error("round {0} already recorded")]
    DuplicateRound(u64),

    /// Storage I/O failure.
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failure.
    #[error("ledger encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEntry {
    /// Commitment published, round accepting entries.
    Opened(OpenedRound),
    /// Outcome drawn and paid.
    Settled(RoundRecord),
    /// Round abandoned, seed published.
    Cancelled(CancelledRound),
}

impl LedgerEntry {
    /// Round the event belongs to.
    pub fn round_id(&self) -> u64 {
        match self {
            Self::Opened(opened) => opened.round_id,
            Self::Settled(record) => record.round_id,
            Self::Cancelled(cancelled) => cancelled.round_id,
        }
    }
}

/// Append-only round event store.
pub trait RoundLedger: Send + Sync {
    /// Persist one event.
    ///
    /// Fails with `DuplicateRound` if an opening does not advance the round
    /// id, or if the round was already settled or cancelled.
    fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError>;

    /// Fetch a settled round by id.
    fn get(&self, round_id: u64) -> Option<RoundRecord>;

    /// Fetch a cancelled round by id.
    fn cancelled(&self, round_id: u64) -> Option<CancelledRound>;

    /// Highest settled round.
    fn latest(&self) -> Option<RoundRecord>;

    /// Highest round id in any event (0 if none).
    fn last_round_id(&self) -> u64;

    /// Number of settled rounds.
    fn len(&self) -> usize;

    /// True if no round has been settled.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct LedgerIndex {
    settled: BTreeMap<u64, RoundRecord>,
    cancelled: BTreeMap<u64, CancelledRound>,
    last_round_id: u64,
}

impl LedgerIndex {
    fn check(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let round_id = entry.round_id();
        let duplicate = match entry {
            LedgerEntry::Opened(_) => round_id <= self.last_round_id,
            LedgerEntry::Settled(_) | LedgerEntry::Cancelled(_) => {
                self.settled.contains_key(&round_id) || self.cancelled.contains_key(&round_id)
            }
        };
        if duplicate {
            return Err(LedgerError::DuplicateRound(round_id));
        }
        Ok(())
    }

    fn apply(&mut self, entry: &LedgerEntry) {
        match entry {
            LedgerEntry::Opened(_) => {}
            LedgerEntry::Settled(record) => {
                self.settled.insert(record.round_id, record.clone());
            }
            LedgerEntry::Cancelled(cancelled) => {
                self.cancelled.insert(cancelled.round_id, cancelled.clone());
            }
        }
        self.last_round_id = self.last_round_id.max(entry.round_id());
    }
}

/// Volatile ledger, for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    index: RwLock<LedgerIndex>,
}

impl InMemoryLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .check(entry)
    }
}

impl RoundLedger for InMemoryLedger {
    fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        index.check(entry)?;
        index.apply(entry);
        Ok(())
    }

    fn get(&self, round_id: u64) -> Option<RoundRecord> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.settled.get(&round_id).cloned()
    }

    fn cancelled(&self, round_id: u64) -> Option<CancelledRound> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.cancelled.get(&round_id).cloned()
    }

    fn latest(&self) -> Option<RoundRecord> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.settled.values().next_back().cloned()
    }

    fn last_round_id(&self) -> u64 {
        self.index.read().unwrap_or_else(PoisonError::into_inner).last_round_id
    }

    fn len(&self) -> usize {
        self.index.read().unwrap_or_else(PoisonError::into_inner).settled.len()
    }
}

/// Durable ledger: one JSON event per line, append-only.
///
/// The file is replayed into an in-memory index on open. A trailing line
/// without its newline is a torn write and is cut off.
#[derive(Debug)]
pub struct JsonLinesLedger {
    path: PathBuf,
    file: Mutex<File>,
    index: InMemoryLedger,
}

impl JsonLinesLedger {
    /// Open (or create) the ledger file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let index = InMemoryLedger::new();
        let mut intact_len = 0usize;
        let mut file_len = 0usize;

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            file_len = contents.len();

            let mut rest = contents.as_str();
            while let Some(end) = rest.find('\n') {
                let line = &rest[..end];
                if !line.trim().is_empty() {
                    let entry: LedgerEntry = serde_json::from_str(line)?;
                    index.append(&entry)?;
                }
                intact_len += end + 1;
                rest = &rest[end + 1..];
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        if intact_len < file_len {
            warn!(
                path = %path.display(),
                discarded_bytes = file_len - intact_len,
                "Discarding torn trailing ledger line"
            );
            file.set_len(intact_len as u64)?;
        }
        info!(
            path = %path.display(),
            rounds = index.len(),
            last_round_id = index.last_round_id(),
            "Ledger opened"
        );

        Ok(Self {
            path,
            file: Mutex::new(file),
            index,
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoundLedger for JsonLinesLedger {
    fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        // Hold the file lock across check + write so duplicates cannot race.
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        self.index.check(entry)?;

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let start = file.metadata()?.len();
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|()| file.flush()) {
            // Never leave a partial line for the next append to glue onto.
            if let Err(truncate) = file.set_len(start) {
                error!(
                    path = %self.path.display(),
                    error = %truncate,
                    "Failed to roll back partial ledger write"
                );
            }
            return Err(e.into());
        }

        self.index.append(entry)?;
        debug!(round_id = entry.round_id(), "Round event appended to ledger");
        Ok(())
    }

    fn get(&self, round_id: u64) -> Option<RoundRecord> {
        self.index.get(round_id)
    }

    fn cancelled(&self, round_id: u64) -> Option<CancelledRound> {
        self.index.cancelled(round_id)
    }

    fn latest(&self) -> Option<RoundRecord> {
        self.index.latest()
    }

    fn last_round_id(&self) -> u64 {
        self.index.last_round_id()
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
