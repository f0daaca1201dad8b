//! Battle history.
//!
//! Finished battles are appended to a [`HistoryStore`] as [`BattleRecord`]s
//! and never modified afterwards. [`HistorySummary`] condenses a history
//! into the figures shown on the stats screen.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of winners listed in a summary
pub const TOP_WINNERS: usize = 3;

/// Number of recent battles listed in a summary
pub const RECENT_BATTLES: usize = 5;

/// Outcome of one finished battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// Winner's display name
    pub winner: String,
    /// Loser's display name
    pub loser: String,
    pub date: DateTime<Utc>,
}

impl BattleRecord {
    pub fn new(winner: impl Into<String>, loser: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            winner: winner.into(),
            loser: loser.into(),
            date,
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Ordered, append-only log of battle records.
pub trait HistoryStore {
    /// Append a record at the end of the log.
    fn append(&mut self, record: &BattleRecord) -> Result<()>;

    /// Every record, oldest first.
    fn load_all(&self) -> Result<Vec<BattleRecord>>;
}

impl<H: HistoryStore + ?Sized> HistoryStore for Box<H> {
    fn append(&mut self, record: &BattleRecord) -> Result<()> {
        (**self).append(record)
    }

    fn load_all(&self) -> Result<Vec<BattleRecord>> {
        (**self).load_all()
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// History kept in a `Vec`, for tests and throwaway sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryHistory {
    records: Vec<BattleRecord>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[BattleRecord] {
        &self.records
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, record: &BattleRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<BattleRecord>> {
        Ok(self.records.clone())
    }
}

// ============================================================================
// JSON lines file
// ============================================================================

/// One JSON-encoded record per line.
///
/// The file is opened in append mode for every write and flushed before
/// returning, so a crash loses at most the record being written. Lines that
/// fail to parse are skipped with a warning when loading.
#[derive(Clone, Debug)]
pub struct JsonLinesHistory {
    path: PathBuf,
}

impl JsonLinesHistory {
    /// Use `path`, creating parent directories as needed. The file itself
    /// is created on first append.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        tracing::debug!("Opened history log: {}", path.display());
        Ok(Self { path })
    }

    /// Use an existing log for reading only. Nothing is created; a missing
    /// file loads as an empty history.
    pub fn open_read_only(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonLinesHistory {
    fn append(&mut self, record: &BattleRecord) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<BattleRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BattleRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    line = index + 1,
                    path = %self.path.display(),
                    "skipping corrupt history line: {e}"
                ),
            }
        }
        Ok(records)
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Wins per creature name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerTally {
    pub name: String,
    pub wins: usize,
}

/// Stats-screen view of a history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_battles: usize,
    /// Most wins first, ties by name
    pub top_winners: Vec<WinnerTally>,
    /// Newest first
    pub recent: Vec<BattleRecord>,
}

impl HistorySummary {
    pub fn from_records(records: &[BattleRecord]) -> Self {
        let mut wins: HashMap<&str, usize> = HashMap::new();
        for record in records {
            *wins.entry(record.winner.as_str()).or_default() += 1;
        }
        let mut top_winners: Vec<WinnerTally> = wins
            .into_iter()
            .map(|(name, wins)| WinnerTally {
                name: name.to_string(),
                wins,
            })
            .collect();
        top_winners.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name)));
        top_winners.truncate(TOP_WINNERS);

        // Log order, not timestamps: the latest append comes first
        let recent = records
            .iter()
            .rev()
            .take(RECENT_BATTLES)
            .cloned()
            .collect();

        Self {
            total_battles: records.len(),
            top_winners,
            recent,
        }
    }

    /// Load a store and summarize it
    pub fn load<H: HistoryStore + ?Sized>(store: &H) -> Result<Self> {
        Ok(Self::from_records(&store.load_all()?))
    }
}
