//! Score persistence.
//!
//! The engine only depends on the [`ScoreStore`] contract. Failures are reported back
//! as [`StorageError`] and the engine logs them; they never end a session.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize progress: {0}")]
    Serialize(#[from] serde_yaml_ng::Error),

    #[error("Progress store is unavailable")]
    Unavailable,
}

/// Persistence contract consumed by the engine.
#[cfg_attr(test, mockall::automock)]
pub trait ScoreStore: Send + Sync {
    /// Best score recorded so far, 0 when nothing has been stored.
    fn load_high_score(&self) -> Result<u64, StorageError>;

    /// Offer a score; returns true if it became the new high score.
    fn update_high_score(&self, score: u64) -> Result<bool, StorageError>;

    /// Add a finished game to the cumulative statistics.
    fn record_completed_game(
        &self,
        correct: u32,
        total: u32,
        elapsed_secs: f64,
    ) -> Result<(), StorageError>;
}

/// Cumulative player progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub high_score: u64,
    pub total_games: u32,
    pub total_correct: u32,
    pub total_questions: u32,
    pub total_time_secs: f64,
    pub best_correct: u32,
    pub last_played_unix: Option<u64>,
}

impl ProgressRecord {
    fn apply_score(&mut self, score: u64) -> bool {
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }

    fn apply_game(&mut self, correct: u32, total: u32, elapsed_secs: f64) {
        self.total_games += 1;
        self.total_correct += correct;
        self.total_questions += total;
        self.total_time_secs += elapsed_secs.max(0.0);
        self.best_correct = self.best_correct.max(correct);
        self.last_played_unix = Some(unix_now());
    }

    /// Overall accuracy across all recorded games.
    pub fn accuracy_percent(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_questions as f64 * 100.0
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Progress kept in a YAML file (`Manitas Progress.yaml`).
///
/// The whole record is rewritten on every update.
#[derive(Debug)]
pub struct YamlScoreStore {
    path: Utf8PathBuf,
    record: Mutex<ProgressRecord>,
}

impl YamlScoreStore {
    /// Open the store, starting from an empty record when the file does not exist.
    pub fn open<P: AsRef<Utf8Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let record = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            serde_yaml_ng::from_str(&contents)?
        } else {
            tracing::debug!("Progress file not found at {}, starting fresh", path);
            ProgressRecord::default()
        };

        Ok(Self {
            path,
            record: Mutex::new(record),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Copy of the current progress.
    pub fn export(&self) -> Result<ProgressRecord, StorageError> {
        let record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(record.clone())
    }

    /// Reset progress and remove the file.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        *record = ProgressRecord::default();
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        tracing::info!("Cleared progress at {}", self.path);
        Ok(())
    }

    fn persist(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let yaml = serde_yaml_ng::to_string(record)?;
        fs::write(&self.path, yaml).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ScoreStore for YamlScoreStore {
    fn load_high_score(&self) -> Result<u64, StorageError> {
        let record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(record.high_score)
    }

    fn update_high_score(&self, score: u64) -> Result<bool, StorageError> {
        let mut record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        let is_new = record.apply_score(score);
        if is_new {
            self.persist(&record)?;
        }
        Ok(is_new)
    }

    fn record_completed_game(
        &self,
        correct: u32,
        total: u32,
        elapsed_secs: f64,
    ) -> Result<(), StorageError> {
        let mut record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        record.apply_game(correct, total, elapsed_secs);
        self.persist(&record)
    }
}

/// Store that keeps progress in memory only.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    record: Mutex<ProgressRecord>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(&self) -> Result<ProgressRecord, StorageError> {
        let record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(record.clone())
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_high_score(&self) -> Result<u64, StorageError> {
        let record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(record.high_score)
    }

    fn update_high_score(&self, score: u64) -> Result<bool, StorageError> {
        let mut record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(record.apply_score(score))
    }

    fn record_completed_game(
        &self,
        correct: u32,
        total: u32,
        elapsed_secs: f64,
    ) -> Result<(), StorageError> {
        let mut record = self.record.lock().map_err(|_| StorageError::Unavailable)?;
        record.apply_game(correct, total, elapsed_secs);
        Ok(())
    }
}
