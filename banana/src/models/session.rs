//! Session model: the aggregate a chat mutates one turn at a time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use super::turn::Turn;

/// Persisted form of a [`Session`].
///
/// Field names and order are the on-disk format. Every field has a default so
/// that partially written records from older tooling still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Backend model id the session was created with.
    #[serde(default)]
    pub model: Option<String>,
    /// Completed turns, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,
    /// Number of artifacts ever allocated.
    #[serde(default)]
    pub image_count: u32,
    /// Artifact of the latest turn.
    #[serde(default)]
    pub last_image_path: Option<PathBuf>,
    /// When the record was last written.
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Reasons a deserialized record cannot back a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("image_count {count} is smaller than history length {turns}")]
    CountBehindHistory { count: u32, turns: usize },

    #[error(
        "last_image_path {recorded:?} does not match the latest turn's image_path {}",
        latest.display()
    )]
    LastPathMismatch {
        recorded: Option<PathBuf>,
        latest: PathBuf,
    },

    #[error("image_count {0} leaves no room for another image")]
    CountExhausted(u32),
}

/// A multi-turn generation session.
///
/// Owned by one process at a time. The only mutation is [`Session::record_turn`],
/// which keeps `history`, `artifact_count` and `last_artifact` consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    model: String,
    history: Vec<Turn>,
    artifact_count: u32,
    last_artifact: Option<PathBuf>,
    output_dir: PathBuf,
}

impl Session {
    /// Create an empty session.
    pub fn new(model: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            history: Vec::new(),
            artifact_count: 0,
            last_artifact: None,
            output_dir: output_dir.into(),
        }
    }

    /// Hydrate a session from its persisted record.
    ///
    /// `default_model` is used only when the record does not name one.
    pub fn from_record(
        record: SessionRecord,
        default_model: &str,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, RecordError> {
        if (record.image_count as usize) < record.history.len() {
            return Err(RecordError::CountBehindHistory {
                count: record.image_count,
                turns: record.history.len(),
            });
        }
        if record.image_count == u32::MAX {
            return Err(RecordError::CountExhausted(record.image_count));
        }
        if let Some(latest) = record.history.last() {
            if record.last_image_path.as_deref() != Some(latest.artifact_path.as_path()) {
                return Err(RecordError::LastPathMismatch {
                    recorded: record.last_image_path,
                    latest: latest.artifact_path.clone(),
                });
            }
        }

        Ok(Self {
            model: record.model.unwrap_or_else(|| default_model.to_string()),
            history: record.history,
            artifact_count: record.image_count,
            last_artifact: record.last_image_path,
            output_dir: output_dir.into(),
        })
    }

    /// Snapshot the session as a record stamped with `updated_at`.
    pub fn to_record(&self, updated_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            model: Some(self.model.clone()),
            history: self.history.clone(),
            image_count: self.artifact_count,
            last_image_path: self.last_artifact.clone(),
            updated_at: Some(updated_at),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub const fn artifact_count(&self) -> u32 {
        self.artifact_count
    }

    pub fn last_artifact(&self) -> Option<&Path> {
        self.last_artifact.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Index the next produced artifact will be stored under.
    pub const fn next_index(&self) -> u32 {
        self.artifact_count + 1
    }

    /// Append a completed turn whose artifact was stored under `index`.
    ///
    /// The turn's timestamp is clamped so history stays non-decreasing even if
    /// the wall clock stepped backwards.
    pub fn record_turn(&mut self, index: u32, mut turn: Turn) {
        if let Some(prev) = self.history.last() {
            if turn.timestamp < prev.timestamp {
                turn.timestamp = prev.timestamp;
            }
        }
        self.last_artifact = Some(turn.artifact_path.clone());
        self.artifact_count = self.artifact_count.max(index);
        self.history.push(turn);
    }
}
