//! JSON session record persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::atomic::write_atomic;
use crate::models::SessionRecord;

/// Session record storage errors.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("no session record at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("session record {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("cannot read session record {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write session record {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A session record file. The path is fixed for the store's lifetime.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the record.
    pub fn load(&self) -> Result<SessionRecord, SessionStoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SessionStoreError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(SessionStoreError::Unreadable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Err(self.corrupt("file is empty"));
        }

        serde_json::from_str(&content).map_err(|e| self.corrupt(e))
    }

    /// Atomically replace the record.
    ///
    /// Output is pretty-printed with a stable field order, so saving the same
    /// record twice produces identical bytes.
    pub fn save(&self, record: &SessionRecord) -> Result<(), SessionStoreError> {
        let mut json = serde_json::to_string_pretty(record).map_err(|e| {
            SessionStoreError::Write {
                path: self.path.clone(),
                source: std::io::Error::new(ErrorKind::InvalidData, e),
            }
        })?;
        json.push('\n');

        write_atomic(&self.path, json.as_bytes()).map_err(|source| SessionStoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), turns = record.history.len(), "session saved");
        Ok(())
    }

    pub fn corrupt(&self, reason: impl std::fmt::Display) -> SessionStoreError {
        SessionStoreError::Corrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
