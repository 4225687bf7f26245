//! Turn model representing one completed request in a session.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Who initiated a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Instruction typed or scripted by the user.
    User,
}

/// A completed turn. Every recorded turn produced exactly one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who initiated the turn.
    pub role: TurnRole,
    /// The instruction text as supplied.
    pub message: String,
    /// Where the produced artifact was written.
    #[serde(rename = "image_path")]
    pub artifact_path: PathBuf,
    /// When the turn was recorded.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn stamped with the current time.
    pub fn new(message: String, artifact_path: PathBuf) -> Self {
        Self {
            role: TurnRole::User,
            message,
            artifact_path,
            timestamp: timestamp::now(),
        }
    }
}
