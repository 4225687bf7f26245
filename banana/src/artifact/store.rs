//! Filesystem-backed artifact storage.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::mime::{extension_for_mime, mime_for_path};
use super::Artifact;
use crate::atomic::write_atomic;

/// Artifact storage errors.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to write artifact {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read artifact {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stores artifacts under one output directory with sequential names.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Location for the artifact with the given 1-based index.
    ///
    /// `output_{index:03}.{ext}` where the extension follows the MIME type.
    pub fn allocate_path(&self, index: u32, mime_type: &str) -> PathBuf {
        self.output_dir
            .join(format!("output_{index:03}.{}", extension_for_mime(mime_type)))
    }

    /// Durably write an artifact to `path`, creating parent directories.
    pub fn save(artifact: &Artifact, path: &Path) -> Result<(), ArtifactError> {
        write_atomic(path, &artifact.bytes).map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = artifact.bytes.len(), "artifact written");
        Ok(())
    }

    /// Read an artifact back, deriving its MIME type from the extension.
    pub fn load(path: &Path) -> Result<Artifact, ArtifactError> {
        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Artifact::new(bytes, mime_for_path(path)))
    }
}
