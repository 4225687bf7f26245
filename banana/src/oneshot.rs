//! Stateless single-request generation to a fixed output path.

use std::path::Path;

use thiserror::Error;

use crate::artifact::{ArtifactError, ArtifactStore};
use crate::gemini::{BackendError, GenerateRequest, ImageBackend};

#[derive(Debug, Error)]
pub enum OneShotError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Send `request` and write the artifact to `output`.
///
/// Returns `Ok(false)` when the backend produced no image; nothing is written then.
pub async fn render_to(
    backend: &dyn ImageBackend,
    request: GenerateRequest,
    output: &Path,
) -> Result<bool, OneShotError> {
    let Some(artifact) = backend.generate(request).await? else {
        return Ok(false);
    };
    ArtifactStore::save(&artifact, output)?;
    Ok(true)
}
