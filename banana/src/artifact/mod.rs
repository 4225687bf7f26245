//! Generated artifacts and where they live on disk.

mod mime;
mod store;

pub use mime::DEFAULT_MIME;
pub use store::{ArtifactError, ArtifactStore};

/// Binary artifact bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}
