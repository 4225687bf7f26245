//! The generative backend seam.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::artifact::Artifact;

/// Supported aspect ratios.
pub const ASPECT_RATIOS: &[&str] = &["1:1", "16:9", "9:16", "21:9", "4:3", "3:4"];

/// Supported output resolutions.
pub const RESOLUTIONS: &[&str] = &["1K", "2K", "4K"];

/// Backend failures. A response without an artifact is not one of these.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no response within {0} seconds")]
    Timeout(u64),
}

/// How a reference artifact relates to the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Continue refining the previous turn's artifact.
    Refine,
    /// Apply a one-off edit to a user-supplied image.
    Edit,
}

impl Framing {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Refine => "Based on this image, ",
            Self::Edit => "Using the provided image, ",
        }
    }
}

/// An artifact sent along with the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub artifact: Artifact,
    pub framing: Framing,
}

/// Optional image shaping parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
}

impl ImageOptions {
    pub const fn is_empty(&self) -> bool {
        self.aspect_ratio.is_none() && self.resolution.is_none()
    }
}

/// One generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub reference: Option<Reference>,
    pub options: ImageOptions,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            reference: None,
            options: ImageOptions::default(),
        }
    }

    #[must_use]
    pub fn with_reference(mut self, artifact: Artifact, framing: Framing) -> Self {
        self.reference = Some(Reference { artifact, framing });
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ImageOptions) -> Self {
        self.options = options;
        self
    }

    /// The prompt text as the backend receives it.
    ///
    /// With a reference attached the instruction is prefixed so the backend
    /// treats it as a change to that image rather than a new request.
    pub fn framed_prompt(&self) -> String {
        match &self.reference {
            Some(reference) => format!("{}{}", reference.framing.prefix(), self.prompt),
            None => self.prompt.clone(),
        }
    }
}

/// A service that turns a prompt (and optional reference image) into an image.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Returns `Ok(None)` when the backend answered without producing an artifact.
    async fn generate(&self, request: GenerateRequest) -> Result<Option<Artifact>, BackendError>;
}
