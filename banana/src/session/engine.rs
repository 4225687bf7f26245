//! Session continuity engine.
//!
//! Runs one turn at a time against a [`Session`]:
//!
//! 1. Pick the mode: refine the last artifact if it still exists on disk,
//!    otherwise start fresh.
//! 2. Ask the backend. Errors, timeouts and empty answers leave the session
//!    untouched so the caller can retry.
//! 3. Write the artifact, then record the turn, then persist the record.
//!    The record never points at an artifact that was not written first.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::store::{SessionStore, SessionStoreError};
use crate::artifact::{ArtifactError, ArtifactStore};
use crate::gemini::{BackendError, Framing, GenerateRequest, ImageBackend};
use crate::models::{timestamp, Session, Turn};

/// How a turn treats the previous artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnMode {
    /// No usable previous artifact; the message is sent as-is.
    Fresh,
    /// The previous artifact is attached and the message framed as a change to it.
    Refine { reference: PathBuf },
}

impl TurnMode {
    /// Decide the mode for the next turn of `session`.
    pub fn select(session: &Session) -> Self {
        match session.last_artifact() {
            Some(path) if path.is_file() => Self::Refine {
                reference: path.to_path_buf(),
            },
            Some(path) => {
                tracing::info!(path = %path.display(), "previous artifact is gone, starting fresh");
                Self::Fresh
            }
            None => Self::Fresh,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Refine { .. } => "refine",
        }
    }
}

/// Non-error result of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An artifact was produced and recorded.
    Produced {
        path: PathBuf,
        index: u32,
        mode: TurnMode,
    },
    /// The backend answered without an artifact. Nothing was recorded.
    NoArtifact { mode: TurnMode },
}

/// A turn that failed. The session is unchanged in every case.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("artifact written but session not saved: {0}")]
    Persist(#[source] SessionStoreError),
}

/// Drives turns against one session.
pub struct ContinuityEngine {
    session: Session,
    store: Option<SessionStore>,
    artifacts: ArtifactStore,
    backend: Arc<dyn ImageBackend>,
    timeout: Option<Duration>,
}

impl ContinuityEngine {
    /// Build an engine around an already loaded or fresh session.
    pub fn new(
        session: Session,
        store: Option<SessionStore>,
        backend: Arc<dyn ImageBackend>,
    ) -> Self {
        let artifacts = ArtifactStore::new(session.output_dir());
        Self {
            session,
            store,
            artifacts,
            backend,
            timeout: None,
        }
    }

    /// Bound every backend call by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resume the session recorded in `store`, or start a new one if none exists.
    ///
    /// A corrupt or unreadable record is an error; it is never replaced with
    /// an empty session.
    pub fn open_session(
        store: Option<&SessionStore>,
        model: &str,
        output_dir: &Path,
    ) -> Result<Session, SessionStoreError> {
        let Some(store) = store else {
            return Ok(Session::new(model, output_dir));
        };

        match store.load() {
            Ok(record) => {
                let session = Session::from_record(record, model, output_dir)
                    .map_err(|e| store.corrupt(e))?;
                if session.model() != model {
                    tracing::warn!(
                        recorded = session.model(),
                        requested = model,
                        "keeping the model recorded in the session"
                    );
                }
                tracing::info!(
                    path = %store.path().display(),
                    turns = session.history().len(),
                    "resumed session"
                );
                Ok(session)
            }
            Err(SessionStoreError::NotFound { .. }) => {
                tracing::info!(path = %store.path().display(), "starting new session");
                Ok(Session::new(model, output_dir))
            }
            Err(e) => Err(e),
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Write the current session to its record, if it has one.
    pub fn persist(&self) -> Result<(), SessionStoreError> {
        match &self.store {
            Some(store) => store.save(&self.session.to_record(timestamp::now())),
            None => Ok(()),
        }
    }

    /// Run one turn for `message`.
    pub async fn turn(&mut self, message: &str) -> Result<TurnOutcome, TurnError> {
        let mode = TurnMode::select(&self.session);
        let mut request = GenerateRequest::new(self.session.model(), message);
        if let TurnMode::Refine { reference } = &mode {
            let artifact = ArtifactStore::load(reference)?;
            request = request.with_reference(artifact, Framing::Refine);
        }

        tracing::info!(mode = mode.label(), turn = self.session.next_index(), "generating");

        let Some(artifact) = self.call_backend(request).await? else {
            return Ok(TurnOutcome::NoArtifact { mode });
        };

        let index = self.session.next_index();
        let path = self.artifacts.allocate_path(index, &artifact.mime_type);
        ArtifactStore::save(&artifact, &path)?;

        let previous = self.session.clone();
        self.session
            .record_turn(index, Turn::new(message.to_string(), path.clone()));
        if let Err(e) = self.persist() {
            self.session = previous;
            return Err(TurnError::Persist(e));
        }

        tracing::info!(path = %path.display(), index, "turn recorded");
        Ok(TurnOutcome::Produced { path, index, mode })
    }

    async fn call_backend(
        &self,
        request: GenerateRequest,
    ) -> Result<Option<crate::artifact::Artifact>, BackendError> {
        let call = self.backend.generate(request);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| BackendError::Timeout(limit.as_secs()))?,
            None => call.await,
        }
    }
}
