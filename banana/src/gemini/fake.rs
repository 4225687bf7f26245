//! Scripted in-memory backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{BackendError, GenerateRequest, ImageBackend};
use crate::artifact::Artifact;

/// What the fake answers with for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Image(Artifact),
    Nothing,
    Fail(String),
    Slow(Duration),
}

impl Reply {
    pub fn png(bytes: &[u8]) -> Self {
        Self::Image(Artifact::new(bytes.to_vec(), "image/png"))
    }
}

/// Replays queued replies and records every request it sees.
///
/// Once the queue is empty each call returns a small PNG payload.
#[derive(Debug, Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageBackend for FakeBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<Option<Artifact>, BackendError> {
        let reply = self.replies.lock().unwrap().pop_front();
        self.requests.lock().unwrap().push(request);

        match reply {
            Some(Reply::Image(artifact)) => Ok(Some(artifact)),
            Some(Reply::Nothing) => Ok(None),
            Some(Reply::Fail(message)) => Err(BackendError::MalformedResponse(message)),
            Some(Reply::Slow(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Some(Artifact::new(b"slow".to_vec(), "image/png")))
            }
            None => Ok(Some(Artifact::new(b"\x89PNG".to_vec(), "image/png"))),
        }
    }
}
