//! Bounded-concurrency batch generation.
//!
//! Every prompt is spawned as its own task; a semaphore caps how many are in
//! flight and completions flow back over a channel in the order they finish.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};

use super::prompts::BatchPrompt;
use crate::gemini::{GenerateRequest, ImageBackend, ImageOptions};
use crate::oneshot::render_to;

/// Outcome of one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchDetail {
    pub filename: String,
    pub success: bool,
    pub message: String,
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub details: Vec<BatchDetail>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Runs a list of prompts against one backend with a fixed number of workers.
pub struct BatchRunner {
    backend: Arc<dyn ImageBackend>,
    model: String,
    parallel: usize,
}

impl BatchRunner {
    /// `parallel` is clamped to at least one worker.
    pub fn new(backend: Arc<dyn ImageBackend>, model: impl Into<String>, parallel: usize) -> Self {
        Self {
            backend,
            model: model.into(),
            parallel: parallel.max(1),
        }
    }

    pub fn parallel(&self) -> usize {
        self.parallel
    }

    /// Generate every prompt into `output_dir`.
    ///
    /// `on_complete` is called once per prompt with the number completed so far,
    /// the total and that prompt's detail.
    pub async fn run(
        &self,
        prompts: Vec<BatchPrompt>,
        output_dir: &Path,
        mut on_complete: impl FnMut(usize, usize, &BatchDetail),
    ) -> BatchSummary {
        let total = prompts.len();
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let (tx, mut rx) = mpsc::channel(total.max(1));

        tracing::info!(total, parallel = self.parallel, "starting batch");

        for prompt in prompts {
            let semaphore = semaphore.clone();
            let backend = self.backend.clone();
            let tx = tx.clone();
            let model = self.model.clone();
            let output = output_dir.join(&prompt.filename);

            tokio::spawn(async move {
                let _permit = semaphore.acquire().await;
                let detail = generate_one(backend.as_ref(), &model, prompt, output).await;
                let _ = tx.send(detail).await;
            });
        }
        drop(tx);

        let mut details = Vec::with_capacity(total);
        while let Some(detail) = rx.recv().await {
            on_complete(details.len() + 1, total, &detail);
            details.push(detail);
        }

        if details.len() < total {
            tracing::error!(lost = total - details.len(), "batch tasks ended without reporting");
        }

        let success = details.iter().filter(|d| d.success).count();
        BatchSummary {
            total,
            success,
            failed: total - success,
            details,
        }
    }
}

async fn generate_one(
    backend: &dyn ImageBackend,
    model: &str,
    prompt: BatchPrompt,
    output: PathBuf,
) -> BatchDetail {
    let options = ImageOptions {
        aspect_ratio: Some(prompt.aspect),
        resolution: None,
    };
    let request = GenerateRequest::new(model, prompt.prompt).with_options(options);

    let (success, message) = match render_to(backend, request, &output).await {
        Ok(true) => (true, format!("Saved: {}", output.display())),
        Ok(false) => (false, "No image in response".to_string()),
        Err(e) => {
            tracing::warn!(filename = %prompt.filename, error = %e, "batch item failed");
            (false, e.to_string())
        }
    };

    BatchDetail {
        filename: prompt.filename,
        success,
        message,
    }
}
