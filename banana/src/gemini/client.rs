//! HTTP client for the Gemini image generation API.

use async_trait::async_trait;
use reqwest::Client;

use super::backend::{BackendError, GenerateRequest, ImageBackend};
use super::wire::{build_request, error_message, extract_artifact, GenerateContentResponse};
use crate::artifact::Artifact;
use crate::config::Config;

/// Talks to `{base_url}/models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    /// Create a client from resolved configuration.
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl ImageBackend for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<Option<Artifact>, BackendError> {
        let body = build_request(&request);
        tracing::debug!(
            model = %request.model,
            with_reference = request.reference.is_some(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status,
                message: error_message(&body),
            });
        }

        let text = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        extract_artifact(parsed)
    }
}
