//! Gemini `generateContent` wire format.
//!
//! Requests carry one user turn whose parts are an optional inline image
//! followed by the prompt text. Responses are scanned for the first part with
//! inline data in the first candidate.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::backend::{BackendError, GenerateRequest};
use crate::artifact::{Artifact, DEFAULT_MIME};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorWrapper {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub status: Option<String>,
}

/// Build the wire request for a generation request.
pub fn build_request(request: &GenerateRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);

    if let Some(reference) = &request.reference {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: Some(reference.artifact.mime_type.clone()),
                data: BASE64_STANDARD.encode(&reference.artifact.bytes),
            },
        });
    }
    parts.push(Part::Text {
        text: request.framed_prompt(),
    });

    let image_config = (!request.options.is_empty()).then(|| ImageConfig {
        aspect_ratio: request.options.aspect_ratio.clone(),
        image_size: request.options.resolution.clone(),
    });

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
            image_config,
        },
    }
}

/// Pull the first inline artifact out of a response.
pub fn extract_artifact(
    response: GenerateContentResponse,
) -> Result<Option<Artifact>, BackendError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        tracing::warn!(reason, "prompt was blocked");
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(None);
    };
    let finish_reason = candidate.finish_reason;

    let inline = candidate
        .content
        .into_iter()
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data);

    let Some(inline) = inline else {
        tracing::warn!(finish_reason = ?finish_reason, "response contained no image");
        return Ok(None);
    };

    let bytes = BASE64_STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| BackendError::MalformedResponse(format!("invalid image data: {e}")))?;
    let mime_type = inline
        .mime_type
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME.to_string());

    Ok(Some(Artifact::new(bytes, mime_type)))
}

/// Human-readable message from an error response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| match (wrapper.error.status, wrapper.error.message) {
            (Some(status), Some(message)) => Some(format!("{status}: {message}")),
            (None, Some(message)) => Some(message),
            (Some(status), None) => Some(status),
            (None, None) => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}
