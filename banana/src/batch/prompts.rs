//! Prompt file loading.
//!
//! A prompts file is either a JSON array or newline-delimited text:
//!
//! ```text
//! [
//!     "a sunset",
//!     {"prompt": "a forest", "filename": "forest.png", "aspect": "16:9"}
//! ]
//! ```
//!
//! Entries without a filename are numbered `image_001.png`, `image_002.png`, ...

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptFileError {
    #[error("prompts file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read prompts file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prompts file entry {index} must be a string or an object")]
    InvalidEntry { index: usize },

    #[error("prompts JSON must be an array")]
    NotAnArray,
}

/// One image to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPrompt {
    pub prompt: String,
    pub filename: String,
    pub aspect: String,
}

fn default_filename(index: usize) -> String {
    format!("image_{:03}.png", index + 1)
}

/// Load prompts from `path`.
pub fn load_prompts(path: &Path, default_aspect: &str) -> Result<Vec<BatchPrompt>, PromptFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PromptFileError::NotFound(path.to_path_buf())
        } else {
            PromptFileError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    parse_prompts(&content, is_json, default_aspect)
}

/// Parse prompt file contents.
///
/// JSON is tried when `is_json` is set or the content starts with `[`. Content
/// that fails to parse as JSON is read as one prompt per non-blank line.
pub fn parse_prompts(
    content: &str,
    is_json: bool,
    default_aspect: &str,
) -> Result<Vec<BatchPrompt>, PromptFileError> {
    let content = content.trim();

    if is_json || content.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(content) {
            return prompts_from_json(value, default_aspect);
        }
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| BatchPrompt {
            prompt: line.to_string(),
            filename: default_filename(i),
            aspect: default_aspect.to_string(),
        })
        .collect())
}

fn prompts_from_json(value: Value, default_aspect: &str) -> Result<Vec<BatchPrompt>, PromptFileError> {
    let Value::Array(items) = value else {
        return Err(PromptFileError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(prompt) => Ok(BatchPrompt {
                prompt,
                filename: default_filename(i),
                aspect: default_aspect.to_string(),
            }),
            Value::Object(obj) => {
                let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
                Ok(BatchPrompt {
                    prompt: text("prompt").or_else(|| text("text")).unwrap_or_default(),
                    filename: text("filename").unwrap_or_else(|| default_filename(i)),
                    aspect: text("aspect").unwrap_or_else(|| default_aspect.to_string()),
                })
            }
            _ => Err(PromptFileError::InvalidEntry { index: i }),
        })
        .collect()
}
