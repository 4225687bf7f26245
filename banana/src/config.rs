//! Runtime configuration read from the environment.
//!
//! - `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) - API key, required
//! - `BANANA_API_BASE` - Base URL (default: `https://generativelanguage.googleapis.com/v1beta`)
//! - `BANANA_HTTP_TIMEOUT_SECS` - HTTP request timeout (default: 300)

use std::time::Duration;

use thiserror::Error;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Configuration errors. All of these are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY or GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("invalid base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("invalid BANANA_HTTP_TIMEOUT_SECS value '{0}'")]
    InvalidTimeout(String),
}

/// Backend configuration, resolved once at startup.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub http_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = lookup("BANANA_API_BASE")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let http_timeout = match lookup("BANANA_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            api_key,
            base_url,
            http_timeout,
        })
    }
}
