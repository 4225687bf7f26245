//! Gemini image generation backend.

mod backend;
mod client;
#[cfg(test)]
pub mod fake;
mod wire;

pub use backend::{
    BackendError, Framing, GenerateRequest, ImageBackend, ImageOptions, ASPECT_RATIOS, RESOLUTIONS,
};
pub use client::GeminiClient;
