//! Batch generation from a prompts file.

mod prompts;
mod runner;

pub use prompts::load_prompts;
pub use runner::BatchRunner;
