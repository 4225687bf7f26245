//! Banana - image generation with multi-turn refinement.
//!
//! Wraps the Gemini image models behind a small CLI:
//! - `chat` keeps a session where each message refines the previous image,
//!   optionally persisted to a JSON record so it can be resumed later
//! - `generate` and `edit` make one stateless request
//! - `batch` runs a prompts file through a bounded worker pool
//!
//! Logs go to stderr; stdout carries only user-facing output.

mod artifact;
mod atomic;
mod batch;
mod cli;
mod config;
mod gemini;
mod models;
mod oneshot;
mod session;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{execute, Cli};

fn init_tracing(verbose: bool) {
    let default = if verbose { "banana=debug" } else { "banana=info" };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli).await
}
