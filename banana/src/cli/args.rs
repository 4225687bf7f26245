//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::gemini::{ASPECT_RATIOS, RESOLUTIONS};
use crate::models::{parse_model, DEFAULT_MODEL};

/// Banana - image generation with multi-turn refinement
#[derive(Parser, Debug)]
#[command(name = "banana")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Model to use (flash, pro, or a full model id)
    #[arg(short, long, global = true, default_value = DEFAULT_MODEL, value_parser = parse_model)]
    pub model: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Multi-turn session: each message refines the previous image
    Chat {
        /// JSON file to persist and resume the session
        #[arg(short, long)]
        session_file: Option<PathBuf>,

        /// Directory for generated images
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Message to run first when the session is new
        #[arg(short, long)]
        initial: Option<String>,

        /// Run a single message and exit instead of the interactive loop
        #[arg(long)]
        message: Option<String>,

        /// Give up on a backend call after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Generate one image from a prompt
    Generate {
        /// Text prompt
        prompt: String,

        /// Output image path
        output: PathBuf,

        /// Aspect ratio
        #[arg(short, long, value_parser = clap::builder::PossibleValuesParser::new(ASPECT_RATIOS.iter().copied()))]
        aspect: Option<String>,

        /// Output resolution (pro models only)
        #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(RESOLUTIONS.iter().copied()))]
        size: Option<String>,
    },

    /// Edit an existing image with instructions
    Edit {
        /// Image to edit
        input: PathBuf,

        /// Editing instructions
        instructions: String,

        /// Output image path
        output: PathBuf,
    },

    /// Generate one image per prompt in a file
    Batch {
        /// Prompts file (JSON array or one prompt per line)
        prompts: PathBuf,

        /// Directory for generated images
        output_dir: PathBuf,

        /// Number of concurrent requests
        #[arg(short, long, default_value = "1")]
        parallel: usize,

        /// Default aspect ratio for prompts that do not set one
        #[arg(short, long, default_value = "1:1", value_parser = clap::builder::PossibleValuesParser::new(ASPECT_RATIOS.iter().copied()))]
        aspect: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}
