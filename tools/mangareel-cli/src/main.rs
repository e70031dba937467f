//! MangaReel CLI: turn a story prompt into a narrated slideshow video.
//!
//! Usage:
//!   mangareel create [OPTIONS]   Generate script, images, narration, and video
//!   mangareel check              Check ffmpeg and API key availability
//!   mangareel config [--write]   Show (or write) the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mangareel_common::config::{config_file_path, AppConfig};
use mangareel_pipeline::{DEFAULT_OUTPUT_FILENAME, DEFAULT_STORY_PROMPT};

mod commands;

#[derive(Parser)]
#[command(
    name = "mangareel",
    about = "Turn a story prompt into a narrated video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full story-to-video pipeline
    Create {
        /// Story prompt sent to the text generator
        #[arg(short, long, default_value = DEFAULT_STORY_PROMPT)]
        prompt: String,

        /// Output video path
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILENAME)]
        output: PathBuf,

        /// Token cap for the generated script (defaults to the configured value)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Seconds each image stays on screen (defaults to the configured value)
        #[arg(long)]
        clip_secs: Option<f64>,
    },

    /// Check system capabilities and configured credentials
    Check,

    /// Show the effective configuration (secrets redacted)
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    mangareel_common::logging::init_logging(&config.logging);
    tracing::debug!(path = %config_file_path().display(), "Configuration loaded");

    match cli.command {
        Commands::Create {
            prompt,
            output,
            max_tokens,
            clip_secs,
        } => commands::create::run(config, prompt, output, max_tokens, clip_secs).await,
        Commands::Check => commands::check::run(&config),
        Commands::Config { write } => commands::config::run(&config, write),
    }
}
