//! ZoomCut CLI — import click recordings, inspect sessions, and export.
//!
//! Usage:
//!   zoomcut import <CLICKS>    Convert a click recording to a session
//!   zoomcut info <SESSION>     Show session information
//!   zoomcut export <VIDEO>     Export a video with session effects
//!   zoomcut check              Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "zoomcut",
    about = "Zoom and annotate screen recordings",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a recorded click stream into a session file
    Import {
        /// Path to the clicks JSON file
        clicks: PathBuf,

        /// Shift times so the first click starts at zero
        #[arg(long)]
        normalize: bool,

        /// Session file to write
        #[arg(short, long, default_value = "session.json")]
        output: PathBuf,
    },

    /// Show session information
    Info {
        /// Path to the session file
        session: PathBuf,
    },

    /// Export a video with the session's effects applied
    Export {
        /// Source video file
        video: PathBuf,

        /// Session file with effects and overlays
        #[arg(short, long)]
        session: Option<PathBuf>,

        /// Output quality: 720p, 1080p, 1440p, 2160p (defaults from config)
        #[arg(long)]
        quality: Option<String>,

        /// Output frame rate (defaults from config)
        #[arg(long)]
        fps: Option<u32>,

        /// Drop the original audio track
        #[arg(long)]
        no_audio: bool,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = zoomcut_common::config::AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    zoomcut_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Import {
            clicks,
            normalize,
            output,
        } => commands::import::run(clicks, normalize, output),
        Commands::Info { session } => commands::info::run(session),
        Commands::Export {
            video,
            session,
            quality,
            fps,
            no_audio,
            output,
        } => commands::export::run(video, session, quality, fps, no_audio, output, &config).await,
        Commands::Check => commands::check::run(),
    }
}
