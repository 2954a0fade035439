//! ScreenVerse CLI — manage recorded clips and plan exports.
//!
//! Usage:
//!   screenverse list                      List recorded clips
//!   screenverse info <ID>                 Show clip metadata
//!   screenverse rename <ID> <TITLE>       Rename a clip
//!   screenverse delete <ID>               Delete a clip
//!   screenverse plan --regions <FILE> ... Print the export plan for a region set
//!   screenverse import-clicks <FILE> ...  Stage click-derived zoom regions
//!   screenverse config [--init]           Show (or write) the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use screenverse_common::config::AppConfig;
use screenverse_project_model::project::AspectRatio;

mod commands;

#[derive(Parser)]
#[command(
    name = "screenverse",
    about = "Screen recordings with trim and zoom editing",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Clip store directory (defaults to the configured one)
    #[arg(long, global = true)]
    clips_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recorded clips, newest first
    List,

    /// Show clip metadata
    Info {
        /// Clip id
        id: String,
    },

    /// Rename a clip
    Rename {
        /// Clip id
        id: String,

        /// New title
        title: String,
    },

    /// Delete a clip
    Delete {
        /// Clip id
        id: String,
    },

    /// Print the export plan for a region set
    Plan {
        /// JSON file holding an array of regions
        #[arg(long)]
        regions: PathBuf,

        /// Clip duration in seconds
        #[arg(long)]
        duration: f64,

        /// Output aspect ratio: 16:9, 4:3, 1:1 or 9:16
        #[arg(long, default_value = "16:9")]
        aspect: AspectRatio,

        /// Output frame rate (clamped to 24..=60)
        #[arg(long)]
        fps: Option<u32>,

        /// Source width in pixels
        #[arg(long, default_value = "1920")]
        source_width: u32,

        /// Source height in pixels
        #[arg(long, default_value = "1080")]
        source_height: u32,

        /// Print every frame as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Stage zoom regions derived from recorded clicks for the next editor
    ImportClicks {
        /// JSON-lines file of `{"t":..,"x":..,"y":..}` clicks
        path: PathBuf,

        /// Clip duration in seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    screenverse_common::logging::init_logging(&config.logging);

    let clips_dir = cli.clips_dir.unwrap_or_else(|| config.clips_dir.clone());
    tracing::debug!(clips_dir = %clips_dir.display(), "Using clip store");

    match cli.command {
        Commands::List => commands::clips::list(&clips_dir),
        Commands::Info { id } => commands::clips::info(&clips_dir, &id),
        Commands::Rename { id, title } => commands::clips::rename(&clips_dir, &id, &title),
        Commands::Delete { id } => commands::clips::delete(&clips_dir, &id),
        Commands::Plan {
            regions,
            duration,
            aspect,
            fps,
            source_width,
            source_height,
            json,
        } => commands::plan::run(commands::plan::PlanArgs {
            regions,
            duration,
            aspect,
            fps,
            source_width,
            source_height,
            json,
        }),
        Commands::ImportClicks { path, duration } => {
            commands::import_clicks::run(&clips_dir, &path, duration)
        }
        Commands::Config { init } => commands::config::run(init),
    }
}
