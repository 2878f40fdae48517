//! Tilemark CLI - tile a semi-transparent watermark across images.
//!
//! Tilemark repeats a watermark image on a grid over a source image, optionally
//! cropping and resizing the source to a thumbnail first, and writes a JPEG.
//!
//! # Usage
//!
//! ```bash
//! # Watermark a single image
//! tilemark apply photo.png -w logo.png -o photo.jpg
//!
//! # Watermark every image in a directory, as 640x480 thumbnails
//! tilemark apply ./photos/ -w logo.png --thumbnail 640x480
//!
//! # View configuration
//! tilemark config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Tilemark - tile a semi-transparent watermark across images.
#[derive(Parser, Debug)]
#[command(name = "tilemark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark an image, or every image in a directory
    Apply(cli::apply::ApplyArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match tilemark_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `tilemark config path`."
            );
            tilemark_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tilemark v{}", tilemark_core::VERSION);

    match cli.command {
        Commands::Apply(args) => cli::apply::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
