//! The `tilemark config` command.

use std::path::Path;

use clap::{Args, Subcommand};
use tilemark_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective watermark settings followed by the full config
    Show,

    /// Show config file path
    Path,

    /// Parse and validate the config file without running anything
    Check,

    /// Write a config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    let path = Config::default_path();

    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            // Summary lines are TOML comments, so the output still parses
            println!("{}", source_line(&path));
            for line in effective_settings(&config) {
                println!("# {line}");
            }
            println!();
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Check => {
            if !path.exists() {
                println!("No config file at {}; defaults apply.", path.display());
                return Ok(());
            }
            match Config::load_from(&path) {
                Ok(config) => {
                    println!("{} is valid.", path.display());
                    if let Some(watermark) = config.watermark_path() {
                        if !watermark.is_file() {
                            tracing::warn!(
                                "Default watermark {:?} does not exist yet",
                                watermark
                            );
                        }
                    }
                }
                Err(e) => anyhow::bail!(
                    "{} is invalid: {e}\n\n  Hint: `tilemark config init --force` writes fresh defaults.",
                    path.display()
                ),
            }
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn source_line(path: &Path) -> String {
    if path.exists() {
        format!("# Loaded from {}", path.display())
    } else {
        format!("# No file at {}; showing defaults", path.display())
    }
}

/// One line per setting that shapes the output image.
fn effective_settings(config: &Config) -> Vec<String> {
    let watermark = match config.watermark_path() {
        Some(path) => path.display().to_string(),
        None => "none (pass --watermark)".to_string(),
    };
    let filter = format!("{:?}", config.thumbnail.filter).to_lowercase();
    let thumbnail = match config.thumbnail_size() {
        Ok(Some(size)) => format!(
            "{size}, {filter} filter, {}",
            if config.thumbnail.allow_upscale {
                "upscaling allowed"
            } else {
                "never upscaled"
            }
        ),
        Ok(None) => "off (full-size output)".to_string(),
        Err(e) => format!("invalid ({e})"),
    };

    vec![
        format!("watermark: {watermark}"),
        format!("opacity:   {}", config.watermark.opacity),
        format!("thumbnail: {thumbnail}"),
        format!("jpeg:      quality {}", config.output.jpeg_quality),
        format!(
            "naming:    <stem>{}.jpg for files, ./{}/ for directories",
            config.output.suffix, config.output.dir_name
        ),
    ]
}
