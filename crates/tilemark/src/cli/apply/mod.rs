//! The `tilemark apply` command.

mod batch;
mod setup;
pub mod types;

pub use types::{Mode, OutputFormat};

use clap::Args;
use std::path::PathBuf;
use tilemark_core::{
    ManifestFormat, ManifestWriter, ProcessOptions, ThumbnailSize, WatermarkProcessor,
    WatermarkedImage,
};

use batch::process_batch;
use setup::setup_processor;

/// Arguments for the `apply` command.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Image file or directory to watermark
    #[arg(required = true)]
    pub source: PathBuf,

    /// Watermark image (defaults to [watermark] path from the config file)
    #[arg(short, long)]
    pub watermark: Option<PathBuf>,

    /// Output JPEG (single file) or directory (batch)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Watermark opacity between 0.0 and 1.0
    #[arg(long)]
    pub opacity: Option<f64>,

    /// Crop and resize the source to WIDTHxHEIGHT before watermarking
    #[arg(short, long, value_name = "WxH")]
    pub thumbnail: Option<ThumbnailSize>,

    /// JPEG quality
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Descend into subdirectories in batch mode
    #[arg(short, long)]
    pub recursive: bool,

    /// Write a record of every watermarked image to this file
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Manifest format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Manual Default impl for constructing ApplyArgs outside of clap.
///
/// Values match the clap `#[arg(default_value = ...)]` annotations above.
impl Default for ApplyArgs {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            watermark: None,
            output: None,
            opacity: None,
            thumbnail: None,
            quality: None,
            overwrite: false,
            recursive: false,
            manifest: None,
            format: OutputFormat::Json,
        }
    }
}

/// Processing context assembled by setup_processor().
pub(crate) struct ApplyContext {
    pub processor: WatermarkProcessor,
    pub options: ProcessOptions,
    pub mode: Mode,
    pub manifest_format: ManifestFormat,
}

pub(crate) type Manifest = ManifestWriter<std::io::BufWriter<std::fs::File>, WatermarkedImage>;

/// Execute the apply command.
pub async fn execute(args: ApplyArgs, config: tilemark_core::Config) -> anyhow::Result<()> {
    let ctx = setup_processor(&args, config).await?;

    let manifest = match &args.manifest {
        Some(path) => Some(ManifestWriter::create(path, ctx.manifest_format)?),
        None => None,
    };

    match ctx.mode.clone() {
        Mode::Single { output } => process_single(ctx, &args, output, manifest).await,
        Mode::Batch { output_dir } => process_batch(ctx, &args, output_dir, manifest).await,
    }
}

// ── Single-file processing ─────────────────────────────────────────────────

/// Watermark one file. Any failure is returned as the command's error.
async fn process_single(
    ctx: ApplyContext,
    args: &ApplyArgs,
    output: PathBuf,
    manifest: Option<Manifest>,
) -> anyhow::Result<()> {
    if output.exists() && !args.overwrite {
        anyhow::bail!(
            "Output already exists: {:?}\n\n  Hint: Pass --overwrite to replace it.",
            output
        );
    }

    let result = ctx
        .processor
        .process(&args.source, &output, &ctx.options)
        .await?;

    tracing::info!(
        "Wrote {:?} ({}x{}, {} tiles)",
        result.output,
        result.width,
        result.height,
        result.tiles.tiles
    );
    println!("{}", result.output.display());

    if let Some(mut manifest) = manifest {
        manifest.push(result)?;
        manifest.finish()?;
        if let Some(path) = &args.manifest {
            tracing::info!("Manifest written to {:?}", path);
        }
    }

    Ok(())
}
