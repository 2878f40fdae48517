//! CLI enum types for the apply command.

use clap::ValueEnum;
use std::path::PathBuf;
use tilemark_core::ManifestFormat;

/// Supported manifest formats.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Single JSON array
    #[default]
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for ManifestFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ManifestFormat::Json,
            OutputFormat::Jsonl => ManifestFormat::JsonLines,
        }
    }
}

/// Where results go, decided from the source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// One source file to one JPEG
    Single { output: PathBuf },
    /// Every supported file in a directory into `output_dir`
    Batch { output_dir: PathBuf },
}
