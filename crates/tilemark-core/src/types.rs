//! Core data types for the Tilemark pipeline.
//!
//! These types describe the outcome of watermarking an image and are what
//! the manifest writer serializes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pipeline::thumbnail::CropBox;
use crate::pipeline::watermark::TileStats;

/// Record of one watermarked image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkedImage {
    // === Files ===
    /// Source image path
    pub source: PathBuf,

    /// Written JPEG path
    pub output: PathBuf,

    // === Source ===
    /// Detected source format ("jpeg", "png", ...)
    pub format: String,

    /// Source width in pixels
    pub source_width: u32,

    /// Source height in pixels
    pub source_height: u32,

    // === Result ===
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Region of the source kept by thumbnailing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropBox>,

    /// Watermark tiling counts
    pub tiles: TileStats,

    /// Size of the written JPEG in bytes
    pub output_size: u64,

    /// Wall time spent on this image
    pub elapsed_ms: u64,
}

/// Aggregate counters for a batch run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    /// Total bytes of JPEG written
    pub bytes_written: u64,
}

impl ProcessingStats {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.skipped
    }

    /// Record a successfully written image.
    pub fn record(&mut self, image: &WatermarkedImage) {
        self.succeeded += 1;
        self.bytes_written += image.output_size;
    }
}
