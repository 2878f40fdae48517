//! Tilemark Core - tiled watermarking library.
//!
//! Tilemark overlays a semi-transparent watermark, repeated on a grid, across
//! a source image and exports the result as JPEG.
//!
//! # Architecture
//!
//! ```text
//! Image → Validate → Decode → RGBA → [Crop + Resize] → Tile watermark → JPEG
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tilemark_core::{Config, ProcessOptions, WatermarkProcessor};
//!
//! #[tokio::main]
//! async fn main() -> tilemark_core::Result<()> {
//!     let config = Config::load()?;
//!     let processor =
//!         WatermarkProcessor::load(&config, "logo.png".as_ref(), config.watermark.opacity)
//!             .await?;
//!
//!     let result = processor
//!         .process("photo.png".as_ref(), "photo.jpg".as_ref(), &ProcessOptions::default())
//!         .await?;
//!     println!("Pasted {} tiles", result.tiles.tiles);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, TilemarkError};
pub use manifest::{ManifestFormat, ManifestWriter};
pub use pipeline::{
    DiscoveredFile, FileDiscovery, ProcessOptions, ThumbnailSize, Watermark, WatermarkProcessor,
};
pub use types::{ProcessingStats, WatermarkedImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
