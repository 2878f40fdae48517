//! Watermarking pipeline components.
//!
//! This module contains all the stages of the pipeline:
//! - **validate**: Pre-decode checks (existence, size, magic bytes)
//! - **decode**: Load and decode images, normalize to RGBA
//! - **thumbnail**: Aspect-ratio crop and resize
//! - **watermark**: Alpha mask and tiling
//! - **composite**: Masked per-pixel paste
//! - **encode**: JPEG export
//! - **discovery**: Find image files in directories
//! - **processor**: Orchestrates the full pipeline

pub mod composite;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod processor;
pub mod thumbnail;
pub mod validate;
pub mod watermark;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use encode::{JpegExporter, JPEG_MAX_DIMENSION};
pub use processor::{ProcessOptions, WatermarkProcessor};
pub use thumbnail::{crop_box, CropBox, ThumbnailSize, Thumbnailer};
pub use validate::Validator;
pub use watermark::{alpha_mask, TileStats, Watermark};
