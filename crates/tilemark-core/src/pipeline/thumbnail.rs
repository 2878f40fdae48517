//! Aspect-ratio-preserving crop and resize to a target thumbnail size.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ThumbnailConfig;
use crate::error::PipelineError;

use super::encode::JPEG_MAX_DIMENSION;

/// Target thumbnail dimensions, parsed from `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    /// Create a size, rejecting zero sides.
    pub fn new(width: u32, height: u32) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidThumbnailSize(format!(
                "{width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Reject targets with a side above `max_dim`, or above what JPEG can hold.
    ///
    /// Resizing allocates the full target up front, so this has to run
    /// before any pixels are touched.
    pub fn check_limit(&self, max_dim: u32) -> Result<(), PipelineError> {
        let max_dim = max_dim.min(JPEG_MAX_DIMENSION);
        if self.width > max_dim || self.height > max_dim {
            return Err(PipelineError::ThumbnailTooLarge {
                size: self.to_string(),
                max_dim,
            });
        }
        Ok(())
    }
}

impl FromStr for ThumbnailSize {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::InvalidThumbnailSize(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(|c| c == 'x' || c == 'X')
            .ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(width, height).map_err(|_| invalid())
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A region of the source image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    /// Whether the box covers the whole `width` x `height` image.
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

/// Compute the largest centered box of `src_w` x `src_h` with the target's aspect ratio.
///
/// A source wider than the target keeps its height and loses columns on both
/// sides; otherwise it keeps its width and loses rows top and bottom.
pub fn crop_box(src_w: u32, src_h: u32, target: ThumbnailSize) -> CropBox {
    let (sw, sh) = (u64::from(src_w), u64::from(src_h));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));

    if sw * th > sh * tw {
        // Rounded sh * tw / th
        let width = ((sh * tw * 2 + th) / (th * 2)).clamp(1, sw) as u32;
        CropBox {
            x: (src_w - width) / 2,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        let height = ((sw * th * 2 + tw) / (tw * 2)).clamp(1, sh) as u32;
        CropBox {
            x: 0,
            y: (src_h - height) / 2,
            width: src_w,
            height,
        }
    }
}

/// Result of thumbnailing an image.
pub struct Thumbnail {
    /// The cropped and resized image
    pub image: RgbaImage,
    /// Region of the source that was kept
    pub crop: CropBox,
}

/// Crops and resizes images to a thumbnail size.
pub struct Thumbnailer {
    filter: FilterType,
    allow_upscale: bool,
}

impl Thumbnailer {
    /// Create a new thumbnailer with the given configuration.
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            filter: config.filter.into(),
            allow_upscale: config.allow_upscale,
        }
    }

    /// Crop `image` to the target aspect ratio, then resize it to the target.
    ///
    /// Without `allow_upscale`, a crop smaller than the target is returned as is.
    pub fn apply(&self, image: &RgbaImage, target: ThumbnailSize) -> Thumbnail {
        let crop = crop_box(image.width(), image.height(), target);

        let cropped = if crop.is_full(image.width(), image.height()) {
            image.clone()
        } else {
            imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height).to_image()
        };

        let fits = cropped.width() <= target.width && cropped.height() <= target.height;
        let exact = cropped.width() == target.width && cropped.height() == target.height;
        let resized = if exact || (fits && !self.allow_upscale) {
            if fits && !exact {
                tracing::debug!(
                    "Source region {}x{} is smaller than {target}, not upscaling",
                    cropped.width(),
                    cropped.height()
                );
            }
            cropped
        } else {
            imageops::resize(&cropped, target.width, target.height, self.filter)
        };

        Thumbnail {
            image: resized,
            crop,
        }
    }
}
