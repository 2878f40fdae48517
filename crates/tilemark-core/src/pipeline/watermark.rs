//! Watermark preparation and tiling.

use image::{GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::composite::paste_masked;
use super::decode::ImageDecoder;
use crate::error::PipelineError;

/// Build a paste mask from the alpha channel of `image`, scaled by `opacity`.
///
/// Each mask value is `alpha * opacity` rounded half to even, the same lookup
/// table Pillow builds for `point(lambda a: a * opacity)`. With the default
/// 0.3 that maps 255 to 76 and 5 to 2.
pub fn alpha_mask(image: &RgbaImage, opacity: f64) -> Result<GrayImage, PipelineError> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(PipelineError::InvalidOpacity(opacity));
    }
    let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let alpha = image.get_pixel(x, y)[3];
        Luma([(f64::from(alpha) * opacity).round_ties_even() as u8])
    });
    Ok(mask)
}

/// Counts from a tiling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStats {
    /// Tiles pasted (partially clipped tiles included)
    pub tiles: u32,
    /// Columns of tiles
    pub columns: u32,
    /// Rows of tiles
    pub rows: u32,
}

/// An RGBA watermark with its precomputed paste mask.
#[derive(Debug, Clone)]
pub struct Watermark {
    image: RgbaImage,
    mask: GrayImage,
    opacity: f64,
}

impl Watermark {
    /// Prepare a watermark from an already decoded image.
    pub fn new(image: RgbaImage, opacity: f64) -> Result<Self, PipelineError> {
        let mask = alpha_mask(&image, opacity)?;
        Ok(Self {
            image,
            mask,
            opacity,
        })
    }

    /// Decode a watermark file, normalize it to RGBA and derive its mask.
    pub async fn load(
        decoder: &ImageDecoder,
        path: &Path,
        opacity: f64,
    ) -> Result<Self, PipelineError> {
        let decoded = decoder.decode(path).await?;
        tracing::debug!(
            "Loaded watermark {:?} ({}x{}, opacity {opacity})",
            path,
            decoded.width,
            decoded.height
        );
        Self::new(decoded.into_rgba(), opacity)
    }

    /// Watermark width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Watermark height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Tile the watermark over `target`, starting at the top-left corner.
    ///
    /// Tiles sit on a grid with the watermark's own size as pitch; the last
    /// row and column are clipped at the target edge.
    pub fn tile_onto(&self, target: &mut RgbaImage) -> TileStats {
        let (step_x, step_y) = (self.width() as usize, self.height() as usize);
        let mut stats = TileStats::default();
        if step_x == 0 || step_y == 0 {
            return stats;
        }

        for x in (0..target.width()).step_by(step_x) {
            stats.columns += 1;
            for y in (0..target.height()).step_by(step_y) {
                if paste_masked(target, &self.image, &self.mask, x, y) {
                    stats.tiles += 1;
                }
            }
        }
        if stats.columns > 0 {
            stats.rows = stats.tiles / stats.columns;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_alpha_mask_scales_and_rounds() {
        let alphas = [255, 100, 5, 15, 3, 1, 0];
        let img = RgbaImage::from_fn(alphas.len() as u32, 1, |x, _| {
            Rgba([0, 0, 0, alphas[x as usize]])
        });
        let mask = alpha_mask(&img, 0.3).unwrap();
        let values: Vec<u8> = mask.pixels().map(|p| p[0]).collect();
        // 76.5 -> 76, 1.5 -> 2, 4.5 -> 4 (ties to even); 0.9 -> 1, 0.3 -> 0
        assert_eq!(values, vec![76, 30, 2, 4, 1, 0, 0]);
    }

    #[test]
    fn test_alpha_mask_rejects_bad_opacity() {
        let img = RgbaImage::new(1, 1);
        assert!(matches!(
            alpha_mask(&img, 1.01),
            Err(PipelineError::InvalidOpacity(_))
        ));
        assert!(alpha_mask(&img, -0.5).is_err());
        assert!(alpha_mask(&img, f64::INFINITY).is_err());
        assert!(alpha_mask(&img, 0.0).is_ok());
        assert!(alpha_mask(&img, 1.0).is_ok());
    }

    #[test]
    fn test_tile_grid_counts() {
        let wm = Watermark::new(RgbaImage::from_pixel(30, 20, Rgba([255; 4])), 1.0).unwrap();
        let mut target = RgbaImage::new(100, 50);

        let stats = wm.tile_onto(&mut target);
        // x: 0,30,60,90  y: 0,20,40
        assert_eq!(stats.columns, 4);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.tiles, 12);
        // Clipped corner tile still covers the last pixel
        assert_eq!(*target.get_pixel(99, 49), Rgba([255; 4]));
    }

    #[test]
    fn test_watermark_larger_than_target_is_one_tile() {
        let opaque = Rgba([9, 9, 9, 255]);
        let wm = Watermark::new(RgbaImage::from_pixel(500, 500, opaque), 1.0).unwrap();
        let mut target = RgbaImage::new(10, 10);

        let stats = wm.tile_onto(&mut target);
        assert_eq!(stats.tiles, 1);
        assert_eq!((stats.columns, stats.rows), (1, 1));
        assert!(target.pixels().all(|p| *p == opaque));
    }

    #[test]
    fn test_zero_opacity_leaves_target_untouched() {
        let wm = Watermark::new(RgbaImage::from_pixel(4, 4, Rgba([255; 4])), 0.0).unwrap();
        let mut target = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));

        wm.tile_onto(&mut target);
        assert!(target.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn test_default_opacity_blend() {
        let wm = Watermark::new(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])), 0.3)
            .unwrap();
        let mut target = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));

        wm.tile_onto(&mut target);
        // mask 76: 255 * 76 / 255 = 76
        assert_eq!(*target.get_pixel(0, 0), Rgba([76, 76, 76, 255]));
    }
}
