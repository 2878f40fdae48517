//! Pipeline orchestration - wires together all processing stages.

use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::types::WatermarkedImage;

use super::decode::{format_to_string, ImageDecoder};
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::encode::JpegExporter;
use super::thumbnail::{ThumbnailSize, Thumbnailer};
use super::validate::Validator;
use super::watermark::Watermark;

/// Options for controlling per-image processing.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Crop and resize to this size before tiling
    pub thumbnail: Option<ThumbnailSize>,
    /// Replace an existing output file
    pub overwrite: bool,
}

/// The main processor: one watermark, applied to any number of images.
pub struct WatermarkProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    thumbnailer: Thumbnailer,
    exporter: JpegExporter,
    discovery: FileDiscovery,
    watermark: Watermark,
    max_dimension: u32,
}

impl WatermarkProcessor {
    /// Create a processor around an already prepared watermark.
    pub fn new(config: &Config, watermark: Watermark) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            thumbnailer: Thumbnailer::new(&config.thumbnail),
            exporter: JpegExporter::new(&config.output),
            discovery: FileDiscovery::new(config.processing.clone()),
            watermark,
            max_dimension: config.limits.max_image_dimension,
        }
    }

    /// Load the watermark at `path` with `opacity`, then build the processor.
    pub async fn load(config: &Config, watermark_path: &Path, opacity: f64) -> Result<Self> {
        let decoder = ImageDecoder::new(config.limits.clone());
        Validator::new(config.limits.clone()).validate(watermark_path)?;
        let watermark = Watermark::load(&decoder, watermark_path, opacity).await?;
        Ok(Self::new(config, watermark))
    }

    /// Replace the discovery settings, e.g. to exclude the output directory.
    pub fn with_discovery(mut self, discovery: FileDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Watermark `input` and write the JPEG to `output`.
    pub async fn process(
        &self,
        input: &Path,
        output: &Path,
        options: &ProcessOptions,
    ) -> Result<WatermarkedImage> {
        let start = Instant::now();
        tracing::debug!("Processing: {:?}", input);

        if output.exists() && !options.overwrite {
            return Err(PipelineError::OutputExists(output.to_path_buf()).into());
        }
        if let Some(target) = options.thumbnail {
            target.check_limit(self.max_dimension)?;
        }

        self.validator.validate(input)?;

        let decode_start = Instant::now();
        let decoded = self.decoder.decode(input).await?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let format = format_to_string(decoded.format);
        let (source_width, source_height) = (decoded.width, decoded.height);
        let mut canvas = decoded.into_rgba();

        let crop = match options.thumbnail {
            Some(target) => {
                let thumb_start = Instant::now();
                let thumb = self.thumbnailer.apply(&canvas, target);
                tracing::trace!("  Thumbnail: {:?}", thumb_start.elapsed());
                canvas = thumb.image;
                Some(thumb.crop)
            }
            None => None,
        };

        let tile_start = Instant::now();
        let tiles = self.watermark.tile_onto(&mut canvas);
        tracing::trace!("  Tile ({} tiles): {:?}", tiles.tiles, tile_start.elapsed());

        let encode_start = Instant::now();
        let output_size = self.exporter.save(&canvas, output)?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        let elapsed = start.elapsed();
        tracing::debug!(
            "Watermarked {:?} -> {:?} in {:?} ({}x{})",
            input,
            output,
            elapsed,
            canvas.width(),
            canvas.height()
        );

        Ok(WatermarkedImage {
            source: input.to_path_buf(),
            output: output.to_path_buf(),
            format,
            source_width,
            source_height,
            width: canvas.width(),
            height: canvas.height(),
            crop,
            tiles,
            output_size,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }

    /// Discover all image files at a path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TilemarkError;
    use image::{Rgba, RgbaImage};

    fn write_fixtures(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let source = dir.join("photo.png");
        RgbaImage::from_pixel(300, 100, Rgba([0, 0, 0, 255]))
            .save(&source)
            .unwrap();

        let logo = dir.join("logo.png");
        RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]))
            .save(&logo)
            .unwrap();
        (source, logo)
    }

    #[test]
    fn test_process_options_default() {
        let options = ProcessOptions::default();
        assert!(options.thumbnail.is_none());
        assert!(!options.overwrite);
    }

    #[tokio::test]
    async fn test_process_full_size() {
        let dir = tempfile::tempdir().unwrap();
        let (source, logo) = write_fixtures(dir.path());
        let output = dir.path().join("out.jpg");

        let config = Config::default();
        let processor = WatermarkProcessor::load(&config, &logo, 0.3).await.unwrap();
        let result = processor
            .process(&source, &output, &ProcessOptions::default())
            .await
            .unwrap();

        assert_eq!((result.width, result.height), (300, 100));
        assert_eq!(result.format, "png");
        assert!(result.crop.is_none());
        // 300 / 40 -> 8 columns, 100 / 40 -> 3 rows
        assert_eq!(result.tiles.tiles, 24);

        let written = image::open(&output).unwrap().to_rgb8();
        let px = written.get_pixel(150, 50).0;
        // Black blended with white at mask 76, allowing for JPEG loss
        assert!(px.iter().all(|&c| (66..=86).contains(&c)));
    }

    #[tokio::test]
    async fn test_process_with_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let (source, logo) = write_fixtures(dir.path());
        let output = dir.path().join("thumb.jpg");

        let config = Config::default();
        let processor = WatermarkProcessor::load(&config, &logo, 0.3).await.unwrap();
        let options = ProcessOptions {
            thumbnail: Some(ThumbnailSize::new(50, 50).unwrap()),
            overwrite: false,
        };
        let result = processor.process(&source, &output, &options).await.unwrap();

        assert_eq!((result.width, result.height), (50, 50));
        let crop = result.crop.unwrap();
        assert_eq!((crop.x, crop.width), (100, 100));
        assert_eq!(image::image_dimensions(&output).unwrap(), (50, 50));
    }

    #[tokio::test]
    async fn test_process_refuses_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let (source, logo) = write_fixtures(dir.path());
        let output = dir.path().join("exists.jpg");
        std::fs::write(&output, b"old").unwrap();

        let processor = WatermarkProcessor::load(&Config::default(), &logo, 0.3)
            .await
            .unwrap();
        let err = processor
            .process(&source, &output, &ProcessOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TilemarkError::Pipeline(PipelineError::OutputExists(_))
        ));

        let options = ProcessOptions {
            overwrite: true,
            ..ProcessOptions::default()
        };
        assert!(processor.process(&source, &output, &options).await.is_ok());
    }

    #[tokio::test]
    async fn test_process_rejects_oversized_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let (source, logo) = write_fixtures(dir.path());
        let output = dir.path().join("huge.jpg");

        let mut config = Config::default();
        config.thumbnail.allow_upscale = true;
        let processor = WatermarkProcessor::load(&config, &logo, 0.3).await.unwrap();
        let options = ProcessOptions {
            thumbnail: Some(ThumbnailSize::new(70_000, 1).unwrap()),
            overwrite: false,
        };

        let err = processor
            .process(&source, &output, &options)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TilemarkError::Pipeline(PipelineError::ThumbnailTooLarge { .. })
        ));
        assert!(!output.exists());

        // The failure leaves nothing behind, so a plain retry goes through
        assert!(processor
            .process(&source, &output, &ProcessOptions::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_load_rejects_bad_opacity() {
        let dir = tempfile::tempdir().unwrap();
        let (_, logo) = write_fixtures(dir.path());

        let result = WatermarkProcessor::load(&Config::default(), &logo, 2.0).await;
        assert!(matches!(
            result,
            Err(TilemarkError::Pipeline(PipelineError::InvalidOpacity(_)))
        ));
    }

    #[tokio::test]
    async fn test_process_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let (_, logo) = write_fixtures(dir.path());

        let processor = WatermarkProcessor::load(&Config::default(), &logo, 0.3)
            .await
            .unwrap();
        let err = processor
            .process(
                &dir.path().join("nope.png"),
                &dir.path().join("nope.jpg"),
                &ProcessOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
