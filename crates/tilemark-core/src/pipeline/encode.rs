//! JPEG export.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use std::io::Write;
use std::path::Path;

use crate::config::OutputConfig;
use crate::error::PipelineError;

/// Largest width or height a baseline JPEG frame header can describe.
pub const JPEG_MAX_DIMENSION: u32 = u16::MAX as u32;

/// Encodes RGBA images as baseline JPEG.
pub struct JpegExporter {
    quality: u8,
}

impl JpegExporter {
    /// Create an exporter using `output.jpeg_quality`.
    pub fn new(config: &OutputConfig) -> Self {
        Self::with_quality(config.jpeg_quality)
    }

    /// Create an exporter with an explicit quality, clamped to 1..=100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `image` to JPEG bytes. Alpha is discarded, not blended.
    pub fn encode_to_vec(
        &self,
        image: &RgbaImage,
        path: &Path,
    ) -> Result<Vec<u8>, PipelineError> {
        let mut buffer = Vec::new();
        self.encode_into(image, &mut buffer, path)?;
        Ok(buffer)
    }

    /// Encode `image` and write it to `path`, creating parent directories.
    ///
    /// Nothing touches the filesystem until encoding has succeeded, so a
    /// failed export never leaves a partial file at `path`. Returns the
    /// number of bytes written.
    pub fn save(&self, image: &RgbaImage, path: &Path) -> Result<u64, PipelineError> {
        let encode_err = |message: String| PipelineError::Encode {
            path: path.to_path_buf(),
            message,
        };

        let bytes = self.encode_to_vec(image, path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| encode_err(format!("Cannot create directory: {e}")))?;
        }

        if let Err(e) = std::fs::write(path, &bytes) {
            // A short write would otherwise pass for a finished output
            let _ = std::fs::remove_file(path);
            return Err(encode_err(format!("Cannot write file: {e}")));
        }

        let written = bytes.len() as u64;
        tracing::debug!("Wrote {:?} ({} bytes, quality {})", path, written, self.quality);
        Ok(written)
    }

    fn encode_into<W: Write>(
        &self,
        image: &RgbaImage,
        writer: W,
        path: &Path,
    ) -> Result<(), PipelineError> {
        let rgb = RgbImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            Rgb([r, g, b])
        });
        let mut encoder = JpegEncoder::new_with_quality(writer, self.quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| PipelineError::Encode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}
