//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let opacity = self.watermark.opacity;
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigError::ValidationError(
                "watermark.opacity must be between 0.0 and 1.0".into(),
            ));
        }
        if let Some(size) = self.thumbnail_size()? {
            self.check_thumbnail_size(size)?;
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "output.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.output.dir_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.dir_name must not be empty".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_invalid_opacity() {
        let mut config = Config::default();
        config.watermark.opacity = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("opacity"));

        config.watermark.opacity = -0.1;
        assert!(config.validate().is_err());

        config.watermark.opacity = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_thumbnail_size() {
        let mut config = Config::default();
        config.thumbnail.size = Some("0x100".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("thumbnail.size"));

        config.thumbnail.size = Some("wide".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_thumbnail_over_dimension_limit() {
        let mut config = Config::default();
        config.limits.max_image_dimension = 1000;
        config.thumbnail.size = Some("1000x1000".to_string());
        assert!(config.validate().is_ok());

        config.thumbnail.size = Some("1001x10".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("thumbnail.size"));
        assert!(err.to_string().contains("1000px"));

        config.limits.max_image_dimension = 100_000;
        config.thumbnail.allow_upscale = true;
        config.thumbnail.size = Some("70000x1".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_quality() {
        let mut config = Config::default();
        config.output.jpeg_quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jpeg_quality"));

        config.output.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.decode_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("decode_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_empty_formats() {
        let mut config = Config::default();
        config.processing.supported_formats.clear();
        assert!(config.validate().is_err());
    }
}
