//! Configuration management for Tilemark.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::pipeline::thumbnail::ThumbnailSize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Tilemark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watermark settings
    pub watermark: WatermarkConfig,

    /// Thumbnail settings
    pub thumbnail: ThumbnailConfig,

    /// JPEG output settings
    pub output: OutputConfig,

    /// Batch discovery settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tilemark.tilemark/config.toml
    /// - Linux: ~/.config/tilemark/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tilemark\config\config.toml
    ///
    /// Falls back to ~/.tilemark/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tilemark", "tilemark")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tilemark").join("config.toml")
            })
    }

    /// Get the configured default watermark path (with ~ expansion).
    pub fn watermark_path(&self) -> Option<PathBuf> {
        self.watermark.path.as_ref().map(|path| {
            let path_str = path.to_string_lossy();
            let expanded = shellexpand::tilde(&path_str);
            PathBuf::from(expanded.into_owned())
        })
    }

    /// Get the configured thumbnail target, if any.
    pub fn thumbnail_size(&self) -> Result<Option<ThumbnailSize>, ConfigError> {
        self.thumbnail
            .size
            .as_deref()
            .map(|s| {
                s.parse::<ThumbnailSize>()
                    .map_err(|e| ConfigError::ValidationError(format!("thumbnail.size: {e}")))
            })
            .transpose()
    }

    /// Check a thumbnail target against `limits.max_image_dimension`.
    pub fn check_thumbnail_size(&self, size: ThumbnailSize) -> Result<(), ConfigError> {
        size.check_limit(self.limits.max_image_dimension)
            .map_err(|e| ConfigError::ValidationError(format!("thumbnail.size: {e}")))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
