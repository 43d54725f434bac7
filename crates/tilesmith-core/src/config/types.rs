//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats (file extensions)
    pub supported_formats: Vec<String>,

    /// Descend into subdirectories when discovering images
    pub recursive: bool,

    /// Log per-file failures and continue instead of aborting the batch
    pub ignore_errors: bool,

    /// Reuse an image's existing sidecar instead of reprocessing it
    pub skip_existing: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "tif".to_string(),
                "tiff".to_string(),
            ],
            recursive: false,
            ignore_errors: false,
            skip_existing: false,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 200,
            max_image_dimension: 30000,
        }
    }
}

/// Tile grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Edge length of a square tile in pixels
    pub tile_size: u32,

    /// Bound the longest edge of the tiled copy to this many pixels.
    /// Unset tiles the image at full resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_max: Option<u32>,

    /// Tile file extension. Unset keeps the source file's extension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            resize_max: None,
            format: None,
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Thumbnail bounding box in pixels (longest edge)
    pub size: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self { size: 256 }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output root directory (supports `~`)
    pub dir: String,

    /// Sidecar format ("yaml" or "json")
    pub format: String,

    /// Pretty-print JSON sidecars
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "out".to_string(),
            format: "yaml".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
