//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::SidecarFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiling.tile_size == 0 {
            return Err(ConfigError::ValidationError(
                "tiling.tile_size must be > 0".into(),
            ));
        }
        if self.tiling.resize_max == Some(0) {
            return Err(ConfigError::ValidationError(
                "tiling.resize_max must be > 0 when set".into(),
            ));
        }
        if let Some(format) = &self.tiling.format {
            if image::ImageFormat::from_extension(format).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "tiling.format '{format}' is not a known image extension"
                )));
            }
        }
        if self.thumbnail.size == 0 {
            return Err(ConfigError::ValidationError(
                "thumbnail.size must be > 0".into(),
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
        if SidecarFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"yaml\" or \"json\", got \"{}\"",
                self.output.format
            )));
        }
        Ok(())
    }
}
