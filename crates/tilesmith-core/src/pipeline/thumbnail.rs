//! Thumbnail generation and bounded resizing.

use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;

use crate::config::ThumbnailConfig;
use crate::error::PipelineError;

/// Generates thumbnails from images.
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator with the given configuration.
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Build a thumbnail whose longest edge is at most `config.size`.
    pub fn generate(&self, image: &DynamicImage) -> DynamicImage {
        fit_within(image, self.config.size)
    }

    /// Generate a thumbnail and save it to `path`; the format follows the
    /// path's extension.
    pub fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), PipelineError> {
        self.generate(image)
            .save(path)
            .map_err(|e| PipelineError::Thumbnail {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

/// Copy of `image` scaled down (aspect-preserving, Lanczos3) so neither edge
/// exceeds `max_edge`. Images already inside the box are copied unchanged.
pub fn fit_within(image: &DynamicImage, max_edge: u32) -> DynamicImage {
    if image.width() <= max_edge && image.height() <= max_edge {
        return image.clone();
    }
    image.resize(max_edge, max_edge, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_keeps_aspect_ratio() {
        let generator = ThumbnailGenerator::new(ThumbnailConfig { size: 128 });
        let thumbnail = generator.generate(&DynamicImage::new_rgb8(1000, 500));
        assert_eq!((thumbnail.width(), thumbnail.height()), (128, 64));
    }

    #[test]
    fn test_small_images_are_not_upscaled() {
        let generator = ThumbnailGenerator::new(ThumbnailConfig { size: 256 });
        let thumbnail = generator.generate(&DynamicImage::new_rgb8(100, 40));
        assert_eq!((thumbnail.width(), thumbnail.height()), (100, 40));
    }

    #[test]
    fn test_save_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumbnail.png");
        let generator = ThumbnailGenerator::new(ThumbnailConfig { size: 64 });

        generator
            .save(&DynamicImage::new_rgb8(200, 200), &path)
            .unwrap();
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (64, 64));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let generator = ThumbnailGenerator::new(ThumbnailConfig::default());
        let err = generator
            .save(
                &DynamicImage::new_rgb8(10, 10),
                Path::new("/nonexistent/dir/thumbnail.png"),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Thumbnail { .. }));
    }
}
