//! Per-image orchestration: decode, metadata, thumbnail, tiles, sidecar.
//!
//! Output layout for an input `photos/bear.jpg`:
//!
//! ```text
//! <root>/images/bear/bear.yaml         sidecar
//! <root>/images/bear/thumbnail.jpg
//! <root>/images/bear/tiles/<sha1>.jpg
//! ```

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::config::{Config, TilingConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::output::SidecarWriter;
use crate::types::{ImageSidecar, ProcessedImage};

use super::decode::ImageDecoder;
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::metadata::MetadataExtractor;
use super::partition::partition;
use super::thumbnail::{fit_within, ThumbnailGenerator};
use super::tiles::TileWriter;

/// Subdirectory of the output root holding one directory per image.
pub const IMAGES_DIR: &str = "images";
/// Subdirectory of an image's directory holding its tiles.
pub const TILES_DIR: &str = "tiles";
/// Stem of the thumbnail file inside an image's directory.
pub const THUMBNAIL_STEM: &str = "thumbnail";

/// How far one file got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Pending,
    Opened,
    MetadataExtracted,
    Tiled,
    SidecarWritten,
    Done,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Pending => "pending",
            JobStage::Opened => "opened",
            JobStage::MetadataExtracted => "metadata extracted",
            JobStage::Tiled => "tiled",
            JobStage::SidecarWritten => "sidecar written",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs single images through the pipeline.
pub struct ImageProcessor {
    decoder: ImageDecoder,
    thumbnail_gen: ThumbnailGenerator,
    discovery: FileDiscovery,
    tiling: TilingConfig,
    writer: SidecarWriter,
    output_root: PathBuf,
    skip_existing: bool,
}

impl ImageProcessor {
    /// Create a processor writing under `output_root`.
    pub fn new(config: &Config, output_root: &Path) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            thumbnail_gen: ThumbnailGenerator::new(config.thumbnail.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            tiling: config.tiling.clone(),
            writer: SidecarWriter::new(config.sidecar_format(), config.output.pretty),
            output_root: output_root.to_path_buf(),
            skip_existing: config.processing.skip_existing,
        }
    }

    /// Process one image file, writing its thumbnail, tiles and sidecar.
    ///
    /// Nothing is retried: the first failing step ends this file.
    pub fn process(&self, path: &Path) -> PipelineResult<ProcessedImage> {
        let mut stage = JobStage::Pending;
        let result = self.run(path, &mut stage);
        if let Err(e) = &result {
            tracing::debug!("{:?} failed after stage '{}': {}", path, stage, e);
            stage = JobStage::Failed;
        }
        tracing::trace!("{:?} finished in stage '{}'", path, stage);
        result
    }

    fn run(&self, path: &Path, stage: &mut JobStage) -> PipelineResult<ProcessedImage> {
        let start = std::time::Instant::now();
        let stem = image_stem(path);
        let relative_dir = format!("{IMAGES_DIR}/{stem}");
        let image_dir = self.output_root.join(IMAGES_DIR).join(&stem);
        let sidecar_path = image_dir.join(self.writer.file_name(&stem));

        if self.skip_existing && sidecar_path.exists() {
            match self.writer.read::<ImageSidecar>(&sidecar_path) {
                Ok(sidecar) => {
                    tracing::debug!("Reusing existing sidecar {:?}", sidecar_path);
                    *stage = JobStage::Done;
                    return Ok(ProcessedImage {
                        file_path: path.to_path_buf(),
                        stem,
                        output_dir: relative_dir,
                        sidecar,
                        reused: true,
                    });
                }
                Err(e) => {
                    tracing::warn!("Cannot reuse sidecar {:?} ({}); reprocessing", sidecar_path, e)
                }
            }
        }

        tracing::debug!("Processing: {:?}", path);
        let decoded = self.decoder.decode(path)?;
        *stage = JobStage::Opened;

        let metadata = MetadataExtractor::extract(&decoded);
        *stage = JobStage::MetadataExtracted;

        std::fs::create_dir_all(&image_dir).map_err(|e| PipelineError::Sidecar {
            path: image_dir.clone(),
            message: format!("cannot create image directory: {e}"),
        })?;

        let extension = self.output_extension(path, decoded.format);
        let source = flatten_for(&decoded.image, &extension);
        let thumbnail_name = format!("{THUMBNAIL_STEM}.{extension}");
        self.thumbnail_gen
            .save(&source, &image_dir.join(&thumbnail_name))?;

        // The grid follows the working copy; the sidecar keeps the original size.
        let working = match self.tiling.resize_max {
            Some(max_edge) => {
                let resized = fit_within(&source, max_edge);
                tracing::debug!(
                    "Tiling {:?} from a {}x{} copy of the {}x{} original",
                    path,
                    resized.width(),
                    resized.height(),
                    decoded.width,
                    decoded.height
                );
                Cow::Owned(resized)
            }
            None => source,
        };

        let grid = partition(working.width(), working.height(), self.tiling.tile_size)?;
        let tiles = TileWriter::write_tiles(
            &working,
            &grid,
            &image_dir.join(TILES_DIR),
            &extension,
        )
        .map_err(|e| match e {
            PipelineError::Tiling { message, .. } => PipelineError::Tiling {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        *stage = JobStage::Tiled;

        let sidecar = ImageSidecar {
            description: metadata.description,
            thumbnail: thumbnail_name,
            date: metadata.date,
            file_size: decoded.file_size,
            width: decoded.width,
            height: decoded.height,
            tile_size: grid.tile_size,
            rows: grid.row_count(),
            columns: grid.column_count(),
            tags: metadata.tags,
            tiles: tiles
                .iter()
                .map(|row| row.iter().map(|tile| tile.file_name()).collect())
                .collect(),
        };
        self.writer
            .write(&sidecar_path, &sidecar)
            .map_err(|e| PipelineError::Sidecar {
                path: sidecar_path.clone(),
                message: e.to_string(),
            })?;
        *stage = JobStage::SidecarWritten;

        tracing::debug!(
            "Processed {:?} in {:?} ({}x{}, {} tiles)",
            path,
            start.elapsed(),
            decoded.width,
            decoded.height,
            grid.len()
        );
        *stage = JobStage::Done;

        Ok(ProcessedImage {
            file_path: path.to_path_buf(),
            stem,
            output_dir: relative_dir,
            sidecar,
            reused: false,
        })
    }

    /// Extension for tiles and the thumbnail: the configured override, else
    /// the source file's own extension, else the decoded format's.
    fn output_extension(&self, path: &Path, format: ImageFormat) -> String {
        self.tiling
            .format
            .clone()
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_lowercase)
            })
            .or_else(|| format.extensions_str().first().map(|e| e.to_string()))
            .unwrap_or_else(|| "png".to_string())
    }

    /// Discover all image files at a path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// Path of the sidecar for `source`, whether or not it exists yet.
    pub fn sidecar_path(&self, source: &Path) -> PathBuf {
        let stem = image_stem(source);
        self.output_root
            .join(IMAGES_DIR)
            .join(&stem)
            .join(self.writer.file_name(&stem))
    }
}

/// JPEG has no alpha channel; drop it before encoding to one.
fn flatten_for<'a>(image: &'a DynamicImage, extension: &str) -> Cow<'a, DynamicImage> {
    let is_jpeg = ImageFormat::from_extension(extension) == Some(ImageFormat::Jpeg);
    if is_jpeg && image.color().has_alpha() {
        Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
    } else {
        Cow::Borrowed(image)
    }
}

/// File name without its extension.
pub fn image_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}
