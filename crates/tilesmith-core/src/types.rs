//! Core data types for the Tilesmith pipeline.
//!
//! These types describe the tile grid of an image and the sidecar records
//! written for images and tags.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A crop rectangle in pixel coordinates.
///
/// The `max` bounds are exclusive: the rectangle covers
/// `[x_min, x_max) × [y_min, y_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRect {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRect {
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }
}

/// Row-major grid of tile rectangles (top-to-bottom, left-to-right).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    /// Edge length the grid was computed for
    pub tile_size: u32,
    /// Rows of rectangles; every row has the same number of columns
    pub rows: Vec<Vec<TileRect>>,
}

impl TileGrid {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Total number of tiles in the grid.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every rectangle in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &TileRect> {
        self.rows.iter().flatten()
    }
}

/// A content-addressed tile file: hex SHA-1 of the encoded bytes plus extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileFileRef {
    pub digest: String,
    pub extension: String,
}

impl TileFileRef {
    /// On-disk filename, `<digest>.<extension>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.digest, self.extension)
    }
}

/// Metadata pulled from an image's embedded XMP block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
}

/// The per-image sidecar record.
///
/// `width` and `height` are the dimensions of the source file, even when the
/// tiles were cut from a downscaled copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSidecar {
    /// Free-text description from the embedded metadata
    pub description: Option<String>,

    /// Thumbnail path, relative to the image's output directory
    pub thumbnail: String,

    /// Creation date from the embedded metadata
    pub date: Option<DateTime<FixedOffset>>,

    /// Source file size in bytes
    pub file_size: u64,

    pub width: u32,
    pub height: u32,

    /// Tile edge length used for the grid
    pub tile_size: u32,

    /// Number of tile rows
    pub rows: usize,

    /// Number of tile columns
    pub columns: usize,

    pub tags: Vec<String>,

    /// Tile filenames, row-major, relative to the image's `tiles/` directory
    pub tiles: Vec<Vec<String>>,
}

/// The per-tag sidecar record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSidecar {
    pub name: String,
    /// Human description placeholder, filled in by hand downstream
    pub description: String,
    /// Stems of the images carrying this tag, in processing order
    pub images: Vec<String>,
}

/// The two end-of-batch index artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchIndexes {
    /// Tag name → tag sidecar path, relative to the output root
    pub tags: BTreeMap<String, String>,
    /// Per-image output directories, relative to the output root, in processing order
    pub images: Vec<String>,
}

/// The result of running one file through the pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Source file
    pub file_path: PathBuf,

    /// File name without extension; identifies the image in the tag index
    pub stem: String,

    /// Per-image output directory, relative to the output root
    pub output_dir: String,

    pub sidecar: ImageSidecar,

    /// True when an existing sidecar was reused instead of reprocessing
    pub reused: bool,
}

/// Counters for a finished batch run.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total_bytes: u64,
    pub tiles_written: u64,
}
