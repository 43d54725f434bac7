//! Crop, encode and persist tiles under content-addressed names.

use image::{DynamicImage, ImageFormat};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::hash::Hasher;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{TileFileRef, TileGrid, TileRect};

/// Writes the tiles of one image.
pub struct TileWriter;

impl TileWriter {
    /// Write every tile of `grid` into `destination` as `<sha1>.<extension>`.
    ///
    /// Each tile is encoded into a staging file inside `destination`, hashed
    /// from disk, then renamed into place, so an interrupted run leaves at
    /// most a stale staging file and never a truncated tile. The result has
    /// the same row-major shape as `grid`. Any failure aborts the image.
    pub fn write_tiles(
        image: &DynamicImage,
        grid: &TileGrid,
        destination: &Path,
        extension: &str,
    ) -> PipelineResult<Vec<Vec<TileFileRef>>> {
        let tiling_error = |message: String| PipelineError::Tiling {
            path: destination.to_path_buf(),
            message,
        };

        let format = ImageFormat::from_extension(extension)
            .ok_or_else(|| tiling_error(format!("no encoder for extension '{extension}'")))?;

        tracing::debug!("Tiling into {:?}; creating dir if it doesn't exist", destination);
        std::fs::create_dir_all(destination)
            .map_err(|e| tiling_error(format!("cannot create directory: {e}")))?;

        let mut written = Vec::with_capacity(grid.row_count());
        for row in &grid.rows {
            let mut refs = Vec::with_capacity(row.len());
            for rect in row {
                let tile = Self::write_tile(image, rect, destination, extension, format)
                    .map_err(&tiling_error)?;
                tracing::trace!(
                    "Saved tile ({}, {}, {}, {}) to {}",
                    rect.x_min,
                    rect.x_max,
                    rect.y_min,
                    rect.y_max,
                    tile.file_name()
                );
                refs.push(tile);
            }
            written.push(refs);
        }

        tracing::debug!(
            "Wrote a {}x{} grid of tiles to {:?}",
            grid.column_count(),
            grid.row_count(),
            destination
        );
        Ok(written)
    }

    fn write_tile(
        image: &DynamicImage,
        rect: &TileRect,
        destination: &Path,
        extension: &str,
        format: ImageFormat,
    ) -> Result<TileFileRef, String> {
        let tile = image.crop_imm(rect.x_min, rect.y_min, rect.width(), rect.height());

        let mut staged = tempfile::Builder::new()
            .prefix(".tile-")
            .suffix(&format!(".{extension}"))
            .tempfile_in(destination)
            .map_err(|e| format!("cannot create staging file: {e}"))?;

        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            tile.write_to(&mut writer, format)
                .map_err(|e| format!("cannot encode tile: {e}"))?;
            writer
                .flush()
                .map_err(|e| format!("cannot write tile: {e}"))?;
        }

        let digest = Hasher::content_hash(staged.path())
            .map_err(|e| format!("cannot hash staged tile: {e}"))?;
        let tile_ref = TileFileRef {
            digest,
            extension: extension.to_string(),
        };

        staged
            .persist(destination.join(tile_ref.file_name()))
            .map_err(|e| format!("cannot rename staged tile: {}", e.error))?;
        Ok(tile_ref)
    }
}
