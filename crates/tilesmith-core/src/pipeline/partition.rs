//! Tile grid computation.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{TileGrid, TileRect};

/// Split `width × height` into a row-major grid of `tile_size` squares.
///
/// Interior tiles are exactly `tile_size` on each side. When a dimension is
/// not a multiple of `tile_size`, the last column (or row) holds the
/// remainder. An image smaller than one tile is a single tile of its own size.
pub fn partition(width: u32, height: u32, tile_size: u32) -> PipelineResult<TileGrid> {
    if tile_size == 0 {
        return Err(PipelineError::InvalidArgument(
            "tile_size must be > 0".to_string(),
        ));
    }

    let columns = spans(width, tile_size);
    let rows = spans(height, tile_size)
        .into_iter()
        .map(|(y_min, y_max)| {
            columns
                .iter()
                .map(|&(x_min, x_max)| TileRect {
                    x_min,
                    x_max,
                    y_min,
                    y_max,
                })
                .collect()
        })
        .collect();

    Ok(TileGrid { tile_size, rows })
}

/// `[min, max)` ranges covering `0..extent` in steps of `tile_size`.
fn spans(extent: u32, tile_size: u32) -> Vec<(u32, u32)> {
    (0..extent.div_ceil(tile_size))
        .map(|i| {
            let start = i * tile_size;
            (start, start.saturating_add(tile_size).min(extent))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_600x400_at_256() {
        let grid = partition(600, 400, 256).unwrap();
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.row_count(), 2);

        let widths: Vec<u32> = grid.rows[0].iter().map(TileRect::width).collect();
        let heights: Vec<u32> = grid.rows.iter().map(|row| row[0].height()).collect();
        assert_eq!(widths, vec![256, 256, 88]);
        assert_eq!(heights, vec![256, 144]);

        assert_eq!(
            grid.rows[1][2],
            TileRect {
                x_min: 512,
                x_max: 600,
                y_min: 256,
                y_max: 400
            }
        );
    }

    #[test]
    fn test_exact_multiple_has_no_boundary_tiles() {
        let grid = partition(512, 256, 256).unwrap();
        assert_eq!((grid.column_count(), grid.row_count()), (2, 1));
        assert!(grid.iter().all(|r| r.width() == 256 && r.height() == 256));
    }

    #[test]
    fn test_smaller_than_one_tile() {
        let grid = partition(100, 30, 256).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(
            grid.rows[0][0],
            TileRect {
                x_min: 0,
                x_max: 100,
                y_min: 0,
                y_max: 30
            }
        );
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let err = partition(10, 10, 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_extent_is_empty() {
        assert!(partition(0, 100, 64).unwrap().is_empty());
        assert!(partition(100, 0, 64).unwrap().is_empty());
    }

    #[test]
    fn test_grid_covers_image_exactly() {
        for (width, height, tile_size) in [
            (1, 1, 1),
            (7, 3, 2),
            (255, 257, 256),
            (600, 400, 256),
            (1000, 999, 100),
            (31, 64, 32),
        ] {
            let grid = partition(width, height, tile_size).unwrap();
            assert_eq!(grid.column_count() as u32, width.div_ceil(tile_size));
            assert_eq!(grid.row_count() as u32, height.div_ceil(tile_size));

            let mut covered = vec![0u8; (width * height) as usize];
            for rect in grid.iter() {
                assert!(rect.width() <= tile_size && rect.height() <= tile_size);
                for y in rect.y_min..rect.y_max {
                    for x in rect.x_min..rect.x_max {
                        covered[(y * width + x) as usize] += 1;
                    }
                }
            }
            assert!(
                covered.iter().all(|&c| c == 1),
                "{width}x{height}@{tile_size} has gaps or overlaps"
            );

            let last_row = grid.row_count() - 1;
            let last_col = grid.column_count() - 1;
            for (r, row) in grid.rows.iter().enumerate() {
                assert_eq!(row.len(), grid.column_count());
                for (c, rect) in row.iter().enumerate() {
                    if c != last_col {
                        assert_eq!(rect.width(), tile_size);
                    }
                    if r != last_row {
                        assert_eq!(rect.height(), tile_size);
                    }
                }
            }
        }
    }
}
