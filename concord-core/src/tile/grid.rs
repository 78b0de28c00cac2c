// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use crate::error::ConcordError;

/// A tile placed on an image, in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A grid of equally sized tiles that covers an image edge to edge
///
/// Along each axis the number of tiles is `ceil(bound / tile)`. Tiles are
/// spread evenly so the first tile starts at 0 and the last tile ends at the
/// image edge; neighbouring tiles overlap when the image is not an exact
/// multiple of the tile size.
///
/// # Examples
///
/// ```
/// use concord_core::tile::TileGrid;
///
/// let grid = TileGrid::new(500, 224, 224, 224).unwrap();
/// let origins: Vec<(u32, u32)> = grid.tiles().map(|t| (t.x, t.y)).collect();
///
/// assert_eq!(origins, vec![(0, 0), (138, 0), (276, 0)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    xs: Vec<u32>,
    ys: Vec<u32>,
    tile_width: u32,
    tile_height: u32,
}

impl TileGrid {
    /// Lay out tiles over an image
    ///
    /// # Arguments
    ///
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `tile_width` - Tile width
    /// * `tile_height` - Tile height
    pub fn new(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<TileGrid, ConcordError> {
        if width == 0 || height == 0 {
            return Err(ConcordError::TileError("Cannot tile an empty image."));
        }

        if tile_width == 0 || tile_height == 0 {
            return Err(ConcordError::TileError("Tile size must be positive."));
        }

        let tile_width = tile_width.min(width);
        let tile_height = tile_height.min(height);

        Ok(TileGrid {
            xs: axis_origins(width, tile_width),
            ys: axis_origins(height, tile_height),
            tile_width,
            tile_height,
        })
    }

    /// Number of tiles along x and y
    pub fn dimensions(&self) -> (usize, usize) {
        (self.xs.len(), self.ys.len())
    }

    pub fn len(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tiles ordered by column (x) first, then by row (y) within a column
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.xs.iter().flat_map(move |&x| {
            self.ys.iter().map(move |&y| Tile {
                x,
                y,
                width: self.tile_width,
                height: self.tile_height,
            })
        })
    }
}

// `tile` never exceeds `bound` here
fn axis_origins(bound: u32, tile: u32) -> Vec<u32> {
    let count = bound.div_ceil(tile);
    let last = bound - tile;

    if count == 1 {
        return vec![0];
    }

    let stride = last as f64 / (count - 1) as f64;

    (0..count)
        .map(|i| ((i as f64 * stride).round() as u32).min(last))
        .collect()
}

#[cfg(test)]
mod test {

    use super::*;

    fn check_invariants(width: u32, height: u32, tile: u32) {
        let grid = TileGrid::new(width, height, tile, tile).unwrap();
        let tiles: Vec<Tile> = grid.tiles().collect();

        assert_eq!(tiles.len(), grid.len());
        assert_eq!((tiles[0].x, tiles[0].y), (0, 0));

        let last = tiles[tiles.len() - 1];
        assert_eq!(last.x + last.width, width);
        assert_eq!(last.y + last.height, height);

        let mut covered = vec![false; (width * height) as usize];
        for t in &tiles {
            assert!(t.x + t.width <= width && t.y + t.height <= height);

            for y in t.y..t.y + t.height {
                for x in t.x..t.x + t.width {
                    covered[(y * width + x) as usize] = true;
                }
            }
        }

        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn test_grid_invariants() {
        for (w, h, t) in [(500, 300, 224), (224, 224, 224), (448, 449, 224), (7, 5, 3), (100, 9, 10)] {
            check_invariants(w, h, t);
        }
    }

    #[test]
    fn test_grid_exact_multiple() {
        let grid = TileGrid::new(448, 224, 224, 224).unwrap();
        let origins: Vec<(u32, u32)> = grid.tiles().map(|t| (t.x, t.y)).collect();

        assert_eq!(origins, vec![(0, 0), (224, 0)]);
    }

    #[test]
    fn test_grid_column_major_order() {
        let grid = TileGrid::new(300, 300, 224, 224).unwrap();
        let origins: Vec<(u32, u32)> = grid.tiles().map(|t| (t.x, t.y)).collect();

        assert_eq!(origins, vec![(0, 0), (0, 76), (76, 0), (76, 76)]);
        assert_eq!(grid.dimensions(), (2, 2));
    }

    #[test]
    fn test_grid_small_image_clamps_tile() {
        let grid = TileGrid::new(100, 50, 224, 224).unwrap();
        let tiles: Vec<Tile> = grid.tiles().collect();

        assert_eq!(
            tiles,
            vec![Tile {
                x: 0,
                y: 0,
                width: 100,
                height: 50
            }]
        );
    }

    #[test]
    fn test_grid_rejects_empty() {
        assert!(TileGrid::new(0, 10, 224, 224).is_err());
        assert!(TileGrid::new(10, 10, 0, 224).is_err());
    }
}
