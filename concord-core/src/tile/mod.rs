// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

mod class;
mod grid;

pub use class::TileClass;
pub use grid::{Tile, TileGrid};

/// Output file name of a tile cut from a source identified by `stem`
///
/// The first number is the column (x) origin and the second the row (y)
/// origin, both zero padded to four digits.
///
/// # Examples
///
/// ```
/// use concord_core::tile::{tile_file_name, Tile};
///
/// let tile = Tile { x: 276, y: 12, width: 224, height: 224 };
/// assert_eq!(tile_file_name("a9993e364706816a", &tile), "a9993e364706816a-0276-0012.jpg");
/// ```
pub fn tile_file_name(stem: &str, tile: &Tile) -> String {
    format!("{}-{:04}-{:04}.jpg", stem, tile.x, tile.y)
}
