// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use clap::Args;
use kdam::TqdmParallelIterator;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use concord_core::constant::DEFAULT_TILE_SIZE;
use concord_core::error::ConcordError;
use concord_core::im::ConcordImage;
use concord_core::tile::{Tile, TileGrid, tile_file_name};
use concord_core::ut;

use crate::fail;

#[derive(Debug, Args)]
#[command(about = "Split an image into a grid of equally sized tiles.")]
pub struct SplitArgs {
    #[arg(help = "Source image.")]
    pub source: PathBuf,

    #[arg(help = "Output directory.")]
    pub outdir: PathBuf,

    #[arg(
        short = 's',
        long,
        help = "Tile edge length in pixels.",
        default_value_t = DEFAULT_TILE_SIZE
    )]
    pub tile_size: u32,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn split(args: &SplitArgs) {
    if let Err(err) = run(args) {
        fail("split", err);
    }
}

fn run(args: &SplitArgs) -> Result<(), ConcordError> {
    let image = ConcordImage::open(&args.source)?;
    let stem = ut::hash::hash_file_prefix(&args.source)?;
    let grid = tile_grid(&image, args.tile_size, args.verbose)?;

    let outdir = ut::path::ensure_directory(&args.outdir)?;

    let jobs: Vec<(Tile, PathBuf)> = grid
        .tiles()
        .map(|tile| (tile, outdir.join(tile_file_name(&stem, &tile))))
        .collect();

    write_tiles(&image, &jobs, args.verbose)?;

    for (_, path) in jobs.iter() {
        println!("{}", path.display());
    }

    Ok(())
}

/// Lay out square tiles over an image and log the layout
pub(crate) fn tile_grid(
    image: &ConcordImage,
    tile_size: u32,
    verbose: bool,
) -> Result<TileGrid, ConcordError> {
    let grid = TileGrid::new(image.width(), image.height(), tile_size, tile_size)?;
    let (nx, ny) = grid.dimensions();

    ut::track::progress_log(
        &format!(
            "Image size {}x{} | Tile size {}x{} | Tiles {}x{}",
            image.width(),
            image.height(),
            tile_size,
            tile_size,
            nx,
            ny
        ),
        verbose,
    );

    Ok(grid)
}

/// Crop and write every tile to its path in parallel
pub(crate) fn write_tiles(
    image: &ConcordImage,
    jobs: &[(Tile, PathBuf)],
    verbose: bool,
) -> Result<(), ConcordError> {
    let pb = ut::track::progress_bar(jobs.len(), "Writing tiles", verbose);

    (0..jobs.len())
        .into_par_iter()
        .tqdm_with_bar(pb)
        .map(|idx| {
            let (tile, path) = &jobs[idx];
            write_tile(image, tile, path)
        })
        .collect::<Result<Vec<()>, ConcordError>>()?;

    if verbose {
        eprintln!();
    }

    Ok(())
}

fn write_tile(image: &ConcordImage, tile: &Tile, path: &Path) -> Result<(), ConcordError> {
    image
        .crop(tile.x, tile.y, tile.width, tile.height)?
        .save(path)
}
