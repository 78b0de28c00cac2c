// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use clap::Args;

use concord_core::constant::{DEFAULT_CRIT, DEFAULT_TILE_SIZE};
use concord_core::cv::difference_mask;
use concord_core::error::ConcordError;
use concord_core::im::ConcordImage;
use concord_core::tile::{Tile, TileClass, tile_file_name};
use concord_core::ut;

use crate::fail;
use crate::split::{tile_grid, write_tiles};

#[derive(Debug, Args)]
#[command(about = "Split an image into tiles labelled by their ground-truth coverage.")]
pub struct SplitByMaskArgs {
    #[arg(help = "Source image.")]
    pub source: PathBuf,

    #[arg(help = "Annotated copy of the source image.")]
    pub annotated: PathBuf,

    #[arg(help = "Output directory. Tiles are written into its Y and N sub-directories.")]
    pub outdir: PathBuf,

    #[arg(help = "Coverage at or above which a tile is positive (Y) [default: 0.95].")]
    pub crit: Option<f64>,

    #[arg(help = "Coverage at or below which a tile is negative (N) [default: crit].")]
    pub crit_low: Option<f64>,

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

pub fn split_by_mask(args: &SplitByMaskArgs) {
    if let Err(err) = run(args) {
        fail("split-by-mask", err);
    }
}

fn run(args: &SplitByMaskArgs) -> Result<(), ConcordError> {
    let high = args.crit.unwrap_or(DEFAULT_CRIT);
    let low = args.crit_low.unwrap_or(high);

    if !(0.0..=1.0).contains(&high) || !(0.0..=1.0).contains(&low) {
        return Err(ConcordError::OtherError(
            "Crit values must be in [0, 1].".to_string(),
        ));
    }

    if low > high {
        return Err(ConcordError::OtherError(format!(
            "Low crit {} must not exceed crit {}.",
            low, high
        )));
    }

    let image = ConcordImage::open(&args.source)?;
    let annotated = ConcordImage::open(&args.annotated)?;
    let mask = difference_mask(&image, &annotated)?;

    let stem = ut::hash::hash_file_prefix(&args.source)?;
    let grid = tile_grid(&image, args.tile_size, args.verbose)?;

    let mut rows: Vec<(TileClass, f64, PathBuf)> = Vec::with_capacity(grid.len());
    let mut jobs: Vec<(Tile, PathBuf)> = Vec::new();

    for tile in grid.tiles() {
        let fraction = mask.fraction(tile.x, tile.y, tile.width, tile.height);
        let class = TileClass::classify(fraction, high, low);

        let path = args
            .outdir
            .join(class.label())
            .join(tile_file_name(&stem, &tile));

        if class.is_written() {
            jobs.push((tile, path.clone()));
        }

        rows.push((class, fraction, path));
    }

    for class in [TileClass::Positive, TileClass::Negative] {
        if rows.iter().any(|(c, _, _)| *c == class) {
            ut::path::ensure_directory(args.outdir.join(class.label()))?;
        }
    }

    write_tiles(&image, &jobs, args.verbose)?;

    for (class, fraction, path) in rows.iter() {
        println!("{}\t{:.6}\t{}", class, fraction, path.display());
    }

    ut::track::progress_log(
        &format!(
            "Wrote {} of {} tiles ({} ambiguous)",
            jobs.len(),
            rows.len(),
            rows.len() - jobs.len()
        ),
        args.verbose,
    );

    Ok(())
}
