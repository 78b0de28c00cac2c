// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use clap::Args;
use rayon::iter::{IntoParallelRefIterator, IndexedParallelIterator, ParallelIterator};

use concord_core::constant::{
    DEFAULT_KAPPA_SCALE, DEFAULT_SALIENCE_CELL, DEFAULT_SALIENCE_CRIT_PAIR,
    DEFAULT_SALIENCE_CRIT_TRIPLE,
};
use concord_core::cv::{difference_mask, downsample, salience_map};
use concord_core::error::ConcordError;
use concord_core::im::ConcordImage;
use concord_core::mp::{Rate, cohen_kappa, fleiss_kappa};
use concord_core::ut;

use crate::fail;

#[derive(Debug, Args)]
#[command(about = "Measure agreement between two or three annotated copies of an image.")]
pub struct KappaArgs {
    #[arg(help = "Source image.")]
    pub source: PathBuf,

    #[arg(
        help = "Two or three annotated copies of the source image.",
        num_args = 2..=3,
        required = true
    )]
    pub annotated: Vec<PathBuf>,

    #[arg(
        long,
        help = "Salience grid cell edge in pixels.",
        default_value_t = DEFAULT_SALIENCE_CELL
    )]
    pub cell: u32,

    #[arg(
        long,
        help = "Minimum positive fraction of a salient cell [default: 0.1 for two raters, 0.05 for three]."
    )]
    pub crit: Option<f64>,

    #[arg(
        long,
        help = "Downsampling factor applied to salience maps.",
        default_value_t = DEFAULT_KAPPA_SCALE
    )]
    pub scale: f64,

    #[arg(long, help = "Directory to write each rater's mask and salience map.")]
    pub debug_dir: Option<PathBuf>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn kappa(args: &KappaArgs) {
    if let Err(err) = run(args) {
        fail("kappa", err);
    }
}

fn run(args: &KappaArgs) -> Result<(), ConcordError> {
    let raters = args.annotated.len();

    let crit = args.crit.unwrap_or(if raters == 2 {
        DEFAULT_SALIENCE_CRIT_PAIR
    } else {
        DEFAULT_SALIENCE_CRIT_TRIPLE
    });

    if let Some(dir) = args.debug_dir.as_ref() {
        ut::path::ensure_directory(dir)?;
    }

    let source = ConcordImage::open(&args.source)?;

    let labels = args
        .annotated
        .par_iter()
        .enumerate()
        .map(|(i, annotated)| {
            rater_labels(
                &source,
                annotated,
                args.cell,
                crit,
                args.scale,
                args.debug_dir.as_deref().map(|dir| (dir, i + 1)),
            )
        })
        .collect::<Result<Vec<Vec<u8>>, ConcordError>>()?;

    ut::track::progress_log(
        &format!(
            "Scoring {} raters over {} cells (cell {}px, crit {}, scale {})",
            raters,
            ut::track::thousands_format(labels[0].len()),
            args.cell,
            crit,
            args.scale
        ),
        args.verbose,
    );

    let source = args.source.display();

    if raters == 2 {
        let k = cohen_kappa(&labels[0], &labels[1])?;
        println!("{}\tCohen's kappa\t{}", source, format_kappa(k));
        return Ok(());
    }

    let fleiss = fleiss_kappa(&[&labels[0][..], &labels[1][..], &labels[2][..]])?;
    let cohen12 = cohen_kappa(&labels[0], &labels[1])?;
    let cohen23 = cohen_kappa(&labels[1], &labels[2])?;
    let cohen13 = cohen_kappa(&labels[0], &labels[2])?;

    println!("Srcfile\tFleiss\tCohen12\tCohen23\tCohen13");
    println!(
        "{}\t{}\t{}\t{}\t{}",
        source,
        format_kappa(fleiss),
        format_kappa(cohen12),
        format_kappa(cohen23),
        format_kappa(cohen13)
    );

    Ok(())
}

/// Flattened, downsampled salience labels of one rater
fn rater_labels(
    source: &ConcordImage,
    annotated: &Path,
    cell: u32,
    crit: f64,
    scale: f64,
    debug: Option<(&Path, usize)>,
) -> Result<Vec<u8>, ConcordError> {
    let annotated = ConcordImage::open(annotated)?;
    let mask = difference_mask(source, &annotated)?;
    let salience = salience_map(&mask, cell, crit)?;

    if let Some((dir, rater)) = debug {
        mask.save(dir.join(format!("rater{}_mask.png", rater)))?;
        salience.save(dir.join(format!("rater{}_salience.png", rater)))?;
    }

    Ok(downsample(&salience, scale)?.into_raw())
}

/// Full-precision kappa, or `NA` when undefined
fn format_kappa(kappa: Rate) -> String {
    match kappa {
        Rate::NotApplicable => "NA".to_string(),
        Rate::Value(v) => v.to_string(),
    }
}
