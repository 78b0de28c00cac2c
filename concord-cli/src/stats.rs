// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use clap::Args;

use concord_core::constant::DEFAULT_CRIT;
use concord_core::cv::ground_truth_mask;
use concord_core::error::ConcordError;
use concord_core::im::{BoundingBoxes, ConcordMask, apply_crit};
use concord_core::mp::TwoClassStats;
use concord_core::ut;

use crate::fail;

#[derive(Debug, Args)]
#[command(about = "Score a predicted mask against the ground truth of an annotated image.")]
pub struct StatsArgs {
    #[arg(help = "Source image.")]
    pub source: PathBuf,

    #[arg(help = "Annotated copy of the source image.")]
    pub annotated: PathBuf,

    #[arg(help = "Predicted mask.")]
    pub predicted: PathBuf,

    #[arg(help = "Bounding box list (y0 x0 y1 x1 per line) to fill before scoring.")]
    pub boxes: Option<PathBuf>,

    #[arg(help = "Minimum ground-truth coverage for a box to be filled [default: 0.95].")]
    pub crit: Option<f64>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn stats(args: &StatsArgs) {
    if let Err(err) = run(args) {
        fail("stats", err);
    }
}

fn run(args: &StatsArgs) -> Result<(), ConcordError> {
    let crit = args.crit.unwrap_or(DEFAULT_CRIT);

    if !(0.0..=1.0).contains(&crit) {
        return Err(ConcordError::OtherError(format!(
            "Crit must be in [0, 1] but found {}.",
            crit
        )));
    }

    let ground_truth = ground_truth_mask(&args.source, &args.annotated)?;
    let predicted = ConcordMask::open(&args.predicted)?;

    let (label, ground_truth) = match args.boxes.as_ref() {
        None => ("1".to_string(), ground_truth),
        Some(path) => {
            let boxes = BoundingBoxes::open(path)?;
            let (filled, n) = apply_crit(&ground_truth, &boxes, crit);

            ut::track::progress_log(
                &format!("Filled {} of {} boxes at crit {}", n, boxes.len(), crit),
                args.verbose,
            );

            (format!("{:?}", crit), filled)
        }
    };

    let stats = TwoClassStats::new(&ground_truth, &predicted)?;

    println!("crit\t{}", label);
    for (name, value) in stats.rows() {
        println!("{}\t{}", name, value);
    }

    Ok(())
}
