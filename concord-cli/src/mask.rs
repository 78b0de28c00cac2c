// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use clap::Args;

use concord_core::cv::ground_truth_mask;
use concord_core::error::ConcordError;
use concord_core::ut;

use crate::fail;

#[derive(Debug, Args)]
#[command(about = "Extract the ground-truth mask of an annotated image.")]
pub struct MaskArgs {
    #[arg(help = "Source image.")]
    pub source: PathBuf,

    #[arg(help = "Annotated copy of the source image.")]
    pub annotated: PathBuf,

    #[arg(help = "Output mask (format from extension, e.g. png, tif, npy).")]
    pub output: PathBuf,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn mask(args: &MaskArgs) {
    if let Err(err) = run(args) {
        fail("mask", err);
    }
}

fn run(args: &MaskArgs) -> Result<(), ConcordError> {
    let mask = ground_truth_mask(&args.source, &args.annotated)?;
    mask.save(&args.output)?;

    ut::track::progress_log(
        &format!(
            "Wrote {}x{} mask with {} positive pixels to {}",
            mask.width(),
            mask.height(),
            ut::track::thousands_format(mask.count_positive()),
            args.output.display()
        ),
        args.verbose,
    );

    Ok(())
}
