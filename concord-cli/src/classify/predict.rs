// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use clap::Args;

use concord_core::ut;
use concord_neural::nn::Classifier;
use concord_neural::predict::{format_row, predict, resolve_inputs};

use crate::classify::select_device;
use crate::fail;

#[derive(Debug, Args)]
#[command(about = "Print per-class probabilities for each image, one tab-separated row per image.")]
pub struct ClassifyPredictArgs {
    #[arg(help = "Trained model file (safetensors) with its MODEL.json next to it.")]
    pub model: PathBuf,

    #[arg(
        help = "Images, or index:FILE to read image paths from FILE (one per line).",
        required = true
    )]
    pub inputs: Vec<String>,

    #[arg(
        short = 'd',
        long,
        help = "Device (cpu, cuda, metal).",
        default_value = "cpu"
    )]
    pub device: String,

    #[arg(short = 'q', long, help = "Do not print status messages.")]
    pub quiet: bool,
}

pub fn classify_predict(args: &ClassifyPredictArgs) {
    let verbose = !args.quiet;

    let device = select_device(&args.device).unwrap_or_else(|err| fail("classify::predict", err));

    let paths = resolve_inputs(&args.inputs).unwrap_or_else(|err| fail("classify::predict", err));

    if paths.is_empty() {
        fail("classify::predict", "No images to classify.");
    }

    let classifier = Classifier::open(&args.model, &device, verbose)
        .unwrap_or_else(|err| fail("classify::predict", err));

    ut::track::progress_log(
        &format!(
            "Classifying {} images into {} classes",
            ut::track::thousands_format(paths.len()),
            classifier.config().classes
        ),
        verbose,
    );

    let probabilities = predict(&classifier, &paths, &device, verbose)
        .unwrap_or_else(|err| fail("classify::predict", err));

    if verbose {
        eprintln!();
    }

    for row in probabilities.iter() {
        println!("{}", format_row(row));
    }
}
