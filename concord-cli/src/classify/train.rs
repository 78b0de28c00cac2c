// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use clap::Args;

use concord_core::ut;
use concord_data::data::Weights;
use concord_neural::augment::Augmenter;
use concord_neural::nn::{labels_path, parse_hidden_layers};
use concord_neural::train::{TrainOptions, train};

use crate::classify::select_device;
use crate::fail;

#[derive(Debug, Args)]
#[command(about = "Train a classifier on a directory with one sub-directory of images per class.")]
pub struct ClassifyTrainArgs {
    #[arg(help = "Output model file (safetensors).")]
    pub model: PathBuf,

    #[arg(help = "Training directory with one sub-directory per class.")]
    pub data: PathBuf,

    #[arg(
        short = 'l',
        long,
        help = "Hidden layer widths before the output layer (e.g. 128,64).",
        default_value = ""
    )]
    pub hidden_layers: String,

    #[arg(
        short = 'a',
        long,
        help = "Backbone architecture (dino_vit_small, dino_vit_base).",
        default_value = "dino_vit_small"
    )]
    pub arch: String,

    #[arg(
        short = 'c',
        long,
        help = "Output label file [default: MODEL.labels]."
    )]
    pub class_labels_file: Option<PathBuf>,

    #[arg(
        short = 's',
        long,
        help = "Fraction of training images held out for validation.",
        default_value_t = 0.2
    )]
    pub validation_split: f64,

    #[arg(
        short = 'r',
        long,
        help = "Learning rate of the AdamW optimizer.",
        default_value_t = 0.01
    )]
    pub learning_rate: f64,

    #[arg(short = 'b', long, help = "Batch size.", default_value_t = 24)]
    pub batch_size: usize,

    #[arg(short = 'e', long, help = "Maximum number of epochs.", default_value_t = 10)]
    pub epochs: usize,

    #[arg(
        short = 'p',
        long,
        help = "Stop after N epochs without a lower training loss.",
        default_value_t = 3
    )]
    pub patience: usize,

    #[arg(short = 't', long, help = "Also train the backbone weights.")]
    pub trainable: bool,

    #[arg(
        short = 'A',
        long,
        help = "Augmentations: F(lip), Z(oom), T(ranslate), R(otate), C(ontrast).",
        default_value = "FZRC"
    )]
    pub augmentation: String,

    #[arg(
        short = 'd',
        long,
        help = "Device (cpu, cuda, metal).",
        default_value = "cpu"
    )]
    pub device: String,

    #[arg(long, help = "Seed for shuffling and augmentation.", default_value_t = 0)]
    pub seed: u64,

    #[arg(short = 'q', long, help = "Do not print status messages.")]
    pub quiet: bool,
}

pub fn classify_train(args: &ClassifyTrainArgs) {
    let options = match options(args) {
        Ok(options) => options,
        Err(err) => fail("classify::train", err),
    };

    let device = select_device(&args.device).unwrap_or_else(|err| fail("classify::train", err));

    match train(&options, &device) {
        Ok(summary) => {
            let accuracy = summary
                .validation_accuracy
                .map_or("NA".to_string(), |acc| format!("{:.4}", acc));

            ut::track::progress_log(
                &format!(
                    "Complete. {} epochs | best loss {:.4} | val_acc {}",
                    summary.epochs, summary.best_loss, accuracy
                ),
                options.verbose,
            );
        }
        Err(err) => fail("classify::train", err),
    }
}

fn options(args: &ClassifyTrainArgs) -> Result<TrainOptions, String> {
    let backbone = Weights::select(&args.arch).map_err(|err| err.to_string())?;
    let hidden_layers = parse_hidden_layers(&args.hidden_layers).map_err(|err| err.to_string())?;

    // Reject bad codes before any images are loaded
    Augmenter::parse(&args.augmentation, args.seed).map_err(|err| err.to_string())?;

    if !(0.0..1.0).contains(&args.validation_split) {
        return Err("Validation split must be in [0, 1).".to_string());
    }

    if args.learning_rate <= 0.0 || !args.learning_rate.is_finite() {
        return Err("Learning rate must be positive.".to_string());
    }

    if args.batch_size == 0 || args.epochs == 0 || args.patience == 0 {
        return Err("Batch size, epochs and patience must be positive.".to_string());
    }

    if !args.data.is_dir() {
        return Err(format!(
            "Training directory {} does not exist.",
            args.data.display()
        ));
    }

    let labels = args
        .class_labels_file
        .clone()
        .unwrap_or_else(|| labels_path(&args.model));

    Ok(TrainOptions {
        data: args.data.clone(),
        model: args.model.clone(),
        labels,
        backbone,
        hidden_layers,
        validation_split: args.validation_split,
        learning_rate: args.learning_rate,
        batch_size: args.batch_size,
        epochs: args.epochs,
        patience: args.patience,
        trainable: args.trainable,
        augmentation: args.augmentation.clone(),
        seed: args.seed,
        verbose: !args.quiet,
    })
}
