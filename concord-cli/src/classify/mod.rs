// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use candle_core::{Device, utils::cuda_is_available, utils::metal_is_available};
use clap::{Args, Subcommand};

mod predict;
mod train;

use predict::{ClassifyPredictArgs, classify_predict};
use train::{ClassifyTrainArgs, classify_train};

#[derive(Debug, Args)]
#[command(about = "Train or apply a transfer-learning tile classifier.")]
#[command(arg_required_else_help = true)]
#[command(flatten_help = true)]
pub struct ClassifyArgs {
    #[command(subcommand)]
    command: ClassifyCommands,
}

#[derive(Debug, Subcommand)]
enum ClassifyCommands {
    Train(ClassifyTrainArgs),
    Predict(ClassifyPredictArgs),
}

pub fn classify(args: &ClassifyArgs) {
    match &args.command {
        ClassifyCommands::Train(train) => classify_train(train),
        ClassifyCommands::Predict(predict) => classify_predict(predict),
    }
}

/// Resolve a device name (cpu, cuda, metal) to an available device
pub(crate) fn select_device(name: &str) -> Result<Device, String> {
    match name {
        "cpu" => Ok(Device::Cpu),
        "cuda" => {
            if !cuda_is_available() {
                return Err("Device 'cuda' specified but no cuda device was detected.".to_string());
            }

            Device::new_cuda(0).map_err(|err| err.to_string())
        }
        "metal" => {
            if !metal_is_available() {
                return Err("Device 'metal' specified but no metal device was detected.".to_string());
            }

            Device::new_metal(0).map_err(|err| err.to_string())
        }
        _ => Err(format!(
            "Invalid device '{}'. Must be one of: cpu, metal, cuda.",
            name
        )),
    }
}
