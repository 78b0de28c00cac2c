// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use clap::Args;
use colored::Colorize;

use concord_core::ut::track::progress_log;
use concord_data::data::Weights;

use crate::fail;

#[derive(Debug, Args)]
#[command(about = "Download pretrained classifier backbone weights into the local cache.")]
pub struct DownloadArgs {
    #[arg(short, long, help = "Weights name.")]
    pub name: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,

    #[arg(long, help = "List all available backbone weights.")]
    pub list: bool,

    #[arg(long, help = "Download all available backbone weights.")]
    pub all: bool,
}

pub fn download(args: &DownloadArgs) {
    if args.list {
        print_weights();
        return;
    }

    if args.all {
        progress_log("Downloading all backbone weights to cache", args.verbose);

        for weights in Weights::iter() {
            if let Err(err) = weights.download(args.verbose) {
                fail("download", err);
            }
        }

        return;
    }

    let Some(name) = args.name.as_ref() else {
        fail(
            "download",
            "The weights --name/-n must be specified. Run `concord download --list` to see all available weights.",
        );
    };

    let result = Weights::select(name).and_then(|weights| {
        weights.download(args.verbose)?;
        Ok(weights)
    });

    match result {
        Ok(weights) => progress_log(
            &format!("Weights available at {}", weights.path().display()),
            args.verbose,
        ),
        Err(err) => fail("download", err),
    }
}

fn print_weights() {
    println!();
    println!("| {:-^74} |", "");
    println!("| {:^74} |", "concord".truecolor(196, 132, 62).bold());
    println!("| {:^74} |", "Pretrained classifier backbones");
    println!("| {:-^18} | {:-^19} | {:-^10} | {:-^18} |", "", "", "", "");
    println!(
        "| {:^18} | {:^19} | {:^10} | {:^18} |",
        "model".bold(),
        "author".bold(),
        "size (GB)".bold(),
        "license".bold()
    );
    println!("| {:-^18} | {:-^19} | {:-^10} | {:-^18} |", "", "", "", "");

    for weights in Weights::iter() {
        println!(
            "| {:^18} | {:^19} | {:^10} | {:^18} |",
            weights.model_name(),
            weights.data_authors(),
            weights.data_size(),
            weights.license(),
        );
    }

    println!("| {:-^18} | {:-^19} | {:-^10} | {:-^18} |", "", "", "", "");
    println!();
}
