// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use concord_cli::{classify, download, kappa, mask, split, split_by_mask, stats};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Mask(mask::MaskArgs),
    Stats(stats::StatsArgs),
    Split(split::SplitArgs),
    SplitByMask(split_by_mask::SplitByMaskArgs),
    Kappa(kappa::KappaArgs),
    Classify(classify::ClassifyArgs),
    Download(download::DownloadArgs),
}

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            let _ = err.print();
            std::process::exit(1);
        }
    });

    match &cli.command {
        Commands::Mask(mask_args) => mask::mask(mask_args),
        Commands::Stats(stats_args) => stats::stats(stats_args),
        Commands::Split(split_args) => split::split(split_args),
        Commands::SplitByMask(split_args) => split_by_mask::split_by_mask(split_args),
        Commands::Kappa(kappa_args) => kappa::kappa(kappa_args),
        Commands::Classify(classify_args) => classify::classify(classify_args),
        Commands::Download(download_args) => download::download(download_args),
    }
}
