#![allow(clippy::all)]
use clap::{Parser, Subcommand};
use clap_markdown;

use concord_cli::{classify, download, kappa, mask, split, split_by_mask, stats};

#[derive(Parser)]
#[command(name = "concord", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
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
    clap_markdown::print_help_markdown::<Cli>();
}
