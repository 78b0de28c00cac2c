// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

pub mod kappa;
pub mod rate;
pub mod stats;

pub use kappa::{aggregate_raters, cohen_kappa, fleiss_kappa};
pub use rate::{Rate, format_significant};
pub use stats::{ConfusionCounts, TwoClassStats, confusion_counts};
