// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

pub mod classify;
pub mod download;
pub mod kappa;
pub mod mask;
pub mod split;
pub mod split_by_mask;
pub mod stats;

/// Report a failed subcommand on stderr and exit with status 1
pub(crate) fn fail<E: std::fmt::Display>(command: &str, err: E) -> ! {
    eprintln!("[concord::{}] ERROR: {}", command, err);
    std::process::exit(1);
}
