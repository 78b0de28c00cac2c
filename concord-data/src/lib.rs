// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use dirs::home_dir;

/// Directory holding downloaded backbone weights
///
/// `CONCORD_CACHE` takes precedence when set to a non-empty path, otherwise
/// `~/.concord_cache` is used.
pub fn get_concord_cache() -> std::path::PathBuf {
    if let Ok(concord_cache) = std::env::var("CONCORD_CACHE") {
        if !concord_cache.is_empty() {
            return std::path::PathBuf::from(concord_cache);
        }
    }

    if let Some(home) = home_dir() {
        return home.join(".concord_cache");
    }

    std::path::PathBuf::from("/.concord_cache")
}

pub mod data;
pub mod request;
