// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

pub mod augment;
pub mod dataset;
pub mod load;
pub mod models;
pub mod nn;
pub mod predict;
pub mod preprocess;
pub mod train;

/// Wrap any displayable error as a candle error
pub(crate) fn candle_error<E: std::fmt::Display>(err: E) -> candle_core::Error {
    candle_core::Error::Msg(err.to_string())
}
