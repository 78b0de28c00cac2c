// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ConcordError {
    BufferSizeError,
    DimensionMismatch {
        expected: (u32, u32, u32),
        found: (u32, u32, u32),
    },
    ImageError(&'static str),
    ImageReadError(String),
    ImageWriteError(String),
    ImageFormatError,
    ImageExtensionError(String),
    MaskError(&'static str),
    BoxesReadError(String),
    TileError(&'static str),
    KappaError(&'static str),
    NoFileError(String),
    DirError(String),
    OtherError(String),
}

impl fmt::Display for ConcordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConcordError::BufferSizeError => {
                write!(
                    f,
                    "[concord::BufferSizeError] The buffer does not match provided size."
                )
            }
            ConcordError::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "[concord::DimensionMismatch] Expected (height, width, channels) of {:?} but found {:?}.",
                    expected, found
                )
            }
            ConcordError::ImageError(message) => {
                write!(f, "[concord::ImageError] {}", message)
            }
            ConcordError::ImageReadError(path) => {
                write!(f, "[concord::ImageReadError] Failed to read image {}.", path)
            }
            ConcordError::ImageWriteError(path) => {
                write!(
                    f,
                    "[concord::ImageWriteError] Failed to write image {}.",
                    path
                )
            }
            ConcordError::ImageFormatError => {
                write!(
                    f,
                    "[concord::ImageFormatError] Only 1 and 3-channel u8 and u16 images are currently supported."
                )
            }
            ConcordError::ImageExtensionError(path) => {
                write!(
                    f,
                    "[concord::ImageExtensionError] Could not detect a valid image extension for {}.",
                    path
                )
            }
            ConcordError::MaskError(message) => {
                write!(f, "[concord::MaskError] {}", message)
            }
            ConcordError::BoxesReadError(message) => {
                write!(
                    f,
                    "[concord::BoxesReadError] Bounding boxes could not be read. {}",
                    message
                )
            }
            ConcordError::TileError(message) => {
                write!(f, "[concord::TileError] {}", message)
            }
            ConcordError::KappaError(message) => {
                write!(f, "[concord::KappaError] {}", message)
            }
            ConcordError::NoFileError(message) => {
                write!(
                    f,
                    "[concord::NoFileError] File could not be found. {}.",
                    message
                )
            }
            ConcordError::DirError(message) => {
                write!(
                    f,
                    "[concord::DirError] Directory could not be read or created. {}.",
                    message
                )
            }
            ConcordError::OtherError(message) => {
                write!(f, "[concord::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for ConcordError {}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = ConcordError::ImageReadError("missing.png".to_string());
        assert!(err.to_string().contains("missing.png"));
        assert!(err.to_string().starts_with("[concord::ImageReadError]"));
    }

    #[test]
    fn test_display_dimension_mismatch() {
        let err = ConcordError::DimensionMismatch {
            expected: (2, 3, 1),
            found: (3, 2, 1),
        };
        assert!(err.to_string().contains("(2, 3, 1)"));
        assert!(err.to_string().contains("(3, 2, 1)"));
    }
}
