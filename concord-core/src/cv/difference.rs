// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::Path;

use rayon::prelude::*;

use crate::constant::{DIFFERENCE_THRESHOLD, MASK_POSITIVE};
use crate::error::ConcordError;
use crate::im::{ConcordImage, ConcordMask};

/// Extract the annotation mask between a source image and its annotated copy
///
/// For every channel both saturating differences `a - b` and `b - a` are
/// binarized at `> 64`, and the binarized results of all channels are OR'd
/// together. The mask is therefore symmetric in its arguments.
///
/// # Arguments
///
/// * `a` - Source image
/// * `b` - Annotated image with the same shape and sample depth
///
/// # Examples
///
/// ```
/// use concord_core::cv::difference_mask;
/// use concord_core::im::{ConcordBuffer, ConcordImage};
///
/// let a = ConcordImage::U8(ConcordBuffer::new(3, 1, 1, vec![0u8, 100, 200]).unwrap());
/// let b = ConcordImage::U8(ConcordBuffer::new(3, 1, 1, vec![64u8, 165, 100]).unwrap());
///
/// let mask = difference_mask(&a, &b).unwrap();
/// assert_eq!(mask.as_raw(), &[0, 255, 255]);
/// ```
pub fn difference_mask(a: &ConcordImage, b: &ConcordImage) -> Result<ConcordMask, ConcordError> {
    a.ensure_same_shape(b)?;

    let channels = a.channels() as usize;

    let data: Vec<u8> = match (a, b) {
        (ConcordImage::U8(a), ConcordImage::U8(b)) => {
            differs(a.as_raw(), b.as_raw(), channels, |x, y| x.abs_diff(y) as u32)
        }
        (ConcordImage::U16(a), ConcordImage::U16(b)) => {
            differs(a.as_raw(), b.as_raw(), channels, |x, y| x.abs_diff(y) as u32)
        }
        _ => {
            return Err(ConcordError::ImageError(
                "Source and annotated images must have the same sample depth.",
            ));
        }
    };

    ConcordMask::new(a.width(), a.height(), 1, data)
}

// Only one of `a - b` and `b - a` is non-zero after saturation, so testing
// the absolute difference is the same as OR-ing both binarized differences.
fn differs<T, F>(a: &[T], b: &[T], channels: usize, distance: F) -> Vec<u8>
where
    T: Copy + Sync,
    F: Fn(T, T) -> u32 + Sync,
{
    a.par_chunks_exact(channels)
        .zip(b.par_chunks_exact(channels))
        .map(|(pa, pb)| {
            let changed = pa
                .iter()
                .zip(pb)
                .any(|(&x, &y)| distance(x, y) > DIFFERENCE_THRESHOLD);

            if changed { MASK_POSITIVE } else { 0 }
        })
        .collect()
}

/// Open a source image and its annotated copy and extract their difference mask
///
/// # Arguments
///
/// * `source` - Path to the source image
/// * `annotated` - Path to the annotated image
pub fn ground_truth_mask<P: AsRef<Path>>(
    source: P,
    annotated: P,
) -> Result<ConcordMask, ConcordError> {
    let source = ConcordImage::open(source)?;
    let annotated = ConcordImage::open(annotated)?;

    difference_mask(&source, &annotated)
}
