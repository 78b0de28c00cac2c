// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use crate::constant::{DOWNSAMPLE_THRESHOLD, MASK_POSITIVE};
use crate::cv::transform::resize_area_fast;
use crate::error::ConcordError;
use crate::im::ConcordMask;

/// Coarsen a mask into a grid of salient cells
///
/// The mask is split into non-overlapping `cell` x `cell` blocks (blocks on
/// the right and bottom edges are clipped to the mask). Every pixel of a
/// block is set to 255 when the block's positive fraction is at least
/// `crit`, and to 0 otherwise.
///
/// # Arguments
///
/// * `mask` - Binary mask
/// * `cell` - Edge length of a grid cell in pixels
/// * `crit` - Minimum positive fraction for a salient cell
///
/// # Examples
///
/// ```
/// use concord_core::cv::salience_map;
/// use concord_core::im::{BoundingBox, ConcordMask};
///
/// let mut mask = ConcordMask::zeros(4, 2);
/// mask.fill(&BoundingBox::new(0, 0, 1, 1).unwrap());
///
/// let salience = salience_map(&mask, 2, 0.5).unwrap();
/// assert_eq!(salience.as_raw(), &[255, 255, 0, 0, 255, 255, 0, 0]);
/// ```
pub fn salience_map(mask: &ConcordMask, cell: u32, crit: f64) -> Result<ConcordMask, ConcordError> {
    if cell == 0 {
        return Err(ConcordError::KappaError("Salience cell size must be positive."));
    }

    let mut salience = ConcordMask::zeros(mask.width(), mask.height());
    let width = mask.width() as usize;

    for y in (0..mask.height()).step_by(cell as usize) {
        for x in (0..mask.width()).step_by(cell as usize) {
            if mask.fraction(x, y, cell, cell) < crit {
                continue;
            }

            let x_end = (x + cell).min(mask.width()) as usize;
            let y_end = (y + cell).min(mask.height()) as usize;

            for row in y as usize..y_end {
                salience.buffer[row * width + x as usize..row * width + x_end].fill(MASK_POSITIVE);
            }
        }
    }

    Ok(salience)
}

/// Shrink a mask by `factor` with area averaging and re-binarize at `> 64`
///
/// Each output axis is `max(1, floor(dim * factor))` pixels long.
///
/// # Arguments
///
/// * `mask` - Binary mask
/// * `factor` - Scale factor in (0, 1]
pub fn downsample(mask: &ConcordMask, factor: f64) -> Result<ConcordMask, ConcordError> {
    if !(factor > 0.0 && factor <= 1.0) {
        return Err(ConcordError::KappaError("Downsampling factor must be in (0, 1]."));
    }

    if mask.is_empty() {
        return Err(ConcordError::MaskError("Cannot downsample an empty mask."));
    }

    let width = ((mask.width() as f64 * factor).floor() as u32).max(1);
    let height = ((mask.height() as f64 * factor).floor() as u32).max(1);

    let mut small = resize_area_fast(mask, width, height)?;
    small.binarize(DOWNSAMPLE_THRESHOLD);

    Ok(small)
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::im::BoundingBox;

    #[test]
    fn test_salience_edge_cells_clipped() {
        // 5x5 mask with a 2x2 grid cell leaves 1-pixel edge cells
        let mut mask = ConcordMask::zeros(5, 5);
        mask.fill(&BoundingBox::new(4, 4, 5, 5).unwrap());

        let salience = salience_map(&mask, 2, 1.0).unwrap();
        assert_eq!(salience.count_positive(), 1);
        assert_eq!(salience.as_raw()[24], 255);
    }

    #[test]
    fn test_salience_crit_inclusive() {
        let mut mask = ConcordMask::zeros(10, 10);
        mask.fill(&BoundingBox::new(0, 0, 1, 4).unwrap());

        // 10 of 100 pixels positive in the single cell
        assert_eq!(salience_map(&mask, 10, 0.1).unwrap().count_positive(), 100);
        assert_eq!(salience_map(&mask, 10, 0.11).unwrap().count_positive(), 0);
    }

    #[test]
    fn test_salience_zero_cell() {
        assert!(salience_map(&ConcordMask::zeros(2, 2), 0, 0.1).is_err());
    }

    #[test]
    fn test_downsample_shape() {
        let mask = ConcordMask::filled(120, 49, 1, 255);
        let small = downsample(&mask, 0.02).unwrap();

        assert_eq!(small.shape(), (1, 2, 1));
        assert_eq!(small.as_raw(), &[255, 255]);
    }

    #[test]
    fn test_downsample_binary() {
        let mut mask = ConcordMask::zeros(100, 100);
        mask.fill(&BoundingBox::new(0, 0, 99, 49).unwrap());

        let small = downsample(&mask, 0.02).unwrap();
        assert!(small.iter().all(|&v| v == 0 || v == 255));
        assert_eq!(small.as_raw(), &[255, 0, 255, 0]);
    }

    #[test]
    fn test_downsample_invalid_factor() {
        assert!(downsample(&ConcordMask::zeros(4, 4), 0.0).is_err());
        assert!(downsample(&ConcordMask::zeros(4, 4), 1.5).is_err());
    }
}
