// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::Path;

use crate::constant::{MASK_POSITIVE, MASK_THRESHOLD};
use crate::error::ConcordError;
use crate::im::{BoundingBox, ConcordBuffer, ConcordImage};

/// A row-major, single-channel container storing binary mask pixels
///
/// Every pixel is either 0 (negative) or 255 (positive). Masks are produced
/// by thresholding with strictly-greater-than semantics, so a pixel equal to
/// the threshold is negative.
///
/// # Examples
///
/// ```
/// use concord_core::im::ConcordMask;
///
/// let mask = ConcordMask::zeros(10, 10);
///
/// assert_eq!(mask.count_positive(), 0);
/// assert_eq!(mask.len(), 100);
/// ```
pub type ConcordMask = ConcordBuffer<u8, Vec<u8>>;

// >>> I/O METHODS

impl ConcordMask {
    /// Open a mask image from a provided path, binarizing at `> 127`
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    ///
    /// ```no_run
    /// use concord_core::im::ConcordMask;
    /// let mask = ConcordMask::open("mask.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ConcordMask, ConcordError> {
        let image = ConcordImage::open(path)?;
        Self::from_image(&image, MASK_THRESHOLD)
    }

    /// Save mask, choosing the encoder from the file extension
    ///
    /// # Arguments
    ///
    /// * `path` - Output path (e.g. png, tif, bmp, jpg, npy)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConcordError> {
        ConcordImage::U8(self.clone()).save(path)
    }
}

// <<< I/O METHODS

// >>> CONSTRUCTION METHODS

impl ConcordMask {
    /// An all-negative mask
    pub fn zeros(width: u32, height: u32) -> ConcordMask {
        ConcordMask::filled(width, height, 1, 0)
    }

    /// Binarize an image into a mask
    ///
    /// A pixel is positive when any of its channels is strictly greater than
    /// `threshold`.
    ///
    /// # Arguments
    ///
    /// * `image` - An 8 or 16-bit image with any number of channels
    /// * `threshold` - Intensity that a channel must exceed
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_core::im::{ConcordBuffer, ConcordImage, ConcordMask};
    ///
    /// let buffer = ConcordBuffer::new(3, 1, 1, vec![127u8, 128, 0]).unwrap();
    /// let mask = ConcordMask::from_image(&ConcordImage::U8(buffer), 127).unwrap();
    ///
    /// assert_eq!(mask.as_raw(), &[0, 255, 0]);
    /// ```
    pub fn from_image(image: &ConcordImage, threshold: u32) -> Result<ConcordMask, ConcordError> {
        let data: Vec<u8> = match image {
            ConcordImage::U8(buffer) => buffer
                .iter_pixels()
                .map(|pixel| positive(pixel.iter().any(|&v| v as u32 > threshold)))
                .collect(),
            ConcordImage::U16(buffer) => buffer
                .iter_pixels()
                .map(|pixel| positive(pixel.iter().any(|&v| v as u32 > threshold)))
                .collect(),
        };

        ConcordMask::new(image.width(), image.height(), 1, data)
    }

    /// Re-binarize the mask in place at `> threshold`
    pub fn binarize(&mut self, threshold: u32) {
        self.buffer
            .iter_mut()
            .for_each(|v| *v = positive(*v as u32 > threshold));
    }
}

#[inline]
fn positive(flag: bool) -> u8 {
    if flag { MASK_POSITIVE } else { 0 }
}

// <<< CONSTRUCTION METHODS

// >>> MEASUREMENT METHODS

impl ConcordMask {
    /// Number of positive pixels
    pub fn count_positive(&self) -> u64 {
        self.iter().filter(|&&v| v != 0).count() as u64
    }

    /// Number of positive pixels in a region clipped to the mask
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left)
    /// * `y` - Minimum y-coordinate (top)
    /// * `w` - Width of region
    /// * `h` - Height of region
    pub fn count_positive_in(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        self.crop_view(x, y, w, h).count_nonzero() as u64
    }

    /// Fraction of positive pixels in a region clipped to the mask
    ///
    /// The denominator is the clipped area, so edge regions are not diluted
    /// by pixels outside the mask. An empty region has fraction 0.
    pub fn fraction(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let view = self.crop_view(x, y, w, h);
        let area = view.width() * view.height();

        if area == 0 {
            return 0.0;
        }

        view.count_nonzero() as f64 / area as f64
    }

    /// Fraction of a bounding box covered by positive pixels
    ///
    /// Pixels are counted inside the half-open box clipped to the mask, and
    /// divided by the declared box area. A box hanging off the mask therefore
    /// never reaches full coverage.
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_core::im::{BoundingBox, ConcordMask};
    ///
    /// let mut mask = ConcordMask::zeros(10, 10);
    /// mask.fill(&BoundingBox::new(0, 0, 4, 9).unwrap());
    ///
    /// let coverage = mask.coverage(&BoundingBox::new(0, 0, 10, 10).unwrap());
    /// assert_eq!(coverage, 0.5);
    /// ```
    pub fn coverage(&self, bbox: &BoundingBox) -> f64 {
        let area = bbox.area();

        if area == 0 {
            return 0.0;
        }

        let count = self.count_positive_in(bbox.x0, bbox.y0, bbox.width(), bbox.height());

        count as f64 / area as f64
    }
}

// <<< MEASUREMENT METHODS

// >>> TRANSFORM METHODS

impl ConcordMask {
    /// Force every pixel of a box to positive
    ///
    /// The fill includes the far row `y1` and column `x1` and is clipped to
    /// the mask.
    pub fn fill(&mut self, bbox: &BoundingBox) {
        let width = self.width();
        let height = self.height();

        if bbox.x0 >= width || bbox.y0 >= height {
            return;
        }

        let x_end = bbox.x1.min(width - 1) as usize;
        let y_end = bbox.y1.min(height - 1) as usize;
        let stride = width as usize;

        for row in bbox.y0 as usize..=y_end {
            let start = row * stride + bbox.x0 as usize;
            let end = row * stride + x_end;
            self.buffer[start..=end].fill(MASK_POSITIVE);
        }
    }
}

// <<< TRANSFORM METHODS

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_from_image_any_channel() {
        let buffer = ConcordBuffer::new(3, 1, 3, vec![0u8, 0, 200, 10, 10, 10, 128, 0, 0]).unwrap();
        let mask = ConcordMask::from_image(&ConcordImage::U8(buffer), 127).unwrap();

        assert_eq!(mask.as_raw(), &[255, 0, 255]);
        assert_eq!(mask.channels(), 1);
    }

    #[test]
    fn test_from_image_u16_unscaled() {
        let buffer = ConcordBuffer::new(2, 1, 1, vec![100u16, 1000]).unwrap();
        let mask = ConcordMask::from_image(&ConcordImage::U16(buffer), 127).unwrap();

        assert_eq!(mask.as_raw(), &[0, 255]);
    }

    #[test]
    fn test_binarize() {
        let mut mask = ConcordMask::new(4, 1, 1, vec![0, 64, 65, 255]).unwrap();
        mask.binarize(64);

        assert_eq!(mask.as_raw(), &[0, 0, 255, 255]);
    }

    #[test]
    fn test_fraction_clipped() {
        let mut mask = ConcordMask::zeros(4, 4);
        mask.fill(&BoundingBox::new(2, 2, 3, 3).unwrap());

        assert_eq!(mask.fraction(2, 2, 10, 10), 1.0);
        assert_eq!(mask.fraction(0, 0, 4, 4), 0.25);
        assert_eq!(mask.fraction(8, 8, 2, 2), 0.0);
    }

    #[test]
    fn test_fill_inclusive_and_clipped() {
        let mut mask = ConcordMask::zeros(5, 5);
        mask.fill(&BoundingBox::new(3, 3, 10, 10).unwrap());

        assert_eq!(mask.count_positive(), 4);

        let mut mask = ConcordMask::zeros(5, 5);
        mask.fill(&BoundingBox::new(1, 1, 2, 2).unwrap());

        assert_eq!(mask.count_positive(), 4);
        assert_eq!(mask.count_positive_in(1, 1, 2, 2), 4);
    }

    #[test]
    fn test_fill_outside_is_noop() {
        let mut mask = ConcordMask::zeros(5, 5);
        mask.fill(&BoundingBox::new(6, 6, 8, 8).unwrap());

        assert_eq!(mask.count_positive(), 0);
    }

    #[test]
    fn test_coverage_is_bounded() {
        let mut mask = ConcordMask::zeros(6, 6);
        mask.fill(&BoundingBox::new(0, 0, 5, 5).unwrap());

        let inside = BoundingBox::new(1, 1, 4, 4).unwrap();
        assert_eq!(mask.coverage(&inside), 1.0);

        let overhang = BoundingBox::new(3, 3, 9, 9).unwrap();
        let coverage = mask.coverage(&overhang);
        assert!((0.0..=1.0).contains(&coverage));
        assert_eq!(coverage, 9.0 / 36.0);
    }

    #[test]
    fn test_save_and_open_roundtrip() {
        const TEST_MASK: &str = "TEST_MASK_SAVE.png";

        let mut mask = ConcordMask::zeros(8, 4);
        mask.fill(&BoundingBox::new(1, 2, 2, 5).unwrap());
        mask.save(TEST_MASK).unwrap();

        let reopened = ConcordMask::open(TEST_MASK).unwrap();
        assert_eq!(reopened, mask);

        std::fs::remove_file(TEST_MASK).unwrap();
    }
}
