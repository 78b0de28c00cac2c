// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::Path;

use crate::error::ConcordError;
use crate::im::ConcordMask;

/// An axis-aligned box in `(y0, x0, y1, x1)` pixel coordinates
///
/// The box spans rows `y0..y1` and columns `x0..x1` (half-open) when its
/// coverage is measured. Boxes with a non-positive height or width are
/// rejected.
///
/// # Examples
///
/// ```
/// use concord_core::im::BoundingBox;
///
/// let bbox = BoundingBox::new(2, 3, 6, 5).unwrap();
/// assert_eq!((bbox.height(), bbox.width(), bbox.area()), (4, 2, 8));
///
/// assert!(BoundingBox::new(6, 3, 2, 5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub y0: u32,
    pub x0: u32,
    pub y1: u32,
    pub x1: u32,
}

impl BoundingBox {
    pub fn new(y0: u32, x0: u32, y1: u32, x1: u32) -> Result<Self, ConcordError> {
        if y1 <= y0 || x1 <= x0 {
            return Err(ConcordError::BoxesReadError(format!(
                "Box ({}, {}, {}, {}) must satisfy y1 > y0 and x1 > x0.",
                y0, x0, y1, x1
            )));
        }

        Ok(BoundingBox { y0, x0, y1, x1 })
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    /// Declared area of the box, irrespective of any image bounds
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// An ordered list of bounding boxes read from a plain-text box file
///
/// Each non-blank line holds four whitespace-separated integers
/// `y0 x0 y1 x1`.
///
/// # Examples
///
/// ```
/// use concord_core::im::BoundingBoxes;
///
/// let boxes = BoundingBoxes::parse("0 0 4 4\n\n2 2 8 9\n", "boxes.txt").unwrap();
/// assert_eq!(boxes.len(), 2);
///
/// assert!(BoundingBoxes::parse("0 0 4\n", "boxes.txt").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundingBoxes {
    data: Vec<BoundingBox>,
}

impl BoundingBoxes {
    /// Initialize a new bounding boxes container
    pub fn new(data: Vec<BoundingBox>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundingBox> {
        self.data.iter()
    }
}

// >>> I/O METHODS

impl BoundingBoxes {
    /// Open bounding boxes from the provided path
    ///
    /// # Arguments
    ///
    /// * `path` - A path to a plain-text box list
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use concord_core::im::BoundingBoxes;
    /// let bounding_boxes = BoundingBoxes::open("boxes.txt");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<BoundingBoxes, ConcordError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|err| ConcordError::BoxesReadError(format!("{}: {}", source, err)))?;

        Self::parse(&contents, &source)
    }

    /// Parse bounding boxes from the contents of a box list
    ///
    /// # Arguments
    ///
    /// * `contents` - Box list text
    /// * `source` - Name reported alongside the line number on failure
    pub fn parse(contents: &str, source: &str) -> Result<BoundingBoxes, ConcordError> {
        let mut data = Vec::new();

        for (i, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let invalid = |reason: String| {
                ConcordError::BoxesReadError(format!("{}:{}: {}", source, i + 1, reason))
            };

            let values = line
                .split_whitespace()
                .map(|v| v.parse::<u32>())
                .collect::<Result<Vec<u32>, _>>()
                .map_err(|_| invalid(format!("Could not parse '{}' as integers.", line.trim())))?;

            let &[y0, x0, y1, x1] = values.as_slice() else {
                return Err(invalid(format!(
                    "Expected 4 values (y0 x0 y1 x1) but found {}.",
                    values.len()
                )));
            };

            let bbox = BoundingBox::new(y0, x0, y1, x1).map_err(|err| match err {
                ConcordError::BoxesReadError(reason) => invalid(reason),
                other => other,
            })?;

            data.push(bbox);
        }

        Ok(BoundingBoxes { data })
    }
}

// <<< I/O METHODS

/// Fill every box whose ground-truth coverage reaches `crit`
///
/// Coverage is always measured on the untouched `mask`, so the outcome does
/// not depend on box order. Fills are applied to a copy, which is returned
/// with the number of boxes that were filled.
///
/// # Arguments
///
/// * `mask` - Ground-truth mask
/// * `boxes` - Candidate boxes
/// * `crit` - Minimum coverage required to fill a box
///
/// # Examples
///
/// ```
/// use concord_core::im::{apply_crit, BoundingBox, BoundingBoxes, ConcordMask};
///
/// let mut mask = ConcordMask::zeros(10, 10);
/// mask.fill(&BoundingBox::new(0, 0, 9, 8).unwrap());
///
/// let boxes = BoundingBoxes::new(vec![BoundingBox::new(0, 0, 10, 10).unwrap()]);
///
/// let (filled, n) = apply_crit(&mask, &boxes, 0.9);
/// assert_eq!((filled.count_positive(), n), (100, 1));
///
/// let (kept, n) = apply_crit(&mask, &boxes, 0.95);
/// assert_eq!((kept, n), (mask, 0));
/// ```
pub fn apply_crit(mask: &ConcordMask, boxes: &BoundingBoxes, crit: f64) -> (ConcordMask, usize) {
    let mut working = mask.clone();
    let mut filled = 0;

    for bbox in boxes.iter() {
        if mask.coverage(bbox) >= crit {
            working.fill(bbox);
            filled += 1;
        }
    }

    (working, filled)
}
