// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use crate::error::ConcordError;
use crate::im::ConcordMask;
use crate::mp::Rate;

/// Pixel-level confusion matrix of a predicted mask against a ground truth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: u64,
    pub fn_: u64,
    pub fp: u64,
    pub tn: u64,
}

impl ConfusionCounts {
    pub fn pixels(&self) -> u64 {
        self.tp + self.fn_ + self.fp + self.tn
    }

    /// True positive rate, `tp / (tp + fn)`
    pub fn sensitivity(&self) -> Rate {
        Rate::ratio(self.tp, self.tp + self.fn_)
    }

    /// True negative rate, `tn / (tn + fp)`
    pub fn specificity(&self) -> Rate {
        Rate::ratio(self.tn, self.tn + self.fp)
    }

    /// Positive predictive value (precision), `tp / (tp + fp)`
    pub fn ppv(&self) -> Rate {
        Rate::ratio(self.tp, self.tp + self.fp)
    }

    /// Negative predictive value, `tn / (tn + fn)`
    pub fn npv(&self) -> Rate {
        Rate::ratio(self.tn, self.tn + self.fn_)
    }

    /// Harmonic mean of sensitivity and precision
    pub fn f1(&self) -> Rate {
        match (self.sensitivity(), self.ppv()) {
            (Rate::Value(sens), Rate::Value(ppv)) if sens + ppv > 0.0 => {
                Rate::Value(2.0 * sens * ppv / (sens + ppv))
            }
            _ => Rate::NotApplicable,
        }
    }

    /// Intersection over union, `tp / (tp + fn + fp)`
    pub fn jaccard(&self) -> Rate {
        Rate::ratio(self.tp, self.tp + self.fn_ + self.fp)
    }

    pub fn accuracy(&self) -> Rate {
        Rate::ratio(self.tp + self.tn, self.pixels())
    }
}

/// Count agreement between a ground-truth and a predicted mask
///
/// # Arguments
///
/// * `gt` - Ground-truth mask
/// * `pred` - Predicted mask with the same dimensions
///
/// # Examples
///
/// ```
/// use concord_core::im::ConcordMask;
/// use concord_core::mp::confusion_counts;
///
/// let gt = ConcordMask::new(4, 1, 1, vec![255, 255, 0, 0]).unwrap();
/// let pred = ConcordMask::new(4, 1, 1, vec![255, 0, 255, 0]).unwrap();
///
/// let counts = confusion_counts(&gt, &pred).unwrap();
/// assert_eq!((counts.tp, counts.fn_, counts.fp, counts.tn), (1, 1, 1, 1));
/// ```
pub fn confusion_counts(
    gt: &ConcordMask,
    pred: &ConcordMask,
) -> Result<ConfusionCounts, ConcordError> {
    if gt.shape() != pred.shape() {
        return Err(ConcordError::DimensionMismatch {
            expected: gt.shape(),
            found: pred.shape(),
        });
    }

    let mut counts = ConfusionCounts::default();

    for (&g, &p) in gt.iter().zip(pred.iter()) {
        match (g != 0, p != 0) {
            (true, true) => counts.tp += 1,
            (true, false) => counts.fn_ += 1,
            (false, true) => counts.fp += 1,
            (false, false) => counts.tn += 1,
        }
    }

    Ok(counts)
}

/// The two-class statistics report for one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoClassStats {
    pub width: u32,
    pub height: u32,
    pub counts: ConfusionCounts,
}

impl TwoClassStats {
    /// Compare two masks and collect their report
    pub fn new(gt: &ConcordMask, pred: &ConcordMask) -> Result<TwoClassStats, ConcordError> {
        Ok(TwoClassStats {
            width: gt.width(),
            height: gt.height(),
            counts: confusion_counts(gt, pred)?,
        })
    }

    /// Report rows in their fixed output order
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_core::im::ConcordMask;
    /// use concord_core::mp::TwoClassStats;
    ///
    /// let zeros = ConcordMask::zeros(10, 10);
    /// let rows = TwoClassStats::new(&zeros, &zeros).unwrap().rows();
    ///
    /// assert_eq!(rows[6], ("tn", "100".to_string()));
    /// assert_eq!(rows[7], ("sens", "NA".to_string()));
    /// assert_eq!(rows[8], ("spec", "1".to_string()));
    /// assert_eq!(rows[13], ("acc", "1".to_string()));
    /// ```
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let c = &self.counts;

        vec![
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("pixels", c.pixels().to_string()),
            ("tp", c.tp.to_string()),
            ("fn", c.fn_.to_string()),
            ("fp", c.fp.to_string()),
            ("tn", c.tn.to_string()),
            ("sens", c.sensitivity().to_string()),
            ("spec", c.specificity().to_string()),
            ("ppv", c.ppv().to_string()),
            ("npv", c.npv().to_string()),
            ("f1", c.f1().to_string()),
            ("jaccard", c.jaccard().to_string()),
            ("acc", c.accuracy().to_string()),
        ]
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_all_zero_masks() {
        let zeros = ConcordMask::zeros(10, 10);
        let counts = confusion_counts(&zeros, &zeros).unwrap();

        assert_eq!(counts, ConfusionCounts { tp: 0, fn_: 0, fp: 0, tn: 100 });
        assert_eq!(counts.sensitivity(), Rate::NotApplicable);
        assert_eq!(counts.ppv(), Rate::NotApplicable);
        assert_eq!(counts.f1(), Rate::NotApplicable);
        assert_eq!(counts.jaccard(), Rate::NotApplicable);
        assert_eq!(counts.specificity(), Rate::Value(1.0));
        assert_eq!(counts.accuracy(), Rate::Value(1.0));
    }

    #[test]
    fn test_counts_partition_pixels() {
        let gt = ConcordMask::new(3, 2, 1, vec![255, 0, 255, 0, 255, 0]).unwrap();
        let pred = ConcordMask::new(3, 2, 1, vec![255, 255, 0, 0, 255, 255]).unwrap();

        let counts = confusion_counts(&gt, &pred).unwrap();
        assert_eq!(counts.pixels(), 6);
        assert_eq!(counts, ConfusionCounts { tp: 2, fn_: 1, fp: 2, tn: 1 });
    }

    #[test]
    fn test_derived_rates() {
        let counts = ConfusionCounts { tp: 6, fn_: 2, fp: 3, tn: 9 };

        assert_eq!(counts.sensitivity(), Rate::Value(0.75));
        assert_eq!(counts.specificity(), Rate::Value(0.75));
        assert_eq!(counts.ppv().to_string(), "0.66667");
        assert_eq!(counts.npv().to_string(), "0.81818");
        assert_eq!(counts.f1().to_string(), "0.70588");
        assert_eq!(counts.jaccard().to_string(), "0.54545");
        assert_eq!(counts.accuracy(), Rate::Value(0.75));
    }

    #[test]
    fn test_f1_zero_sum() {
        // Both sensitivity and precision are defined and zero
        let counts = ConfusionCounts { tp: 0, fn_: 3, fp: 2, tn: 5 };
        assert_eq!(counts.f1(), Rate::NotApplicable);
    }

    #[test]
    fn test_rows_order() {
        let zeros = ConcordMask::zeros(3, 2);
        let stats = TwoClassStats::new(&zeros, &zeros).unwrap();

        let keys: Vec<&str> = stats.rows().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "width", "height", "pixels", "tp", "fn", "fp", "tn", "sens", "spec", "ppv", "npv",
                "f1", "jaccard", "acc"
            ]
        );
        assert_eq!(stats.rows()[0].1, "3");
        assert_eq!(stats.rows()[1].1, "2");
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(matches!(
            confusion_counts(&ConcordMask::zeros(2, 3), &ConcordMask::zeros(3, 2)),
            Err(ConcordError::DimensionMismatch { .. })
        ));
    }
}
