// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::collections::BTreeMap;

use crate::error::ConcordError;
use crate::mp::Rate;

/// Cohen's kappa between two raters labelling the same subjects
///
/// The label set is the union of the labels either rater used. Identical
/// label sequences score exactly 1, including the degenerate case where
/// only a single label is present.
///
/// # Arguments
///
/// * `a` - Labels from the first rater
/// * `b` - Labels from the second rater, one per subject of `a`
///
/// # Examples
///
/// ```
/// use concord_core::mp::{cohen_kappa, Rate};
///
/// let a = [0, 0, 1, 1];
/// let b = [0, 1, 1, 1];
///
/// assert_eq!(cohen_kappa(&a, &a).unwrap(), Rate::Value(1.0));
/// assert_eq!(cohen_kappa(&a, &b).unwrap(), Rate::Value(0.5));
/// ```
pub fn cohen_kappa<T: Ord + Copy>(a: &[T], b: &[T]) -> Result<Rate, ConcordError> {
    if a.len() != b.len() {
        return Err(ConcordError::KappaError(
            "Both raters must label the same number of subjects.",
        ));
    }

    let n = a.len();
    if n == 0 {
        return Ok(Rate::NotApplicable);
    }

    let mut marginals: BTreeMap<T, (u64, u64)> = BTreeMap::new();
    let mut agreements = 0usize;

    for (&x, &y) in a.iter().zip(b) {
        marginals.entry(x).or_default().0 += 1;
        marginals.entry(y).or_default().1 += 1;

        if x == y {
            agreements += 1;
        }
    }

    if agreements == n {
        return Ok(Rate::Value(1.0));
    }

    let n = n as f64;
    let observed = agreements as f64 / n;
    let expected: f64 = marginals
        .values()
        .map(|&(ca, cb)| (ca as f64 / n) * (cb as f64 / n))
        .sum();

    Ok(Rate::Value((observed - expected) / (1.0 - expected)))
}

/// Count, for every subject, how many raters chose each category
///
/// Returns the subject-by-category count table together with the sorted
/// categories that label its columns.
///
/// # Arguments
///
/// * `ratings` - One label sequence per rater, all of equal length
pub fn aggregate_raters<T: Ord + Copy>(
    ratings: &[&[T]],
) -> Result<(Vec<Vec<u64>>, Vec<T>), ConcordError> {
    let subjects = ratings.first().map_or(0, |r| r.len());

    if ratings.iter().any(|r| r.len() != subjects) {
        return Err(ConcordError::KappaError(
            "All raters must label the same number of subjects.",
        ));
    }

    let mut columns: BTreeMap<T, usize> = BTreeMap::new();
    for label in ratings.iter().flat_map(|r| r.iter()) {
        columns.entry(*label).or_insert(0);
    }
    for (i, column) in columns.values_mut().enumerate() {
        *column = i;
    }

    let mut table = vec![vec![0u64; columns.len()]; subjects];
    for rater in ratings {
        for (subject, label) in rater.iter().enumerate() {
            table[subject][columns[label]] += 1;
        }
    }

    Ok((table, columns.into_keys().collect()))
}

/// Fleiss' kappa for a fixed number of raters labelling the same subjects
///
/// # Arguments
///
/// * `ratings` - One label sequence per rater (at least two), all of equal length
///
/// # Examples
///
/// ```
/// use concord_core::mp::{fleiss_kappa, Rate};
///
/// let a = [0, 1, 1, 0];
/// assert_eq!(fleiss_kappa(&[&a[..], &a[..], &a[..]]).unwrap(), Rate::Value(1.0));
/// ```
pub fn fleiss_kappa<T: Ord + Copy>(ratings: &[&[T]]) -> Result<Rate, ConcordError> {
    if ratings.len() < 2 {
        return Err(ConcordError::KappaError(
            "Fleiss' kappa requires at least two raters.",
        ));
    }

    let (table, _) = aggregate_raters(ratings)?;

    if table.is_empty() {
        return Ok(Rate::NotApplicable);
    }

    let raters = ratings.len() as f64;
    let subjects = table.len() as f64;
    let total = raters * subjects;

    let categories = table[0].len();
    let mut category_totals = vec![0u64; categories];
    let mut agreement_sum = 0.0;

    for row in &table {
        let squares: u64 = row.iter().map(|&c| c * c).sum();
        agreement_sum += (squares as f64 - raters) / (raters * (raters - 1.0));

        for (total, &count) in category_totals.iter_mut().zip(row) {
            *total += count;
        }
    }

    let observed = agreement_sum / subjects;

    if table.iter().all(|row| row.iter().any(|&c| c as f64 == raters)) {
        return Ok(Rate::Value(1.0));
    }

    let expected: f64 = category_totals
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum();

    Ok(Rate::Value((observed - expected) / (1.0 - expected)))
}
