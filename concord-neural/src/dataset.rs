// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use candle_core::Result;
use kdam::TqdmParallelIterator;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use concord_core::constant::SUPPORTED_IMAGE_FORMATS;
use concord_core::im::ConcordImage;
use concord_core::ut;

use crate::candle_error;
use crate::preprocess::prepare_image;

/// Ordered class names of a classifier
///
/// Class indices follow the sorted order of the training sub-directories and
/// are persisted one name per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Class names from the sorted sub-directories of a training root
    pub fn from_directory<P: AsRef<Path>>(root: P) -> Result<Self> {
        let names = ut::path::collect_subdirectories(root).map_err(candle_error)?;
        Ok(Self { names })
    }

    /// Read a label file, one class name per line
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path)
            .map_err(|err| candle_error(format!("{}: {}", path.display(), err)))?;

        let names = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect();

        Ok(Self { names })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut contents = self.names.join("\n");
        contents.push('\n');

        std::fs::write(path, contents)
            .map_err(|err| candle_error(format!("{}: {}", path.display(), err)))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A labelled training image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: usize,
}

/// Training and validation samples drawn from a class-per-directory layout
#[derive(Debug, Clone)]
pub struct Dataset {
    pub labels: LabelSet,
    pub train: Vec<Sample>,
    pub validation: Vec<Sample>,
}

impl Dataset {
    /// Collect samples from `root/<class>/<image>` and hold out a validation set
    ///
    /// Samples are shuffled with `seed` before the last `split` fraction is
    /// held out for validation.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory containing one sub-directory per class
    /// * `split` - Fraction of samples held out, in `[0, 1)`
    /// * `seed` - Shuffle seed
    pub fn from_directory<P: AsRef<Path>>(root: P, split: f64, seed: u64) -> Result<Self> {
        let root = root.as_ref();

        if !(0.0..1.0).contains(&split) {
            candle_core::bail!("Validation split must be in [0, 1) but found {}.", split);
        }

        let labels = LabelSet::from_directory(root)?;

        if labels.is_empty() {
            candle_core::bail!("No class sub-directories found in {}.", root.display());
        }

        let mut samples = Vec::new();

        for (label, name) in labels.names().iter().enumerate() {
            let files = ut::path::collect_file_paths(root.join(name), &SUPPORTED_IMAGE_FORMATS)
                .map_err(candle_error)?;

            samples.extend(files.into_iter().map(|path| Sample { path, label }));
        }

        if samples.is_empty() {
            candle_core::bail!("No training images found in {}.", root.display());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        samples.shuffle(&mut rng);

        let n_validation = (samples.len() as f64 * split).floor() as usize;
        let validation = samples.split_off(samples.len() - n_validation);

        if samples.is_empty() {
            candle_core::bail!("Validation split leaves no training images.");
        }

        Ok(Self {
            labels,
            train: samples,
            validation,
        })
    }

    /// Balanced class weights `n / (k * count)` over the training samples
    ///
    /// Classes without training samples receive a weight of zero.
    pub fn class_weights(&self) -> Vec<f32> {
        class_weights(&self.train, self.labels.len())
    }
}

pub(crate) fn class_weights(samples: &[Sample], classes: usize) -> Vec<f32> {
    let mut counts = vec![0usize; classes];

    for sample in samples.iter() {
        counts[sample.label] += 1;
    }

    let n = samples.len() as f32;
    let k = classes as f32;

    counts
        .into_iter()
        .map(|count| {
            if count == 0 {
                0.0
            } else {
                n / (k * count as f32)
            }
        })
        .collect()
}

/// Read and prepare the images of each sample, preserving order
pub fn load_images(samples: &[Sample], desc: &str, verbose: bool) -> Result<Vec<ConcordImage>> {
    let pb = ut::track::progress_bar(samples.len(), desc, verbose);

    samples
        .par_iter()
        .tqdm_with_bar(pb)
        .map(|sample| {
            let image = ConcordImage::open(&sample.path).map_err(candle_error)?;
            prepare_image(&image).map_err(candle_error)
        })
        .collect()
}
