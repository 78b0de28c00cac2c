// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use candle_core::{Device, Result};
use kdam::BarExt;

use concord_core::im::ConcordImage;
use concord_core::ut;

use crate::candle_error;
use crate::nn::Classifier;
use crate::preprocess::preprocess_batch;

/// Number of images scored per forward pass
pub const PREDICT_BATCH_SIZE: usize = 8;

const INDEX_PREFIX: &str = "index:";

/// Expand prediction inputs into image paths
///
/// An input of the form `index:FILE` is replaced by the paths listed in
/// `FILE`, one per line. Every other input is taken as an image path.
pub fn resolve_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(inputs.len());

    for input in inputs.iter() {
        match input.strip_prefix(INDEX_PREFIX) {
            Some(index) => {
                paths.extend(ut::path::read_path_list(index).map_err(candle_error)?);
            }
            None => paths.push(PathBuf::from(input)),
        }
    }

    Ok(paths)
}

/// Class probabilities for each image, in input order
///
/// # Arguments
///
/// * `classifier` - A trained classifier
/// * `paths` - Images to score
/// * `device` - Device holding the classifier
/// * `verbose` - Show a progress bar
pub fn predict<P: AsRef<Path>>(
    classifier: &Classifier,
    paths: &[P],
    device: &Device,
    verbose: bool,
) -> Result<Vec<Vec<f32>>> {
    let mut pb = ut::track::progress_bar(paths.len(), "Predicting", verbose);
    let mut probabilities = Vec::with_capacity(paths.len());

    for batch in paths.chunks(PREDICT_BATCH_SIZE) {
        let images = batch
            .iter()
            .map(|path| ConcordImage::open(path).map_err(candle_error))
            .collect::<Result<Vec<ConcordImage>>>()?;

        probabilities.extend(predict_images(classifier, &images, device)?);
        pb.update(batch.len()).map_err(candle_error)?;
    }

    Ok(probabilities)
}

/// Class probabilities for already opened images
pub fn predict_images(
    classifier: &Classifier,
    images: &[ConcordImage],
    device: &Device,
) -> Result<Vec<Vec<f32>>> {
    if images.is_empty() {
        return Ok(Vec::new());
    }

    let xs = preprocess_batch(images, device)?;
    classifier.probabilities(&xs)?.to_vec2::<f32>()
}

/// Tab-separated probability row
pub fn format_row(probabilities: &[f32]) -> String {
    probabilities
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<String>>()
        .join("\t")
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::models::{ClassifierHead, DinoVisionTransformer};
    use crate::nn::ClassifierConfig;
    use candle_core::DType;
    use candle_nn::{VarBuilder, VarMap};
    use concord_core::im::ConcordBuffer;
    use concord_data::data::Weights;

    #[test]
    fn test_resolve_inputs_expands_index() {
        const TEST_INDEX: &str = "TEST_PREDICT_INDEX.txt";
        std::fs::write(TEST_INDEX, "a.png\n\n b.png \n").unwrap();

        let inputs = vec![
            "first.png".to_string(),
            format!("index:{}", TEST_INDEX),
            "last.png".to_string(),
        ];

        let paths = resolve_inputs(&inputs).unwrap();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("first.png"),
                PathBuf::from("a.png"),
                PathBuf::from("b.png"),
                PathBuf::from("last.png"),
            ]
        );

        std::fs::remove_file(TEST_INDEX).unwrap();
    }

    #[test]
    fn test_resolve_inputs_missing_index() {
        assert!(resolve_inputs(&["index:TEST_PREDICT_MISSING.txt".to_string()]).is_err());
    }

    #[test]
    fn test_format_row() {
        assert_eq!(format_row(&[0.25, 0.75]), "0.25\t0.75");
        assert_eq!(format_row(&[]), "");
    }

    #[test]
    fn test_predict_images_rows() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let backbone = DinoVisionTransformer::new(vb.pp("backbone"), 1, 8, 2, 14, 28).unwrap();
        let head = ClassifierHead::new(vb.pp("head"), 8, &[], 3).unwrap();
        let config = ClassifierConfig::new(Weights::DinoVitSmall, vec![], 3, false);
        let classifier = Classifier::new(backbone, head, config);

        let images: Vec<ConcordImage> = (0..3)
            .map(|i| ConcordImage::U8(ConcordBuffer::filled(40, 30, 1, i * 100)))
            .collect();

        let rows = predict_images(&classifier, &images, &Device::Cpu).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.len() == 3));
        assert!(predict_images(&classifier, &[], &Device::Cpu).unwrap().is_empty());
    }
}
