// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use candle_core::{D, DType, Device, Module, Result, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use concord_core::im::ConcordImage;
use concord_core::ut;
use concord_data::data::Weights;

use crate::augment::Augmenter;
use crate::candle_error;
use crate::dataset::{Dataset, load_images};
use crate::load::{load_backbone, load_backbone_trainable};
use crate::models::ClassifierHead;
use crate::nn::{Classifier, ClassifierConfig, config_path, save_weights};
use crate::preprocess::preprocess_batch;

/// Everything needed to train and save a classifier
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Directory with one sub-directory of images per class
    pub data: PathBuf,
    /// Output safetensors file
    pub model: PathBuf,
    /// Output label file
    pub labels: PathBuf,
    pub backbone: Weights,
    pub hidden_layers: Vec<usize>,
    pub validation_split: f64,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub patience: usize,
    pub trainable: bool,
    /// Augmentation codes, e.g. `FZRC`
    pub augmentation: String,
    pub seed: u64,
    pub verbose: bool,
}

/// Optimization settings shared by every training run
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub patience: usize,
    pub seed: u64,
    pub verbose: bool,
}

/// Outcome of a training run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    /// Epochs actually run before finishing or stopping early
    pub epochs: usize,
    /// Lowest mean training loss, whose weights are kept
    pub best_loss: f32,
    /// Validation accuracy of the kept weights, if a validation set exists
    pub validation_accuracy: Option<f32>,
}

/// Mean of `-w[y] * log_softmax(logits)[y]` over the batch
pub fn weighted_cross_entropy(
    logits: &Tensor,
    targets: &Tensor,
    class_weights: &Tensor,
) -> Result<Tensor> {
    let log_probs = candle_nn::ops::log_softmax(logits, D::Minus1)?;
    let picked = log_probs.gather(&targets.unsqueeze(1)?, 1)?.squeeze(1)?;
    let weights = class_weights.index_select(targets, 0)?;

    (picked * weights)?.neg()?.mean_all()
}

/// Fraction of images whose most probable class matches the label
pub fn accuracy(
    classifier: &Classifier,
    images: &[ConcordImage],
    labels: &[usize],
    batch_size: usize,
    device: &Device,
) -> Result<f32> {
    if images.is_empty() {
        return Ok(0.0);
    }

    let mut correct = 0usize;

    for (batch, targets) in images.chunks(batch_size).zip(labels.chunks(batch_size)) {
        let xs = preprocess_batch(batch, device)?;
        let predicted = classifier.forward(&xs)?.argmax(D::Minus1)?.to_vec1::<u32>()?;

        correct += predicted
            .iter()
            .zip(targets.iter())
            .filter(|(p, t)| **p as usize == **t)
            .count();
    }

    Ok(correct as f32 / images.len() as f32)
}

/// Optimize `vars` with AdamW on a weighted cross-entropy loss
///
/// Training stops early once the mean epoch loss has not improved for
/// `patience` epochs. The variables are restored to the epoch with the lowest
/// loss before returning.
///
/// # Arguments
///
/// * `classifier` - Model whose trainable variables are `vars`
/// * `vars` - Variables updated by the optimizer
/// * `train` - Prepared training images and their labels
/// * `validation` - Prepared validation images and their labels
/// * `class_weights` - Loss weight for each class
/// * `augmenter` - Random augmentation applied to training batches
/// * `options` - Optimization settings
/// * `device` - Device holding the model
#[allow(clippy::too_many_arguments)]
pub fn fit(
    classifier: &Classifier,
    vars: Vec<Var>,
    train: (&[ConcordImage], &[usize]),
    validation: (&[ConcordImage], &[usize]),
    class_weights: &[f32],
    augmenter: &mut Augmenter,
    options: &FitOptions,
    device: &Device,
) -> Result<FitSummary> {
    let (images, labels) = train;

    if images.is_empty() || images.len() != labels.len() {
        candle_core::bail!("Training requires one label per image and at least one image.");
    }

    if options.batch_size == 0 {
        candle_core::bail!("Batch size must be positive.");
    }

    let params = ParamsAdamW {
        lr: options.learning_rate,
        ..Default::default()
    };

    let mut optimizer = AdamW::new(vars.clone(), params)?;
    let class_weights = Tensor::new(class_weights, device)?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut order: Vec<usize> = (0..images.len()).collect();

    let mut best = snapshot(&vars)?;
    let mut best_loss = f32::INFINITY;
    let mut wait = 0;
    let mut epochs = 0;

    for epoch in 0..options.epochs {
        epochs += 1;
        order.shuffle(&mut rng);

        let mut total = 0f32;

        for batch in order.chunks(options.batch_size) {
            let batch_images = batch
                .iter()
                .map(|&i| {
                    if augmenter.is_empty() {
                        Ok(images[i].clone())
                    } else {
                        augmenter.apply(&images[i]).map_err(candle_error)
                    }
                })
                .collect::<Result<Vec<ConcordImage>>>()?;

            let targets: Vec<u32> = batch.iter().map(|&i| labels[i] as u32).collect();

            let xs = preprocess_batch(&batch_images, device)?;
            let targets = Tensor::new(targets.as_slice(), device)?;

            let loss = weighted_cross_entropy(&classifier.forward(&xs)?, &targets, &class_weights)?;
            optimizer.backward_step(&loss)?;

            total += loss.to_scalar::<f32>()? * batch.len() as f32;
        }

        let loss = total / images.len() as f32;

        let mut message = format!("Epoch {}/{} | loss {:.4}", epoch + 1, options.epochs, loss);

        if !validation.0.is_empty() {
            let acc = accuracy(classifier, validation.0, validation.1, options.batch_size, device)?;
            message.push_str(&format!(" | val_acc {:.4}", acc));
        }

        ut::track::progress_log(&message, options.verbose);

        if loss < best_loss {
            best_loss = loss;
            best = snapshot(&vars)?;
            wait = 0;
        } else {
            wait += 1;

            if wait >= options.patience {
                ut::track::progress_log(
                    &format!("Stopping early after {} epochs", epoch + 1),
                    options.verbose,
                );
                break;
            }
        }
    }

    for (var, tensor) in vars.iter().zip(best.iter()) {
        var.set(tensor)?;
    }

    let validation_accuracy = if validation.0.is_empty() {
        None
    } else {
        Some(accuracy(classifier, validation.0, validation.1, options.batch_size, device)?)
    };

    Ok(FitSummary {
        epochs,
        best_loss,
        validation_accuracy,
    })
}

fn snapshot(vars: &[Var]) -> Result<Vec<Tensor>> {
    vars.iter().map(|var| var.as_tensor().copy()).collect()
}

/// Train a classifier on a class-per-directory dataset and save it
///
/// Writes the weights to `options.model`, the architecture to `MODEL.json`
/// and the class names to `options.labels`.
pub fn train(options: &TrainOptions, device: &Device) -> Result<FitSummary> {
    let mut augmenter = Augmenter::parse(&options.augmentation, options.seed).map_err(candle_error)?;

    let dataset = Dataset::from_directory(&options.data, options.validation_split, options.seed)?;
    let classes = dataset.labels.len();

    ut::track::progress_log(
        &format!(
            "Found {} classes ({}) | {} training and {} validation images",
            classes,
            dataset.labels.names().join(", "),
            ut::track::thousands_format(dataset.train.len()),
            ut::track::thousands_format(dataset.validation.len()),
        ),
        options.verbose,
    );

    let train_images = load_images(&dataset.train, "Loading training images", options.verbose)?;
    let validation_images =
        load_images(&dataset.validation, "Loading validation images", options.verbose)?;

    let train_labels: Vec<usize> = dataset.train.iter().map(|s| s.label).collect();
    let validation_labels: Vec<usize> = dataset.validation.iter().map(|s| s.label).collect();

    let (backbone_vars, backbone) = if options.trainable {
        let (varmap, backbone) = load_backbone_trainable(options.backbone, device, options.verbose)?;
        (Some(varmap), backbone)
    } else {
        (None, load_backbone(options.backbone, device, options.verbose)?)
    };

    let head_vars = VarMap::new();
    let vb = VarBuilder::from_varmap(&head_vars, DType::F32, device);
    let head = ClassifierHead::new(
        vb.pp("head"),
        backbone.embed_dim(),
        &options.hidden_layers,
        classes,
    )?;

    let config = ClassifierConfig::new(
        options.backbone,
        options.hidden_layers.clone(),
        classes,
        options.trainable,
    );

    let classifier = Classifier::new(backbone, head, config.clone());

    let mut vars = head_vars.all_vars();
    if let Some(backbone_vars) = backbone_vars.as_ref() {
        vars.extend(backbone_vars.all_vars());
    }

    let fit_options = FitOptions {
        learning_rate: options.learning_rate,
        batch_size: options.batch_size,
        epochs: options.epochs,
        patience: options.patience,
        seed: options.seed,
        verbose: options.verbose,
    };

    let summary = fit(
        &classifier,
        vars,
        (train_images.as_slice(), train_labels.as_slice()),
        (validation_images.as_slice(), validation_labels.as_slice()),
        &dataset.class_weights(),
        &mut augmenter,
        &fit_options,
        device,
    )?;

    save_weights(&options.model, &head_vars, backbone_vars.as_ref())?;
    config.save(config_path(&options.model))?;
    dataset.labels.save(&options.labels)?;

    ut::track::progress_log(
        &format!("Saved model to {}", options.model.display()),
        options.verbose,
    );

    Ok(summary)
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::models::DinoVisionTransformer;
    use concord_core::im::ConcordBuffer;

    #[test]
    fn test_weighted_cross_entropy() {
        let device = Device::Cpu;
        let logits = Tensor::new(&[[0f32, 0.], [0., 0.]], &device).unwrap();
        let targets = Tensor::new(&[0u32, 1], &device).unwrap();

        let weights = Tensor::new(&[1f32, 1.], &device).unwrap();
        let loss = weighted_cross_entropy(&logits, &targets, &weights)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        assert!((loss - 2f32.ln()).abs() < 1e-5);

        let weights = Tensor::new(&[2f32, 0.], &device).unwrap();
        let loss = weighted_cross_entropy(&logits, &targets, &weights)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        assert!((loss - 2f32.ln()).abs() < 1e-5);
    }

    fn tiny_classifier(varmap: &VarMap) -> Classifier {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
        let backbone = DinoVisionTransformer::new(vb.pp("backbone"), 1, 8, 2, 14, 28).unwrap();
        let head = ClassifierHead::new(vb.pp("head"), 8, &[], 2).unwrap();
        let config = ClassifierConfig::new(Weights::DinoVitSmall, vec![], 2, true);

        Classifier::new(backbone, head, config)
    }

    fn solid(value: u8) -> ConcordImage {
        ConcordImage::U8(ConcordBuffer::filled(224, 224, 3, value))
    }

    #[test]
    fn test_fit_runs_and_restores_best() {
        let varmap = VarMap::new();
        let classifier = tiny_classifier(&varmap);

        let images = vec![solid(0), solid(255), solid(10), solid(245)];
        let labels = vec![0, 1, 0, 1];

        let options = FitOptions {
            learning_rate: 0.01,
            batch_size: 2,
            epochs: 3,
            patience: 1,
            seed: 0,
            verbose: false,
        };

        let mut augmenter = Augmenter::parse("F", 0).unwrap();

        let summary = fit(
            &classifier,
            varmap.all_vars(),
            (images.as_slice(), labels.as_slice()),
            (&images[..2], &labels[..2]),
            &[1.0, 1.0],
            &mut augmenter,
            &options,
            &Device::Cpu,
        )
        .unwrap();

        assert!(summary.epochs >= 2 && summary.epochs <= 3);
        assert!(summary.best_loss.is_finite());

        let acc = summary.validation_accuracy.unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn test_fit_rejects_empty() {
        let varmap = VarMap::new();
        let classifier = tiny_classifier(&varmap);

        let options = FitOptions {
            learning_rate: 0.01,
            batch_size: 2,
            epochs: 1,
            patience: 1,
            seed: 0,
            verbose: false,
        };

        let images: Vec<ConcordImage> = vec![];
        let labels: Vec<usize> = vec![];

        let result = fit(
            &classifier,
            varmap.all_vars(),
            (images.as_slice(), labels.as_slice()),
            (images.as_slice(), labels.as_slice()),
            &[1.0, 1.0],
            &mut Augmenter::parse("", 0).unwrap(),
            &options,
            &Device::Cpu,
        );

        assert!(result.is_err());
    }
}
