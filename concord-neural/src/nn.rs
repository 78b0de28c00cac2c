// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{D, DType, Device, Module, Result, Tensor};
use candle_nn::{VarBuilder, VarMap};
use serde::{Deserialize, Serialize};

use concord_data::data::Weights;

use crate::candle_error;
use crate::load::{build_backbone, load_backbone};
use crate::models::{ClassifierHead, DinoVisionTransformer};
use crate::preprocess::IMAGE_SIZE;

/// Architecture of a trained classifier, saved next to its weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub backbone: String,
    pub hidden_layers: Vec<usize>,
    pub classes: usize,
    pub trainable: bool,
    pub image_size: u32,
}

impl ClassifierConfig {
    pub fn new(backbone: Weights, hidden_layers: Vec<usize>, classes: usize, trainable: bool) -> Self {
        Self {
            backbone: backbone.model_name().to_string(),
            hidden_layers,
            classes,
            trainable,
            image_size: IMAGE_SIZE,
        }
    }

    /// Backbone weights named by the configuration
    pub fn weights(&self) -> Result<Weights> {
        Weights::select(&self.backbone).map_err(candle_error)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).map_err(candle_error)?;

        std::fs::write(path, contents)
            .map_err(|err| candle_error(format!("{}: {}", path.display(), err)))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path)
            .map_err(|err| candle_error(format!("{}: {}", path.display(), err)))?;

        serde_json::from_str(&contents)
            .map_err(|err| candle_error(format!("{}: {}", path.display(), err)))
    }
}

/// Path of the architecture file belonging to a model file (`MODEL.json`)
pub fn config_path<P: AsRef<Path>>(model: P) -> PathBuf {
    PathBuf::from(format!("{}.json", model.as_ref().display()))
}

/// Default path of the label file belonging to a model file (`MODEL.labels`)
pub fn labels_path<P: AsRef<Path>>(model: P) -> PathBuf {
    PathBuf::from(format!("{}.labels", model.as_ref().display()))
}

/// Parse comma-separated hidden layer widths such as `"128,64"`
///
/// An empty string means no hidden layers.
///
/// # Examples
///
/// ```
/// use concord_neural::nn::parse_hidden_layers;
///
/// assert_eq!(parse_hidden_layers("128, 64").unwrap(), vec![128, 64]);
/// assert!(parse_hidden_layers("").unwrap().is_empty());
/// assert!(parse_hidden_layers("0").is_err());
/// ```
pub fn parse_hidden_layers(layers: &str) -> Result<Vec<usize>> {
    layers
        .split(',')
        .map(str::trim)
        .filter(|width| !width.is_empty())
        .map(|width| match width.parse::<usize>() {
            Ok(w) if w > 0 => Ok(w),
            _ => Err(candle_error(format!(
                "Hidden layer width '{}' must be a positive integer.",
                width
            ))),
        })
        .collect()
}

/// Write head (and optionally backbone) variables to a safetensors file
///
/// Backbone variables are stored under the `backbone.` prefix.
pub fn save_weights<P: AsRef<Path>>(path: P, head: &VarMap, backbone: Option<&VarMap>) -> Result<()> {
    let mut tensors: HashMap<String, Tensor> = HashMap::new();

    {
        let data = head
            .data()
            .lock()
            .map_err(|_| candle_error("Head variables are poisoned."))?;

        for (name, var) in data.iter() {
            tensors.insert(name.clone(), var.as_tensor().clone());
        }
    }

    if let Some(backbone) = backbone {
        let data = backbone
            .data()
            .lock()
            .map_err(|_| candle_error("Backbone variables are poisoned."))?;

        for (name, var) in data.iter() {
            tensors.insert(format!("backbone.{}", name), var.as_tensor().clone());
        }
    }

    candle_core::safetensors::save(&tensors, path)
}

/// A vision transformer backbone followed by a dense classification head
#[derive(Debug, Clone)]
pub struct Classifier {
    backbone: DinoVisionTransformer,
    head: ClassifierHead,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(
        backbone: DinoVisionTransformer,
        head: ClassifierHead,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            backbone,
            head,
            config,
        }
    }

    /// Open a trained classifier from `MODEL` and `MODEL.json`
    ///
    /// A frozen backbone is read from the weights cache and downloaded if it
    /// is missing. A trainable backbone is read from `MODEL` itself.
    pub fn open<P: AsRef<Path>>(model: P, device: &Device, verbose: bool) -> Result<Self> {
        let model = model.as_ref();
        let config = ClassifierConfig::open(config_path(model))?;
        let weights = config.weights()?;

        if !model.is_file() {
            candle_core::bail!("Model file {} does not exist.", model.display());
        }

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[model], DType::F32, device)? };

        let backbone = if config.trainable {
            build_backbone(weights, vb.pp("backbone"))?
        } else {
            load_backbone(weights, device, verbose)?
        };

        let head = ClassifierHead::new(
            vb.pp("head"),
            backbone.embed_dim(),
            &config.hidden_layers,
            config.classes,
        )?;

        Ok(Self::new(backbone, head, config))
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Class probabilities for a `(batch, 3, 224, 224)` input
    pub fn probabilities(&self, xs: &Tensor) -> Result<Tensor> {
        candle_nn::ops::softmax(&self.forward(xs)?, D::Minus1)
    }
}

impl Module for Classifier {
    /// Class logits for a `(batch, 3, 224, 224)` input
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let embedding = self.backbone.forward(xs)?;

        let embedding = if self.config.trainable {
            embedding
        } else {
            embedding.detach()
        };

        self.head.forward(&embedding)
    }
}
