// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use anyhow::{Result, anyhow, bail};

use crate::get_concord_cache;
use crate::request;

/// Pretrained backbones available to the tile classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weights {
    DinoVitSmall,
    DinoVitBase,
}

impl Weights {
    /// Select weights by name
    pub fn select(weights_name: &str) -> Result<Self> {
        Weights::iter()
            .find(|w| w.model_name() == weights_name)
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "[concord::data::weights] Weights {} not found. Available weights include: {}.",
                    weights_name,
                    Weights::iter()
                        .map(|w| w.model_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }

    /// Return an iterator over the enum members.
    pub fn iter() -> impl Iterator<Item = &'static Weights> {
        static WEIGHTS: [Weights; 2] = [Weights::DinoVitSmall, Weights::DinoVitBase];

        WEIGHTS.iter()
    }

    /// Get the name of the model.
    pub fn model_name(&self) -> &'static str {
        match self {
            Weights::DinoVitSmall => "dino_vit_small",
            Weights::DinoVitBase => "dino_vit_base",
        }
    }

    /// Get the file name of the model saved on Google drive.
    fn file_name(&self) -> &'static str {
        match self {
            Weights::DinoVitSmall => "dinov2_vits14_imagenet.safetensors",
            Weights::DinoVitBase => "dinov2_vitb14_imagenet.safetensors",
        }
    }

    /// Get the Google drive file identifier for the saved model.
    pub fn file_id(&self) -> &'static str {
        match self {
            Weights::DinoVitSmall => "1xuyTyPsuPiDtec8ojZwAyXSDq9AzyPQX",
            Weights::DinoVitBase => "19vy-A-KTaaF3vsWKxu0JpA0gaATU52Gh",
        }
    }

    /// Get the usage license for a model.
    pub fn license(&self) -> &'static str {
        "Apache License 2.0"
    }

    /// Get the authors of the model weights.
    pub fn data_authors(&self) -> &'static str {
        "Huggingface/candle"
    }

    /// Get the size of the model in GB.
    pub fn data_size(&self) -> &'static str {
        match self {
            Weights::DinoVitSmall => "0.097",
            Weights::DinoVitBase => "0.330",
        }
    }

    /// Download the model to the concord cache unless it is already present.
    pub fn download(&self, verbose: bool) -> Result<()> {
        let cache = get_concord_cache();
        let path = self.path();

        if path.exists() {
            return Ok(());
        }

        request::download_file(self.file_id(), cache.as_path(), self.file_name(), !verbose)?;

        if !path.exists() {
            bail!(
                "[concord::data::weights] Failed to download {} weights.",
                self.model_name()
            );
        }

        Ok(())
    }

    /// Get path to model weights.
    pub fn path(&self) -> std::path::PathBuf {
        get_concord_cache().join(self.file_name())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(Weights::select("dino_vit_small").unwrap(), Weights::DinoVitSmall);
        assert_eq!(Weights::select("dino_vit_base").unwrap(), Weights::DinoVitBase);

        let err = Weights::select("resnet").unwrap_err().to_string();
        assert!(err.contains("dino_vit_small, dino_vit_base"));
    }

    #[test]
    fn test_names_round_trip() {
        for weights in Weights::iter() {
            assert_eq!(&Weights::select(weights.model_name()).unwrap(), weights);
            assert!(weights.path().ends_with(weights.file_name()));
        }
    }
}
