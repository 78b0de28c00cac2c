// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use candle_core::{DType, Device, Result};
use candle_nn::{VarBuilder, VarMap};

use concord_data::data::Weights;

use crate::candle_error;
use crate::models::DinoVisionTransformer;

const DINO_PATCH_SIZE: usize = 14;
const DINO_IMAGE_SIZE: usize = 518;

/// Depth, embedding dimension and attention heads of a backbone
pub fn backbone_shape(weights: Weights) -> (usize, usize, usize) {
    match weights {
        Weights::DinoVitSmall => (12, 384, 6),
        Weights::DinoVitBase => (12, 768, 12),
    }
}

/// Build a backbone from variables named as in the pretrained checkpoint
pub fn build_backbone(weights: Weights, vb: VarBuilder) -> Result<DinoVisionTransformer> {
    let (depth, dim, heads) = backbone_shape(weights);
    DinoVisionTransformer::new(vb, depth, dim, heads, DINO_PATCH_SIZE, DINO_IMAGE_SIZE)
}

fn fetch_weights(weights: Weights, verbose: bool) -> Result<PathBuf> {
    weights.download(verbose).map_err(candle_error)?;
    Ok(weights.path())
}

/// Load a frozen pretrained backbone, downloading its weights if needed
pub fn load_backbone(
    weights: Weights,
    device: &Device,
    verbose: bool,
) -> Result<DinoVisionTransformer> {
    let path = fetch_weights(weights, verbose)?;

    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)? };
    build_backbone(weights, vb)
}

/// Load a pretrained backbone whose weights are held in a trainable `VarMap`
pub fn load_backbone_trainable(
    weights: Weights,
    device: &Device,
    verbose: bool,
) -> Result<(VarMap, DinoVisionTransformer)> {
    let path = fetch_weights(weights, verbose)?;

    let mut varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let model = build_backbone(weights, vb)?;
    varmap.load(path)?;

    Ok((varmap, model))
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_backbone_shape() {
        assert_eq!(backbone_shape(Weights::DinoVitSmall), (12, 384, 6));
        assert_eq!(backbone_shape(Weights::DinoVitBase), (12, 768, 12));
    }
}
