// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use candle_core::{DType, Device, Result, Tensor};

use concord_core::error::ConcordError;
use concord_core::im::ConcordImage;

use crate::candle_error;

/// Edge length of the square classifier input
pub const IMAGE_SIZE: u32 = 224;

const IMAGENET_MEAN: [f32; 3] = [0.485f32, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229f32, 0.224, 0.225];

/// Convert a ConcordImage to a 3-channel "RGB" tensor
///
/// Any 1-channel image is simply repeated three times to generate
/// a 3-channel image.
fn to_tensor_rgb(image: &ConcordImage, device: &Device) -> Result<Tensor> {
    let w = image.width() as usize;
    let h = image.height() as usize;
    let c = image.channels() as usize;

    let tensor = Tensor::from_vec(image.to_f32(), (h, w, c), device)?.permute((2, 0, 1))?;

    if c == 3 {
        return Ok(tensor);
    }

    if c == 1 {
        return Tensor::cat(&[&tensor; 3], 0);
    }

    let averaged = tensor.mean_keepdim(0)?;

    Tensor::cat(&[&averaged; 3], 0)
}

/// Reduce an image to the 8-bit RGB input size shared by training and inference
pub fn prepare_image(image: &ConcordImage) -> std::result::Result<ConcordImage, ConcordError> {
    image.to_rgb8()?.resize(IMAGE_SIZE, IMAGE_SIZE)
}

/// Perform imagenet standardization on an input ConcordImage
pub fn preprocess_imagenet(image: &ConcordImage, device: &Device) -> Result<Tensor> {
    let prepared = matches!(image, ConcordImage::U8(_))
        && image.width() == IMAGE_SIZE
        && image.height() == IMAGE_SIZE;

    let tensor = if prepared {
        to_tensor_rgb(image, device)?
    } else {
        to_tensor_rgb(&prepare_image(image).map_err(candle_error)?, device)?
    };

    let mean = Tensor::new(&IMAGENET_MEAN, device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGENET_STD, device)?.reshape((3, 1, 1))?;

    (tensor.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)
}

/// Standardize and stack images into a `(batch, 3, 224, 224)` tensor
pub fn preprocess_batch(images: &[ConcordImage], device: &Device) -> Result<Tensor> {
    let tensors = images
        .iter()
        .map(|image| preprocess_imagenet(image, device))
        .collect::<Result<Vec<Tensor>>>()?;

    Tensor::stack(&tensors, 0)
}
