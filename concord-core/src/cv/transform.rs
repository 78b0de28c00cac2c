// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use fast_image_resize;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, images::Image};
use image::{DynamicImage, GenericImage, ImageBuffer, Luma, Pixel};

use crate::error::ConcordError;
use crate::im::ConcordMask;

/// Resize a 2D image-rs ImageBuffer
///
/// # Arguments
///
/// * `image` - A u8 or u16 Luma or RGB ImageBuffer
/// * `new_width` - New width following resizing
/// * `new_height` - New height following resizing
pub fn resize_bilinear_default<I, P>(
    image: &I,
    new_width: u32,
    new_height: u32,
) -> ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>
where
    I: GenericImage<Pixel = P>,
    P: Pixel + 'static,
{
    image::imageops::resize(
        image,
        new_width,
        new_height,
        image::imageops::FilterType::Triangle,
    )
}

/// Resize a 2D u8 image using the SIMD-accelerated fast-image-resize crate
///
/// # Arguments
///
/// * `source` - A DynamicImage with u8 subpixel type
/// * `new_width` - New width following resizing
/// * `new_height` - New height following resizing
/// * `pixel_type` - RGB or Luma pixel type
pub fn resize_bilinear_fast(
    source: &DynamicImage,
    new_width: u32,
    new_height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>, ConcordError> {
    resize_fast(source, new_width, new_height, pixel_type, FilterType::Bilinear)
}

/// Downsample a mask by averaging the pixels that fall into each output pixel
///
/// The result holds averaged intensities and is not re-binarized.
///
/// # Arguments
///
/// * `mask` - Binary mask
/// * `new_width` - New width following resizing
/// * `new_height` - New height following resizing
pub fn resize_area_fast(
    mask: &ConcordMask,
    new_width: u32,
    new_height: u32,
) -> Result<ConcordMask, ConcordError> {
    let source = ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(
        mask.width(),
        mask.height(),
        mask.as_raw().to_vec(),
    )
    .ok_or(ConcordError::BufferSizeError)?;

    let data = resize_fast(
        &DynamicImage::ImageLuma8(source),
        new_width,
        new_height,
        PixelType::U8,
        FilterType::Box,
    )?;

    ConcordMask::new(new_width, new_height, 1, data)
}

fn resize_fast(
    source: &DynamicImage,
    new_width: u32,
    new_height: u32,
    pixel_type: PixelType,
    filter: FilterType,
) -> Result<Vec<u8>, ConcordError> {
    let mut destination = Image::new(new_width, new_height, pixel_type);

    let mut resizer = fast_image_resize::Resizer::new();
    let option = fast_image_resize::ResizeOptions {
        algorithm: ResizeAlg::Convolution(filter),
        cropping: fast_image_resize::SrcCropping::None,
        mul_div_alpha: false,
    };

    resizer
        .resize(source, &mut destination, &option)
        .map_err(|err| ConcordError::OtherError(format!("Failed to resize image: {}", err)))?;

    Ok(destination.into_vec())
}
