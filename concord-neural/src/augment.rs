// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use concord_core::error::ConcordError;
use concord_core::im::{ConcordBuffer, ConcordImage};

const ZOOM_FACTOR: f32 = 0.1;
const TRANSLATE_FACTOR: f32 = 0.1;
const CONTRAST_FACTOR: f32 = 0.1;

/// A random training-time image transform, selected by a one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    /// `F`: independent horizontal and vertical flips
    Flip,
    /// `Z`: zoom in or out by up to 10%, filling with black
    Zoom,
    /// `T`: shift by up to 10% of each axis, filling with black
    Translate,
    /// `R`: rotate by any angle, reflecting at the border
    Rotate,
    /// `C`: scale each channel's contrast by up to 10%
    Contrast,
}

impl Augmentation {
    pub fn from_code(code: char) -> Option<Augmentation> {
        match code.to_ascii_uppercase() {
            'F' => Some(Augmentation::Flip),
            'Z' => Some(Augmentation::Zoom),
            'T' => Some(Augmentation::Translate),
            'R' => Some(Augmentation::Rotate),
            'C' => Some(Augmentation::Contrast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    Constant,
    Reflect,
}

// Row-major 2x3 matrix mapping centred output coordinates to centred input
// coordinates.
type Affine = [[f32; 3]; 2];

/// A seeded pipeline of random augmentations applied in a fixed order
///
/// Geometric transforms (zoom, translation, rotation) run first, then
/// contrast, then flips.
///
/// # Examples
///
/// ```
/// use concord_neural::augment::Augmenter;
///
/// assert_eq!(Augmenter::parse("FZRC", 0).unwrap().len(), 4);
/// assert!(Augmenter::parse("FX", 0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Augmenter {
    augmentations: Vec<Augmentation>,
    rng: StdRng,
}

impl Augmenter {
    /// Parse an augmentation code string such as `FZRC`
    ///
    /// Codes are case-insensitive and repeated codes are applied once.
    pub fn parse(codes: &str, seed: u64) -> Result<Augmenter, ConcordError> {
        let mut selected = Vec::new();

        for code in codes.chars() {
            let augmentation = Augmentation::from_code(code).ok_or_else(|| {
                ConcordError::OtherError(format!(
                    "Unknown augmentation '{}'. Valid codes are F, Z, T, R and C.",
                    code
                ))
            })?;

            if !selected.contains(&augmentation) {
                selected.push(augmentation);
            }
        }

        let order = [
            Augmentation::Zoom,
            Augmentation::Translate,
            Augmentation::Rotate,
            Augmentation::Contrast,
            Augmentation::Flip,
        ];

        let augmentations = order
            .into_iter()
            .filter(|a| selected.contains(a))
            .collect();

        Ok(Augmenter {
            augmentations,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn len(&self) -> usize {
        self.augmentations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.augmentations.is_empty()
    }

    /// Apply every selected augmentation to an 8-bit image
    pub fn apply(&mut self, image: &ConcordImage) -> Result<ConcordImage, ConcordError> {
        let ConcordImage::U8(buffer) = image else {
            return Err(ConcordError::ImageError(
                "Augmentation requires an 8-bit image.",
            ));
        };

        let mut buffer = buffer.clone();

        for i in 0..self.augmentations.len() {
            buffer = match self.augmentations[i] {
                Augmentation::Zoom => {
                    let scale = 1.0 + self.rng.gen_range(-ZOOM_FACTOR..=ZOOM_FACTOR);
                    warp(&buffer, [[scale, 0.0, 0.0], [0.0, scale, 0.0]], Fill::Constant)?
                }
                Augmentation::Translate => {
                    let dx = self.rng.gen_range(-TRANSLATE_FACTOR..=TRANSLATE_FACTOR)
                        * buffer.width() as f32;
                    let dy = self.rng.gen_range(-TRANSLATE_FACTOR..=TRANSLATE_FACTOR)
                        * buffer.height() as f32;
                    warp(&buffer, [[1.0, 0.0, -dx], [0.0, 1.0, -dy]], Fill::Constant)?
                }
                Augmentation::Rotate => {
                    let theta = self.rng.gen_range(-PI..PI);
                    let (sin, cos) = theta.sin_cos();
                    warp(&buffer, [[cos, sin, 0.0], [-sin, cos, 0.0]], Fill::Reflect)?
                }
                Augmentation::Contrast => {
                    let factor = 1.0 + self.rng.gen_range(-CONTRAST_FACTOR..=CONTRAST_FACTOR);
                    contrast(&buffer, factor)?
                }
                Augmentation::Flip => {
                    let horizontal = self.rng.gen_bool(0.5);
                    let vertical = self.rng.gen_bool(0.5);
                    flip(&buffer, horizontal, vertical)?
                }
            };
        }

        Ok(ConcordImage::U8(buffer))
    }
}

// Mirror an out-of-range index back into `0..n` (edge pixels are repeated)
fn reflect(i: i64, n: i64) -> i64 {
    let period = 2 * n;
    let i = i.rem_euclid(period);

    if i < n { i } else { period - 1 - i }
}

/// Resample an image through an affine map with bilinear interpolation
fn warp(
    image: &ConcordBuffer<u8, Vec<u8>>,
    matrix: Affine,
    fill: Fill,
) -> Result<ConcordBuffer<u8, Vec<u8>>, ConcordError> {
    let w = image.width() as i64;
    let h = image.height() as i64;
    let c = image.channels() as usize;
    let raw = image.as_raw();

    let cx = (w - 1) as f32 / 2.0;
    let cy = (h - 1) as f32 / 2.0;

    let sample = |x: i64, y: i64, channel: usize| -> f32 {
        let (x, y) = match fill {
            Fill::Reflect => (reflect(x, w), reflect(y, h)),
            Fill::Constant => {
                if x < 0 || y < 0 || x >= w || y >= h {
                    return 0.0;
                }
                (x, y)
            }
        };

        raw[(y * w + x) as usize * c + channel] as f32
    };

    let mut output = Vec::with_capacity(raw.len());

    for y in 0..h {
        let dy = y as f32 - cy;

        for x in 0..w {
            let dx = x as f32 - cx;

            let sx = matrix[0][0] * dx + matrix[0][1] * dy + matrix[0][2] + cx;
            let sy = matrix[1][0] * dx + matrix[1][1] * dy + matrix[1][2] + cy;

            let x0 = sx.floor();
            let y0 = sy.floor();
            let fx = sx - x0;
            let fy = sy - y0;
            let (x0, y0) = (x0 as i64, y0 as i64);

            for channel in 0..c {
                let value = sample(x0, y0, channel) * (1.0 - fx) * (1.0 - fy)
                    + sample(x0 + 1, y0, channel) * fx * (1.0 - fy)
                    + sample(x0, y0 + 1, channel) * (1.0 - fx) * fy
                    + sample(x0 + 1, y0 + 1, channel) * fx * fy;

                output.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    ConcordBuffer::new(image.width(), image.height(), image.channels(), output)
}

/// Scale each channel's deviation from its mean by `factor`
fn contrast(
    image: &ConcordBuffer<u8, Vec<u8>>,
    factor: f32,
) -> Result<ConcordBuffer<u8, Vec<u8>>, ConcordError> {
    let c = image.channels() as usize;
    let pixels = (image.width() as usize * image.height() as usize).max(1);

    let mut means = vec![0f32; c];
    for pixel in image.iter_pixels() {
        for (mean, &v) in means.iter_mut().zip(pixel) {
            *mean += v as f32;
        }
    }
    means.iter_mut().for_each(|m| *m /= pixels as f32);

    let output = image
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let mean = means[i % c];
            ((v as f32 - mean) * factor + mean).round().clamp(0.0, 255.0) as u8
        })
        .collect();

    ConcordBuffer::new(image.width(), image.height(), image.channels(), output)
}

fn flip(
    image: &ConcordBuffer<u8, Vec<u8>>,
    horizontal: bool,
    vertical: bool,
) -> Result<ConcordBuffer<u8, Vec<u8>>, ConcordError> {
    let w = image.width() as usize;
    let h = image.height() as usize;
    let c = image.channels() as usize;
    let raw = image.as_raw();

    let mut output = Vec::with_capacity(raw.len());

    for y in 0..h {
        let sy = if vertical { h - 1 - y } else { y };

        for x in 0..w {
            let sx = if horizontal { w - 1 - x } else { x };
            let start = (sy * w + sx) * c;
            output.extend_from_slice(&raw[start..start + c]);
        }
    }

    ConcordBuffer::new(image.width(), image.height(), image.channels(), output)
}

#[cfg(test)]
mod test {

    use super::*;

    fn gradient(width: u32, height: u32) -> ConcordBuffer<u8, Vec<u8>> {
        let data = (0..width * height)
            .flat_map(|i| {
                let v = (i * 7 % 256) as u8;
                [v, v / 2, 255 - v]
            })
            .collect();

        ConcordBuffer::new(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_parse_order_and_duplicates() {
        let augmenter = Augmenter::parse("cfzzr", 0).unwrap();

        assert_eq!(
            augmenter.augmentations,
            vec![
                Augmentation::Zoom,
                Augmentation::Rotate,
                Augmentation::Contrast,
                Augmentation::Flip
            ]
        );

        assert!(Augmenter::parse("", 0).unwrap().is_empty());
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
    }

    #[test]
    fn test_identity_warp() {
        let image = gradient(6, 5);
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

        assert_eq!(warp(&image, identity, Fill::Constant).unwrap(), image);
        assert_eq!(warp(&image, identity, Fill::Reflect).unwrap(), image);
    }

    #[test]
    fn test_translate_fills_constant() {
        let image = ConcordBuffer::new(4, 1, 1, vec![10u8, 20, 30, 40]).unwrap();

        // Sample one pixel to the left of each output pixel
        let shifted = warp(&image, [[1.0, 0.0, -1.0], [0.0, 1.0, 0.0]], Fill::Constant).unwrap();
        assert_eq!(shifted.as_raw(), &[0, 10, 20, 30]);
    }

    #[test]
    fn test_flip_both_axes() {
        let image = ConcordBuffer::new(2, 2, 1, vec![1u8, 2, 3, 4]).unwrap();

        assert_eq!(flip(&image, true, false).unwrap().as_raw(), &[2, 1, 4, 3]);
        assert_eq!(flip(&image, false, true).unwrap().as_raw(), &[3, 4, 1, 2]);
        assert_eq!(flip(&image, true, true).unwrap().as_raw(), &[4, 3, 2, 1]);
    }

    #[test]
    fn test_contrast_preserves_constant_image() {
        let image = ConcordBuffer::new(3, 3, 3, vec![90u8; 27]).unwrap();
        assert_eq!(contrast(&image, 1.1).unwrap(), image);
    }

    #[test]
    fn test_contrast_stretches() {
        let image = ConcordBuffer::new(2, 1, 1, vec![100u8, 200]).unwrap();
        assert_eq!(contrast(&image, 1.1).unwrap().as_raw(), &[95, 205]);
    }

    #[test]
    fn test_apply_is_seeded_and_shape_preserving() {
        let image = ConcordImage::U8(gradient(16, 12));

        let a = Augmenter::parse("FZTRC", 7).unwrap().apply(&image).unwrap();
        let b = Augmenter::parse("FZTRC", 7).unwrap().apply(&image).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.shape(), image.shape());
    }

    #[test]
    fn test_apply_rejects_u16() {
        let image = ConcordImage::U16(ConcordBuffer::new(1, 1, 1, vec![0u16]).unwrap());
        assert!(Augmenter::parse("F", 0).unwrap().apply(&image).is_err());
    }
}
