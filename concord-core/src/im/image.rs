// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::Path;

use fast_image_resize::PixelType;
use image::{DynamicImage, ImageBuffer, ImageReader, Luma, Rgb};
use npyz::{DType, NpyFile, TypeChar};

use crate::constant;
use crate::cv::transform;
use crate::error::ConcordError;
use crate::im::ConcordBuffer;
use crate::impl_enum_dispatch;
use crate::io::write_numpy;
use crate::ut::path::extension;

/// A wrapper for representing and storing array-shaped pixels
///
/// Images are read with their native sample depth: 8-bit files become `U8`
/// and 16-bit files become `U16`, so intensity thresholds are applied to
/// unscaled values. Alpha channels are dropped on read, leaving 1 (gray) or
/// 3 (color) channels.
///
/// # Examples
///
/// ```
/// use image::{RgbImage, DynamicImage};
/// use concord_core::im::ConcordImage;
///
/// let rgb = RgbImage::new(10, 10);
/// let dynamic = DynamicImage::ImageRgb8(rgb);
/// let image = ConcordImage::new_from_default(dynamic).unwrap();
///
/// assert_eq!(image.shape(), (10, 10, 3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ConcordImage {
    U8(ConcordBuffer<u8, Vec<u8>>),
    U16(ConcordBuffer<u16, Vec<u16>>),
}

// >>> I/O METHODS

impl ConcordImage {
    /// Open a new image from a provided path
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    ///
    /// ```no_run
    /// use concord_core::im::ConcordImage;
    /// let image = ConcordImage::open("image.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ConcordImage, ConcordError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if !path.is_file() {
            return Err(ConcordError::NoFileError(display));
        }

        match extension(path) {
            Some(ext) if ext == "npy" => {
                let bytes =
                    std::fs::read(path).map_err(|_| ConcordError::ImageReadError(display.clone()))?;
                let npy = NpyFile::new(&bytes[..])
                    .map_err(|_| ConcordError::ImageReadError(display.clone()))?;

                Self::new_from_numpy(npy)
            }
            Some(ext) if constant::IMAGE_DYNAMIC_FORMATS.contains(&ext.as_str()) => {
                let image = ImageReader::open(path)
                    .map_err(|_| ConcordError::ImageReadError(display.clone()))?
                    .with_guessed_format()
                    .map_err(|_| ConcordError::ImageReadError(display.clone()))?
                    .decode()
                    .map_err(|_| ConcordError::ImageReadError(display.clone()))?;

                Self::new_from_default(image)
            }
            _ => Err(ConcordError::ImageExtensionError(display)),
        }
    }

    /// Initialize a new image from a DynamicImage
    ///
    /// # Arguments
    ///
    /// * `image` - An 8 or 16-bit grayscale or rgb DynamicImage
    pub fn new_from_default(image: DynamicImage) -> Result<ConcordImage, ConcordError> {
        let width = image.width();
        let height = image.height();

        match image {
            DynamicImage::ImageLuma8(buffer) => Ok(ConcordImage::U8(ConcordBuffer::new(
                width,
                height,
                1,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageLumaA8(buffer) => Ok(ConcordImage::U8(ConcordBuffer::new(
                width,
                height,
                1,
                buffer
                    .into_raw()
                    .chunks_exact(2)
                    .map(|pixel| pixel[0])
                    .collect(),
            )?)),
            DynamicImage::ImageLuma16(buffer) => Ok(ConcordImage::U16(ConcordBuffer::new(
                width,
                height,
                1,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageLumaA16(buffer) => Ok(ConcordImage::U16(ConcordBuffer::new(
                width,
                height,
                1,
                buffer
                    .into_raw()
                    .chunks_exact(2)
                    .map(|pixel| pixel[0])
                    .collect(),
            )?)),
            DynamicImage::ImageRgb8(buffer) => Ok(ConcordImage::U8(ConcordBuffer::new(
                width,
                height,
                3,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageRgba8(buffer) => Ok(ConcordImage::U8(ConcordBuffer::new(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            )?)),
            DynamicImage::ImageRgb16(buffer) => Ok(ConcordImage::U16(ConcordBuffer::new(
                width,
                height,
                3,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageRgba16(buffer) => Ok(ConcordImage::U16(ConcordBuffer::new(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            )?)),
            _ => Err(ConcordError::ImageFormatError),
        }
    }

    /// Initialize a new image from a numpy array buffer
    ///
    /// # Arguments
    ///
    /// * `npy` - A (height, width) or (height, width, channel) shaped u8/u16 array
    pub fn new_from_numpy(npy: NpyFile<&[u8]>) -> Result<ConcordImage, ConcordError> {
        let shape = npy.shape().to_vec();

        let (h, w, c) = match shape.len() {
            2 => (shape[0] as u32, shape[1] as u32, 1u32),
            3 => (shape[0] as u32, shape[1] as u32, shape[2] as u32),
            _ => {
                return Err(ConcordError::ImageError(
                    "Numpy array inputs must have an (H, W) or (H, W, C) shape.",
                ));
            }
        };

        if c != 1 && c != 3 {
            return Err(ConcordError::ImageFormatError);
        }

        let invalid = || ConcordError::ImageError("Numpy array data could not be decoded.");

        match npy.dtype() {
            DType::Plain(x) => match (x.type_char(), x.size_field()) {
                (TypeChar::Uint, 1) => Ok(ConcordImage::U8(ConcordBuffer::new(
                    w,
                    h,
                    c,
                    npy.into_vec().map_err(|_| invalid())?,
                )?)),
                (TypeChar::Uint, 2) => Ok(ConcordImage::U16(ConcordBuffer::new(
                    w,
                    h,
                    c,
                    npy.into_vec().map_err(|_| invalid())?,
                )?)),
                _ => Err(ConcordError::ImageFormatError),
            },
            _ => Err(ConcordError::ImageError(
                "Only plain numpy arrays are currently supported.",
            )),
        }
    }

    /// Save image, choosing the encoder from the file extension
    ///
    /// 16-bit images written to an 8-bit only format (e.g. jpg) keep their
    /// most significant byte.
    ///
    /// ```no_run
    /// use concord_core::im::ConcordImage;
    /// let image = ConcordImage::open("image.png").unwrap();
    /// image.save("image.npy").unwrap();
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConcordError> {
        let path = path.as_ref();

        match extension(path) {
            Some(ext) if ext == "npy" => self.save_as_numpy(path),
            Some(ext) if constant::IMAGE_8BIT_FORMATS.contains(&ext.as_str()) => {
                self.to_depth_u8()?.save_as_default(path)
            }
            Some(ext) if constant::IMAGE_DYNAMIC_FORMATS.contains(&ext.as_str()) => {
                self.save_as_default(path)
            }
            _ => Err(ConcordError::ImageExtensionError(path.display().to_string())),
        }
    }

    /// Save image as a default image format
    fn save_as_default(&self, path: &Path) -> Result<(), ConcordError> {
        let error = || ConcordError::ImageWriteError(path.display().to_string());

        match (self, self.channels()) {
            (ConcordImage::U8(buffer), 1) => ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(
                buffer.width(),
                buffer.height(),
                buffer.as_raw().to_vec(),
            )
            .ok_or_else(error)?
            .save(path)
            .map_err(|_| error()),
            (ConcordImage::U16(buffer), 1) => ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(
                buffer.width(),
                buffer.height(),
                buffer.as_raw().to_vec(),
            )
            .ok_or_else(error)?
            .save(path)
            .map_err(|_| error()),
            (ConcordImage::U8(buffer), 3) => ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(
                buffer.width(),
                buffer.height(),
                buffer.as_raw().to_vec(),
            )
            .ok_or_else(error)?
            .save(path)
            .map_err(|_| error()),
            (ConcordImage::U16(buffer), 3) => ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(
                buffer.width(),
                buffer.height(),
                buffer.as_raw().to_vec(),
            )
            .ok_or_else(error)?
            .save(path)
            .map_err(|_| error()),
            _ => Err(ConcordError::ImageFormatError),
        }
    }

    /// Save image as a numpy format
    fn save_as_numpy(&self, path: &Path) -> Result<(), ConcordError> {
        let shape = vec![
            self.height() as u64,
            self.width() as u64,
            self.channels() as u64,
        ];

        match self {
            ConcordImage::U8(buffer) => write_numpy(path, buffer.as_raw(), shape),
            ConcordImage::U16(buffer) => write_numpy(path, buffer.as_raw(), shape),
        }
    }
}

// <<< I/O METHODS

// >>> PROPERTY METHODS

impl_enum_dispatch!(ConcordImage, U8, U16; width(&self) -> u32);
impl_enum_dispatch!(ConcordImage, U8, U16; height(&self) -> u32);
impl_enum_dispatch!(ConcordImage, U8, U16; channels(&self) -> u32);
impl_enum_dispatch!(ConcordImage, U8, U16; shape(&self) -> (u32, u32, u32));
impl_enum_dispatch!(ConcordImage, U8, U16; len(&self) -> usize);
impl_enum_dispatch!(ConcordImage, U8, U16; is_empty(&self) -> bool);

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl_enum_dispatch!(ConcordImage, U8, U16; to_f32(&self) -> Vec<f32>);

impl ConcordImage {
    /// Reduce the sample depth to 8 bits, keeping the most significant byte
    pub fn to_depth_u8(&self) -> Result<ConcordImage, ConcordError> {
        match self {
            ConcordImage::U8(_) => Ok(self.clone()),
            ConcordImage::U16(buffer) => {
                let data: Vec<u8> = buffer.iter().map(|&v| (v >> 8) as u8).collect();
                Ok(ConcordImage::U8(ConcordBuffer::new(
                    buffer.width(),
                    buffer.height(),
                    buffer.channels(),
                    data,
                )?))
            }
        }
    }

    /// Convert to an 8-bit, 3-channel image (gray channels are repeated)
    pub fn to_rgb8(&self) -> Result<ConcordImage, ConcordError> {
        let image = self.to_depth_u8()?;

        match image {
            ConcordImage::U8(buffer) if buffer.channels() == 3 => Ok(ConcordImage::U8(buffer)),
            ConcordImage::U8(buffer) if buffer.channels() == 1 => {
                let data: Vec<u8> = buffer.iter().flat_map(|&v| [v, v, v]).collect();
                Ok(ConcordImage::U8(ConcordBuffer::new(
                    buffer.width(),
                    buffer.height(),
                    3,
                    data,
                )?))
            }
            _ => Err(ConcordError::ImageFormatError),
        }
    }
}

// <<< CONVERSION METHODS

// >>> TRANSFORM METHODS

impl ConcordImage {
    /// Create a new image with copied cropped contents
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left)
    /// * `y` - Minimum y-coordinate (top)
    /// * `w` - Width of crop
    /// * `h` - Height of crop
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Result<ConcordImage, ConcordError> {
        match self {
            ConcordImage::U8(buffer) => Ok(ConcordImage::U8(buffer.crop(x, y, w, h)?)),
            ConcordImage::U16(buffer) => Ok(ConcordImage::U16(buffer.crop(x, y, w, h)?)),
        }
    }

    /// Resize the image with bilinear interpolation
    ///
    /// # Arguments
    ///
    /// * `width` - Width of resized image
    /// * `height` - Height of resized image
    pub fn resize(&self, width: u32, height: u32) -> Result<ConcordImage, ConcordError> {
        if width == self.width() && height == self.height() {
            return Ok(self.clone());
        }

        let failed = || ConcordError::ImageError("Failed to resize image.");

        match (self, self.channels()) {
            (ConcordImage::U8(buffer), 1) => Ok(ConcordImage::U8(ConcordBuffer::new(
                width,
                height,
                1,
                transform::resize_bilinear_fast(
                    &DynamicImage::ImageLuma8(
                        ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(
                            buffer.width(),
                            buffer.height(),
                            buffer.as_raw().to_vec(),
                        )
                        .ok_or_else(failed)?,
                    ),
                    width,
                    height,
                    PixelType::U8,
                )?,
            )?)),
            (ConcordImage::U8(buffer), 3) => Ok(ConcordImage::U8(ConcordBuffer::new(
                width,
                height,
                3,
                transform::resize_bilinear_fast(
                    &DynamicImage::ImageRgb8(
                        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(
                            buffer.width(),
                            buffer.height(),
                            buffer.as_raw().to_vec(),
                        )
                        .ok_or_else(failed)?,
                    ),
                    width,
                    height,
                    PixelType::U8x3,
                )?,
            )?)),
            (ConcordImage::U16(buffer), 1) => Ok(ConcordImage::U16(ConcordBuffer::new(
                width,
                height,
                1,
                transform::resize_bilinear_default(
                    &ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(
                        buffer.width(),
                        buffer.height(),
                        buffer.as_raw().to_vec(),
                    )
                    .ok_or_else(failed)?,
                    width,
                    height,
                )
                .into_raw(),
            )?)),
            (ConcordImage::U16(buffer), 3) => Ok(ConcordImage::U16(ConcordBuffer::new(
                width,
                height,
                3,
                transform::resize_bilinear_default(
                    &ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(
                        buffer.width(),
                        buffer.height(),
                        buffer.as_raw().to_vec(),
                    )
                    .ok_or_else(failed)?,
                    width,
                    height,
                )
                .into_raw(),
            )?)),
            _ => Err(ConcordError::ImageFormatError),
        }
    }

    /// Fail unless `other` has the same height, width and channel count
    pub fn ensure_same_shape(&self, other: &ConcordImage) -> Result<(), ConcordError> {
        if self.shape() != other.shape() {
            return Err(ConcordError::DimensionMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }

        Ok(())
    }
}

// <<< TRANSFORM METHODS

#[cfg(test)]
mod test {

    use super::*;
    use image::{GrayImage, RgbaImage};

    #[test]
    fn test_new_from_default_drops_alpha() {
        let rgba = RgbaImage::from_pixel(4, 3, image::Rgba([1, 2, 3, 4]));
        let image = ConcordImage::new_from_default(DynamicImage::ImageRgba8(rgba)).unwrap();

        assert_eq!(image.shape(), (3, 4, 3));
        assert_eq!(image.to_f32()[..3], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            ConcordImage::open("TEST_IMAGE_DOES_NOT_EXIST.png"),
            Err(ConcordError::NoFileError(_))
        ));
    }

    #[test]
    fn test_open_invalid_extension() {
        const TEST_TXT: &str = "TEST_IMAGE_INVALID_EXTENSION.txt";
        std::fs::write(TEST_TXT, b"not an image").unwrap();

        assert!(matches!(
            ConcordImage::open(TEST_TXT),
            Err(ConcordError::ImageExtensionError(_))
        ));

        std::fs::remove_file(TEST_TXT).unwrap();
    }

    #[test]
    fn test_open_corrupt_file() {
        const TEST_CORRUPT: &str = "TEST_IMAGE_CORRUPT.png";
        std::fs::write(TEST_CORRUPT, b"definitely not a png").unwrap();

        assert!(matches!(
            ConcordImage::open(TEST_CORRUPT),
            Err(ConcordError::ImageReadError(_))
        ));

        std::fs::remove_file(TEST_CORRUPT).unwrap();
    }

    #[test]
    fn test_save_and_open_png_u16() {
        const TEST_PNG: &str = "TEST_IMAGE_SAVE_U16.png";

        let buffer = ConcordBuffer::new(2, 2, 1, vec![0u16, 1000, 40000, 65535]).unwrap();
        let image = ConcordImage::U16(buffer);
        image.save(TEST_PNG).unwrap();

        let reopened = ConcordImage::open(TEST_PNG).unwrap();
        assert_eq!(reopened, image);

        std::fs::remove_file(TEST_PNG).unwrap();
    }

    #[test]
    fn test_save_and_open_numpy() {
        const TEST_NPY: &str = "TEST_IMAGE_SAVE.npy";

        let buffer = ConcordBuffer::new(2, 1, 3, vec![1u8, 2, 3, 4, 5, 6]).unwrap();
        let image = ConcordImage::U8(buffer);
        image.save(TEST_NPY).unwrap();

        let reopened = ConcordImage::open(TEST_NPY).unwrap();
        assert_eq!(reopened, image);

        std::fs::remove_file(TEST_NPY).unwrap();
    }

    #[test]
    fn test_to_rgb8_from_gray_u16() {
        let buffer = ConcordBuffer::new(2, 1, 1, vec![256u16, 65535]).unwrap();
        let rgb = ConcordImage::U16(buffer).to_rgb8().unwrap();

        assert_eq!(rgb.channels(), 3);
        assert_eq!(rgb.to_f32(), vec![1.0, 1.0, 1.0, 255.0, 255.0, 255.0]);
    }

    #[test]
    fn test_resize_shape() {
        let gray = GrayImage::from_pixel(10, 6, Luma([100]));
        let image = ConcordImage::new_from_default(DynamicImage::ImageLuma8(gray)).unwrap();

        let resized = image.resize(5, 3).unwrap();
        assert_eq!(resized.shape(), (3, 5, 1));
        assert!(resized.to_f32().iter().all(|&v| v == 100.0));
    }

    #[test]
    fn test_ensure_same_shape() {
        let a = ConcordImage::U8(ConcordBuffer::new(2, 3, 1, vec![0; 6]).unwrap());
        let b = ConcordImage::U8(ConcordBuffer::new(3, 2, 1, vec![0; 6]).unwrap());

        assert!(a.ensure_same_shape(&a).is_ok());
        assert!(matches!(
            a.ensure_same_shape(&b),
            Err(ConcordError::DimensionMismatch { .. })
        ));
    }
}
