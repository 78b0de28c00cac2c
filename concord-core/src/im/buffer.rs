// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::iter::Iterator;
use std::marker::PhantomData;
use std::ops::Deref;
use std::slice::ChunksExact;

use num::{FromPrimitive, ToPrimitive};

use crate::error::ConcordError;
use crate::im::ConcordViewBuffer;

/// A row-major container storing an image buffer or grid of pixels.
///
/// The struct is generic over the data type `T` and over the container that
/// holds raw pixel/subpixel data as a slice (`[T]`) or vector (`Vec<T>`).
/// The container holding the pixel data must implement `Deref<Target = [T]>`
/// to allow for slice-like access to the data. The length of the container
/// must also be equal to the product of `w` * `h` * `c`.
///
/// # Examples
///
/// ```
/// use concord_core::im::ConcordBuffer;
///
/// let width = 10;
/// let height = 10;
/// let channels = 3; // RGB
/// let data = vec![0u8; (width * height * channels) as usize];
///
/// let buffer = ConcordBuffer::new(width, height, channels, data);
///
/// assert_eq!(buffer.unwrap().len(), (width * height * channels) as usize);
/// ```
///
/// ```
/// use concord_core::im::ConcordBuffer;
///
/// let data = vec![0u8; 10 * 10 * 9];
/// let buffer = ConcordBuffer::new(10, 10, 3, data);
///
/// assert!(buffer.is_err()); // Buffer size does not match dimensions
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConcordBuffer<T, Container> {
    w: u32,                   // Width
    h: u32,                   // Height
    c: u32,                   // Channels
    pub buffer: Container,    // Slice
    _phantom: PhantomData<T>, // Pixel
}

impl<T, Container> ConcordBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Initializes a buffer from a generic data container
    ///
    /// # Arguments
    ///
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `channels` - Number of image channels (e.g. 1 for grayscale)
    /// * `buffer` - A generic container (e.g. `Vec` or slice)
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        buffer: Container,
    ) -> Result<ConcordBuffer<T, Container>, ConcordError> {
        if width as usize * height as usize * channels as usize == buffer.len() {
            Ok(ConcordBuffer {
                w: width,
                h: height,
                c: channels,
                buffer,
                _phantom: PhantomData,
            })
        } else {
            Err(ConcordError::BufferSizeError)
        }
    }
}

impl<T> ConcordBuffer<T, Vec<T>>
where
    T: Clone + ToPrimitive + FromPrimitive,
{
    /// Initializes an owned buffer with every subpixel set to `value`
    pub fn filled(width: u32, height: u32, channels: u32, value: T) -> ConcordBuffer<T, Vec<T>> {
        ConcordBuffer {
            w: width,
            h: height,
            c: channels,
            buffer: vec![value; width as usize * height as usize * channels as usize],
            _phantom: PhantomData,
        }
    }
}

// >>> PROPERTY METHODS

impl<T, Container> ConcordBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Width of the image
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height of the image
    pub fn height(&self) -> u32 {
        self.h
    }

    /// Number of channels in the image
    pub fn channels(&self) -> u32 {
        self.c
    }

    /// Shape/dimensions of the image
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.h, self.w, self.c)
    }

    /// Length of the raw image
    pub fn len(&self) -> usize {
        self.w as usize * self.h as usize * self.c as usize
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl<T, Container> ConcordBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Returns the raw image
    pub fn into_raw(self) -> Container {
        self.buffer
    }

    /// Returns a reference to the raw image
    pub fn as_raw(&self) -> &Container {
        &self.buffer
    }

    /// Cast subpixels to f32 and return the buffer
    pub fn to_f32(&self) -> Vec<f32> {
        self.buffer
            .iter()
            .map(|x| x.to_f32().unwrap_or(0f32))
            .collect()
    }

    // An iterator over the raw buffer
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    // An iterator over pixel-level chunks of the raw buffer
    pub fn iter_pixels(&self) -> ChunksExact<'_, T> {
        self.buffer.chunks_exact(self.channels() as usize)
    }
}

// <<< CONVERSION METHODS

// >>> TRANSFORM METHODS

impl<T, Container> ConcordBuffer<T, Container>
where
    Container: Deref<Target = [T]> + FromIterator<T>,
    T: Clone + ToPrimitive + FromPrimitive,
{
    /// Generate a zero-copy crop of an image subregion
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left)
    /// * `y` - Minimum y-coordinate (top)
    /// * `w` - Width of crop
    /// * `h` - Height of crop
    pub fn crop_view(&self, x: u32, y: u32, w: u32, h: u32) -> ConcordViewBuffer<'_, T, Container> {
        ConcordViewBuffer::new(x, y, w, h, self)
    }

    /// Create a new buffer with copied cropped contents
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left)
    /// * `y` - Minimum y-coordinate (top)
    /// * `w` - Width of crop
    /// * `h` - Height of crop
    pub fn crop(
        &self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> Result<ConcordBuffer<T, Container>, ConcordError> {
        if x as u64 + w as u64 > self.w as u64 || y as u64 + h as u64 > self.h as u64 {
            return Err(ConcordError::ImageError("Cropping coordinates out of bounds."));
        }

        let c = self.c as usize;
        let orig_w = self.w as usize;
        let orig_buffer = self.buffer.as_ref();

        let mut new_buffer = Vec::with_capacity(w as usize * h as usize * c);

        for row in y..y + h {
            let start = ((row as usize) * orig_w + (x as usize)) * c;
            let end = start + (w as usize) * c;
            new_buffer.extend_from_slice(&orig_buffer[start..end]);
        }

        Ok(ConcordBuffer {
            w,
            h,
            c: self.c,
            buffer: Container::from_iter(new_buffer),
            _phantom: PhantomData,
        })
    }
}

// <<< TRANSFORM METHODS

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_buffer_new_success() {
        let buffer = ConcordBuffer::new(1, 3, 2, [1, 2, 3, 4, 5, 6].as_slice());
        assert!(buffer.is_ok());
    }

    #[test]
    fn test_buffer_new_error() {
        let buffer = ConcordBuffer::new(2, 3, 2, [1, 2, 3, 4, 5, 6].as_slice());
        assert!(buffer.is_err());
    }

    #[test]
    fn test_buffer_shape() {
        let buffer = ConcordBuffer::new(1, 3, 2, [1, 2, 3, 4, 5, 6].as_slice()).unwrap();
        assert_eq!(buffer.width(), 1);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.shape(), (3, 1, 2));
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn test_iter_pixels() {
        let buffer = ConcordBuffer::new(1, 4, 2, [1, 2, 3, 4, 5, 6, 7, 8].as_slice()).unwrap();

        for (a, b) in buffer.iter_pixels().zip([[1, 2], [3, 4], [5, 6], [7, 8]]) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_crop() {
        let data: Vec<u8> = (0..16).collect();
        let buffer = ConcordBuffer::new(4, 4, 1, data).unwrap();

        let crop = buffer.crop(1, 2, 2, 2).unwrap();
        assert_eq!(crop.as_raw(), &[9, 10, 13, 14]);

        assert!(buffer.crop(3, 3, 2, 2).is_err());
    }
}
