// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::ops::Deref;

use num::{FromPrimitive, ToPrimitive, Zero};

use crate::im::ConcordBuffer;

/// A row-major buffer that defines an image view/crop/subregion
///
/// The view is a zero-copy reference to a larger `ConcordBuffer`. Any part
/// of the requested region falling outside the parent is clipped, so a view
/// never indexes out of bounds.
///
/// # Examples
///
/// ```
/// use concord_core::im::{ConcordBuffer, ConcordViewBuffer};
///
/// let data = vec![0, 1, 2, 3, 4, 5, 6, 7, 8];
///
/// let buffer = ConcordBuffer::<u8, Vec<u8>>::new(3, 3, 1, data).unwrap();
/// let crop = ConcordViewBuffer::new(1, 1, 2, 2, &buffer);
///
/// assert_eq!(crop.iter().copied().collect::<Vec<u8>>(), vec![4, 5, 7, 8]);
/// ```
#[derive(Clone)]
pub struct ConcordViewBuffer<'a, T, Container> {
    buffer: &'a ConcordBuffer<T, Container>,
    width: usize,    // Full image width
    channels: usize, // Full image channels
    x: usize,        // Minimum x-value of crop
    y: usize,        // Minimum y-value of crop
    w: usize,        // Width of crop
    h: usize,        // Height of crop
}

impl<'a, T, Container> ConcordViewBuffer<'a, T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Initialize a copy-free object specifying a cropped/subregion of an image
    pub fn new(x: u32, y: u32, w: u32, h: u32, buffer: &'a ConcordBuffer<T, Container>) -> Self {
        let x = std::cmp::min(x, buffer.width());
        let y = std::cmp::min(y, buffer.height());
        let h = std::cmp::min(h, buffer.height() - y);
        let w = std::cmp::min(w, buffer.width() - x);

        ConcordViewBuffer {
            buffer,
            width: buffer.width() as usize,
            channels: buffer.channels() as usize,
            x: x as usize,
            y: y as usize,
            w: w as usize,
            h: h as usize,
        }
    }

    /// Length of cropped buffer
    pub fn len(&self) -> usize {
        self.w * self.h * self.channels
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the clipped view
    pub fn width(&self) -> usize {
        self.w
    }

    /// Height of the clipped view
    pub fn height(&self) -> usize {
        self.h
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// An iterator over the contiguous subpixel slice of each row in the view
    pub fn iter_rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        let raw: &'a [T] = self.buffer.as_raw();
        let stride = self.width * self.channels;
        let start = self.x * self.channels;
        let end = start + self.w * self.channels;

        (self.y..self.y + self.h).map(move |row| &raw[row * stride + start..row * stride + end])
    }

    /// An iterator over every subpixel in the view
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.iter_rows().flat_map(|row| row.iter())
    }

    /// An iterator over pixels containing all channels
    pub fn iter_pixels(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        let channels = self.channels;
        self.iter_rows()
            .flat_map(move |row| row.chunks_exact(channels))
    }
}

impl<T, Container> ConcordViewBuffer<'_, T, Container>
where
    T: ToPrimitive + FromPrimitive + Zero + PartialEq,
    Container: Deref<Target = [T]>,
{
    /// Number of non-zero subpixels in the view
    pub fn count_nonzero(&self) -> usize {
        self.iter().filter(|value| !value.is_zero()).count()
    }
}
