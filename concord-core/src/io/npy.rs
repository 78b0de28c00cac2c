// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::Path;

use npyz::{self, WriterBuilder};

use crate::error::ConcordError;

/// Write a numpy file from a slice of specified shape
///
/// # Arguments
///
/// * `path` - Path to output numpy file
/// * `data` - Slice of numeric type
/// * `shape` - Shape of the array (shape product must equal length of data)
pub fn write_numpy<T, P: AsRef<Path>>(
    path: P,
    data: &[T],
    shape: Vec<u64>,
) -> Result<(), ConcordError>
where
    T: npyz::Serialize + npyz::AutoSerialize,
{
    let path = path.as_ref();
    let error = || ConcordError::ImageWriteError(path.display().to_string());

    if shape.iter().product::<u64>() != data.len() as u64 {
        return Err(ConcordError::BufferSizeError);
    }

    let mut buffer = vec![];
    let mut writer = npyz::WriteOptions::<T>::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut buffer)
        .begin_nd()
        .map_err(|_| error())?;

    for d in data {
        writer.push(d).map_err(|_| error())?;
    }

    writer.finish().map_err(|_| error())?;

    std::fs::write(path, buffer).map_err(|_| error())
}
