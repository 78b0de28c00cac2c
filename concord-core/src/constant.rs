// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

// All currently supported image formats
pub const SUPPORTED_IMAGE_FORMATS: [&str; 18] = [
    "avif", "bmp", "dds", "hdr", "ico", "jpeg", "jpg", "exr", "png", "pbm", "pgm", "ppm", "qoi",
    "tga", "tif", "tiff", "webp", "npy",
];

// The currently supported common image formats
pub const IMAGE_DYNAMIC_FORMATS: [&str; 17] = [
    "avif", "bmp", "dds", "hdr", "ico", "jpeg", "jpg", "exr", "png", "pbm", "pgm", "ppm", "qoi",
    "tga", "tif", "tiff", "webp",
];

// Formats that can only hold 8-bit samples
pub const IMAGE_8BIT_FORMATS: [&str; 4] = ["jpeg", "jpg", "bmp", "ico"];

// Pixel value used for positive mask pixels
pub const MASK_POSITIVE: u8 = 255;

// Per-channel intensity difference above which an annotated pixel counts as changed
pub const DIFFERENCE_THRESHOLD: u32 = 64;

// Threshold used when binarizing an existing mask image
pub const MASK_THRESHOLD: u32 = 127;

// Threshold used when re-binarizing a downsampled salience map
pub const DOWNSAMPLE_THRESHOLD: u32 = 64;

// Default tile edge used when splitting images into training samples
pub const DEFAULT_TILE_SIZE: u32 = 224;

// Default positive fraction required for a box fill or a positive tile
pub const DEFAULT_CRIT: f64 = 0.95;

// Default salience grid cell edge in pixels
pub const DEFAULT_SALIENCE_CELL: u32 = 20;

// Default salience thresholds for two and three raters
pub const DEFAULT_SALIENCE_CRIT_PAIR: f64 = 0.1;
pub const DEFAULT_SALIENCE_CRIT_TRIPLE: f64 = 0.05;

// Downsampling factor applied to salience maps before agreement scoring
pub const DEFAULT_KAPPA_SCALE: f64 = 1.0 / 50.0;

// Hexadecimal characters of the file digest used to name tiles
pub const HASH_PREFIX_LENGTH: usize = 16;

// Significant digits used when reporting rates
pub const RATE_SIGNIFICANT_DIGITS: usize = 5;
