// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

mod boxes;
mod buffer;
mod image;
mod mask;
mod view;

pub use buffer::ConcordBuffer;
pub use image::ConcordImage;

pub use view::ConcordViewBuffer;

pub use boxes::BoundingBox;
pub use boxes::BoundingBoxes;
pub use boxes::apply_crit;

pub use mask::ConcordMask;
