// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

pub mod constant;
pub mod cv;
pub mod error;
pub mod im;
pub mod io;
pub mod mp;
pub mod tile;
pub mod ut;
