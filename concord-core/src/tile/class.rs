// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fmt;

/// Label assigned to a tile from the positive fraction of its mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileClass {
    Positive,
    Negative,
    Ambiguous,
}

impl TileClass {
    /// Classify a positive fraction against the high and low cut-offs
    ///
    /// # Arguments
    ///
    /// * `fraction` - Positive pixel fraction of the tile
    /// * `high` - Fractions at or above this are positive
    /// * `low` - Fractions at or below this are negative
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_core::tile::TileClass;
    ///
    /// assert_eq!(TileClass::classify(0.95, 0.95, 0.05), TileClass::Positive);
    /// assert_eq!(TileClass::classify(0.05, 0.95, 0.05), TileClass::Negative);
    /// assert_eq!(TileClass::classify(0.50, 0.95, 0.05), TileClass::Ambiguous);
    /// ```
    pub fn classify(fraction: f64, high: f64, low: f64) -> TileClass {
        if fraction >= high {
            TileClass::Positive
        } else if fraction <= low {
            TileClass::Negative
        } else {
            TileClass::Ambiguous
        }
    }

    /// Single-character label, also used as the output sub-directory name
    pub fn label(&self) -> &'static str {
        match self {
            TileClass::Positive => "Y",
            TileClass::Negative => "N",
            TileClass::Ambiguous => "?",
        }
    }

    /// Whether tiles of this class are written out
    pub fn is_written(&self) -> bool {
        !matches!(self, TileClass::Ambiguous)
    }
}

impl fmt::Display for TileClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_classify_equal_cutoffs() {
        // With low == high every fraction is either positive or negative
        assert_eq!(TileClass::classify(0.95, 0.95, 0.95), TileClass::Positive);
        assert_eq!(TileClass::classify(0.94, 0.95, 0.95), TileClass::Negative);
    }

    #[test]
    fn test_labels() {
        assert_eq!(TileClass::Positive.to_string(), "Y");
        assert_eq!(TileClass::Negative.to_string(), "N");
        assert_eq!(TileClass::Ambiguous.to_string(), "?");
        assert!(!TileClass::Ambiguous.is_written());
    }
}
