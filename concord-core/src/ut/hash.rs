// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::constant::HASH_PREFIX_LENGTH;
use crate::error::ConcordError;

/// Hex-encoded SHA-1 digest of a file's contents
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<String, ConcordError> {
    let path = path.as_ref();

    let file = File::open(path)
        .map_err(|err| ConcordError::NoFileError(format!("{}: {}", path.display(), err)))?;

    let mut hasher = Sha1::new();
    std::io::copy(&mut BufReader::new(file), &mut hasher)
        .map_err(|err| ConcordError::OtherError(format!("{}: {}", path.display(), err)))?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Stable 16-character stem used to name every tile cut from a file
///
/// # Examples
///
/// ```
/// use concord_core::ut::hash::hash_file_prefix;
///
/// std::fs::write("TEST_HASH_DOCTEST.txt", b"abc").unwrap();
/// assert_eq!(hash_file_prefix("TEST_HASH_DOCTEST.txt").unwrap(), "a9993e364706816a");
/// std::fs::remove_file("TEST_HASH_DOCTEST.txt").unwrap();
/// ```
pub fn hash_file_prefix<P: AsRef<Path>>(path: P) -> Result<String, ConcordError> {
    let mut digest = hash_file(path)?;
    digest.truncate(HASH_PREFIX_LENGTH);
    Ok(digest)
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_hash_file_empty() {
        const TEST_EMPTY: &str = "TEST_HASH_EMPTY.bin";
        std::fs::write(TEST_EMPTY, b"").unwrap();

        assert_eq!(
            hash_file(TEST_EMPTY).unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );

        std::fs::remove_file(TEST_EMPTY).unwrap();
    }

    #[test]
    fn test_hash_file_prefix_length() {
        const TEST_PREFIX: &str = "TEST_HASH_PREFIX.bin";
        std::fs::write(TEST_PREFIX, vec![7u8; 5000]).unwrap();

        let prefix = hash_file_prefix(TEST_PREFIX).unwrap();
        assert_eq!(prefix.len(), 16);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));

        std::fs::remove_file(TEST_PREFIX).unwrap();
    }

    #[test]
    fn test_hash_missing_file() {
        assert!(hash_file("TEST_HASH_MISSING.bin").is_err());
    }
}
