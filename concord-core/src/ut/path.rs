// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use crate::error::ConcordError;

/// Ensures a directory (and any missing parents) exists
///
/// Unlike a fresh output directory, tile directories are shared across many
/// source images so an existing directory is reused as-is.
///
/// # Arguments
///
/// * `directory` - Path to directory
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use concord_core::ut::path::ensure_directory;
///
/// let base = Path::new("TEST_ENSURE_DIRECTORY/nested");
///
/// ensure_directory(base).unwrap();
/// ensure_directory(base).unwrap();
/// assert!(base.is_dir());
///
/// std::fs::remove_dir_all("TEST_ENSURE_DIRECTORY").unwrap();
/// ```
pub fn ensure_directory<P: AsRef<Path>>(directory: P) -> Result<PathBuf, ConcordError> {
    let directory = directory.as_ref();

    if directory.is_dir() {
        return Ok(directory.to_path_buf());
    }

    std::fs::create_dir_all(directory)
        .map_err(|err| ConcordError::DirError(format!("{}: {}", directory.display(), err)))?;

    Ok(directory.to_path_buf())
}

/// Collect file paths with a valid extension from a directory, sorted by name
///
/// # Arguments
///
/// * `directory` - Path to directory containing files
/// * `valid_ext` - Lowercase file extensions to keep
///
/// # Examples
///
/// ```no_run
/// use concord_core::ut::path::collect_file_paths;
/// use concord_core::constant::SUPPORTED_IMAGE_FORMATS;
/// let files = collect_file_paths("directory/", SUPPORTED_IMAGE_FORMATS.as_slice());
/// ```
pub fn collect_file_paths<P: AsRef<Path>>(
    directory: P,
    valid_ext: &[&str],
) -> Result<Vec<PathBuf>, ConcordError> {
    let directory = directory.as_ref();

    let mut files: Vec<PathBuf> = std::fs::read_dir(directory)
        .map_err(|err| ConcordError::DirError(format!("{}: {}", directory.display(), err)))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.to_lowercase())
                    .is_some_and(|ext| valid_ext.contains(&ext.as_str()))
        })
        .collect();

    files.sort_unstable();

    Ok(files)
}

/// Collect the names of the immediate sub-directories of a directory, sorted
///
/// # Arguments
///
/// * `directory` - Path to the parent directory
pub fn collect_subdirectories<P: AsRef<Path>>(directory: P) -> Result<Vec<String>, ConcordError> {
    let directory = directory.as_ref();

    let mut names: Vec<String> = std::fs::read_dir(directory)
        .map_err(|err| ConcordError::DirError(format!("{}: {}", directory.display(), err)))?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(|name| name.to_string()))
        .filter(|name| !name.starts_with('.'))
        .collect();

    names.sort_unstable();

    Ok(names)
}

/// Read a newline-separated list of paths, skipping blank lines
///
/// # Arguments
///
/// * `path` - Path to a plain-text list file
pub fn read_path_list<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>, ConcordError> {
    let path = path.as_ref();

    let contents = std::fs::read_to_string(path)
        .map_err(|err| ConcordError::NoFileError(format!("{}: {}", path.display(), err)))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Lowercase extension of a path, if any
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_collect_file_paths_filters_and_sorts() {
        let base = Path::new("TEST_COLLECT_FILE_PATHS");
        ensure_directory(base).unwrap();

        for name in ["b.png", "a.PNG", "c.txt", "d.jpg"] {
            std::fs::write(base.join(name), b"").unwrap();
        }

        let files = collect_file_paths(base, &["png", "jpg"]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.PNG", "b.png", "d.jpg"]);

        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_collect_subdirectories() {
        let base = Path::new("TEST_COLLECT_SUBDIRECTORIES");
        ensure_directory(base.join("Y")).unwrap();
        ensure_directory(base.join("N")).unwrap();
        ensure_directory(base.join(".hidden")).unwrap();
        std::fs::write(base.join("file.png"), b"").unwrap();

        let names = collect_subdirectories(base).unwrap();
        assert_eq!(names, vec!["N", "Y"]);

        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_read_path_list() {
        const TEST_LIST: &str = "TEST_READ_PATH_LIST.txt";
        std::fs::write(TEST_LIST, "a.png\n\n  b.png  \n").unwrap();

        let paths = read_path_list(TEST_LIST).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.png"), PathBuf::from("b.png")]);

        std::fs::remove_file(TEST_LIST).unwrap();
    }

    #[test]
    fn test_read_path_list_missing() {
        assert!(matches!(
            read_path_list("TEST_DOES_NOT_EXIST.txt"),
            Err(ConcordError::NoFileError(_))
        ));
    }

    #[test]
    fn test_extension_lowercase() {
        assert_eq!(extension(Path::new("a/b.PNG")), Some("png".to_string()));
        assert_eq!(extension(Path::new("a/b")), None);
    }
}
