//! Data directory discovery and validation.
//!
//! A data directory is usable when it exists and every tile of the catalog
//! can be opened for reading inside it. Candidates are tried in order and the
//! first usable one wins.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::catalog::TileCatalog;
use crate::error::{GlobeError, Result};

/// Directories searched when no data directory is configured.
///
/// Relative entries are resolved against the current working directory.
pub const DEFAULT_DATA_DIRS: [&str; 4] = [
    "/usr/share/GLOBE-elevation",
    "/usr/local/share/GLOBE-elevation",
    "GLOBE-elevation",
    "elevation",
];

/// Check that `dir` exists and holds a readable file for every tile.
///
/// Files whose size differs from the catalog's expectation are accepted with
/// a warning; reads past their end fail later with a short read.
///
/// # Errors
///
/// - [`GlobeError::DataDirectoryMissing`] if `dir` is not a directory
/// - [`GlobeError::DataFileMissing`] for the first tile file that cannot be opened
pub fn validate_data_dir(dir: &Path, catalog: &TileCatalog) -> Result<()> {
    if !dir.is_dir() {
        return Err(GlobeError::DataDirectoryMissing {
            path: dir.to_path_buf(),
        });
    }

    for tile in catalog.tiles() {
        let path = dir.join(tile.name);
        let missing = |reason: String| GlobeError::DataFileMissing {
            path: path.clone(),
            reason,
        };

        let file = File::open(&path).map_err(|e| missing(e.to_string()))?;
        let metadata = file.metadata().map_err(|e| missing(e.to_string()))?;
        if !metadata.is_file() {
            return Err(missing("not a regular file".to_string()));
        }

        if metadata.len() != tile.file_size() {
            tracing::warn!(
                tile = tile.name,
                size = metadata.len(),
                expected = tile.file_size(),
                "Tile file size does not match catalog"
            );
        }
    }

    Ok(())
}

/// Pick the first usable directory among `candidates`.
///
/// # Errors
///
/// If no candidate is usable, returns the error for the first candidate.
pub fn resolve_data_dir<P: AsRef<Path>>(candidates: &[P], catalog: &TileCatalog) -> Result<PathBuf> {
    let mut first_error = None;

    for candidate in candidates {
        let dir = candidate.as_ref();
        match validate_data_dir(dir, catalog) {
            Ok(()) => {
                tracing::debug!(data_dir = %dir.display(), "Using data directory");
                return Ok(dir.to_path_buf());
            }
            Err(e) => {
                tracing::debug!(data_dir = %dir.display(), error = %e, "Skipping data directory");
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or(GlobeError::DataDirectoryMissing {
        path: PathBuf::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tiles(dir: &Path, skip: Option<&str>) {
        for tile in TileCatalog::globe().tiles() {
            if Some(tile.name) != skip {
                fs::write(dir.join(tile.name), [0u8; 2]).unwrap();
            }
        }
    }

    #[test]
    fn test_valid_directory() {
        let temp_dir = TempDir::new().unwrap();
        create_tiles(temp_dir.path(), None);

        assert!(validate_data_dir(temp_dir.path(), &TileCatalog::globe()).is_ok());
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        match validate_data_dir(&missing, &TileCatalog::globe()) {
            Err(GlobeError::DataDirectoryMissing { path }) => assert_eq!(path, missing),
            other => panic!("Expected DataDirectoryMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_tile_file() {
        let temp_dir = TempDir::new().unwrap();
        create_tiles(temp_dir.path(), Some("k10g"));

        match validate_data_dir(temp_dir.path(), &TileCatalog::globe()) {
            Err(GlobeError::DataFileMissing { path, .. }) => {
                assert_eq!(path, temp_dir.path().join("k10g"));
            }
            other => panic!("Expected DataFileMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_in_place_of_tile() {
        let temp_dir = TempDir::new().unwrap();
        create_tiles(temp_dir.path(), Some("a10g"));
        fs::create_dir(temp_dir.path().join("a10g")).unwrap();

        assert!(matches!(
            validate_data_dir(temp_dir.path(), &TileCatalog::globe()),
            Err(GlobeError::DataFileMissing { .. })
        ));
    }

    #[test]
    fn test_first_usable_candidate_wins() {
        let empty = TempDir::new().unwrap();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        create_tiles(first.path(), None);
        create_tiles(second.path(), None);

        let candidates = [empty.path(), first.path(), second.path()];
        let dir = resolve_data_dir(&candidates, &TileCatalog::globe()).unwrap();
        assert_eq!(dir, first.path());
    }

    #[test]
    fn test_reports_first_candidate_error() {
        let incomplete = TempDir::new().unwrap();
        create_tiles(incomplete.path(), Some("p10g"));
        let missing = incomplete.path().join("missing");

        let candidates = [missing.clone(), incomplete.path().to_path_buf()];
        match resolve_data_dir(&candidates, &TileCatalog::globe()) {
            Err(GlobeError::DataDirectoryMissing { path }) => assert_eq!(path, missing),
            other => panic!("Expected DataDirectoryMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_no_candidates() {
        let candidates: [PathBuf; 0] = [];
        assert!(matches!(
            resolve_data_dir(&candidates, &TileCatalog::globe()),
            Err(GlobeError::DataDirectoryMissing { .. })
        ));
    }
}
