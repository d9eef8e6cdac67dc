//! Tile extraction from the GLOBE distribution archive.
//!
//! The dataset is distributed as `all10g.zip`, with entries such as
//! `all10/a10g`. [`extract_tiles`] copies every entry whose file name matches
//! a catalog tile into a data directory and ignores everything else.
//!
//! ```ignore
//! use globe::{archive::extract_tiles, TileCatalog};
//!
//! let stats = extract_tiles("all10g.zip", "/data/globe", &TileCatalog::globe())?;
//! assert!(stats.is_complete());
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::catalog::TileCatalog;
use crate::error::{GlobeError, Result};

/// Outcome of an archive extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Tiles written to the destination.
    pub extracted: Vec<&'static str>,
    /// Archive entries that are not catalog tiles.
    pub skipped: usize,
    /// Catalog tiles not found in the archive.
    pub missing: Vec<&'static str>,
}

impl ExtractStats {
    /// Whether every catalog tile was extracted.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Extract the catalog tiles from a ZIP archive on disk into `dest`.
///
/// The destination directory is created if needed. Existing tile files are
/// overwritten.
///
/// # Errors
///
/// Returns [`GlobeError::Archive`] if the archive cannot be read, or an I/O
/// error if writing a tile fails.
pub fn extract_tiles<P, Q>(archive: P, dest: Q, catalog: &TileCatalog) -> Result<ExtractStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let file = File::open(archive.as_ref())?;
    extract_tiles_from_reader(BufReader::new(file), dest, catalog)
}

/// Extract the catalog tiles from any seekable ZIP stream into `dest`.
pub fn extract_tiles_from_reader<R, Q>(reader: R, dest: Q, catalog: &TileCatalog) -> Result<ExtractStats>
where
    R: Read + Seek,
    Q: AsRef<Path>,
{
    let dest = dest.as_ref();
    let mut archive = ZipArchive::new(reader).map_err(|e| GlobeError::Archive {
        message: format!("Failed to read ZIP archive: {}", e),
    })?;

    fs::create_dir_all(dest)?;

    let mut stats = ExtractStats::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| GlobeError::Archive {
            message: format!("Failed to read ZIP entry {}: {}", i, e),
        })?;

        let tile = if entry.is_dir() {
            None
        } else {
            entry_basename(entry.name()).and_then(|name| catalog.get(name))
        };

        let Some(tile) = tile else {
            stats.skipped += 1;
            continue;
        };

        let path = dest.join(tile.name);
        let mut out = File::create(&path)?;
        let written = io::copy(&mut entry, &mut out)?;

        if written != tile.file_size() {
            tracing::warn!(
                tile = tile.name,
                size = written,
                expected = tile.file_size(),
                "Extracted tile size does not match catalog"
            );
        }
        tracing::debug!(tile = tile.name, path = %path.display(), "Extracted tile");

        if !stats.extracted.contains(&tile.name) {
            stats.extracted.push(tile.name);
        }
    }

    stats.missing = catalog
        .tiles()
        .iter()
        .map(|tile| tile.name)
        .filter(|name| !stats.extracted.contains(name))
        .collect();

    Ok(stats)
}

/// Last path component of an archive entry name.
fn entry_basename(name: &str) -> Option<&str> {
    name.rsplit(['/', '\\']).next().filter(|s| !s.is_empty())
}
