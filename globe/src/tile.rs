//! Tile file access and sample decoding.
//!
//! This module provides [`TileHandle`], a read-only memory map of one GLOBE
//! tile file, and the decoding of its samples.
//!
//! Tile files are flat row-major grids of 16-bit little-endian signed
//! integers, rows ordered north to south. The value [`OCEAN_VALUE`] marks
//! ocean / no data and is reported as elevation 0.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{GlobeError, Result};
use crate::grid::SAMPLE_SIZE;

/// Raw value marking ocean or missing data in GLOBE files.
pub const OCEAN_VALUE: i16 = -500;

/// Map a raw sample to an elevation in meters.
///
/// The ocean sentinel becomes 0; every other value, including legitimate
/// below-sea-level terrain, is returned unchanged.
pub fn decode_sample(raw: i16) -> i16 {
    if raw == OCEAN_VALUE {
        0
    } else {
        raw
    }
}

/// A memory-mapped tile file.
pub struct TileHandle {
    /// Tile name, used in errors.
    name: &'static str,
    /// Memory-mapped file data
    data: Mmap,
}

impl TileHandle {
    /// Map a tile file read-only.
    pub fn open<P: AsRef<Path>>(path: P, name: &'static str) -> std::io::Result<Self> {
        let file = File::open(&path)?;

        // SAFETY: Memory mapping is safe as long as the file is not modified
        // while mapped. We open the file read-only and don't expose the mapping.
        let data = unsafe { Mmap::map(&file)? };

        Ok(Self { name, data })
    }

    /// Name of the tile this handle maps.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Length of the mapped file in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns `true` if the mapped file is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read the raw 16-bit little-endian value at a byte offset.
    ///
    /// # Errors
    ///
    /// Returns [`GlobeError::ShortRead`] if fewer than two bytes are
    /// available at `offset`.
    pub fn read_raw(&self, offset: u64) -> Result<i16> {
        let start = usize::try_from(offset).ok();
        let bytes = start
            .and_then(|start| self.data.get(start..start.checked_add(SAMPLE_SIZE as usize)?));

        match bytes {
            Some(&[lo, hi]) => Ok(i16::from_le_bytes([lo, hi])),
            _ => Err(GlobeError::ShortRead {
                tile: self.name.to_string(),
                offset,
            }),
        }
    }

    /// Read the elevation sample at a byte offset.
    pub fn read_sample(&self, offset: u64) -> Result<i16> {
        self.read_raw(offset).map(decode_sample)
    }

    /// Iterate over every raw value in file order.
    pub fn raw_values(&self) -> impl Iterator<Item = i16> + '_ {
        self.data
            .chunks_exact(SAMPLE_SIZE as usize)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

impl std::fmt::Debug for TileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileHandle")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}
