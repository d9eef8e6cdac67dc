//! Tile location and byte-offset calculation.
//!
//! Tile files store rows from north to south, while grid rows are counted
//! from the tile's southern edge, so the row index is inverted when computing
//! the file offset.

use crate::catalog::{TileCatalog, TileDescriptor, RESOLUTION};
use crate::coord::Coordinate;
use crate::error::{GlobeError, Result};

/// Size of one sample in bytes.
pub const SAMPLE_SIZE: u64 = 2;

/// Position of a cell inside a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    /// Row counted from the southern edge of the tile.
    pub row_index: u32,
    /// Column counted from the western edge of the tile.
    pub column_index: u32,
}

impl TileDescriptor {
    /// Grid position of a normalized coordinate within this tile.
    ///
    /// Returns `None` if the coordinate lies outside the tile.
    pub fn grid_position(&self, coord: &Coordinate) -> Option<GridPosition> {
        // floor(value * RESOLUTION) for a cell centre at index i is i - 1
        let column = coord.lon_index() - 1;
        let row = coord.lat_index() - 1;

        let row_index = row - i64::from(self.lat_min) * RESOLUTION;
        let column_index = column - i64::from(self.lon_min) * RESOLUTION;

        if !(0..i64::from(self.rows)).contains(&row_index)
            || !(0..i64::from(self.columns)).contains(&column_index)
        {
            return None;
        }

        Some(GridPosition {
            row_index: row_index as u32,
            column_index: column_index as u32,
        })
    }

    /// Byte offset of the sample for a grid position.
    pub fn offset_of(&self, position: GridPosition) -> u64 {
        let file_row = u64::from(self.rows - position.row_index - 1);
        (file_row * u64::from(self.columns) + u64::from(position.column_index)) * SAMPLE_SIZE
    }

    /// Byte offset of the sample for a normalized coordinate.
    pub fn byte_offset(&self, coord: &Coordinate) -> Option<u64> {
        self.grid_position(coord).map(|position| self.offset_of(position))
    }
}

/// Find the tile containing a normalized coordinate.
///
/// # Errors
///
/// Returns [`GlobeError::NoTileForLocation`] if no tile contains the point,
/// which only happens for longitudes more than one turn outside ±180°.
pub fn locate(catalog: &TileCatalog, coord: &Coordinate) -> Result<&'static TileDescriptor> {
    catalog
        .find(coord.lon(), coord.lat())
        .ok_or(GlobeError::NoTileForLocation {
            lon: coord.lon(),
            lat: coord.lat(),
        })
}

/// Find the tile and sample offset for a normalized coordinate.
pub fn resolve(catalog: &TileCatalog, coord: &Coordinate) -> Result<(&'static TileDescriptor, u64)> {
    let tile = locate(catalog, coord)?;
    let offset = tile
        .byte_offset(coord)
        .ok_or(GlobeError::NoTileForLocation {
            lon: coord.lon(),
            lat: coord.lat(),
        })?;

    Ok((tile, offset))
}
