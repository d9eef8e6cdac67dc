//! The fixed GLOBE tile catalog.
//!
//! The GLOBE dataset partitions the sphere into sixteen tiles named `a10g`
//! through `p10g`: four longitude bands of 90° each, crossed with four
//! latitude bands (90°N–50°N, 50°N–0°, 0°–50°S, 50°S–90°S).
//!
//! # Boundary convention
//!
//! Every tile covers the half-open box `[lat_min, lat_max) × [lon_min, lon_max)`,
//! except that the global northern edge (90°) and eastern edge (180°) are
//! inclusive so the whole closed range `[-90, 90] × [-180, 180]` is covered.
//! A point on a shared boundary belongs to the tile north / east of it.

/// Number of samples per degree of latitude and longitude (30 arc-seconds).
pub const RESOLUTION: i64 = 120;

/// Metadata describing one GLOBE tile file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDescriptor {
    /// File name of the tile inside the data directory.
    pub name: &'static str,
    /// Southern boundary in degrees.
    pub lat_min: i32,
    /// Northern boundary in degrees.
    pub lat_max: i32,
    /// Western boundary in degrees.
    pub lon_min: i32,
    /// Eastern boundary in degrees.
    pub lon_max: i32,
    /// Declared minimum elevation (informational).
    pub elevation_min: i16,
    /// Declared maximum elevation (informational).
    pub elevation_max: i16,
    /// Samples per row.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
}

impl TileDescriptor {
    /// Check whether the tile covers the given point.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let lat_ok = lat >= f64::from(self.lat_min)
            && (lat < f64::from(self.lat_max) || (self.lat_max == 90 && lat == 90.0));
        let lon_ok = lon >= f64::from(self.lon_min)
            && (lon < f64::from(self.lon_max) || (self.lon_max == 180 && lon == 180.0));

        lat_ok && lon_ok
    }

    /// Expected size of the tile file in bytes (2 bytes per sample).
    pub fn file_size(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.columns) * 2
    }

    /// Total number of samples in the tile.
    pub fn sample_count(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.columns)
    }
}

macro_rules! tile {
    ($name:literal, $lat_min:literal, $lat_max:literal, $lon_min:literal, $lon_max:literal,
     $el_min:literal, $el_max:literal, $rows:literal) => {
        TileDescriptor {
            name: $name,
            lat_min: $lat_min,
            lat_max: $lat_max,
            lon_min: $lon_min,
            lon_max: $lon_max,
            elevation_min: $el_min,
            elevation_max: $el_max,
            columns: 10800,
            rows: $rows,
        }
    };
}

/// The sixteen GLOBE tiles, ordered north-west to south-east.
///
/// Hastings, D. A., et al., eds., 1999. The Global Land One-kilometer Base
/// Elevation (GLOBE) Digital Elevation Model, Version 1.0. NOAA National
/// Geophysical Data Center.
pub static GLOBE_TILES: [TileDescriptor; 16] = [
    tile!("a10g", 50, 90, -180, -90, 1, 6098, 4800),
    tile!("b10g", 50, 90, -90, 0, 1, 3940, 4800),
    tile!("c10g", 50, 90, 0, 90, -30, 4010, 4800),
    tile!("d10g", 50, 90, 90, 180, 1, 4588, 4800),
    tile!("e10g", 0, 50, -180, -90, -84, 5443, 6000),
    tile!("f10g", 0, 50, -90, 0, -40, 6085, 6000),
    tile!("g10g", 0, 50, 0, 90, -407, 8752, 6000),
    tile!("h10g", 0, 50, 90, 180, -63, 7491, 6000),
    tile!("i10g", -50, 0, -180, -90, 1, 2732, 6000),
    tile!("j10g", -50, 0, -90, 0, -127, 6798, 6000),
    tile!("k10g", -50, 0, 0, 90, 1, 5825, 6000),
    tile!("l10g", -50, 0, 90, 180, 1, 5179, 6000),
    tile!("m10g", -90, -50, -180, -90, 1, 4009, 4800),
    tile!("n10g", -90, -50, -90, 0, 1, 4743, 4800),
    tile!("o10g", -90, -50, 0, 90, 1, 4039, 4800),
    tile!("p10g", -90, -50, 90, 180, 1, 4363, 4800),
];

/// Read-only view over a set of tile descriptors.
#[derive(Debug, Clone, Copy)]
pub struct TileCatalog {
    tiles: &'static [TileDescriptor],
}

impl TileCatalog {
    /// The standard GLOBE catalog.
    pub const fn globe() -> Self {
        Self {
            tiles: &GLOBE_TILES,
        }
    }

    /// All descriptors in catalog order.
    pub fn tiles(&self) -> &'static [TileDescriptor] {
        self.tiles
    }

    /// Number of tiles in the catalog.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns `true` if the catalog has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Find the tile whose bounds contain the point.
    ///
    /// A linear scan; the catalog is small enough that no index is needed.
    pub fn find(&self, lon: f64, lat: f64) -> Option<&'static TileDescriptor> {
        self.tiles.iter().find(|tile| tile.contains(lon, lat))
    }

    /// Look up a tile by file name.
    pub fn get(&self, name: &str) -> Option<&'static TileDescriptor> {
        self.tiles.iter().find(|tile| tile.name == name)
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::globe()
    }
}
