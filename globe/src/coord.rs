//! Coordinate normalization and bounding boxes.
//!
//! Every query is snapped to the centre of a 30 arc-second grid cell before
//! any tile is consulted. A [`Coordinate`] stores the cell as a pair of
//! integer grid indices, so normalization is exact and idempotent and box
//! enumeration never accumulates floating-point drift.
//!
//! The index `i` of an axis maps to the cell-centre value
//! `i / RESOLUTION - HALF_STEP`, i.e. index 1 is the cell just north (east)
//! of 0°.

use std::fmt;

use crate::catalog::RESOLUTION;
use crate::error::{GlobeError, Result};

/// Grid step in degrees.
pub const STEP: f64 = 1.0 / RESOLUTION as f64;

/// Offset from a grid line to the centre of a cell.
pub const HALF_STEP: f64 = STEP / 2.0;

const MIN_LAT_INDEX: i64 = -90 * RESOLUTION + 1;
const MAX_LAT_INDEX: i64 = 90 * RESOLUTION;
const MIN_LON_INDEX: i64 = -180 * RESOLUTION + 1;
const MAX_LON_INDEX: i64 = 180 * RESOLUTION;
const HALF_TURN: i64 = 180 * RESOLUTION;
const FULL_TURN: i64 = 360 * RESOLUTION;

/// Snap a coordinate value to the index of the nearest cell centre.
///
/// Computes `round((value + HALF_STEP) * RESOLUTION)` with ties rounded
/// towards positive infinity.
pub fn coord_to_index(value: f64) -> i64 {
    ((value + HALF_STEP) * RESOLUTION as f64 + 0.5).floor() as i64
}

/// Cell-centre value of a grid index.
pub fn index_to_coord(index: i64) -> f64 {
    index as f64 / RESOLUTION as f64 - HALF_STEP
}

/// Mirror a longitude index by half a turn.
///
/// Western longitudes move east by 180°, eastern ones move west. Applying it
/// twice returns the original index.
fn mirror_lon_index(index: i64) -> i64 {
    if index <= 0 {
        index + HALF_TURN
    } else {
        index - HALF_TURN
    }
}

/// Inclusive count of indices in `lo..=hi`.
fn span(lo: i64, hi: i64) -> u64 {
    hi.checked_sub(lo)
        .and_then(|d| d.checked_add(1))
        .map_or(u64::MAX, |n| n as u64)
}

/// A longitude/latitude pair snapped to the centre of a grid cell.
///
/// Latitude is clamped to `[-90 + HALF_STEP, 90 - HALF_STEP]` and longitude
/// wrapped once into `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    lon_index: i64,
    lat_index: i64,
}

impl Coordinate {
    /// Normalize a raw longitude/latitude pair.
    ///
    /// # Errors
    ///
    /// Returns [`GlobeError::InvalidCoordinate`] if either value is NaN or
    /// infinite.
    ///
    /// # Example
    ///
    /// ```
    /// use globe::Coordinate;
    ///
    /// let c = Coordinate::new(0.0, 0.0).unwrap();
    /// assert!((c.lon() - 1.0 / 240.0).abs() < 1e-12);
    /// assert_eq!(Coordinate::new(c.lon(), c.lat()).unwrap(), c);
    /// ```
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GlobeError::InvalidCoordinate {
                message: format!("non-finite coordinate (lon={}, lat={})", lon, lat),
            });
        }

        let lat_index = coord_to_index(lat).clamp(MIN_LAT_INDEX, MAX_LAT_INDEX);

        let mut lon_index = coord_to_index(lon);
        if lon_index < MIN_LON_INDEX {
            lon_index += FULL_TURN;
        } else if lon_index > MAX_LON_INDEX {
            lon_index -= FULL_TURN;
        }

        Ok(Self {
            lon_index,
            lat_index,
        })
    }

    pub(crate) fn from_indices(lon_index: i64, lat_index: i64) -> Self {
        Self {
            lon_index,
            lat_index,
        }
    }

    /// Longitude of the cell centre in degrees.
    pub fn lon(&self) -> f64 {
        index_to_coord(self.lon_index)
    }

    /// Latitude of the cell centre in degrees.
    pub fn lat(&self) -> f64 {
        index_to_coord(self.lat_index)
    }

    /// Longitude grid index.
    pub fn lon_index(&self) -> i64 {
        self.lon_index
    }

    /// Latitude grid index.
    pub fn lat_index(&self) -> i64 {
        self.lat_index
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon(), self.lat())
    }
}

/// An inclusive box of grid cells between two corners.
///
/// When the corners lie on opposite sides of the antimeridian (opposite
/// longitude signs, at least 180° apart) the box is built in mirrored
/// longitude space, where it is contiguous, and every enumerated longitude is
/// mirrored back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    min_lon_index: i64,
    max_lon_index: i64,
    min_lat_index: i64,
    max_lat_index: i64,
    crosses_antimeridian: bool,
}

impl BoundingBox {
    /// Create a box from two opposite corners, in either order.
    pub fn new(a: Coordinate, b: Coordinate) -> Self {
        let crosses_antimeridian =
            a.lon() * b.lon() < 0.0 && (a.lon() - b.lon()).abs() >= 180.0;

        let (lon_a, lon_b) = if crosses_antimeridian {
            (mirror_lon_index(a.lon_index), mirror_lon_index(b.lon_index))
        } else {
            (a.lon_index, b.lon_index)
        };

        Self {
            min_lon_index: lon_a.min(lon_b),
            max_lon_index: lon_a.max(lon_b),
            min_lat_index: a.lat_index.min(b.lat_index),
            max_lat_index: a.lat_index.max(b.lat_index),
            crosses_antimeridian,
        }
    }

    /// Create a box from raw corner coordinates `(lon, lat)`.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Result<Self> {
        Ok(Self::new(
            Coordinate::new(a.0, a.1)?,
            Coordinate::new(b.0, b.1)?,
        ))
    }

    /// Whether the box wraps across ±180° longitude.
    pub fn crosses_antimeridian(&self) -> bool {
        self.crosses_antimeridian
    }

    /// Number of grid points enclosed, both edges included.
    ///
    /// Saturates at `u64::MAX` for corners far outside one turn of longitude.
    pub fn point_count(&self) -> u64 {
        let columns = span(self.min_lon_index, self.max_lon_index);
        let rows = span(self.min_lat_index, self.max_lat_index);
        columns.saturating_mul(rows)
    }

    /// South-west corner cell.
    pub fn south_west(&self) -> Coordinate {
        Coordinate::from_indices(self.unmirror(self.min_lon_index), self.min_lat_index)
    }

    /// North-east corner cell.
    pub fn north_east(&self) -> Coordinate {
        Coordinate::from_indices(self.unmirror(self.max_lon_index), self.max_lat_index)
    }

    /// Iterate over every enclosed grid point exactly once.
    pub fn points(&self) -> impl Iterator<Item = Coordinate> {
        let bbox = *self;
        (bbox.min_lon_index..=bbox.max_lon_index).flat_map(move |lon_index| {
            let lon_index = bbox.unmirror(lon_index);
            (bbox.min_lat_index..=bbox.max_lat_index)
                .map(move |lat_index| Coordinate::from_indices(lon_index, lat_index))
        })
    }

    fn unmirror(&self, lon_index: i64) -> i64 {
        if self.crosses_antimeridian {
            mirror_lon_index(lon_index)
        } else {
            lon_index
        }
    }
}

/// A query: a single point, or the mean over a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A single grid cell.
    Point(Coordinate),
    /// Every grid cell inside a box.
    BoundingBox(BoundingBox),
}

impl From<Coordinate> for Location {
    fn from(coord: Coordinate) -> Self {
        Location::Point(coord)
    }
}

impl From<BoundingBox> for Location {
    fn from(bbox: BoundingBox) -> Self {
        Location::BoundingBox(bbox)
    }
}
