//! Caller-supplied location shapes.
//!
//! Front ends receive locations in loose forms: `[lon, lat]` pairs, objects
//! with named fields, numeric strings, pairs of corners, or values that are
//! only computed when needed. [`LocationInput`] captures those shapes and
//! [`LocationInput::resolve`] turns them into a normalized [`Location`].
//!
//! ```
//! use globe::{Location, LocationInput};
//!
//! let point = LocationInput::pair(11.1416, "51.7894");
//! assert!(matches!(point.resolve(), Ok(Location::Point(_))));
//!
//! let area = LocationInput::corners(
//!     LocationInput::named(-106.6, 35.0),
//!     LocationInput::pair(-106.5, 35.1),
//! );
//! assert!(matches!(area.resolve(), Ok(Location::BoundingBox(_))));
//! ```

use std::fmt;

use crate::coord::{BoundingBox, Coordinate, Location};
use crate::error::{GlobeError, Result};

type DeferredValue = Box<dyn Fn() -> CoordValue + Send + Sync>;
type DeferredLocation = Box<dyn Fn() -> LocationInput + Send + Sync>;

/// A single coordinate value as supplied by a caller.
pub enum CoordValue {
    /// A plain number.
    Number(f64),
    /// A number in text form, parsed on resolution.
    Text(String),
    /// A value computed on resolution.
    Deferred(DeferredValue),
}

impl CoordValue {
    /// Wrap a closure producing the value.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> CoordValue + Send + Sync + 'static,
    {
        CoordValue::Deferred(Box::new(f))
    }

    /// The numeric value, or `None` if it is not a finite number.
    pub fn resolve(&self) -> Option<f64> {
        let value = match self {
            CoordValue::Number(n) => *n,
            CoordValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CoordValue::Deferred(f) => f().resolve()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for CoordValue {
    fn from(n: f64) -> Self {
        CoordValue::Number(n)
    }
}

impl From<i32> for CoordValue {
    fn from(n: i32) -> Self {
        CoordValue::Number(f64::from(n))
    }
}

impl From<&str> for CoordValue {
    fn from(s: &str) -> Self {
        CoordValue::Text(s.to_string())
    }
}

impl From<String> for CoordValue {
    fn from(s: String) -> Self {
        CoordValue::Text(s)
    }
}

impl fmt::Debug for CoordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            CoordValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            CoordValue::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// A location as supplied by a caller.
pub enum LocationInput {
    /// An ordered `[lon, lat]` pair.
    Pair(CoordValue, CoordValue),
    /// An object with named longitude and latitude fields.
    Named { lon: CoordValue, lat: CoordValue },
    /// Two opposite corners of a bounding box.
    Corners(Box<LocationInput>, Box<LocationInput>),
    /// A location computed on resolution.
    Deferred(DeferredLocation),
}

impl LocationInput {
    /// An ordered `[lon, lat]` pair.
    pub fn pair(lon: impl Into<CoordValue>, lat: impl Into<CoordValue>) -> Self {
        LocationInput::Pair(lon.into(), lat.into())
    }

    /// A named-field point.
    pub fn named(lon: impl Into<CoordValue>, lat: impl Into<CoordValue>) -> Self {
        LocationInput::Named {
            lon: lon.into(),
            lat: lat.into(),
        }
    }

    /// A bounding box between two corner points.
    pub fn corners(a: LocationInput, b: LocationInput) -> Self {
        LocationInput::Corners(Box::new(a), Box::new(b))
    }

    /// Wrap a closure producing the location.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> LocationInput + Send + Sync + 'static,
    {
        LocationInput::Deferred(Box::new(f))
    }

    /// Resolve into a normalized point or bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`GlobeError::InvalidCoordinate`] if a value is missing, not
    /// numeric or not finite, or if a box corner is itself a box.
    pub fn resolve(&self) -> Result<Location> {
        match self {
            LocationInput::Pair(lon, lat) | LocationInput::Named { lon, lat } => {
                Ok(Location::Point(resolve_point(lon, lat)?))
            }
            LocationInput::Corners(a, b) => {
                let a = a.resolve_corner()?;
                let b = b.resolve_corner()?;
                Ok(Location::BoundingBox(BoundingBox::new(a, b)))
            }
            LocationInput::Deferred(f) => f().resolve(),
        }
    }

    fn resolve_corner(&self) -> Result<Coordinate> {
        match self.resolve()? {
            Location::Point(coord) => Ok(coord),
            Location::BoundingBox(_) => Err(GlobeError::InvalidCoordinate {
                message: "bounding box corner must be a point".to_string(),
            }),
        }
    }
}

fn resolve_point(lon: &CoordValue, lat: &CoordValue) -> Result<Coordinate> {
    let invalid = |axis: &str, value: &CoordValue| GlobeError::InvalidCoordinate {
        message: format!("{} is not a finite number: {:?}", axis, value),
    };

    let lon_value = lon.resolve().ok_or_else(|| invalid("longitude", lon))?;
    let lat_value = lat.resolve().ok_or_else(|| invalid("latitude", lat))?;
    Coordinate::new(lon_value, lat_value)
}

impl From<(f64, f64)> for LocationInput {
    /// `(lon, lat)`
    fn from((lon, lat): (f64, f64)) -> Self {
        LocationInput::pair(lon, lat)
    }
}

impl fmt::Debug for LocationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationInput::Pair(lon, lat) => f.debug_tuple("Pair").field(lon).field(lat).finish(),
            LocationInput::Named { lon, lat } => f
                .debug_struct("Named")
                .field("lon", lon)
                .field("lat", lat)
                .finish(),
            LocationInput::Corners(a, b) => f.debug_tuple("Corners").field(a).field(b).finish(),
            LocationInput::Deferred(_) => f.write_str("Deferred"),
        }
    }
}
