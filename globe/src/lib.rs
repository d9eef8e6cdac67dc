//! # globe - GLOBE Elevation Library
//!
//! Elevation lookups against the NOAA GLOBE 30 arc-second digital elevation
//! model, for single points and as the mean over a bounding box.
//!
//! ## Features
//!
//! - **Fast**: Memory-mapped tiles, one file read per sample
//! - **Bounded resources**: Tile handles close after an idle timeout
//! - **Exact grid**: Queries snap to cell centres on an integer grid
//! - **Antimeridian aware**: Boxes may wrap across ±180° longitude
//!
//! ## Quick Start
//!
//! ```ignore
//! use globe::{BoundingBox, Coordinate, GlobeService};
//!
//! let service = GlobeService::new("/usr/share/GLOBE-elevation")?;
//!
//! let point = Coordinate::new(11.1416, 51.7894)?;
//! println!("Elevation: {}m", service.point_elevation(&point)?);
//!
//! let area = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1))?;
//! println!("Mean elevation: {:.2}m", service.mean_elevation(&area)?);
//! ```
//!
//! ## GLOBE Data Format
//!
//! The dataset is split into sixteen tiles, `a10g` to `p10g`, each covering
//! 90° of longitude and 40° or 50° of latitude:
//!
//! - 10800 columns, 4800 or 6000 rows, 120 samples per degree
//! - Rows ordered north to south, columns west to east
//! - 16-bit little-endian signed integers, elevation in meters
//!
//! The value -500 marks ocean and is reported as 0.
//!
//! ## Data Sources
//!
//! Download `all10g.zip` from
//! <https://www.ngdc.noaa.gov/mgg/topo/gltiles.html> and unpack it with
//! [`archive::extract_tiles`] or `globe extract`.

pub mod archive;
pub mod cache;
pub mod catalog;
pub mod coord;
pub mod datadir;
pub mod error;
pub mod grid;
pub mod input;
pub mod service;
pub mod tile;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use cache::CacheStats;
pub use catalog::{TileCatalog, TileDescriptor, GLOBE_TILES, RESOLUTION};
pub use coord::{BoundingBox, Coordinate, Location};
pub use error::{GlobeError, Result};
pub use input::{CoordValue, LocationInput};
pub use service::{GlobeService, GlobeServiceBuilder};
pub use tile::OCEAN_VALUE;
