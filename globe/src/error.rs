//! Error types for the globe library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when querying GLOBE elevation data.
#[derive(Error, Debug)]
pub enum GlobeError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// None of the configured data directories exists.
    #[error("Data directory '{path}' does not exist")]
    DataDirectoryMissing { path: PathBuf },

    /// A tile file is absent or unreadable in the data directory.
    #[error("Data file '{path}' is missing or unreadable: {reason}")]
    DataFileMissing { path: PathBuf, reason: String },

    /// No catalog tile contains the coordinates.
    #[error("No tile for location: lon={lon}, lat={lat}")]
    NoTileForLocation { lon: f64, lat: f64 },

    /// Fewer than two bytes were available at the sample offset.
    #[error("Short read in tile {tile} at byte offset {offset}")]
    ShortRead { tile: String, offset: u64 },

    /// A bounding box encloses more grid points than allowed.
    #[error("Bounding box covers {count} grid points (maximum {max})")]
    TooManyPoints { count: u64, max: u64 },

    /// The input could not be turned into a finite coordinate.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// A tile archive could not be read.
    #[error("Archive error: {message}")]
    Archive { message: String },
}

/// Result type alias using [`GlobeError`].
pub type Result<T> = std::result::Result<T, GlobeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GlobeError::TooManyPoints {
            count: 2_000_000,
            max: 1_000_000,
        };
        assert!(err.to_string().contains("2000000"));

        let err = GlobeError::NoTileForLocation {
            lon: 200.0,
            lat: 0.0,
        };
        assert!(err.to_string().contains("200"));

        let err = GlobeError::DataFileMissing {
            path: PathBuf::from("/data/a10g"),
            reason: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("a10g"));

        let err = GlobeError::ShortRead {
            tile: "e10g".to_string(),
            offset: 42,
        };
        assert!(err.to_string().contains("e10g"));
        assert!(err.to_string().contains("42"));
    }
}
