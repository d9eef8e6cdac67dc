//! GLOBE elevation service with cached tile handles.
//!
//! This module provides [`GlobeService`], the context object every query runs
//! through. It owns the immutable tile catalog and the handle cache, answers
//! point and bounding-box queries, and can be reconfigured at runtime.
//!
//! ```ignore
//! use globe::{BoundingBox, Coordinate, GlobeServiceBuilder};
//!
//! let service = GlobeServiceBuilder::new("/data/globe")
//!     .file_open_timeout_ms(60_000)
//!     .build()?;
//!
//! let brocken = Coordinate::new(10.6157, 51.7991)?;
//! let elevation = service.point_elevation(&brocken)?;
//!
//! let area = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1))?;
//! let mean = service.mean_elevation(&area)?;
//! ```

use std::path::{Path, PathBuf};

use crate::cache::{CacheStats, HandleCache};
use crate::catalog::TileCatalog;
use crate::coord::{BoundingBox, Coordinate, Location};
use crate::datadir::{resolve_data_dir, DEFAULT_DATA_DIRS};
use crate::error::{GlobeError, Result};
use crate::grid;

/// Default idle time before a tile handle is closed, in milliseconds.
pub const DEFAULT_FILE_OPEN_TIMEOUT_MS: i64 = 1000;

/// Default maximum number of grid points in a bounding-box query.
pub const DEFAULT_MAX_POINTS: u64 = 1_000_000;

/// High-level elevation service over a GLOBE data directory.
///
/// # Example
///
/// ```ignore
/// use globe::{Coordinate, GlobeService};
///
/// let service = GlobeService::new("/path/to/globe")?;
///
/// let point = Coordinate::new(11.1416, 51.7894)?;
/// println!("Elevation: {}m", service.point_elevation(&point)?);
///
/// let stats = service.cache_stats();
/// println!("Cache hit rate: {:.1}%", stats.hit_rate() * 100.0);
/// ```
pub struct GlobeService {
    /// Tile catalog.
    catalog: TileCatalog,
    /// Directory containing the tile files.
    data_dir: PathBuf,
    /// Open tile handles.
    handles: HandleCache,
    /// Idle timeout the handle cache was built with.
    file_open_timeout_ms: i64,
    /// Maximum number of grid points in a bounding-box query.
    max_points: u64,
    /// Close every handle after each top-level query.
    auto_close: bool,
}

impl GlobeService {
    /// Create a service over `data_dir` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing or lacks a tile file.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        GlobeServiceBuilder::new(data_dir).build()
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> GlobeServiceBuilder {
        GlobeServiceBuilder::new(data_dir)
    }

    /// Elevation for a point or the mean elevation over a bounding box.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let point = Coordinate::new(0.0, 0.0)?;
    /// assert_eq!(service.elevation(point)?, 0.0); // open ocean
    /// ```
    pub fn elevation<L: Into<Location>>(&self, location: L) -> Result<f64> {
        let result = match location.into() {
            Location::Point(coord) => self.read_point(&coord).map(f64::from),
            Location::BoundingBox(bbox) => self.read_mean(&bbox),
        };
        self.finish();
        result
    }

    /// Elevation sample at a normalized coordinate, in meters.
    ///
    /// Ocean cells report 0.
    ///
    /// # Errors
    ///
    /// - [`GlobeError::NoTileForLocation`] if no tile covers the point
    /// - [`GlobeError::DataFileMissing`] if the tile file cannot be opened
    /// - [`GlobeError::ShortRead`] if the tile file is truncated
    pub fn point_elevation(&self, coord: &Coordinate) -> Result<i16> {
        let result = self.read_point(coord);
        self.finish();
        result
    }

    /// Elevation at a raw longitude/latitude, normalized first.
    pub fn elevation_at(&self, lon: f64, lat: f64) -> Result<i16> {
        self.point_elevation(&Coordinate::new(lon, lat)?)
    }

    /// Mean elevation over every grid point in a bounding box.
    ///
    /// The first failing sample aborts the whole query; no partial mean is
    /// ever returned.
    ///
    /// # Errors
    ///
    /// Returns [`GlobeError::TooManyPoints`] before reading anything if the
    /// box encloses more than [`Self::max_points`] grid points, or the first
    /// error of any sample read.
    pub fn mean_elevation(&self, bbox: &BoundingBox) -> Result<f64> {
        let result = self.read_mean(bbox);
        self.finish();
        result
    }

    fn read_point(&self, coord: &Coordinate) -> Result<i16> {
        let (tile, offset) = grid::resolve(&self.catalog, coord)?;
        self.handles.read_sample(tile.name, offset)
    }

    fn read_mean(&self, bbox: &BoundingBox) -> Result<f64> {
        let count = bbox.point_count();
        if count > self.max_points {
            return Err(GlobeError::TooManyPoints {
                count,
                max: self.max_points,
            });
        }

        let mut sum: i64 = 0;
        for coord in bbox.points() {
            sum += i64::from(self.read_point(&coord)?);
        }

        Ok(sum as f64 / count as f64)
    }

    /// End of a top-level query: close every handle when auto-close is on.
    fn finish(&self) {
        if self.auto_close {
            self.handles.close_all();
        }
    }

    /// Get elevations for a batch of raw `(lon, lat)` coordinates.
    ///
    /// Returns one value per input coordinate, using `default` for any
    /// coordinate whose lookup fails.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let coords = vec![(11.1416, 51.7894), (0.0, 0.0)];
    /// let elevations = service.point_elevations(&coords, i16::MIN);
    /// ```
    pub fn point_elevations(&self, coords: &[(f64, f64)], default: i16) -> Vec<i16> {
        let elevations: Vec<i16> = coords
            .iter()
            .map(|&(lon, lat)| {
                Coordinate::new(lon, lat)
                    .and_then(|coord| self.read_point(&coord))
                    .unwrap_or(default)
            })
            .collect();
        self.finish();
        elevations
    }

    /// Apply a new configuration.
    ///
    /// All cached handles are closed first. If the new data directory is not
    /// usable, the error is returned and the previous directory stays active.
    pub fn reconfigure(&mut self, builder: GlobeServiceBuilder) -> Result<()> {
        self.handles.close_all();

        let data_dir = resolve_data_dir(&builder.data_dirs, &self.catalog)?;
        let handles = HandleCache::new(
            &data_dir,
            builder.file_open_timeout_ms,
            self.catalog.len() as u64,
        )?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            file_open_timeout_ms = builder.file_open_timeout_ms,
            max_points = builder.max_points,
            "Reconfigured elevation service"
        );

        self.handles = handles;
        self.data_dir = data_dir;
        self.file_open_timeout_ms = builder.file_open_timeout_ms;
        self.max_points = builder.max_points;
        self.auto_close = builder.auto_close;

        Ok(())
    }

    /// Close every cached tile handle.
    pub fn close_all(&self) {
        self.handles.close_all();
    }

    /// Get cache statistics.
    ///
    /// Returns information about handle usage including hit rate.
    pub fn cache_stats(&self) -> CacheStats {
        self.handles.stats()
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Idle timeout for tile handles in milliseconds (`<= 0`: caching disabled).
    pub fn file_open_timeout_ms(&self) -> i64 {
        self.file_open_timeout_ms
    }

    /// Maximum number of grid points in a bounding-box query.
    pub fn max_points(&self) -> u64 {
        self.max_points
    }

    /// Whether handles are closed after every top-level query.
    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    /// The tile catalog.
    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }
}

/// Builder for creating [`GlobeService`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use globe::GlobeServiceBuilder;
///
/// let service = GlobeServiceBuilder::new("/data/globe")
///     .candidate("/mnt/backup/globe")
///     .file_open_timeout_ms(0) // open and close per read
///     .max_points(250_000)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct GlobeServiceBuilder {
    data_dirs: Vec<PathBuf>,
    file_open_timeout_ms: i64,
    max_points: u64,
    auto_close: bool,
}

impl GlobeServiceBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dirs: vec![data_dir.as_ref().to_path_buf()],
            ..Self::default()
        }
    }

    /// Create a builder searching the given directories in order.
    pub fn with_candidates<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            data_dirs: candidates
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
            ..Self::default()
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GLOBE_DATA_DIR` | Data directory, or a list in `PATH` syntax | [`DEFAULT_DATA_DIRS`] |
    /// | `GLOBE_FILE_TIMEOUT_MS` | Idle timeout for tile handles (`<= 0` disables caching) | 1000 |
    /// | `GLOBE_MAX_POINTS` | Maximum grid points per bounding box | 1000000 |
    /// | `GLOBE_AUTO_CLOSE` | Close handles after every query (`true`/`false`) | false |
    ///
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut builder = Self::default();

        if let Some(dirs) = std::env::var_os("GLOBE_DATA_DIR") {
            let dirs: Vec<PathBuf> = std::env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !dirs.is_empty() {
                builder.data_dirs = dirs;
            }
        }

        if let Some(timeout) = std::env::var("GLOBE_FILE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            builder.file_open_timeout_ms = timeout;
        }

        if let Some(max_points) = std::env::var("GLOBE_MAX_POINTS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            builder.max_points = max_points;
        }

        if let Some(auto_close) = std::env::var("GLOBE_AUTO_CLOSE")
            .ok()
            .and_then(|s| parse_flag(&s))
        {
            builder.auto_close = auto_close;
        }

        builder
    }

    /// Set the data directory, replacing any candidates.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dirs = vec![path.as_ref().to_path_buf()];
        self
    }

    /// Append a fallback data directory.
    pub fn candidate<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Set the idle timeout for tile handles in milliseconds.
    ///
    /// Zero or negative disables caching. Default is 1000.
    pub fn file_open_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.file_open_timeout_ms = timeout_ms;
        self
    }

    /// Set the maximum number of grid points in a bounding-box query.
    ///
    /// Default is 1,000,000.
    pub fn max_points(mut self, max_points: u64) -> Self {
        self.max_points = max_points;
        self
    }

    /// Close every tile handle after each top-level query.
    ///
    /// Applies to [`GlobeService::elevation`], the point and box queries, and
    /// once per [`GlobeService::point_elevations`] batch. Suits one-shot
    /// callers that should not keep files open between queries. Default is false; the idle timeout closes handles instead.
    pub fn auto_close(mut self, auto_close: bool) -> Self {
        self.auto_close = auto_close;
        self
    }

    /// Candidate data directories, in search order.
    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    /// Build the [`GlobeService`].
    ///
    /// # Errors
    ///
    /// Returns the error of the first candidate if no data directory is
    /// usable.
    pub fn build(self) -> Result<GlobeService> {
        let catalog = TileCatalog::globe();
        let data_dir = resolve_data_dir(&self.data_dirs, &catalog)?;
        let handles = HandleCache::new(&data_dir, self.file_open_timeout_ms, catalog.len() as u64)?;

        Ok(GlobeService {
            catalog,
            data_dir,
            handles,
            file_open_timeout_ms: self.file_open_timeout_ms,
            max_points: self.max_points,
            auto_close: self.auto_close,
        })
    }
}

impl Default for GlobeServiceBuilder {
    /// Searches [`DEFAULT_DATA_DIRS`] with default settings.
    fn default() -> Self {
        Self {
            data_dirs: DEFAULT_DATA_DIRS.iter().map(PathBuf::from).collect(),
            file_open_timeout_ms: DEFAULT_FILE_OPEN_TIMEOUT_MS,
            max_points: DEFAULT_MAX_POINTS,
            auto_close: false,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::OCEAN_VALUE;
    use approx::assert_abs_diff_eq;
    use std::fs::{self, OpenOptions};
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::TempDir;

    /// Create all sixteen tiles as sparse, zero-filled files
    fn create_globe_dir(dir: &Path) {
        for tile in TileCatalog::globe().tiles() {
            let file = fs::File::create(dir.join(tile.name)).unwrap();
            file.set_len(tile.file_size()).unwrap();
        }
    }

    /// Write a raw sample at the cell containing (lon, lat)
    fn write_sample(dir: &Path, lon: f64, lat: f64, value: i16) {
        let coord = Coordinate::new(lon, lat).unwrap();
        let (tile, offset) = grid::resolve(&TileCatalog::globe(), &coord).unwrap();
        let mut file = OpenOptions::new()
            .write(true)
            .open(dir.join(tile.name))
            .unwrap();
        file.seek(SeekFrom::Start(offset)).unwrap();
        file.write_all(&value.to_le_bytes()).unwrap();
    }

    #[test]
    fn test_point_elevation() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), 11.1416, 51.7894, 123);

        let service = GlobeService::new(temp_dir.path()).unwrap();

        assert_eq!(service.elevation_at(11.1416, 51.7894).unwrap(), 123);
        // Same cell, different raw input
        assert_eq!(service.elevation_at(11.14, 51.79).unwrap(), 123);
        // Neighbouring cell untouched
        assert_eq!(service.elevation_at(11.15, 51.79).unwrap(), 0);
    }

    #[test]
    fn test_ocean_is_zero() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), 0.0, 0.0, OCEAN_VALUE);
        write_sample(temp_dir.path(), -30.0, -10.0, -12);

        let service = GlobeService::new(temp_dir.path()).unwrap();

        let point = Coordinate::new(0.0, 0.0).unwrap();
        assert_eq!(service.elevation(point).unwrap(), 0.0);
        assert_eq!(service.elevation_at(-30.0, -10.0).unwrap(), -12);
    }

    #[test]
    fn test_poles_and_seam() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), 0.0, 90.0, 2000);
        write_sample(temp_dir.path(), 0.0, -90.0, 2800);
        write_sample(temp_dir.path(), 180.0, 10.0, 5);

        let service = GlobeService::new(temp_dir.path()).unwrap();

        assert_eq!(service.elevation_at(0.0, 91.0).unwrap(), 2000);
        assert_eq!(service.elevation_at(0.0, -95.0).unwrap(), 2800);
        // 180° wraps onto the western edge
        assert_eq!(service.elevation_at(-180.0, 10.0).unwrap(), 5);
    }

    #[test]
    fn test_mean_elevation() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());

        let bbox = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1)).unwrap();
        for (i, point) in bbox.points().enumerate() {
            write_sample(temp_dir.path(), point.lon(), point.lat(), 1500 + i as i16);
        }

        let service = GlobeService::new(temp_dir.path()).unwrap();
        let mean = service.mean_elevation(&bbox).unwrap();

        // 169 points valued 1500..=1668
        assert_abs_diff_eq!(mean, 1584.0, epsilon = 1e-9);

        let reversed = BoundingBox::from_corners((-106.5, 35.1), (-106.6, 35.0)).unwrap();
        assert_eq!(service.mean_elevation(&reversed).unwrap(), mean);
    }

    #[test]
    fn test_degenerate_box_matches_point() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), 11.1416, 51.7894, 123);

        let service = GlobeService::new(temp_dir.path()).unwrap();
        let point = Coordinate::new(11.1416, 51.7894).unwrap();

        let from_point = service.elevation(point).unwrap();
        let from_box = service.elevation(BoundingBox::new(point, point)).unwrap();
        assert_eq!(from_point, 123.0);
        assert_eq!(from_box, from_point);
    }

    #[test]
    fn test_antimeridian_mean() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), -179.5, 67.7, 1000);
        write_sample(temp_dir.path(), 179.5, 67.7, 500);
        // Outside the box
        write_sample(temp_dir.path(), 0.0, 67.7, 30000);

        let service = GlobeService::new(temp_dir.path()).unwrap();
        let bbox = BoundingBox::from_corners((179.0, 67.5), (-179.0, 68.0)).unwrap();

        let mean = service.mean_elevation(&bbox).unwrap();
        assert_abs_diff_eq!(mean, 1500.0 / bbox.point_count() as f64, epsilon = 1e-12);
    }

    #[test]
    fn test_too_many_points() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());

        let service = GlobeServiceBuilder::new(temp_dir.path())
            .max_points(100)
            .build()
            .unwrap();

        let bbox = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1)).unwrap();
        match service.mean_elevation(&bbox) {
            Err(GlobeError::TooManyPoints { count, max }) => {
                assert_eq!(count, 169);
                assert_eq!(max, 100);
            }
            other => panic!("Expected TooManyPoints, got {:?}", other),
        }

        // Nothing was read
        let stats = service.cache_stats();
        assert_eq!(stats.hit_count + stats.miss_count, 0);
    }

    #[test]
    fn test_large_box_exceeds_default_cap() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());

        let service = GlobeService::new(temp_dir.path()).unwrap();
        let bbox = BoundingBox::from_corners((0.0, -80.0), (170.0, 80.0)).unwrap();
        assert!(matches!(
            service.mean_elevation(&bbox),
            Err(GlobeError::TooManyPoints { .. })
        ));
    }

    #[test]
    fn test_box_error_aborts_aggregation() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());

        let service = GlobeService::new(temp_dir.path()).unwrap();
        // Truncate a tile after validation so reads run past its end
        fs::File::create(temp_dir.path().join("e10g")).unwrap();
        service.close_all();

        let bbox = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1)).unwrap();
        assert!(matches!(
            service.mean_elevation(&bbox),
            Err(GlobeError::ShortRead { .. })
        ));
    }

    #[test]
    fn test_missing_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = GlobeService::new(temp_dir.path().join("missing"));
        assert!(matches!(
            result,
            Err(GlobeError::DataDirectoryMissing { .. })
        ));

        // Directory present, tiles absent
        let result = GlobeService::new(temp_dir.path());
        assert!(matches!(result, Err(GlobeError::DataFileMissing { .. })));
    }

    #[test]
    fn test_candidates_fall_back() {
        let empty = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        create_globe_dir(data.path());

        let service = GlobeServiceBuilder::new(empty.path())
            .candidate(data.path())
            .build()
            .unwrap();
        assert_eq!(service.data_dir(), data.path());
    }

    #[test]
    fn test_reconfigure_closes_handles() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        create_globe_dir(first.path());
        create_globe_dir(second.path());
        write_sample(first.path(), 11.1416, 51.7894, 100);
        write_sample(second.path(), 11.1416, 51.7894, 200);

        let mut service = GlobeServiceBuilder::new(first.path())
            .file_open_timeout_ms(60_000)
            .build()
            .unwrap();
        assert_eq!(service.elevation_at(11.1416, 51.7894).unwrap(), 100);
        assert_eq!(service.cache_stats().open_handles, 1);

        service
            .reconfigure(GlobeServiceBuilder::new(second.path()).file_open_timeout_ms(60_000))
            .unwrap();
        assert_eq!(service.cache_stats().open_handles, 0);
        assert_eq!(service.data_dir(), second.path());
        assert_eq!(service.elevation_at(11.1416, 51.7894).unwrap(), 200);
    }

    #[test]
    fn test_failed_reconfigure_keeps_directory() {
        let data = TempDir::new().unwrap();
        create_globe_dir(data.path());
        write_sample(data.path(), 11.1416, 51.7894, 100);

        let mut service = GlobeService::new(data.path()).unwrap();
        service.elevation_at(11.1416, 51.7894).unwrap();

        let result = service.reconfigure(GlobeServiceBuilder::new(data.path().join("missing")));
        assert!(matches!(
            result,
            Err(GlobeError::DataDirectoryMissing { .. })
        ));
        assert_eq!(service.cache_stats().open_handles, 0);
        assert_eq!(service.data_dir(), data.path());
        assert_eq!(service.elevation_at(11.1416, 51.7894).unwrap(), 100);
    }

    #[test]
    fn test_caching_disabled() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());

        let service = GlobeServiceBuilder::new(temp_dir.path())
            .file_open_timeout_ms(-1)
            .build()
            .unwrap();
        service.elevation_at(1.0, 1.0).unwrap();
        service.elevation_at(2.0, 2.0).unwrap();

        let stats = service.cache_stats();
        assert_eq!(stats.open_handles, 0);
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.closed_count, 2);
    }

    #[test]
    fn test_point_elevations_batch() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), 11.1416, 51.7894, 123);

        let service = GlobeService::new(temp_dir.path()).unwrap();
        let coords = vec![(11.1416, 51.7894), (f64::NAN, 0.0), (600.0, 0.0), (0.0, 0.0)];
        let results = service.point_elevations(&coords, -1);

        assert_eq!(results, vec![123, -1, -1, 0]);
    }

    #[test]
    fn test_from_env_with_values() {
        let temp_dir = TempDir::new().unwrap();

        // Save original values
        let orig_dir = std::env::var_os("GLOBE_DATA_DIR");
        let orig_timeout = std::env::var_os("GLOBE_FILE_TIMEOUT_MS");
        let orig_points = std::env::var_os("GLOBE_MAX_POINTS");
        let orig_auto_close = std::env::var_os("GLOBE_AUTO_CLOSE");

        let dirs = std::env::join_paths([temp_dir.path(), Path::new("/elsewhere")]).unwrap();
        std::env::set_var("GLOBE_DATA_DIR", &dirs);
        std::env::set_var("GLOBE_FILE_TIMEOUT_MS", "-1");
        std::env::set_var("GLOBE_MAX_POINTS", "not a number");
        std::env::set_var("GLOBE_AUTO_CLOSE", "Yes");

        let builder = GlobeServiceBuilder::from_env();
        assert_eq!(builder.data_dirs(), [temp_dir.path(), Path::new("/elsewhere")]);
        assert_eq!(builder.file_open_timeout_ms, -1);
        assert_eq!(builder.max_points, DEFAULT_MAX_POINTS);
        assert!(builder.auto_close);

        // Restore original values
        for (name, value) in [
            ("GLOBE_DATA_DIR", orig_dir),
            ("GLOBE_FILE_TIMEOUT_MS", orig_timeout),
            ("GLOBE_MAX_POINTS", orig_points),
            ("GLOBE_AUTO_CLOSE", orig_auto_close),
        ] {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }

    #[test]
    fn test_builder_defaults() {
        let builder = GlobeServiceBuilder::default();
        assert_eq!(builder.data_dirs().len(), DEFAULT_DATA_DIRS.len());
        assert_eq!(builder.file_open_timeout_ms, DEFAULT_FILE_OPEN_TIMEOUT_MS);
        assert_eq!(builder.max_points, DEFAULT_MAX_POINTS);
        assert!(!builder.auto_close);
    }

    #[test]
    fn test_auto_close_after_each_query() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), 11.1416, 51.7894, 123);

        let service = GlobeServiceBuilder::new(temp_dir.path())
            .file_open_timeout_ms(60_000)
            .auto_close(true)
            .build()
            .unwrap();
        assert!(service.auto_close());

        let point = Coordinate::new(11.1416, 51.7894).unwrap();
        assert_eq!(service.elevation(point).unwrap(), 123.0);
        assert_eq!(service.cache_stats().open_handles, 0);

        // Failed queries close too
        fs::remove_file(temp_dir.path().join("a10g")).unwrap();
        let bbox = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1)).unwrap();
        service.elevation(bbox).unwrap();
        let arctic = Coordinate::new(-170.0, 60.0).unwrap();
        assert!(service.elevation(arctic).is_err());

        // A batch opens each tile once and closes at the end
        let coords = [(11.1416, 51.7894), (11.1416, 51.7894)];
        assert_eq!(service.point_elevations(&coords, -1), vec![123, 123]);
        assert_eq!(service.elevation_at(11.1416, 51.7894).unwrap(), 123);

        let stats = service.cache_stats();
        assert_eq!(stats.open_handles, 0);
        assert_eq!(stats.opened_count, 4);
        assert_eq!(stats.closed_count, 4);
    }

    #[test]
    fn test_huge_timeout_builds() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());
        write_sample(temp_dir.path(), 11.1416, 51.7894, 123);

        let service = GlobeServiceBuilder::new(temp_dir.path())
            .file_open_timeout_ms(i64::MAX)
            .build()
            .unwrap();
        assert_eq!(service.elevation_at(11.1416, 51.7894).unwrap(), 123);
        assert_eq!(service.cache_stats().open_handles, 1);
    }

    #[test]
    fn test_extreme_box_is_too_many_points() {
        let temp_dir = TempDir::new().unwrap();
        create_globe_dir(temp_dir.path());

        let service = GlobeService::new(temp_dir.path()).unwrap();
        let bbox = BoundingBox::from_corners((1e300, 0.0), (-1e300, 0.0)).unwrap();
        match service.mean_elevation(&bbox) {
            Err(GlobeError::TooManyPoints { count, .. }) => assert_eq!(count, u64::MAX),
            other => panic!("Expected TooManyPoints, got {:?}", other),
        }
        assert_eq!(service.cache_stats().opened_count, 0);
    }
}
