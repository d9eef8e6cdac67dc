//! Reference values against the real GLOBE dataset.
//!
//! These tests need the sixteen tile files and are ignored by default. Run
//! them with:
//!
//! ```text
//! GLOBE_DATA_DIR=/path/to/globe cargo test -p globe --test dataset -- --ignored
//! ```

use approx::assert_abs_diff_eq;
use globe::{BoundingBox, Coordinate, GlobeService, GlobeServiceBuilder};

fn service() -> GlobeService {
    GlobeServiceBuilder::from_env()
        .build()
        .expect("GLOBE_DATA_DIR must point at the GLOBE tiles")
}

#[test]
#[ignore]
fn test_ocean_at_origin() {
    let service = service();
    let point = Coordinate::new(0.0, 0.0).unwrap();
    assert_eq!(service.elevation(point).unwrap(), 0.0);
}

#[test]
#[ignore]
fn test_harz_point() {
    let service = service();
    let point = Coordinate::new(11.1416, 51.7894).unwrap();
    assert_eq!(service.point_elevation(&point).unwrap(), 123);
}

#[test]
#[ignore]
fn test_box_mean_either_corner_order() {
    let service = service();

    let a = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1)).unwrap();
    let b = BoundingBox::from_corners((-106.5, 35.1), (-106.6, 35.0)).unwrap();

    let mean = service.mean_elevation(&a).unwrap();
    assert_abs_diff_eq!(mean, 1632.24, epsilon = 0.01);
    assert_eq!(service.mean_elevation(&b).unwrap(), mean);
}

#[test]
#[ignore]
fn test_antimeridian_box() {
    let service = service();
    let bbox = BoundingBox::from_corners((179.0, 67.5), (-179.0, 68.0)).unwrap();
    let mean = service.mean_elevation(&bbox).unwrap();
    assert!(mean.is_finite());
}

#[test]
#[ignore]
fn test_uncached_matches_cached() {
    let cached = service();
    let uncached = GlobeServiceBuilder::from_env()
        .file_open_timeout_ms(0)
        .build()
        .unwrap();

    for (lon, lat) in [(11.1416, 51.7894), (86.925, 27.9881), (-151.0074, 63.0695)] {
        assert_eq!(
            cached.elevation_at(lon, lat).unwrap(),
            uncached.elevation_at(lon, lat).unwrap()
        );
    }
}
