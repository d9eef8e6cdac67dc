//! GeoJSON elevation enrichment.
//!
//! Adds the GLOBE point elevation as the Z coordinate of every position in a
//! geometry, feature or feature collection. Enable the `geojson` feature to
//! use this module.
//!
//! # Example
//!
//! ```ignore
//! use globe::GlobeService;
//! use globe::geojson::add_elevations_to_geometry;
//! use geojson::Geometry;
//!
//! let service = GlobeService::new("/path/to/globe")?;
//!
//! let geometry: Geometry = r#"{"type": "Point", "coordinates": [11.1416, 51.7894]}"#
//!     .parse()
//!     .unwrap();
//!
//! let enriched = add_elevations_to_geometry(&service, geometry)?;
//! // {"type": "Point", "coordinates": [11.1416, 51.7894, 123.0]}
//! ```

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Position, Value as GeoJsonValue};

use crate::error::{GlobeError, Result};
use crate::service::GlobeService;

/// Add elevations to every position of a GeoJSON geometry.
///
/// Positions are in GeoJSON order, `[lon, lat]` or `[lon, lat, alt]`; any
/// existing altitude is replaced. Bounding boxes and foreign members are kept.
///
/// # Errors
///
/// Returns the first lookup error, or [`GlobeError::InvalidCoordinate`] for
/// a position with fewer than two elements.
pub fn add_elevations_to_geometry(service: &GlobeService, geometry: Geometry) -> Result<Geometry> {
    let Geometry {
        bbox,
        value,
        foreign_members,
    } = geometry;

    let elevate = |positions: Vec<Position>| add_elevation_to_coords(service, &positions);
    let elevate_rings = |rings: Vec<Vec<Position>>| -> Result<Vec<Vec<Position>>> {
        rings.into_iter().map(elevate).collect()
    };

    let value = match value {
        GeoJsonValue::Point(coord) => GeoJsonValue::Point(add_elevation_to_coord(service, &coord)?),
        GeoJsonValue::MultiPoint(coords) => GeoJsonValue::MultiPoint(elevate(coords)?),
        GeoJsonValue::LineString(coords) => GeoJsonValue::LineString(elevate(coords)?),
        GeoJsonValue::MultiLineString(lines) => GeoJsonValue::MultiLineString(elevate_rings(lines)?),
        GeoJsonValue::Polygon(rings) => GeoJsonValue::Polygon(elevate_rings(rings)?),
        GeoJsonValue::MultiPolygon(polygons) => GeoJsonValue::MultiPolygon(
            polygons
                .into_iter()
                .map(elevate_rings)
                .collect::<Result<_>>()?,
        ),
        GeoJsonValue::GeometryCollection(geometries) => GeoJsonValue::GeometryCollection(
            geometries
                .into_iter()
                .map(|g| add_elevations_to_geometry(service, g))
                .collect::<Result<_>>()?,
        ),
    };

    Ok(Geometry {
        bbox,
        value,
        foreign_members,
    })
}

/// Add elevations to the geometry of a feature. Features without geometry
/// are returned unchanged.
pub fn add_elevations_to_feature(service: &GlobeService, mut feature: Feature) -> Result<Feature> {
    if let Some(geometry) = feature.geometry.take() {
        feature.geometry = Some(add_elevations_to_geometry(service, geometry)?);
    }
    Ok(feature)
}

/// Add elevations to any GeoJSON document.
pub fn add_elevations_to_geojson(service: &GlobeService, geojson: GeoJson) -> Result<GeoJson> {
    Ok(match geojson {
        GeoJson::Geometry(geometry) => {
            GeoJson::Geometry(add_elevations_to_geometry(service, geometry)?)
        }
        GeoJson::Feature(feature) => GeoJson::Feature(add_elevations_to_feature(service, feature)?),
        GeoJson::FeatureCollection(collection) => {
            let features = collection
                .features
                .into_iter()
                .map(|f| add_elevations_to_feature(service, f))
                .collect::<Result<_>>()?;
            GeoJson::FeatureCollection(FeatureCollection {
                features,
                ..collection
            })
        }
    })
}

/// Add elevation to a single position.
///
/// Takes `[lon, lat]` or `[lon, lat, alt]` and returns `[lon, lat, elevation]`
/// with the input longitude and latitude unchanged.
///
/// # Example
///
/// ```ignore
/// let elevated = add_elevation_to_coord(&service, &[11.1416, 51.7894])?;
/// assert_eq!(elevated.len(), 3);
/// ```
pub fn add_elevation_to_coord(service: &GlobeService, coord: &[f64]) -> Result<Vec<f64>> {
    let [lon, lat, ..] = *coord else {
        return Err(GlobeError::InvalidCoordinate {
            message: "Position must have at least 2 elements (lon, lat)".to_string(),
        });
    };

    let elevation = service.elevation_at(lon, lat)?;

    Ok(vec![lon, lat, f64::from(elevation)])
}

/// Add elevations to a list of positions.
pub fn add_elevation_to_coords(service: &GlobeService, coords: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    coords
        .iter()
        .map(|coord| add_elevation_to_coord(service, coord))
        .collect()
}
