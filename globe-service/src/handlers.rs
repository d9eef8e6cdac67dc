//! HTTP request handlers for the elevation service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use globe::{BoundingBox, CoordValue, GlobeError, Location, LocationInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the point elevation endpoint.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ElevationQuery {
    /// Latitude in decimal degrees (clamped to -90..90).
    pub lat: f64,
    /// Longitude in decimal degrees (wrapped once into -180..180).
    pub lon: f64,
}

/// Query parameters for the bounding-box endpoint. Corners may be given in
/// any order.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AreaQuery {
    /// Latitude of the first corner.
    pub lat1: f64,
    /// Longitude of the first corner.
    pub lon1: f64,
    /// Latitude of the opposite corner.
    pub lat2: f64,
    /// Longitude of the opposite corner.
    pub lon2: f64,
}

/// Successful point elevation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ElevationResponse {
    /// Elevation in meters (ocean is 0).
    pub elevation: i16,
    /// Latitude queried.
    pub lat: f64,
    /// Longitude queried.
    pub lon: f64,
}

/// Successful bounding-box response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AreaResponse {
    /// Mean elevation in meters over every grid point in the box.
    pub elevation: f64,
    /// Number of grid points averaged.
    pub points: u64,
    /// Whether the box wraps across ±180° longitude.
    pub crosses_antimeridian: bool,
}

/// Response for a free-form location query.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationElevationResponse {
    /// Point elevation, or mean elevation for a bounding box.
    pub elevation: f64,
    /// `point` or `bbox`.
    pub kind: String,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Active data directory.
    pub data_dir: String,
}

/// Handle cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of tile files currently open.
    pub open_handles: u64,
    /// Reads served by an open handle.
    pub cache_hits: u64,
    /// Reads that had to open a tile file.
    pub cache_misses: u64,
    /// Tile files opened so far.
    pub opened_handles: u64,
    /// Handles closed so far.
    pub closed_handles: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
    /// Idle timeout for tile handles in milliseconds.
    pub file_open_timeout_ms: i64,
    /// Maximum grid points per bounding box.
    pub max_points: u64,
}

/// Error returned by the handlers, rendered as JSON.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<GlobeError> for ApiError {
    fn from(e: GlobeError) -> Self {
        let status = match &e {
            GlobeError::InvalidCoordinate { .. }
            | GlobeError::NoTileForLocation { .. }
            | GlobeError::TooManyPoints { .. } => StatusCode::BAD_REQUEST,
            GlobeError::DataFileMissing { .. } | GlobeError::DataDirectoryMissing { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.message, "Elevation query failed");
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Run a blocking query on the blocking thread pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, GlobeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Query task failed: {}", e),
        })?
        .map_err(ApiError::from)
}

/// Get elevation at a point.
///
/// # Returns
///
/// - `200 OK` with elevation data on success
/// - `400 Bad Request` if coordinates are invalid
/// - `503 Service Unavailable` if tile data cannot be read
#[utoipa::path(
    get,
    path = "/elevation",
    params(ElevationQuery),
    responses(
        (status = 200, description = "Elevation found", body = ElevationResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 503, description = "Tile data unavailable", body = ErrorResponse)
    ),
    tag = "elevation"
)]
pub async fn get_elevation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ElevationQuery>,
) -> Result<Json<ElevationResponse>, ApiError> {
    tracing::debug!(lat = query.lat, lon = query.lon, "Elevation query");

    let (lon, lat) = (query.lon, query.lat);
    let elevation = blocking(move || state.globe_service.elevation_at(lon, lat)).await?;

    tracing::info!(
        lat = query.lat,
        lon = query.lon,
        elevation = elevation,
        "Elevation found"
    );

    Ok(Json(ElevationResponse {
        elevation,
        lat: query.lat,
        lon: query.lon,
    }))
}

/// Get mean elevation over a bounding box.
#[utoipa::path(
    get,
    path = "/elevation/area",
    params(AreaQuery),
    responses(
        (status = 200, description = "Mean elevation", body = AreaResponse),
        (status = 400, description = "Invalid coordinates or box too large", body = ErrorResponse),
        (status = 503, description = "Tile data unavailable", body = ErrorResponse)
    ),
    tag = "elevation"
)]
pub async fn get_area_elevation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<AreaResponse>, ApiError> {
    tracing::debug!(?query, "Area query");

    let bbox = BoundingBox::from_corners((query.lon1, query.lat1), (query.lon2, query.lat2))?;
    let elevation = blocking(move || state.globe_service.mean_elevation(&bbox)).await?;

    Ok(Json(AreaResponse {
        elevation,
        points: bbox.point_count(),
        crosses_antimeridian: bbox.crosses_antimeridian(),
    }))
}

/// Get elevation for a free-form location.
///
/// Accepts `[lon, lat]`, `{"lon": .., "lat": ..}` (or `lng`), numeric
/// strings, and a two-element array of such points for a bounding box.
#[utoipa::path(
    post,
    path = "/elevation",
    request_body(content = Value, description = "Point or pair of corner points"),
    responses(
        (status = 200, description = "Elevation found", body = LocationElevationResponse),
        (status = 400, description = "Invalid location", body = ErrorResponse),
        (status = 503, description = "Tile data unavailable", body = ErrorResponse)
    ),
    tag = "elevation"
)]
pub async fn post_elevation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<LocationElevationResponse>, ApiError> {
    let location = location_from_json(&body)?.resolve()?;
    let kind = match location {
        Location::Point(_) => "point",
        Location::BoundingBox(_) => "bbox",
    };

    let elevation = blocking(move || state.globe_service.elevation(location)).await?;

    Ok(Json(LocationElevationResponse {
        elevation,
        kind: kind.to_string(),
    }))
}

/// Add elevations to every position of a GeoJSON document.
#[utoipa::path(
    post,
    path = "/elevation/geojson",
    request_body(content = Value, description = "GeoJSON geometry, feature or feature collection"),
    responses(
        (status = 200, description = "GeoJSON with elevation as the third coordinate", body = Value),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 503, description = "Tile data unavailable", body = ErrorResponse)
    ),
    tag = "elevation"
)]
pub async fn post_geojson(
    State(state): State<Arc<AppState>>,
    Json(geojson): Json<geojson::GeoJson>,
) -> Result<Json<geojson::GeoJson>, ApiError> {
    let enriched = blocking(move || {
        globe::geojson::add_elevations_to_geojson(&state.globe_service, geojson)
    })
    .await?;
    Ok(Json(enriched))
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "system"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_dir: state.globe_service.data_dir().display().to_string(),
    })
}

/// Get handle cache statistics.
#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Cache statistics", body = StatsResponse)),
    tag = "system"
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let service = &state.globe_service;
    let stats = service.cache_stats();

    Json(StatsResponse {
        open_handles: stats.open_handles,
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        opened_handles: stats.opened_count,
        closed_handles: stats.closed_count,
        hit_rate: stats.hit_rate(),
        file_open_timeout_ms: service.file_open_timeout_ms(),
        max_points: service.max_points(),
    })
}

/// Decode a JSON location into a [`LocationInput`].
pub fn location_from_json(value: &Value) -> Result<LocationInput, ApiError> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [a, b] if is_point(a) && is_point(b) => Ok(LocationInput::corners(
                location_from_json(a)?,
                location_from_json(b)?,
            )),
            [lon, lat] => Ok(LocationInput::Pair(coord_from_json(lon)?, coord_from_json(lat)?)),
            _ => Err(ApiError::bad_request(
                "Expected [lon, lat] or [[lon, lat], [lon, lat]]",
            )),
        },
        Value::Object(fields) => {
            let lon = fields
                .get("lon")
                .or_else(|| fields.get("lng"))
                .ok_or_else(|| ApiError::bad_request("Missing 'lon' or 'lng'"))?;
            let lat = fields
                .get("lat")
                .ok_or_else(|| ApiError::bad_request("Missing 'lat'"))?;
            Ok(LocationInput::Named {
                lon: coord_from_json(lon)?,
                lat: coord_from_json(lat)?,
            })
        }
        _ => Err(ApiError::bad_request("Location must be an array or object")),
    }
}

fn is_point(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

fn coord_from_json(value: &Value) -> Result<CoordValue, ApiError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(CoordValue::Number)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid number: {}", n))),
        Value::String(s) => Ok(CoordValue::Text(s.clone())),
        other => Err(ApiError::bad_request(format!(
            "Coordinate must be a number or numeric string, got {}",
            other
        ))),
    }
}
