//! Globe Service Library
//!
//! HTTP handlers, router and types for the GLOBE elevation service.
//! This library is used by both the globe-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use globe::GlobeService;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Elevation service for queries.
    pub globe_service: GlobeService,
}

impl AppState {
    pub fn new(globe_service: GlobeService) -> Arc<Self> {
        Arc::new(Self { globe_service })
    }
}

// Re-export commonly used types for convenience
pub use handlers::{
    AreaQuery, AreaResponse, ElevationQuery, ElevationResponse, ErrorResponse, HealthResponse,
    LocationElevationResponse, StatsResponse,
};

/// OpenAPI documentation for the globe service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GLOBE Elevation Service",
        version = "0.1.0",
        description = "REST API for point and bounding-box elevation queries on the GLOBE 30 arc-second DEM.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_elevation,
        handlers::get_area_elevation,
        handlers::post_elevation,
        handlers::post_geojson,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::ElevationQuery,
            handlers::AreaQuery,
            handlers::ElevationResponse,
            handlers::AreaResponse,
            handlers::LocationElevationResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "elevation", description = "Elevation query endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router with documentation and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/elevation",
            get(handlers::get_elevation).post(handlers::post_elevation),
        )
        .route("/elevation/area", get(handlers::get_area_elevation))
        .route("/elevation/geojson", post(handlers::post_geojson))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
