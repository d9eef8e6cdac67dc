//! Globe Service - HTTP microservice for GLOBE elevation queries.
//!
//! A REST API for point and bounding-box elevation queries on the GLOBE
//! 30 arc-second digital elevation model.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GLOBE_DATA_DIR` | Data directory, or a list in `PATH` syntax | Standard locations |
//! | `GLOBE_FILE_TIMEOUT_MS` | Idle time before a tile file is closed (`<= 0` disables caching) | 1000 |
//! | `GLOBE_MAX_POINTS` | Maximum grid points per bounding box | 1000000 |
//! | `GLOBE_AUTO_CLOSE` | Close tile files after every query | false |
//! | `GLOBE_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /elevation?lat=X&lon=Y` - Elevation at a point
//! - `GET /elevation/area?lat1=..&lon1=..&lat2=..&lon2=..` - Mean over a bounding box
//! - `POST /elevation` - Point or bounding box as free-form JSON
//! - `POST /elevation/geojson` - Add elevations to a GeoJSON document
//! - `GET /health` - Health check
//! - `GET /stats` - Handle cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;

use globe::GlobeServiceBuilder;
use globe_service::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "globe_service=info,globe=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load port from environment (service-specific config)
    let port: u16 = std::env::var("GLOBE_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // The library handles GLOBE_DATA_DIR, GLOBE_FILE_TIMEOUT_MS and GLOBE_MAX_POINTS
    let builder = GlobeServiceBuilder::from_env();
    let globe_service = match builder.clone().build() {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(
                candidates = ?builder.data_dirs(),
                error = %e,
                "No usable GLOBE data directory"
            );
            return Err(e.into());
        }
    };

    tracing::info!(
        data_dir = %globe_service.data_dir().display(),
        file_open_timeout_ms = globe_service.file_open_timeout_ms(),
        max_points = globe_service.max_points(),
        port = port,
        "Starting globe service"
    );

    let app = router(AppState::new(globe_service));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
