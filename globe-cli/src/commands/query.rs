use anyhow::{Context, Result};
use globe::{BoundingBox, Coordinate};
use serde::Serialize;

use super::ServiceArgs;

#[derive(Serialize)]
struct PointResponse {
    lon: f64,
    lat: f64,
    elevation: i16,
}

#[derive(Serialize)]
struct AreaResponse {
    /// `[lon1, lat1, lon2, lat2]` as given
    bbox: [f64; 4],
    points: u64,
    crosses_antimeridian: bool,
    elevation: f64,
}

pub fn run(
    args: &ServiceArgs,
    lon: f64,
    lat: f64,
    corner: Option<(f64, f64)>,
    json: bool,
) -> Result<()> {
    let service = args.service()?;

    match corner {
        None => {
            let point = Coordinate::new(lon, lat)?;
            let elevation = service
                .point_elevation(&point)
                .context("Failed to get elevation")?;

            if json {
                let response = PointResponse {
                    lon,
                    lat,
                    elevation,
                };
                println!("{}", serde_json::to_string(&response)?);
            } else {
                println!("{}", elevation);
            }
        }
        Some((lon2, lat2)) => {
            let bbox = BoundingBox::from_corners((lon, lat), (lon2, lat2))?;
            let elevation = service
                .mean_elevation(&bbox)
                .context("Failed to get mean elevation")?;

            if json {
                let response = AreaResponse {
                    bbox: [lon, lat, lon2, lat2],
                    points: bbox.point_count(),
                    crosses_antimeridian: bbox.crosses_antimeridian(),
                    elevation,
                };
                println!("{}", serde_json::to_string(&response)?);
            } else {
                println!("{:.2}", elevation);
            }
        }
    }

    Ok(())
}
