use anyhow::{bail, Context, Result};
use globe::tile::{TileHandle, OCEAN_VALUE};
use globe::{Coordinate, TileCatalog, TileDescriptor};
use std::path::{Path, PathBuf};

use super::{format_size, ServiceArgs};

pub fn run(
    args: &ServiceArgs,
    tile: Option<String>,
    lon: Option<f64>,
    lat: Option<f64>,
    scan: bool,
) -> Result<()> {
    let catalog = TileCatalog::globe();

    // Resolve the tile and its file
    let (descriptor, tile_path) = match (tile, lon, lat) {
        (_, Some(lon), Some(lat)) => {
            let coord = Coordinate::new(lon, lat)?;
            let descriptor = globe::grid::locate(&catalog, &coord)?;
            (descriptor, args.inspect_dir()?.join(descriptor.name))
        }
        (Some(tile), _, _) => {
            let path = PathBuf::from(&tile);
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&tile)
                .to_lowercase();
            let descriptor = catalog
                .get(&name)
                .with_context(|| format!("Unknown tile: {} (expected a10g to p10g)", tile))?;

            // A bare name is looked up in the data directory
            let path = if path.components().count() > 1 {
                path
            } else {
                args.inspect_dir()?.join(descriptor.name)
            };
            (descriptor, path)
        }
        _ => bail!("Specify a tile name or both --lon and --lat"),
    };

    print_descriptor(descriptor, &tile_path);

    let metadata = match std::fs::metadata(&tile_path) {
        Ok(metadata) => metadata,
        Err(_) => {
            println!("File: missing");
            return Ok(());
        }
    };

    let expected = descriptor.file_size();
    if metadata.len() == expected {
        println!("File size: {}", format_size(metadata.len()));
    } else {
        println!(
            "File size: {} (expected {})",
            format_size(metadata.len()),
            format_size(expected)
        );
    }

    if scan {
        let handle = TileHandle::open(&tile_path, descriptor.name).context("Failed to open tile")?;
        print_scan(&handle);
    }

    Ok(())
}

fn print_descriptor(tile: &TileDescriptor, path: &Path) {
    println!("Tile: {}", tile.name);
    println!("Path: {}", path.display());
    println!();
    println!(
        "Coverage: {}..{} lat, {}..{} lon",
        tile.lat_min, tile.lat_max, tile.lon_min, tile.lon_max
    );
    println!(
        "Grid: {} columns x {} rows ({} samples)",
        tile.columns,
        tile.rows,
        tile.sample_count()
    );
    println!(
        "Declared elevation: {}m to {}m",
        tile.elevation_min, tile.elevation_max
    );
}

/// Scan every sample for the actual range and ocean share.
fn print_scan(handle: &TileHandle) {
    let (mut min_elev, mut max_elev) = (i16::MAX, i16::MIN);
    let mut ocean_count = 0u64;
    let mut total = 0u64;

    for raw in handle.raw_values() {
        total += 1;
        if raw == OCEAN_VALUE {
            ocean_count += 1;
        } else {
            min_elev = min_elev.min(raw);
            max_elev = max_elev.max(raw);
        }
    }

    println!();
    if min_elev <= max_elev {
        println!("Min elevation: {}m", min_elev);
        println!("Max elevation: {}m", max_elev);
    }
    if total > 0 {
        let ocean_pct = (ocean_count as f64 / total as f64) * 100.0;
        println!("Ocean samples: {} ({:.1}%)", ocean_count, ocean_pct);
    }
}
