use anyhow::Result;
use globe::TileCatalog;
use std::fs;

use super::{format_size, ServiceArgs};

pub fn run(args: &ServiceArgs) -> Result<()> {
    let dir = args.inspect_dir()?;
    let catalog = TileCatalog::globe();

    let mut present = 0;
    let mut mismatched = 0;
    let mut total_size: u64 = 0;

    println!(
        "{:<6} {:>14} {:>10} {:>12}",
        "TILE", "STATUS", "LAT", "LON"
    );
    println!("{}", "-".repeat(45));

    for tile in catalog.tiles() {
        let size = fs::metadata(dir.join(tile.name))
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len());

        let status = match size {
            None => "missing",
            Some(size) => {
                present += 1;
                total_size += size;
                if size == tile.file_size() {
                    "ok"
                } else {
                    mismatched += 1;
                    "size mismatch"
                }
            }
        };

        println!(
            "{:<6} {:>14} {:>10} {:>12}",
            tile.name,
            status,
            format!("{}..{}", tile.lat_min, tile.lat_max),
            format!("{}..{}", tile.lon_min, tile.lon_max),
        );
    }

    // Summary
    println!();
    println!("Summary:");
    println!("  Tiles present: {}/{}", present, catalog.len());
    if mismatched > 0 {
        println!("  Size mismatches: {}", mismatched);
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Data directory: {}", dir.display());

    Ok(())
}
