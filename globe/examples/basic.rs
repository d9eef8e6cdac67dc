//! Basic example demonstrating globe library usage.
//!
//! Run with: cargo run --example basic -- /path/to/globe/tiles

use globe::{BoundingBox, Coordinate, GlobeError, GlobeService};
use std::env;

fn main() -> Result<(), GlobeError> {
    // Get data directory from command line
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/globe/tiles");
        std::process::exit(1);
    });

    let service = GlobeService::new(&data_dir)?;

    let locations = [
        ("Gulf of Guinea", 0.0, 0.0),
        ("Harz, Germany", 11.1416, 51.7894),
        ("Mount Everest, Nepal", 86.9250, 27.9881),
        ("Denali, Alaska", -151.0074, 63.0695),
    ];

    println!("Point elevations:");
    println!("{:-<50}", "");

    for (name, lon, lat) in locations {
        let point = Coordinate::new(lon, lat)?;
        match service.point_elevation(&point) {
            Ok(elevation) => println!("{}: {}m", name, elevation),
            Err(e) => println!("{}: error - {}", name, e),
        }
    }

    let area = BoundingBox::from_corners((-106.6, 35.0), (-106.5, 35.1))?;
    println!(
        "\nMean elevation near Albuquerque ({} points): {:.2}m",
        area.point_count(),
        service.mean_elevation(&area)?
    );

    let seam = BoundingBox::from_corners((179.0, 67.5), (-179.0, 68.0))?;
    println!(
        "Mean elevation across the antimeridian: {:.2}m",
        service.mean_elevation(&seam)?
    );

    // Show cache statistics
    let stats = service.cache_stats();
    println!("\nCache statistics:");
    println!("  Open handles: {}", stats.open_handles);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
