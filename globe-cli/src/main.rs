use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::ServiceArgs;

/// GLOBE elevation data CLI tool
#[derive(Parser)]
#[command(name = "globe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation at a point, or the mean over a bounding box
    Query {
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude of the opposite box corner
        #[arg(long, allow_negative_numbers = true, requires = "lat2")]
        lon2: Option<f64>,

        /// Latitude of the opposite box corner
        #[arg(long, allow_negative_numbers = true, requires = "lon2")]
        lat2: Option<f64>,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add elevations to every coordinate of a CSV or GeoJSON file
    Batch {
        /// Input file (CSV or GeoJSON)
        input: PathBuf,

        /// Output file (same format as input if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display information about a GLOBE tile
    Info {
        /// Tile name (e.g., e10g) or path to a tile file
        #[arg(required_unless_present_all = ["lon", "lat"])]
        tile: Option<String>,

        /// Pick the tile containing this longitude
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Pick the tile containing this latitude
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Read every sample for actual min/max and ocean coverage
        #[arg(short, long)]
        scan: bool,
    },

    /// List catalog tiles and their status in the data directory
    List,

    /// Unpack the tiles from the GLOBE distribution archive (all10g.zip)
    Extract {
        /// Path to the ZIP archive
        archive: PathBuf,

        /// Destination directory (defaults to the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Quiet unless RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = &cli.service;

    match cli.command {
        Commands::Query {
            lon,
            lat,
            lon2,
            lat2,
            json,
        } => commands::query::run(service, lon, lat, lon2.zip(lat2), json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(service, input, output, lat_col, lon_col),
        Commands::Info {
            tile,
            lon,
            lat,
            scan,
        } => commands::info::run(service, tile, lon, lat, scan),
        Commands::List => commands::list::run(service),
        Commands::Extract { archive, output } => commands::extract::run(service, archive, output),
    }
}
