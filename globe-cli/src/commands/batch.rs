use anyhow::{bail, Context, Result};
use globe::geojson::{add_elevations_to_feature, add_elevations_to_geometry};
use globe::GlobeService;
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{default_output_path, progress_style, ServiceArgs};

pub fn run(
    args: &ServiceArgs,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: String,
    lon_col: String,
) -> Result<()> {
    let service = args.service()?;

    // Detect file format
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => process_csv(&service, &input, output, &lat_col, &lon_col),
        "geojson" | "json" => process_geojson(&service, &input, output),
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    }
}

/// Append an `elevation` column. Rows whose lookup fails get an empty cell.
fn process_csv(
    service: &GlobeService,
    input: &Path,
    output: Option<PathBuf>,
    lat_col: &str,
    lon_col: &str,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("Column '{}' not found in CSV", name))
    };
    let lat_idx = column(lat_col)?;
    let lon_idx = column(lon_col)?;

    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(progress_style()?);

    let output_path = output.unwrap_or_else(|| default_output_path(input, "csv"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    let mut failed = 0u64;
    for (line, record) in records.iter().enumerate() {
        let parse = |idx: usize, what: &str| -> Result<f64> {
            record
                .get(idx)
                .with_context(|| format!("Missing {} on record {}", what, line + 1))?
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} on record {}", what, line + 1))
        };
        let lat = parse(lat_idx, "latitude")?;
        let lon = parse(lon_idx, "longitude")?;

        let elevation = match service.elevation_at(lon, lat) {
            Ok(elevation) => elevation.to_string(),
            Err(_) => {
                failed += 1;
                String::new()
            }
        };

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    if failed > 0 {
        eprintln!("{} record(s) without elevation", failed);
    }
    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn process_geojson(service: &GlobeService, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let geojson: geojson::GeoJson =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;

    let result = match geojson {
        geojson::GeoJson::Geometry(geometry) => {
            geojson::GeoJson::Geometry(add_elevations_to_geometry(service, geometry)?)
        }
        geojson::GeoJson::Feature(feature) => {
            geojson::GeoJson::Feature(add_elevations_to_feature(service, feature)?)
        }
        geojson::GeoJson::FeatureCollection(mut fc) => {
            let pb = ProgressBar::new(fc.features.len() as u64);
            pb.set_style(progress_style()?);

            let features = std::mem::take(&mut fc.features);
            for (i, feature) in features.into_iter().enumerate() {
                let enriched = add_elevations_to_feature(service, feature)
                    .with_context(|| format!("Failed to enrich feature {}", i))?;
                fc.features.push(enriched);
                pb.inc(1);
            }
            pb.finish_with_message("done");
            geojson::GeoJson::FeatureCollection(fc)
        }
    };

    let output_path = output.unwrap_or_else(|| default_output_path(input, "geojson"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(output_file);
    serde_json::to_writer_pretty(&mut writer, &result)?;
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}
