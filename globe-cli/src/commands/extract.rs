use anyhow::{Context, Result};
use globe::archive::extract_tiles;
use globe::TileCatalog;
use std::path::PathBuf;

use super::ServiceArgs;

pub fn run(args: &ServiceArgs, archive: PathBuf, dest: Option<PathBuf>) -> Result<()> {
    let dest = match dest {
        Some(dest) => dest,
        None => args.inspect_dir()?,
    };

    let stats = extract_tiles(&archive, &dest, &TileCatalog::globe())
        .with_context(|| format!("Failed to extract {}", archive.display()))?;

    println!(
        "Extracted {} tile(s) to {}",
        stats.extracted.len(),
        dest.display()
    );
    if stats.skipped > 0 {
        println!("Skipped {} other entries", stats.skipped);
    }
    if !stats.is_complete() {
        println!("Missing from archive: {}", stats.missing.join(", "));
    }

    Ok(())
}
