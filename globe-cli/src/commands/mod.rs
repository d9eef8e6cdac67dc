pub mod batch;
pub mod extract;
pub mod info;
pub mod list;
pub mod query;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Args;
use globe::service::{DEFAULT_FILE_OPEN_TIMEOUT_MS, DEFAULT_MAX_POINTS};
use globe::{GlobeService, GlobeServiceBuilder};
use indicatif::ProgressStyle;
use std::path::{Path, PathBuf};

/// Separator for `GLOBE_DATA_DIR`, matching the platform's `PATH` syntax.
const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Options shared by every command that reads tiles.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Directory containing the GLOBE tiles (repeat to add fallbacks)
    #[arg(
        short,
        long = "data-dir",
        global = true,
        env = "GLOBE_DATA_DIR",
        value_delimiter = PATH_SEPARATOR
    )]
    pub data_dirs: Vec<PathBuf>,

    /// Idle time before a tile file is closed, in ms (0 or less: no caching)
    #[arg(
        short,
        long,
        global = true,
        allow_negative_numbers = true,
        env = "GLOBE_FILE_TIMEOUT_MS",
        default_value_t = DEFAULT_FILE_OPEN_TIMEOUT_MS
    )]
    pub timeout_ms: i64,

    /// Maximum number of grid points in a bounding-box query
    #[arg(
        short,
        long,
        global = true,
        env = "GLOBE_MAX_POINTS",
        default_value_t = DEFAULT_MAX_POINTS
    )]
    pub max_points: u64,

    /// Close every tile file after each query
    #[arg(
        long,
        global = true,
        env = "GLOBE_AUTO_CLOSE",
        value_parser = BoolishValueParser::new()
    )]
    pub auto_close: bool,
}

impl ServiceArgs {
    /// Builder from the command-line flags and their environment fallbacks.
    pub fn builder(&self) -> GlobeServiceBuilder {
        let dirs: Vec<&PathBuf> = self
            .data_dirs
            .iter()
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect();
        let builder = if dirs.is_empty() {
            GlobeServiceBuilder::default()
        } else {
            GlobeServiceBuilder::with_candidates(dirs)
        };
        builder
            .file_open_timeout_ms(self.timeout_ms)
            .max_points(self.max_points)
            .auto_close(self.auto_close)
    }

    /// Build the elevation service.
    pub fn service(&self) -> Result<GlobeService> {
        self.builder().build().context(
            "No usable GLOBE data directory. Use --data-dir or set GLOBE_DATA_DIR",
        )
    }

    /// Directory to inspect without requiring every tile to be present.
    ///
    /// The first candidate that exists, otherwise the first candidate.
    pub fn inspect_dir(&self) -> Result<PathBuf> {
        let builder = self.builder();
        let candidates = builder.data_dirs();
        candidates
            .iter()
            .find(|dir| dir.is_dir())
            .or_else(|| candidates.first())
            .cloned()
            .context("No data directory configured. Use --data-dir or set GLOBE_DATA_DIR")
    }
}

pub fn progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
        .progress_chars("#>-"))
}

/// `<stem>_elevation.<extension>` next to the input file.
pub fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_elevation.{}", stem, extension))
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
