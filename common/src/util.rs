use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use eyre::{Context, Result};
use regex::Regex;
use tokio::fs::read_dir;

pub const RESULT_EXTENSION: &str = "result";
/// Minute resolution, runs started within the same minute share a file name
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M";

pub fn result_filename<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}.{RESULT_EXTENSION}", now.format(TIMESTAMP_FORMAT))
}

/// Result files in `dir` named by [`result_filename`], oldest first
pub async fn list_result_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let name_regex = Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{2}-\d{2}\.result$")?;
    let mut items = read_dir(dir)
        .await
        .wrap_err_with(|| format!("Read results dir {}", dir.display()))?;
    let mut results = Vec::new();
    while let Some(entry) = items.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name_regex.is_match(name))
        {
            results.push(entry.path());
        }
    }
    results.sort();
    Ok(results)
}

/// Where a chart for `results_file` goes when no output path is given
pub fn default_plot_path(results_file: &Path, stem_suffix: &str) -> PathBuf {
    let stem = results_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    results_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("plots")
        .join(format!("{stem}-{stem_suffix}.svg"))
}

/// Sibling `plot_data/<stem>.json` of a chart path
pub fn plot_data_path(plot_path: &Path) -> PathBuf {
    let stem = plot_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("plot");
    plot_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("plot_data")
        .join(format!("{stem}.json"))
}
