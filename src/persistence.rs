//! CSV persistence.
//!
//! Two things survive between runs: the elevation cache (so a mountain can
//! be re-rendered without re-querying the lookup service) and the one-row
//! per-mountain summary table used for cross-mountain comparison charts.
//! Way-id blacklists/whitelists are plain text files, one id per line.
//!
//! Missing files are a normal first-run condition, not an error: loaders
//! log a warning and return empty data.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::elevation::ElevationCache;
use crate::error::Result;
use crate::mountain::MountainSummary;
use crate::TrailPoint;

#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    latitude: f64,
    longitude: f64,
    elevation: f64,
}

/// Load the elevation cache from a CSV file.
///
/// A missing or unreadable file yields an empty cache; a malformed row is
/// skipped with a warning rather than poisoning the rest of the file.
pub fn load_elevation_cache(path: &Path) -> ElevationCache {
    let mut cache = ElevationCache::new();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(
                "No elevation cache at {}: {} (starting empty)",
                path.display(),
                err
            );
            return cache;
        }
    };

    let mut reader = csv::Reader::from_reader(file);
    for row in reader.deserialize::<CacheRow>() {
        match row {
            Ok(row) => cache.insert(
                &TrailPoint::new(row.latitude, row.longitude),
                row.elevation,
            ),
            Err(err) => warn!("Skipping malformed cache row: {}", err),
        }
    }

    info!(
        "Loaded {} cached elevations from {}",
        cache.len(),
        path.display()
    );
    cache
}

/// Write the elevation cache back to CSV, replacing the previous file.
pub fn save_elevation_cache(path: &Path, cache: &ElevationCache) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (latitude, longitude, elevation) in cache.iter() {
        writer.serialize(CacheRow {
            latitude,
            longitude,
            elevation,
        })?;
    }
    writer.flush()?;
    info!("Saved {} cached elevations to {}", cache.len(), path.display());
    Ok(())
}

/// Append one mountain's summary row to the comparison table, creating the
/// file (with a header) on first use.
pub fn append_mountain_summary(path: &Path, summary: &MountainSummary) -> Result<()> {
    let write_header = !path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    writer.serialize(summary)?;
    writer.flush()?;
    Ok(())
}

/// Load every summary row from the comparison table.
pub fn load_mountain_summaries(path: &Path) -> Vec<MountainSummary> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!("No summary table at {}: {}", path.display(), err);
            return Vec::new();
        }
    };

    let mut reader = csv::Reader::from_reader(file);
    let mut summaries = Vec::new();
    for row in reader.deserialize::<MountainSummary>() {
        match row {
            Ok(summary) => summaries.push(summary),
            Err(err) => warn!("Skipping malformed summary row: {}", err),
        }
    }
    summaries
}

/// Load a way-id list (blacklist or whitelist), one id per line.
///
/// Blank lines are ignored. A missing file degrades to an empty list so a
/// mountain without curation files still processes.
pub fn load_way_id_list(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) => {
            warn!("No way-id list at {}: {}", path.display(), err);
            Vec::new()
        }
    }
}
