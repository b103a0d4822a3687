//! # Piste Mapper
//!
//! Ski-trail difficulty rating and stylized trail-map rendering.
//!
//! The library ingests trail geometry from two source formats — single-track
//! GPS recordings and OSM map extracts — then derives a per-point difficulty
//! rating and renders an SVG trail map:
//!
//! 1. Densify the raw point sequence so no gap exceeds a threshold
//! 2. Smooth the elevation profile
//! 3. Derive distance, elevation-change, slope, and difficulty series
//! 4. Aggregate per-point difficulty into a trail rating and tier
//! 5. Aggregate trail ratings into mountain difficulty/ease scores
//! 6. Place labels along straight trail sections and draw the map
//!
//! ## Quick Start
//!
//! ```rust
//! use piste_mapper::{assign_tier, rate_trail, Tier};
//!
//! // Per-point difficulties from the slope transform (0-0.9 scale)
//! let difficulty = vec![0.0, 0.12, 0.14, 0.15, 0.13];
//!
//! let rating = rate_trail(&difficulty);
//! assert_eq!(assign_tier(rating, 0), Tier::Easy);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{PisteMapError, Result};

// Geographic utilities (haversine distances, path length series)
pub mod geo_utils;
pub use geo_utils::{haversine_distance, path_distances, path_length};

// Track densification and area centerline reduction
pub mod densify;
pub use densify::{area_to_centerline, fill_point_gaps};

// Elevation profile smoothing
pub mod smoothing;
pub use smoothing::smooth_elevations;

// Slope/difficulty series, trail rating, tier assignment
pub mod difficulty;
pub use difficulty::{
    assign_tier, difficulty_series, elevation_changes, rate_trail, slope_series, Tier,
};

// Structured trail/lift/mountain records and the enrichment pipeline
pub mod mountain;
pub use mountain::{
    mountain_ease, mountain_rating, LiftRecord, Mountain, MountainSummary, PipelineConfig,
    TrailRecord,
};

// Throttled, cached elevation lookups
pub mod elevation;
pub use elevation::{
    ElevationCache, ElevationFetcher, ElevationService, ElevationSource, ElevationThrottle,
};

// CSV persistence for the elevation cache and mountain summaries
pub mod persistence;

// OSM map-extract parsing
pub mod osm;
pub use osm::{parse_osm, parse_osm_file, OsmWay, ParsedOsm};

// GPX single-track loading
pub mod gpx_import;
pub use gpx_import::load_gpx_track;

// Label anchor/rotation resolution
pub mod label;
pub use label::{place_label, LabelPlacement};

// SVG map and comparison chart rendering
pub mod render;
pub use render::{render_comparison_charts, render_map, MapOrientation, RenderConfig};

// ============================================================================
// Core Types
// ============================================================================

/// A latitude/longitude pair along a trail or lift.
///
/// # Example
/// ```
/// use piste_mapper::TrailPoint;
/// let summit = TrailPoint::new(44.5284, -72.7854); // Mount Mansfield
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl TrailPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a track or a whole mountain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Create bounds from points. Returns `None` for an empty slice.
    pub fn from_points(points: &[TrailPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lon = f64::MAX;
        let mut max_lon = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lon = min_lon.min(p.longitude);
            max_lon = max_lon.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    /// Merge with another bounding box.
    pub fn merge(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// Ground extent in kilometers as (north-south, east-west).
    pub fn extent_km(&self) -> (f64, f64) {
        let top = TrailPoint::new(self.max_lat, self.max_lon);
        let bottom = TrailPoint::new(self.min_lat, self.max_lon);
        let bottom_alt = TrailPoint::new(self.min_lat, self.min_lon);
        let north_south = haversine_distance(&top, &bottom) / 1000.0;
        let east_west = haversine_distance(&bottom, &bottom_alt) / 1000.0;
        (north_south, east_west)
    }
}

/// Format a raw way name for display: underscore-separated words with major
/// words capitalized. Short words (articles, prepositions) stay lowercase and
/// the Scottish `Mc` prefix keeps its internal capital.
pub fn format_name(name: &str) -> String {
    let mut formatted = String::new();
    for word in name.split('_') {
        if word.is_empty() {
            continue;
        }
        if let Some(rest) = word.strip_prefix("mcc") {
            formatted.push_str("McC");
            formatted.push_str(rest);
        } else if word.len() > 2 || word == "fe" {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                formatted.extend(first.to_uppercase());
                formatted.push_str(chars.as_str());
            }
        } else {
            formatted.push_str(word);
        }
        formatted.push(' ');
    }
    formatted.trim_end().to_string()
}

// ============================================================================
// Tests
// ============================================================================
