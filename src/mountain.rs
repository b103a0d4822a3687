//! Structured trail, lift, and mountain records plus the per-trail
//! enrichment pipeline.
//!
//! A [`TrailRecord`] replaces the positional tuples the data originally
//! traveled in: every field is named, and the derived series live next to
//! the geometry they are aligned with. A [`Mountain`] owns all trails and
//! lifts for one ski area; it is built once per run, enriched in place, then
//! consumed by rendering.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::densify::{area_to_centerline, fill_point_gaps, DEFAULT_MAX_GAP};
use crate::difficulty::{
    assign_tier, difficulty_series, elevation_changes, rate_trail, slope_series, Tier,
};
use crate::elevation::ElevationSource;
use crate::error::{PisteMapError, Result};
use crate::geo_utils::{path_distances, path_length};
use crate::osm::ParsedOsm;
use crate::smoothing::{smooth_elevations, GPS_SMOOTHING_PASSES, OSM_SMOOTHING_PASSES};
use crate::{Bounds, TrailPoint};

/// Number of hardest (or easiest) trails in the broad aggregation term.
const BROAD_SAMPLE: usize = 30;

/// Number of trails in the heavily-weighted head term.
const HEAD_SAMPLE: usize = 5;

/// Weight of the broad term vs the head term.
const BROAD_WEIGHT: f64 = 0.2;
const HEAD_WEIGHT: f64 = 0.8;

/// Tunable parameters for the enrichment pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum consecutive-point gap after densification, in meters.
    /// Default: [`DEFAULT_MAX_GAP`]
    pub max_gap: f64,

    /// Smoothing passes over the elevation profile.
    /// Default: 1 (map-extract data; use 20 for noisy GPS recordings)
    pub smoothing_passes: u32,

    /// Minimum trail length for its rating to count toward the mountain
    /// aggregate, in meters. Default: 100.0
    pub min_rated_trail_length: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_gap: DEFAULT_MAX_GAP,
            smoothing_passes: OSM_SMOOTHING_PASSES,
            min_rated_trail_length: 100.0,
        }
    }
}

impl PipelineConfig {
    /// Preset for single-track GPS recordings, which carry much noisier
    /// elevation samples than the lookup service returns.
    pub fn gps() -> Self {
        Self {
            smoothing_passes: GPS_SMOOTHING_PASSES,
            ..Self::default()
        }
    }
}

/// A track with its elevation profile and every derived series.
///
/// All vectors are index-aligned: `distances[0]`, `elevation_deltas[0]`,
/// `slopes[0]`, and `difficulties[0]` follow the first-element conventions
/// described in the `difficulty` module.
#[derive(Debug, Clone)]
pub struct AnalyzedTrack {
    pub points: Vec<TrailPoint>,
    pub elevations: Vec<f64>,
    pub distances: Vec<f64>,
    pub elevation_deltas: Vec<f64>,
    pub slopes: Vec<f64>,
    pub difficulties: Vec<f64>,
}

impl AnalyzedTrack {
    /// Smooth the profile and derive all series for an already-densified
    /// track. The profile must be non-empty and index-aligned with the
    /// points.
    pub fn derive(
        trail_name: &str,
        points: Vec<TrailPoint>,
        elevations: Vec<f64>,
        smoothing_passes: u32,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(PisteMapError::EmptyTrack {
                trail_name: trail_name.to_string(),
            });
        }
        if elevations.is_empty() {
            return Err(PisteMapError::EmptyProfile {
                trail_name: trail_name.to_string(),
            });
        }
        if points.len() != elevations.len() {
            return Err(PisteMapError::ProfileLengthMismatch {
                trail_name: trail_name.to_string(),
                point_count: points.len(),
                elevation_count: elevations.len(),
            });
        }

        let elevations = smooth_elevations(&elevations, smoothing_passes)?;
        let distances = path_distances(&points);
        let elevation_deltas = elevation_changes(&elevations);
        let slopes = slope_series(&elevation_deltas, &distances)?;
        let difficulties = difficulty_series(&slopes)?;

        Ok(Self {
            points,
            elevations,
            distances,
            elevation_deltas,
            slopes,
            difficulties,
        })
    }

    /// Track length in meters.
    pub fn length(&self) -> f64 {
        path_length(&self.points)
    }

    /// (lowest, highest) elevation on the track, in meters.
    pub fn elevation_span(&self) -> (f64, f64) {
        let low = self.elevations.iter().cloned().fold(f64::MAX, f64::min);
        let high = self.elevations.iter().cloned().fold(f64::MIN, f64::max);
        (low, high)
    }

    /// Highest minus lowest elevation, in meters.
    pub fn vertical_drop(&self) -> f64 {
        let (low, high) = self.elevation_span();
        high - low
    }
}

/// One named trail with its geometry, derived series, and attributes.
#[derive(Debug, Clone)]
pub struct TrailRecord {
    pub name: String,
    /// Source way id, kept for blacklists and caching.
    pub way_id: String,
    /// Integer difficulty bonus for gladed/wooded terrain.
    pub difficulty_modifier: i32,
    /// Whether the geometry is a closed perimeter rather than a line.
    pub is_area: bool,
    /// The as-recorded geometry (perimeter for areas).
    pub line: AnalyzedTrack,
    /// Centerline reduction, present only when `is_area` is true. Rating
    /// reads from here so a perimeter's sideways slopes don't count.
    pub centerline: Option<AnalyzedTrack>,
}

impl TrailRecord {
    /// The track difficulty analysis should read from: the centerline for
    /// areas, the recorded line otherwise.
    pub fn rating_track(&self) -> &AnalyzedTrack {
        self.centerline.as_ref().unwrap_or(&self.line)
    }

    /// Scalar trail rating (0–0.9 scale).
    pub fn rating(&self) -> f64 {
        rate_trail(&self.rating_track().difficulties)
    }

    /// Difficulty tier for map coloring.
    pub fn tier(&self) -> Tier {
        assign_tier(self.rating(), self.difficulty_modifier)
    }

    /// Display name plus the rating, as printed on the map (rating scaled
    /// by 100, one decimal).
    pub fn map_label(&self) -> String {
        format!(
            "{} {:.1}\u{00b0}",
            crate::format_name(&self.name),
            self.rating() * 100.0
        )
    }
}

/// A lift: a named track with no difficulty semantics.
#[derive(Debug, Clone)]
pub struct LiftRecord {
    pub name: String,
    pub way_id: String,
    pub points: Vec<TrailPoint>,
}

/// Summary row persisted per mountain for cross-mountain comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountainSummary {
    pub mountain: String,
    pub difficulty: f64,
    pub ease: f64,
    pub vertical_drop: f64,
    pub trail_count: usize,
    pub lift_count: usize,
}

/// All trails and lifts for one ski area.
#[derive(Debug, Clone, Default)]
pub struct Mountain {
    pub name: String,
    pub trails: Vec<TrailRecord>,
    pub lifts: Vec<LiftRecord>,
}

impl Mountain {
    /// Build a mountain from parsed OSM ways, fetching elevations through
    /// `source` (cache-first) and enriching every trail.
    ///
    /// A trail whose elevation lookup or series derivation fails is skipped
    /// with a warning; one bad trail never aborts the batch.
    pub fn from_osm(
        name: &str,
        parsed: &ParsedOsm,
        source: &mut dyn ElevationSource,
        config: &PipelineConfig,
    ) -> Mountain {
        let mut trails = Vec::with_capacity(parsed.trails.len());
        let total = parsed.trails.len();

        for (i, way) in parsed.trails.iter().enumerate() {
            if i % 10 == 0 {
                info!("Processing trail {}/{}", i + 1, total);
            }
            match build_trail(way, source, config) {
                Ok(trail) => trails.push(trail),
                Err(err) => warn!("Skipping trail '{}': {}", way.name, err),
            }
        }

        let lifts = parsed
            .lifts
            .iter()
            .map(|way| LiftRecord {
                name: way.name.clone(),
                way_id: way.id.clone(),
                points: way.points.clone(),
            })
            .collect();

        info!(
            "Loaded {} trails and {} lifts for {}",
            trails.len(),
            parsed.lifts.len(),
            name
        );

        Mountain {
            name: name.to_string(),
            trails,
            lifts,
        }
    }

    /// Build a single-trail mountain from a GPS recording that already
    /// carries its own elevation profile.
    pub fn from_gpx_track(
        name: &str,
        points: Vec<TrailPoint>,
        elevations: Vec<f64>,
        config: &PipelineConfig,
    ) -> Result<Mountain> {
        let (points, profile) = fill_point_gaps(&points, Some(&elevations), config.max_gap);
        let elevations = profile.ok_or_else(|| PisteMapError::EmptyProfile {
            trail_name: name.to_string(),
        })?;
        let line = AnalyzedTrack::derive(name, points, elevations, config.smoothing_passes)?;
        Ok(Mountain {
            name: name.to_string(),
            trails: vec![TrailRecord {
                name: name.to_string(),
                way_id: String::new(),
                difficulty_modifier: 0,
                is_area: false,
                line,
                centerline: None,
            }],
            lifts: Vec::new(),
        })
    }

    /// Bounding box over every trail and lift.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        let trail_points = self.trails.iter().map(|t| t.line.points.as_slice());
        let lift_points = self.lifts.iter().map(|l| l.points.as_slice());
        for points in trail_points.chain(lift_points) {
            if let Some(b) = Bounds::from_points(points) {
                bounds = Some(match bounds {
                    Some(existing) => existing.merge(&b),
                    None => b,
                });
            }
        }
        bounds
    }

    /// Vertical drop from the highest trail point to the lowest, in meters.
    /// Spans trails: the summit of one run and the base of another can set
    /// the extremes.
    pub fn vertical_drop(&self) -> f64 {
        let mut low = f64::MAX;
        let mut high = f64::MIN;
        for trail in &self.trails {
            let (trail_low, trail_high) = trail.line.elevation_span();
            low = low.min(trail_low);
            high = high.max(trail_high);
        }
        if high < low {
            0.0
        } else {
            high - low
        }
    }

    /// Trail ratings scaled by 100, restricted to trails long enough to
    /// count toward the mountain aggregate.
    pub fn rating_inputs(&self, config: &PipelineConfig) -> Vec<f64> {
        self.trails
            .iter()
            .filter(|t| path_length(&t.rating_track().points) > config.min_rated_trail_length)
            .map(|t| (t.rating() * 100.0).round())
            .collect()
    }

    /// Summary record for persistence and cross-mountain comparison.
    pub fn summary(&self, config: &PipelineConfig) -> MountainSummary {
        let ratings = self.rating_inputs(config);
        MountainSummary {
            mountain: self.name.clone(),
            difficulty: mountain_rating(&ratings),
            ease: mountain_ease(&ratings),
            vertical_drop: self.vertical_drop(),
            trail_count: self.trails.len(),
            lift_count: self.lifts.len(),
        }
    }
}

fn build_trail(
    way: &crate::osm::OsmWay,
    source: &mut dyn ElevationSource,
    config: &PipelineConfig,
) -> Result<TrailRecord> {
    let (points, _) = fill_point_gaps(&way.points, None, config.max_gap);
    let elevations = source.elevations_for(&way.name, &points)?;
    let line = AnalyzedTrack::derive(&way.name, points, elevations, config.smoothing_passes)?;

    let centerline = if way.is_area {
        let centerline_points = area_to_centerline(&line.points, &line.elevations)?;
        let centerline_elevations = source.elevations_for(&way.name, &centerline_points)?;
        Some(AnalyzedTrack::derive(
            &way.name,
            centerline_points,
            centerline_elevations,
            config.smoothing_passes,
        )?)
    } else {
        None
    };

    Ok(TrailRecord {
        name: way.name.clone(),
        way_id: way.id.clone(),
        difficulty_modifier: way.difficulty_modifier,
        is_area: way.is_area,
        line,
        centerline,
    })
}

/// Blend of the top-N mean and the top-5 mean over a descending-sorted list.
fn blended_head_mean(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let broad_n = sorted.len().min(BROAD_SAMPLE);
    let head_n = sorted.len().min(HEAD_SAMPLE);
    let broad: f64 = sorted[..broad_n].iter().sum::<f64>() / broad_n as f64;
    let head: f64 = sorted[..head_n].iter().sum::<f64>() / head_n as f64;
    let blended = BROAD_WEIGHT * broad + HEAD_WEIGHT * head;
    (blended * 10.0).round() / 10.0
}

/// Overall mountain difficulty: hardest terrain weighted heavily.
///
/// `0.2 * mean(top 30) + 0.8 * mean(top 5)`, computed over however many
/// ratings exist when there are fewer. The broad term guards against a
/// single freak trail dominating; the head term captures how hard the
/// mountain actually gets.
pub fn mountain_rating(ratings: &[f64]) -> f64 {
    let mut sorted = ratings.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    blended_head_mean(&sorted)
}

/// Overall beginner-friendliness: the mirror of [`mountain_rating`] over an
/// ascending sort. Lower means friendlier.
pub fn mountain_ease(ratings: &[f64]) -> f64 {
    let mut sorted = ratings.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    blended_head_mean(&sorted)
}
