//! Slope and difficulty derivation.
//!
//! A trail's per-point difficulty is a rescaling of its absolute slope angle:
//! elevation deltas are divided by the great-circle distance between samples,
//! converted to degrees with `atan`, then mapped onto a 0–0.9 scale (a 90°
//! wall would score 0.9; real trails live far below that ceiling). The first
//! element of each derived series is forced to zero — there is no previous
//! point to compare against, and the zero is an explicit boundary rule
//! rather than NaN leaking through.
//!
//! Tier thresholds and the per-modifier bump are calibration constants tuned
//! against real mountains. They are not derived from slope geometry and must
//! not be "corrected".

use serde::{Deserialize, Serialize};

use crate::error::{PisteMapError, Result};

/// Difficulty added per modifier point (gladed/wooded terrain bonus).
const MODIFIER_WEIGHT: f64 = 0.07;

/// Tier boundaries on the effective rating scale.
const EASY_MAX: f64 = 0.17;
const INTERMEDIATE_MAX: f64 = 0.242;
const ADVANCED_MAX: f64 = 0.30;
const EXPERT_MAX: f64 = 0.45;

/// Per-point elevation deltas, index-aligned with the profile.
///
/// `result[0]` is NaN (no previous point); consumers must special-case it,
/// which [`slope_series`] does by forcing its first element to zero.
pub fn elevation_changes(elevations: &[f64]) -> Vec<f64> {
    let mut changes = Vec::with_capacity(elevations.len());
    let mut previous = f64::NAN;
    for elevation in elevations {
        changes.push(elevation - previous);
        previous = *elevation;
    }
    changes
}

/// Per-point slope angles in degrees.
///
/// `slope[i] = atan(change[i] / distance[i])` for i > 0 when the distance is
/// nonzero; a zero distance yields a slope of 0 rather than a division blowup.
/// `slope[0]` is forced to 0 by convention.
pub fn slope_series(changes: &[f64], distances: &[f64]) -> Result<Vec<f64>> {
    if changes.is_empty() {
        return Err(PisteMapError::EmptyProfile {
            trail_name: String::new(),
        });
    }
    if changes.len() != distances.len() {
        return Err(PisteMapError::ProfileLengthMismatch {
            trail_name: String::new(),
            point_count: distances.len(),
            elevation_count: changes.len(),
        });
    }

    let mut slopes: Vec<f64> = changes
        .iter()
        .zip(distances)
        .map(|(change, distance)| {
            if *distance != 0.0 {
                (change / distance).atan().to_degrees()
            } else {
                0.0
            }
        })
        .collect();
    slopes[0] = 0.0;
    Ok(slopes)
}

/// Per-point difficulty on a 0–0.9 scale.
///
/// `difficulty[i] = (|slope[i]| / 90) * 0.9`; `difficulty[0]` is forced to 0,
/// matching the slope convention.
pub fn difficulty_series(slopes: &[f64]) -> Result<Vec<f64>> {
    if slopes.is_empty() {
        return Err(PisteMapError::EmptyProfile {
            trail_name: String::new(),
        });
    }
    let mut difficulties: Vec<f64> = slopes
        .iter()
        .map(|slope| (slope.abs() / 90.0) * 0.9)
        .collect();
    difficulties[0] = 0.0;
    Ok(difficulties)
}

/// Reduce a per-point difficulty series to a single trail rating.
///
/// A 3-point trailing window (zero-initialized) slides over the series; the
/// rating is the maximum window mean seen. Sustained pitches dominate the
/// score while single-point elevation glitches that survived smoothing are
/// diluted by the window.
///
/// A single-point series rates at one third of that point's difficulty — the
/// window is zero-padded — and tier assignment relies on that boundary
/// behavior.
pub fn rate_trail(difficulties: &[f64]) -> f64 {
    let mut max_difficulty: f64 = 0.0;
    let mut previous = 0.0;
    let mut previous_2 = 0.0;
    for point in difficulties {
        let nearby_avg = (point + previous + previous_2) / 3.0;
        if nearby_avg > max_difficulty {
            max_difficulty = nearby_avg;
        }
        previous_2 = previous;
        previous = *point;
    }
    max_difficulty
}

/// Ordinal difficulty tier, conventionally named by map color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Easy,
    Intermediate,
    Advanced,
    Expert,
    Extreme,
}

impl Tier {
    /// CSS color used when drawing the trail on the map.
    pub fn color(&self) -> &'static str {
        match self {
            Tier::Easy => "green",
            Tier::Intermediate => "royalblue",
            Tier::Advanced => "black",
            Tier::Expert => "red",
            Tier::Extreme => "gold",
        }
    }

    /// Human-readable legend label.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Easy => "Easy",
            Tier::Intermediate => "Intermediate",
            Tier::Advanced => "Advanced",
            Tier::Expert => "Expert",
            Tier::Extreme => "Extreme",
        }
    }

    /// All tiers in ascending order, for legends.
    pub fn all() -> [Tier; 5] {
        [
            Tier::Easy,
            Tier::Intermediate,
            Tier::Advanced,
            Tier::Expert,
            Tier::Extreme,
        ]
    }
}

/// Map a trail rating plus its difficulty modifier to a tier.
///
/// `effective = rating + 0.07 * modifier`. Ratings at exactly the expert
/// ceiling stay expert; anything above it is extreme.
pub fn assign_tier(rating: f64, difficulty_modifier: i32) -> Tier {
    let effective = rating + MODIFIER_WEIGHT * difficulty_modifier as f64;
    if effective < EASY_MAX {
        Tier::Easy
    } else if effective < INTERMEDIATE_MAX {
        Tier::Intermediate
    } else if effective < ADVANCED_MAX {
        Tier::Advanced
    } else if effective <= EXPERT_MAX {
        Tier::Expert
    } else {
        Tier::Extreme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::path_distances;
    use crate::TrailPoint;

    #[test]
    fn test_elevation_changes_sentinel() {
        let changes = elevation_changes(&[1000.0, 1010.0, 990.0]);
        assert!(changes[0].is_nan());
        assert_eq!(changes[1], 10.0);
        assert_eq!(changes[2], -20.0);
    }

    #[test]
    fn test_slope_boundary_convention() {
        let points = vec![
            TrailPoint::new(44.500, -72.780),
            TrailPoint::new(44.5005, -72.780),
            TrailPoint::new(44.501, -72.780),
        ];
        let distances = path_distances(&points);
        let changes = elevation_changes(&[1000.0, 1010.0, 990.0]);
        let slopes = slope_series(&changes, &distances).unwrap();
        assert_eq!(slopes[0], 0.0);
        assert!(slopes[1] > 0.0);
        assert!(slopes[2] < 0.0);
    }

    #[test]
    fn test_slope_zero_distance_guard() {
        let slopes = slope_series(&[f64::NAN, 10.0], &[f64::NAN, 0.0]).unwrap();
        assert_eq!(slopes, vec![0.0, 0.0]);
    }

    #[test]
    fn test_difficulty_bounds() {
        let slopes = vec![0.0, -12.0, 45.0, -90.0, 3.0];
        let difficulties = difficulty_series(&slopes).unwrap();
        assert_eq!(difficulties[0], 0.0);
        for d in &difficulties {
            assert!(*d >= 0.0 && *d <= 0.9);
        }
        // 90 degrees maps to the 0.9 ceiling
        assert!((difficulties[3] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_series_reject_empty() {
        assert!(slope_series(&[], &[]).is_err());
        assert!(difficulty_series(&[]).is_err());
    }

    #[test]
    fn test_rate_trail_rewards_sustained_pitch() {
        // One hard point diluted by the window...
        let spike = [0.1, 0.1, 0.8, 0.1, 0.1];
        // ...versus a sustained hard section
        let sustained = [0.1, 0.8, 0.8, 0.8, 0.1];
        assert!(rate_trail(&sustained) > rate_trail(&spike));
        assert!((rate_trail(&sustained) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_rate_trail_single_point_zero_padding() {
        assert!((rate_trail(&[0.6]) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_rate_trail_monotone_under_harder_insert() {
        let mut easy = vec![0.05; 20];
        easy.splice(10..10, [0.8, 0.8, 0.8]);
        assert!(rate_trail(&easy) >= 0.8 - 1e-12);
    }

    #[test]
    fn test_tier_boundary_exactness() {
        assert_eq!(assign_tier(0.169, 0), Tier::Easy);
        assert_eq!(assign_tier(0.17, 0), Tier::Intermediate);
        assert_eq!(assign_tier(0.242, 0), Tier::Advanced);
        assert_eq!(assign_tier(0.30, 0), Tier::Expert);
        assert_eq!(assign_tier(0.45, 0), Tier::Expert);
        assert_eq!(assign_tier(0.451, 0), Tier::Extreme);
    }

    #[test]
    fn test_modifier_bumps_tier() {
        // 0.11 alone is easy; two modifier points push it past 0.242
        assert_eq!(assign_tier(0.11, 0), Tier::Easy);
        assert_eq!(assign_tier(0.11, 2), Tier::Advanced);
    }

    #[test]
    fn test_tier_colors() {
        assert_eq!(assign_tier(0.1, 0).color(), "green");
        assert_eq!(assign_tier(0.5, 0).color(), "gold");
    }
}
