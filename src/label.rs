//! Label anchor and rotation resolution.
//!
//! A trail name is drawn along the trail itself, so the anchor has to sit on
//! a section straight enough to hold the whole label and far enough from
//! both ends that the text does not hang off the trail. Each candidate point
//! is scored by how consistent the segment bearings are across the label's
//! footprint; the best-scoring point wins, with the geometric midpoint as
//! the fallback when nothing qualifies.

use crate::geo_utils::{path_distances, path_length};
use crate::TrailPoint;

/// Approximate on-the-ground footprint of one rendered character, in meters.
const METERS_PER_CHAR: f64 = 10.0;

/// Maximum bearing deviation from the window mean for a segment to count as
/// straight, in degrees.
const BEARING_TOLERANCE: f64 = 5.0;

/// A resolved label position: the anchor point's index and the text
/// rotation in plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub index: usize,
    pub angle_degrees: f64,
}

/// Bearing of the segment arriving at each point, in degrees; index 0 has no
/// incoming segment and reads as 0.
fn segment_bearings(points: &[TrailPoint]) -> Vec<f64> {
    let mut bearings = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        if i == 0 {
            bearings.push(0.0);
        } else {
            let dlat = point.latitude - points[i - 1].latitude;
            let dlon = point.longitude - points[i - 1].longitude;
            bearings.push(dlat.atan2(dlon).to_degrees());
        }
    }
    bearings
}

/// Fold a raw segment angle into the readable-text range for the map's
/// axis arrangement.
fn normalize_rotation(mut angle: f64, flip_lat_lon: bool) -> f64 {
    if flip_lat_lon {
        if angle < -90.0 {
            angle -= 180.0;
        }
        if angle > 90.0 {
            angle -= 180.0;
        }
        angle
    } else {
        angle -= 90.0;
        if angle < -90.0 {
            angle += 180.0;
        }
        angle
    }
}

/// Pick the anchor index and rotation for a trail label of `label_chars`
/// characters.
///
/// `flip_lat_lon` must match the axis arrangement the map is drawn with
/// (true for north/south-facing maps), since the rotation is expressed in
/// plot coordinates.
pub fn place_label(points: &[TrailPoint], label_chars: usize, flip_lat_lon: bool) -> LabelPlacement {
    let fallback = LabelPlacement {
        index: points.len() / 2,
        angle_degrees: normalize_rotation(0.0, flip_lat_lon),
    };
    if points.len() < 2 {
        return fallback;
    }

    let total_length = path_length(points);
    let point_gap = total_length / points.len() as f64;
    if point_gap <= 0.0 {
        return fallback;
    }

    // The footprint in meters is independent of spacing; the same footprint
    // expressed in points depends on how densely the trail is sampled.
    let label_length = label_chars as f64 * METERS_PER_CHAR;
    let footprint_points = (label_length / point_gap) as usize;
    let half_window = footprint_points / 2;

    let bearings = segment_bearings(points);
    let distances = path_distances(points);

    // Cumulative length up to (exclusive) each index, so the end-clearance
    // checks are O(1) per candidate.
    let mut cumulative = vec![0.0; points.len() + 1];
    for i in 1..points.len() {
        cumulative[i + 1] = cumulative[i] + distances[i];
    }
    let length_before = |i: usize| cumulative[i];
    // Length from i to the second-to-last point
    let length_after = |i: usize| (cumulative[points.len() - 1] - cumulative[i + 1]).max(0.0);

    let mut best_index = points.len() / 2;
    let mut best_score = 0.0;

    for i in 0..points.len() {
        if length_before(i) <= label_length / 2.0 || length_after(i) <= label_length / 2.0 {
            continue;
        }

        let start = i.saturating_sub(half_window);
        let end = (i + half_window).min(bearings.len());
        let window = &bearings[start..end];
        if window.is_empty() {
            continue;
        }

        let mean = window.iter().sum::<f64>() / window.len() as f64;
        let straight = window
            .iter()
            .filter(|b| (**b - mean).abs() < BEARING_TOLERANCE)
            .count();
        let score = straight as f64 / window.len() as f64;
        if score > best_score {
            best_score = score;
            best_index = i;
        }
    }

    let index = if best_score > 0.0 {
        best_index
    } else {
        points.len() / 2
    };

    let raw_angle = if index == 0 {
        0.0
    } else {
        let mut dlat = points[index].latitude - points[index - 1].latitude;
        let mut dlon = points[index].longitude - points[index - 1].longitude;
        // Duplicate points happen at densification seams; look one further back
        if index > 1 && dlat == 0.0 && dlon == 0.0 {
            dlat = points[index].latitude - points[index - 2].latitude;
            dlon = points[index].longitude - points[index - 2].longitude;
        }
        dlat.atan2(dlon).to_degrees()
    };

    LabelPlacement {
        index,
        angle_degrees: normalize_rotation(raw_angle, flip_lat_lon),
    }
}
