//! Track densification.
//!
//! Raw OSM ways and GPS recordings space their points unevenly; slope and
//! difficulty estimates need a bounded gap between consecutive samples.
//! [`fill_point_gaps`] repeatedly bisects the first over-long segment until
//! every consecutive pair is within the threshold.
//!
//! The restart-on-every-insert scan is O(n²)-ish for inputs whose gaps are
//! large relative to the threshold. Trail-sized tracks (hundreds of points)
//! finish instantly; this is a known scaling limit, not a hidden one.

use geo::{Centroid, MultiPoint, Point};

use crate::error::{PisteMapError, Result};
use crate::geo_utils::path_distances;
use crate::TrailPoint;

/// Default maximum gap between consecutive track points, in meters.
pub const DEFAULT_MAX_GAP: f64 = 15.0;

/// Point spacing used when rebuilding an area centerline, in meters.
pub const CENTERLINE_POINT_GAP: f64 = 15.0;

/// Insert midpoints until no consecutive pair of points is farther apart
/// than `max_gap` meters.
///
/// When an elevation profile is supplied it must be index-aligned with the
/// track; inserted points get the mean of the two neighboring elevations so
/// the alignment is preserved.
///
/// Gaps exactly equal to `max_gap` are accepted (strict `>` comparison).
/// Tracks with fewer than two points are returned unchanged.
pub fn fill_point_gaps(
    points: &[TrailPoint],
    elevations: Option<&[f64]>,
    max_gap: f64,
) -> (Vec<TrailPoint>, Option<Vec<f64>>) {
    let mut points = points.to_vec();
    let mut elevations = elevations.map(|e| e.to_vec());

    if points.len() < 2 {
        return (points, elevations);
    }

    loop {
        let distances = path_distances(&points);
        let violation = distances
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, d)| **d > max_gap);

        let Some((index, _)) = violation else {
            break;
        };

        let midpoint = TrailPoint::new(
            (points[index].latitude + points[index - 1].latitude) / 2.0,
            (points[index].longitude + points[index - 1].longitude) / 2.0,
        );
        points.insert(index, midpoint);
        if let Some(elevations) = elevations.as_mut() {
            let mid_elevation = (elevations[index] + elevations[index - 1]) / 2.0;
            elevations.insert(index, mid_elevation);
        }
    }

    (points, elevations)
}

/// Reduce an area's perimeter to a representative centerline.
///
/// Area trails (glades, bowls) are recorded as closed boundary polygons.
/// Rating one directly would measure the perimeter's slope, not the line a
/// skier actually takes, so the perimeter is collapsed to a three-point
/// skeleton — highest vertex, centroid, lowest vertex — and densified back
/// to `CENTERLINE_POINT_GAP` spacing.
///
/// The returned centerline has no elevation profile of its own; callers
/// look elevations up for it the same way they do for any new track.
pub fn area_to_centerline(points: &[TrailPoint], elevations: &[f64]) -> Result<Vec<TrailPoint>> {
    if points.is_empty() {
        return Err(PisteMapError::EmptyTrack {
            trail_name: String::new(),
        });
    }
    if points.len() != elevations.len() {
        return Err(PisteMapError::ProfileLengthMismatch {
            trail_name: String::new(),
            point_count: points.len(),
            elevation_count: elevations.len(),
        });
    }

    let mut highest = 0;
    let mut lowest = 0;
    for (i, elevation) in elevations.iter().enumerate() {
        if *elevation > elevations[highest] {
            highest = i;
        }
        if *elevation < elevations[lowest] {
            lowest = i;
        }
    }

    let multipoint: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect();
    let center = multipoint
        .centroid()
        .ok_or_else(|| PisteMapError::Internal {
            message: "perimeter centroid undefined".to_string(),
        })?;

    let skeleton = vec![
        points[highest],
        TrailPoint::new(center.y(), center.x()),
        points[lowest],
    ];

    let (centerline, _) = fill_point_gaps(&skeleton, None, CENTERLINE_POINT_GAP);
    Ok(centerline)
}
