//! Geographic utilities shared by every pipeline stage.
//!
//! Distances are great-circle (haversine) in meters. Per-point distance
//! series use a NaN placeholder at index 0 — there is no previous point to
//! measure from, and downstream consumers are required to special-case it
//! rather than treat it as a real distance.

use geo::{Distance, Haversine, Point};

use crate::TrailPoint;

/// Great-circle distance between two points in meters.
pub fn haversine_distance(a: &TrailPoint, b: &TrailPoint) -> f64 {
    Haversine::distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    )
}

/// Per-point distance series along a track.
///
/// `result[0]` is NaN (no previous point); `result[i]` for i > 0 is the
/// distance from point i-1 to point i. The output is index-aligned with the
/// input, so an empty track yields an empty series.
pub fn path_distances(points: &[TrailPoint]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(points.len());
    let mut previous: Option<&TrailPoint> = None;
    for point in points {
        match previous {
            Some(prev) => distances.push(haversine_distance(prev, point)),
            None => distances.push(f64::NAN),
        }
        previous = Some(point);
    }
    distances
}

/// Total length of a track in meters, skipping the NaN placeholder.
pub fn path_length(points: &[TrailPoint]) -> f64 {
    path_distances(points).iter().skip(1).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // London to Paris, roughly 344 km
        let london = TrailPoint::new(51.5074, -0.1278);
        let paris = TrailPoint::new(48.8566, 2.3522);
        let d = haversine_distance(&london, &paris);
        assert!(d > 330_000.0 && d < 350_000.0);
    }

    #[test]
    fn test_path_distances_sentinel() {
        let points = vec![
            TrailPoint::new(44.5, -72.78),
            TrailPoint::new(44.501, -72.78),
            TrailPoint::new(44.502, -72.78),
        ];
        let distances = path_distances(&points);
        assert_eq!(distances.len(), 3);
        assert!(distances[0].is_nan());
        assert!(distances[1] > 0.0);
        assert!(distances[2] > 0.0);
    }

    #[test]
    fn test_path_length_skips_sentinel() {
        let points = vec![
            TrailPoint::new(44.5, -72.78),
            TrailPoint::new(44.501, -72.78),
        ];
        let length = path_length(&points);
        assert!(length.is_finite());
        // ~111 m per 0.001 degrees of latitude
        assert!(length > 100.0 && length < 125.0);
    }

    #[test]
    fn test_empty_and_single_point() {
        assert!(path_distances(&[]).is_empty());
        assert_eq!(path_length(&[]), 0.0);
        let single = vec![TrailPoint::new(44.5, -72.78)];
        assert_eq!(path_length(&single), 0.0);
    }
}
