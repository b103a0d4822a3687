//! Elevation smoothing.
//!
//! Public elevation datasets quantize to whole meters and GPS recordings
//! jitter; both produce staircase artifacts that read as short steep pitches.
//! The smoother runs a cheap trailing average over the profile for a number
//! of passes, eating the noise while keeping the overall descent intact.

use crate::error::{PisteMapError, Result};

/// Default pass count for noisy single-track (GPS) recordings.
pub const GPS_SMOOTHING_PASSES: u32 = 20;

/// Default pass count for map-extract elevation data, which is already
/// fairly smooth after the lookup service's interpolation.
pub const OSM_SMOOTHING_PASSES: u32 = 1;

/// Smooth an elevation profile in place over `passes` sweeps.
///
/// Each sweep walks left to right. A point at index i >= 2 is replaced by the
/// mean of itself, the point before it (already updated this sweep), and the
/// pre-sweep value from two positions back. The first two points are never
/// modified, so the profile keeps its anchor at the trailhead.
///
/// `passes == 0` returns the input unchanged. An empty profile is a
/// precondition violation.
pub fn smooth_elevations(elevations: &[f64], passes: u32) -> Result<Vec<f64>> {
    if elevations.is_empty() {
        return Err(PisteMapError::EmptyProfile {
            trail_name: String::new(),
        });
    }

    let mut smoothed = elevations.to_vec();
    if smoothed.len() < 3 {
        return Ok(smoothed);
    }

    for _ in 0..passes {
        // Pre-sweep values at i-2 and i-1, tracked before they are overwritten
        let mut two_back = smoothed[0];
        let mut one_back = smoothed[1];
        for i in 2..smoothed.len() {
            let original = smoothed[i];
            smoothed[i] = (smoothed[i] + smoothed[i - 1] + two_back) / 3.0;
            two_back = one_back;
            one_back = original;
        }
    }

    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_invariant() {
        let profile = vec![1000.0, 1003.0, 998.0, 1001.0, 995.0, 990.0];
        for passes in [0, 1, 5, 20] {
            let smoothed = smooth_elevations(&profile, passes).unwrap();
            assert_eq!(smoothed.len(), profile.len());
        }
    }

    #[test]
    fn test_zero_passes_is_identity() {
        let profile = vec![1000.0, 1003.0, 998.0];
        assert_eq!(smooth_elevations(&profile, 0).unwrap(), profile);
    }

    #[test]
    fn test_first_two_points_fixed() {
        let profile = vec![1000.0, 1010.0, 980.0, 1020.0, 970.0];
        let smoothed = smooth_elevations(&profile, 20).unwrap();
        assert_eq!(smoothed[0], profile[0]);
        assert_eq!(smoothed[1], profile[1]);
    }

    #[test]
    fn test_reduces_jitter() {
        // Alternating +/-10 m spikes around a flat 1000 m profile
        let profile: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 1010.0 } else { 990.0 })
            .collect();
        let smoothed = smooth_elevations(&profile, 20).unwrap();
        let spread = |vals: &[f64]| {
            let max = vals.iter().cloned().fold(f64::MIN, f64::max);
            let min = vals.iter().cloned().fold(f64::MAX, f64::min);
            max - min
        };
        assert!(spread(&smoothed[2..]) < spread(&profile[2..]));
    }

    #[test]
    fn test_constant_profile_is_fixed_point() {
        let profile = vec![1000.0; 10];
        let smoothed = smooth_elevations(&profile, 20).unwrap();
        for value in smoothed {
            assert!((value - 1000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_profile_is_error() {
        assert!(matches!(
            smooth_elevations(&[], 1),
            Err(PisteMapError::EmptyProfile { .. })
        ));
    }

    #[test]
    fn test_short_profiles_pass_through() {
        assert_eq!(smooth_elevations(&[5.0], 20).unwrap(), vec![5.0]);
        assert_eq!(smooth_elevations(&[5.0, 6.0], 20).unwrap(), vec![5.0, 6.0]);
    }
}
