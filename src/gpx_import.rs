//! GPX single-track loading.
//!
//! A GPS recording of one run arrives as a GPX file whose track points
//! already carry elevations, so the pipeline skips the lookup service and
//! goes straight to densify-and-smooth (with the heavier GPS smoothing
//! preset; see `PipelineConfig::gps`).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{info, warn};

use crate::error::{PisteMapError, Result};
use crate::TrailPoint;

/// Load every track point (across all tracks and segments) from a GPX file,
/// paired with its recorded elevation.
///
/// Points without an elevation are dropped with a warning; a file that
/// yields no usable points at all is an error.
pub fn load_gpx_track(path: &Path) -> Result<(Vec<TrailPoint>, Vec<f64>)> {
    let file = File::open(path).map_err(|err| PisteMapError::ParseError {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;

    let parsed = gpx::read(BufReader::new(file)).map_err(|err| PisteMapError::ParseError {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;

    let mut points = Vec::new();
    let mut elevations = Vec::new();

    for track in &parsed.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                let Some(elevation) = waypoint.elevation else {
                    warn!(
                        "Dropping point without elevation in {}",
                        path.display()
                    );
                    continue;
                };
                let location = waypoint.point();
                points.push(TrailPoint::new(location.y(), location.x()));
                elevations.push(elevation);
            }
        }
    }

    if points.is_empty() {
        return Err(PisteMapError::EmptyTrack {
            trail_name: path.display().to_string(),
        });
    }

    info!("Loaded {} points from {}", points.len(), path.display());
    Ok((points, elevations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>morning run</name>
    <trkseg>
      <trkpt lat="44.5284" lon="-72.7854"><ele>1163.0</ele></trkpt>
      <trkpt lat="44.5280" lon="-72.7850"><ele>1150.5</ele></trkpt>
      <trkpt lat="44.5276" lon="-72.7846"></trkpt>
      <trkpt lat="44.5272" lon="-72.7842"><ele>1139.0</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    fn write_sample(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("piste-mapper-test-{}-{}", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_track_with_elevations() {
        let path = write_sample("run.gpx", SAMPLE_GPX);
        let (points, elevations) = load_gpx_track(&path).unwrap();
        // The point without an elevation is dropped
        assert_eq!(points.len(), 3);
        assert_eq!(elevations, vec![1163.0, 1150.5, 1139.0]);
        assert!((points[0].latitude - 44.5284).abs() < 1e-9);
        assert!((points[0].longitude + 72.7854).abs() < 1e-9);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let result = load_gpx_track(Path::new("/nonexistent/run.gpx"));
        assert!(matches!(result, Err(PisteMapError::ParseError { .. })));
    }

    #[test]
    fn test_empty_track_is_error() {
        let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg></trkseg></trk>
</gpx>"#;
        let path = write_sample("empty.gpx", empty);
        assert!(matches!(
            load_gpx_track(&path),
            Err(PisteMapError::EmptyTrack { .. })
        ));
        std::fs::remove_file(&path).ok();
    }
}
