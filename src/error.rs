//! Unified error handling for the piste-mapper library.
//!
//! This module provides a consistent error type for all pipeline operations,
//! replacing mixed error handling patterns (Option, panic, silent failures).

use std::fmt;

/// Unified error type for piste-mapper operations.
#[derive(Debug, Clone)]
pub enum PisteMapError {
    /// Trail has no points at all
    EmptyTrack { trail_name: String },
    /// Elevation profile is empty where one is required
    EmptyProfile { trail_name: String },
    /// Track and elevation profile lengths disagree
    ProfileLengthMismatch {
        trail_name: String,
        point_count: usize,
        elevation_count: usize,
    },
    /// Elevation lookup returned a non-success response
    ElevationFetchFailed {
        trail_name: String,
        status_code: Option<u16>,
        message: String,
    },
    /// A coordinate was missing from the elevation cache
    CacheMiss { trail_name: String },
    /// Source file could not be parsed
    ParseError { path: String, message: String },
    /// Persistence/storage error
    PersistenceError { message: String },
    /// Generic internal error
    Internal { message: String },
}

impl fmt::Display for PisteMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PisteMapError::EmptyTrack { trail_name } => {
                write!(f, "Trail '{}' has no points", trail_name)
            }
            PisteMapError::EmptyProfile { trail_name } => {
                write!(f, "Trail '{}' has no elevation profile", trail_name)
            }
            PisteMapError::ProfileLengthMismatch {
                trail_name,
                point_count,
                elevation_count,
            } => {
                write!(
                    f,
                    "Trail '{}' has {} points but {} elevations",
                    trail_name, point_count, elevation_count
                )
            }
            PisteMapError::ElevationFetchFailed {
                trail_name,
                status_code,
                message,
            } => {
                if let Some(code) = status_code {
                    write!(
                        f,
                        "Elevation lookup failed on '{}' ({}): {}",
                        trail_name, code, message
                    )
                } else {
                    write!(f, "Elevation lookup failed on '{}': {}", trail_name, message)
                }
            }
            PisteMapError::CacheMiss { trail_name } => {
                write!(f, "Trail '{}' has missing elevation cache rows", trail_name)
            }
            PisteMapError::ParseError { path, message } => {
                write!(f, "Failed to parse '{}': {}", path, message)
            }
            PisteMapError::PersistenceError { message } => {
                write!(f, "Persistence error: {}", message)
            }
            PisteMapError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for PisteMapError {}

/// Result type alias for piste-mapper operations.
pub type Result<T> = std::result::Result<T, PisteMapError>;

impl From<std::io::Error> for PisteMapError {
    fn from(err: std::io::Error) -> Self {
        PisteMapError::PersistenceError {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for PisteMapError {
    fn from(err: csv::Error) -> Self {
        PisteMapError::PersistenceError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PisteMapError::ProfileLengthMismatch {
            trail_name: "Nosedive".to_string(),
            point_count: 120,
            elevation_count: 80,
        };
        assert!(err.to_string().contains("Nosedive"));
        assert!(err.to_string().contains("120 points"));
    }

    #[test]
    fn test_fetch_error_includes_status() {
        let err = PisteMapError::ElevationFetchFailed {
            trail_name: "Chin Clip".to_string(),
            status_code: Some(429),
            message: "too many requests".to_string(),
        };
        assert!(err.to_string().contains("429"));
    }
}
