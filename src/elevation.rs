//! Elevation lookups.
//!
//! Trail geometry from map extracts carries no elevation data, so every
//! point is resolved against an Open Topo Data-compatible HTTP service.
//! Lookups are batched, rate-limited to one request per second, and cached
//! on disk between runs so that re-rendering a mountain does not hammer the
//! public endpoint.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{PisteMapError, Result};
use crate::TrailPoint;

/// Default lookup endpoint (ASTER 30 m dataset).
pub const DEFAULT_ELEVATION_URL: &str = "https://api.opentopodata.org/v1/aster30m";

/// Maximum coordinates per request, dictated by the service's URL limits.
const MAX_BATCH_SIZE: usize = 99;

/// Minimum spacing between requests.
const REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that can resolve elevations for a track.
///
/// The pipeline only talks to this trait; production wires up a cache-backed
/// fetcher while tests substitute fixed profiles.
pub trait ElevationSource {
    fn elevations_for(&mut self, trail_name: &str, points: &[TrailPoint]) -> Result<Vec<f64>>;
}

/// Enforces the service's one-request-per-second policy across a whole run.
#[derive(Debug, Default)]
pub struct ElevationThrottle {
    last_called: Option<Instant>,
    requests: u32,
}

impl ElevationThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep out the remainder of the interval since the previous request,
    /// then mark a new request as started.
    pub fn pause(&mut self) {
        if let Some(last) = self.last_called {
            let elapsed = last.elapsed();
            if elapsed < REQUEST_INTERVAL {
                thread::sleep(REQUEST_INTERVAL - elapsed);
            }
        }
        self.last_called = Some(Instant::now());
        self.requests += 1;
    }

    /// Requests issued so far.
    pub fn request_count(&self) -> u32 {
        self.requests
    }
}

/// Coordinate key with enough precision to survive a CSV round trip.
fn cache_key(point: &TrailPoint) -> String {
    format!("{:.8},{:.8}", point.latitude, point.longitude)
}

/// In-memory elevation cache keyed by rounded coordinates.
///
/// Loaded from CSV at startup and written back after a run; see the
/// `persistence` module.
#[derive(Debug, Default, Clone)]
pub struct ElevationCache {
    entries: HashMap<String, f64>,
}

impl ElevationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, point: &TrailPoint) -> Option<f64> {
        self.entries.get(&cache_key(point)).copied()
    }

    pub fn insert(&mut self, point: &TrailPoint, elevation: f64) {
        self.entries.insert(cache_key(point), elevation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries as (latitude, longitude, elevation) for persistence.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.entries.iter().filter_map(|(key, elevation)| {
            let (lat, lon) = key.split_once(',')?;
            Some((lat.parse().ok()?, lon.parse().ok()?, *elevation))
        })
    }

    /// Resolve a whole track from cache. Any missing point fails the track.
    pub fn lookup_track(&self, trail_name: &str, points: &[TrailPoint]) -> Result<Vec<f64>> {
        points
            .iter()
            .map(|p| {
                self.get(p).ok_or_else(|| PisteMapError::CacheMiss {
                    trail_name: trail_name.to_string(),
                })
            })
            .collect()
    }
}

/// Offline mode: the cache is the only source, and misses skip the trail.
impl ElevationSource for ElevationCache {
    fn elevations_for(&mut self, trail_name: &str, points: &[TrailPoint]) -> Result<Vec<f64>> {
        self.lookup_track(trail_name, points)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: f64,
}

/// Live HTTP elevation fetcher.
pub struct ElevationFetcher {
    agent: ureq::Agent,
    base_url: String,
    throttle: ElevationThrottle,
}

impl ElevationFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.into(),
            throttle: ElevationThrottle::new(),
        }
    }

    /// Fetch elevations for every point, in order, batching to the service's
    /// per-request coordinate limit.
    pub fn fetch(&mut self, trail_name: &str, points: &[TrailPoint]) -> Result<Vec<f64>> {
        let mut elevations = Vec::with_capacity(points.len());

        for batch in points.chunks(MAX_BATCH_SIZE) {
            let locations = pipe_coordinates(batch);
            self.throttle.pause();
            debug!(
                "Requesting {} elevations for '{}' (request #{})",
                batch.len(),
                trail_name,
                self.throttle.request_count()
            );

            let response = self
                .agent
                .get(&self.base_url)
                .query("locations", &locations)
                .call()
                .map_err(|err| match err {
                    ureq::Error::Status(code, _) => PisteMapError::ElevationFetchFailed {
                        trail_name: trail_name.to_string(),
                        status_code: Some(code),
                        message: format!("service returned status {}", code),
                    },
                    ureq::Error::Transport(transport) => PisteMapError::ElevationFetchFailed {
                        trail_name: trail_name.to_string(),
                        status_code: None,
                        message: transport.to_string(),
                    },
                })?;

            let body = response
                .into_string()
                .map_err(|err| PisteMapError::ElevationFetchFailed {
                    trail_name: trail_name.to_string(),
                    status_code: None,
                    message: format!("unreadable response body: {}", err),
                })?;
            let parsed: LookupResponse = serde_json::from_str(&body).map_err(|err| {
                PisteMapError::ElevationFetchFailed {
                    trail_name: trail_name.to_string(),
                    status_code: None,
                    message: format!("malformed response body: {}", err),
                }
            })?;

            if parsed.results.len() != batch.len() {
                return Err(PisteMapError::ElevationFetchFailed {
                    trail_name: trail_name.to_string(),
                    status_code: None,
                    message: format!(
                        "requested {} elevations, received {}",
                        batch.len(),
                        parsed.results.len()
                    ),
                });
            }

            elevations.extend(parsed.results.iter().map(|r| r.elevation));
        }

        Ok(elevations)
    }
}

impl Default for ElevationFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_ELEVATION_URL)
    }
}

impl ElevationSource for ElevationFetcher {
    fn elevations_for(&mut self, trail_name: &str, points: &[TrailPoint]) -> Result<Vec<f64>> {
        self.fetch(trail_name, points)
    }
}

/// Cache-first source backed by a fallback source (a live fetcher in
/// production).
///
/// A track fully covered by the cache never touches the fallback; any miss
/// refetches the whole track through it and folds the results back into the
/// cache.
pub struct ElevationService<F: ElevationSource = ElevationFetcher> {
    cache: ElevationCache,
    fetcher: F,
}

impl<F: ElevationSource> ElevationService<F> {
    pub fn new(cache: ElevationCache, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    /// Hand the (possibly grown) cache back for persistence.
    pub fn into_cache(self) -> ElevationCache {
        self.cache
    }
}

impl<F: ElevationSource> ElevationSource for ElevationService<F> {
    fn elevations_for(&mut self, trail_name: &str, points: &[TrailPoint]) -> Result<Vec<f64>> {
        match self.cache.lookup_track(trail_name, points) {
            Ok(elevations) => {
                debug!("Cache hit for all {} points of '{}'", points.len(), trail_name);
                Ok(elevations)
            }
            Err(PisteMapError::CacheMiss { .. }) => {
                info!("Cache miss for '{}', fetching live", trail_name);
                let elevations = self.fetcher.elevations_for(trail_name, points)?;
                for (point, elevation) in points.iter().zip(&elevations) {
                    self.cache.insert(point, *elevation);
                }
                Ok(elevations)
            }
            Err(other) => {
                warn!("Cache lookup failed for '{}': {}", trail_name, other);
                Err(other)
            }
        }
    }
}

/// Join coordinates into the service's `lat,lon|lat,lon` query format.
fn pipe_coordinates(points: &[TrailPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.latitude, p.longitude))
        .collect::<Vec<_>>()
        .join("|")
}
