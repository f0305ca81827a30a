//! Shared types, error enum, and per-tick input records for sepwatch-core.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by sepwatch.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("trajectory projector failed: {0}")]
    Projector(String),
    #[error("intensity sampler failed: {0}")]
    Sampler(String),
    #[error("webhook delivery failed: {0}")]
    Webhook(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Stable aircraft identifier (typically the hex ICAO address).
pub type AircraftId = String;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point on the earth's surface, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

// ---------------------------------------------------------------------------
// Snapshot input
// ---------------------------------------------------------------------------

/// One aircraft as seen in the current tick's snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    pub id: AircraftId,
    #[serde(default)]
    pub callsign: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub ground_speed_kts: f64,
    /// Ground track, degrees in [0, 360).
    pub track_deg: f64,
    #[serde(default)]
    pub vertical_rate_fpm: Option<f64>,
}

impl AircraftState {
    pub fn new(id: &str, lat: f64, lon: f64, altitude_ft: f64) -> Self {
        AircraftState {
            id: id.to_string(),
            callsign: None,
            lat,
            lon,
            altitude_ft,
            ground_speed_kts: 0.0,
            track_deg: 0.0,
            vertical_rate_fpm: None,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Callsign if known, otherwise the id.
    pub fn label(&self) -> &str {
        self.callsign.as_deref().unwrap_or(&self.id)
    }
}

/// One sample of an externally projected trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    /// Seconds relative to the projection origin.
    #[serde(default)]
    pub t_offset_s: Option<f64>,
}

impl ProjectedPoint {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Time-ascending projected trajectory for one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedTrack {
    pub id: AircraftId,
    pub points: Vec<ProjectedPoint>,
}

// ---------------------------------------------------------------------------
// Unordered pair identity
// ---------------------------------------------------------------------------

/// Canonical unordered pair of aircraft ids. `PairKey::new(a, b)` and
/// `PairKey::new(b, a)` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[AircraftId; 2]", into = "[AircraftId; 2]")]
pub struct PairKey {
    first: AircraftId,
    second: AircraftId,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            PairKey {
                first: a.to_string(),
                second: b.to_string(),
            }
        } else {
            PairKey {
                first: b.to_string(),
                second: a.to_string(),
            }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl From<[AircraftId; 2]> for PairKey {
    fn from([a, b]: [AircraftId; 2]) -> Self {
        PairKey::new(&a, &b)
    }
}

impl From<PairKey> for [AircraftId; 2] {
    fn from(key: PairKey) -> Self {
        [key.first, key.second]
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
