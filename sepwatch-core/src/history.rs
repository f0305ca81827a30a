//! Per-aircraft trail buffers over a trailing time window.
//!
//! The store outlives ticks: each snapshot appends one point per sighted
//! aircraft, then age-based eviction runs over every trail. An aircraft that
//! drops out of a snapshot keeps its trail until the points age out, so a
//! brief signal gap does not erase its heading context.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::types::{AircraftId, AircraftState, GeoPoint};

/// Default trailing window: 5 minutes.
pub const DEFAULT_WINDOW_S: f64 = 300.0;

/// Default per-aircraft point cap.
pub const DEFAULT_MAX_POINTS: usize = 600;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailPoint {
    pub timestamp: f64,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: Option<f64>,
    pub track_deg: Option<f64>,
}

impl TrailPoint {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Time-ascending position history for one aircraft.
#[derive(Debug, Clone, Serialize)]
pub struct Trail {
    pub id: AircraftId,
    pub callsign: Option<String>,
    pub points: VecDeque<TrailPoint>,
}

impl Trail {
    fn new(id: &str) -> Self {
        Trail {
            id: id.to_string(),
            callsign: None,
            points: VecDeque::new(),
        }
    }

    pub fn last_seen(&self) -> Option<f64> {
        self.points.back().map(|p| p.timestamp)
    }

    /// Contiguous copy of the points, oldest first.
    pub fn to_vec(&self) -> Vec<TrailPoint> {
        self.points.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Trail store keyed by aircraft id.
#[derive(Debug, Clone)]
pub struct TrackHistory {
    pub window_s: f64,
    pub max_points: usize,
    trails: HashMap<AircraftId, Trail>,
}

impl TrackHistory {
    pub fn new(window_s: f64, max_points: usize) -> Self {
        TrackHistory {
            window_s,
            max_points: max_points.max(1),
            trails: HashMap::new(),
        }
    }

    /// Append one point per aircraft in the snapshot, then evict points
    /// older than `now - window_s`. Returns the number of points appended.
    pub fn update(&mut self, aircraft: &[AircraftState], now: f64) -> usize {
        let mut appended = 0;

        for ac in aircraft {
            let trail = self
                .trails
                .entry(ac.id.clone())
                .or_insert_with(|| Trail::new(&ac.id));

            if ac.callsign.is_some() {
                trail.callsign = ac.callsign.clone();
            }

            // Never let time run backwards inside a trail
            if let Some(last) = trail.last_seen() {
                if now < last {
                    debug!(id = %ac.id, now, last, "dropping out-of-order trail point");
                    continue;
                }
            }

            trail.points.push_back(TrailPoint {
                timestamp: now,
                lat: ac.lat,
                lon: ac.lon,
                altitude_ft: Some(ac.altitude_ft),
                track_deg: Some(ac.track_deg),
            });
            while trail.points.len() > self.max_points {
                trail.points.pop_front();
            }
            appended += 1;
        }

        self.evict(now);
        appended
    }

    /// Drop points older than the window; trails left empty are removed.
    pub fn evict(&mut self, now: f64) -> usize {
        let cutoff = now - self.window_s;
        let mut evicted = 0;
        for trail in self.trails.values_mut() {
            while trail.points.front().is_some_and(|p| p.timestamp < cutoff) {
                trail.points.pop_front();
                evicted += 1;
            }
        }
        self.trails.retain(|_, t| !t.points.is_empty());
        evicted
    }

    pub fn get(&self, id: &str) -> Option<&Trail> {
        self.trails.get(id)
    }

    pub fn trails(&self) -> impl Iterator<Item = &Trail> {
        self.trails.values()
    }

    pub fn len(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    pub fn reset(&mut self) {
        self.trails.clear();
    }
}

impl Default for TrackHistory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_S, DEFAULT_MAX_POINTS)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
