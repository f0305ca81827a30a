//! Heading instability scoring from trail history.
//!
//! Two signals, either of which can saturate the score on its own:
//! dispersion of the step bearings (sustained wandering) and the mean turn
//! rate between consecutive steps (rapid turning).

use std::collections::HashMap;

use crate::geo::{bearing_deg, circular_spread_deg, distance_nm, wrap_delta_deg};
use crate::history::{TrackHistory, TrailPoint};
use crate::types::AircraftId;

/// Bearing spread (degrees) that maps to a full score.
const SPREAD_FULL_SCALE_DEG: f64 = 25.0;

/// Mean turn rate (degrees per second) that maps to a full score.
const TURN_RATE_FULL_SCALE_DPS: f64 = 1.5;

const MIN_POINTS: usize = 3;

fn clamp01(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Drop points that repeat the previous kept position. A zero-length step
/// has no bearing.
fn moving_points(points: &[TrailPoint]) -> Vec<&TrailPoint> {
    let mut kept: Vec<&TrailPoint> = Vec::with_capacity(points.len());
    for p in points {
        match kept.last() {
            Some(prev) if distance_nm(prev.position(), p.position()) == 0.0 => {}
            _ => kept.push(p),
        }
    }
    kept
}

/// Instability in [0, 1] for a time-ascending run of trail points.
/// Fewer than three distinct positions score 0.
pub fn compute(points: &[TrailPoint]) -> f64 {
    let points = moving_points(points);
    if points.len() < MIN_POINTS {
        return 0.0;
    }

    let bearings: Vec<f64> = points
        .windows(2)
        .map(|w| bearing_deg(w[0].position(), w[1].position()))
        .collect();

    let spread = circular_spread_deg(&bearings);

    // bearings[k] covers points k -> k+1, so the turn between bearings k-1
    // and k happens over the interval ending at point k+1.
    let mut rate_sum = 0.0;
    let mut rate_count = 0usize;
    for k in 1..bearings.len() {
        let dt = points[k + 1].timestamp - points[k].timestamp;
        if dt <= 0.0 {
            continue;
        }
        rate_sum += wrap_delta_deg(bearings[k - 1], bearings[k]).abs() / dt;
        rate_count += 1;
    }
    let mean_turn_rate = if rate_count > 0 {
        rate_sum / rate_count as f64
    } else {
        0.0
    };

    clamp01(spread / SPREAD_FULL_SCALE_DEG).max(clamp01(mean_turn_rate / TURN_RATE_FULL_SCALE_DPS))
}

/// Score every trail in the store.
pub fn score_all(history: &TrackHistory) -> HashMap<AircraftId, f64> {
    history
        .trails()
        .map(|trail| (trail.id.clone(), compute(&trail.to_vec())))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
