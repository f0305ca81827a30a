//! Pairwise closest-point-of-approach search over projected tracks.
//!
//! Each pair of tracks is walked sample by sample. The CPA is the sample of
//! minimum horizontal separation; vertical separation is read at that same
//! sample, not minimised jointly. A conflict exists only when some sample
//! breaches both thresholds at once.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::geo::{distance_nm, midpoint};
use crate::types::{GeoPoint, PairKey, ProjectedTrack};

pub const DEFAULT_HORIZONTAL_NM: f64 = 5.0;
pub const DEFAULT_VERTICAL_FT: f64 = 1000.0;

/// Sample step assumed when a track carries no usable time offsets.
pub const DEFAULT_STEP_S: f64 = 60.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Predicted loss of separation between two aircraft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub pair: PairKey,
    /// Midpoint of the two aircraft at the CPA sample.
    pub cpa: GeoPoint,
    /// Seconds until both thresholds are first breached together.
    pub first_breach_s: f64,
    pub min_h_nm: f64,
    /// Vertical separation at the CPA sample.
    pub min_v_ft: f64,
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConflictDetector {
    pub horizontal_nm: f64,
    pub vertical_ft: f64,
    pub default_step_s: f64,
}

impl ConflictDetector {
    pub fn new(horizontal_nm: f64, vertical_ft: f64) -> Self {
        ConflictDetector {
            horizontal_nm,
            vertical_ft,
            default_step_s: DEFAULT_STEP_S,
        }
    }

    /// Run the pairwise search. Result is sorted by `first_breach_s`, then
    /// `min_h_nm`, then pair key.
    pub fn detect(&self, tracks: &[ProjectedTrack]) -> Vec<Conflict> {
        // Collapse duplicate ids so a pair can never be reported twice
        let mut seen = HashSet::new();
        let unique: Vec<&ProjectedTrack> = tracks
            .iter()
            .filter(|t| seen.insert(t.id.as_str()))
            .collect();

        let mut conflicts = Vec::new();
        for i in 0..unique.len() {
            for j in (i + 1)..unique.len() {
                if let Some(c) = self.check_pair(unique[i], unique[j]) {
                    conflicts.push(c);
                }
            }
        }

        conflicts.sort_by(|a, b| {
            a.first_breach_s
                .total_cmp(&b.first_breach_s)
                .then(a.min_h_nm.total_cmp(&b.min_h_nm))
                .then_with(|| a.pair.cmp(&b.pair))
        });
        conflicts
    }

    /// Walk one pair of tracks. `None` when they never breach both
    /// thresholds at the same sample.
    pub fn check_pair(&self, a: &ProjectedTrack, b: &ProjectedTrack) -> Option<Conflict> {
        let n = a.points.len().min(b.points.len());
        if n < 2 || a.id == b.id {
            return None;
        }

        let step = self.sample_step(a).min(self.sample_step(b));

        let mut min_h = f64::INFINITY;
        let mut min_v = 0.0;
        let mut cpa_index = 0;
        let mut first_breach: Option<usize> = None;

        for k in 0..n {
            let pa = &a.points[k];
            let pb = &b.points[k];
            let h = distance_nm(pa.position(), pb.position());
            let v = (pa.altitude_ft - pb.altitude_ft).abs();

            if h < min_h {
                min_h = h;
                min_v = v;
                cpa_index = k;
            }
            if first_breach.is_none() && h < self.horizontal_nm && v < self.vertical_ft {
                first_breach = Some(k);
            }
        }

        let breach = first_breach?;
        let pair = PairKey::new(&a.id, &b.id);
        debug!(%pair, breach, cpa_index, min_h, min_v, "separation conflict");

        Some(Conflict {
            pair,
            cpa: midpoint(a.points[cpa_index].position(), b.points[cpa_index].position()),
            first_breach_s: breach as f64 * step,
            min_h_nm: min_h,
            min_v_ft: min_v,
        })
    }

    /// Step inferred from the first two samples' offsets.
    fn sample_step(&self, track: &ProjectedTrack) -> f64 {
        match (
            track.points.first().and_then(|p| p.t_offset_s),
            track.points.get(1).and_then(|p| p.t_offset_s),
        ) {
            (Some(t0), Some(t1)) if t1 - t0 > 0.0 => t1 - t0,
            _ => self.default_step_s,
        }
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZONTAL_NM, DEFAULT_VERTICAL_FT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectedPoint;

    /// Degrees of longitude per nm at the equator.
    const DEG_PER_NM: f64 = 1.0 / 60.04;

    fn track(id: &str, samples: &[(f64, f64, f64)], step: Option<f64>) -> ProjectedTrack {
        ProjectedTrack {
            id: id.to_string(),
            points: samples
                .iter()
                .enumerate()
                .map(|(i, &(lat, lon, alt))| ProjectedPoint {
                    lat,
                    lon,
                    altitude_ft: alt,
                    t_offset_s: step.map(|s| i as f64 * s),
                })
                .collect(),
        }
    }

    /// Two tracks on the equator whose separation in nm and ft is given per
    /// sample.
    fn converging(seps: &[(f64, f64)], step: Option<f64>) -> (ProjectedTrack, ProjectedTrack) {
        let a: Vec<_> = seps.iter().map(|_| (0.0, 0.0, 20000.0)).collect();
        let b: Vec<_> = seps
            .iter()
            .map(|&(nm, ft)| (0.0, nm * DEG_PER_NM, 20000.0 + ft))
            .collect();
        (track("AAA", &a, step), track("BBB", &b, step))
    }

    #[test]
    fn test_breach_at_index_four() {
        let (a, b) = converging(
            &[
                (20.0, 500.0),
                (15.0, 500.0),
                (10.0, 500.0),
                (6.0, 500.0),
                (3.0, 500.0),
                (1.0, 500.0),
                (4.0, 500.0),
            ],
            Some(60.0),
        );
        let conflicts = ConflictDetector::default().detect(&[a, b]);
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.first_breach_s, 240.0);
        // global minimum, not the breach sample
        assert!((c.min_h_nm - 1.0).abs() < 0.01, "got {}", c.min_h_nm);
        assert!((c.min_v_ft - 500.0).abs() < 1e-6);
        assert_eq!(c.pair, PairKey::new("AAA", "BBB"));
    }

    #[test]
    fn test_no_conflict_when_always_wide() {
        let (a, b) = converging(&[(6.0, 0.0), (6.5, 0.0), (7.0, 0.0), (6.2, 0.0)], Some(60.0));
        assert!(ConflictDetector::default().detect(&[a, b]).is_empty());
    }

    #[test]
    fn test_non_simultaneous_breaches_ignored() {
        // horizontal breach at k=1 with wide vertical, vertical breach at k=2
        // with wide horizontal
        let (a, b) = converging(&[(10.0, 2000.0), (2.0, 3000.0), (9.0, 100.0)], Some(60.0));
        assert!(ConflictDetector::default().detect(&[a, b]).is_empty());
    }

    #[test]
    fn test_breach_at_zero() {
        let (a, b) = converging(&[(1.0, 200.0), (2.0, 200.0)], Some(30.0));
        let conflicts = ConflictDetector::default().detect(&[a, b]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].first_breach_s, 0.0);
    }

    #[test]
    fn test_default_step_without_offsets() {
        let (a, b) = converging(&[(9.0, 0.0), (8.0, 0.0), (4.0, 0.0)], None);
        let conflicts = ConflictDetector::default().detect(&[a, b]);
        assert_eq!(conflicts[0].first_breach_s, 120.0);
    }

    #[test]
    fn test_smaller_step_wins() {
        let (mut a, b) = converging(&[(9.0, 0.0), (8.0, 0.0), (4.0, 0.0)], Some(60.0));
        for (i, p) in a.points.iter_mut().enumerate() {
            p.t_offset_s = Some(i as f64 * 15.0);
        }
        let conflicts = ConflictDetector::default().detect(&[a, b]);
        assert_eq!(conflicts[0].first_breach_s, 30.0);
    }

    #[test]
    fn test_unequal_lengths_truncate() {
        let (a, mut b) = converging(&[(9.0, 0.0), (8.0, 0.0), (7.0, 0.0), (1.0, 0.0)], Some(60.0));
        b.points.truncate(3);
        assert!(ConflictDetector::default().detect(&[a, b]).is_empty());
    }

    #[test]
    fn test_short_tracks_skipped() {
        let (a, b) = converging(&[(0.5, 0.0)], Some(60.0));
        assert!(ConflictDetector::default().detect(&[a, b]).is_empty());
        let (a, _) = converging(&[(0.5, 0.0), (0.5, 0.0)], Some(60.0));
        let empty = ProjectedTrack { id: "CCC".into(), points: vec![] };
        assert!(ConflictDetector::default().detect(&[a, empty]).is_empty());
    }

    #[test]
    fn test_pair_order_irrelevant() {
        let (a, b) = converging(&[(9.0, 0.0), (3.0, 0.0)], Some(60.0));
        let ab = ConflictDetector::default().detect(&[a.clone(), b.clone()]);
        let ba = ConflictDetector::default().detect(&[b, a]);
        assert_eq!(ab.len(), 1);
        assert_eq!(ab[0].pair, ba[0].pair);
        assert_eq!(ab[0].first_breach_s, ba[0].first_breach_s);
    }

    #[test]
    fn test_duplicate_ids_collapsed() {
        let (a, b) = converging(&[(9.0, 0.0), (3.0, 0.0)], Some(60.0));
        let conflicts = ConflictDetector::default().detect(&[a.clone(), b.clone(), a, b]);
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_sorted_by_first_breach() {
        let (a, b) = converging(&[(9.0, 0.0), (8.0, 0.0), (3.0, 0.0)], Some(60.0));
        let c_point = (1.0, 0.0, 20000.0);
        let d_point = (1.0, 2.0 * DEG_PER_NM, 20000.0);
        let c = track("CCC", &[c_point; 3], Some(60.0));
        let d = track("DDD", &[d_point; 3], Some(60.0));
        let conflicts = ConflictDetector::default().detect(&[a, b, c, d]);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].pair, PairKey::new("CCC", "DDD"));
        assert_eq!(conflicts[0].first_breach_s, 0.0);
        assert_eq!(conflicts[1].first_breach_s, 120.0);
    }

    #[test]
    fn test_cpa_midpoint() {
        let (a, b) = converging(&[(9.0, 0.0), (2.0, 0.0), (4.0, 0.0)], Some(60.0));
        let expected_lon = 2.0 * DEG_PER_NM / 2.0;
        let c = &ConflictDetector::default().detect(&[a, b])[0];
        assert!(c.cpa.lat.abs() < 1e-12);
        assert!((c.cpa.lon - expected_lon).abs() < 1e-12);
    }
}
