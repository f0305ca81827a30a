//! Alert synthesis: separation, vertical rate, wake, congestion, weather.
//!
//! The four local families are computed synchronously from the snapshot and
//! the detector output. Weather needs an external intensity sample per
//! aircraft, so it is split into candidate selection and a per-sample
//! constructor; the caller does the sampling.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::Conflict;
use crate::geo::{circular_mean_deg, distance_nm, wrap_delta_deg};
use crate::types::{AircraftId, AircraftState, GeoPoint, PairKey};

// ---------------------------------------------------------------------------
// Severity and kind
// ---------------------------------------------------------------------------

/// Total order: `Info < Caution < Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Caution,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Caution => "caution",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Separation,
    Weather,
    Vertical,
    Wake,
    Congestion,
}

impl AlertKind {
    pub const ALL: [AlertKind; 5] = [
        AlertKind::Separation,
        AlertKind::Weather,
        AlertKind::Vertical,
        AlertKind::Wake,
        AlertKind::Congestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Separation => "separation",
            AlertKind::Weather => "weather",
            AlertKind::Vertical => "vertical",
            AlertKind::Wake => "wake",
            AlertKind::Congestion => "congestion",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// Kind-specific payload. Only separation carries a conflict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AlertDetail {
    Separation {
        conflict: Conflict,
    },
    Weather {
        intensity: f64,
        time_bucket: String,
    },
    Vertical {
        vertical_rate_fpm: f64,
    },
    Wake {
        distance_nm: f64,
        vertical_ft: f64,
        heading_diff_deg: f64,
    },
    Congestion {
        count: usize,
        radius_nm: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub details: String,
    /// One or two involved aircraft.
    pub aircraft: Vec<AircraftId>,
    pub location: GeoPoint,
    pub timestamp: f64,
    #[serde(flatten)]
    pub detail: AlertDetail,
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        match self.detail {
            AlertDetail::Separation { .. } => AlertKind::Separation,
            AlertDetail::Weather { .. } => AlertKind::Weather,
            AlertDetail::Vertical { .. } => AlertKind::Vertical,
            AlertDetail::Wake { .. } => AlertKind::Wake,
            AlertDetail::Congestion { .. } => AlertKind::Congestion,
        }
    }

    pub fn conflict(&self) -> Option<&Conflict> {
        match &self.detail {
            AlertDetail::Separation { conflict } => Some(conflict),
            _ => None,
        }
    }

    /// Identity that survives a time-bucket rollover: the pair for
    /// separation, the aircraft for weather, the id otherwise.
    pub fn key(&self) -> String {
        match &self.detail {
            AlertDetail::Separation { conflict } => format!("sep:{}", conflict.pair),
            AlertDetail::Weather { .. } => format!("wx:{}", self.aircraft.join(":")),
            _ => self.id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Time bucket
// ---------------------------------------------------------------------------

/// Round `timestamp` down to a `minutes` boundary, formatted as RFC 3339 UTC
/// (`2026-10-15T12:05:00Z`).
pub fn time_bucket(timestamp: f64, minutes: u32) -> String {
    let width = (minutes.max(1) as i64) * 60;
    let secs = (timestamp.floor() as i64).div_euclid(width) * width;
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        None => secs.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub separation_warning_s: f64,
    pub separation_caution_s: f64,

    pub vertical_rate_fpm: f64,
    pub vertical_rate_warning_fpm: f64,

    pub wake_distance_nm: f64,
    pub wake_vertical_ft: f64,
    pub wake_heading_deg: f64,
    pub wake_warning_distance_nm: f64,
    pub wake_warning_vertical_ft: f64,

    pub congestion_radius_nm: f64,
    pub congestion_count: usize,
    pub congestion_warning_count: usize,

    pub weather_radius_nm: f64,
    pub weather_max_samples: usize,
    pub weather_warning: f64,
    pub weather_caution: f64,

    /// Width of the time bucket used in alert ids and sampler queries.
    pub bucket_minutes: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            separation_warning_s: 180.0,
            separation_caution_s: 420.0,
            vertical_rate_fpm: 1500.0,
            vertical_rate_warning_fpm: 2500.0,
            wake_distance_nm: 2.0,
            wake_vertical_ft: 700.0,
            wake_heading_deg: 25.0,
            wake_warning_distance_nm: 1.0,
            wake_warning_vertical_ft: 400.0,
            congestion_radius_nm: 20.0,
            congestion_count: 10,
            congestion_warning_count: 15,
            weather_radius_nm: 120.0,
            weather_max_samples: 30,
            weather_warning: 30.0,
            weather_caution: 15.0,
            bucket_minutes: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

pub struct AlertSynthesizer {
    pub thresholds: AlertThresholds,
    pub reference: GeoPoint,
}

impl AlertSynthesizer {
    pub fn new(thresholds: AlertThresholds, reference: GeoPoint) -> Self {
        AlertSynthesizer {
            thresholds,
            reference,
        }
    }

    pub fn bucket(&self, now: f64) -> String {
        time_bucket(now, self.thresholds.bucket_minutes)
    }

    /// Separation, vertical, wake and congestion alerts, in that order.
    pub fn local_alerts(
        &self,
        conflicts: &[Conflict],
        aircraft: &[AircraftState],
        now: f64,
    ) -> Vec<Alert> {
        let mut alerts = self.separation_alerts(conflicts, aircraft, now);
        alerts.extend(self.vertical_alerts(aircraft, now));
        alerts.extend(self.wake_alerts(aircraft, now));
        alerts.extend(self.congestion_alert(aircraft, now));
        alerts
    }

    pub fn separation_severity(&self, first_breach_s: f64) -> Severity {
        if first_breach_s < self.thresholds.separation_warning_s {
            Severity::Warning
        } else if first_breach_s < self.thresholds.separation_caution_s {
            Severity::Caution
        } else {
            Severity::Info
        }
    }

    pub fn separation_alerts(
        &self,
        conflicts: &[Conflict],
        aircraft: &[AircraftState],
        now: f64,
    ) -> Vec<Alert> {
        let by_id: HashMap<&str, &AircraftState> =
            aircraft.iter().map(|ac| (ac.id.as_str(), ac)).collect();
        let label = |id: &str| -> String {
            by_id
                .get(id)
                .map(|ac| ac.label().to_string())
                .unwrap_or_else(|| id.to_string())
        };
        let bucket = self.bucket(now);

        conflicts
            .iter()
            .map(|c| {
                let a = label(c.pair.first());
                let b = label(c.pair.second());
                Alert {
                    id: format!("sep:{}:{}", c.pair, bucket),
                    severity: self.separation_severity(c.first_breach_s),
                    title: format!("Separation conflict: {} / {}", a, b),
                    details: format!(
                        "Breach in {:.0}s, CPA {:.1} nm / {:.0} ft",
                        c.first_breach_s, c.min_h_nm, c.min_v_ft
                    ),
                    aircraft: vec![c.pair.first().to_string(), c.pair.second().to_string()],
                    location: c.cpa,
                    timestamp: now,
                    detail: AlertDetail::Separation { conflict: c.clone() },
                }
            })
            .collect()
    }

    pub fn vertical_alerts(&self, aircraft: &[AircraftState], now: f64) -> Vec<Alert> {
        let t = &self.thresholds;
        aircraft
            .iter()
            .filter_map(|ac| {
                let vr = ac.vertical_rate_fpm?;
                if vr.abs() < t.vertical_rate_fpm {
                    return None;
                }
                let severity = if vr.abs() >= t.vertical_rate_warning_fpm {
                    Severity::Warning
                } else {
                    Severity::Caution
                };
                let verb = if vr < 0.0 { "descent" } else { "climb" };
                Some(Alert {
                    id: format!("vert:{}", ac.id),
                    severity,
                    title: format!("Rapid {}: {}", verb, ac.label()),
                    details: format!("{:+.0} ft/min at {:.0} ft", vr, ac.altitude_ft),
                    aircraft: vec![ac.id.clone()],
                    location: ac.position(),
                    timestamp: now,
                    detail: AlertDetail::Vertical {
                        vertical_rate_fpm: vr,
                    },
                })
            })
            .collect()
    }

    pub fn wake_alerts(&self, aircraft: &[AircraftState], now: f64) -> Vec<Alert> {
        let t = &self.thresholds;
        let mut alerts = Vec::new();

        for i in 0..aircraft.len() {
            for j in (i + 1)..aircraft.len() {
                let a = &aircraft[i];
                let b = &aircraft[j];
                if a.id == b.id {
                    continue;
                }
                let dist = distance_nm(a.position(), b.position());
                if dist > t.wake_distance_nm {
                    continue;
                }
                let vert = (a.altitude_ft - b.altitude_ft).abs();
                if vert > t.wake_vertical_ft {
                    continue;
                }
                let hdg = wrap_delta_deg(a.track_deg, b.track_deg).abs();
                if hdg > t.wake_heading_deg {
                    continue;
                }

                let severity =
                    if dist < t.wake_warning_distance_nm && vert < t.wake_warning_vertical_ft {
                        Severity::Warning
                    } else {
                        Severity::Caution
                    };
                let pair = PairKey::new(&a.id, &b.id);
                let mean_track =
                    circular_mean_deg(&[a.track_deg, b.track_deg]).unwrap_or(a.track_deg);
                debug!(%pair, dist, vert, hdg, "wake proximity");

                alerts.push(Alert {
                    id: format!("wake:{}", pair),
                    severity,
                    title: format!("Wake proximity: {} / {}", a.label(), b.label()),
                    details: format!(
                        "{:.1} nm, {:.0} ft, {:.0} deg heading difference, mean track {:03.0}",
                        dist, vert, hdg, mean_track
                    ),
                    aircraft: vec![pair.first().to_string(), pair.second().to_string()],
                    location: a.position(),
                    timestamp: now,
                    detail: AlertDetail::Wake {
                        distance_nm: dist,
                        vertical_ft: vert,
                        heading_diff_deg: hdg,
                    },
                });
            }
        }
        alerts
    }

    pub fn congestion_alert(&self, aircraft: &[AircraftState], now: f64) -> Option<Alert> {
        let t = &self.thresholds;
        let mut nearby: Vec<(f64, &AircraftState)> = aircraft
            .iter()
            .map(|ac| (distance_nm(self.reference, ac.position()), ac))
            .filter(|(d, _)| *d <= t.congestion_radius_nm)
            .collect();

        let count = nearby.len();
        if count < t.congestion_count {
            return None;
        }
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

        let severity = if count >= t.congestion_warning_count {
            Severity::Warning
        } else {
            Severity::Caution
        };
        Some(Alert {
            id: "congestion".to_string(),
            severity,
            title: format!("Traffic congestion: {} aircraft", count),
            details: format!(
                "{} aircraft within {:.0} nm of reference",
                count, t.congestion_radius_nm
            ),
            aircraft: nearby.iter().take(2).map(|(_, ac)| ac.id.clone()).collect(),
            location: self.reference,
            timestamp: now,
            detail: AlertDetail::Congestion {
                count,
                radius_nm: t.congestion_radius_nm,
            },
        })
    }

    /// Aircraft to sample for weather: nearest first, within the weather
    /// radius, capped at `weather_max_samples`.
    pub fn weather_candidates<'a>(&self, aircraft: &'a [AircraftState]) -> Vec<&'a AircraftState> {
        let t = &self.thresholds;
        let mut nearby: Vec<(f64, &AircraftState)> = aircraft
            .iter()
            .map(|ac| (distance_nm(self.reference, ac.position()), ac))
            .filter(|(d, _)| *d <= t.weather_radius_nm)
            .collect();
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        nearby
            .into_iter()
            .take(t.weather_max_samples)
            .map(|(_, ac)| ac)
            .collect()
    }

    /// Build a weather alert from one sample. Absent, non-positive or NaN
    /// intensities produce nothing.
    pub fn weather_alert(
        &self,
        ac: &AircraftState,
        intensity: Option<f64>,
        now: f64,
    ) -> Option<Alert> {
        let t = &self.thresholds;
        let value = intensity.filter(|v| *v > 0.0)?;
        let severity = if value >= t.weather_warning {
            Severity::Warning
        } else if value >= t.weather_caution {
            Severity::Caution
        } else {
            Severity::Info
        };
        let bucket = self.bucket(now);
        Some(Alert {
            id: format!("wx:{}:{}", ac.id, bucket),
            severity,
            title: format!("Weather: {}", ac.label()),
            details: format!("Intensity {:.0} at {:.0} ft", value, ac.altitude_ft),
            aircraft: vec![ac.id.clone()],
            location: ac.position(),
            timestamp: now,
            detail: AlertDetail::Weather {
                intensity: value,
                time_bucket: bucket,
            },
        })
    }
}

impl Default for AlertSynthesizer {
    fn default() -> Self {
        Self::new(AlertThresholds::default(), GeoPoint::new(0.0, 0.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: f64 = 1_760_529_900.0; // 2025-10-15T12:05:00Z
    const DEG_PER_NM: f64 = 1.0 / 60.04;

    fn synth() -> AlertSynthesizer {
        AlertSynthesizer::new(AlertThresholds::default(), GeoPoint::new(0.0, 0.0))
    }

    fn ac(id: &str, lon_nm: f64, alt: f64, track: f64) -> AircraftState {
        let mut a = AircraftState::new(id, 0.0, lon_nm * DEG_PER_NM, alt);
        a.track_deg = track;
        a
    }

    fn conflict(a: &str, b: &str, first_breach_s: f64) -> Conflict {
        Conflict {
            pair: PairKey::new(a, b),
            cpa: GeoPoint::new(0.0, 0.0),
            first_breach_s,
            min_h_nm: 2.0,
            min_v_ft: 300.0,
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Caution);
        assert!(Severity::Caution < Severity::Warning);
        assert_eq!(Severity::Warning.max(Severity::Info), Severity::Warning);
    }

    #[test]
    fn test_time_bucket() {
        assert_eq!(time_bucket(NOW, 5), "2025-10-15T12:05:00Z");
        assert_eq!(time_bucket(NOW + 299.0, 5), "2025-10-15T12:05:00Z");
        assert_eq!(time_bucket(NOW + 300.0, 5), "2025-10-15T12:10:00Z");
        assert_eq!(time_bucket(NOW + 61.5, 1), "2025-10-15T12:06:00Z");
    }

    #[test]
    fn test_separation_severity_bands() {
        let s = synth();
        assert_eq!(s.separation_severity(0.0), Severity::Warning);
        assert_eq!(s.separation_severity(179.0), Severity::Warning);
        assert_eq!(s.separation_severity(180.0), Severity::Caution);
        assert_eq!(s.separation_severity(419.0), Severity::Caution);
        assert_eq!(s.separation_severity(420.0), Severity::Info);
    }

    #[test]
    fn test_separation_alert_id_stable_in_bucket() {
        let s = synth();
        let first = s.separation_alerts(&[conflict("A", "B", 240.0)], &[], NOW);
        let again = s.separation_alerts(&[conflict("B", "A", 200.0)], &[], NOW + 30.0);
        assert_eq!(first[0].id, again[0].id);
        assert_eq!(first[0].kind(), AlertKind::Separation);
        assert!(first[0].conflict().is_some());
        assert_eq!(first[0].aircraft, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_key_ignores_time_bucket() {
        let s = synth();
        let before = s.separation_alerts(&[conflict("A", "B", 60.0)], &[], NOW);
        let after = s.separation_alerts(&[conflict("B", "A", 60.0)], &[], NOW + 300.0);
        assert_ne!(before[0].id, after[0].id);
        assert_eq!(before[0].key(), after[0].key());

        let a = ac("A", 10.0, 10000.0, 0.0);
        let wx_before = s.weather_alert(&a, Some(40.0), NOW).unwrap();
        let wx_after = s.weather_alert(&a, Some(40.0), NOW + 300.0).unwrap();
        assert_ne!(wx_before.id, wx_after.id);
        assert_eq!(wx_before.key(), wx_after.key());

        let mut fast = ac("FAST", 0.0, 10000.0, 0.0);
        fast.vertical_rate_fpm = Some(-3000.0);
        let vert = s.vertical_alerts(&[fast], NOW).remove(0);
        assert_eq!(vert.key(), vert.id);
    }

    #[test]
    fn test_separation_uses_callsigns() {
        let mut a = ac("A", 0.0, 10000.0, 0.0);
        a.callsign = Some("DAL123".into());
        let alerts = synth().separation_alerts(&[conflict("A", "B", 60.0)], &[a], NOW);
        assert!(alerts[0].title.contains("DAL123"));
        assert!(alerts[0].title.contains('B'));
    }

    #[test]
    fn test_vertical_rate() {
        let mut fast = ac("FAST", 0.0, 10000.0, 0.0);
        fast.vertical_rate_fpm = Some(-3000.0);
        let mut medium = ac("MED", 50.0, 10000.0, 0.0);
        medium.vertical_rate_fpm = Some(1500.0);
        let mut slow = ac("SLOW", 100.0, 10000.0, 0.0);
        slow.vertical_rate_fpm = Some(1499.0);
        let none = ac("NONE", 150.0, 10000.0, 0.0);

        let alerts = synth().vertical_alerts(&[fast, medium, slow, none], NOW);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert!(alerts[0].title.contains("descent"));
        assert_eq!(alerts[1].severity, Severity::Caution);
        assert!(alerts.iter().all(|a| a.conflict().is_none()));
    }

    #[test]
    fn test_wake_caution() {
        let a = ac("A", 0.0, 10000.0, 90.0);
        let b = ac("B", 1.5, 10300.0, 100.0);
        let alerts = synth().wake_alerts(&[a, b], NOW);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Caution);
        assert_eq!(alerts[0].kind(), AlertKind::Wake);
    }

    #[test]
    fn test_wake_reports_mean_track() {
        let a = ac("A", 0.0, 10000.0, 80.0);
        let b = ac("B", 1.5, 10300.0, 100.0);
        let alerts = synth().wake_alerts(&[a, b], NOW);
        let details = &alerts[0].details;
        assert!(details.ends_with("mean track 090"), "got {details}");
    }

    #[test]
    fn test_wake_heading_too_different() {
        let a = ac("A", 0.0, 10000.0, 90.0);
        let b = ac("B", 1.5, 10300.0, 130.0);
        assert!(synth().wake_alerts(&[a, b], NOW).is_empty());
    }

    #[test]
    fn test_wake_heading_wraps_north() {
        let a = ac("A", 0.0, 10000.0, 355.0);
        let b = ac("B", 1.5, 10300.0, 5.0);
        assert_eq!(synth().wake_alerts(&[a, b], NOW).len(), 1);
    }

    #[test]
    fn test_wake_warning() {
        let a = ac("A", 0.0, 10000.0, 90.0);
        let b = ac("B", 0.8, 10200.0, 90.0);
        let alerts = synth().wake_alerts(&[a, b], NOW);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn test_wake_vertical_too_far() {
        let a = ac("A", 0.0, 10000.0, 90.0);
        let b = ac("B", 0.8, 10800.0, 90.0);
        assert!(synth().wake_alerts(&[a, b], NOW).is_empty());
    }

    #[test]
    fn test_congestion_threshold() {
        let fleet: Vec<AircraftState> = (0..9)
            .map(|i| ac(&format!("AC{i}"), i as f64, 10000.0, 0.0))
            .collect();
        assert!(synth().congestion_alert(&fleet, NOW).is_none());

        let fleet: Vec<AircraftState> = (0..12)
            .map(|i| ac(&format!("AC{i:02}"), i as f64, 10000.0, 0.0))
            .collect();
        let alert = synth().congestion_alert(&fleet, NOW).unwrap();
        assert_eq!(alert.severity, Severity::Caution);
        assert_eq!(alert.aircraft, vec!["AC00".to_string(), "AC01".to_string()]);

        let fleet: Vec<AircraftState> = (0..15)
            .map(|i| ac(&format!("AC{i}"), i as f64, 10000.0, 0.0))
            .collect();
        assert_eq!(synth().congestion_alert(&fleet, NOW).unwrap().severity, Severity::Warning);
    }

    #[test]
    fn test_congestion_ignores_far_aircraft() {
        let fleet: Vec<AircraftState> = (0..12)
            .map(|i| ac(&format!("AC{i}"), 25.0 + i as f64, 10000.0, 0.0))
            .collect();
        assert!(synth().congestion_alert(&fleet, NOW).is_none());
    }

    #[test]
    fn test_weather_candidates_nearest_and_capped() {
        let mut s = synth();
        s.thresholds.weather_max_samples = 3;
        let fleet = vec![
            ac("FAR", 200.0, 10000.0, 0.0),
            ac("C", 30.0, 10000.0, 0.0),
            ac("A", 10.0, 10000.0, 0.0),
            ac("D", 40.0, 10000.0, 0.0),
            ac("B", 20.0, 10000.0, 0.0),
        ];
        let ids: Vec<&str> = s.weather_candidates(&fleet).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_weather_alert_bands() {
        let s = synth();
        let a = ac("A", 10.0, 10000.0, 0.0);
        assert!(s.weather_alert(&a, None, NOW).is_none());
        assert!(s.weather_alert(&a, Some(0.0), NOW).is_none());
        assert!(s.weather_alert(&a, Some(-4.0), NOW).is_none());
        assert!(s.weather_alert(&a, Some(f64::NAN), NOW).is_none());
        assert_eq!(s.weather_alert(&a, Some(5.0), NOW).unwrap().severity, Severity::Info);
        assert_eq!(s.weather_alert(&a, Some(15.0), NOW).unwrap().severity, Severity::Caution);
        assert_eq!(s.weather_alert(&a, Some(30.0), NOW).unwrap().severity, Severity::Warning);
    }

    #[test]
    fn test_local_alerts_congestion_only() {
        // 12 aircraft spread 3 nm apart on a line, all quiet
        let fleet: Vec<AircraftState> = (0..12)
            .map(|i| ac(&format!("AC{i:02}"), -16.5 + i as f64 * 3.0, 10000.0, 0.0))
            .collect();
        let alerts = synth().local_alerts(&[], &fleet, NOW);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind(), AlertKind::Congestion);
        assert_eq!(alerts[0].severity, Severity::Caution);
    }

    #[test]
    fn test_alert_serializes_kind_tag() {
        let alerts = synth().separation_alerts(&[conflict("A", "B", 240.0)], &[], NOW);
        let yaml = serde_yaml::to_string(&alerts[0]).unwrap();
        assert!(yaml.contains("kind: separation"));
        assert!(yaml.contains("first_breach_s: 240"));
    }
}
