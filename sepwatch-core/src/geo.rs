//! Spherical geometry helpers: distance, bearing, heading statistics.
//!
//! All functions are pure. Angles are degrees, distances nautical miles.

use crate::types::GeoPoint;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const METERS_PER_NM: f64 = 1852.0;

// ---------------------------------------------------------------------------
// Haversine
// ---------------------------------------------------------------------------

/// Great-circle distance in nautical miles.
pub fn distance_nm(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let dlat = (p2.lat - p1.lat).to_radians();
    let dlon = (p2.lon - p1.lon).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + p1.lat.to_radians().cos() * p2.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for near-antipodal points.
    let a = a.clamp(0.0, 1.0);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt()) / METERS_PER_NM
}

/// Initial true bearing from `p1` to `p2`, degrees in [0, 360).
pub fn bearing_deg(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let dlon = (p2.lon - p1.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_deg(y.atan2(x).to_degrees())
}

/// Arithmetic (non-geodesic) midpoint.
pub fn midpoint(p1: GeoPoint, p2: GeoPoint) -> GeoPoint {
    GeoPoint::new((p1.lat + p2.lat) / 2.0, (p1.lon + p2.lon) / 2.0)
}

// ---------------------------------------------------------------------------
// Heading statistics
// ---------------------------------------------------------------------------

/// Map any angle into [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Signed change from heading `from` to heading `to`, in (-180, 180].
pub fn wrap_delta_deg(from: f64, to: f64) -> f64 {
    let d = (to - from + 180.0).rem_euclid(360.0) - 180.0;
    if d <= -180.0 {
        180.0
    } else {
        d
    }
}

/// Heading dispersion from the resultant vector length:
/// `(1 - |mean unit vector|) * 180`. 0 for identical headings, 180 when the
/// headings cancel out completely. Empty input yields 0.
pub fn circular_spread_deg(headings: &[f64]) -> f64 {
    if headings.is_empty() {
        return 0.0;
    }
    let (sum_sin, sum_cos) = headings.iter().fold((0.0f64, 0.0f64), |(s, c), h| {
        let r = h.to_radians();
        (s + r.sin(), c + r.cos())
    });
    let n = headings.len() as f64;
    let resultant = ((sum_sin / n).powi(2) + (sum_cos / n).powi(2)).sqrt();
    ((1.0 - resultant) * 180.0).clamp(0.0, 180.0)
}

/// Circular mean of headings, `None` when they cancel out.
pub fn circular_mean_deg(headings: &[f64]) -> Option<f64> {
    let (sum_sin, sum_cos) = headings.iter().fold((0.0f64, 0.0f64), |(s, c), h| {
        let r = h.to_radians();
        (s + r.sin(), c + r.cos())
    });
    if sum_sin.abs() < 1e-9 && sum_cos.abs() < 1e-9 {
        return None;
    }
    Some(normalize_deg(sum_sin.atan2(sum_cos).to_degrees()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn test_distance_same_point() {
        let a = p(35.4362, -82.5418);
        assert_eq!(distance_nm(a, a), 0.0);
    }

    #[test]
    fn test_distance_symmetric_and_positive() {
        let pairs = [
            (p(35.4362, -82.5418), p(35.2140, -80.9431)),
            (p(-33.9, 151.2), p(51.5, -0.1)),
            (p(0.0, 179.9), p(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            let ab = distance_nm(a, b);
            let ba = distance_nm(b, a);
            assert!(ab > 0.0);
            assert!((ab - ba).abs() < 1e-9);
        }
    }

    #[test]
    fn test_distance_known() {
        // One degree of latitude is ~60 nm
        let d = distance_nm(p(35.0, -82.0), p(36.0, -82.0));
        assert!((d - 60.04).abs() < 0.1, "got {d}");
        // Asheville to Charlotte: ~96nm
        let d = distance_nm(p(35.4362, -82.5418), p(35.2140, -80.9431));
        assert!(d > 70.0 && d < 120.0, "AVL-CLT should be ~96nm, got {d}");
    }

    #[test]
    fn test_bearing_cardinal() {
        assert!((bearing_deg(p(0.0, 0.0), p(1.0, 0.0)) - 0.0).abs() < 1e-6);
        assert!((bearing_deg(p(0.0, 0.0), p(0.0, 1.0)) - 90.0).abs() < 1e-6);
        assert!((bearing_deg(p(1.0, 0.0), p(0.0, 0.0)) - 180.0).abs() < 1e-6);
        assert!((bearing_deg(p(0.0, 1.0), p(0.0, 0.0)) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_range() {
        let b = bearing_deg(p(35.0, -82.0), p(35.1, -82.1));
        assert!((0.0..360.0).contains(&b));
    }

    #[test]
    fn test_wrap_delta() {
        assert_eq!(wrap_delta_deg(350.0, 10.0), 20.0);
        assert_eq!(wrap_delta_deg(10.0, 350.0), -20.0);
        assert_eq!(wrap_delta_deg(0.0, 180.0), 180.0);
        assert_eq!(wrap_delta_deg(180.0, 0.0), 180.0);
        assert_eq!(wrap_delta_deg(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_spread_identical() {
        assert!(circular_spread_deg(&[90.0, 90.0, 90.0, 90.0]).abs() < 1e-9);
        assert!(circular_spread_deg(&[359.0, 359.0]).abs() < 1e-9);
    }

    #[test]
    fn test_spread_antipodal() {
        let s = circular_spread_deg(&[0.0, 180.0]);
        assert!((s - 180.0).abs() < 1e-6, "got {s}");
    }

    #[test]
    fn test_spread_across_north() {
        // 350 and 10 are close; spread must stay small
        let s = circular_spread_deg(&[350.0, 10.0]);
        assert!(s < 5.0, "got {s}");
    }

    #[test]
    fn test_circular_mean() {
        let m = circular_mean_deg(&[350.0, 10.0]).unwrap();
        assert!(m < 1e-6 || (360.0 - m) < 1e-6, "got {m}");
        assert!(circular_mean_deg(&[0.0, 180.0]).is_none());
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(p(35.0, -82.0), p(36.0, -80.0));
        assert_eq!(m, p(35.5, -81.0));
    }
}
