//! External collaborators: trajectory projector and point intensity sampler.
//!
//! The engine only sees the traits. The HTTP adapters are thin: one request
//! per call, errors mapped to `EngineError` for the caller to downgrade.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use sepwatch_core::types::{AircraftState, EngineError, ProjectedTrack, Result};

/// Turns a snapshot into projected tracks (same ids).
#[async_trait]
pub trait TrajectoryProjector: Send + Sync {
    async fn project(&self, aircraft: &[AircraftState]) -> Result<Vec<ProjectedTrack>>;
}

/// Point intensity lookup at a coarsened time bucket. `Ok(None)` means the
/// service has no value for that point.
#[async_trait]
pub trait IntensitySampler: Send + Sync {
    async fn sample(&self, lat: f64, lon: f64, time_bucket: &str) -> Result<Option<f64>>;
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EngineError::Config(format!("HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// HTTP projector
// ---------------------------------------------------------------------------

/// POSTs the snapshot as a JSON array and expects an array of tracks back.
pub struct HttpProjector {
    url: String,
    client: reqwest::Client,
}

impl HttpProjector {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        Ok(HttpProjector {
            url: url.to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl TrajectoryProjector for HttpProjector {
    async fn project(&self, aircraft: &[AircraftState]) -> Result<Vec<ProjectedTrack>> {
        let response = self
            .client
            .post(&self.url)
            .json(aircraft)
            .send()
            .await
            .map_err(|e| EngineError::Projector(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Projector(format!("HTTP {status}")));
        }

        response
            .json::<Vec<ProjectedTrack>>()
            .await
            .map_err(|e| EngineError::Projector(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// HTTP sampler
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct IntensityResponse {
    intensity: Option<f64>,
}

/// GET `{url}?lat=..&lon=..&time=..`, body `{"intensity": number | null}`.
/// A 404 is treated as "no value".
pub struct HttpSampler {
    url: String,
    client: reqwest::Client,
}

impl HttpSampler {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        Ok(HttpSampler {
            url: url.to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl IntensitySampler for HttpSampler {
    async fn sample(&self, lat: f64, lon: f64, time_bucket: &str) -> Result<Option<f64>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", format!("{lat:.4}")),
                ("lon", format!("{lon:.4}")),
                ("time", time_bucket.to_string()),
            ])
            .send()
            .await
            .map_err(|e| EngineError::Sampler(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(EngineError::Sampler(format!("HTTP {status}")));
        }

        let body: IntensityResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Sampler(e.to_string()))?;
        Ok(body.intensity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_response_parse() {
        let body: IntensityResponse = serde_json::from_str(r#"{"intensity": 22.5}"#).unwrap();
        assert_eq!(body.intensity, Some(22.5));
        let body: IntensityResponse = serde_json::from_str(r#"{"intensity": null}"#).unwrap();
        assert!(body.intensity.is_none());
    }

    #[test]
    fn test_adapters_build() {
        let timeout = Duration::from_secs(2);
        assert!(HttpProjector::new("http://localhost:9000/project", timeout).is_ok());
        assert!(HttpSampler::new("http://localhost:9000/intensity", timeout).is_ok());
    }

    #[tokio::test]
    async fn test_sampler_unreachable_is_error() {
        // Port 9 (discard) on localhost is not listening in test environments
        let sampler =
            HttpSampler::new("http://127.0.0.1:9/intensity", Duration::from_millis(200)).unwrap();
        let result = sampler.sample(35.0, -82.0, "2025-10-15T12:05:00Z").await;
        assert!(matches!(result, Err(EngineError::Sampler(_))));
    }
}
