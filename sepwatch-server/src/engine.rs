//! Tick engine: one atomic recompute pass per snapshot.
//!
//! Order of work inside a tick:
//! 1. projection (external, async; failure degrades to no tracks)
//! 2. conflict detection + local alert families (sync)
//! 3. weather sampling (external, sequential, throttled; per-item failures
//!    count as "no signal")
//! 4. one write section: trail history update, stability scores, stream
//!    publish, status
//!
//! No lock is held across an `.await`, and readers only ever see the state
//! between step-4 sections. A tick requested while another is running is
//! dropped.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sepwatch_core::alert::{Alert, AlertSynthesizer, Severity};
use sepwatch_core::config::{Config, WeatherConfig};
use sepwatch_core::conflict::{Conflict, ConflictDetector};
use sepwatch_core::history::{TrackHistory, Trail};
use sepwatch_core::stability;
use sepwatch_core::stream::{AlertFilter, AlertStream, Selection};
use sepwatch_core::types::{AircraftId, AircraftState, PairKey, ProjectedTrack, Result};

use crate::notification::WebhookDispatcher;
use crate::upstream::{HttpProjector, HttpSampler, IntensitySampler, TrajectoryProjector};

/// Warnings in `current` whose key was not already a warning in `previous`.
/// Keys outlive the time bucket, so a rollover does not re-notify; an
/// escalation from caution does.
fn new_warnings(previous: &[Alert], current: &[Alert]) -> Vec<Alert> {
    let seen: HashSet<String> = previous
        .iter()
        .filter(|a| a.severity == Severity::Warning)
        .map(Alert::key)
        .collect();
    current
        .iter()
        .filter(|a| a.severity == Severity::Warning && !seen.contains(&a.key()))
        .cloned()
        .collect()
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tick input / output
// ---------------------------------------------------------------------------

/// One tick of input. When `tracks` is present the projector is bypassed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub timestamp: Option<f64>,
    pub aircraft: Vec<AircraftState>,
    #[serde(default)]
    pub tracks: Option<Vec<ProjectedTrack>>,
}

/// Summary of the last completed tick; the transient status signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickStatus {
    pub tick: u64,
    pub timestamp: f64,
    pub aircraft: usize,
    pub tracks: usize,
    pub conflicts: usize,
    pub alerts: usize,
    pub visible_alerts: usize,
    pub weather_sampled: usize,
    pub weather_failed: usize,
    pub projector_error: Option<String>,
    pub dropped_ticks: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Completed(TickStatus),
    /// Another tick was in flight; this one was dropped.
    Busy,
}

#[derive(Debug, Default)]
struct WeatherResult {
    alerts: Vec<Alert>,
    sampled: usize,
    failed: usize,
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Holds the in-flight flag for the lifetime of one tick.
struct TickGuard<'a>(&'a AtomicBool);

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard(flag))
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

struct EngineState {
    history: TrackHistory,
    stream: AlertStream,
    aircraft: Vec<AircraftState>,
    tracks: Vec<ProjectedTrack>,
    stability: HashMap<AircraftId, f64>,
    status: TickStatus,
}

pub struct Engine {
    detector: ConflictDetector,
    synth: AlertSynthesizer,
    weather: WeatherConfig,
    projector: Option<Arc<dyn TrajectoryProjector>>,
    sampler: Option<Arc<dyn IntensitySampler>>,
    webhook: Option<WebhookDispatcher>,
    state: RwLock<EngineState>,
    in_flight: AtomicBool,
    dropped: AtomicU64,
}

impl Engine {
    /// Engine with no collaborators attached.
    pub fn new(config: &Config) -> Self {
        let mut detector =
            ConflictDetector::new(config.detector.horizontal_nm, config.detector.vertical_ft);
        detector.default_step_s = config.detector.default_step_s;

        Engine {
            detector,
            synth: AlertSynthesizer::new(config.alerts.clone(), config.reference),
            weather: config.weather.clone(),
            projector: None,
            sampler: None,
            webhook: None,
            state: RwLock::new(EngineState {
                history: TrackHistory::new(config.history.window_s, config.history.max_points),
                stream: AlertStream::new(config.filter.clone()),
                aircraft: Vec::new(),
                tracks: Vec::new(),
                stability: HashMap::new(),
                status: TickStatus::default(),
            }),
            in_flight: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Engine with HTTP collaborators for every URL present in the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_millis(config.weather.timeout_ms);
        let mut engine = Engine::new(config);
        if let Some(url) = &config.projector_url {
            engine = engine.with_projector(Arc::new(HttpProjector::new(url, timeout)?));
        }
        if let Some(url) = &config.sampler_url {
            engine = engine.with_sampler(Arc::new(HttpSampler::new(url, timeout)?));
        }
        if let Some(url) = &config.webhook {
            engine = engine.with_webhook(WebhookDispatcher::new(url));
        }
        Ok(engine)
    }

    pub fn with_projector(mut self, projector: Arc<dyn TrajectoryProjector>) -> Self {
        self.projector = Some(projector);
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn IntensitySampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn with_webhook(mut self, webhook: WebhookDispatcher) -> Self {
        self.webhook = Some(webhook);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one tick. Returns `Busy` without doing anything if a tick is
    /// already in flight.
    pub async fn tick(&self, snapshot: Snapshot) -> TickOutcome {
        let Some(_guard) = TickGuard::acquire(&self.in_flight) else {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(dropped, "tick already in flight; dropping request");
            return TickOutcome::Busy;
        };

        let now = snapshot.timestamp.unwrap_or_else(now_secs);
        let Snapshot {
            aircraft, tracks, ..
        } = snapshot;

        let mut projector_error = None;
        let tracks = match tracks {
            Some(tracks) => tracks,
            None => match &self.projector {
                Some(projector) => match projector.project(&aircraft).await {
                    Ok(tracks) => tracks,
                    Err(e) => {
                        warn!(error = %e, "projection failed; no separation detection this tick");
                        projector_error = Some(e.to_string());
                        Vec::new()
                    }
                },
                None => Vec::new(),
            },
        };

        let conflicts = self.detector.detect(&tracks);
        let mut alerts = self.synth.local_alerts(&conflicts, &aircraft, now);

        let weather = self.sample_weather(&aircraft, now).await;
        alerts.extend(weather.alerts);

        let (status, new_warnings) = self.publish(
            now,
            aircraft,
            tracks,
            conflicts,
            alerts,
            weather.sampled,
            weather.failed,
            projector_error,
        );

        if let Some(webhook) = &self.webhook {
            for alert in &new_warnings {
                webhook.notify(alert);
            }
        }

        info!(
            tick = status.tick,
            aircraft = status.aircraft,
            conflicts = status.conflicts,
            alerts = status.alerts,
            weather_failed = status.weather_failed,
            "tick complete"
        );
        TickOutcome::Completed(status)
    }

    /// Sequential, throttled sampling of the nearest aircraft. Each failure
    /// or timeout is counted and skipped.
    async fn sample_weather(&self, aircraft: &[AircraftState], now: f64) -> WeatherResult {
        let mut result = WeatherResult::default();
        let Some(sampler) = &self.sampler else {
            return result;
        };

        let bucket = self.synth.bucket(now);
        let timeout = Duration::from_millis(self.weather.timeout_ms.max(1));
        let throttle = Duration::from_millis(self.weather.throttle_ms);

        for (i, ac) in self.synth.weather_candidates(aircraft).into_iter().enumerate() {
            if i > 0 && !throttle.is_zero() {
                tokio::time::sleep(throttle).await;
            }

            let call = sampler.sample(ac.lat, ac.lon, &bucket);
            let sample = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(value)) => value,
                Ok(Err(e)) => {
                    debug!(id = %ac.id, error = %e, "intensity sample failed");
                    result.failed += 1;
                    continue;
                }
                Err(_) => {
                    debug!(id = %ac.id, "intensity sample timed out");
                    result.failed += 1;
                    continue;
                }
            };

            result.sampled += 1;
            if let Some(alert) = self.synth.weather_alert(ac, sample, now) {
                result.alerts.push(alert);
            }
        }

        if result.failed > 0 {
            warn!(failed = result.failed, sampled = result.sampled, "partial weather coverage");
        }
        result
    }

    /// The single write section of a tick. Returns the new status and the
    /// warning alerts that were not present last tick.
    #[allow(clippy::too_many_arguments)]
    fn publish(
        &self,
        now: f64,
        aircraft: Vec<AircraftState>,
        tracks: Vec<ProjectedTrack>,
        conflicts: Vec<Conflict>,
        alerts: Vec<Alert>,
        weather_sampled: usize,
        weather_failed: usize,
        projector_error: Option<String>,
    ) -> (TickStatus, Vec<Alert>) {
        let mut state = self.write();

        state.history.update(&aircraft, now);
        state.stability = stability::score_all(&state.history);

        let previous = state.stream.alerts().to_vec();
        state.stream.publish(alerts, conflicts);
        let new_warnings = new_warnings(&previous, state.stream.alerts());

        state.status = TickStatus {
            tick: state.status.tick + 1,
            timestamp: now,
            aircraft: aircraft.len(),
            tracks: tracks.len(),
            conflicts: state.stream.conflicts().len(),
            alerts: state.stream.alerts().len(),
            visible_alerts: state.stream.visible_alerts().len(),
            weather_sampled,
            weather_failed,
            projector_error,
            dropped_ticks: self.dropped.load(Ordering::Relaxed),
        };
        state.aircraft = aircraft;
        state.tracks = tracks;

        (state.status.clone(), new_warnings)
    }

    // -- read side ------------------------------------------------------------

    pub fn status(&self) -> TickStatus {
        self.read().status.clone()
    }

    pub fn aircraft(&self) -> Vec<AircraftState> {
        self.read().aircraft.clone()
    }

    pub fn tracks(&self) -> Vec<ProjectedTrack> {
        self.read().tracks.clone()
    }

    pub fn trails(&self) -> Vec<Trail> {
        let state = self.read();
        let mut trails: Vec<Trail> = state.history.trails().cloned().collect();
        trails.sort_by(|a, b| a.id.cmp(&b.id));
        trails
    }

    pub fn stability(&self) -> HashMap<AircraftId, f64> {
        self.read().stability.clone()
    }

    /// Ranked alerts; `all` skips the filter.
    pub fn alerts(&self, all: bool) -> Vec<Alert> {
        let state = self.read();
        if all {
            state.stream.alerts().to_vec()
        } else {
            state.stream.visible_alerts().to_vec()
        }
    }

    pub fn conflicts(&self, all: bool) -> Vec<Conflict> {
        let state = self.read();
        if all {
            state.stream.conflicts().to_vec()
        } else {
            state.stream.visible_conflicts().to_vec()
        }
    }

    pub fn selection(&self) -> Selection {
        self.read().stream.selection().clone()
    }

    pub fn filter(&self) -> AlertFilter {
        self.read().stream.filter().clone()
    }

    // -- mutators -------------------------------------------------------------

    pub fn select_conflict(&self, key: &PairKey) -> bool {
        self.write().stream.select_conflict(key)
    }

    pub fn select_alert(&self, id: &str) -> bool {
        self.write().stream.select_alert(id)
    }

    pub fn clear_selection(&self) {
        let mut state = self.write();
        state.stream.clear_alert_selection();
        state.stream.clear_conflict_selection();
    }

    pub fn set_filter(&self, filter: AlertFilter) {
        self.write().stream.set_filter(filter);
    }

    /// Forget all trail history.
    pub fn reset_history(&self) {
        let mut state = self.write();
        state.history.reset();
        state.stability.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
