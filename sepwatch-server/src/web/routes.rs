//! REST API route handlers.
//!
//! Every read is a clone of the last published tick, so a handler never sees
//! a half-applied update. Selection and filter changes go straight to the
//! engine's alert stream.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use sepwatch_core::stream::AlertFilter;
use sepwatch_core::types::PairKey;

use crate::web::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ListParams {
    all: Option<bool>,
}

#[derive(Deserialize)]
pub struct SelectionBody {
    #[serde(default)]
    conflict: Option<PairKey>,
    #[serde(default)]
    alert: Option<String>,
    #[serde(default)]
    clear: bool,
}

fn to_json<T: serde::Serialize>(value: &T) -> Json<Value> {
    Json(serde_json::to_value(value).unwrap_or(json!(null)))
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

/// GET /api/status: summary of the last completed tick.
pub async fn api_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut body = to_json(&state.engine.status()).0;
    body["busy"] = json!(state.engine.is_busy());
    Json(body)
}

/// GET /api/aircraft
pub async fn api_aircraft(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    to_json(&state.engine.aircraft())
}

/// GET /api/tracks
pub async fn api_tracks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    to_json(&state.engine.tracks())
}

/// GET /api/trails
pub async fn api_trails(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    to_json(&state.engine.trails())
}

/// DELETE /api/trails: forget all trail history.
pub async fn api_trails_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.reset_history();
    Json(json!({"ok": true}))
}

/// GET /api/stability: id -> score in [0, 1].
pub async fn api_stability(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let scores: BTreeMap<_, _> = state.engine.stability().into_iter().collect();
    to_json(&scores)
}

/// GET /api/alerts?all=true: ranked alerts, filtered unless `all`.
pub async fn api_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    to_json(&state.engine.alerts(params.all.unwrap_or(false)))
}

/// GET /api/conflicts?all=true: conflicts, most urgent first.
pub async fn api_conflicts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    to_json(&state.engine.conflicts(params.all.unwrap_or(false)))
}

// ---------------------------------------------------------------------------
// Selection and filter
// ---------------------------------------------------------------------------

/// GET /api/selection
pub async fn api_selection_get(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    to_json(&state.engine.selection())
}

/// PUT /api/selection: select a visible alert or conflict, or clear.
pub async fn api_selection_put(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionBody>,
) -> impl IntoResponse {
    let engine = &state.engine;

    if body.clear {
        engine.clear_selection();
    }
    if let Some(id) = &body.alert {
        if !engine.select_alert(id) {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Alert not visible"})),
            );
        }
    }
    if let Some(key) = &body.conflict {
        if !engine.select_conflict(key) {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Conflict not visible"})),
            );
        }
    }

    (StatusCode::OK, to_json(&engine.selection()))
}

/// GET /api/filter
pub async fn api_filter_get(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    to_json(&state.engine.filter())
}

/// PUT /api/filter: replace the filter; omitted fields take defaults.
pub async fn api_filter_put(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<AlertFilter>,
) -> impl IntoResponse {
    state.engine.set_filter(filter);
    Json(json!({
        "filter": state.engine.filter(),
        "selection": state.engine.selection(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
