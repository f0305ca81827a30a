//! Tick ingest: the upstream feed POSTs one snapshot per tick here.
//!
//! The tick runs on its own task so a client disconnect cannot cancel it
//! halfway. A snapshot that arrives while a tick is in flight is dropped
//! with 429; the feed simply sends the next one.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::engine::{Snapshot, TickOutcome};
use crate::web::AppState;

// ---------------------------------------------------------------------------
// Auth helper
// ---------------------------------------------------------------------------

/// Validate bearer token if auth is configured. Returns Err response on failure.
fn check_auth(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let expected = match &state.auth_token {
        Some(t) => t,
        None => return Ok(()),
    };

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if let Some(token) = auth_header.strip_prefix("Bearer ") {
        if token == expected {
            return Ok(());
        }
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "invalid or missing bearer token"})),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/tick: run one tick over the posted snapshot.
pub async fn api_tick(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(snapshot): Json<Snapshot>,
) -> (StatusCode, Json<Value>) {
    if let Err(resp) = check_auth(&state, &headers) {
        return resp;
    }

    let engine = state.engine.clone();
    let outcome = tokio::spawn(async move { engine.tick(snapshot).await }).await;

    match outcome {
        Ok(TickOutcome::Completed(status)) => (
            StatusCode::OK,
            Json(serde_json::to_value(&status).unwrap_or(json!({}))),
        ),
        Ok(TickOutcome::Busy) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "tick already in progress"})),
        ),
        Err(e) => {
            error!(error = %e, "tick task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "tick failed"})),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
