//! Web server: axum REST API over the tick engine.
//!
//! Shared state is the engine itself (internally locked) plus the optional
//! ingest bearer token. Handlers never hold an engine lock across an await.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use sepwatch_core::types::Result;

use crate::engine::Engine;

pub mod ingest;
pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub engine: Arc<Engine>,
    pub auth_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Read side
        .route("/api/status", get(routes::api_status))
        .route("/api/aircraft", get(routes::api_aircraft))
        .route("/api/tracks", get(routes::api_tracks))
        .route(
            "/api/trails",
            get(routes::api_trails).delete(routes::api_trails_reset),
        )
        .route("/api/stability", get(routes::api_stability))
        .route("/api/alerts", get(routes::api_alerts))
        .route("/api/conflicts", get(routes::api_conflicts))
        // Operator state
        .route(
            "/api/selection",
            get(routes::api_selection_get).put(routes::api_selection_put),
        )
        .route(
            "/api/filter",
            get(routes::api_filter_get).put(routes::api_filter_put),
        )
        // Ingest
        .route("/api/v1/tick", post(ingest::api_tick))
        .with_state(state)
        .layer(cors)
}

/// Start the web server.
pub async fn serve(
    engine: Arc<Engine>,
    auth_token: Option<String>,
    host: &str,
    port: u16,
) -> Result<()> {
    let state = Arc::new(AppState { engine, auth_token });

    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("sepwatch listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use sepwatch_core::config::Config;
    use sepwatch_core::types::GeoPoint;

    pub fn test_state(auth_token: Option<&str>) -> Arc<AppState> {
        let config = Config {
            reference: GeoPoint::new(0.0, 0.0),
            ..Config::default()
        };
        Arc::new(AppState {
            engine: Arc::new(Engine::new(&config)),
            auth_token: auth_token.map(str::to_string),
        })
    }

    /// Snapshot body with two converging aircraft and inline tracks.
    /// Breach at the 4th sample (180 s), caution severity.
    pub const CONVERGING: &str = r#"{
        "timestamp": 1760529900,
        "aircraft": [
            {"id": "AAA", "callsign": "DAL12", "lat": 0.0, "lon": 0.0, "altitude_ft": 20000,
             "ground_speed_kts": 300, "track_deg": 90},
            {"id": "BBB", "lat": 0.0, "lon": 0.6662, "altitude_ft": 20500,
             "ground_speed_kts": 480, "track_deg": 270}
        ],
        "tracks": [
            {"id": "AAA", "points": [
                {"lat": 0.0, "lon": 0.0,    "altitude_ft": 20000, "t_offset_s": 0},
                {"lat": 0.0, "lon": 0.0833, "altitude_ft": 20000, "t_offset_s": 60},
                {"lat": 0.0, "lon": 0.1666, "altitude_ft": 20000, "t_offset_s": 120},
                {"lat": 0.0, "lon": 0.2498, "altitude_ft": 20000, "t_offset_s": 180}
            ]},
            {"id": "BBB", "points": [
                {"lat": 0.0, "lon": 0.6662, "altitude_ft": 20500, "t_offset_s": 0},
                {"lat": 0.0, "lon": 0.5330, "altitude_ft": 20500, "t_offset_s": 60},
                {"lat": 0.0, "lon": 0.3997, "altitude_ft": 20500, "t_offset_s": 120},
                {"lat": 0.0, "lon": 0.2831, "altitude_ft": 20500, "t_offset_s": 180}
            ]}
        ]
    }"#;
}
