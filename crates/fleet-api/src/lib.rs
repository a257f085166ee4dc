//! # fleet-api: HTTP Service for the Drone Fleet Controller
//!
//! ## API Surface
//!
//! | Method | Path                              | Operation                    |
//! |--------|-----------------------------------|------------------------------|
//! | POST   | `/v1/drones`                      | register a drone             |
//! | GET    | `/v1/drones/{id}`                 | drone with its medications   |
//! | POST   | `/v1/drones/{id}/medications`     | load one medication item     |
//! | GET    | `/v1/drones/{id}/battery`         | battery charge, e.g. `"87%"` |
//! | GET    | `/v1/drones/{id}/state`           | lifecycle state              |
//! | GET    | `/v1/fleet/available`             | drones available for loading |
//! | GET    | `/v1/fleet/logs`                  | battery log                  |
//! | GET    | `/health/liveness`                | process is up                |
//! | GET    | `/health/readiness`               | store is reachable           |
//! | GET    | `/metrics`                        | Prometheus metrics           |
//! | GET    | `/openapi.json`                   | generated OpenAPI document   |
//!
//! ## Middleware Stack
//!
//! ```text
//! TraceLayer → Handler
//! ```

pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::drones::router())
        .merge(routes::fleet::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the drone store answers, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state
        .fleet
        .drone_store()
        .ping()
        .await
        .map_err(|e| {
            tracing::warn!("store health check failed: {e}");
            AppError::ServiceUnavailable("store unreachable".into())
        })?;
    Ok("ready")
}

/// GET /metrics: Prometheus scrape endpoint.
///
/// Refreshes the drones-by-state gauge from the store on each scrape, then
/// encodes every metric in the text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let drones = state
        .fleet
        .drone_store()
        .list_drones()
        .await
        .map_err(|e| {
            tracing::warn!("fleet gauge refresh failed: {e}");
            AppError::ServiceUnavailable("store unreachable".into())
        })?;
    state.metrics.observe_fleet(&drones);
    let body = state.metrics.gather_and_encode().map_err(AppError::Internal)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
